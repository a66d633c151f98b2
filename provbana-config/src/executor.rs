//! Scenario run loop thresholds.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct ExecutorConfig {
    /// Events firing later than this are logged as warnings (milliseconds).
    #[validate(range(min = 1, max = 3_600_000))]
    #[serde(default = "default_delay_warning")]
    pub delay_warning_ms: u64,

    /// Actions running longer than this are logged as slow (milliseconds).
    #[validate(range(min = 1, max = 3_600_000))]
    #[serde(default = "default_slow_execution")]
    pub slow_execution_ms: u64,

    /// Schedule the network-wide consistency check before shutdown.
    #[serde(default = "default_true")]
    pub consistency_checks: bool,

    /// Period of the progress log line (milliseconds).
    #[validate(range(min = 100, max = 3_600_000))]
    #[serde(default = "default_progress_interval")]
    pub progress_interval_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            delay_warning_ms: default_delay_warning(),
            slow_execution_ms: default_slow_execution(),
            consistency_checks: true,
            progress_interval_ms: default_progress_interval(),
        }
    }
}

impl ExecutorConfig {
    pub fn delay_warning(&self) -> Duration {
        Duration::from_millis(self.delay_warning_ms)
    }

    pub fn slow_execution(&self) -> Duration {
        Duration::from_millis(self.slow_execution_ms)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }
}

fn default_delay_warning() -> u64 {
    1_000
}

fn default_slow_execution() -> u64 {
    5_000
}

fn default_progress_interval() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}
