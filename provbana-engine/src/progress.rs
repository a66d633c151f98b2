//! Periodic progress line while a scenario runs.

use std::sync::Arc;
use std::time::Duration;

use provbana_core::network::Network;
use provbana_core::time::Clock;
use tokio::task::JoinHandle;
use tracing::{info, Instrument};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Logs scenario time and the number of active nodes every period until
/// stopped or dropped.
#[derive(Debug)]
pub struct ProgressLogger {
    handle: JoinHandle<()>,
}

impl ProgressLogger {
    /// Spawns the logging task on the current runtime. Periods below one
    /// millisecond are raised to it.
    pub fn start(clock: Arc<dyn Clock>, net: Arc<dyn Network>, period: Duration) -> Self {
        let period = period.max(MIN_PERIOD);
        let task = async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                info!(
                    time = %clock.now(),
                    active_nodes = net.active_nodes().len(),
                    "scenario progress"
                );
            }
        };
        Self {
            handle: tokio::spawn(task.in_current_span()),
        }
    }

    pub fn stop(self) {}
}

impl Drop for ProgressLogger {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
