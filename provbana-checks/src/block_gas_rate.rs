//! Block gas rate ceiling over the network-wide gas rate series.

use std::sync::Arc;

use provbana_config::CheckerConfig;

use crate::checker::Checker;
use crate::error::{CheckError, ConfigureError};
use crate::monitoring::MonitoringData;

pub const NAME: &str = "block_gas_rate";

pub const DEFAULT_CEILING: f64 = f64::MAX;

#[derive(Clone)]
pub struct BlockGasRateChecker {
    monitor: Arc<dyn MonitoringData>,
    ceiling: f64,
}

impl BlockGasRateChecker {
    pub fn new(monitor: Arc<dyn MonitoringData>) -> Self {
        Self {
            monitor,
            ceiling: DEFAULT_CEILING,
        }
    }
}

impl Checker for BlockGasRateChecker {
    fn check(&self) -> Result<(), CheckError> {
        let series = self.monitor.block_gas_rate();
        let Some(last) = series.latest() else {
            return Ok(());
        };
        let mut points = series.range(0, last.position);
        points.push(last);
        match points.iter().find(|p| p.value > self.ceiling) {
            Some(p) => Err(CheckError::violation(format!(
                "Exceeded gas ceiling; Block {} has gas rate of {} > {}",
                p.position, p.value, self.ceiling
            ))),
            None => Ok(()),
        }
    }

    fn configure(&self, config: &CheckerConfig) -> Result<Box<dyn Checker>, ConfigureError> {
        let ceiling = match config.ceiling {
            Some(c) if c.is_nan() || c < 0.0 => {
                return Err(ConfigureError::invalid("ceiling", format!("{c} < 0")))
            }
            Some(c) => c,
            None => self.ceiling,
        };
        Ok(Box::new(Self {
            monitor: self.monitor.clone(),
            ceiling,
        }))
    }
}
