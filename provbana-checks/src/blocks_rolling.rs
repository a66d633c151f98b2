//! Blocks rolling liveness.
//!
//! A node is functional when, across its block status series, the height at
//! every sample is strictly above the height `tolerance - 1` samples earlier.
//! Comparing samples some distance apart tolerates slots without a new block.
//! The network passes when at least one node is functional; whether every
//! node keeps up is left to the block height checker.
//!
//! `start` drops samples recorded before the given position, so liveness can
//! be re-baselined after a disruption such as a node rejoining.

use std::sync::Arc;

use provbana_config::CheckerConfig;
use tracing::debug;

use crate::checker::Checker;
use crate::error::{CheckError, ConfigureError};
use crate::monitoring::{BlockStatus, MonitoringData, Point, Position};

pub const NAME: &str = "blocks_rolling";

pub const DEFAULT_TOLERANCE: usize = 10;

pub const MIN_TOLERANCE: usize = 5;

#[derive(Clone)]
pub struct BlocksRollingChecker {
    monitor: Arc<dyn MonitoringData>,
    tolerance: usize,
    start: Option<Position>,
}

impl BlocksRollingChecker {
    pub fn new(monitor: Arc<dyn MonitoringData>) -> Self {
        Self {
            monitor,
            tolerance: DEFAULT_TOLERANCE,
            start: None,
        }
    }

    fn node_functional(&self, node: &str) -> bool {
        let Some(series) = self.monitor.block_status(node) else {
            return false;
        };
        let Some(last) = series.latest() else {
            return false;
        };
        let from = self.start.unwrap_or(Position::MIN);
        if last.position < from {
            return false;
        }
        let mut points = series.range(from, last.position);
        points.push(last);
        is_rolling(&points, self.tolerance)
    }
}

/// Whether every full window of `tolerance` samples shows progress.
fn is_rolling(points: &[Point<Position, BlockStatus>], tolerance: usize) -> bool {
    let span = tolerance.saturating_sub(1);
    points
        .iter()
        .enumerate()
        .skip(span)
        .all(|(i, point)| points[i - span].value.block_height < point.value.block_height)
}

impl Checker for BlocksRollingChecker {
    fn check(&self) -> Result<(), CheckError> {
        let functional = self.monitor.nodes().iter().any(|node| {
            let ok = self.node_functional(node);
            debug!(node = %node, functional = ok, "blocks rolling");
            ok
        });
        if functional {
            Ok(())
        } else {
            Err(CheckError::violation(
                "network is down, nodes stopped producing blocks even when it should",
            ))
        }
    }

    fn configure(&self, config: &CheckerConfig) -> Result<Box<dyn Checker>, ConfigureError> {
        let tolerance = match config.tolerance {
            Some(t) => match usize::try_from(t) {
                Ok(t) if t >= MIN_TOLERANCE => t,
                _ => {
                    return Err(ConfigureError::invalid(
                        "tolerance",
                        format!("minimum tolerance sample size is {MIN_TOLERANCE}"),
                    ))
                }
            },
            None => self.tolerance,
        };
        let start = match config.start {
            Some(s) if s < 0 => {
                return Err(ConfigureError::invalid("start", format!("{s} < 0")))
            }
            Some(s) => Some(s),
            None => self.start,
        };
        Ok(Box::new(Self {
            monitor: self.monitor.clone(),
            tolerance,
            start,
        }))
    }
}
