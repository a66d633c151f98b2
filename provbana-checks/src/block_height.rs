//! Block height consistency.
//!
//! Every active node must be within `slack` blocks of the highest node, except
//! nodes declared as expected failures. Those must lag: the set of lagging
//! nodes has to equal the set of expected failures exactly.

use std::collections::BTreeSet;
use std::sync::Arc;

use provbana_config::CheckerConfig;
use provbana_core::network::{parse_hex_quantity, Network, Node};
use tracing::info;

use crate::checker::Checker;
use crate::error::{CheckError, ConfigureError};

pub const NAME: &str = "block_height";

pub const DEFAULT_SLACK: u8 = 5;

#[derive(Clone)]
pub struct BlockHeightChecker {
    net: Arc<dyn Network>,
    slack: u8,
}

impl BlockHeightChecker {
    pub fn new(net: Arc<dyn Network>) -> Self {
        Self {
            net,
            slack: DEFAULT_SLACK,
        }
    }

    pub fn slack(&self) -> u8 {
        self.slack
    }
}

impl Checker for BlockHeightChecker {
    fn check(&self) -> Result<(), CheckError> {
        let nodes = self.net.active_nodes();
        info!("checking block heights for {} nodes", nodes.len());

        let mut heights = Vec::with_capacity(nodes.len());
        let mut expected = BTreeSet::new();
        for node in &nodes {
            if node.is_expected_failure() {
                expected.insert(node.label().to_string());
            }
            let height = block_height(node.as_ref())?;
            if height == 1 {
                return Err(CheckError::violation(format!(
                    "node {} reports it is at block 1 (only genesis is applied)",
                    node.label()
                )));
            }
            if height < 1 {
                return Err(CheckError::violation(format!(
                    "node {} reports it is at invalid block {}",
                    node.label(),
                    height
                )));
            }
            heights.push(height);
        }

        let max = heights.iter().copied().max().unwrap_or(0);
        let mut lagging = BTreeSet::new();
        for (node, height) in nodes.iter().zip(&heights) {
            if *height < max - i64::from(self.slack) {
                if !node.is_expected_failure() {
                    return Err(CheckError::violation(format!(
                        "node {} reports too old block {} (max block is {}, given slack of {}.)",
                        node.label(),
                        height,
                        max,
                        self.slack
                    )));
                }
                lagging.insert(node.label().to_string());
            }
        }

        if lagging != expected {
            return Err(CheckError::violation(format!(
                "unexpected failure set to provide the block height, got {:?}, want {:?}",
                lagging, expected
            )));
        }
        Ok(())
    }

    fn configure(&self, config: &CheckerConfig) -> Result<Box<dyn Checker>, ConfigureError> {
        let slack = match config.slack {
            Some(s) => u8::try_from(s)
                .map_err(|_| ConfigureError::invalid("slack", format!("0 <= {s} <= 255")))?,
            None => self.slack,
        };
        Ok(Box::new(Self {
            net: self.net.clone(),
            slack,
        }))
    }
}

fn block_height(node: &dyn Node) -> Result<i64, CheckError> {
    let rpc_failure = |source| CheckError::Rpc {
        node: node.label().to_string(),
        source,
    };
    let client = node.dial_rpc().map_err(rpc_failure)?;
    let number = client.block_number().map_err(rpc_failure)?;
    parse_hex_quantity("eth_blockNumber", &number).map_err(rpc_failure)
}
