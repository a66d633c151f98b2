//! Blocks hashes agreement.
//!
//! Up to the lowest height reported by any active node, all nodes must agree
//! on every block hash. A disagreement means the chain forked.

use std::sync::Arc;

use provbana_config::CheckerConfig;
use provbana_core::network::{parse_hex_quantity, Network, Node, RpcClient};
use provbana_core::RpcError;
use tracing::info;

use crate::checker::Checker;
use crate::error::{CheckError, ConfigureError};

pub const NAME: &str = "blocks_hashes";

#[derive(Clone)]
pub struct BlocksHashesChecker {
    net: Arc<dyn Network>,
}

impl BlocksHashesChecker {
    pub fn new(net: Arc<dyn Network>) -> Self {
        Self { net }
    }
}

struct Dialed {
    label: String,
    client: Box<dyn RpcClient>,
}

fn dial(node: &dyn Node) -> Result<Dialed, CheckError> {
    let client = node.dial_rpc().map_err(|source| CheckError::Rpc {
        node: node.label().to_string(),
        source,
    })?;
    Ok(Dialed {
        label: node.label().to_string(),
        client,
    })
}

impl Dialed {
    fn height(&self) -> Result<u64, CheckError> {
        let number = self.client.block_number().map_err(|e| self.rpc(e))?;
        let height = parse_hex_quantity("eth_blockNumber", &number).map_err(|e| self.rpc(e))?;
        Ok(u64::try_from(height).unwrap_or(0))
    }

    fn hash(&self, height: u64) -> Result<String, CheckError> {
        self.client.block_hash(height).map_err(|e| self.rpc(e))
    }

    fn rpc(&self, source: RpcError) -> CheckError {
        CheckError::Rpc {
            node: self.label.clone(),
            source,
        }
    }
}

impl Checker for BlocksHashesChecker {
    fn check(&self) -> Result<(), CheckError> {
        let nodes = self
            .net
            .active_nodes()
            .iter()
            .map(|n| dial(n.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let Some((reference, others)) = nodes.split_first() else {
            return Ok(());
        };

        let mut min_height = reference.height()?;
        for node in others {
            min_height = min_height.min(node.height()?);
        }
        info!(
            "checking block hashes of {} nodes up to block {}",
            nodes.len(),
            min_height
        );

        for height in 0..=min_height {
            let want = reference.hash(height)?;
            for node in others {
                let got = node.hash(height)?;
                if got != want {
                    return Err(CheckError::violation(format!(
                        "block hash mismatch at block {}: node {} has {}, node {} has {}",
                        height, reference.label, want, node.label, got
                    )));
                }
            }
        }
        Ok(())
    }

    fn configure(&self, _config: &CheckerConfig) -> Result<Box<dyn Checker>, ConfigureError> {
        Ok(Box::new(self.clone()))
    }
}
