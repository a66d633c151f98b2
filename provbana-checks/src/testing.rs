//! Hand-written doubles for checker tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use provbana_config::CheckerConfig;
use provbana_core::error::{NetworkError, RpcError};
use provbana_core::network::{
    Application, ApplicationConfig, Network, NetworkRules, Node, NodeConfig, RpcClient, ValidatorId,
};

use crate::checker::Checker;
use crate::error::{CheckError, ConfigureError};

/// A checker with a fixed outcome that records the configs it receives.
pub struct FixedChecker {
    outcome: Result<(), &'static str>,
    seen: Arc<Mutex<Vec<CheckerConfig>>>,
}

impl FixedChecker {
    pub fn new(outcome: Result<(), &'static str>) -> Self {
        Self {
            outcome,
            seen: Arc::default(),
        }
    }

    pub fn seen_configs(&self) -> Arc<Mutex<Vec<CheckerConfig>>> {
        self.seen.clone()
    }
}

impl Checker for FixedChecker {
    fn check(&self) -> Result<(), CheckError> {
        self.outcome.map_err(CheckError::violation)
    }

    fn configure(&self, config: &CheckerConfig) -> Result<Box<dyn Checker>, ConfigureError> {
        self.seen.lock().push(config.clone());
        Ok(Box::new(Self {
            outcome: self.outcome,
            seen: self.seen.clone(),
        }))
    }
}

/// Node answering RPC calls from a fixed height and hash table.
#[derive(Debug, Clone, Default)]
pub struct FakeNode {
    pub label: String,
    pub expected_failure: bool,
    pub block_number: String,
    pub hashes: BTreeMap<u64, String>,
    pub unreachable: bool,
}

impl FakeNode {
    pub fn at(label: &str, block_number: &str) -> Self {
        Self {
            label: label.to_string(),
            block_number: block_number.to_string(),
            ..Default::default()
        }
    }

    pub fn expected_to_fail(mut self) -> Self {
        self.expected_failure = true;
        self
    }

    pub fn with_hash(mut self, height: u64, hash: &str) -> Self {
        self.hashes.insert(height, hash.to_string());
        self
    }
}

impl Node for FakeNode {
    fn label(&self) -> &str {
        &self.label
    }

    fn is_expected_failure(&self) -> bool {
        self.expected_failure
    }

    fn validator_id(&self) -> Option<ValidatorId> {
        None
    }

    fn dial_rpc(&self) -> Result<Box<dyn RpcClient>, RpcError> {
        if self.unreachable {
            return Err(RpcError::Dial(format!("{} is unreachable", self.label)));
        }
        Ok(Box::new(self.clone()))
    }

    fn stop(&self) -> Result<(), NetworkError> {
        Ok(())
    }

    fn cleanup(&self) -> Result<(), NetworkError> {
        Ok(())
    }
}

impl RpcClient for FakeNode {
    fn block_number(&self) -> Result<String, RpcError> {
        Ok(self.block_number.clone())
    }

    fn block_hash(&self, height: u64) -> Result<String, RpcError> {
        self.hashes.get(&height).cloned().ok_or_else(|| RpcError::Call {
            method: "eth_getBlockByNumber".into(),
            reason: format!("unknown block {height}"),
        })
    }

    fn register_validator(&self) -> Result<ValidatorId, RpcError> {
        Err(RpcError::Call {
            method: "registerValidator".into(),
            reason: "unsupported".into(),
        })
    }

    fn unregister_validator(&self, _id: ValidatorId) -> Result<(), RpcError> {
        Ok(())
    }
}

/// Network made of a fixed node list.
#[derive(Default)]
pub struct FakeNetwork {
    pub nodes: Vec<FakeNode>,
}

impl FakeNetwork {
    pub fn of(nodes: Vec<FakeNode>) -> Arc<dyn Network> {
        Arc::new(Self { nodes })
    }
}

impl Network for FakeNetwork {
    fn active_nodes(&self) -> Vec<Arc<dyn Node>> {
        self.nodes
            .iter()
            .map(|n| Arc::new(n.clone()) as Arc<dyn Node>)
            .collect()
    }

    fn create_node(&self, config: &NodeConfig) -> Result<Arc<dyn Node>, NetworkError> {
        Err(NetworkError::operation("create", &config.name, "unsupported"))
    }

    fn remove_node(&self, node: &dyn Node) -> Result<(), NetworkError> {
        Err(NetworkError::NodeNotFound(node.label().to_string()))
    }

    fn create_application(
        &self,
        config: &ApplicationConfig,
    ) -> Result<Arc<dyn Application>, NetworkError> {
        Err(NetworkError::operation("create", &config.name, "unsupported"))
    }

    fn apply_network_rules(&self, _rules: &NetworkRules) -> Result<(), NetworkError> {
        Ok(())
    }

    fn advance_epoch(&self, _epochs: u32) -> Result<(), NetworkError> {
        Ok(())
    }

    fn dial_random_rpc(&self) -> Result<Box<dyn RpcClient>, RpcError> {
        match self.nodes.first() {
            Some(node) => node.dial_rpc(),
            None => Err(RpcError::Dial("no active nodes".into())),
        }
    }
}
