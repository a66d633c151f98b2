//! ## provbana-core::network
//! **Collaborator surface of the network under test**
//!
//! The scenario engine never manages containers or speaks a wire protocol
//! itself. Everything it needs from the running cluster is expressed through
//! the traits in this module, so any backend (real, dry-run or a test double)
//! can be plugged in.
//!
//! ### Key Types:
//! - `Network`: node and application lifecycle plus network-wide operations.
//! - `Node`: a single running client.
//! - `RpcClient`: the handful of RPC calls the engine and checkers issue.
//! - `Application`: a load generator.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{NetworkError, RpcError};

/// Docker image used when a node group does not name one.
pub const DEFAULT_CLIENT_IMAGE: &str = "sonic";

/// Identity of a validator as assigned by the network.
pub type ValidatorId = u32;

/// Key/value network rules, applied in one batch.
pub type NetworkRules = BTreeMap<String, String>;

/// Everything needed to start one node instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    pub name: String,
    pub failing: bool,
    pub image: String,
    pub validator: bool,
    pub validator_id: Option<ValidatorId>,
    pub cheater: bool,
    pub data_volume: Option<String>,
}

/// Transaction rate shape of a load generator. Exactly one shape is set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", deny_unknown_fields)]
pub enum Rate {
    /// Fixed Tx/s.
    Constant(f32),
    /// Linear ramp starting at `start` Tx/s, growing by `increment` Tx/s per second.
    Slope { start: f32, increment: f32 },
    /// Sine wave between `min` and `max` Tx/s.
    Wave {
        #[serde(default)]
        min: Option<f32>,
        max: f32,
        period: f32,
    },
    /// Adaptive rate backing off under overload.
    Auto {
        #[serde(default)]
        increase: Option<f32>,
        #[serde(default)]
        decrease: Option<f32>,
    },
}

impl Default for Rate {
    fn default() -> Self {
        Rate::Constant(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationConfig {
    pub name: String,
    pub kind: String,
    pub rate: Rate,
    pub users: u32,
}

/// RPC calls issued against a single node.
pub trait RpcClient: Send {
    /// Current block number as a `0x`-prefixed hex quantity.
    fn block_number(&self) -> Result<String, RpcError>;

    /// Hash of the block at `height`, hex encoded.
    fn block_hash(&self, height: u64) -> Result<String, RpcError>;

    /// Registers a fresh validator and returns the id the network assigned.
    fn register_validator(&self) -> Result<ValidatorId, RpcError>;

    fn unregister_validator(&self, id: ValidatorId) -> Result<(), RpcError>;
}

pub trait Node: Send + Sync + fmt::Debug {
    fn label(&self) -> &str;

    /// Whether this node was declared as allowed to fall behind.
    fn is_expected_failure(&self) -> bool;

    fn validator_id(&self) -> Option<ValidatorId>;

    fn dial_rpc(&self) -> Result<Box<dyn RpcClient>, RpcError>;

    fn stop(&self) -> Result<(), NetworkError>;

    /// Releases resources held after `stop`.
    fn cleanup(&self) -> Result<(), NetworkError>;
}

pub trait Application: Send + Sync {
    fn start(&self) -> Result<(), NetworkError>;

    fn stop(&self) -> Result<(), NetworkError>;
}

/// The running network. Implementations handle their own synchronisation.
pub trait Network: Send + Sync {
    /// Nodes currently part of the network.
    fn active_nodes(&self) -> Vec<Arc<dyn Node>>;

    fn create_node(&self, config: &NodeConfig) -> Result<Arc<dyn Node>, NetworkError>;

    /// Detaches `node` from the network without stopping it.
    fn remove_node(&self, node: &dyn Node) -> Result<(), NetworkError>;

    fn create_application(
        &self,
        config: &ApplicationConfig,
    ) -> Result<Arc<dyn Application>, NetworkError>;

    fn apply_network_rules(&self, rules: &NetworkRules) -> Result<(), NetworkError>;

    fn advance_epoch(&self, epochs: u32) -> Result<(), NetworkError>;

    /// Dials the RPC endpoint of any active node.
    fn dial_random_rpc(&self) -> Result<Box<dyn RpcClient>, RpcError>;
}

/// Parses an RPC hex quantity such as `0x42`.
pub fn parse_hex_quantity(method: &str, value: &str) -> Result<i64, RpcError> {
    let digits = value.trim().trim_start_matches("0x");
    i64::from_str_radix(digits, 16).map_err(|_| RpcError::Malformed {
        method: method.to_string(),
        value: value.to_string(),
    })
}
