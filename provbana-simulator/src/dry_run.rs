//! ## provbana-simulator::dry_run
//! **In-memory network for rehearsing scenarios**
//!
//! No process is started. The chain height is a function of scenario time:
//! `2 + seconds * blocks_per_second`. Nodes created as expected failures stop
//! at the height the chain had when they were created. All nodes agree on
//! every block hash.
//!
//! The network doubles as the monitoring source for checkers: series are
//! synthesized from node lifetimes on every read, one block status point per
//! second a node was alive, and one gas rate point per block.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use provbana_checks::monitoring::{BlockNumber, BlockStatus, Position};
use provbana_checks::{MonitoringData, Series, SyncedSeries};
use provbana_config::scenario::ValidatorGroup;
use provbana_config::Scenario;
use provbana_core::network::{
    Application, ApplicationConfig, Network, NetworkRules, Node, NodeConfig, Rate, RpcClient,
    ValidatorId, DEFAULT_CLIENT_IMAGE,
};
use provbana_core::time::{Clock, Time};
use provbana_core::{NetworkError, RpcError};
use provbana_engine::ValidatorIdTracker;
use tracing::{debug, info};

/// Gas consumed by one transaction of the simulated load.
pub const GAS_PER_TRANSACTION: f64 = 21_000.0;

/// Height of a chain that has only applied its genesis.
const GENESIS_HEIGHT: u64 = 2;

struct Chain {
    clock: Arc<dyn Clock>,
    blocks_per_second: u32,
}

impl Chain {
    fn height_at(&self, time: Time) -> u64 {
        GENESIS_HEIGHT + (time.as_secs_f64() * f64::from(self.blocks_per_second)) as u64
    }

    fn height(&self) -> u64 {
        self.height_at(self.clock.now())
    }

    /// Scenario time at which `block` was produced.
    fn produced_at(&self, block: BlockNumber) -> Time {
        let secs = block.saturating_sub(GENESIS_HEIGHT) as f64 / f64::from(self.blocks_per_second);
        Time::from_nanos((secs * 1e9) as u64)
    }
}

fn block_hash(height: u64) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"provbana-dry-run-block");
    hasher.update(&height.to_le_bytes());
    format!("0x{}", hex::encode(hasher.finalize().as_bytes()))
}

#[derive(Debug, Clone, Copy)]
struct Lifetime {
    created: Time,
    removed: Option<Time>,
    failing: bool,
}

#[derive(Debug, Clone, Copy)]
struct AppWindow {
    tx_per_second: f64,
    started: Option<Time>,
    stopped: Option<Time>,
}

impl AppWindow {
    fn running_at(&self, time: Time) -> bool {
        self.started.is_some_and(|start| start <= time)
            && self.stopped.map_or(true, |stop| time < stop)
    }
}

/// Transactions per second a load shape settles on.
fn nominal_rate(rate: &Rate, users: u32) -> f64 {
    let per_user = match *rate {
        Rate::Constant(tps) => tps,
        Rate::Slope { start, .. } => start,
        Rate::Wave { min, max, .. } => (min.unwrap_or(0.0) + max) / 2.0,
        Rate::Auto { .. } => 0.0,
    };
    f64::from(per_user.max(0.0)) * f64::from(users.max(1))
}

#[derive(Default)]
struct State {
    active: Vec<Arc<DryRunNode>>,
    history: BTreeMap<String, Lifetime>,
    apps: Vec<AppWindow>,
    rules: NetworkRules,
    epoch: u32,
    tracker: ValidatorIdTracker,
}

struct Inner {
    chain: Chain,
    state: Mutex<State>,
}

/// Network living entirely in memory.
#[derive(Clone)]
pub struct DryRunNetwork {
    inner: Arc<Inner>,
}

impl DryRunNetwork {
    pub fn new(clock: Arc<dyn Clock>, blocks_per_second: u32) -> Self {
        Self {
            inner: Arc::new(Inner {
                chain: Chain {
                    clock,
                    blocks_per_second: blocks_per_second.max(1),
                },
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// Brings up the network a scenario starts from: genesis rules applied
    /// and the declared validators running.
    pub fn for_scenario(
        clock: Arc<dyn Clock>,
        scenario: &Scenario,
        blocks_per_second: u32,
    ) -> Result<Self, NetworkError> {
        let net = Self::new(clock, blocks_per_second);
        net.apply_network_rules(&scenario.network_rules.genesis)?;
        net.start_validators(&scenario.validators)?;
        info!(
            validators = net.active_nodes().len(),
            blocks_per_second, "dry-run network started"
        );
        Ok(net)
    }

    pub fn start_validators(&self, groups: &[ValidatorGroup]) -> Result<(), NetworkError> {
        for group in groups {
            for i in 0..group.instances.unwrap_or(1) {
                self.create_node(&NodeConfig {
                    name: format!("{}-{}", group.name, i),
                    failing: group.failing,
                    image: group
                        .image
                        .clone()
                        .unwrap_or_else(|| DEFAULT_CLIENT_IMAGE.to_string()),
                    validator: true,
                    validator_id: None,
                    cheater: false,
                    data_volume: None,
                })?;
            }
        }
        Ok(())
    }

    pub fn epoch(&self) -> u32 {
        self.inner.state.lock().epoch
    }

    pub fn rules(&self) -> NetworkRules {
        self.inner.state.lock().rules.clone()
    }

    /// Current height of the healthy part of the network.
    pub fn height(&self) -> u64 {
        self.inner.chain.height()
    }

    pub fn registered_validators(&self) -> usize {
        self.inner.state.lock().tracker.registered()
    }
}

impl Network for DryRunNetwork {
    fn active_nodes(&self) -> Vec<Arc<dyn Node>> {
        self.inner
            .state
            .lock()
            .active
            .iter()
            .map(|node| node.clone() as Arc<dyn Node>)
            .collect()
    }

    fn create_node(&self, config: &NodeConfig) -> Result<Arc<dyn Node>, NetworkError> {
        let now = self.inner.chain.clock.now();
        let mut state = self.inner.state.lock();
        if state.active.iter().any(|node| node.label == config.name) {
            return Err(NetworkError::operation(
                "create",
                &config.name,
                "node already running",
            ));
        }

        let validator_id = match (config.validator, config.validator_id) {
            (false, _) => None,
            (true, Some(id)) => {
                state
                    .tracker
                    .notify_registered_id(id)
                    .map_err(|e| NetworkError::operation("create", &config.name, e))?;
                Some(id)
            }
            (true, None) => {
                let id = state
                    .tracker
                    .next_available_id()
                    .map_err(|e| NetworkError::operation("create", &config.name, e))?;
                state
                    .tracker
                    .notify_registered_id(id)
                    .map_err(|e| NetworkError::operation("create", &config.name, e))?;
                Some(id)
            }
        };

        let node = Arc::new(DryRunNode {
            label: config.name.clone(),
            failing: config.failing,
            validator_id,
            frozen_at: config.failing.then(|| self.inner.chain.height_at(now)),
            inner: self.inner.clone(),
        });
        state.active.push(node.clone());
        state.history.insert(
            config.name.clone(),
            Lifetime {
                created: now,
                removed: None,
                failing: config.failing,
            },
        );
        debug!(node = %config.name, ?validator_id, image = %config.image, "node created");
        Ok(node)
    }

    fn remove_node(&self, node: &dyn Node) -> Result<(), NetworkError> {
        let now = self.inner.chain.clock.now();
        let mut state = self.inner.state.lock();
        let before = state.active.len();
        state.active.retain(|n| n.label != node.label());
        if state.active.len() == before {
            return Err(NetworkError::NodeNotFound(node.label().to_string()));
        }
        if let Some(lifetime) = state.history.get_mut(node.label()) {
            lifetime.removed = Some(now);
        }
        debug!(node = %node.label(), "node removed");
        Ok(())
    }

    fn create_application(
        &self,
        config: &ApplicationConfig,
    ) -> Result<Arc<dyn Application>, NetworkError> {
        if config.kind.is_empty() {
            return Err(NetworkError::operation(
                "create",
                &config.name,
                "application type missing",
            ));
        }
        let mut state = self.inner.state.lock();
        state.apps.push(AppWindow {
            tx_per_second: nominal_rate(&config.rate, config.users),
            started: None,
            stopped: None,
        });
        Ok(Arc::new(DryRunApp {
            name: config.name.clone(),
            index: state.apps.len() - 1,
            inner: self.inner.clone(),
        }))
    }

    fn apply_network_rules(&self, rules: &NetworkRules) -> Result<(), NetworkError> {
        let mut state = self.inner.state.lock();
        for (key, value) in rules {
            state.rules.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    fn advance_epoch(&self, epochs: u32) -> Result<(), NetworkError> {
        let mut state = self.inner.state.lock();
        state.epoch = state.epoch.saturating_add(epochs);
        info!(epoch = state.epoch, "epoch advanced");
        Ok(())
    }

    fn dial_random_rpc(&self) -> Result<Box<dyn RpcClient>, RpcError> {
        let node = self
            .inner
            .state
            .lock()
            .active
            .iter()
            .find(|node| !node.failing)
            .cloned()
            .ok_or_else(|| RpcError::Dial("no healthy node running".into()))?;
        node.dial_rpc()
    }
}

impl MonitoringData for DryRunNetwork {
    fn nodes(&self) -> Vec<String> {
        self.inner.state.lock().history.keys().cloned().collect()
    }

    fn block_status(&self, node: &str) -> Option<Arc<dyn Series<Position, BlockStatus>>> {
        let lifetime = *self.inner.state.lock().history.get(node)?;
        let chain = &self.inner.chain;
        let end = lifetime.removed.unwrap_or_else(|| chain.clock.now());
        let frozen = lifetime.failing.then(|| chain.height_at(lifetime.created));

        let first = lifetime.created.as_secs_f64().ceil() as Position;
        let last = end.as_secs_f64().floor() as Position;
        let points = (first..=last).map(|secs| {
            let height = chain.height_at(Time::from_secs(secs.unsigned_abs()));
            let height = frozen.map_or(height, |f| f.min(height));
            (secs, BlockStatus::at(height))
        });
        Some(Arc::new(SyncedSeries::from_points(points)))
    }

    fn block_gas_rate(&self) -> Arc<dyn Series<BlockNumber, f64>> {
        let apps = self.inner.state.lock().apps.clone();
        let chain = &self.inner.chain;
        let points = (1..=chain.height()).map(|block| {
            let produced = chain.produced_at(block);
            let tps: f64 = apps
                .iter()
                .filter(|app| app.running_at(produced))
                .map(|app| app.tx_per_second)
                .sum();
            let per_block = tps / f64::from(chain.blocks_per_second);
            (block, per_block * GAS_PER_TRANSACTION)
        });
        Arc::new(SyncedSeries::from_points(points))
    }
}

pub struct DryRunNode {
    label: String,
    failing: bool,
    validator_id: Option<ValidatorId>,
    frozen_at: Option<u64>,
    inner: Arc<Inner>,
}

impl fmt::Debug for DryRunNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DryRunNode")
            .field("label", &self.label)
            .field("failing", &self.failing)
            .field("validator_id", &self.validator_id)
            .field("frozen_at", &self.frozen_at)
            .finish_non_exhaustive()
    }
}

impl DryRunNode {
    fn height(&self) -> u64 {
        let height = self.inner.chain.height();
        self.frozen_at.map_or(height, |frozen| frozen.min(height))
    }
}

impl Node for DryRunNode {
    fn label(&self) -> &str {
        &self.label
    }

    fn is_expected_failure(&self) -> bool {
        self.failing
    }

    fn validator_id(&self) -> Option<ValidatorId> {
        self.validator_id
    }

    fn dial_rpc(&self) -> Result<Box<dyn RpcClient>, RpcError> {
        Ok(Box::new(DryRunRpc {
            height: self.height(),
            inner: self.inner.clone(),
        }))
    }

    fn stop(&self) -> Result<(), NetworkError> {
        debug!(node = %self.label, "node stopped");
        Ok(())
    }

    fn cleanup(&self) -> Result<(), NetworkError> {
        Ok(())
    }
}

/// RPC view of one node, pinned to its height at dial time.
struct DryRunRpc {
    height: u64,
    inner: Arc<Inner>,
}

impl RpcClient for DryRunRpc {
    fn block_number(&self) -> Result<String, RpcError> {
        Ok(format!("0x{:x}", self.height))
    }

    fn block_hash(&self, height: u64) -> Result<String, RpcError> {
        if height > self.height {
            return Err(RpcError::Call {
                method: "eth_getBlockByNumber".into(),
                reason: format!("block {height} not found"),
            });
        }
        Ok(block_hash(height))
    }

    fn register_validator(&self) -> Result<ValidatorId, RpcError> {
        let mut state = self.inner.state.lock();
        let registered = state
            .tracker
            .next_available_id()
            .and_then(|id| state.tracker.notify_registered_id(id).map(|_| id));
        registered.map_err(|e| RpcError::Call {
            method: "registerValidator".into(),
            reason: e.to_string(),
        })
    }

    fn unregister_validator(&self, id: ValidatorId) -> Result<(), RpcError> {
        self.inner
            .state
            .lock()
            .tracker
            .release(id)
            .map_err(|e| RpcError::Call {
                method: "unregisterValidator".into(),
                reason: e.to_string(),
            })
    }
}

struct DryRunApp {
    name: String,
    index: usize,
    inner: Arc<Inner>,
}

impl DryRunApp {
    fn update(&self, f: impl FnOnce(&mut AppWindow, Time)) -> Result<(), NetworkError> {
        let now = self.inner.chain.clock.now();
        let mut state = self.inner.state.lock();
        let window = state
            .apps
            .get_mut(self.index)
            .ok_or_else(|| NetworkError::operation("update", &self.name, "unknown application"))?;
        f(window, now);
        Ok(())
    }
}

impl Application for DryRunApp {
    fn start(&self) -> Result<(), NetworkError> {
        self.update(|window, now| window.started = Some(now))
    }

    fn stop(&self) -> Result<(), NetworkError> {
        self.update(|window, now| window.stopped = Some(now))
    }
}
