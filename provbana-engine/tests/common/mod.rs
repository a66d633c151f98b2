#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use provbana_checks::{CheckError, Checker, Checks, ConfigureError, MemoryMonitor, Registry};
use provbana_config::{CheckerConfig, Scenario};
use provbana_core::network::{
    Application, ApplicationConfig, Network, NetworkRules, Node, NodeConfig, RpcClient,
    ValidatorId,
};
use provbana_core::{NetworkError, RpcError};
use provbana_engine::{RegistryError, ValidatorRegistry};

/// Ordered record of every call the doubles receive.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.0.lock().iter().position(|e| e == entry)
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.position(entry).is_some()
    }
}

#[derive(Debug)]
pub struct RecordingNode {
    label: String,
    validator_id: Option<ValidatorId>,
    journal: Journal,
}

impl std::fmt::Debug for Journal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.0.lock().iter()).finish()
    }
}

impl Node for RecordingNode {
    fn label(&self) -> &str {
        &self.label
    }

    fn is_expected_failure(&self) -> bool {
        false
    }

    fn validator_id(&self) -> Option<ValidatorId> {
        self.validator_id
    }

    fn dial_rpc(&self) -> Result<Box<dyn RpcClient>, RpcError> {
        Err(RpcError::Dial(format!("{} has no RPC", self.label)))
    }

    fn stop(&self) -> Result<(), NetworkError> {
        self.journal.push(format!("stop {}", self.label));
        Ok(())
    }

    fn cleanup(&self) -> Result<(), NetworkError> {
        self.journal.push(format!("cleanup {}", self.label));
        Ok(())
    }
}

struct RecordingApp {
    name: String,
    journal: Journal,
}

impl Application for RecordingApp {
    fn start(&self) -> Result<(), NetworkError> {
        self.journal.push(format!("start app {}", self.name));
        Ok(())
    }

    fn stop(&self) -> Result<(), NetworkError> {
        self.journal.push(format!("stop app {}", self.name));
        Ok(())
    }
}

struct RecordingRpc {
    journal: Journal,
    next_id: Arc<Mutex<ValidatorId>>,
}

impl RpcClient for RecordingRpc {
    fn block_number(&self) -> Result<String, RpcError> {
        Ok("0x10".into())
    }

    fn block_hash(&self, height: u64) -> Result<String, RpcError> {
        Ok(format!("0x{height:x}"))
    }

    fn register_validator(&self) -> Result<ValidatorId, RpcError> {
        let mut next = self.next_id.lock();
        let id = *next;
        *next += 1;
        self.journal.push(format!("rpc register {id}"));
        Ok(id)
    }

    fn unregister_validator(&self, id: ValidatorId) -> Result<(), RpcError> {
        self.journal.push(format!("rpc unregister {id}"));
        Ok(())
    }
}

/// Network double journaling every lifecycle call. Rules containing the key
/// `FAIL` are rejected.
#[derive(Default)]
pub struct RecordingNetwork {
    pub journal: Journal,
    active: Mutex<Vec<Arc<dyn Node>>>,
    created: Mutex<Vec<NodeConfig>>,
    next_id: Arc<Mutex<ValidatorId>>,
    rpc_down: bool,
}

impl RecordingNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::with_next_id(1))
    }

    pub fn with_next_id(id: ValidatorId) -> Self {
        Self {
            next_id: Arc::new(Mutex::new(id)),
            ..Self::default()
        }
    }

    pub fn without_rpc() -> Arc<Self> {
        Arc::new(Self {
            rpc_down: true,
            ..Self::default()
        })
    }

    /// A validator that was started together with the network.
    pub fn with_validator(self: Arc<Self>, label: &str, id: ValidatorId) -> Arc<Self> {
        self.active.lock().push(Arc::new(RecordingNode {
            label: label.to_string(),
            validator_id: Some(id),
            journal: self.journal.clone(),
        }));
        self
    }

    pub fn created(&self) -> Vec<NodeConfig> {
        self.created.lock().clone()
    }

    pub fn active_labels(&self) -> Vec<String> {
        self.active
            .lock()
            .iter()
            .map(|n| n.label().to_string())
            .collect()
    }
}

impl Network for RecordingNetwork {
    fn active_nodes(&self) -> Vec<Arc<dyn Node>> {
        self.active.lock().clone()
    }

    fn create_node(&self, config: &NodeConfig) -> Result<Arc<dyn Node>, NetworkError> {
        self.journal.push(format!("create {}", config.name));
        self.created.lock().push(config.clone());
        let node: Arc<dyn Node> = Arc::new(RecordingNode {
            label: config.name.clone(),
            validator_id: config.validator_id,
            journal: self.journal.clone(),
        });
        self.active.lock().push(node.clone());
        Ok(node)
    }

    fn remove_node(&self, node: &dyn Node) -> Result<(), NetworkError> {
        self.journal.push(format!("remove {}", node.label()));
        let mut active = self.active.lock();
        let before = active.len();
        active.retain(|n| n.label() != node.label());
        if active.len() == before {
            return Err(NetworkError::NodeNotFound(node.label().to_string()));
        }
        Ok(())
    }

    fn create_application(
        &self,
        config: &ApplicationConfig,
    ) -> Result<Arc<dyn Application>, NetworkError> {
        self.journal.push(format!("create app {}", config.name));
        Ok(Arc::new(RecordingApp {
            name: config.name.clone(),
            journal: self.journal.clone(),
        }))
    }

    fn apply_network_rules(&self, rules: &NetworkRules) -> Result<(), NetworkError> {
        if rules.contains_key("FAIL") {
            return Err(NetworkError::operation("apply", "network rules", "rejected"));
        }
        for (key, value) in rules {
            self.journal.push(format!("rules {key}={value}"));
        }
        Ok(())
    }

    fn advance_epoch(&self, epochs: u32) -> Result<(), NetworkError> {
        self.journal.push(format!("epoch +{epochs}"));
        Ok(())
    }

    fn dial_random_rpc(&self) -> Result<Box<dyn RpcClient>, RpcError> {
        if self.rpc_down {
            return Err(RpcError::Dial("no RPC nodes".into()));
        }
        Ok(Box::new(RecordingRpc {
            journal: self.journal.clone(),
            next_id: self.next_id.clone(),
        }))
    }
}

/// Registry handing out scripted ids.
pub struct ScriptedRegistry {
    journal: Journal,
    ids: Mutex<VecDeque<ValidatorId>>,
}

impl ScriptedRegistry {
    pub fn new(journal: &Journal, ids: impl IntoIterator<Item = ValidatorId>) -> Arc<Self> {
        Arc::new(Self {
            journal: journal.clone(),
            ids: Mutex::new(ids.into_iter().collect()),
        })
    }
}

impl ValidatorRegistry for ScriptedRegistry {
    fn register_new_validator(&self) -> Result<ValidatorId, RegistryError> {
        let id = self.ids.lock().pop_front().ok_or_else(|| {
            RegistryError::Register(RpcError::Call {
                method: "register".into(),
                reason: "no ids left".into(),
            })
        })?;
        self.journal.push(format!("register {id}"));
        Ok(id)
    }

    fn unregister_validator(&self, id: ValidatorId) -> Result<(), RegistryError> {
        self.journal.push(format!("unregister {id}"));
        Ok(())
    }
}

/// Checker counting its invocations.
#[derive(Clone)]
pub struct CountingChecker {
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl Checker for CountingChecker {
    fn check(&self) -> Result<(), CheckError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(CheckError::violation("counting check failed"))
        } else {
            Ok(())
        }
    }

    fn configure(&self, _config: &CheckerConfig) -> Result<Box<dyn Checker>, ConfigureError> {
        Ok(Box::new(self.clone()))
    }
}

/// Default checks plus a `counting` check sharing `calls`.
pub fn checks_with_counter(
    net: Arc<dyn Network>,
    calls: Arc<AtomicUsize>,
    fail: bool,
) -> Checks {
    let mut registry = Registry::with_defaults();
    registry.register("counting", move |_, _| {
        Box::new(CountingChecker {
            calls: calls.clone(),
            fail,
        })
    });
    registry.init_network_checks(net, Arc::new(MemoryMonitor::new()))
}

/// Only the `counting` check.
pub fn counting_checks(net: Arc<dyn Network>, calls: Arc<AtomicUsize>, fail: bool) -> Checks {
    let mut registry = Registry::new();
    registry.register("counting", move |_, _| {
        Box::new(CountingChecker {
            calls: calls.clone(),
            fail,
        })
    });
    registry.init_network_checks(net, Arc::new(MemoryMonitor::new()))
}

pub fn scenario(yaml: &str) -> Scenario {
    Scenario::from_yaml_str(yaml).expect("test scenario parses")
}
