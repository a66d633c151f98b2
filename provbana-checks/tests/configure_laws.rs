use std::sync::Arc;

use provbana_checks::monitoring::BlockStatus;
use provbana_checks::{Checker, MemoryMonitor, MonitoringData, Registry};
use provbana_config::CheckerConfig;
use provbana_core::error::{NetworkError, RpcError};
use provbana_core::network::{
    Application, ApplicationConfig, Network, NetworkRules, Node, NodeConfig, RpcClient,
};

/// A network without nodes; enough for monitor-driven checks.
struct EmptyNetwork;

impl Network for EmptyNetwork {
    fn active_nodes(&self) -> Vec<Arc<dyn Node>> {
        Vec::new()
    }

    fn create_node(&self, config: &NodeConfig) -> Result<Arc<dyn Node>, NetworkError> {
        Err(NetworkError::operation("create", &config.name, "empty network"))
    }

    fn remove_node(&self, node: &dyn Node) -> Result<(), NetworkError> {
        Err(NetworkError::NodeNotFound(node.label().to_string()))
    }

    fn create_application(
        &self,
        config: &ApplicationConfig,
    ) -> Result<Arc<dyn Application>, NetworkError> {
        Err(NetworkError::operation("create", &config.name, "empty network"))
    }

    fn apply_network_rules(&self, _rules: &NetworkRules) -> Result<(), NetworkError> {
        Ok(())
    }

    fn advance_epoch(&self, _epochs: u32) -> Result<(), NetworkError> {
        Ok(())
    }

    fn dial_random_rpc(&self) -> Result<Box<dyn RpcClient>, RpcError> {
        Err(RpcError::Dial("empty network".into()))
    }
}

fn stalled_monitor() -> Arc<MemoryMonitor> {
    let monitor = Arc::new(MemoryMonitor::new());
    for i in 0..12 {
        monitor.record_block_status("A", i, BlockStatus::at(4));
        monitor.record_gas_rate(i as u64 + 1, 40.0);
    }
    monitor
}

fn outcome(checker: &dyn Checker) -> Result<(), String> {
    checker.check().map_err(|e| e.to_string())
}

#[test]
fn empty_config_preserves_behaviour_of_every_builtin() {
    let monitor: Arc<dyn MonitoringData> = stalled_monitor();
    let checks = Registry::with_defaults().init_network_checks(Arc::new(EmptyNetwork), monitor);

    for name in ["block_gas_rate", "block_height", "blocks_hashes", "blocks_rolling"] {
        let checker = checks.get(name).unwrap();
        let same = checker.configure(&CheckerConfig::default()).unwrap();
        assert_eq!(outcome(checker.as_ref()), outcome(same.as_ref()), "{name}");
    }
}

#[test]
fn configure_leaves_receiver_untouched() {
    let monitor: Arc<dyn MonitoringData> = stalled_monitor();
    let checks = Registry::with_defaults().init_network_checks(Arc::new(EmptyNetwork), monitor);
    let gas = checks.get("block_gas_rate").unwrap();

    let strict = gas
        .configure(&CheckerConfig::default().with_ceiling(10.0))
        .unwrap();
    let inverted = gas
        .configure(&CheckerConfig::default().with_failing(true))
        .unwrap();

    assert!(strict.check().is_err());
    assert!(inverted.check().is_err());
    assert!(gas.check().is_ok());
}

#[test]
fn stalled_network_can_be_expected() {
    let monitor: Arc<dyn MonitoringData> = stalled_monitor();
    let checks = Registry::with_defaults().init_network_checks(Arc::new(EmptyNetwork), monitor);
    let rolling = checks.get("blocks_rolling").unwrap();

    assert!(rolling.check().is_err());
    let expected = rolling
        .configure(&CheckerConfig::default().with_error("nodes stopped producing blocks"))
        .unwrap();
    assert!(expected.check().is_ok());
}

/// Node `A` produces a block per sample until `stall`, then stops.
fn monitor_stalling_at(stall: i64) -> Arc<MemoryMonitor> {
    let monitor = Arc::new(MemoryMonitor::new());
    for i in 0..14 {
        monitor.record_block_status("A", i, BlockStatus::at(i.min(stall) as u64));
    }
    monitor
}

#[test]
fn recent_stall_can_be_required() {
    let not_rolling = CheckerConfig::default()
        .with_tolerance(5)
        .with_start(6)
        .with_failing(true);

    let stalled = Registry::with_defaults()
        .init_network_checks(Arc::new(EmptyNetwork), monitor_stalling_at(6));
    let checker = stalled
        .get("blocks_rolling")
        .unwrap()
        .configure(&not_rolling)
        .unwrap();
    assert_eq!(outcome(checker.as_ref()), Ok(()));

    let live = Registry::with_defaults()
        .init_network_checks(Arc::new(EmptyNetwork), monitor_stalling_at(i64::MAX));
    let checker = live
        .get("blocks_rolling")
        .unwrap()
        .configure(&not_rolling)
        .unwrap();
    assert!(checker.check().is_err());
}
