//! ## provbana-checks::checker
//! **Checker contract, named registry and the per-scenario check set**
//!
//! A `Registry` maps check names to factories. `Registry::init_network_checks`
//! instantiates one checker per registered name for a given network and
//! monitor, producing the `Checks` of one scenario run. Registries are plain
//! values; nothing is shared between instances.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use provbana_config::CheckerConfig;
use provbana_core::network::Network;
use tracing::debug;

use crate::decorators::decorate;
use crate::error::{CheckError, ConfigureError};
use crate::monitoring::MonitoringData;
use crate::{block_gas_rate, block_height, blocks_hashes, blocks_rolling};

/// A read-only validation of network state.
pub trait Checker: Send + Sync {
    /// Runs the validation. Repeated calls observe the network, never change it.
    fn check(&self) -> Result<(), CheckError>;

    /// Returns a new checker with `config` merged over the current settings.
    /// The receiver is left untouched. An empty config yields an equivalent
    /// checker.
    fn configure(&self, config: &CheckerConfig) -> Result<Box<dyn Checker>, ConfigureError>;
}

/// Builds a checker for a network and its monitoring data.
pub type Factory =
    Arc<dyn Fn(&Arc<dyn Network>, &Arc<dyn MonitoringData>) -> Box<dyn Checker> + Send + Sync>;

/// Named checker factories.
#[derive(Clone, Default)]
pub struct Registry {
    factories: BTreeMap<String, Factory>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in checker.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(block_height::NAME, |net, _| {
            Box::new(block_height::BlockHeightChecker::new(net.clone()))
        });
        registry.register(block_gas_rate::NAME, |_, monitor| {
            Box::new(block_gas_rate::BlockGasRateChecker::new(monitor.clone()))
        });
        registry.register(blocks_rolling::NAME, |_, monitor| {
            Box::new(blocks_rolling::BlocksRollingChecker::new(monitor.clone()))
        });
        registry.register(blocks_hashes::NAME, |net, _| {
            Box::new(blocks_hashes::BlocksHashesChecker::new(net.clone()))
        });
        registry
    }

    /// Registers `factory` under `name`, replacing an earlier registration.
    /// Produced checkers are wrapped in the expect-error and expect-failure
    /// decorators, so every check understands the `error` and `failing` keys.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&Arc<dyn Network>, &Arc<dyn MonitoringData>) -> Box<dyn Checker>
            + Send
            + Sync
            + 'static,
    {
        let factory: Factory = Arc::new(
            move |net: &Arc<dyn Network>, monitor: &Arc<dyn MonitoringData>| {
                decorate(factory(net, monitor))
            },
        );
        self.factories.insert(name.into(), factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Instantiates every registered checker.
    pub fn init_network_checks(
        &self,
        network: Arc<dyn Network>,
        monitor: Arc<dyn MonitoringData>,
    ) -> Checks {
        let checkers = self
            .factories
            .iter()
            .map(|(name, factory)| {
                debug!(check = %name, "instantiating checker");
                let checker: Arc<dyn Checker> = Arc::from(factory(&network, &monitor));
                (name.clone(), checker)
            })
            .collect();
        Checks { checkers }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}

/// The checkers of one scenario run, by name.
#[derive(Clone, Default)]
pub struct Checks {
    checkers: BTreeMap<String, Arc<dyn Checker>>,
}

impl Checks {
    pub fn get(&self, name: &str) -> Option<Arc<dyn Checker>> {
        self.checkers.get(name).cloned()
    }

    pub fn insert(&mut self, name: impl Into<String>, checker: Arc<dyn Checker>) {
        self.checkers.insert(name.into(), checker);
    }

    pub fn len(&self) -> usize {
        self.checkers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkers.is_empty()
    }

    /// Runs every checker. All failures are reported, none short-circuits.
    pub fn check(&self) -> Result<(), CheckError> {
        let failures = self.checkers.iter().filter_map(|(name, checker)| {
            let res = checker.check();
            debug!(check = %name, passed = res.is_ok(), "network check finished");
            res.err()
        });
        match CheckError::aggregate(failures) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Checks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.checkers.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::MemoryMonitor;
    use crate::testing::{FakeNetwork, FixedChecker};

    fn checks_of(outcomes: &[Result<(), &'static str>]) -> Checks {
        let mut checks = Checks::default();
        for (i, outcome) in outcomes.iter().enumerate() {
            checks.insert(format!("c{i}"), Arc::new(FixedChecker::new(*outcome)));
        }
        checks
    }

    #[test]
    fn aggregate_contains_every_failure_once() {
        let checks = checks_of(&[Err("one"), Ok(()), Err("two"), Ok(()), Err("three")]);
        let err = checks.check().unwrap_err();
        let messages: Vec<_> = err.errors().iter().map(|e| e.to_string()).collect();
        assert_eq!(messages, ["one", "two", "three"]);
    }

    #[test]
    fn all_passing_is_ok() {
        assert!(checks_of(&[Ok(()), Ok(())]).check().is_ok());
        assert!(Checks::default().check().is_ok());
    }

    #[test]
    fn default_registry_instantiates_builtins() {
        let registry = Registry::with_defaults();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(
            names,
            ["block_gas_rate", "block_height", "blocks_hashes", "blocks_rolling"]
        );

        let checks = registry.init_network_checks(
            Arc::new(FakeNetwork::default()),
            Arc::new(MemoryMonitor::new()),
        );
        assert_eq!(checks.len(), 4);
        assert!(checks.get("block_height").is_some());
        assert!(checks.get("nope").is_none());
    }

    #[test]
    fn registries_are_independent() {
        let mut first = Registry::new();
        first.register("custom", |_, _| Box::new(FixedChecker::new(Ok(()))));
        let second = Registry::with_defaults();
        assert!(first.contains("custom"));
        assert!(!second.contains("custom"));
        assert!(!first.contains("block_height"));
    }
}
