//! ## provbana-engine::schedule
//! **Translation of scenario declarations into timed events**
//!
//! Every event owns an immutable copy of what it needs (labels, configs,
//! shared handles). The only state shared between events is explicit: the
//! node slot of an instance, written by its create event and read by its
//! leave or stop event, and the first validator id of a node group.

use std::sync::Arc;

use parking_lot::Mutex;
use provbana_checks::{Checker, Checks};
use provbana_config::scenario::{
    AdvanceEpoch, ApplicationGroup, Cheat, NetworkRulesUpdate, NodeGroup, ValidatorGroup,
};
use provbana_core::events::{Event, EventQueue};
use provbana_core::network::{
    ApplicationConfig, Network, Node, NodeConfig, ValidatorId, DEFAULT_CLIENT_IMAGE,
};
use provbana_core::time::Time;
use provbana_core::NetworkError;
use tracing::{debug, info, warn};

use crate::error::LifecycleError;
use crate::registry::ValidatorRegistry;

fn seconds(secs: f32) -> Time {
    Time::from_secs_f32(secs)
}

fn instance_label(group: &str, index: u32) -> String {
    format!("{group}-{index}")
}

/// Builds the initial event queue of one run.
pub(crate) struct Schedule {
    net: Arc<dyn Network>,
    registry: Arc<dyn ValidatorRegistry>,
    end: Time,
    queue: EventQueue,
}

impl Schedule {
    pub(crate) fn new(
        net: Arc<dyn Network>,
        registry: Arc<dyn ValidatorRegistry>,
        end: Time,
    ) -> Self {
        let mut queue = EventQueue::new();
        queue.add(Event::noop(end, "shutdown"));
        Self {
            net,
            registry,
            end,
            queue,
        }
    }

    pub(crate) fn into_queue(self) -> EventQueue {
        self.queue
    }

    /// Network wide consistency check right before shutdown.
    pub(crate) fn consistency_check(&mut self, checks: Checks) {
        let time = self.end.saturating_sub(std::time::Duration::from_nanos(1));
        self.queue.add(Event::single(time, "consistency check", move || {
            info!("Checking network consistency ...");
            checks.check()?;
            Ok(())
        }));
    }

    /// Validators are started with the network; only their shutdown is
    /// scheduled.
    pub(crate) fn validators(&mut self, groups: &[ValidatorGroup]) {
        for group in groups {
            let Some(end) = group.end else {
                continue;
            };
            for i in 0..group.instances.unwrap_or(1) {
                let label = instance_label(&group.name, i);
                let net = self.net.clone();
                let registry = self.registry.clone();
                self.queue.add(Event::single(
                    seconds(end),
                    format!("[{label}] Stop Validator"),
                    move || {
                        stop_validator(net.as_ref(), registry.as_ref(), &label)?;
                        Ok(())
                    },
                ));
            }
        }
    }

    pub(crate) fn nodes(&mut self, group: &NodeGroup) {
        let validator = group.is_validator();
        let image = group
            .client
            .image
            .clone()
            .filter(|image| !image.is_empty())
            .unwrap_or_else(|| DEFAULT_CLIENT_IMAGE.to_string());
        let first_id = Arc::new(Mutex::new(group.client.validator_id));
        let end = group.end.map(seconds).unwrap_or(self.end);
        let unregister_on_stop = validator && end != self.end;

        for index in 0..group.instances.unwrap_or(1) {
            let instance = NodeInstance {
                label: instance_label(&group.name, index),
                index,
                failing: group.failing,
                image: image.clone(),
                validator,
                data_volume: group.client.data_volume.clone(),
                first_id: first_id.clone(),
                slot: Arc::new(Mutex::new(None)),
                net: self.net.clone(),
                registry: self.registry.clone(),
            };

            if let Some(start) = group.start {
                let instance = instance.clone();
                self.queue.add(Event::single(
                    seconds(start),
                    format!("[{}] Creating node", instance.label),
                    move || Ok(instance.start()?),
                ));
            }
            if let Some(rejoin) = group.rejoin {
                let instance = instance.clone();
                self.queue.add(Event::single(
                    seconds(rejoin),
                    format!("[{}] Creating rejoining node", instance.label),
                    move || Ok(instance.rejoin()?),
                ));
            }
            if let Some(leave) = group.leave {
                let instance = instance.clone();
                self.queue.add(Event::single(
                    seconds(leave),
                    format!("[{}] Node Leaving", instance.label),
                    move || Ok(instance.stop(false)?),
                ));
            }
            if group.end.is_some() {
                self.queue.add(Event::single(
                    end,
                    format!("[{}] Stop Node", instance.label),
                    move || Ok(instance.stop(unregister_on_stop)?),
                ));
            }
        }
    }

    /// Creates the applications right away; starting and stopping them is
    /// scheduled.
    pub(crate) fn applications(&mut self, group: &ApplicationGroup) -> Result<(), NetworkError> {
        let start = group.start.map(seconds).unwrap_or(Time::ZERO);
        let end = group.end.map(seconds).unwrap_or(self.end);
        for i in 0..group.instances.unwrap_or(1) {
            let name = instance_label(&group.name, i);
            let app = self.net.create_application(&ApplicationConfig {
                name: name.clone(),
                kind: group.kind.clone(),
                rate: group.rate,
                users: group.users.unwrap_or(1),
            })?;
            debug!(application = %name, "application created");

            let starting = app.clone();
            self.queue.add(Event::single(
                start,
                format!("starting app {name}"),
                move || Ok(starting.start()?),
            ));
            self.queue.add(Event::single(
                end,
                format!("stopping app {name}"),
                move || Ok(app.stop()?),
            ));
        }
        Ok(())
    }

    /// Cheats are recorded in the event log but have no effect.
    pub(crate) fn cheat(&mut self, cheat: &Cheat) {
        let name = cheat.name.clone();
        self.queue.add(Event::single(
            cheat.start.map(seconds).unwrap_or(Time::ZERO),
            format!("Attempting Cheat {name} - currently unsupported cheat, nothing happens"),
            move || {
                warn!(cheat = %name, "cheats are not supported");
                Ok(())
            },
        ));
    }

    pub(crate) fn network_rules(&mut self, update: &NetworkRulesUpdate) {
        let net = self.net.clone();
        let rules = update.rules.clone();
        self.queue.add(Event::single(
            seconds(update.time),
            format!("Applying network rules: {rules:?}"),
            move || Ok(net.apply_network_rules(&rules)?),
        ));
    }

    pub(crate) fn advance_epoch(&mut self, advance: &AdvanceEpoch) {
        let net = self.net.clone();
        let epochs = advance.epochs();
        self.queue.add(Event::single(
            seconds(advance.time),
            format!("Advancing Epoch by {epochs}"),
            move || Ok(net.advance_epoch(epochs)?),
        ));
    }

    pub(crate) fn check(&mut self, time: f32, name: &str, checker: Arc<dyn Checker>) {
        self.queue.add(Event::single(
            seconds(time),
            format!("Check [{name}]"),
            move || Ok(checker.check()?),
        ));
    }
}

fn stop_validator(
    net: &dyn Network,
    registry: &dyn ValidatorRegistry,
    label: &str,
) -> Result<(), LifecycleError> {
    let node = net
        .active_nodes()
        .into_iter()
        .find(|node| node.label() == label)
        .ok_or_else(|| LifecycleError::ValidatorNotFound(label.to_string()))?;
    let subject = format!("validator {label}");

    if let Some(id) = node.validator_id() {
        registry
            .unregister_validator(id)
            .map_err(|e| NetworkError::operation("unregister", &subject, e))?;
    }
    net.remove_node(node.as_ref())
        .map_err(|e| NetworkError::operation("remove", &subject, e))?;
    node.stop()
        .map_err(|e| NetworkError::operation("stop", &subject, e))?;
    node.cleanup()
        .map_err(|e| NetworkError::operation("cleanup", &subject, e))?;
    Ok(())
}

/// One instance of a node group with the state its events share.
#[derive(Clone)]
struct NodeInstance {
    label: String,
    index: u32,
    failing: bool,
    image: String,
    validator: bool,
    data_volume: Option<String>,
    /// Validator id of instance 0, explicit or learned from the network.
    first_id: Arc<Mutex<Option<ValidatorId>>>,
    slot: Arc<Mutex<Option<Arc<dyn Node>>>>,
    net: Arc<dyn Network>,
    registry: Arc<dyn ValidatorRegistry>,
}

impl NodeInstance {
    fn start(&self) -> Result<(), LifecycleError> {
        let id = if self.validator {
            Some(self.register()?)
        } else {
            None
        };
        self.create(id)
    }

    /// Rejoining validators reuse their identity and are not registered again.
    fn rejoin(&self) -> Result<(), LifecycleError> {
        let id = if self.validator {
            let first = *self.first_id.lock();
            first.map(|first| first.saturating_add(self.index))
        } else {
            None
        };
        self.create(id)
    }

    /// Ids of a group are contiguous from the id of its first instance.
    fn register(&self) -> Result<ValidatorId, LifecycleError> {
        let id = self.registry.register_new_validator()?;
        let mut first = self.first_id.lock();
        let known = *first;
        match known {
            Some(base) => {
                let expected = base.saturating_add(self.index);
                if expected != id {
                    return Err(LifecycleError::ValidatorIdMismatch { expected, got: id });
                }
            }
            None => *first = Some(id.saturating_sub(self.index)),
        }
        Ok(id)
    }

    fn create(&self, validator_id: Option<ValidatorId>) -> Result<(), LifecycleError> {
        let node = self.net.create_node(&NodeConfig {
            name: self.label.clone(),
            failing: self.failing,
            image: self.image.clone(),
            validator: self.validator,
            validator_id,
            cheater: false,
            data_volume: self.data_volume.clone(),
        })?;
        *self.slot.lock() = Some(node);
        Ok(())
    }

    fn stop(&self, unregister: bool) -> Result<(), LifecycleError> {
        let Some(node) = self.slot.lock().take() else {
            debug!(node = %self.label, "node not running, nothing to stop");
            return Ok(());
        };
        if unregister {
            if let Some(id) = node.validator_id() {
                self.registry.unregister_validator(id)?;
            }
        }
        self.net.remove_node(node.as_ref())?;
        node.stop()?;
        node.cleanup()?;
        Ok(())
    }
}
