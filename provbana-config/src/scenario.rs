//! Scenario declarations.
//!
//! A scenario is a YAML document describing the nodes, load generators and
//! perturbations of one run together with the checks to evaluate. Times are
//! seconds relative to the scenario start. Parsing only establishes the
//! shape; `Scenario::check` enforces the semantic rules and reports every
//! violation at once.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use provbana_core::network::{NetworkRules, Rate};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::checker::CheckerConfig;
use crate::error::{ConfigError, ScenarioError};
use crate::validation::{check_time_interval, is_valid_name, NAME_PATTERN};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub name: String,
    /// Length of the run in seconds.
    pub duration: f32,
    /// Artificial network latency in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_trip_time: Option<f32>,
    #[serde(default)]
    pub validators: Vec<ValidatorGroup>,
    #[serde(default)]
    pub nodes: Vec<NodeGroup>,
    #[serde(default)]
    pub applications: Vec<ApplicationGroup>,
    #[serde(default)]
    pub cheats: Vec<Cheat>,
    #[serde(default)]
    pub network_rules: NetworkRulesSchedule,
    #[serde(default)]
    pub advance_epoch: Vec<AdvanceEpoch>,
    #[serde(default)]
    pub checks: Vec<CheckEntry>,
}

/// Validators started with the network.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatorGroup {
    pub name: String,
    #[serde(default)]
    pub failing: bool,
    /// Missing means one instance.
    #[serde(default)]
    pub instances: Option<u32>,
    #[serde(default, alias = "imagename")]
    pub image: Option<String>,
    /// Missing means the validators run until the scenario ends.
    #[serde(default)]
    pub end: Option<f32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    #[default]
    Observer,
    Rpc,
    Validator,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientSpec {
    #[serde(default, alias = "imagename")]
    pub image: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: NodeKind,
    /// Validator id expected for the first instance of the group.
    #[serde(default, rename = "val_id")]
    pub validator_id: Option<u32>,
    #[serde(default)]
    pub data_volume: Option<String>,
}

/// Nodes joining and leaving during the run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeGroup {
    pub name: String,
    #[serde(default)]
    pub failing: bool,
    #[serde(default)]
    pub instances: Option<u32>,
    #[serde(default)]
    pub start: Option<f32>,
    #[serde(default)]
    pub rejoin: Option<f32>,
    #[serde(default)]
    pub end: Option<f32>,
    #[serde(default)]
    pub leave: Option<f32>,
    #[serde(default)]
    pub client: ClientSpec,
}

impl NodeGroup {
    pub fn is_validator(&self) -> bool {
        self.client.kind == NodeKind::Validator
    }
}

/// Load generators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationGroup {
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub instances: Option<u32>,
    /// Missing means one user.
    #[serde(default)]
    pub users: Option<u32>,
    #[serde(default)]
    pub start: Option<f32>,
    #[serde(default)]
    pub end: Option<f32>,
    /// Written as a single-key map, e.g. `constant: 20`.
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub rate: Rate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cheat {
    pub name: String,
    #[serde(default)]
    pub start: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkRulesSchedule {
    /// Rules baked into the genesis. Applied by the network bring-up.
    #[serde(default)]
    pub genesis: NetworkRules,
    #[serde(default)]
    pub updates: Vec<NetworkRulesUpdate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkRulesUpdate {
    pub time: f32,
    pub rules: NetworkRules,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvanceEpoch {
    pub time: f32,
    /// Missing means one epoch.
    #[serde(default)]
    pub epochs: Option<i64>,
}

impl AdvanceEpoch {
    pub fn epochs(&self) -> u32 {
        self.epochs
            .and_then(|e| u32::try_from(e).ok())
            .unwrap_or(1)
    }
}

/// A named check evaluated at a given time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckEntry {
    pub time: f32,
    pub check: String,
    #[serde(default)]
    pub config: CheckerConfig,
}

impl Scenario {
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Reads and parses a scenario file. Semantic checks are left to the caller.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }
        let source = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&source)
    }

    /// Collects every semantic violation of the scenario.
    pub fn check(&self) -> Result<(), ScenarioError> {
        let mut errs = Vec::new();
        if self.name.trim().is_empty() {
            errs.push("scenario name must not be empty".to_string());
        }
        if self.duration <= 0.0 {
            errs.push("scenario duration must be > 0".to_string());
        }
        if let Some(rtt) = self.round_trip_time {
            if rtt < 0.0 {
                errs.push(format!("round trip time must be >= 0, is {rtt}"));
            }
        }

        // Validators and nodes share one namespace.
        let mut names = BTreeSet::new();
        for validator in &self.validators {
            errs.extend(validator.violations(self));
            if !names.insert(validator.name.as_str()) {
                errs.push(format!(
                    "validator names must be unique, {} encountered multiple times",
                    validator.name
                ));
            }
        }
        for node in &self.nodes {
            errs.extend(node.violations(self));
            if !names.insert(node.name.as_str()) {
                errs.push(format!(
                    "node names must be unique, {} encountered multiple times",
                    node.name
                ));
            }
        }

        let mut names = BTreeSet::new();
        for app in &self.applications {
            errs.extend(app.violations(self));
            if !names.insert(app.name.as_str()) {
                errs.push(format!(
                    "application names must be unique, {} encountered multiple times",
                    app.name
                ));
            }
        }

        let mut names = BTreeSet::new();
        for cheat in &self.cheats {
            errs.extend(cheat.violations(self));
            if !names.insert(cheat.name.as_str()) {
                errs.push(format!(
                    "cheat names must be unique, {} encountered multiple times",
                    cheat.name
                ));
            }
        }

        for update in &self.network_rules.updates {
            if update.time < 0.0 {
                errs.push(format!(
                    "network rule update time must be >= 0, is {}",
                    update.time
                ));
            }
        }

        for adv in &self.advance_epoch {
            if adv.time < 0.0 || adv.time > self.duration {
                errs.push(format!("invalid timing for advance epoch: {}", adv.time));
            }
            if let Some(epochs) = adv.epochs {
                if epochs < 1 {
                    errs.push(format!("minimum epoch to advance must be 1, got: {epochs}"));
                }
            }
        }

        for chk in &self.checks {
            if chk.time < 0.0 || chk.time > self.duration {
                errs.push(format!("invalid timing for checks: {}", chk.time));
            }
            if let Err(e) = chk.config.validate() {
                for (field, failures) in e.field_errors() {
                    for failure in failures {
                        errs.push(format!(
                            "invalid config of check {}: {} violates {}",
                            chk.check, field, failure.code
                        ));
                    }
                }
            }
        }

        if errs.is_empty() {
            Ok(())
        } else {
            Err(ScenarioError::new(errs))
        }
    }
}

impl ValidatorGroup {
    fn violations(&self, scenario: &Scenario) -> Vec<String> {
        let mut errs = Vec::new();
        if !self.name.is_empty() && !is_valid_name(&self.name) {
            errs.push(format!(
                "validator name must match {NAME_PATTERN}, got {}",
                self.name
            ));
        }
        errs.extend(check_time_interval(None, self.end, scenario.duration));
        errs
    }
}

impl NodeGroup {
    fn violations(&self, scenario: &Scenario) -> Vec<String> {
        let mut errs = Vec::new();
        if !is_valid_name(&self.name) {
            errs.push(format!("node name must match {NAME_PATTERN}, got {}", self.name));
        }
        if let (Some(start), Some(rejoin)) = (self.start, self.rejoin) {
            errs.push(format!(
                "node cannot have both start and rejoin; start={start}, rejoin={rejoin}"
            ));
        }
        if let (Some(end), Some(leave)) = (self.end, self.leave) {
            errs.push(format!(
                "node cannot have both end and leave; end={end}, leave={leave}"
            ));
        }
        let d = scenario.duration;
        errs.extend(check_time_interval(self.start, self.end, d));
        errs.extend(check_time_interval(self.start, self.leave, d));
        errs.extend(check_time_interval(self.rejoin, self.end, d));
        errs.extend(check_time_interval(self.rejoin, self.leave, d));
        errs
    }
}

impl ApplicationGroup {
    fn violations(&self, scenario: &Scenario) -> Vec<String> {
        let mut errs = Vec::new();
        if !is_valid_name(&self.name) {
            errs.push(format!(
                "application name must match {NAME_PATTERN}, got {}",
                self.name
            ));
        }
        if self.kind.trim().is_empty() {
            errs.push("application type must be specified".to_string());
        }
        if let Some(users) = self.users {
            if users < 1 {
                errs.push(format!("number of users must be >= 1, is {users}"));
            }
        }
        errs.extend(check_time_interval(self.start, self.end, scenario.duration));
        errs.extend(rate_violations(&self.rate));
        errs
    }
}

impl Cheat {
    fn violations(&self, scenario: &Scenario) -> Vec<String> {
        let mut errs = Vec::new();
        if !is_valid_name(&self.name) {
            errs.push(format!("cheat name must match {NAME_PATTERN}, got {}", self.name));
        }
        errs.extend(check_time_interval(self.start, None, scenario.duration));
        errs
    }
}

fn rate_violations(rate: &Rate) -> Vec<String> {
    let mut errs = Vec::new();
    match *rate {
        Rate::Constant(tps) if tps < 0.0 => {
            errs.push(format!("constant transaction rate must be >= 0, got {tps}"));
        }
        Rate::Constant(_) => {}
        Rate::Slope { start, .. } => {
            if start < 0.0 {
                errs.push(format!("initial transaction rate must be >= 0, got {start}"));
            }
        }
        Rate::Wave { min, max, period } => {
            let min = min.unwrap_or(0.0);
            if min < 0.0 {
                errs.push(format!("minimum transaction rate must be >= 0, got {min}"));
            }
            if max < 0.0 {
                errs.push(format!("maximum transaction rate must be >= 0, got {max}"));
            }
            if min > max {
                errs.push(format!(
                    "minimum transaction rate must be <= maximum rate, got {min} > {max}"
                ));
            }
            if period <= 0.0 {
                errs.push(format!("wave period must be > 0, got {period}"));
            }
        }
        Rate::Auto { increase, decrease } => {
            if let Some(inc) = increase {
                if inc <= 0.0 {
                    errs.push(format!(
                        "traffic rate increase per second must be positive, got {inc}"
                    ));
                }
            }
            if let Some(dec) = decrease {
                if !(0.0..=1.0).contains(&dec) {
                    errs.push(format!(
                        "traffic decrease rate must be between 0 and 1, got {dec}"
                    ));
                }
            }
        }
    }
    errs
}
