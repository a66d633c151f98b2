//! Options of a scenario check entry.
//!
//! Read straight from the `config:` map of a `checks:` entry. Every option is
//! optional and individual checkers only look at the ones they understand;
//! other keys are dropped on deserialization. Range rules are enforced with
//! `validator` when the scenario is checked.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CheckerConfig {
    /// Upper bound for the block gas rate.
    #[validate(range(min = 0.0))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ceiling: Option<f64>,

    /// Blocks a node may lag behind the network maximum.
    #[validate(range(min = 0, max = 255))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slack: Option<i64>,

    /// Samples between the compared edges of the liveness window.
    #[validate(range(min = 1))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<i64>,

    /// Earliest series position considered by the liveness check.
    #[validate(range(min = 0))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,

    /// Invert the outcome: the check passes only if it would fail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failing: Option<bool>,

    /// Expect the check to fail with a message containing this text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckerConfig {
    /// True when no option is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn with_ceiling(mut self, ceiling: f64) -> Self {
        self.ceiling = Some(ceiling);
        self
    }

    pub fn with_slack(mut self, slack: i64) -> Self {
        self.slack = Some(slack);
        self
    }

    pub fn with_tolerance(mut self, tolerance: i64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    pub fn with_start(mut self, start: i64) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_failing(mut self, failing: bool) -> Self {
        self.failing = Some(failing);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// A copy without the `failing` key, for forwarding past a decorator.
    pub fn without_failing(&self) -> Self {
        Self {
            failing: None,
            ..self.clone()
        }
    }

    /// A copy without the `error` key, for forwarding past a decorator.
    pub fn without_error(&self) -> Self {
        Self {
            error: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_known_keys_and_ignores_the_rest() {
        let cfg: CheckerConfig =
            serde_yaml::from_str("slack: 7\nfailing: true\nrandom: config").unwrap();
        assert_eq!(cfg, CheckerConfig::default().with_slack(7).with_failing(true));
    }

    #[test]
    fn integer_ceiling_is_accepted() {
        let cfg: CheckerConfig = serde_yaml::from_str("ceiling: 30").unwrap();
        assert_eq!(cfg.ceiling, Some(30.0));
    }

    #[test]
    fn type_mismatch_names_the_field() {
        let err = serde_yaml::from_str::<CheckerConfig>("slack: abcd").unwrap_err();
        assert!(err.to_string().contains("slack"), "{err}");
    }

    #[test]
    fn ranges_are_validated() {
        assert!(CheckerConfig::default().with_slack(255).validate().is_ok());
        assert!(CheckerConfig::default().with_slack(256).validate().is_err());
        assert!(CheckerConfig::default().with_slack(-1).validate().is_err());
        assert!(CheckerConfig::default().with_ceiling(-0.5).validate().is_err());
        assert!(CheckerConfig::default().with_tolerance(0).validate().is_err());
        assert!(CheckerConfig::default().with_start(-3).validate().is_err());
    }

    #[test]
    fn stripping_decorator_keys() {
        let cfg = CheckerConfig::default()
            .with_failing(true)
            .with_error("boom")
            .with_slack(3);
        assert_eq!(cfg.without_failing().failing, None);
        assert_eq!(cfg.without_error().error, None);
        assert_eq!(cfg.without_error().without_failing(), CheckerConfig::default().with_slack(3));
        assert!(!cfg.is_empty());
        assert!(CheckerConfig::default().is_empty());
    }
}
