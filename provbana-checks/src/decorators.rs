//! ## provbana-checks::decorators
//! **Outcome-inverting checker wrappers**
//!
//! Both wrappers follow the same rule when configured: strip their own key,
//! forward the rest to the wrapped checker, then re-arm themselves only if
//! their key asks for it. An unarmed wrapper is transparent. New wrappers
//! must follow the same rule so they compose with these two.

use provbana_config::CheckerConfig;

use crate::checker::Checker;
use crate::error::{CheckError, ConfigureError};

/// Wraps a freshly built checker in every decorator, unarmed.
pub fn decorate(base: Box<dyn Checker>) -> Box<dyn Checker> {
    Box::new(ExpectError::new(Box::new(ExpectFailure::new(base))))
}

/// Passes iff the wrapped check fails with a message containing `expected`.
pub struct ExpectError {
    inner: Box<dyn Checker>,
    expected: Option<String>,
}

impl ExpectError {
    pub fn new(inner: Box<dyn Checker>) -> Self {
        Self {
            inner,
            expected: None,
        }
    }

    pub fn expecting(inner: Box<dyn Checker>, expected: impl Into<String>) -> Self {
        Self {
            inner,
            expected: Some(expected.into()),
        }
    }
}

impl Checker for ExpectError {
    fn check(&self) -> Result<(), CheckError> {
        let Some(expected) = &self.expected else {
            return self.inner.check();
        };
        match self.inner.check() {
            Err(err) if err.to_string().contains(expected.as_str()) => Ok(()),
            _ => Err(CheckError::violation(format!("expected error {expected}"))),
        }
    }

    fn configure(&self, config: &CheckerConfig) -> Result<Box<dyn Checker>, ConfigureError> {
        let inner = self.inner.configure(&config.without_error())?;
        let expected = match &config.error {
            Some(expected) => Some(expected.clone()),
            None if config.is_empty() => self.expected.clone(),
            None => None,
        };
        Ok(Box::new(Self { inner, expected }))
    }
}

/// Passes iff the wrapped check fails, for any reason.
pub struct ExpectFailure {
    inner: Box<dyn Checker>,
    failing: bool,
}

impl ExpectFailure {
    pub fn new(inner: Box<dyn Checker>) -> Self {
        Self {
            inner,
            failing: false,
        }
    }

    pub fn failing(inner: Box<dyn Checker>) -> Self {
        Self {
            inner,
            failing: true,
        }
    }
}

impl Checker for ExpectFailure {
    fn check(&self) -> Result<(), CheckError> {
        if !self.failing {
            return self.inner.check();
        }
        match self.inner.check() {
            Err(_) => Ok(()),
            Ok(()) => Err(CheckError::violation("failure expected")),
        }
    }

    fn configure(&self, config: &CheckerConfig) -> Result<Box<dyn Checker>, ConfigureError> {
        let inner = self.inner.configure(&config.without_failing())?;
        let failing = match config.failing {
            Some(failing) => failing,
            None if config.is_empty() => self.failing,
            None => false,
        };
        Ok(Box::new(Self { inner, failing }))
    }
}
