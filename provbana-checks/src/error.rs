//! Checker outcomes and configuration failures.

use provbana_core::RpcError;
use thiserror::Error;

/// A failed check. Violations are findings about the network, not faults of
/// the runner.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("{0}")]
    Violation(String),

    #[error("failed to query node {node}; {source}")]
    Rpc {
        node: String,
        #[source]
        source: RpcError,
    },

    #[error("{}", join_errors(.0))]
    Aggregate(Vec<CheckError>),
}

impl CheckError {
    pub fn violation(message: impl Into<String>) -> Self {
        CheckError::Violation(message.into())
    }

    /// Builds an aggregate, flattening nested aggregates. `None` if empty.
    pub fn aggregate(errors: impl IntoIterator<Item = CheckError>) -> Option<Self> {
        let mut flat = Vec::new();
        for err in errors {
            match err {
                CheckError::Aggregate(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.is_empty() {
            None
        } else {
            Some(CheckError::Aggregate(flat))
        }
    }

    /// The individual failures carried by this error.
    pub fn errors(&self) -> Vec<&CheckError> {
        match self {
            CheckError::Aggregate(inner) => inner.iter().flat_map(CheckError::errors).collect(),
            other => vec![other],
        }
    }
}

fn join_errors(errors: &[CheckError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// A checker rejected its options.
#[derive(Debug, Error)]
pub enum ConfigureError {
    #[error("invalid {option}; {reason}")]
    InvalidOption {
        option: &'static str,
        reason: String,
    },
}

impl ConfigureError {
    pub fn invalid(option: &'static str, reason: impl Into<String>) -> Self {
        ConfigureError::InvalidOption {
            option,
            reason: reason.into(),
        }
    }
}
