use provbana_checks::ConfigureError;
use provbana_config::ScenarioError;
use provbana_core::events::ActionError;
use provbana_core::network::ValidatorId;
use provbana_core::{NetworkError, RpcError};
use thiserror::Error;

/// Why a scenario run ended early.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid scenario:\n{0}")]
    Validation(#[from] ScenarioError),

    #[error("check '{0}' not found")]
    UnknownCheck(String),

    #[error("error configuring checks; {check}: {source}")]
    Configure {
        check: String,
        #[source]
        source: ConfigureError,
    },

    #[error("failed to prepare scenario; {0}")]
    Setup(#[from] NetworkError),

    #[error("event '{name}' failed; {source}")]
    Action {
        name: String,
        #[source]
        source: ActionError,
    },

    #[error("aborted by user")]
    Aborted,
}

impl RunError {
    pub fn is_aborted(&self) -> bool {
        matches!(self, RunError::Aborted)
    }
}

/// Failures of the validator registration round trip.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to connect to RPC; {0}")]
    Connect(#[source] RpcError),

    #[error("failed to register validator node; {0}")]
    Register(#[source] RpcError),

    #[error("failed to unregister validator node; {0}")]
    Unregister(#[source] RpcError),
}

/// Failures raised by scheduled lifecycle actions themselves.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("validator node {0} not found")]
    ValidatorNotFound(String),

    #[error("validator ID mismatch: expected {expected}, got {got}")]
    ValidatorIdMismatch {
        expected: ValidatorId,
        got: ValidatorId,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Network(#[from] NetworkError),
}

/// Failures of the validator id tracker.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackerError {
    #[error("invalid vid; {first} <= {id} <= {last} violated")]
    OutOfRange {
        id: ValidatorId,
        first: ValidatorId,
        last: ValidatorId,
    },

    #[error("no more available id")]
    Exhausted,
}
