use provbana_config::ScenarioError;
use provbana_core::NetworkError;
use provbana_engine::RunError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RehearsalError {
    #[error("invalid scenario:\n{0}")]
    Scenario(#[from] ScenarioError),

    #[error("failed to start dry-run network; {0}")]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Run(#[from] RunError),

    #[error("transcript hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },
}
