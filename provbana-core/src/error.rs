use thiserror::Error;

/// Failures reported by a node's RPC endpoint.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("failed to dial node RPC; {0}")]
    Dial(String),

    #[error("RPC call {method} failed; {reason}")]
    Call { method: String, reason: String },

    #[error("malformed {method} response: {value:?}")]
    Malformed { method: String, value: String },
}

/// Failures reported by the network under test while executing lifecycle
/// operations on nodes, applications, or network-wide settings.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("node {0} not found")]
    NodeNotFound(String),

    #[error("failed to {operation} {subject}; {reason}")]
    Operation {
        operation: String,
        subject: String,
        reason: String,
    },

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

impl NetworkError {
    pub fn operation(
        operation: impl Into<String>,
        subject: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        NetworkError::Operation {
            operation: operation.into(),
            subject: subject.into(),
            reason: reason.to_string(),
        }
    }
}
