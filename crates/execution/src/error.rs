//! Execution error types.

use nebula_core::id::NodeId;
use nebula_error::ErrorCode;
use thiserror::Error;

/// Errors that can occur during workflow execution.
#[derive(Debug, Error, ErrorCode)]
pub enum ExecutionError {
    /// A state transition is not valid for the current status.
    #[error("invalid transition from {from} to {to}")]
    #[code = "invalid_transition"]
    InvalidTransition {
        /// Current status.
        from: String,
        /// Attempted target status.
        to: String,
    },

    /// A referenced node does not exist in the execution state.
    #[error("node not found: {0}")]
    #[code = "node_not_found"]
    NodeNotFound(NodeId),

    /// No checkpoint exists for the given execution.
    #[error("no checkpoint found for execution")]
    #[code = "checkpoint_not_found"]
    CheckpointNotFound,

    /// A serialization or deserialization error.
    #[error("serialization: {0}")]
    #[code = "serialization"]
    Serialization(#[from] serde_json::Error),

    /// The execution was cancelled.
    #[error("execution cancelled")]
    #[code = "cancelled"]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_display() {
        let err = ExecutionError::InvalidTransition {
            from: "running".into(),
            to: "pending".into(),
        };
        assert_eq!(err.to_string(), "invalid transition from running to pending");
    }

    #[test]
    fn node_not_found_display() {
        let id = NodeId::v4();
        let err = ExecutionError::NodeNotFound(id);
        assert!(err.to_string().contains("node not found"));
    }

    #[test]
    fn from_serde_error() {
        let serde_err = serde_json::from_str::<String>("not valid json").unwrap_err();
        let err = ExecutionError::from(serde_err);
        assert!(err.to_string().starts_with("serialization:"));
    }

    #[test]
    fn cancelled_display() {
        let err = ExecutionError::Cancelled;
        assert_eq!(err.to_string(), "execution cancelled");
    }

    #[test]
    fn checkpoint_not_found_code() {
        assert_eq!(ExecutionError::CheckpointNotFound.code(), "checkpoint_not_found");
    }
}
