//! State machine transition validation for execution-level status.
//!
//! Node-level transitions live in `nebula_workflow::state` since they are a
//! property of the static node, not of execution bookkeeping.

use crate::error::ExecutionError;
use crate::status::ExecutionStatus;

/// Returns `true` if the execution-level transition from `from` to `to` is
/// valid.
#[must_use]
pub fn can_transition_execution(from: ExecutionStatus, to: ExecutionStatus) -> bool {
    use ExecutionStatus::{Cancelled, Completed, Failed, Paused, Pending, Running, TimedOut};
    matches!(
        (from, to),
        (Pending, Running)
            | (Running, Paused)
            | (Running, Completed)
            | (Running, Failed)
            | (Running, Cancelled)
            | (Running, TimedOut)
            | (Paused, Running)
            | (Paused, Cancelled)
    )
}

/// Validate an execution-level transition, returning an error if invalid.
pub fn validate_execution_transition(
    from: ExecutionStatus,
    to: ExecutionStatus,
) -> Result<(), ExecutionError> {
    if can_transition_execution(from, to) {
        Ok(())
    } else {
        Err(ExecutionError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_to_running_is_valid() {
        assert!(can_transition_execution(
            ExecutionStatus::Pending,
            ExecutionStatus::Running
        ));
    }

    #[test]
    fn paused_resumes_to_running() {
        assert!(can_transition_execution(
            ExecutionStatus::Paused,
            ExecutionStatus::Running
        ));
    }

    #[test]
    fn completed_is_a_dead_end() {
        assert!(!can_transition_execution(
            ExecutionStatus::Completed,
            ExecutionStatus::Running
        ));
    }

    #[test]
    fn validate_rejects_invalid_transition_with_error() {
        let err =
            validate_execution_transition(ExecutionStatus::Completed, ExecutionStatus::Running)
                .unwrap_err();
        assert!(matches!(err, ExecutionError::InvalidTransition { .. }));
    }
}
