//! Execution-level and mode/trigger tokens (`§3`, `§6`).

use serde::{Deserialize, Serialize};

/// The overall status of a workflow [`crate::Execution`] (`§3`, `§6`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Created at dispatch, not yet started.
    Pending,
    /// Actively traversing the graph.
    Running,
    /// Checkpointed and exited; resumable via `resume()`.
    Paused,
    /// Every reachable node completed (or was routed via an error edge).
    Completed,
    /// A node exhausted retries with no error edge to route to.
    Failed,
    /// Cancelled by the user or by `shutdown()`.
    Cancelled,
    /// The execution itself (not a single node) exceeded its wall-clock
    /// budget.
    TimedOut,
}

impl ExecutionStatus {
    /// `true` if the execution has reached a final state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Cancelled | Self::TimedOut
        )
    }

    /// `true` if the execution is currently doing work.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Running)
    }

    /// `true` if the execution completed successfully.
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Completed)
    }

    /// `true` if the execution ended in a failure state.
    #[must_use]
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Failed | Self::TimedOut)
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::TimedOut => "timed_out",
        };
        write!(f, "{s}")
    }
}

/// How an execution is driven (`§3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Ordinary execution, calling out to real providers.
    Full,
    /// Every node executor is replaced by its deterministic synthetic
    /// output; no external I/O occurs.
    Mock,
    /// Driven by the debug stepper instead of the graph runtime.
    Debug,
}

/// What triggered an execution (`§3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// Started directly by a user/API call.
    Manual,
    /// Fired by the scheduler (C8).
    Cron,
    /// Fired by an inbound webhook.
    Webhook,
    /// Started from the interactive playground/debug UI.
    Playground,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(ExecutionStatus::Completed.is_terminal());
        assert!(ExecutionStatus::Failed.is_terminal());
        assert!(ExecutionStatus::Cancelled.is_terminal());
        assert!(ExecutionStatus::TimedOut.is_terminal());
        assert!(!ExecutionStatus::Pending.is_terminal());
        assert!(!ExecutionStatus::Running.is_terminal());
        assert!(!ExecutionStatus::Paused.is_terminal());
    }

    #[test]
    fn display_matches_persisted_status_tokens() {
        assert_eq!(ExecutionStatus::Pending.to_string(), "pending");
        assert_eq!(ExecutionStatus::TimedOut.to_string(), "timed_out");
    }

    #[test]
    fn serde_rename_snake_case() {
        let json = serde_json::to_string(&ExecutionStatus::TimedOut).unwrap();
        assert_eq!(json, "\"timed_out\"");
    }
}
