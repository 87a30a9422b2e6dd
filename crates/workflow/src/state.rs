//! Per-node execution state tokens (`§6` status tokens).

use serde::{Deserialize, Serialize};

/// The lifecycle state of a single node within a running execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    /// Not yet reached by traversal.
    Pending,
    /// In the current ready set, about to run.
    Ready,
    /// Executing (or retrying).
    Running,
    /// Finished successfully.
    Completed,
    /// Exhausted retries without succeeding.
    Failed,
    /// Exhausted retries because every attempt timed out.
    TimedOut,
    /// Never run because its branch was not taken.
    Skipped,
}

impl NodeState {
    /// `true` once the node will never run or retry again.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::TimedOut | Self::Skipped
        )
    }

    /// `true` if traversal should route an outgoing error edge for this
    /// node's final state.
    #[must_use]
    pub fn is_routable_failure(self) -> bool {
        matches!(self, Self::Failed | Self::TimedOut)
    }
}

/// Returns `true` if transitioning a node from `from` to `to` is valid.
#[must_use]
pub fn can_transition(from: NodeState, to: NodeState) -> bool {
    use NodeState::{Completed, Failed, Pending, Ready, Running, Skipped, TimedOut};
    matches!(
        (from, to),
        (Pending, Ready)
            | (Pending, Skipped)
            | (Ready, Running)
            | (Running, Running) // retry, same state
            | (Running, Completed)
            | (Running, Failed)
            | (Running, TimedOut)
    )
}
