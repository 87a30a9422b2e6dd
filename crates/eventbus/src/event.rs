//! Execution events and the per-execution retention policy applied to them.

use chrono::{DateTime, Utc};
use nebula_core::id::ExecutionId;
use serde::{Deserialize, Serialize};

/// Maximum number of events retained per execution. On overflow the oldest
/// half of the buffer is discarded, biasing retention toward recent history
/// for late subscribers.
pub const MAX_EVENTS_PER_EXECUTION: usize = 1000;

/// Seconds of inactivity after which a finished execution's buffered events
/// and subscriber list are eligible for eviction. Swept at every `dispatch`.
pub const EVENT_TTL_SECONDS: i64 = 3600;

/// The kind of lifecycle event recorded for an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionEventType {
    /// The execution's background task started.
    Started,
    /// A node began running.
    NodeStarted,
    /// A node finished running (success or routed failure).
    NodeCompleted,
    /// The execution reached a terminal success state.
    Completed,
    /// The execution's task returned an error or was cancelled at shutdown.
    Failed,
}

/// One entry in an execution's event buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionEvent {
    /// The execution this event belongs to.
    pub execution_id: ExecutionId,
    /// What kind of event this is.
    pub event_type: ExecutionEventType,
    /// Event-specific payload (node id, error message, output, ...).
    pub data: serde_json::Value,
    /// When the event was recorded.
    pub timestamp: DateTime<Utc>,
}

impl ExecutionEvent {
    /// Construct an event stamped with the current time.
    #[must_use]
    pub fn new(execution_id: ExecutionId, event_type: ExecutionEventType, data: serde_json::Value) -> Self {
        Self {
            execution_id,
            event_type,
            data,
            timestamp: Utc::now(),
        }
    }
}

/// Append `event` to `buffer`, discarding the oldest half first if the push
/// would exceed [`MAX_EVENTS_PER_EXECUTION`].
pub fn push_bounded(buffer: &mut std::collections::VecDeque<ExecutionEvent>, event: ExecutionEvent) {
    if buffer.len() >= MAX_EVENTS_PER_EXECUTION {
        let keep_from = buffer.len() / 2;
        buffer.drain(0..keep_from);
    }
    buffer.push_back(event);
}
