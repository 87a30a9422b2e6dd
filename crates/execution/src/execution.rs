//! The `Execution` aggregate: one run of a workflow, with its per-node log
//! and aggregated usage.

use chrono::{DateTime, Utc};
use nebula_core::id::{ExecutionId, NodeId, WorkflowId};
use serde::{Deserialize, Serialize};

use crate::context::NodeUsage;
use crate::status::{ExecutionMode, ExecutionStatus, TriggerKind};
use crate::ExecutionContext;
use nebula_workflow::NodeState;

/// The outcome of one node within one execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeExecution {
    /// Which node this record describes.
    pub node_id: NodeId,
    /// Terminal status: `completed`, `failed`, `timed_out`, or `skipped`.
    pub status: NodeState,
    /// Resolved input, if captured.
    #[serde(default)]
    pub input: Option<serde_json::Value>,
    /// Output, if the node completed.
    #[serde(default)]
    pub output: Option<serde_json::Value>,
    /// Error message, if the node failed or timed out.
    #[serde(default)]
    pub error: Option<String>,
    /// When the node started.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    /// When the node finished.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Wall-clock duration in milliseconds.
    #[serde(default)]
    pub duration_ms: Option<u64>,
    /// Number of retries attempted before reaching this terminal status.
    #[serde(default)]
    pub retry_count: u32,
}

/// Aggregated token/cost usage across an execution's `_usage_*` entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageAggregate {
    /// Sum of prompt tokens across all usage entries.
    pub prompt_tokens: u64,
    /// Sum of completion tokens across all usage entries.
    pub completion_tokens: u64,
    /// `prompt_tokens + completion_tokens`.
    pub total_tokens: u64,
    /// Total cost, in the provider's billing currency, to six decimal
    /// places.
    pub estimated_cost: f64,
    /// The first model name seen across usage entries, in insertion order.
    pub model_used: Option<String>,
}

impl UsageAggregate {
    /// Sum every `_usage_*` entry in `context` into one aggregate. Empty
    /// (all-zero, no model) if the context has no usage entries or they
    /// total zero tokens.
    #[must_use]
    pub fn from_context(context: &ExecutionContext) -> Self {
        let mut prompt_tokens = 0u64;
        let mut completion_tokens = 0u64;
        let mut cost_micros = 0u64;
        let mut model_used = None;

        for (_, value) in context.usage_entries() {
            if let Ok(usage) = serde_json::from_value::<NodeUsage>(value.clone()) {
                prompt_tokens += usage.prompt_tokens;
                completion_tokens += usage.completion_tokens;
                cost_micros += usage.cost_micros;
            }
            if model_used.is_none() {
                if let Some(model) = value.get("model").and_then(serde_json::Value::as_str) {
                    model_used = Some(model.to_string());
                }
            }
        }

        let total_tokens = prompt_tokens + completion_tokens;
        if total_tokens == 0 {
            return Self::default();
        }

        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
            estimated_cost: round_to_six_decimals(cost_micros as f64 / 1_000_000.0),
            model_used,
        }
    }
}

fn round_to_six_decimals(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

/// One run of a workflow: status, mode, trigger provenance, per-node log,
/// and aggregated usage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    /// Stable identifier.
    pub id: ExecutionId,
    /// The workflow this execution runs.
    pub workflow_id: WorkflowId,
    /// Current lifecycle status.
    pub status: ExecutionStatus,
    /// Full, mock, or debug.
    pub mode: ExecutionMode,
    /// What started this execution.
    pub trigger_type: TriggerKind,
    /// Id of the trigger entity (schedule id for cron, webhook id, etc.).
    #[serde(default)]
    pub trigger_id: Option<String>,
    /// The original input, if captured separately from the context.
    #[serde(default)]
    pub input: Option<serde_json::Value>,
    /// The final output, once terminal.
    #[serde(default)]
    pub output: Option<serde_json::Value>,
    /// The error, if the execution ended in `failed` or `timed_out`.
    #[serde(default)]
    pub error: Option<String>,
    /// Per-node execution records, in the order nodes were visited.
    #[serde(default)]
    pub node_logs: Vec<NodeExecution>,
    /// When the execution transitioned to `running`.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    /// When the execution reached a terminal status.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Wall-clock duration in milliseconds, once terminal.
    #[serde(default)]
    pub duration_ms: Option<u64>,
    /// Aggregated usage, computed from the context's `_usage_*` entries.
    #[serde(default)]
    pub usage: UsageAggregate,
}

impl Execution {
    /// Create a new execution in `pending` status.
    #[must_use]
    pub fn new(
        id: ExecutionId,
        workflow_id: WorkflowId,
        mode: ExecutionMode,
        trigger_type: TriggerKind,
    ) -> Self {
        Self {
            id,
            workflow_id,
            status: ExecutionStatus::Pending,
            mode,
            trigger_type,
            trigger_id: None,
            input: None,
            output: None,
            error: None,
            node_logs: Vec::new(),
            started_at: None,
            completed_at: None,
            duration_ms: None,
            usage: UsageAggregate::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_core::id::UserId;

    #[test]
    fn empty_context_has_empty_usage() {
        let ctx = ExecutionContext::new(serde_json::Value::Null, UserId::v4());
        assert_eq!(UsageAggregate::from_context(&ctx), UsageAggregate::default());
    }

    #[test]
    fn usage_sums_across_nodes_and_takes_first_model() {
        let mut ctx = ExecutionContext::new(serde_json::Value::Null, UserId::v4());
        let n1 = NodeId::v4();
        let n2 = NodeId::v4();
        ctx.set_usage(
            n1,
            NodeUsage {
                prompt_tokens: 100,
                completion_tokens: 50,
                cost_micros: 1_500_000,
            },
            "gpt-4",
        );
        ctx.set_usage(
            n2,
            NodeUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
                cost_micros: 200_000,
            },
            "claude-3",
        );

        let agg = UsageAggregate::from_context(&ctx);
        assert_eq!(agg.prompt_tokens, 110);
        assert_eq!(agg.completion_tokens, 55);
        assert_eq!(agg.total_tokens, 165);
        assert!((agg.estimated_cost - 1.7).abs() < 1e-9);
    }

    #[test]
    fn usage_ignores_non_usage_keys() {
        let mut ctx = ExecutionContext::new(serde_json::Value::Null, UserId::v4());
        ctx.set_node_output(NodeId::v4(), serde_json::json!("not usage"));
        assert_eq!(UsageAggregate::from_context(&ctx), UsageAggregate::default());
    }

    #[test]
    fn new_execution_starts_pending() {
        let exec = Execution::new(
            ExecutionId::v4(),
            WorkflowId::v4(),
            ExecutionMode::Full,
            TriggerKind::Manual,
        );
        assert_eq!(exec.status, ExecutionStatus::Pending);
        assert!(exec.node_logs.is_empty());
    }
}
