//! Graph runtime (C5, `§4.5`): drives a validated [`Workflow`] to
//! completion. Resolves each node's input (C2), dispatches it to its
//! executor (C4), checkpoints before it runs (C3), retries/times it out,
//! and routes terminal failures through error edges.
//!
//! Traversal is frontier-based rather than a single precomputed
//! topological order: a node becomes ready once every one of its non-error
//! inbound edges has *fired* — an untagged edge fires whenever its source
//! completes, a `condition` edge fires only when its source's
//! `active_handle` matches. This falls naturally out of one rule instead
//! of special-casing fan-out/fan-in/branching separately, and is what
//! gives the `parallel` node's downstream join (`§4.5` "inbound-completion
//! rule") its behaviour for free.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use nebula_core::id::{ExecutionId, NodeId};
use nebula_eventbus::{BackgroundExecutionManager, ExecutionEventType};
use nebula_execution::{
    CheckpointStore, ExecutionContext, ExecutionStatus, NodeExecution, UsageAggregate,
};
use nebula_resilience::{retry, with_timeout, RetryPolicy};
use nebula_workflow::{DependencyGraph, Edge, Node, NodeKind, NodeState, Workflow};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::EngineError;
use crate::executors::{self, RuntimeServices};
use crate::input;

/// Per-node timeout used when neither `node.data["timeout"]` nor a
/// configured override applies.
pub const DEFAULT_NODE_TIMEOUT: Duration = Duration::from_secs(120);

/// Tunables the runtime reads from process configuration (`§1A`).
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Fallback per-node timeout.
    pub default_node_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_node_timeout: DEFAULT_NODE_TIMEOUT,
        }
    }
}

/// The result of a top-level [`GraphRuntime::run`] or [`GraphRuntime::resume`].
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Terminal execution status.
    pub status: ExecutionStatus,
    /// The context as of termination.
    pub context: ExecutionContext,
    /// Per-node records, in visitation order.
    pub node_logs: Vec<NodeExecution>,
    /// Aggregated `_usage_*` entries.
    pub usage: UsageAggregate,
    /// The failure message, set when `status` is `failed`.
    pub error: Option<String>,
}

/// Drives one workflow graph from a frontier of ready nodes to exhaustion.
pub struct GraphRuntime {
    checkpoints: Arc<dyn CheckpointStore>,
    events: Option<Arc<BackgroundExecutionManager>>,
    config: RuntimeConfig,
}

impl GraphRuntime {
    /// Construct a runtime backed by `checkpoints`, with default config and
    /// no event emission.
    #[must_use]
    pub fn new(checkpoints: Arc<dyn CheckpointStore>) -> Self {
        Self {
            checkpoints,
            events: None,
            config: RuntimeConfig::default(),
        }
    }

    /// Attach a [`BackgroundExecutionManager`] to mirror `node_started`/
    /// `node_completed` events to (`§6` event stream contract).
    #[must_use]
    pub fn with_events(mut self, events: Arc<BackgroundExecutionManager>) -> Self {
        self.events = Some(events);
        self
    }

    /// Override the default runtime tunables.
    #[must_use]
    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Run `workflow` from its roots with a fresh `context`.
    pub async fn run(
        &self,
        workflow: &Workflow,
        execution_id: ExecutionId,
        context: ExecutionContext,
        services: &RuntimeServices,
    ) -> Result<RunOutcome, EngineError> {
        let graph = DependencyGraph::build(workflow)?;
        let start = graph.execution_roots(workflow);
        self.traverse(workflow, &graph, execution_id, context, start, services)
            .await
    }

    /// Resume a checkpointed execution: reload its context and restart
    /// traversal from `current_node` without re-running earlier nodes
    /// (`§4.5` "Checkpointing").
    pub async fn resume(
        &self,
        workflow: &Workflow,
        execution_id: ExecutionId,
        services: &RuntimeServices,
    ) -> Result<RunOutcome, EngineError> {
        let checkpoint = self
            .checkpoints
            .load(execution_id)
            .await?
            .ok_or(nebula_execution::ExecutionError::CheckpointNotFound)?;
        let graph = DependencyGraph::build(workflow)?;
        self.traverse(
            workflow,
            &graph,
            execution_id,
            checkpoint.context,
            vec![checkpoint.current_node],
            services,
        )
        .await
    }

    async fn traverse(
        &self,
        workflow: &Workflow,
        graph: &DependencyGraph,
        execution_id: ExecutionId,
        mut context: ExecutionContext,
        start: Vec<NodeId>,
        services: &RuntimeServices,
    ) -> Result<RunOutcome, EngineError> {
        let outcome = drive(
            workflow,
            graph,
            &mut context,
            services,
            &self.config,
            start,
            Some((self.checkpoints.as_ref(), execution_id)),
            self.events.as_deref().map(|e| (e, execution_id)),
        )
        .await;

        let usage = UsageAggregate::from_context(&context);

        match outcome.failure {
            None => {
                self.checkpoints.delete(execution_id).await?;
                info!(%execution_id, "execution completed");
                Ok(RunOutcome {
                    status: ExecutionStatus::Completed,
                    context,
                    node_logs: outcome.node_logs,
                    usage,
                    error: None,
                })
            }
            Some((node, err)) => {
                warn!(%execution_id, node_id = %node, error = %err, "execution failed");
                self.checkpoints
                    .mark_failed(execution_id, node, err.to_string())
                    .await?;
                Ok(RunOutcome {
                    status: ExecutionStatus::Failed,
                    context,
                    node_logs: outcome.node_logs,
                    usage,
                    error: Some(err.to_string()),
                })
            }
        }
    }
}

/// Run `workflow` starting from its roots against `context`, without
/// checkpointing or event emission — used by the `feedback_loop` executor
/// to drive its inner sub-plan (`§4.4`).
pub async fn run_subgraph(
    workflow: &Workflow,
    graph: &DependencyGraph,
    context: &mut ExecutionContext,
    services: &RuntimeServices,
) -> Result<(), (NodeId, EngineError)> {
    let start = graph.execution_roots(workflow);
    let config = RuntimeConfig::default();
    let outcome = drive(
        workflow, graph, context, services, &config, start, None, None,
    )
    .await;
    match outcome.failure {
        None => Ok(()),
        Some(failure) => Err(failure),
    }
}

enum NodeOutcome {
    Completed {
        output: executors::ExecutorOutput,
        input: Value,
        started_at: DateTime<Utc>,
        duration_ms: u64,
        retry_count: u32,
    },
    Failed {
        message: String,
        timed_out: bool,
        input: Value,
        started_at: DateTime<Utc>,
        duration_ms: u64,
        retry_count: u32,
    },
}

struct DriveOutcome {
    node_logs: Vec<NodeExecution>,
    failure: Option<(NodeId, EngineError)>,
}

/// The shared traversal loop behind [`GraphRuntime::run`]/`resume` and
/// [`run_subgraph`]: process the current frontier concurrently, apply its
/// writes to `context` in frontier order (keeping last-writer-wins
/// deterministic, `§5`), then compute the next frontier from which edges
/// fired.
#[allow(clippy::too_many_arguments)]
async fn drive(
    workflow: &Workflow,
    graph: &DependencyGraph,
    context: &mut ExecutionContext,
    services: &RuntimeServices,
    config: &RuntimeConfig,
    start: Vec<NodeId>,
    checkpoint: Option<(&dyn CheckpointStore, ExecutionId)>,
    events: Option<(&BackgroundExecutionManager, ExecutionId)>,
) -> DriveOutcome {
    let mut remaining: HashMap<NodeId, usize> = workflow
        .nodes
        .iter()
        .map(|n| {
            let count = graph
                .incoming(n.id)
                .iter()
                .filter(|e| !e.is_error_edge())
                .count();
            (n.id, count)
        })
        .collect();

    let mut queued: HashSet<NodeId> = start.iter().copied().collect();
    let mut frontier = start;
    let mut node_logs = Vec::new();
    let mut failure = None;

    while !frontier.is_empty() {
        // Checkpointed before the node runs, not after (`§4.5`
        // "Checkpointing"): `current_node` always names the next node
        // `resume` should re-attempt, never one already completed. With a
        // multi-node frontier each write upserts the same row, so only the
        // last node checkpointed here survives as `current_node` — an
        // accepted simplification of the single-`current_node` checkpoint
        // shape for concurrent fan-out.
        if let Some((store, execution_id)) = checkpoint {
            for &id in &frontier {
                if let Err(err) = store
                    .save(execution_id, id, context.clone(), ExecutionStatus::Running)
                    .await
                {
                    failure = Some((id, EngineError::from(err)));
                }
            }
            if failure.is_some() {
                break;
            }
        }

        if let Some((bus, execution_id)) = events {
            for &id in &frontier {
                bus.emit(
                    execution_id,
                    ExecutionEventType::NodeStarted,
                    serde_json::json!({ "node_id": id.to_string() }),
                );
            }
        }

        let snapshot: &ExecutionContext = context;
        let running = frontier.iter().map(|&id| {
            let node = workflow
                .node(id)
                .expect("frontier nodes are members of this workflow");
            run_node(node, snapshot, graph, services, config)
        });
        let results = futures::future::join_all(running).await;

        let mut next_frontier = Vec::new();
        for (id, outcome) in frontier.into_iter().zip(results) {
            let node = workflow.node(id).expect("validated above");
            match outcome {
                NodeOutcome::Completed {
                    output,
                    input,
                    started_at,
                    duration_ms,
                    retry_count,
                } => {
                    if let Some((usage, model)) = &output.usage {
                        context.set_usage(id, *usage, model.clone());
                    }
                    context.set_node_output(id, output.value.clone());
                    node_logs.push(NodeExecution {
                        node_id: id,
                        status: NodeState::Completed,
                        input: Some(input),
                        output: Some(output.value.clone()),
                        error: None,
                        started_at: Some(started_at),
                        completed_at: Some(Utc::now()),
                        duration_ms: Some(duration_ms),
                        retry_count,
                    });

                    if let Some((bus, execution_id)) = events {
                        bus.emit(
                            execution_id,
                            ExecutionEventType::NodeCompleted,
                            serde_json::json!({ "node_id": id.to_string() }),
                        );
                    }

                    let active_handle = if node.kind == NodeKind::Condition {
                        output
                            .value
                            .get("active_handle")
                            .and_then(Value::as_str)
                            .map(str::to_owned)
                    } else {
                        None
                    };

                    for edge in firing_edges(graph, id, active_handle.as_deref()) {
                        advance(edge.target, &mut remaining, &mut queued, &mut next_frontier);
                    }
                }
                NodeOutcome::Failed {
                    message,
                    timed_out,
                    input,
                    started_at,
                    duration_ms,
                    retry_count,
                } => {
                    let status_token = if timed_out { "timed_out" } else { "failed" };
                    context.set_error_envelope(id, message.clone(), status_token);
                    node_logs.push(NodeExecution {
                        node_id: id,
                        status: if timed_out {
                            NodeState::TimedOut
                        } else {
                            NodeState::Failed
                        },
                        input: Some(input),
                        output: None,
                        error: Some(message.clone()),
                        started_at: Some(started_at),
                        completed_at: Some(Utc::now()),
                        duration_ms: Some(duration_ms),
                        retry_count,
                    });

                    if let Some((store, execution_id)) = checkpoint {
                        if let Err(err) = store.mark_failed(execution_id, id, message.clone()).await
                        {
                            failure = Some((id, EngineError::from(err)));
                            break;
                        }
                    }
                    if let Some((bus, execution_id)) = events {
                        bus.emit(
                            execution_id,
                            ExecutionEventType::NodeCompleted,
                            serde_json::json!({ "node_id": id.to_string(), "error": message.clone() }),
                        );
                    }

                    match graph.error_edge(id) {
                        Some(edge) if queued.insert(edge.target) => {
                            next_frontier.push(edge.target);
                        }
                        Some(_) => {}
                        None => {
                            let engine_err = if timed_out {
                                EngineError::NodeTimeout(id)
                            } else {
                                EngineError::NodeFailed { node: id, message }
                            };
                            failure = Some((id, engine_err));
                        }
                    }
                }
            }

            if failure.is_some() {
                break;
            }
        }

        if failure.is_some() {
            break;
        }
        frontier = next_frontier;
    }

    DriveOutcome { node_logs, failure }
}

/// The edges that fire when `node` completes successfully: a `condition`
/// node fires only the branch matching `active_handle`; every other kind
/// fires its untagged edges. Error edges never fire on success (`§4.5`).
fn firing_edges<'g>(
    graph: &'g DependencyGraph,
    node: NodeId,
    active_handle: Option<&str>,
) -> Vec<&'g Edge> {
    graph
        .outgoing(node)
        .iter()
        .filter(|e| {
            if e.is_error_edge() {
                false
            } else if let Some(handle) = active_handle {
                e.has_handle(handle)
            } else {
                e.is_untagged()
            }
        })
        .collect()
}

/// Decrement `target`'s remaining non-error predecessor count; once it
/// reaches zero, queue it (idempotently — the forced error-edge path can
/// also queue a node, so a later normal decrement must not double-queue
/// it).
fn advance(
    target: NodeId,
    remaining: &mut HashMap<NodeId, usize>,
    queued: &mut HashSet<NodeId>,
    next_frontier: &mut Vec<NodeId>,
) {
    if let Some(count) = remaining.get_mut(&target) {
        *count = count.saturating_sub(1);
        if *count == 0 && queued.insert(target) {
            next_frontier.push(target);
        }
    }
}

async fn run_node(
    node: &Node,
    context: &ExecutionContext,
    graph: &DependencyGraph,
    services: &RuntimeServices,
    config: &RuntimeConfig,
) -> NodeOutcome {
    let started_at = Utc::now();
    let clock = Instant::now();
    let resolved_input = input::resolve(node, context, graph);

    let node_timeout = node
        .data
        .get("timeout")
        .and_then(Value::as_u64)
        .map(Duration::from_millis)
        .unwrap_or(config.default_node_timeout);
    let max_retries = node
        .data
        .get("maxRetries")
        .and_then(Value::as_u64)
        .unwrap_or(0) as u32;
    let policy = RetryPolicy::with_max_retries(max_retries);

    let outcome = retry(&policy, |_attempt| async {
        match with_timeout(
            node_timeout,
            executors::execute(node, &resolved_input, context, services),
        )
        .await
        {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(err)) => Err(err),
            Err(_elapsed) => Err(EngineError::NodeTimeout(node.id)),
        }
    })
    .await;

    let duration_ms = u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX);
    let retry_count = outcome.retry_count();

    match outcome.result {
        Ok(output) => NodeOutcome::Completed {
            output,
            input: resolved_input,
            started_at,
            duration_ms,
            retry_count,
        },
        Err(err) => {
            let timed_out = matches!(err, EngineError::NodeTimeout(_));
            NodeOutcome::Failed {
                message: err.to_string(),
                timed_out,
                input: resolved_input,
                started_at,
                duration_ms,
                retry_count,
            }
        }
    }
}
