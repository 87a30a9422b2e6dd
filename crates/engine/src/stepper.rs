//! Debug stepper (C9, `§4.9`): an alternative driver over the same graph
//! the runtime (C5) traverses, but in declared node order — NOT
//! topological order, since breakpoints are tied to node identity, not
//! readiness — and paused between nodes awaiting operator commands.
//!
//! A post-hoc observability surface, not a production dispatch path
//! (`§4.9`): a single execution, single-stepped, with no retry/checkpoint/
//! error-edge routing of its own.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use nebula_core::id::NodeId;
use nebula_error::ErrorCode;
use nebula_execution::ExecutionContext;
use nebula_workflow::{DependencyGraph, Workflow};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::EngineError;
use crate::executors::{self, RuntimeServices};
use crate::input;

/// How long the stepper waits for a command while paused at a breakpoint
/// before giving up (`§4.9`).
pub const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(600);

/// A command sent to a paused [`DebugStepper`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugCommand {
    /// Resume until the next breakpoint or completion.
    Continue,
    /// Advance exactly one node — identical to `Continue` (`§4.9`: "step
    /// (same — single node advance)"), since the stepper only ever runs
    /// one node between pauses regardless of command.
    Step,
    /// Terminate the session without completing the workflow.
    Stop,
}

/// The kind of observability event the stepper emits, matching the
/// literal tokens named in `§4.9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DebugEventType {
    /// Paused at a breakpointed node, awaiting a command.
    Breakpoint,
    /// A node is about to execute.
    NodeStart,
    /// A node finished executing successfully.
    NodeComplete,
    /// The session ended because a node raised an error.
    Error,
    /// The session ended because no command arrived within
    /// [`INACTIVITY_TIMEOUT`].
    Timeout,
    /// Every node was visited and the session ended normally.
    Complete,
}

/// One emission from a running [`DebugStepper`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugEvent {
    /// What happened.
    pub event_type: DebugEventType,
    /// The node this event concerns, absent for session-level events
    /// (`COMPLETE`, `TIMEOUT`).
    pub node_id: Option<NodeId>,
    /// Event-specific payload (error message/code, result count, ...).
    pub data: Value,
    /// When this event was emitted.
    pub timestamp: DateTime<Utc>,
}

impl DebugEvent {
    fn new(event_type: DebugEventType, node_id: Option<NodeId>, data: Value) -> Self {
        Self {
            event_type,
            node_id,
            data,
            timestamp: Utc::now(),
        }
    }
}

/// Why a [`DebugStepper::run`] call stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// Every node in the workflow was visited.
    Completed,
    /// A `stop` command was received.
    Stopped,
    /// A node raised an error.
    Errored,
    /// No command arrived within [`INACTIVITY_TIMEOUT`] at a breakpoint.
    TimedOut,
}

/// The result of a full [`DebugStepper::run`] call.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// Why the session ended.
    pub reason: TerminationReason,
    /// Every node's output, keyed by node id, in the order nodes completed.
    pub results: HashMap<NodeId, Value>,
    /// How many nodes were visited (started), regardless of outcome.
    pub node_count: usize,
}

/// Breakpoint-driven single-node stepper over one workflow (`§4.9`).
pub struct DebugStepper {
    breakpoints: HashSet<NodeId>,
}

impl DebugStepper {
    /// Construct a session pausing before every node in `breakpoints`.
    #[must_use]
    pub fn new(breakpoints: HashSet<NodeId>) -> Self {
        Self { breakpoints }
    }

    /// Drive `workflow` in declared node order, emitting [`DebugEvent`]s to
    /// `events` and consuming [`DebugCommand`]s from `commands` whenever a
    /// breakpointed node is reached.
    pub async fn run(
        &self,
        workflow: &Workflow,
        graph: &DependencyGraph,
        mut context: ExecutionContext,
        services: &RuntimeServices,
        events: &mpsc::Sender<DebugEvent>,
        commands: &mut mpsc::Receiver<DebugCommand>,
    ) -> StepOutcome {
        let mut results = HashMap::new();
        let mut node_count = 0usize;

        for node in &workflow.nodes {
            if self.breakpoints.contains(&node.id) {
                let _ = events
                    .send(DebugEvent::new(
                        DebugEventType::Breakpoint,
                        Some(node.id),
                        Value::Null,
                    ))
                    .await;

                match tokio::time::timeout(INACTIVITY_TIMEOUT, commands.recv()).await {
                    Ok(Some(DebugCommand::Continue | DebugCommand::Step)) => {}
                    Ok(Some(DebugCommand::Stop) | None) => {
                        return StepOutcome {
                            reason: TerminationReason::Stopped,
                            results,
                            node_count,
                        };
                    }
                    Err(_elapsed) => {
                        let _ = events
                            .send(DebugEvent::new(
                                DebugEventType::Timeout,
                                None,
                                serde_json::json!({ "node_id": node.id.to_string() }),
                            ))
                            .await;
                        return StepOutcome {
                            reason: TerminationReason::TimedOut,
                            results,
                            node_count,
                        };
                    }
                }
            }

            let _ = events
                .send(DebugEvent::new(
                    DebugEventType::NodeStart,
                    Some(node.id),
                    Value::Null,
                ))
                .await;
            node_count += 1;

            let resolved_input = input::resolve(node, &context, graph);
            match executors::execute(node, &resolved_input, &context, services).await {
                Ok(output) => {
                    context.set_node_output(node.id, output.value.clone());
                    results.insert(node.id, output.value);
                    let _ = events
                        .send(DebugEvent::new(
                            DebugEventType::NodeComplete,
                            Some(node.id),
                            Value::Null,
                        ))
                        .await;
                }
                Err(err) => {
                    let _ = events
                        .send(DebugEvent::new(
                            DebugEventType::Error,
                            Some(node.id),
                            serde_json::json!({
                                "error": err.to_string(),
                                "type": error_type(&err),
                            }),
                        ))
                        .await;
                    return StepOutcome {
                        reason: TerminationReason::Errored,
                        results,
                        node_count,
                    };
                }
            }
        }

        let _ = events
            .send(DebugEvent::new(
                DebugEventType::Complete,
                None,
                serde_json::json!({ "node_count": node_count, "result_count": results.len() }),
            ))
            .await;

        StepOutcome {
            reason: TerminationReason::Completed,
            results,
            node_count,
        }
    }
}

fn error_type(err: &EngineError) -> &'static str {
    err.code()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executors::tests_support::{NoopMcp, NoopSecrets};
    use nebula_core::id::{EdgeId, UserId, WorkflowId};
    use nebula_workflow::{Edge, Node, NodeKind};
    use std::collections::HashMap as Map;
    use std::sync::Arc;

    fn services_mock() -> RuntimeServices {
        RuntimeServices {
            providers: Map::new(),
            embedding: None,
            secrets: Arc::new(NoopSecrets),
            mcp: Arc::new(NoopMcp),
            settings: crate::credential::Settings::default(),
            expression: nebula_expression::ExpressionEngine::new(),
            mock: true,
        }
    }

    fn linear_workflow() -> (Workflow, DependencyGraph, NodeId, NodeId) {
        let a = NodeId::v4();
        let b = NodeId::v4();
        let mut workflow = Workflow::new(WorkflowId::v4(), "t");
        workflow.nodes = vec![Node::new(a, NodeKind::Agent), Node::new(b, NodeKind::Agent)];
        workflow.edges = vec![Edge::new(EdgeId::v4(), a, b)];
        let graph = DependencyGraph::build(&workflow).unwrap();
        (workflow, graph, a, b)
    }

    #[tokio::test]
    async fn completes_every_node_with_no_breakpoints() {
        let (workflow, graph, a, b) = linear_workflow();
        let context = ExecutionContext::new(serde_json::json!("go"), UserId::v4());
        let (events_tx, mut events_rx) = mpsc::channel(16);
        let (_commands_tx, mut commands_rx) = mpsc::channel(1);

        let stepper = DebugStepper::new(HashSet::new());
        let outcome = stepper
            .run(
                &workflow,
                &graph,
                context,
                &services_mock(),
                &events_tx,
                &mut commands_rx,
            )
            .await;

        assert_eq!(outcome.reason, TerminationReason::Completed);
        assert_eq!(outcome.node_count, 2);
        assert!(outcome.results.contains_key(&a));
        assert!(outcome.results.contains_key(&b));

        let mut kinds = Vec::new();
        while let Ok(event) = events_rx.try_recv() {
            kinds.push(event.event_type);
        }
        assert_eq!(
            kinds,
            vec![
                DebugEventType::NodeStart,
                DebugEventType::NodeComplete,
                DebugEventType::NodeStart,
                DebugEventType::NodeComplete,
                DebugEventType::Complete,
            ]
        );
    }

    #[tokio::test]
    async fn breakpoint_pauses_until_continue_is_sent() {
        let (workflow, graph, a, _b) = linear_workflow();
        let context = ExecutionContext::new(serde_json::json!("go"), UserId::v4());
        let (events_tx, mut events_rx) = mpsc::channel(16);
        let (commands_tx, mut commands_rx) = mpsc::channel(1);

        let mut breakpoints = HashSet::new();
        breakpoints.insert(a);
        let stepper = DebugStepper::new(breakpoints);

        let run = tokio::spawn(async move {
            stepper
                .run(
                    &workflow,
                    &graph,
                    context,
                    &services_mock(),
                    &events_tx,
                    &mut commands_rx,
                )
                .await
        });

        let first = events_rx.recv().await.unwrap();
        assert_eq!(first.event_type, DebugEventType::Breakpoint);
        assert_eq!(first.node_id, Some(a));

        commands_tx.send(DebugCommand::Continue).await.unwrap();
        let outcome = run.await.unwrap();
        assert_eq!(outcome.reason, TerminationReason::Completed);
    }

    #[tokio::test]
    async fn stop_command_terminates_without_running_the_node() {
        let (workflow, graph, a, b) = linear_workflow();
        let context = ExecutionContext::new(serde_json::json!("go"), UserId::v4());
        let (events_tx, _events_rx) = mpsc::channel(16);
        let (commands_tx, mut commands_rx) = mpsc::channel(1);

        let mut breakpoints = HashSet::new();
        breakpoints.insert(a);
        let stepper = DebugStepper::new(breakpoints);

        commands_tx.send(DebugCommand::Stop).await.unwrap();
        let outcome = stepper
            .run(
                &workflow,
                &graph,
                context,
                &services_mock(),
                &events_tx,
                &mut commands_rx,
            )
            .await;

        assert_eq!(outcome.reason, TerminationReason::Stopped);
        assert_eq!(outcome.node_count, 0);
        assert!(!outcome.results.contains_key(&a));
        assert!(!outcome.results.contains_key(&b));
    }

    #[tokio::test]
    async fn closed_command_channel_while_paused_terminates_as_stopped() {
        let (workflow, graph, a, _b) = linear_workflow();
        let context = ExecutionContext::new(serde_json::json!("go"), UserId::v4());
        let (events_tx, _events_rx) = mpsc::channel(16);
        let (commands_tx, mut commands_rx) = mpsc::channel(1);
        drop(commands_tx);

        let mut breakpoints = HashSet::new();
        breakpoints.insert(a);
        let stepper = DebugStepper::new(breakpoints);

        let outcome = stepper
            .run(
                &workflow,
                &graph,
                context,
                &services_mock(),
                &events_tx,
                &mut commands_rx,
            )
            .await;

        assert_eq!(outcome.reason, TerminationReason::Stopped);
    }
}
