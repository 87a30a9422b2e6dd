//! `feedback_loop` node executor (`§4.4`): run an inner sub-plan up to
//! `maxIterations` times, stopping early once `stopCondition` holds.

use nebula_execution::ExecutionContext;
use nebula_workflow::{DependencyGraph, Node, Workflow};
use serde_json::Value;

use super::condition::build_evaluation_context;
use super::{ExecutorOutput, RuntimeServices};
use crate::error::EngineError;

/// Default iteration count when `node.data["maxIterations"]` is absent.
const DEFAULT_MAX_ITERATIONS: u64 = 1;

/// Parse `node.data["subWorkflow"]` as a [`Workflow`] and run it against a
/// clone of `context`, re-running up to `maxIterations` times or until
/// `stopCondition` evaluates truthy.
pub async fn execute(
    node: &Node,
    context: &ExecutionContext,
    services: &RuntimeServices,
) -> Result<ExecutorOutput, EngineError> {
    let Some(sub_value) = node.data.get("subWorkflow") else {
        return Ok(ExecutorOutput::value(Value::Null));
    };
    let sub_workflow: Workflow = serde_json::from_value(sub_value.clone()).map_err(|err| {
        EngineError::NodeFailed {
            node: node.id,
            message: format!("invalid subWorkflow: {err}"),
        }
    })?;
    let graph = DependencyGraph::build(&sub_workflow)?;

    let max_iterations = node
        .data
        .get("maxIterations")
        .and_then(Value::as_u64)
        .unwrap_or(DEFAULT_MAX_ITERATIONS)
        .max(1);
    let stop_condition = node.data.get("stopCondition").and_then(Value::as_str);

    let mut working = context.clone();
    for _ in 0..max_iterations {
        crate::runtime::run_subgraph(&sub_workflow, &graph, &mut working, services)
            .await
            .map_err(|(_, err)| err)?;

        if let Some(expression) = stop_condition {
            let eval_ctx = build_evaluation_context(&working);
            if services
                .expression
                .evaluate_bool(expression, &eval_ctx)
                .unwrap_or(false)
            {
                break;
            }
        }
    }

    Ok(ExecutorOutput::value(Value::Object(working.into_map())))
}
