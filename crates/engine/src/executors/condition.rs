//! `condition` node executor (`§4.4`): evaluate a boolean expression and
//! select the `true`/`false` branch.

use nebula_execution::ExecutionContext;
use nebula_expression::context::EvaluationContext;
use nebula_workflow::Node;
use serde_json::Value;

use super::{ExecutorOutput, RuntimeServices};
use crate::error::EngineError;

/// Evaluate `node.data["expression"]` against `context` and return
/// `{"result": bool, "active_handle": "true"|"false"}`.
pub fn execute(
    node: &Node,
    context: &ExecutionContext,
    services: &RuntimeServices,
) -> Result<ExecutorOutput, EngineError> {
    let expression = node
        .data
        .get("expression")
        .and_then(Value::as_str)
        .unwrap_or("false");

    let eval_ctx = build_evaluation_context(context);
    let result = services
        .expression
        .evaluate_bool(expression, &eval_ctx)
        .map_err(|source| EngineError::Condition {
            node: node.id,
            source,
        })?;

    let handle = if result { "true" } else { "false" };
    Ok(ExecutorOutput::value(
        serde_json::json!({ "result": result, "active_handle": handle }),
    ))
}

/// Project the flat [`ExecutionContext`] into the structured
/// [`EvaluationContext`] the expression engine expects: `$input` is the
/// workflow input, and every other context key (node outputs, `_usage_*`,
/// `today`, ...) is exposed as an `$execution.<key>` variable.
pub(crate) fn build_evaluation_context(context: &ExecutionContext) -> EvaluationContext {
    let mut eval_ctx = EvaluationContext::new();
    eval_ctx.set_input(context.input().cloned().unwrap_or(Value::Null));
    for (key, value) in context.as_map() {
        eval_ctx.set_execution_var(key.clone(), value.clone());
    }
    eval_ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_core::id::{NodeId, UserId};
    use nebula_workflow::NodeKind;

    fn services() -> RuntimeServices {
        RuntimeServices {
            providers: std::collections::HashMap::new(),
            embedding: None,
            secrets: std::sync::Arc::new(crate::executors::tests_support::NoopSecrets),
            mcp: std::sync::Arc::new(crate::executors::tests_support::NoopMcp),
            settings: crate::credential::Settings::default(),
            expression: nebula_expression::ExpressionEngine::new(),
            mock: false,
        }
    }

    #[test]
    fn true_branch_selected_when_expression_holds() {
        let node = Node::new(NodeId::v4(), NodeKind::Condition)
            .with_data("expression", serde_json::json!("$input.score > 5"));
        let mut context = ExecutionContext::new(serde_json::json!({"score": 9}), UserId::v4());
        context.set("score_noise", Value::Null);
        let out = execute(&node, &context, &services()).unwrap();
        assert_eq!(out.value["result"], true);
        assert_eq!(out.value["active_handle"], "true");
    }

    #[test]
    fn false_branch_selected_when_expression_fails() {
        let node = Node::new(NodeId::v4(), NodeKind::Condition)
            .with_data("expression", serde_json::json!("$input.score > 5"));
        let context = ExecutionContext::new(serde_json::json!({"score": 1}), UserId::v4());
        let out = execute(&node, &context, &services()).unwrap();
        assert_eq!(out.value["result"], false);
        assert_eq!(out.value["active_handle"], "false");
    }
}
