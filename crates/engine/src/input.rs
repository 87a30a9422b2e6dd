//! Input resolver (C2, `§4.2`): decide a node's input from an explicit
//! override, incoming edges, or the workflow input.

use nebula_execution::ExecutionContext;
use nebula_workflow::{DependencyGraph, Node};
use serde_json::Value;

use crate::template;

/// Resolve `node`'s input against `context`, consulting `graph` for rule 3
/// (incoming untagged edges). `§4.2`'s priority order:
///
/// 1. `node.data["inputTemplate"]` — resolve as a template, that's the
///    input.
/// 2. `node.data["inputSource"] = K` — read `context[K]`, resolve any
///    nested templates in it.
/// 3. Otherwise inspect untagged incoming edges (see [`from_predecessors`]).
#[must_use]
pub fn resolve(node: &Node, context: &ExecutionContext, graph: &DependencyGraph) -> Value {
    if let Some(Value::String(tpl)) = node.data.get("inputTemplate") {
        return Value::String(template::resolve(tpl, context));
    }

    if let Some(Value::String(key)) = node.data.get("inputSource") {
        if let Some(value) = context.get(key) {
            return template::resolve_value(value, context);
        }
    }

    from_predecessors(node, context, graph)
}

/// Rule 3: resolve input purely from the upstream nodes whose outputs are
/// present in `context`.
///
/// - `|P| = 0` (no predecessor has produced output yet, or the node has
///   none): the workflow's original `input`.
/// - `|P| = 1`: that predecessor's output, unwrapping a `{"output": ...}`
///   dict shape to its `output` field when present, otherwise stringified;
///   any `{{path}}` templates in the result are then resolved against
///   `context`, same as rule 2.
/// - `|P| >= 2`: the stringified outputs concatenated with `\n\n`,
///   skipping nulls.
#[must_use]
pub fn from_predecessors(node: &Node, context: &ExecutionContext, graph: &DependencyGraph) -> Value {
    let present: Vec<Value> = graph
        .untagged_predecessors(node.id)
        .into_iter()
        .filter_map(|upstream| context.node_output(upstream).cloned())
        .collect();

    match present.as_slice() {
        [] => context.input().cloned().unwrap_or(Value::Null),
        [single] => template::resolve_value(&unwrap_output(single.clone()), context),
        many => {
            let joined = many
                .iter()
                .filter(|v| !v.is_null())
                .map(stringify)
                .collect::<Vec<_>>()
                .join("\n\n");
            Value::String(joined)
        }
    }
}

fn unwrap_output(value: Value) -> Value {
    match value {
        Value::Object(ref map) => match map.get("output") {
            Some(output) => output.clone(),
            None => Value::String(stringify(&value)),
        },
        other => other,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_core::id::{EdgeId, NodeId, UserId};
    use nebula_workflow::{Edge, NodeKind, Workflow};

    fn build_graph(nodes: Vec<Node>, edges: Vec<Edge>) -> DependencyGraph {
        let mut w = Workflow::new(nebula_core::id::WorkflowId::v4(), "t");
        w.nodes = nodes;
        w.edges = edges;
        DependencyGraph::build(&w).unwrap()
    }

    #[test]
    fn no_predecessors_falls_back_to_workflow_input() {
        let a = NodeId::v4();
        let node = Node::new(a, NodeKind::Agent);
        let graph = build_graph(vec![node.clone()], vec![]);
        let ctx = ExecutionContext::new(serde_json::json!("hello"), UserId::v4());
        assert_eq!(resolve(&node, &ctx, &graph), serde_json::json!("hello"));
    }

    #[test]
    fn single_predecessor_passes_output_through() {
        let a = NodeId::v4();
        let b = NodeId::v4();
        let node_b = Node::new(b, NodeKind::Agent);
        let graph = build_graph(
            vec![Node::new(a, NodeKind::Agent), node_b.clone()],
            vec![Edge::new(EdgeId::v4(), a, b)],
        );
        let mut ctx = ExecutionContext::new(Value::Null, UserId::v4());
        ctx.set_node_output(a, serde_json::json!("from a"));
        assert_eq!(resolve(&node_b, &ctx, &graph), serde_json::json!("from a"));
    }

    #[test]
    fn single_predecessor_unwraps_output_field() {
        let a = NodeId::v4();
        let b = NodeId::v4();
        let node_b = Node::new(b, NodeKind::Agent);
        let graph = build_graph(
            vec![Node::new(a, NodeKind::Agent), node_b.clone()],
            vec![Edge::new(EdgeId::v4(), a, b)],
        );
        let mut ctx = ExecutionContext::new(Value::Null, UserId::v4());
        ctx.set_node_output(a, serde_json::json!({"output": "unwrapped"}));
        assert_eq!(resolve(&node_b, &ctx, &graph), serde_json::json!("unwrapped"));
    }

    #[test]
    fn single_predecessor_dict_without_output_field_is_stringified() {
        let a = NodeId::v4();
        let b = NodeId::v4();
        let node_b = Node::new(b, NodeKind::Agent);
        let graph = build_graph(
            vec![Node::new(a, NodeKind::Agent), node_b.clone()],
            vec![Edge::new(EdgeId::v4(), a, b)],
        );
        let mut ctx = ExecutionContext::new(Value::Null, UserId::v4());
        ctx.set_node_output(a, serde_json::json!({"foo": "bar"}));
        let resolved = resolve(&node_b, &ctx, &graph);
        assert_eq!(resolved, serde_json::json!(r#"{"foo":"bar"}"#));
    }

    #[test]
    fn single_predecessor_output_resolves_templates() {
        let a = NodeId::v4();
        let b = NodeId::v4();
        let node_b = Node::new(b, NodeKind::Agent);
        let graph = build_graph(
            vec![Node::new(a, NodeKind::Agent), node_b.clone()],
            vec![Edge::new(EdgeId::v4(), a, b)],
        );
        let mut ctx = ExecutionContext::new(Value::Null, UserId::v4());
        ctx.set("agent0", serde_json::json!(42));
        ctx.set_node_output(a, serde_json::json!("The answer is {{agent0}}"));
        assert_eq!(
            resolve(&node_b, &ctx, &graph),
            serde_json::json!("The answer is 42")
        );
    }

    #[test]
    fn multiple_predecessors_concatenate_with_blank_line() {
        let a = NodeId::v4();
        let b = NodeId::v4();
        let c = NodeId::v4();
        let node_c = Node::new(c, NodeKind::Agent);
        let graph = build_graph(
            vec![
                Node::new(a, NodeKind::Agent),
                Node::new(b, NodeKind::Agent),
                node_c.clone(),
            ],
            vec![Edge::new(EdgeId::v4(), a, c), Edge::new(EdgeId::v4(), b, c)],
        );
        let mut ctx = ExecutionContext::new(Value::Null, UserId::v4());
        ctx.set_node_output(a, serde_json::json!("first"));
        ctx.set_node_output(b, serde_json::json!("second"));
        assert_eq!(
            resolve(&node_c, &ctx, &graph),
            serde_json::json!("first\n\nsecond")
        );
    }

    #[test]
    fn input_template_takes_priority() {
        let a = NodeId::v4();
        let node = Node::new(a, NodeKind::Agent)
            .with_data("inputTemplate", serde_json::json!("hi {{input}}"));
        let graph = build_graph(vec![node.clone()], vec![]);
        let ctx = ExecutionContext::new(serde_json::json!("world"), UserId::v4());
        assert_eq!(resolve(&node, &ctx, &graph), serde_json::json!("hi world"));
    }

    #[test]
    fn input_source_reads_named_context_key() {
        let a = NodeId::v4();
        let node = Node::new(a, NodeKind::Agent).with_data("inputSource", serde_json::json!("today"));
        let graph = build_graph(vec![node.clone()], vec![]);
        let ctx = ExecutionContext::new(Value::Null, UserId::v4());
        let resolved = resolve(&node, &ctx, &graph);
        assert!(resolved.is_string());
    }
}
