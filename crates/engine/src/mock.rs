//! Mock-mode synthetic outputs (`§4.4`): every executor's fast,
//! deterministic stand-in used when the runtime's mock switch is on.

use nebula_workflow::Node;
use serde_json::{Map, Value};

/// The declared type of one `outputFields` entry on an `agent` node,
/// driving which placeholder value mock mode synthesizes for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeFieldType {
    /// A placeholder string.
    String,
    /// `0`.
    Number,
    /// `false`.
    Boolean,
    /// `[]`.
    Array,
    /// `{}`.
    Object,
}

impl NodeFieldType {
    /// Parse a field-type name as declared in `outputFields`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            _ => None,
        }
    }

    /// The fixture value mock mode synthesizes for this type.
    #[must_use]
    pub fn fixture(self) -> Value {
        match self {
            Self::String => Value::String("[Mock]".to_string()),
            Self::Number => Value::from(0),
            Self::Boolean => Value::Bool(false),
            Self::Array => Value::Array(Vec::new()),
            Self::Object => Value::Object(Map::new()),
        }
    }
}

fn node_label(node: &Node) -> String {
    node.data
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| node.id.to_string())
}

/// The mock output for an `agent` node: `"[Mock] <name>"`, unless
/// `outputFields` is set, in which case a fixture object matching the
/// declared field types is returned.
#[must_use]
pub fn agent_output(node: &Node) -> Value {
    match node.data.get("outputFields") {
        Some(Value::Object(fields)) => {
            let mut obj = Map::with_capacity(fields.len());
            for (key, declared_type) in fields {
                let ty = declared_type
                    .as_str()
                    .and_then(NodeFieldType::parse)
                    .unwrap_or(NodeFieldType::String);
                obj.insert(key.clone(), ty.fixture());
            }
            Value::Object(obj)
        }
        _ => Value::String(format!("[Mock] {}", node_label(node))),
    }
}

/// The mock output for an `mcp_tool` node: the node's declared
/// `mockResponse` if present, otherwise `{result: "[Mock] <tool_name>"}`.
#[must_use]
pub fn tool_output(node: &Node) -> Value {
    if let Some(response) = node.data.get("mockResponse") {
        return response.clone();
    }
    let tool_name = node
        .data
        .get("tool")
        .and_then(Value::as_str)
        .unwrap_or("tool");
    serde_json::json!({ "result": format!("[Mock] {tool_name}") })
}

/// The mock output for a `condition` node: always takes the `true` branch.
#[must_use]
pub fn condition_output() -> Value {
    serde_json::json!({ "result": true, "active_handle": "true" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_core::id::NodeId;
    use nebula_workflow::NodeKind;

    #[test]
    fn agent_mock_without_output_fields_uses_name() {
        let node = Node::new(NodeId::v4(), NodeKind::Agent).with_data("name", serde_json::json!("Summarizer"));
        assert_eq!(agent_output(&node), serde_json::json!("[Mock] Summarizer"));
    }

    #[test]
    fn agent_mock_with_output_fields_synthesizes_fixture() {
        let node = Node::new(NodeId::v4(), NodeKind::Agent).with_data(
            "outputFields",
            serde_json::json!({"summary": "string", "score": "number", "tags": "array"}),
        );
        let out = agent_output(&node);
        assert_eq!(out["summary"], serde_json::json!("[Mock]"));
        assert_eq!(out["score"], serde_json::json!(0));
        assert_eq!(out["tags"], serde_json::json!([]));
    }

    #[test]
    fn tool_mock_prefers_declared_mock_response() {
        let node = Node::new(NodeId::v4(), NodeKind::McpTool)
            .with_data("mockResponse", serde_json::json!({"custom": true}));
        assert_eq!(tool_output(&node), serde_json::json!({"custom": true}));
    }

    #[test]
    fn tool_mock_default_shape() {
        let node = Node::new(NodeId::v4(), NodeKind::McpTool).with_data("tool", serde_json::json!("search"));
        assert_eq!(tool_output(&node), serde_json::json!({"result": "[Mock] search"}));
    }

    #[test]
    fn condition_mock_always_true() {
        assert_eq!(
            condition_output(),
            serde_json::json!({"result": true, "active_handle": "true"})
        );
    }
}
