//! Node definitions.

use nebula_core::id::NodeId;
use serde::{Deserialize, Serialize};

/// The kind of a node, exactly as named in the external interface (`§6`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Root of the graph; returns `context["input"]` unchanged.
    Trigger,
    /// Calls an LLM provider.
    Agent,
    /// Calls an MCP tool.
    McpTool,
    /// Evaluates a boolean expression and selects a branch.
    Condition,
    /// Fans outgoing untagged edges out to run concurrently.
    Parallel,
    /// Runs an inner sub-plan up to `maxIterations` times.
    FeedbackLoop,
    /// Retrieval-augmented generation over `documents`.
    Rag,
    /// Delegates to a multi-agent orchestration strategy.
    MultiAgent,
}

/// A 2-D editor position, carried for round-tripping but not interpreted by
/// the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

/// A node within a [`crate::Workflow`].
///
/// `data` is an opaque map whose shape depends on `kind` (e.g. an `agent`
/// node's data carries `model`, `mcpTools`, `outputFields`; a `condition`
/// node's data carries the expression to evaluate). The runtime never
/// assumes more structure on `data` than a given node executor needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Identifier, unique within its workflow.
    pub id: NodeId,
    /// Node kind, dispatching to the matching executor.
    pub kind: NodeKind,
    /// Opaque, kind-specific configuration.
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
    /// Editor layout position (not interpreted by the runtime).
    #[serde(default)]
    pub position: Option<Position>,
}

impl Node {
    /// Construct a node with empty data.
    #[must_use]
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            data: serde_json::Map::new(),
            position: None,
        }
    }

    /// Builder: attach a data field.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }
}
