//! Edge definitions.

use nebula_core::id::{EdgeId, NodeId};
use serde::{Deserialize, Serialize};

/// The reserved source-handle tokens the runtime interprets specially.
/// Any other (or absent) handle means "default data flow".
pub const HANDLE_TRUE: &str = "true";
pub const HANDLE_FALSE: &str = "false";
pub const HANDLE_ERROR: &str = "error";

/// A directed edge between two nodes.
///
/// `source_handle` carries the two conventions the runtime understands:
/// `"true"`/`"false"` select a `condition` node's branch, and `"error"`
/// marks an error-recovery edge taken when the source fails terminally.
/// Any other value (or `None`) is ordinary data flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Identifier, unique within its workflow.
    pub id: EdgeId,
    /// Upstream node.
    pub source: NodeId,
    /// Downstream node.
    pub target: NodeId,
    /// Selects a condition branch (`true`/`false`) or marks an error edge
    /// (`error`). `None` means ordinary data flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    /// Carried for round-tripping; the runtime does not interpret it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
}

impl Edge {
    /// Construct an untagged (ordinary data-flow) edge.
    #[must_use]
    pub fn new(id: EdgeId, source: NodeId, target: NodeId) -> Self {
        Self {
            id,
            source,
            target,
            source_handle: None,
            target_handle: None,
        }
    }

    /// Builder: attach a source handle.
    #[must_use]
    pub fn with_source_handle(mut self, handle: impl Into<String>) -> Self {
        self.source_handle = Some(handle.into());
        self
    }

    /// `true` if this is an error-recovery edge (`source_handle = "error"`).
    #[must_use]
    pub fn is_error_edge(&self) -> bool {
        self.source_handle.as_deref() == Some(HANDLE_ERROR)
    }

    /// `true` if this edge is tagged with `handle` (condition branch or
    /// error edge). Untagged edges never match a specific handle.
    #[must_use]
    pub fn has_handle(&self, handle: &str) -> bool {
        self.source_handle.as_deref() == Some(handle)
    }

    /// `true` if this edge carries no special handle — ordinary data flow.
    #[must_use]
    pub fn is_untagged(&self) -> bool {
        self.source_handle.is_none()
    }
}
