//! Workflow validation errors.

use nebula_core::id::{EdgeId, NodeId};
use nebula_error::ErrorCode;
use thiserror::Error;

/// Errors raised while validating or traversing a [`crate::Workflow`].
///
/// All of these are validation-class failures (`§7`): a workflow that
/// fails validation never starts an execution.
#[derive(Debug, Error, ErrorCode)]
pub enum WorkflowError {
    /// An edge references a `source` or `target` not present among the
    /// workflow's nodes.
    #[error("edge {edge} references a non-existent node {node}")]
    #[code = "dangling_edge"]
    DanglingEdge {
        /// The offending edge.
        edge: EdgeId,
        /// The missing node id.
        node: NodeId,
    },

    /// Two nodes in the same workflow share an identifier.
    #[error("duplicate node id: {0}")]
    #[code = "duplicate_node_id"]
    DuplicateNodeId(NodeId),

    /// No node in the workflow has zero non-error inbound edges, so
    /// traversal has nowhere to start.
    #[error("workflow has no root node")]
    #[code = "no_root"]
    NoRoot,

    /// A node id was referenced that does not exist in this workflow.
    #[error("node not found: {0}")]
    #[code = "node_not_found"]
    NodeNotFound(NodeId),
}
