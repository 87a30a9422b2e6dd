//! Engine-level error type composing every lower-layer error this crate
//! touches (`§7`: a workspace-wide error convertible via `#[from]` at crate
//! boundaries, matching `nebula-execution::ExecutionError`'s own layering).

use nebula_core::id::NodeId;
use nebula_core::provider::ProviderError;
use nebula_error::ErrorCode;
use thiserror::Error;

/// Errors raised by the graph runtime (C5), node executors (C4), the input
/// resolver (C2), multi-agent dispatch (C6), and the debug stepper (C9).
#[derive(Debug, Error, ErrorCode)]
pub enum EngineError {
    /// The workflow failed validation before any node ran.
    #[error(transparent)]
    #[code = "invalid_workflow"]
    Workflow(#[from] nebula_workflow::WorkflowError),

    /// A checkpoint or context operation failed.
    #[error(transparent)]
    #[code = "execution_error"]
    Execution(#[from] nebula_execution::ExecutionError),

    /// A `multi_agent` node's team orchestration failed.
    #[error(transparent)]
    #[code = "agents_error"]
    Agents(#[from] nebula_agents::AgentsError),

    /// An external provider (LLM, embedding, MCP) call failed.
    #[error(transparent)]
    #[code = "provider_error"]
    #[retryable]
    Provider(#[from] ProviderError),

    /// A node's condition expression failed to evaluate.
    #[error("condition evaluation failed for node {node}: {source}")]
    #[code = "condition_error"]
    Condition {
        /// The condition node.
        node: NodeId,
        /// Underlying expression engine error.
        #[source]
        source: nebula_expression::ExpressionError,
    },

    /// A node ran past its allotted timeout.
    #[error("node {0} timed out")]
    #[code = "node_timeout"]
    #[retryable]
    NodeTimeout(NodeId),

    /// A node's final attempt failed with no error edge to route to.
    #[error("node {node} failed: {message}")]
    #[code = "node_failed"]
    #[retryable]
    NodeFailed {
        /// The failing node.
        node: NodeId,
        /// The failure message.
        message: String,
    },

    /// A node referenced a kind the registry has no executor for.
    #[error("no executor registered for node kind {0:?}")]
    #[code = "no_executor"]
    NoExecutor(nebula_workflow::NodeKind),

    /// No API key could be resolved for a requested model family.
    #[error("no credential available for model family {0}")]
    #[code = "missing_credential"]
    MissingCredential(String),

    /// The execution was cancelled mid-traversal.
    #[error("execution cancelled")]
    #[code = "cancelled"]
    Cancelled,
}
