//! The `Workflow` aggregate: a named DAG with an owner.

use chrono::{DateTime, Utc};
use nebula_core::id::{NodeId, UserId, WorkflowId};
use serde::{Deserialize, Serialize};

use crate::edge::Edge;
use crate::node::Node;

/// Coarse lifecycle tag for a workflow definition (separate from any single
/// execution's status).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Being edited, not yet runnable.
    #[default]
    Draft,
    /// Validated and eligible for execution, scheduling, webhooks.
    Active,
    /// Disabled; triggers no longer dispatch it.
    Archived,
}

/// A named directed graph of nodes with an owner.
///
/// `owner_id = None` marks a legacy/shared workflow (`§4.10`): it is
/// readable and executable by anyone, matching the ownership guard's
/// backward-compatibility rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    /// Stable identifier.
    pub id: WorkflowId,
    /// Owning user, or `None` for a legacy/shared workflow.
    #[serde(default)]
    pub owner_id: Option<UserId>,
    /// Display name.
    pub name: String,
    /// Optional free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Ordered sequence of nodes.
    pub nodes: Vec<Node>,
    /// Ordered sequence of edges.
    pub edges: Vec<Edge>,
    /// Lifecycle tag.
    #[serde(default)]
    pub status: WorkflowStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-modified timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    /// Construct a new, empty, draft workflow.
    #[must_use]
    pub fn new(id: WorkflowId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            owner_id: None,
            name: name.into(),
            description: None,
            nodes: Vec::new(),
            edges: Vec::new(),
            status: WorkflowStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }

    /// Look up a node by id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}
