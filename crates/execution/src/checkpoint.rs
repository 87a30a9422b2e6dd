//! Checkpoint store: durable `(execution_id -> current_node, context, status)`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nebula_core::id::{ExecutionId, NodeId};
use serde::{Deserialize, Serialize};

use crate::context::ExecutionContext;
use crate::error::ExecutionError;
use crate::status::ExecutionStatus;

/// One row: the durable snapshot written before a node begins executing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// The execution this checkpoint belongs to.
    pub execution_id: ExecutionId,
    /// The node about to run (or that was about to run, on resume).
    pub current_node: NodeId,
    /// The execution context as of just before `current_node` started.
    pub context: ExecutionContext,
    /// The execution's status at save time.
    pub status: ExecutionStatus,
    /// Set when the checkpoint was written by `mark_failed`.
    #[serde(default)]
    pub error: Option<String>,
    /// When this row was last written.
    pub updated_at: DateTime<Utc>,
}

/// Durable key-value surface for checkpoints. Implementations may be SQL,
/// embedded KV, or in-memory — the runtime only depends on this contract.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Upsert the checkpoint for `execution_id`.
    async fn save(
        &self,
        execution_id: ExecutionId,
        node_id: NodeId,
        context: ExecutionContext,
        status: ExecutionStatus,
    ) -> Result<(), ExecutionError>;

    /// Load the current checkpoint for `execution_id`, if any.
    async fn load(&self, execution_id: ExecutionId) -> Result<Option<Checkpoint>, ExecutionError>;

    /// Mark the checkpoint failed at `node_id` with `error`, without
    /// deleting it — a failed execution's last checkpoint remains available
    /// for inspection until explicitly deleted.
    async fn mark_failed(
        &self,
        execution_id: ExecutionId,
        node_id: NodeId,
        error: String,
    ) -> Result<(), ExecutionError>;

    /// Delete the checkpoint for `execution_id`. Called on successful
    /// completion.
    async fn delete(&self, execution_id: ExecutionId) -> Result<(), ExecutionError>;
}

/// In-memory [`CheckpointStore`] backed by a concurrent map — the reference
/// implementation used by tests and the debug stepper.
#[derive(Debug, Default)]
pub struct InMemoryCheckpointStore {
    rows: dashmap::DashMap<ExecutionId, Checkpoint>,
}

impl InMemoryCheckpointStore {
    /// Construct an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn save(
        &self,
        execution_id: ExecutionId,
        node_id: NodeId,
        context: ExecutionContext,
        status: ExecutionStatus,
    ) -> Result<(), ExecutionError> {
        self.rows.insert(
            execution_id,
            Checkpoint {
                execution_id,
                current_node: node_id,
                context,
                status,
                error: None,
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn load(&self, execution_id: ExecutionId) -> Result<Option<Checkpoint>, ExecutionError> {
        Ok(self.rows.get(&execution_id).map(|r| r.clone()))
    }

    async fn mark_failed(
        &self,
        execution_id: ExecutionId,
        node_id: NodeId,
        error: String,
    ) -> Result<(), ExecutionError> {
        match self.rows.get_mut(&execution_id) {
            Some(mut row) => {
                row.current_node = node_id;
                row.status = ExecutionStatus::Failed;
                row.error = Some(error);
                row.updated_at = Utc::now();
                Ok(())
            }
            None => Err(ExecutionError::CheckpointNotFound),
        }
    }

    async fn delete(&self, execution_id: ExecutionId) -> Result<(), ExecutionError> {
        self.rows.remove(&execution_id);
        Ok(())
    }
}
