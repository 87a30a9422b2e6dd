#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Nebula Execution
//!
//! Execution-time state for the Nebula workflow engine: the per-run context,
//! the checkpoint store, the execution/node-execution log, usage
//! aggregation, and the journal of audit events.
//!
//! This crate does NOT contain the graph runtime orchestrator — that is
//! `nebula-engine`. It defines:
//!
//! - [`ExecutionStatus`], [`ExecutionMode`], [`TriggerKind`] — lifecycle
//!   tokens
//! - [`ExecutionContext`] — the mutable, string-keyed map threaded through a
//!   run
//! - [`Checkpoint`] and [`CheckpointStore`] — durable pause/resume state
//! - [`Execution`] and [`NodeExecution`] — the persisted run log
//! - [`UsageAggregate`] — token/cost accounting
//! - [`JournalEntry`] — audit log of execution events
//! - State machine transitions validated by the [`transition`] module

pub mod checkpoint;
pub mod context;
pub mod error;
pub mod execution;
pub mod journal;
pub mod status;
pub mod transition;

pub use checkpoint::{Checkpoint, CheckpointStore, InMemoryCheckpointStore};
pub use context::{ErrorEnvelope, ExecutionContext, NodeUsage};
pub use error::ExecutionError;
pub use execution::{Execution, NodeExecution, UsageAggregate};
pub use journal::JournalEntry;
pub use status::{ExecutionMode, ExecutionStatus, TriggerKind};
