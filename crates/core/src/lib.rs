//! # Nebula Core
//!
//! Foundational types shared by every Nebula crate: strongly-typed entity
//! identifiers, the ownership guard (C10), and the sensitive-data
//! redaction helper used by the execution journal and logging paths.
//!
//! ## Usage
//!
//! ```rust
//! use nebula_core::id::{ExecutionId, WorkflowId, NodeId};
//!
//! let execution_id = ExecutionId::v4();
//! let workflow_id = WorkflowId::v4();
//! let node_id = NodeId::v4();
//! ```

pub mod error;
pub mod id;
pub mod ownership;
pub mod provider;
pub mod redact;

pub use error::CoreError;

/// Result type used throughout Nebula core.
pub type Result<T> = std::result::Result<T, CoreError>;
