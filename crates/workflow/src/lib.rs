//! # Nebula Workflow
//!
//! Workflow definition, DAG graph, and validation (`§3` data model:
//! `Workflow`, `Node`, `Edge`; `§4.5` traversal invariants).
//!
//! This crate models the *static* graph — the graph runtime (`nebula-engine`)
//! owns traversal order, retries, and execution state.

pub mod edge;
pub mod error;
pub mod graph;
pub mod node;
pub mod state;
pub mod workflow;

pub use edge::{Edge, HANDLE_ERROR, HANDLE_FALSE, HANDLE_TRUE};
pub use error::WorkflowError;
pub use graph::DependencyGraph;
pub use node::{Node, NodeKind, Position};
pub use state::{NodeState, can_transition};
pub use workflow::{Workflow, WorkflowStatus};
