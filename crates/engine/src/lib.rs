#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Nebula Engine
//!
//! The execution-time brain of the Nebula workflow system: template
//! resolution, input resolution, node executors, the graph runtime, and the
//! interactive debug stepper.
//!
//! This crate does NOT define the workflow/DAG data model (`nebula-workflow`)
//! or the per-run context/checkpoint state (`nebula-execution`) — it
//! consumes both. It defines:
//!
//! - [`template`] — `{{path}}` placeholder substitution (C1)
//! - [`input`] — per-node input resolution from template, named context key,
//!   or predecessor outputs (C2)
//! - [`credential`] — provider-key resolution order
//! - [`mock`] — deterministic mock-mode executor outputs
//! - [`executors`] — one function per node kind, dispatched after input
//!   resolution (C4)
//! - [`runtime`] — [`runtime::GraphRuntime`], the frontier-based traversal
//!   that drives a workflow to completion (C5)
//! - [`stepper`] — [`stepper::DebugStepper`], breakpoint-driven single-node
//!   stepping over the same graph (C9)

pub mod credential;
pub mod error;
pub mod executors;
pub mod input;
pub mod mock;
pub mod runtime;
pub mod stepper;
pub mod template;

pub use credential::{ModelFamily, Settings};
pub use error::EngineError;
pub use executors::{execute, ExecutorOutput, RuntimeServices};
pub use runtime::{run_subgraph, GraphRuntime, RunOutcome, RuntimeConfig};
pub use stepper::{DebugCommand, DebugEvent, DebugEventType, DebugStepper, StepOutcome};
