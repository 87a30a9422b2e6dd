#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Nebula Event Bus
//!
//! The background execution manager: owns each workflow execution's
//! in-flight task handle, its bounded event buffer, and its subscriber fan
//! out. The Scheduler and the webhook entry point both start executions
//! through [`BackgroundExecutionManager::dispatch`]; the graph runtime calls
//! [`BackgroundExecutionManager::emit`] as it visits nodes.

pub mod event;
pub mod manager;

pub use event::{ExecutionEvent, ExecutionEventType, EVENT_TTL_SECONDS, MAX_EVENTS_PER_EXECUTION};
pub use manager::{BackgroundExecutionManager, RunFuture, SubscriberId};
