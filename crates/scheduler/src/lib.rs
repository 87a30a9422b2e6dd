#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Nebula Scheduler
//!
//! Cron-triggered dispatch for the Nebula workflow engine (C8, `§4.8`).
//!
//! - [`schedule`] — the [`schedule::Schedule`] entity and its repository
//!   contract
//! - [`cron`] — cron expression validation and next-run calculation,
//!   timezone-aware
//! - [`manager`] — [`manager::SchedulerManager`], the timer wheel that
//!   loads enabled schedules on `start`, reconciles add/update/remove/
//!   enable/disable, and dispatches fires through a
//!   [`nebula_eventbus::BackgroundExecutionManager`]

pub mod cron;
pub mod error;
pub mod manager;
pub mod schedule;

pub use cron::{calculate_next_run, resolve_timezone, validate_cron_expression};
pub use error::SchedulerError;
pub use manager::SchedulerManager;
pub use schedule::{Schedule, ScheduleRepository, WorkflowRepository};
