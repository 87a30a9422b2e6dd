#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Nebula Log
//!
//! Structured logging for the Nebula workflow engine: a thin wrapper over
//! `tracing`/`tracing-subscriber` providing one [`init`] entry point and a
//! handful of macros ([`timed!`], [`async_timed!`], [`log_error!`],
//! [`timed_span!`]) used across the workspace for consistent span and
//! timing fields.

pub mod config;
pub mod error;
pub mod init;
#[macro_use]
pub mod macros;

pub use config::{Config, Format};
pub use error::LogError;
pub use init::init;
