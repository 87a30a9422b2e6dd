//! Errors raised while building or installing the global subscriber.

use nebula_error::ErrorCode;
use thiserror::Error;

/// Errors from [`crate::init`].
#[derive(Debug, Error, ErrorCode)]
pub enum LogError {
    /// `tracing_subscriber::EnvFilter` rejected the configured filter
    /// directive.
    #[error("invalid log filter {directive:?}: {source}")]
    #[code = "invalid_filter"]
    InvalidFilter {
        /// The directive string that failed to parse.
        directive: String,
        /// The underlying parse error.
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    /// A global subscriber was already installed (e.g. `init` called
    /// twice in the same process).
    #[error("a global tracing subscriber is already set")]
    #[code = "already_initialized"]
    AlreadyInitialized,
}
