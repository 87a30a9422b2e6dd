//! Shared core error type.

use thiserror::Error;

/// Errors raised by `nebula-core` primitives (ids, ownership, redaction).
#[derive(Debug, Error)]
pub enum CoreError {
    /// A UUID-backed identifier failed to parse.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] domain_key::UuidParseError),

    /// An ownership check rejected the caller.
    #[error("access denied")]
    AccessDenied,
}
