//! # Nebula Error
//!
//! Enterprise error infrastructure shared by every crate in the workspace.
//! Each crate defines its own `thiserror`-derived error enum and implements
//! [`ErrorCode`] on it (by hand, or via `#[derive(ErrorCode)]` behind the
//! `derive` feature) so that:
//!
//! - every error carries a stable, loggable `code()` independent of its
//!   `Display` message (which may change wording across releases), and
//! - the graph runtime (C5) can ask `retryable()` to decide whether a node
//!   failure is eligible for retry/error-edge routing without matching on
//!   the concrete error type.
//!
//! This crate intentionally has no `anyhow` dependency: every surface in
//! this workspace returns typed errors.

#![forbid(unsafe_code)]

#[cfg(feature = "derive")]
pub use nebula_error_macros::ErrorCode;

/// A stable error classification independent of the human-readable message.
pub trait ErrorCode: std::error::Error {
    /// A short, stable, machine-readable identifier for this error variant
    /// (e.g. `"node_timeout"`, `"dangling_edge"`). Stable across wording
    /// changes to the `Display` message.
    fn code(&self) -> &'static str;

    /// Whether the operation that produced this error is safe to retry.
    /// Defaults to `false` — most errors (validation, permission) are not.
    fn retryable(&self) -> bool {
        false
    }
}
