#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Nebula Resilience
//!
//! Retry-with-backoff and timeout primitives used by the graph runtime
//! (`nebula-engine`, C5) to implement `§4.5`'s "retry and timeout" and
//! `§7`'s "Timeout"/"Provider" error classes: a node runs with a per-node
//! timeout, and on timeout or a retryable error the runtime may retry up to
//! `maxRetries` times with exponential backoff between attempts.
//!
//! This crate deliberately stays small: a full circuit-breaker/bulkhead
//! pattern library is not something the spec calls for (no component
//! tracks cross-call failure rates or sheds load), so only the two
//! primitives actually used by C5 are provided.

pub mod retry;
pub mod timeout;

pub use retry::{retry, RetryOutcome, RetryPolicy};
pub use timeout::{with_timeout, TimeoutError};
