//! Error types for multi-agent orchestration.

use nebula_core::provider::ProviderError;
use nebula_error::ErrorCode;
use thiserror::Error;

/// Errors a team orchestration run can fail with.
#[derive(Debug, Error, ErrorCode)]
pub enum AgentsError {
    /// A strategy referenced a team member that was never registered.
    #[error("unknown agent: {0}")]
    #[code = "unknown_agent"]
    UnknownAgent(String),

    /// A team was constructed with no members at all.
    #[error("team has no members")]
    #[code = "empty_team"]
    EmptyTeam,

    /// The underlying LLM/tool provider call failed.
    #[error("provider error: {0}")]
    #[code = "provider"]
    Provider(#[from] ProviderError),

    /// `AgentTeam::run` was called after `close()`.
    #[error("team has been closed")]
    #[code = "team_closed"]
    Closed,
}
