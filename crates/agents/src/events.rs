//! Observability side-channel for orchestration strategies (`§4.6`):
//! `agent_delegated`, `agent_completed`, `convergence_detected`,
//! `synthesis_start`, `orchestration_start`, `orchestration_end`,
//! `orchestration_error`, `orchestration_message`.
//!
//! Strategy correctness never depends on these events firing or on a
//! callback sink being registered at all.

use async_trait::async_trait;

/// One orchestration lifecycle event.
#[derive(Debug, Clone)]
pub enum OrchestrationEvent {
    /// A team run began.
    OrchestrationStart {
        /// Team name.
        team: String,
        /// Strategy in use.
        strategy: String,
        /// Registered member names.
        members: Vec<String>,
    },
    /// A team run finished successfully.
    OrchestrationEnd {
        /// Team name.
        team: String,
        /// Rounds actually executed.
        rounds: u32,
        /// Total cost in micro-units across all agents.
        total_cost_micros: u64,
        /// Total tokens across all agents.
        total_tokens: u64,
    },
    /// A team run failed.
    OrchestrationError {
        /// Team name.
        team: String,
        /// Error description.
        error: String,
    },
    /// A message passed through the team's [`MessageBus`](crate::message_bus::MessageBus).
    OrchestrationMessage {
        /// Sending agent.
        sender: String,
        /// Addressed recipient, if any.
        recipient: Option<String>,
        /// Message type, stringified.
        message_type: String,
        /// First 200 characters of the message body.
        content_preview: String,
    },
    /// A task was handed to a worker agent.
    AgentDelegated {
        /// The delegated-to agent.
        agent_name: String,
        /// Current round number.
        round: u32,
        /// Strategy driving this delegation.
        strategy: String,
    },
    /// An agent finished its turn.
    AgentCompleted {
        /// The agent that finished.
        agent_name: String,
        /// Current round number.
        round: u32,
        /// Tokens consumed this turn.
        tokens: u64,
        /// Cost in micro-units this turn.
        cost_micros: u64,
        /// Strategy driving this turn.
        strategy: String,
    },
    /// Every agent's position matched its previous round (debate).
    ConvergenceDetected {
        /// Round at which convergence was detected.
        round: u32,
        /// Strategy reporting convergence (always `"debate"`).
        strategy: String,
    },
    /// The synthesis/reduce phase began.
    SynthesisStart {
        /// Agent performing synthesis.
        synthesizer: String,
        /// Total rounds that preceded synthesis.
        rounds: u32,
        /// Strategy driving synthesis.
        strategy: String,
    },
}

/// Sink for [`OrchestrationEvent`]s. Strategies call this best-effort; a
/// `()` implementation is provided for callers with no observability
/// sink wired up.
#[async_trait]
pub trait OrchestrationCallbacks: Send + Sync {
    /// Record one event.
    async fn emit(&self, event: OrchestrationEvent);
}

#[async_trait]
impl OrchestrationCallbacks for () {
    async fn emit(&self, _event: OrchestrationEvent) {}
}
