//! The four orchestration strategies a `multi_agent` node may select
//! (`§4.6`): [`coordinator`], [`round_robin`], [`debate`], [`map_reduce`].
//!
//! Grounded on `agentchord.orchestration.strategies.base.StrategyContext`
//! and the Python strategy modules of the same names — each `execute`
//! function here corresponds 1:1 to a `BaseStrategy.execute` override.

pub mod coordinator;
pub mod debate;
pub mod map_reduce;
pub mod round_robin;

use std::collections::HashMap;
use std::sync::Arc;

use crate::events::OrchestrationCallbacks;
use crate::message_bus::MessageBus;
use crate::shared_context::SharedContext;
use crate::team::{Agent, TeamMember};

/// Everything a strategy needs to orchestrate one [`Team::run`](crate::team::Team::run)
/// call — the runtime analogue of `StrategyContext` in the Python source,
/// built fresh by [`Team::run`] on every call so strategies stay stateless.
#[derive(Clone)]
pub struct StrategyContext {
    /// Name of the dedicated coordinator agent, if one was configured.
    pub coordinator: Option<String>,
    /// Member descriptors in registration order.
    pub members: Vec<TeamMember>,
    /// Runtime agents by name.
    pub agents: HashMap<String, Arc<Agent>>,
    /// The team's message bus.
    pub message_bus: Arc<MessageBus>,
    /// The team's shared context.
    pub shared_context: Arc<SharedContext>,
    /// Resolved round budget (already defaulted per-strategy by [`Team::run`](crate::team::Team::run)).
    pub max_rounds: u32,
    /// Observability sink.
    pub callbacks: Arc<dyn OrchestrationCallbacks>,
    /// Strategy name, for event/result metadata.
    pub strategy_name: String,
    /// Whether worker agents may consult peers mid-turn.
    pub enable_consult: bool,
    /// Bound on consult chain depth.
    pub max_consult_depth: u32,
}

impl StrategyContext {
    /// Agents in registration order, excluding the named coordinator (if
    /// any).
    pub(crate) fn worker_agents(&self) -> Vec<(&String, &Arc<Agent>)> {
        self.members
            .iter()
            .filter(|m| Some(m.name.as_str()) != self.coordinator.as_deref())
            .filter_map(|m| self.agents.get(&m.name).map(|agent| (&m.name, agent)))
            .collect()
    }

    pub(crate) fn member(&self, name: &str) -> Option<&TeamMember> {
        self.members.iter().find(|m| m.name == name)
    }
}
