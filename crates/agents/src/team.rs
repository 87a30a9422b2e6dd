//! The `multi_agent` node's team: a named group of agents, a strategy, and
//! the shared communication primitives they collaborate through (`§4.6`).
//!
//! Grounded on `agentchord.orchestration.team.AgentTeam`: member
//! registration, strategy resolution, and the `run`/`close` lifecycle.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::future::BoxFuture;
use nebula_core::provider::{ChatMessage, CompletionOutput, LlmProvider, ToolSpec, Usage};
use serde_json::Value;

use crate::error::AgentsError;
use crate::events::OrchestrationCallbacks;
use crate::message_bus::{AgentMessage, MessageBus};
use crate::shared_context::SharedContext;
use crate::strategies::{coordinator, debate, map_reduce, round_robin, StrategyContext};

/// Whether a team member acts as the delegating coordinator or a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamRole {
    /// Delegates subtasks and synthesizes results.
    Coordinator,
    /// Executes a delegated subtask or round.
    Worker,
}

/// Which orchestration strategy a `multi_agent` node selects (`§4.6`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Coordinator delegates via dynamically synthesised tools.
    Coordinator,
    /// Agents take turns refining the previous output.
    RoundRobin,
    /// Agents debate to convergence, then a synthesizer summarises.
    Debate,
    /// All agents run concurrently (map); a reducer consolidates (reduce).
    MapReduce,
}

impl StrategyKind {
    /// The strategy's default `max_rounds` when the node data omits one
    /// (`§4.6`).
    #[must_use]
    pub const fn default_max_rounds(self) -> u32 {
        match self {
            Self::Coordinator => 10,
            Self::RoundRobin => 1,
            Self::Debate => 3,
            Self::MapReduce => 2,
        }
    }

    /// Lowercase identifier, e.g. for event metadata.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Coordinator => "coordinator",
            Self::RoundRobin => "round_robin",
            Self::Debate => "debate",
            Self::MapReduce => "map_reduce",
        }
    }
}

/// A team member descriptor: name, role, and capability tags used by
/// strategies to build delegation prompts. Independent of the runtime
/// [`Agent`] object so strategies can reason about membership without
/// holding an agent reference.
#[derive(Debug, Clone)]
pub struct TeamMember {
    /// Unique name within the team.
    pub name: String,
    /// Coordinator or worker.
    pub role: TeamRole,
    /// Free-text capability tags shown in delegation prompts.
    pub capabilities: Vec<String>,
}

/// A dynamically synthesised tool bound into one agent's tool-calling loop
/// for one call — e.g. `delegate_to_writer` or `consult_researcher`.
pub struct DynamicTool {
    /// Tool name and JSON Schema shown to the model.
    pub spec: ToolSpec,
    /// Invoked with the model-supplied arguments when this tool is called.
    pub handler: Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value, AgentsError>> + Send + Sync>,
}

/// One LLM-backed team member: a fixed system prompt, model, and bound
/// provider. `§4.6`: "members (name, role, model, system prompt, optional
/// tool bindings, optional capabilities)".
pub struct Agent {
    /// Member name, unique within the team.
    pub name: String,
    /// Free-text role description shown in delegation prompts (e.g.
    /// "Research expert"), distinct from [`TeamRole`].
    pub role_description: String,
    /// Model identifier passed through to the provider.
    pub model: String,
    /// System prompt establishing this agent's persona and instructions.
    pub system_prompt: String,
    /// Capability tags surfaced to the coordinator.
    pub capabilities: Vec<String>,
    /// Tools always available to this agent (MCP bindings, ...).
    pub bound_tools: Vec<ToolSpec>,
    provider: Arc<dyn LlmProvider>,
}

/// The result of one [`Agent::run`] turn.
#[derive(Debug, Clone)]
pub struct AgentRunResult {
    /// Final text output (tool calls are resolved internally before
    /// returning).
    pub output: String,
    /// Aggregated usage across every completion in this turn's tool loop.
    pub usage: Usage,
    /// Wall-clock duration of the turn.
    pub duration_ms: u64,
}

impl Agent {
    /// Construct an agent bound to `provider`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        role_description: impl Into<String>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        capabilities: Vec<String>,
        bound_tools: Vec<ToolSpec>,
        provider: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            name: name.into(),
            role_description: role_description.into(),
            model: model.into(),
            system_prompt: system_prompt.into(),
            capabilities,
            bound_tools,
            provider,
        }
    }

    /// Clone the handle to this agent's bound provider, so a strategy can
    /// construct a variant `Agent` (e.g. with an extended system prompt)
    /// that still calls out through the same provider.
    #[must_use]
    pub fn provider_handle(&self) -> Arc<dyn LlmProvider> {
        Arc::clone(&self.provider)
    }

    /// Run one turn on `input`, resolving any tool calls the model makes
    /// against `extra_tools` internally (e.g. delegation/consult tools),
    /// up to `max_tool_rounds` completions before giving up and returning
    /// whatever text was last produced.
    pub async fn run(
        &self,
        input: &str,
        extra_tools: &[DynamicTool],
        max_tool_rounds: u32,
    ) -> Result<AgentRunResult, AgentsError> {
        let started = Instant::now();
        let mut messages = vec![
            ChatMessage::system(self.system_prompt.clone()),
            ChatMessage::user(input.to_string()),
        ];

        let mut tool_specs: Vec<ToolSpec> = self.bound_tools.clone();
        tool_specs.extend(extra_tools.iter().map(|t| t.spec.clone()));

        let mut usage = Usage::default();
        for _ in 0..max_tool_rounds.max(1) {
            let (output, turn_usage) = self.provider.complete(&messages, &tool_specs).await?;
            usage.prompt_tokens += turn_usage.prompt_tokens;
            usage.completion_tokens += turn_usage.completion_tokens;
            usage.cost_micros += turn_usage.cost_micros;

            match output {
                CompletionOutput::Text(text) => {
                    return Ok(AgentRunResult {
                        output: text,
                        usage,
                        duration_ms: started.elapsed().as_millis() as u64,
                    });
                }
                CompletionOutput::Structured(value) => {
                    return Ok(AgentRunResult {
                        output: value.to_string(),
                        usage,
                        duration_ms: started.elapsed().as_millis() as u64,
                    });
                }
                CompletionOutput::ToolCall { name, arguments } => {
                    let Some(tool) = extra_tools.iter().find(|t| t.spec.name == name) else {
                        return Err(AgentsError::UnknownAgent(name));
                    };
                    let result = (tool.handler)(arguments.clone()).await?;
                    messages.push(ChatMessage::assistant(format!(
                        "calling tool {name} with {arguments}"
                    )));
                    messages.push(ChatMessage::user(format!("tool {name} returned: {result}")));
                }
            }
        }

        Ok(AgentRunResult {
            output: String::new(),
            usage,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }
}

/// One team member's recorded output for a [`TeamResult`].
#[derive(Debug, Clone)]
pub struct AgentOutput {
    /// The agent that produced this output.
    pub agent_name: String,
    /// Coordinator or worker at the time this output was produced.
    pub role: TeamRole,
    /// The agent's text output.
    pub output: String,
    /// Tokens consumed producing it.
    pub tokens: u64,
    /// Cost in micro-units.
    pub cost_micros: u64,
    /// Wall-clock duration.
    pub duration_ms: u64,
}

/// Aggregated result of one [`Team::run`].
#[derive(Debug, Clone)]
pub struct TeamResult {
    /// The team's final consolidated output.
    pub output: String,
    /// Every recorded agent turn, keyed by a strategy-chosen label (not
    /// necessarily the bare agent name — e.g. `"writer_r2"`).
    pub agent_outputs: HashMap<String, AgentOutput>,
    /// Full message bus history at completion.
    pub messages: Vec<AgentMessage>,
    /// Summed cost across every agent turn.
    pub total_cost_micros: u64,
    /// Summed tokens across every agent turn.
    pub total_tokens: u64,
    /// Rounds actually executed (may be less than `max_rounds` on early
    /// convergence).
    pub rounds: u32,
    /// Wall-clock duration of the whole run.
    pub duration_ms: u64,
    /// Strategy name.
    pub strategy: String,
    /// Team name.
    pub team_name: String,
}

/// A team of agents collaborating under a chosen [`StrategyKind`].
pub struct Team {
    name: String,
    members: Vec<TeamMember>,
    agents: HashMap<String, Arc<Agent>>,
    coordinator: Option<String>,
    strategy: StrategyKind,
    shared_context: Arc<SharedContext>,
    message_bus: Arc<MessageBus>,
    max_rounds: Option<u32>,
    callbacks: Arc<dyn OrchestrationCallbacks>,
    enable_consult: bool,
    max_consult_depth: u32,
    closed: AtomicBool,
}

impl Team {
    /// Construct a team. `coordinator` names an agent already present in
    /// `agents` to use as the dedicated coordinator; when `None` the
    /// coordinator strategy falls back to the first registered agent.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        agents: Vec<Arc<Agent>>,
        coordinator: Option<String>,
        strategy: StrategyKind,
        max_rounds: Option<u32>,
        callbacks: Arc<dyn OrchestrationCallbacks>,
        enable_consult: bool,
        max_consult_depth: u32,
    ) -> Self {
        let message_bus = Arc::new(MessageBus::default());
        let mut members = Vec::with_capacity(agents.len());
        let mut by_name = HashMap::with_capacity(agents.len());
        for agent in agents {
            message_bus.register(&agent.name);
            let role = if coordinator.as_deref() == Some(agent.name.as_str()) {
                TeamRole::Coordinator
            } else {
                TeamRole::Worker
            };
            members.push(TeamMember {
                name: agent.name.clone(),
                role,
                capabilities: agent.capabilities.clone(),
            });
            by_name.insert(agent.name.clone(), agent);
        }

        Self {
            name: name.into(),
            members,
            agents: by_name,
            coordinator,
            strategy,
            shared_context: Arc::new(SharedContext::default()),
            message_bus,
            max_rounds,
            callbacks,
            enable_consult,
            max_consult_depth,
            closed: AtomicBool::new(false),
        }
    }

    /// The team's shared context, e.g. for seeding initial values before
    /// `run`.
    #[must_use]
    pub fn shared_context(&self) -> &Arc<SharedContext> {
        &self.shared_context
    }

    /// The team's message bus.
    #[must_use]
    pub fn message_bus(&self) -> &Arc<MessageBus> {
        &self.message_bus
    }

    /// Run the team on `task` using its configured strategy.
    pub async fn run(&self, task: &str) -> Result<TeamResult, AgentsError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(AgentsError::Closed);
        }
        if self.agents.is_empty() {
            return Err(AgentsError::EmptyTeam);
        }

        let started = Instant::now();
        self.callbacks
            .emit(crate::events::OrchestrationEvent::OrchestrationStart {
                team: self.name.clone(),
                strategy: self.strategy.as_str().to_string(),
                members: self.members.iter().map(|m| m.name.clone()).collect(),
            })
            .await;

        let ctx = StrategyContext {
            coordinator: self.coordinator.clone(),
            members: self.members.clone(),
            agents: self.agents.clone(),
            message_bus: Arc::clone(&self.message_bus),
            shared_context: Arc::clone(&self.shared_context),
            max_rounds: self.max_rounds.unwrap_or(self.strategy.default_max_rounds()),
            callbacks: Arc::clone(&self.callbacks),
            strategy_name: self.strategy.as_str().to_string(),
            enable_consult: self.enable_consult,
            max_consult_depth: self.max_consult_depth,
        };

        let result = match self.strategy {
            StrategyKind::Coordinator => coordinator::execute(task, &ctx).await,
            StrategyKind::RoundRobin => round_robin::execute(task, &ctx).await,
            StrategyKind::Debate => debate::execute(task, &ctx).await,
            StrategyKind::MapReduce => map_reduce::execute(task, &ctx).await,
        };

        match &result {
            Ok(team_result) => {
                self.callbacks
                    .emit(crate::events::OrchestrationEvent::OrchestrationEnd {
                        team: self.name.clone(),
                        rounds: team_result.rounds,
                        total_cost_micros: team_result.total_cost_micros,
                        total_tokens: team_result.total_tokens,
                    })
                    .await;
            }
            Err(error) => {
                self.callbacks
                    .emit(crate::events::OrchestrationEvent::OrchestrationError {
                        team: self.name.clone(),
                        error: error.to_string(),
                    })
                    .await;
            }
        }

        result.map(|mut team_result| {
            team_result.team_name = self.name.clone();
            if team_result.duration_ms == 0 {
                team_result.duration_ms = started.elapsed().as_millis() as u64;
            }
            team_result
        })
    }

    /// Mark the team closed and clear its message bus. Idempotent.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.message_bus.clear();
    }
}
