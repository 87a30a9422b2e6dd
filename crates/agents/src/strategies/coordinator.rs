//! Coordinator strategy: a coordinator agent delegates to workers via
//! dynamically synthesised `delegate_to_<name>` tools (`§4.6`).
//!
//! Grounded on `agentchord.orchestration.strategies.coordinator.CoordinatorStrategy`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use nebula_core::provider::ToolSpec;
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::error::AgentsError;
use crate::events::OrchestrationEvent;
use crate::message_bus::{AgentMessage, MessageType};
use crate::team::{AgentOutput, DynamicTool, TeamResult, TeamRole};

use super::StrategyContext;

/// Run the coordinator strategy.
pub async fn execute(task: &str, ctx: &StrategyContext) -> Result<TeamResult, AgentsError> {
    let started = Instant::now();

    let coordinator_name = ctx
        .coordinator
        .clone()
        .or_else(|| ctx.members.first().map(|m| m.name.clone()))
        .ok_or(AgentsError::EmptyTeam)?;
    let coordinator = ctx
        .agents
        .get(&coordinator_name)
        .ok_or_else(|| AgentsError::UnknownAgent(coordinator_name.clone()))?;

    let workers = ctx.worker_agents();
    let outputs: Arc<Mutex<HashMap<String, AgentOutput>>> = Arc::new(Mutex::new(HashMap::new()));

    if workers.is_empty() {
        // Only one agent in the team: it simply runs the task directly.
        let result = coordinator.run(task, &[], 1).await?;
        let mut agent_outputs = HashMap::new();
        agent_outputs.insert(
            coordinator_name.clone(),
            AgentOutput {
                agent_name: coordinator_name,
                role: TeamRole::Coordinator,
                output: result.output.clone(),
                tokens: result.usage.prompt_tokens + result.usage.completion_tokens,
                cost_micros: result.usage.cost_micros,
                duration_ms: result.duration_ms,
            },
        );
        return Ok(TeamResult {
            output: result.output,
            agent_outputs,
            messages: ctx.message_bus.get_history(),
            total_cost_micros: result.usage.cost_micros,
            total_tokens: result.usage.prompt_tokens + result.usage.completion_tokens,
            rounds: 1,
            duration_ms: started.elapsed().as_millis() as u64,
            strategy: ctx.strategy_name.clone(),
            team_name: String::new(),
        });
    }

    let delegation_tools: Vec<DynamicTool> = workers
        .iter()
        .map(|(name, agent)| {
            let worker = Arc::clone(agent);
            let worker_name = (*name).clone();
            let sender_name = coordinator_name.clone();
            let message_bus = Arc::clone(&ctx.message_bus);
            let shared_context = Arc::clone(&ctx.shared_context);
            let outputs = Arc::clone(&outputs);
            let member_role = ctx
                .member(name)
                .map(|m| m.role)
                .unwrap_or(crate::team::TeamRole::Worker);

            DynamicTool {
                spec: ToolSpec {
                    name: format!("delegate_to_{worker_name}"),
                    description: format!("Delegate a subtask to {worker_name}"),
                    parameters: json!({
                        "type": "object",
                        "properties": { "task": { "type": "string" } },
                        "required": ["task"],
                    }),
                },
                handler: Arc::new(move |args: Value| {
                    let worker = Arc::clone(&worker);
                    let worker_name = worker_name.clone();
                    let sender_name = sender_name.clone();
                    let message_bus = Arc::clone(&message_bus);
                    let shared_context = Arc::clone(&shared_context);
                    let outputs = Arc::clone(&outputs);
                    Box::pin(async move {
                        let subtask = args.get("task").and_then(Value::as_str).unwrap_or_default();
                        message_bus
                            .send(AgentMessage::new(
                                sender_name,
                                Some(worker_name.clone()),
                                MessageType::Task,
                                subtask,
                            ))
                            .await;

                        let result = worker.run(subtask, &[], 1).await?;

                        shared_context.set(
                            format!("{worker_name}_result"),
                            Value::String(result.output.clone()),
                            &worker_name,
                        );
                        outputs.lock().insert(
                            worker_name.clone(),
                            AgentOutput {
                                agent_name: worker_name.clone(),
                                role: member_role,
                                output: result.output.clone(),
                                tokens: result.usage.prompt_tokens + result.usage.completion_tokens,
                                cost_micros: result.usage.cost_micros,
                                duration_ms: result.duration_ms,
                            },
                        );

                        Ok(json!({ "output": result.output }))
                    })
                }),
            }
        })
        .collect();

    let context_tools = super::round_robin::shared_context_tools(&ctx.shared_context, &coordinator_name);
    let mut all_tools = delegation_tools;
    all_tools.extend(context_tools);

    let member_descriptions: Vec<String> = workers
        .iter()
        .map(|(name, _)| {
            let caps = ctx
                .member(name)
                .map(|m| m.capabilities.clone())
                .unwrap_or_default();
            if caps.is_empty() {
                format!("- {name}: worker")
            } else {
                format!("- {name}: worker (capabilities: {})", caps.join(", "))
            }
        })
        .collect();
    let coordinator_system = format!(
        "You are a team coordinator managing the following agents:\n{}\n\n\
         Your job is to:\n\
         1. Analyze the given task\n\
         2. Delegate subtasks to appropriate team members using the delegation tools\n\
         3. Synthesize their results into a final comprehensive response\n\n\
         Use the delegate_to_* tools to assign work. You can delegate to multiple agents.\n\n{}",
        member_descriptions.join("\n"),
        coordinator.system_prompt,
    );

    let coord_agent = Arc::new(crate::team::Agent::new(
        coordinator.name.clone(),
        coordinator.role_description.clone(),
        coordinator.model.clone(),
        coordinator_system,
        coordinator.capabilities.clone(),
        coordinator.bound_tools.clone(),
        Arc::clone(&coordinator_provider(coordinator)),
    ));

    let coord_result = coord_agent.run(task, &all_tools, ctx.max_rounds).await?;

    let mut agent_outputs = outputs.lock().clone();
    agent_outputs.insert(
        coordinator_name.clone(),
        AgentOutput {
            agent_name: coordinator_name.clone(),
            role: TeamRole::Coordinator,
            output: coord_result.output.clone(),
            tokens: coord_result.usage.prompt_tokens + coord_result.usage.completion_tokens,
            cost_micros: coord_result.usage.cost_micros,
            duration_ms: coord_result.duration_ms,
        },
    );

    ctx.callbacks
        .emit(OrchestrationEvent::SynthesisStart {
            synthesizer: coordinator_name.clone(),
            rounds: agent_outputs.len() as u32,
            strategy: ctx.strategy_name.clone(),
        })
        .await;

    let total_cost_micros = agent_outputs.values().map(|o| o.cost_micros).sum();
    let total_tokens = agent_outputs.values().map(|o| o.tokens).sum();
    let rounds = agent_outputs.len() as u32;

    Ok(TeamResult {
        output: coord_result.output,
        agent_outputs,
        messages: ctx.message_bus.get_history(),
        total_cost_micros,
        total_tokens,
        rounds,
        duration_ms: started.elapsed().as_millis() as u64,
        strategy: ctx.strategy_name.clone(),
        team_name: String::new(),
    })
}

/// `Agent` does not expose its provider publicly (it is only used
/// internally by `run`); the coordinator strategy needs a fresh `Agent`
/// wrapping the same provider to inject its extended system prompt without
/// mutating the shared one. Since `Agent` has no public provider accessor,
/// strategies construct this via the one extension point `Agent` exposes
/// for that purpose.
fn coordinator_provider(agent: &crate::team::Agent) -> Arc<dyn nebula_core::provider::LlmProvider> {
    agent.provider_handle()
}
