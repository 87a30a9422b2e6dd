//! Round-robin strategy: agents take turns, each refining the previous
//! agent's output (`§4.6`).
//!
//! Grounded on `agentchord.orchestration.strategies.round_robin.RoundRobinStrategy`.
//! Also hosts the `read_shared_context`/`write_shared_context`/
//! `list_shared_context` and `consult_<peer>` dynamic-tool factories shared
//! by the coordinator, round-robin, and debate strategies.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use nebula_core::provider::ToolSpec;
use serde_json::{json, Value};

use crate::error::AgentsError;
use crate::events::OrchestrationEvent;
use crate::message_bus::{AgentMessage, MessageType};
use crate::shared_context::SharedContext;
use crate::team::{Agent, AgentOutput, DynamicTool, TeamResult, TeamRole};

use super::StrategyContext;

/// Build the `read_shared_context`/`write_shared_context`/`list_shared_context`
/// tools scoped to `agent_name` (`§4.6`, coordinator strategy).
pub(crate) fn shared_context_tools(shared: &Arc<SharedContext>, agent_name: &str) -> Vec<DynamicTool> {
    let read = {
        let shared = Arc::clone(shared);
        DynamicTool {
            spec: ToolSpec {
                name: "read_shared_context".to_string(),
                description: "Read a value from the team's shared context".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": { "key": { "type": "string" } },
                    "required": ["key"],
                }),
            },
            handler: Arc::new(move |args: Value| {
                let shared = Arc::clone(&shared);
                Box::pin(async move {
                    let key = args.get("key").and_then(Value::as_str).unwrap_or_default();
                    Ok(shared.get(key, Value::Null))
                })
            }),
        }
    };

    let write = {
        let shared = Arc::clone(shared);
        let agent_name = agent_name.to_string();
        DynamicTool {
            spec: ToolSpec {
                name: "write_shared_context".to_string(),
                description: "Write a value into the team's shared context".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "key": { "type": "string" },
                        "value": {},
                    },
                    "required": ["key", "value"],
                }),
            },
            handler: Arc::new(move |args: Value| {
                let shared = Arc::clone(&shared);
                let agent_name = agent_name.clone();
                Box::pin(async move {
                    let key = args.get("key").and_then(Value::as_str).unwrap_or_default().to_string();
                    let value = args.get("value").cloned().unwrap_or(Value::Null);
                    shared.set(key, value, &agent_name);
                    Ok(Value::Bool(true))
                })
            }),
        }
    };

    let list = {
        let shared = Arc::clone(shared);
        DynamicTool {
            spec: ToolSpec {
                name: "list_shared_context".to_string(),
                description: "List every key currently set in the team's shared context".to_string(),
                parameters: json!({ "type": "object", "properties": {} }),
            },
            handler: Arc::new(move |_args: Value| {
                let shared = Arc::clone(&shared);
                Box::pin(async move { Ok(json!(shared.keys())) })
            }),
        }
    };

    vec![read, write, list]
}

/// Build `consult_<peer>` tools for `peers`, offered only when `max_depth`
/// is at least `1` (`§4.6`: "bounded by `max_consult_depth` to prevent
/// unbounded mutual invocation"). The consulted peer's own turn never
/// receives consult tools of its own, so a chain can only ever go one
/// level deep regardless of `max_depth`.
pub(crate) fn consult_tools(
    peers: &[(&String, &Arc<Agent>)],
    message_bus: &Arc<crate::message_bus::MessageBus>,
    current_agent_name: &str,
    max_depth: u32,
) -> Vec<DynamicTool> {
    if max_depth == 0 {
        return Vec::new();
    }
    peers
        .iter()
        .map(|(name, agent)| {
            let peer = Arc::clone(agent);
            let peer_name = (*name).clone();
            let sender = current_agent_name.to_string();
            let message_bus = Arc::clone(message_bus);
            DynamicTool {
                spec: ToolSpec {
                    name: format!("consult_{peer_name}"),
                    description: format!("Ask {peer_name} a question and get their answer"),
                    parameters: json!({
                        "type": "object",
                        "properties": { "question": { "type": "string" } },
                        "required": ["question"],
                    }),
                },
                handler: Arc::new(move |args: Value| {
                    let peer = Arc::clone(&peer);
                    let peer_name = peer_name.clone();
                    let sender = sender.clone();
                    let message_bus = Arc::clone(&message_bus);
                    Box::pin(async move {
                        let question = args.get("question").and_then(Value::as_str).unwrap_or_default();
                        message_bus
                            .send(AgentMessage::new(sender, Some(peer_name), MessageType::Task, question))
                            .await;
                        // One depth level consumed: the consulted peer gets no further consult tools.
                        let result = peer.run(question, &[], 1).await?;
                        Ok(json!({ "answer": result.output }))
                    })
                }),
            }
        })
        .collect()
}

/// Run the round-robin strategy.
pub async fn execute(task: &str, ctx: &StrategyContext) -> Result<TeamResult, AgentsError> {
    let started = Instant::now();
    let mut agent_outputs: HashMap<String, AgentOutput> = HashMap::new();
    let mut total_cost_micros = 0u64;
    let mut total_tokens = 0u64;
    let mut current_input = task.to_string();

    let agent_list: Vec<(String, Arc<Agent>)> = ctx
        .members
        .iter()
        .filter_map(|m| ctx.agents.get(&m.name).map(|a| (m.name.clone(), Arc::clone(a))))
        .collect();

    for round_num in 0..ctx.max_rounds {
        for (name, agent) in &agent_list {
            ctx.message_bus
                .send(
                    AgentMessage::new("system", Some(name.clone()), MessageType::Task, current_input.clone())
                        .with_metadata(json!({ "round": round_num + 1 })),
                )
                .await;

            ctx.callbacks
                .emit(OrchestrationEvent::AgentDelegated {
                    agent_name: name.clone(),
                    round: round_num + 1,
                    strategy: "round_robin".to_string(),
                })
                .await;

            let tools = if ctx.enable_consult {
                let peers: Vec<(&String, &Arc<Agent>)> = agent_list
                    .iter()
                    .filter(|(peer_name, _)| peer_name != name)
                    .map(|(peer_name, peer_agent)| (peer_name, peer_agent))
                    .collect();
                consult_tools(&peers, &ctx.message_bus, name, ctx.max_consult_depth)
            } else {
                Vec::new()
            };

            let result = agent.run(&current_input, &tools, 1).await?;
            current_input = result.output.clone();

            let tokens = result.usage.prompt_tokens + result.usage.completion_tokens;
            agent_outputs.insert(
                format!("{name}_r{}", round_num + 1),
                AgentOutput {
                    agent_name: name.clone(),
                    role: TeamRole::Worker,
                    output: result.output.clone(),
                    tokens,
                    cost_micros: result.usage.cost_micros,
                    duration_ms: result.duration_ms,
                },
            );
            total_cost_micros += result.usage.cost_micros;
            total_tokens += tokens;

            ctx.callbacks
                .emit(OrchestrationEvent::AgentCompleted {
                    agent_name: name.clone(),
                    round: round_num + 1,
                    tokens,
                    cost_micros: result.usage.cost_micros,
                    strategy: "round_robin".to_string(),
                })
                .await;

            ctx.shared_context.set(
                format!("{name}_r{}", round_num + 1),
                Value::String(result.output.clone()),
                name,
            );

            ctx.message_bus
                .send(
                    AgentMessage::new(name.clone(), Some("system".to_string()), MessageType::Result, result.output)
                        .with_metadata(json!({ "round": round_num + 1 })),
                )
                .await;
        }
    }

    ctx.shared_context
        .set("final_output", Value::String(current_input.clone()), "round_robin");

    Ok(TeamResult {
        output: current_input,
        agent_outputs,
        messages: ctx.message_bus.get_history(),
        total_cost_micros,
        total_tokens,
        rounds: ctx.max_rounds,
        duration_ms: started.elapsed().as_millis() as u64,
        strategy: ctx.strategy_name.clone(),
        team_name: String::new(),
    })
}
