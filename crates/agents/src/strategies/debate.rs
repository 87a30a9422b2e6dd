//! Debate strategy: agents post successive perspectives against a shared
//! transcript, converge-detecting after the first round, then a
//! synthesizer summarises (`§4.6`).
//!
//! Grounded on `agentchord.orchestration.strategies.debate.DebateStrategy`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};

use crate::error::AgentsError;
use crate::events::OrchestrationEvent;
use crate::message_bus::{AgentMessage, MessageType};
use crate::team::{Agent, AgentOutput, TeamResult, TeamRole};

use super::round_robin::consult_tools;
use super::StrategyContext;

/// Run the debate strategy.
pub async fn execute(task: &str, ctx: &StrategyContext) -> Result<TeamResult, AgentsError> {
    let started = Instant::now();
    let mut agent_outputs: HashMap<String, AgentOutput> = HashMap::new();
    let mut total_cost_micros = 0u64;
    let mut total_tokens = 0u64;
    let mut debate_history: Vec<String> = Vec::new();
    let mut previous_positions: HashMap<String, String> = HashMap::new();
    let mut converged = false;
    let mut actual_rounds = 0u32;

    let agent_list: Vec<(String, Arc<Agent>)> = ctx
        .members
        .iter()
        .filter_map(|m| ctx.agents.get(&m.name).map(|a| (m.name.clone(), Arc::clone(a))))
        .collect();

    'rounds: for round_num in 0..ctx.max_rounds {
        actual_rounds = round_num + 1;
        let mut current_positions: HashMap<String, String> = HashMap::new();

        for (name, agent) in &agent_list {
            let window = agent_list.len() * 2;
            let recent: Vec<&String> = debate_history.iter().rev().take(window).rev().collect();
            let context = if recent.is_empty() {
                format!("Task: {task}\n\nRound 1: Please provide your initial perspective on this topic.")
            } else {
                let transcript = recent
                    .iter()
                    .map(std::string::String::as_str)
                    .collect::<Vec<_>>()
                    .join("\n---\n");
                format!(
                    "Task: {task}\n\nPrevious arguments:\n{transcript}\n\nRound {}: Please provide your perspective, \
                     building on or challenging the previous arguments.",
                    round_num + 1
                )
            };

            ctx.message_bus
                .send(
                    AgentMessage::new("system", Some(name.clone()), MessageType::Task, truncate(&context, 500))
                        .with_metadata(json!({ "round": round_num + 1 })),
                )
                .await;

            ctx.callbacks
                .emit(OrchestrationEvent::AgentDelegated {
                    agent_name: name.clone(),
                    round: round_num + 1,
                    strategy: "debate".to_string(),
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

            let result = agent.run(&context, &tools, 1).await?;
            current_positions.insert(name.clone(), result.output.clone());
            debate_history.push(format!("[{name}] (Round {}): {}", round_num + 1, result.output));

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
                    strategy: "debate".to_string(),
                })
                .await;

            ctx.shared_context.set(
                format!("{name}_position_r{}", round_num + 1),
                Value::String(result.output.clone()),
                name,
            );

            ctx.message_bus
                .send(AgentMessage::new(name.clone(), None, MessageType::Response, result.output))
                .await;
        }

        if round_num > 0 && round_num + 1 < ctx.max_rounds && !previous_positions.is_empty() {
            let unchanged = current_positions
                .iter()
                .all(|(name, position)| previous_positions.get(name) == Some(position));
            if unchanged {
                converged = true;
                ctx.callbacks
                    .emit(OrchestrationEvent::ConvergenceDetected {
                        round: actual_rounds,
                        strategy: "debate".to_string(),
                    })
                    .await;
                ctx.shared_context
                    .set("convergence_round", json!(actual_rounds), "debate");
                break 'rounds;
            }
        }
        previous_positions = current_positions;
    }

    let synth_name = agent_list
        .first()
        .map(|(name, _)| name.clone())
        .ok_or(AgentsError::EmptyTeam)?;
    let synth_agent = ctx.agents.get(&synth_name).ok_or_else(|| AgentsError::UnknownAgent(synth_name.clone()))?;

    let synthesis_prompt = format!(
        "Task: {task}\n\nThe following debate has concluded:\n{}\n\nPlease synthesize the key points into a final, \
         comprehensive response.",
        debate_history.join("\n---\n")
    );

    ctx.message_bus
        .send(AgentMessage::new(
            "system",
            Some(synth_name.clone()),
            MessageType::Task,
            "Synthesize debate results",
        ))
        .await;

    ctx.callbacks
        .emit(OrchestrationEvent::SynthesisStart {
            synthesizer: synth_name.clone(),
            rounds: ctx.max_rounds,
            strategy: "debate".to_string(),
        })
        .await;

    let synth_result = synth_agent.run(&synthesis_prompt, &[], 1).await?;
    let synth_tokens = synth_result.usage.prompt_tokens + synth_result.usage.completion_tokens;
    agent_outputs.insert(
        format!("{synth_name}_synthesis"),
        AgentOutput {
            agent_name: synth_name.clone(),
            role: TeamRole::Coordinator,
            output: synth_result.output.clone(),
            tokens: synth_tokens,
            cost_micros: synth_result.usage.cost_micros,
            duration_ms: synth_result.duration_ms,
        },
    );
    total_cost_micros += synth_result.usage.cost_micros;
    total_tokens += synth_tokens;

    ctx.callbacks
        .emit(OrchestrationEvent::AgentCompleted {
            agent_name: synth_name.clone(),
            round: ctx.max_rounds + 1,
            tokens: synth_tokens,
            cost_micros: synth_result.usage.cost_micros,
            strategy: "debate".to_string(),
        })
        .await;

    ctx.message_bus
        .send(AgentMessage::new(
            synth_name.clone(),
            Some("system".to_string()),
            MessageType::Result,
            synth_result.output.clone(),
        ))
        .await;

    ctx.shared_context
        .set("synthesis", Value::String(synth_result.output.clone()), &synth_name);
    if converged {
        ctx.shared_context.set("converged", Value::Bool(true), "debate");
    }

    Ok(TeamResult {
        output: synth_result.output,
        agent_outputs,
        messages: ctx.message_bus.get_history(),
        total_cost_micros,
        total_tokens,
        rounds: actual_rounds,
        duration_ms: started.elapsed().as_millis() as u64,
        strategy: ctx.strategy_name.clone(),
        team_name: String::new(),
    })
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}
