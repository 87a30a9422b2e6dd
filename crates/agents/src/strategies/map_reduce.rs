//! Map-reduce strategy: every agent runs concurrently on the same task
//! (map); a reducer consolidates their outputs (reduce). Exactly 2 rounds
//! (`§4.6`).
//!
//! Not present in the reference `agentchord` source pulled into this
//! workspace's `original_source/` (only `coordinator`, `round_robin`, and
//! `debate` were retrieved); grounded instead on the concurrent-fan-out
//! shape of [`debate::execute`]'s per-round loop and its synthesizer
//! fallback (dedicated coordinator, else the first registered agent).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use serde_json::Value;

use crate::error::AgentsError;
use crate::events::OrchestrationEvent;
use crate::team::{AgentOutput, TeamResult, TeamRole};

use super::StrategyContext;

const MAP_REDUCE_ROUNDS: u32 = 2;

/// Run the map-reduce strategy.
pub async fn execute(task: &str, ctx: &StrategyContext) -> Result<TeamResult, AgentsError> {
    let started = Instant::now();

    let reducer_name = ctx
        .coordinator
        .clone()
        .or_else(|| ctx.members.first().map(|m| m.name.clone()))
        .ok_or(AgentsError::EmptyTeam)?;

    let map_agents: Vec<(String, Arc<crate::team::Agent>)> = ctx
        .members
        .iter()
        .filter_map(|m| ctx.agents.get(&m.name).map(|a| (m.name.clone(), Arc::clone(a))))
        .collect();

    for (name, _) in &map_agents {
        ctx.callbacks
            .emit(OrchestrationEvent::AgentDelegated {
                agent_name: name.clone(),
                round: 1,
                strategy: "map_reduce".to_string(),
            })
            .await;
    }

    let map_futures = map_agents.iter().map(|(name, agent)| {
        let task = task.to_string();
        let name = name.clone();
        let agent = Arc::clone(agent);
        async move {
            let result = agent.run(&task, &[], 1).await;
            (name, result)
        }
    });
    let map_results = join_all(map_futures).await;

    let mut agent_outputs: HashMap<String, AgentOutput> = HashMap::new();
    let mut total_cost_micros = 0u64;
    let mut total_tokens = 0u64;
    let mut mapped_sections: Vec<String> = Vec::new();

    for (name, result) in map_results {
        let result = result?;
        let tokens = result.usage.prompt_tokens + result.usage.completion_tokens;
        total_cost_micros += result.usage.cost_micros;
        total_tokens += tokens;
        mapped_sections.push(format!("[{name}]: {}", result.output));

        ctx.callbacks
            .emit(OrchestrationEvent::AgentCompleted {
                agent_name: name.clone(),
                round: 1,
                tokens,
                cost_micros: result.usage.cost_micros,
                strategy: "map_reduce".to_string(),
            })
            .await;

        ctx.shared_context
            .set(format!("{name}_map_result"), Value::String(result.output.clone()), &name);

        agent_outputs.insert(
            format!("{name}_map"),
            AgentOutput {
                agent_name: name,
                role: TeamRole::Worker,
                output: result.output,
                tokens,
                cost_micros: result.usage.cost_micros,
                duration_ms: result.duration_ms,
            },
        );
    }

    let reducer = ctx
        .agents
        .get(&reducer_name)
        .ok_or_else(|| AgentsError::UnknownAgent(reducer_name.clone()))?;

    let reduce_prompt = format!(
        "Task: {task}\n\nThe following agents each worked on this task independently:\n{}\n\nConsolidate their \
         outputs into a single, comprehensive response.",
        mapped_sections.join("\n---\n")
    );

    ctx.callbacks
        .emit(OrchestrationEvent::SynthesisStart {
            synthesizer: reducer_name.clone(),
            rounds: 1,
            strategy: "map_reduce".to_string(),
        })
        .await;

    let reduce_result = reducer.run(&reduce_prompt, &[], 1).await?;
    let reduce_tokens = reduce_result.usage.prompt_tokens + reduce_result.usage.completion_tokens;
    total_cost_micros += reduce_result.usage.cost_micros;
    total_tokens += reduce_tokens;

    ctx.callbacks
        .emit(OrchestrationEvent::AgentCompleted {
            agent_name: reducer_name.clone(),
            round: 2,
            tokens: reduce_tokens,
            cost_micros: reduce_result.usage.cost_micros,
            strategy: "map_reduce".to_string(),
        })
        .await;

    agent_outputs.insert(
        format!("{reducer_name}_reduce"),
        AgentOutput {
            agent_name: reducer_name.clone(),
            role: TeamRole::Coordinator,
            output: reduce_result.output.clone(),
            tokens: reduce_tokens,
            cost_micros: reduce_result.usage.cost_micros,
            duration_ms: reduce_result.duration_ms,
        },
    );

    ctx.shared_context
        .set("reduced_output", Value::String(reduce_result.output.clone()), &reducer_name);

    Ok(TeamResult {
        output: reduce_result.output,
        agent_outputs,
        messages: ctx.message_bus.get_history(),
        total_cost_micros,
        total_tokens,
        rounds: MAP_REDUCE_ROUNDS,
        duration_ms: started.elapsed().as_millis() as u64,
        strategy: ctx.strategy_name.clone(),
        team_name: String::new(),
    })
}
