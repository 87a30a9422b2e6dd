//! End-to-end tests for each orchestration strategy against a scripted
//! fake provider (no network, deterministic multi-step tool-calling).

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use nebula_agents::{Agent, StrategyKind, Team};
use nebula_core::provider::{ChatMessage, CompletionOutput, LlmProvider, ProviderError, ToolSpec, Usage};
use serde_json::json;

/// Returns a scripted sequence of completions, repeating the last one
/// once exhausted.
struct ScriptedProvider {
    script: Mutex<VecDeque<(CompletionOutput, Usage)>>,
    last: Mutex<(CompletionOutput, Usage)>,
}

impl ScriptedProvider {
    fn new(script: Vec<(CompletionOutput, Usage)>) -> Arc<Self> {
        let last = script
            .last()
            .cloned()
            .unwrap_or((CompletionOutput::Text(String::new()), Usage::default()));
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            last: Mutex::new(last),
        })
    }

    fn text(text: &str) -> Arc<Self> {
        Self::new(vec![(
            CompletionOutput::Text(text.to_string()),
            Usage { prompt_tokens: 5, completion_tokens: 5, cost_micros: 10 },
        )])
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _tools: &[ToolSpec],
    ) -> Result<(CompletionOutput, Usage), ProviderError> {
        let mut script = self.script.lock().unwrap();
        if let Some(next) = script.pop_front() {
            Ok(next)
        } else {
            Ok(self.last.lock().unwrap().clone())
        }
    }
}

fn usage(tokens: u64) -> Usage {
    Usage { prompt_tokens: tokens, completion_tokens: tokens, cost_micros: tokens * 2 }
}

#[tokio::test]
async fn round_robin_chains_output_through_each_agent() {
    let a = Arc::new(Agent::new("a", "first", "m", "be agent a", vec![], vec![], ScriptedProvider::text("from-a")));
    let b = Arc::new(Agent::new("b", "second", "m", "be agent b", vec![], vec![], ScriptedProvider::text("from-b")));

    let team = Team::new(
        "team",
        vec![a, b],
        None,
        StrategyKind::RoundRobin,
        Some(1),
        Arc::new(()),
        false,
        1,
    );

    let result = team.run("start").await.unwrap();
    assert_eq!(result.output, "from-b");
    assert_eq!(result.agent_outputs.len(), 2);
    assert_eq!(result.rounds, 1);
    assert!(result.total_tokens > 0);
}

#[tokio::test]
async fn round_robin_runs_multiple_rounds() {
    let a = Arc::new(Agent::new("a", "r", "m", "p", vec![], vec![], ScriptedProvider::text("x")));
    let team = Team::new("team", vec![a], None, StrategyKind::RoundRobin, Some(3), Arc::new(()), false, 1);

    let result = team.run("start").await.unwrap();
    assert_eq!(result.rounds, 3);
    assert_eq!(result.agent_outputs.len(), 3);
}

#[tokio::test]
async fn debate_converges_and_breaks_early() {
    let a = Arc::new(Agent::new("a", "r", "m", "p", vec![], vec![], ScriptedProvider::text("stable position")));
    let b = Arc::new(Agent::new("b", "r", "m", "p", vec![], vec![], ScriptedProvider::text("stable position")));

    let team = Team::new("team", vec![a, b], None, StrategyKind::Debate, Some(5), Arc::new(()), false, 1);

    let result = team.run("topic").await.unwrap();
    // Converges after round 2 (round 1 has no previous position to compare).
    assert_eq!(result.rounds, 2);
    assert!(team.shared_context().has("converged"));
}

#[tokio::test]
async fn debate_convergence_on_the_final_round_does_not_count_as_converged() {
    // `§8` invariant 5: converged ⇒ fewer than max_rounds rounds. Unchanged
    // positions detected only on the last allowed round must not be
    // reported as convergence.
    let a = Arc::new(Agent::new("a", "r", "m", "p", vec![], vec![], ScriptedProvider::text("stable position")));
    let b = Arc::new(Agent::new("b", "r", "m", "p", vec![], vec![], ScriptedProvider::text("stable position")));

    let team = Team::new("team", vec![a, b], None, StrategyKind::Debate, Some(2), Arc::new(()), false, 1);

    let result = team.run("topic").await.unwrap();
    assert_eq!(result.rounds, 2);
    assert!(!team.shared_context().has("converged"));
}

#[tokio::test]
async fn map_reduce_runs_exactly_two_rounds() {
    let a = Arc::new(Agent::new("a", "r", "m", "p", vec![], vec![], ScriptedProvider::text("result-a")));
    let b = Arc::new(Agent::new("b", "r", "m", "p", vec![], vec![], ScriptedProvider::text("result-b")));

    let team = Team::new("team", vec![a, b], None, StrategyKind::MapReduce, None, Arc::new(()), false, 1);

    let result = team.run("topic").await.unwrap();
    assert_eq!(result.rounds, 2);
    assert_eq!(result.agent_outputs.len(), 3); // 2 map + 1 reduce
}

#[tokio::test]
async fn coordinator_delegates_then_synthesizes() {
    let delegate_call = (
        CompletionOutput::ToolCall {
            name: "delegate_to_worker".to_string(),
            arguments: json!({ "task": "research this" }),
        },
        usage(3),
    );
    let final_call = (CompletionOutput::Text("synthesized answer".to_string()), usage(4));
    let coordinator_provider = ScriptedProvider::new(vec![delegate_call, final_call]);

    let coordinator = Arc::new(Agent::new(
        "boss",
        "coordinator",
        "m",
        "lead the team",
        vec![],
        vec![],
        coordinator_provider,
    ));
    let worker = Arc::new(Agent::new(
        "worker",
        "worker",
        "m",
        "do the work",
        vec!["research".to_string()],
        vec![],
        ScriptedProvider::text("worker output"),
    ));

    let team = Team::new(
        "team",
        vec![coordinator, worker],
        Some("boss".to_string()),
        StrategyKind::Coordinator,
        Some(5),
        Arc::new(()),
        false,
        1,
    );

    let result = team.run("do a project").await.unwrap();
    assert_eq!(result.output, "synthesized answer");
    assert!(result.agent_outputs.contains_key("worker"));
    assert!(result.agent_outputs.contains_key("boss"));
}

#[tokio::test]
async fn coordinator_with_single_agent_runs_directly() {
    let solo = Arc::new(Agent::new("solo", "r", "m", "p", vec![], vec![], ScriptedProvider::text("solo output")));
    let team = Team::new("team", vec![solo], None, StrategyKind::Coordinator, None, Arc::new(()), false, 1);

    let result = team.run("task").await.unwrap();
    assert_eq!(result.output, "solo output");
    assert_eq!(result.rounds, 1);
}

#[tokio::test]
async fn shared_context_and_message_bus_are_populated_after_run() {
    let a = Arc::new(Agent::new("a", "r", "m", "p", vec![], vec![], ScriptedProvider::text("out")));
    let team = Team::new("team", vec![a], None, StrategyKind::RoundRobin, Some(1), Arc::new(()), false, 1);

    team.run("task").await.unwrap();
    assert!(team.shared_context().has("final_output"));
    assert!(!team.message_bus().get_history().is_empty());
}

#[tokio::test]
async fn closed_team_rejects_further_runs() {
    let a = Arc::new(Agent::new("a", "r", "m", "p", vec![], vec![], ScriptedProvider::text("out")));
    let team = Team::new("team", vec![a], None, StrategyKind::RoundRobin, Some(1), Arc::new(()), false, 1);

    team.close();
    team.close(); // idempotent
    let result = team.run("task").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn empty_team_run_fails_with_empty_team_error() {
    let team: Team = Team::new("team", vec![], None, StrategyKind::RoundRobin, None, Arc::new(()), false, 1);
    let result = team.run("task").await;
    assert!(result.is_err());
}
