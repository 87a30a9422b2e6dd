//! `multi_agent` node executor (`§4.6`): assemble a [`Team`] from
//! `node.data["members"]` and run it under the requested strategy.

use std::sync::Arc;

use nebula_agents::{Agent, AgentsError, OrchestrationCallbacks, StrategyKind, Team};
use nebula_core::provider::ToolSpec;
use nebula_execution::{ExecutionContext, NodeUsage};
use nebula_workflow::Node;
use serde_json::Value;

use super::{ExecutorOutput, RuntimeServices};
use crate::error::EngineError;

/// A no-op [`OrchestrationCallbacks`] for teams whose node declares no
/// event sink of its own. `nebula_agents` exposes a blanket impl for `()`,
/// but `Team::new` requires a concrete `Arc<dyn OrchestrationCallbacks>`.
struct SilentCallbacks;

#[async_trait::async_trait]
impl OrchestrationCallbacks for SilentCallbacks {
    async fn emit(&self, _event: nebula_agents::OrchestrationEvent) {}
}

/// Build a [`Team`] from `node.data` and run it on `input`'s stringified
/// task description.
pub async fn execute(
    node: &Node,
    input: &Value,
    context: &ExecutionContext,
    services: &RuntimeServices,
) -> Result<ExecutorOutput, EngineError> {
    let strategy = parse_strategy(node.data.get("strategy").and_then(Value::as_str));
    let members_spec = node
        .data
        .get("members")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut agents = Vec::with_capacity(members_spec.len());
    for member in &members_spec {
        let name = member.get("name").and_then(Value::as_str).unwrap_or("agent");
        let role_description = member
            .get("role")
            .and_then(Value::as_str)
            .unwrap_or("team member");
        let model = member.get("model").and_then(Value::as_str).unwrap_or("gpt-4o");
        let system_prompt = member
            .get("systemPrompt")
            .and_then(Value::as_str)
            .unwrap_or("You are a helpful assistant.");
        let capabilities = member
            .get("capabilities")
            .and_then(Value::as_array)
            .map(|values| values.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();

        let provider = services.provider_for(model, context.user_id()).await?;
        let bound_tools = bind_member_tools(member, services).await?;
        agents.push(Arc::new(Agent::new(
            name,
            role_description,
            model,
            system_prompt,
            capabilities,
            bound_tools,
            provider,
        )));
    }

    let coordinator = node
        .data
        .get("coordinator")
        .and_then(Value::as_str)
        .map(str::to_string);
    let max_rounds = node.data.get("maxRounds").and_then(Value::as_u64).map(|n| n as u32);
    let enable_consult = node
        .data
        .get("enableConsult")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let max_consult_depth = node
        .data
        .get("maxConsultDepth")
        .and_then(Value::as_u64)
        .map(|n| n as u32)
        .unwrap_or(1);

    let team_name = node
        .data
        .get("team")
        .and_then(Value::as_str)
        .unwrap_or("team")
        .to_string();
    let team = Team::new(
        team_name,
        agents,
        coordinator,
        strategy,
        max_rounds,
        Arc::new(SilentCallbacks) as Arc<dyn OrchestrationCallbacks>,
        enable_consult,
        max_consult_depth,
    );

    let task = stringify(input);
    let result = team.run(&task).await.map_err(|err| match err {
        AgentsError::Provider(source) => EngineError::Provider(source),
        other => EngineError::Agents(other),
    })?;

    let value = serde_json::json!({
        "output": result.output,
        "rounds": result.rounds,
        "strategy": result.strategy,
        "agent_outputs": result
            .agent_outputs
            .iter()
            .map(|(label, output)| (label.clone(), serde_json::json!({
                "agent": output.agent_name,
                "output": output.output,
                "tokens": output.tokens,
                "cost_micros": output.cost_micros,
            })))
            .collect::<serde_json::Map<_, _>>(),
    });
    let usage = NodeUsage {
        prompt_tokens: 0,
        completion_tokens: result.total_tokens,
        cost_micros: result.total_cost_micros,
    };
    let model = node.data.get("model").and_then(Value::as_str).unwrap_or("team").to_string();
    Ok(ExecutorOutput::with_usage(value, usage, model))
}

async fn bind_member_tools(member: &Value, services: &RuntimeServices) -> Result<Vec<ToolSpec>, EngineError> {
    let Some(Value::Array(entries)) = member.get("mcpTools") else {
        return Ok(Vec::new());
    };
    let mut tools = Vec::new();
    for entry in entries {
        let Some(spec) = entry.as_str() else {
            continue;
        };
        let (server, tool_name) = match spec.split_once(':') {
            Some((s, t)) => (s, Some(t)),
            None => (spec, None),
        };
        let available = services.mcp.list_tools(server).await?;
        match tool_name {
            Some(name) => tools.extend(available.into_iter().filter(|t| t.name == name)),
            None => tools.extend(available),
        }
    }
    Ok(tools)
}

fn parse_strategy(value: Option<&str>) -> StrategyKind {
    match value {
        Some("round_robin") => StrategyKind::RoundRobin,
        Some("debate") => StrategyKind::Debate,
        Some("map_reduce") => StrategyKind::MapReduce,
        _ => StrategyKind::Coordinator,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nebula_core::id::{NodeId, UserId};
    use nebula_core::provider::{ChatMessage, CompletionOutput, LlmProvider, ProviderError, SecretsStore, Usage};
    use nebula_execution::ExecutionContext;
    use nebula_workflow::NodeKind;
    use std::collections::HashMap;

    use crate::credential::ModelFamily;

    struct EchoProvider;
    #[async_trait]
    impl LlmProvider for EchoProvider {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _tools: &[ToolSpec],
        ) -> Result<(CompletionOutput, Usage), ProviderError> {
            let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok((
                CompletionOutput::Text(format!("done: {last}")),
                Usage {
                    prompt_tokens: 5,
                    completion_tokens: 5,
                    cost_micros: 10,
                },
            ))
        }
    }

    struct FixedSecrets;
    #[async_trait]
    impl SecretsStore for FixedSecrets {
        async fn get(&self, _name: &str, _owner: Option<UserId>) -> Option<String> {
            Some("secret-key".to_string())
        }
    }

    fn services() -> RuntimeServices {
        let mut providers: HashMap<ModelFamily, Arc<dyn LlmProvider>> = HashMap::new();
        providers.insert(ModelFamily::OpenAi, Arc::new(EchoProvider));
        RuntimeServices {
            providers,
            embedding: None,
            secrets: Arc::new(FixedSecrets),
            mcp: Arc::new(super::super::tests_support::NoopMcp),
            settings: crate::credential::Settings::default(),
            expression: nebula_expression::ExpressionEngine::new(),
            mock: false,
        }
    }

    #[tokio::test]
    async fn runs_round_robin_team_of_one() {
        let node = Node::new(NodeId::v4(), NodeKind::MultiAgent)
            .with_data("strategy", serde_json::json!("round_robin"))
            .with_data(
                "members",
                serde_json::json!([{"name": "writer", "model": "gpt-4o"}]),
            );
        let context = ExecutionContext::new(Value::Null, UserId::v4());
        let out = execute(&node, &serde_json::json!("draft a haiku"), &context, &services())
            .await
            .unwrap();
        assert!(out.value["output"].as_str().unwrap().contains("done"));
        assert!(out.usage.is_some());
    }

    #[test]
    fn parses_known_strategy_names() {
        assert_eq!(parse_strategy(Some("debate")), StrategyKind::Debate);
        assert_eq!(parse_strategy(Some("bogus")), StrategyKind::Coordinator);
    }
}
