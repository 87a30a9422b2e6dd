//! `agent` node executor (`§4.4`): call an LLM provider keyed by `model`,
//! optionally binding `mcpTools`, and return free text or — when
//! `outputFields` is declared — a parsed structured object.

use nebula_core::provider::{ChatMessage, CompletionOutput, ToolSpec};
use nebula_execution::{ExecutionContext, NodeUsage};
use nebula_workflow::Node;
use serde_json::Value;

use super::{ExecutorOutput, RuntimeServices};
use crate::error::EngineError;

/// Default system prompt for an `agent` node that declares none of its own.
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Call the provider bound to `node.data["model"]` with a system/user
/// message pair built from `node.data["systemPrompt"]` and `input`, binding
/// any `mcpTools` the node declares.
pub async fn execute(
    node: &Node,
    input: &Value,
    context: &ExecutionContext,
    services: &RuntimeServices,
) -> Result<ExecutorOutput, EngineError> {
    let model = node
        .data
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or("gpt-4o");
    let provider = services.provider_for(model, context.user_id()).await?;

    let system_prompt = node
        .data
        .get("systemPrompt")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);
    let user_message = stringify(input);
    let messages = [ChatMessage::system(system_prompt), ChatMessage::user(user_message)];

    let tools = bind_mcp_tools(node, services).await?;
    let (output, usage) = provider.complete(&messages, &tools).await?;

    let value = render_output(node, output);
    let node_usage = NodeUsage {
        prompt_tokens: usage.prompt_tokens,
        completion_tokens: usage.completion_tokens,
        cost_micros: usage.cost_micros,
    };
    Ok(ExecutorOutput::with_usage(value, node_usage, model))
}

/// Bind `node.data["mcpTools"]` entries, each either `"server"` (every tool
/// on that server) or `"server:tool"` (one named tool).
async fn bind_mcp_tools(node: &Node, services: &RuntimeServices) -> Result<Vec<ToolSpec>, EngineError> {
    let Some(Value::Array(entries)) = node.data.get("mcpTools") else {
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

/// Render a completion as the node's output: a parsed JSON object when
/// `outputFields` is declared (`§4.4`: "the model's reply is parsed as the
/// declared structured shape"), otherwise plain text.
fn render_output(node: &Node, output: CompletionOutput) -> Value {
    match output {
        CompletionOutput::Text(text) => {
            if node.data.contains_key("outputFields") {
                serde_json::from_str(&text).unwrap_or(Value::String(text))
            } else {
                Value::String(text)
            }
        }
        CompletionOutput::Structured(value) => value,
        CompletionOutput::ToolCall { name, arguments } => {
            serde_json::json!({ "tool_call": name, "arguments": arguments })
        }
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
