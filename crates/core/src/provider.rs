//! External collaborator contracts (`§6`): this crate and its dependents
//! implement the execution subsystem only. LLM/embedding providers, the
//! secrets store, and the MCP client are other teams' services; only their
//! trait shape is specified here, never an implementation.
//!
//! The `agent`, `rag`, and `mcp_tool` node executors (C4) and the
//! multi-agent strategies (C6) depend on these traits, not on any concrete
//! provider, so the graph runtime can be exercised against a test double or
//! a real adapter interchangeably.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::UserId;

/// One message in a chat-style completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `system`, `user`, `assistant`, or `tool`.
    pub role: String,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Construct a `system` message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Construct a `user` message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Construct an `assistant` message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// A tool an LLM may call mid-completion — either one bound from an MCP
/// server (`agent` node's `mcpTools`) or one synthesized by a multi-agent
/// strategy (e.g. `delegate_to_<name>`, `consult_<peer>`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Tool name, as the model will reference it in a tool call.
    pub name: String,
    /// Human-readable description shown to the model.
    pub description: String,
    /// JSON Schema for the tool's arguments.
    pub parameters: Value,
}

/// Token/cost accounting returned alongside a completion.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the prompt.
    pub prompt_tokens: u64,
    /// Tokens consumed by the completion.
    pub completion_tokens: u64,
    /// Cost in micro-units (10^-6) of the provider's billing currency.
    pub cost_micros: u64,
}

/// The result of an LLM completion: either free text, or — when the caller
/// declared `outputFields` — a structured object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CompletionOutput {
    /// Plain text response.
    Text(String),
    /// A structured object matching the caller's requested field shape.
    Structured(Value),
    /// The model invoked a tool instead of responding directly; `name` and
    /// `arguments` are as the model supplied them.
    ToolCall {
        /// The tool the model chose to call.
        name: String,
        /// The arguments the model supplied.
        arguments: Value,
    },
}

/// An error from an external provider call — distinct from the runtime's
/// own error types since this crosses a collaborator boundary (`§7`
/// "Provider" error class).
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// No API key could be resolved for the requested model family.
    #[error("no api key available for model family {0}")]
    MissingCredential(String),
    /// The provider call itself failed (network, 4xx/5xx, malformed
    /// response, ...).
    #[error("provider call failed: {0}")]
    CallFailed(String),
}

/// `complete(messages, tools) -> (output, usage)` (`§1`, `§6`). Implemented
/// once per model family (OpenAI, Anthropic, Gemini, Ollama, ...) outside
/// this workspace; the `agent` and `rag` executors depend only on this
/// trait.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run one completion request.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<(CompletionOutput, Usage), ProviderError>;
}

/// `embed(text) -> vector` (`§1`, `§6`), used by the `rag` executor's
/// chunk-and-retrieve step.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one piece of text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;
}

/// `get(name, owner) -> string?` (`§1`, `§6`). Provider-key resolution
/// (`§6`) checks runtime Settings first; this trait is consulted second,
/// scoped to the execution's `_user_id`.
#[async_trait]
pub trait SecretsStore: Send + Sync {
    /// Look up a named secret scoped to `owner`, if any.
    async fn get(&self, name: &str, owner: Option<UserId>) -> Option<String>;
}

/// `list_tools(server)` / `execute_tool(server, tool, args) -> value`
/// (`§1`, `§6`), consumed by the `mcp_tool` executor and by `agent` nodes
/// that bind `mcpTools`.
#[async_trait]
pub trait McpClient: Send + Sync {
    /// List the tools a given MCP server exposes.
    async fn list_tools(&self, server: &str) -> Result<Vec<ToolSpec>, ProviderError>;

    /// Invoke one tool on `server` with `args`, returning its raw result.
    async fn execute_tool(
        &self,
        server: &str,
        tool: &str,
        args: Value,
    ) -> Result<Value, ProviderError>;
}
