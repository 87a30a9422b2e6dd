//! `mcp_tool` node executor (`§4.4`): resolve templated parameters and
//! invoke one tool on one MCP server.

use nebula_execution::ExecutionContext;
use nebula_workflow::Node;
use serde_json::{Map, Value};

use super::{ExecutorOutput, RuntimeServices};
use crate::error::EngineError;
use crate::template;

/// Invoke `node.data["tool"]` on `node.data["server"]`, resolving
/// `{{...}}` templates in `node.data["parameters"]` against `context`
/// first.
pub async fn execute(
    node: &Node,
    context: &ExecutionContext,
    services: &RuntimeServices,
) -> Result<ExecutorOutput, EngineError> {
    let server = node.data.get("server").and_then(Value::as_str).unwrap_or_default();
    let tool = node.data.get("tool").and_then(Value::as_str).unwrap_or_default();
    let parameters = node
        .data
        .get("parameters")
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));

    let resolved = template::resolve_value(&parameters, context);
    let result = services.mcp.execute_tool(server, tool, resolved).await?;
    Ok(ExecutorOutput::value(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nebula_core::id::{NodeId, UserId};
    use nebula_core::provider::{McpClient, ProviderError, SecretsStore, ToolSpec};
    use nebula_workflow::NodeKind;
    use std::collections::HashMap;
    use std::sync::Arc;

    struct EchoMcp;
    #[async_trait]
    impl McpClient for EchoMcp {
        async fn list_tools(&self, _server: &str) -> Result<Vec<ToolSpec>, ProviderError> {
            Ok(Vec::new())
        }
        async fn execute_tool(
            &self,
            server: &str,
            tool: &str,
            args: Value,
        ) -> Result<Value, ProviderError> {
            Ok(serde_json::json!({ "server": server, "tool": tool, "args": args }))
        }
    }

    struct NoSecrets;
    #[async_trait]
    impl SecretsStore for NoSecrets {
        async fn get(&self, _name: &str, _owner: Option<UserId>) -> Option<String> {
            None
        }
    }

    fn services() -> RuntimeServices {
        RuntimeServices {
            providers: HashMap::new(),
            embedding: None,
            secrets: Arc::new(NoSecrets),
            mcp: Arc::new(EchoMcp),
            settings: crate::credential::Settings::default(),
            expression: nebula_expression::ExpressionEngine::new(),
            mock: false,
        }
    }

    #[tokio::test]
    async fn resolves_templated_parameters_before_calling_tool() {
        let node = Node::new(NodeId::v4(), NodeKind::McpTool)
            .with_data("server", serde_json::json!("search"))
            .with_data("tool", serde_json::json!("query"))
            .with_data(
                "parameters",
                serde_json::json!({"q": "find {{topic}}"}),
            );
        let mut context = ExecutionContext::new(Value::Null, UserId::v4());
        context.set("topic", serde_json::json!("rust"));

        let out = execute(&node, &context, &services()).await.unwrap();
        assert_eq!(out.value["server"], "search");
        assert_eq!(out.value["tool"], "query");
        assert_eq!(out.value["args"]["q"], "find rust");
    }
}
