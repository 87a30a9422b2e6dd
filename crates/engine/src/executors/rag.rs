//! `rag` node executor (`§4.4`): chunk `documents`, embed and rank them
//! against `input`'s query, then ask a provider to answer from the
//! top-ranked chunks.

use nebula_execution::{ExecutionContext, NodeUsage};
use nebula_workflow::Node;
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::{ExecutorOutput, RuntimeServices};
use crate::error::EngineError;
use nebula_core::provider::ChatMessage;

/// Byte width of each fixed-size document chunk.
const CHUNK_SIZE: usize = 800;
/// Default number of chunks retrieved when `topK` is absent.
const DEFAULT_TOP_K: usize = 3;

/// Chunk `node.data["documents"]`, embed the query and every chunk, rank by
/// cosine similarity, and ask the bound provider to answer from the top
/// `topK` chunks.
pub async fn execute(
    node: &Node,
    input: &Value,
    context: &ExecutionContext,
    services: &RuntimeServices,
) -> Result<ExecutorOutput, EngineError> {
    let started = std::time::Instant::now();

    let query = node
        .data
        .get("query")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| stringify(input));

    let documents = node
        .data
        .get("documents")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let chunks: Vec<String> = documents
        .iter()
        .filter_map(Value::as_str)
        .flat_map(chunk_text)
        .collect();

    let top_k = node
        .data
        .get("topK")
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .unwrap_or(DEFAULT_TOP_K)
        .max(1);

    let query_vector = embed(&query, services).await?;
    let mut ranked = Vec::with_capacity(chunks.len());
    for chunk in &chunks {
        let vector = embed(chunk, services).await?;
        ranked.push((cosine_similarity(&query_vector, &vector), chunk.clone()));
    }
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
    ranked.truncate(top_k);

    let retrieved: Vec<Value> = ranked
        .iter()
        .map(|(score, chunk)| serde_json::json!({ "text": chunk, "score": score }))
        .collect();

    let model = node
        .data
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or("gpt-4o");
    let provider = services.provider_for(model, context.user_id()).await?;
    let prompt = build_prompt(&query, &ranked);
    let messages = [
        ChatMessage::system("Answer the question using only the provided context."),
        ChatMessage::user(prompt),
    ];
    let (output, usage) = provider.complete(&messages, &[]).await?;
    let answer = match output {
        nebula_core::provider::CompletionOutput::Text(text) => text,
        nebula_core::provider::CompletionOutput::Structured(value) => value.to_string(),
        nebula_core::provider::CompletionOutput::ToolCall { name, .. } => name,
    };

    let value = serde_json::json!({
        "answer": answer,
        "retrieved_chunks": retrieved,
        "duration_ms": started.elapsed().as_millis() as u64,
    });
    let node_usage = NodeUsage {
        prompt_tokens: usage.prompt_tokens,
        completion_tokens: usage.completion_tokens,
        cost_micros: usage.cost_micros,
    };
    Ok(ExecutorOutput::with_usage(value, node_usage, model))
}

fn build_prompt(query: &str, ranked: &[(f32, String)]) -> String {
    let mut prompt = String::from("Context:\n");
    for (_, chunk) in ranked {
        prompt.push_str("- ");
        prompt.push_str(chunk);
        prompt.push('\n');
    }
    prompt.push_str("\nQuestion: ");
    prompt.push_str(query);
    prompt
}

fn chunk_text(text: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    if bytes.is_empty() {
        return Vec::new();
    }
    bytes
        .chunks(CHUNK_SIZE)
        .map(|b| String::from_utf8_lossy(b).into_owned())
        .collect()
}

async fn embed(text: &str, services: &RuntimeServices) -> Result<Vec<f32>, EngineError> {
    match &services.embedding {
        Some(provider) => Ok(provider.embed(text).await?),
        None => Ok(hash_embedding(text)),
    }
}

/// Deterministic fallback embedding used when no embedding provider is
/// configured: each of 32 dimensions is one byte of `sha256(text)`.
fn hash_embedding(text: &str) -> Vec<f32> {
    let digest = Sha256::digest(text.as_bytes());
    digest.iter().map(|b| f32::from(*b) / 255.0).collect()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().min(b.len());
    if len == 0 {
        return 0.0;
    }
    let dot: f32 = a[..len].iter().zip(&b[..len]).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a[..len].iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b[..len].iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
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
    use nebula_core::provider::{
        CompletionOutput, LlmProvider, ProviderError, SecretsStore, ToolSpec, Usage,
    };
    use nebula_workflow::NodeKind;
    use std::collections::HashMap;
    use std::sync::Arc;

    use crate::credential::ModelFamily;

    struct EchoProvider;
    #[async_trait]
    impl LlmProvider for EchoProvider {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _tools: &[ToolSpec],
        ) -> Result<(CompletionOutput, Usage), ProviderError> {
            let prompt = messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok((
                CompletionOutput::Text(format!("answer based on: {prompt}")),
                Usage {
                    prompt_tokens: 20,
                    completion_tokens: 8,
                    cost_micros: 99,
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
            mcp: Arc::new(super::tests_support::NoopMcp),
            settings: crate::credential::Settings::default(),
            expression: nebula_expression::ExpressionEngine::new(),
            mock: false,
        }
    }

    #[tokio::test]
    async fn ranks_chunks_and_answers_from_top_k() {
        let node = Node::new(NodeId::v4(), NodeKind::Rag)
            .with_data("query", serde_json::json!("rust ownership"))
            .with_data(
                "documents",
                serde_json::json!(["rust has ownership and borrowing", "python uses reference counting"]),
            )
            .with_data("topK", serde_json::json!(1));
        let context = ExecutionContext::new(Value::Null, UserId::v4());
        let out = execute(&node, &Value::Null, &context, &services()).await.unwrap();
        assert_eq!(out.value["retrieved_chunks"].as_array().unwrap().len(), 1);
        assert!(out.usage.is_some());
    }

    #[test]
    fn cosine_similarity_of_identical_vectors_is_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }
}
