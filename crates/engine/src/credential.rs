//! Provider-key resolution (`§6`): for a given model family, try runtime
//! Settings first, then the Secrets Store scoped to the execution's owner,
//! then (embedding calls only) an alternate family whose key is available,
//! and finally a deterministic hash-based stub for tests/mock mode.

use std::collections::HashMap;
use std::sync::Arc;

use nebula_core::id::UserId;
use nebula_core::provider::SecretsStore;
use sha2::{Digest, Sha256};

/// Model families the `agent`/`rag` executors dispatch to by inspecting a
/// node's `model` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFamily {
    /// `gpt-*`, `o1-*`, `o3-*`.
    OpenAi,
    /// `claude-*`.
    Anthropic,
    /// `gemini-*`.
    Gemini,
    /// Anything else — assumed to be a local Ollama-served model.
    Ollama,
}

impl ModelFamily {
    /// Classify a model identifier by its conventional naming prefix.
    #[must_use]
    pub fn from_model(model: &str) -> Self {
        let lower = model.to_ascii_lowercase();
        if lower.starts_with("gpt") || lower.starts_with("o1") || lower.starts_with("o3") {
            Self::OpenAi
        } else if lower.starts_with("claude") {
            Self::Anthropic
        } else if lower.starts_with("gemini") {
            Self::Gemini
        } else {
            Self::Ollama
        }
    }

    /// The Secrets Store key name for this family, e.g.
    /// `LLM_OPENAI_API_KEY` (`§6`).
    #[must_use]
    pub fn secret_name(self) -> &'static str {
        match self {
            Self::OpenAi => "LLM_OPENAI_API_KEY",
            Self::Anthropic => "LLM_ANTHROPIC_API_KEY",
            Self::Gemini => "LLM_GEMINI_API_KEY",
            Self::Ollama => "LLM_OLLAMA_API_KEY",
        }
    }
}

/// Runtime Settings keys, checked before the Secrets Store (`§6` resolution
/// order step 1). A thin in-memory map; the real settings surface is out
/// of scope (external collaborator).
#[derive(Debug, Clone, Default)]
pub struct Settings {
    keys: HashMap<String, String>,
}

impl Settings {
    /// Build from an explicit family-name -> key map.
    #[must_use]
    pub fn new(keys: HashMap<String, String>) -> Self {
        Self { keys }
    }

    fn get(&self, family: ModelFamily) -> Option<String> {
        self.keys.get(family.secret_name()).cloned()
    }
}

/// Resolve an API key for `family`, scoped to `owner`, following the `§6`
/// order: Settings, then Secrets Store, then (for embeddings) an alternate
/// family, finally a deterministic stub.
pub async fn resolve(
    family: ModelFamily,
    owner: Option<UserId>,
    settings: &Settings,
    secrets: &Arc<dyn SecretsStore>,
) -> Option<String> {
    if let Some(key) = settings.get(family) {
        return Some(key);
    }
    secrets.get(family.secret_name(), owner).await
}

/// Resolve an embedding credential, falling back across families (`§6`
/// step 3) before the deterministic stub.
pub async fn resolve_embedding(
    preferred: ModelFamily,
    owner: Option<UserId>,
    settings: &Settings,
    secrets: &Arc<dyn SecretsStore>,
) -> Option<String> {
    if let Some(key) = resolve(preferred, owner, settings, secrets).await {
        return Some(key);
    }
    for family in [ModelFamily::OpenAi, ModelFamily::Anthropic, ModelFamily::Gemini, ModelFamily::Ollama] {
        if family == preferred {
            continue;
        }
        if let Some(key) = resolve(family, owner, settings, secrets).await {
            return Some(key);
        }
    }
    None
}

/// Deterministic hash-based stub credential used when no real key resolves
/// in tests or mock mode (`§6` step 4) — stable across runs for the same
/// input so fixtures can assert on it.
#[must_use]
pub fn stub_credential(family: ModelFamily, seed: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(family.secret_name().as_bytes());
    hasher.update(seed.as_bytes());
    format!("stub-{:x}", hasher.finalize())[..24].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct NoSecrets;
    #[async_trait]
    impl SecretsStore for NoSecrets {
        async fn get(&self, _name: &str, _owner: Option<UserId>) -> Option<String> {
            None
        }
    }

    struct FixedSecrets(&'static str);
    #[async_trait]
    impl SecretsStore for FixedSecrets {
        async fn get(&self, _name: &str, _owner: Option<UserId>) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    #[test]
    fn classifies_known_prefixes() {
        assert_eq!(ModelFamily::from_model("gpt-4o"), ModelFamily::OpenAi);
        assert_eq!(ModelFamily::from_model("claude-3-opus"), ModelFamily::Anthropic);
        assert_eq!(ModelFamily::from_model("gemini-1.5-pro"), ModelFamily::Gemini);
        assert_eq!(ModelFamily::from_model("llama3"), ModelFamily::Ollama);
    }

    #[tokio::test]
    async fn settings_take_priority_over_secrets_store() {
        let mut keys = HashMap::new();
        keys.insert("LLM_OPENAI_API_KEY".to_string(), "from-settings".to_string());
        let settings = Settings::new(keys);
        let secrets: Arc<dyn SecretsStore> = Arc::new(FixedSecrets("from-secrets"));
        let resolved = resolve(ModelFamily::OpenAi, None, &settings, &secrets).await;
        assert_eq!(resolved.as_deref(), Some("from-settings"));
    }

    #[tokio::test]
    async fn falls_back_to_secrets_store() {
        let settings = Settings::default();
        let secrets: Arc<dyn SecretsStore> = Arc::new(FixedSecrets("from-secrets"));
        let resolved = resolve(ModelFamily::Anthropic, None, &settings, &secrets).await;
        assert_eq!(resolved.as_deref(), Some("from-secrets"));
    }

    #[tokio::test]
    async fn embedding_falls_back_across_families() {
        let settings = Settings::default();
        let secrets: Arc<dyn SecretsStore> = Arc::new(NoSecrets);
        // NoSecrets always returns None, so fallback exhausts every family.
        let resolved = resolve_embedding(ModelFamily::OpenAi, None, &settings, &secrets).await;
        assert!(resolved.is_none());
    }

    #[test]
    fn stub_credential_is_deterministic() {
        let a = stub_credential(ModelFamily::OpenAi, "seed");
        let b = stub_credential(ModelFamily::OpenAi, "seed");
        assert_eq!(a, b);
        let c = stub_credential(ModelFamily::Anthropic, "seed");
        assert_ne!(a, c);
    }
}
