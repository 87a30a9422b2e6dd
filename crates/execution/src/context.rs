//! The execution context: a string-keyed map threaded through every node.

use chrono::Utc;
use nebula_core::id::{NodeId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key holding the original workflow input.
pub const KEY_INPUT: &str = "input";
/// Key holding the owning user id, propagated to provider-key lookups.
pub const KEY_USER_ID: &str = "_user_id";
/// Key holding the ISO date the execution started.
pub const KEY_TODAY: &str = "today";
/// Prefix for per-node usage accounting keys (`_usage_<node_id>`).
pub const USAGE_KEY_PREFIX: &str = "_usage_";

/// An error envelope written under a failed node's id when its failure is
/// routed to a successor via an error edge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorEnvelope {
    /// Human-readable failure message.
    pub error: String,
    /// The node's terminal status token (`failed` or `timed_out`).
    pub status: String,
    /// The node that failed.
    pub node_id: NodeId,
}

/// Per-node usage recorded by the `agent` and `rag` executors.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeUsage {
    /// Tokens consumed by the prompt.
    pub prompt_tokens: u64,
    /// Tokens consumed by the completion.
    pub completion_tokens: u64,
    /// Cost in the provider's billing currency, in micro-units (10^-6).
    pub cost_micros: u64,
}

/// The mutable, string-keyed context threaded through a single execution.
///
/// Round-trips through JSON in full: every value stored here must already be
/// JSON-compatible, which the checkpoint store relies on for persistence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionContext(Map<String, Value>);

impl ExecutionContext {
    /// Build a fresh context for a new execution: sets `input`, `_user_id`,
    /// and `today`.
    #[must_use]
    pub fn new(input: Value, user_id: UserId) -> Self {
        let mut map = Map::new();
        map.insert(KEY_INPUT.to_string(), input);
        map.insert(KEY_USER_ID.to_string(), Value::String(user_id.to_string()));
        map.insert(
            KEY_TODAY.to_string(),
            Value::String(Utc::now().date_naive().to_string()),
        );
        Self(map)
    }

    /// Wrap an already-populated map, e.g. one reconstructed from a
    /// checkpoint.
    #[must_use]
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Borrow the underlying JSON map.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume self, returning the underlying JSON map.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Look up an arbitrary key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set an arbitrary key.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// The original workflow input.
    #[must_use]
    pub fn input(&self) -> Option<&Value> {
        self.get(KEY_INPUT)
    }

    /// The owner on whose behalf this execution runs, if set.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.get(KEY_USER_ID)
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    /// A completed node's output, or the error envelope if it failed and was
    /// routed via an error edge.
    #[must_use]
    pub fn node_output(&self, node_id: NodeId) -> Option<&Value> {
        self.get(&node_id.to_string())
    }

    /// Record a completed node's output under its own id.
    pub fn set_node_output(&mut self, node_id: NodeId, output: Value) {
        self.set(node_id.to_string(), output);
    }

    /// Record a failed node's error envelope under its own id, the shape a
    /// downstream error-edge target observes.
    pub fn set_error_envelope(&mut self, node_id: NodeId, error: impl Into<String>, status: &str) {
        let envelope = ErrorEnvelope {
            error: error.into(),
            status: status.to_string(),
            node_id,
        };
        self.set(
            node_id.to_string(),
            serde_json::to_value(envelope).expect("ErrorEnvelope always serializes"),
        );
    }

    /// Record a node's usage under `_usage_<node_id>`.
    pub fn set_usage(&mut self, node_id: NodeId, usage: NodeUsage, model: impl Into<String>) {
        let mut value = serde_json::to_value(usage).expect("NodeUsage always serializes");
        if let Value::Object(map) = &mut value {
            map.insert("model".to_string(), Value::String(model.into()));
        }
        self.set(format!("{USAGE_KEY_PREFIX}{node_id}"), value);
    }

    /// Iterate `_usage_*` entries as `(node_id_string, value)` pairs, in map
    /// order.
    pub fn usage_entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0
            .iter()
            .filter(|(k, _)| k.starts_with(USAGE_KEY_PREFIX))
            .map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_context_sets_reserved_keys() {
        let user = UserId::v4();
        let ctx = ExecutionContext::new(serde_json::json!({"a": 1}), user);
        assert_eq!(ctx.input(), Some(&serde_json::json!({"a": 1})));
        assert_eq!(ctx.user_id(), Some(user));
        assert!(ctx.get(KEY_TODAY).is_some());
    }

    #[test]
    fn node_output_roundtrip() {
        let mut ctx = ExecutionContext::new(Value::Null, UserId::v4());
        let node = NodeId::v4();
        ctx.set_node_output(node, serde_json::json!("hello"));
        assert_eq!(ctx.node_output(node), Some(&serde_json::json!("hello")));
    }

    #[test]
    fn error_envelope_written_under_failed_node_id() {
        let mut ctx = ExecutionContext::new(Value::Null, UserId::v4());
        let node = NodeId::v4();
        ctx.set_error_envelope(node, "boom", "failed");
        let value = ctx.node_output(node).unwrap();
        assert_eq!(value["error"], "boom");
        assert_eq!(value["status"], "failed");
        assert_eq!(value["node_id"], node.to_string());
    }

    #[test]
    fn usage_entries_are_prefixed_and_iterable() {
        let mut ctx = ExecutionContext::new(Value::Null, UserId::v4());
        let node = NodeId::v4();
        ctx.set_usage(
            node,
            NodeUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
                cost_micros: 42,
            },
            "gpt-4",
        );
        let entries: Vec<_> = ctx.usage_entries().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].1["model"], "gpt-4");
    }

    #[test]
    fn roundtrips_through_json() {
        let ctx = ExecutionContext::new(serde_json::json!("in"), UserId::v4());
        let json = serde_json::to_string(&ctx).unwrap();
        let back: ExecutionContext = serde_json::from_str(&json).unwrap();
        assert_eq!(ctx.input(), back.input());
    }

    #[test]
    fn from_map_wraps_existing_context() {
        let mut map = Map::new();
        map.insert(KEY_INPUT.to_string(), serde_json::json!(1));
        let ctx = ExecutionContext::from_map(map);
        assert_eq!(ctx.input(), Some(&serde_json::json!(1)));
    }
}
