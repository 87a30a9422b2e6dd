//! Mutex-guarded key-value store shared by every agent in a team (`§4.6`).
//!
//! Grounded on `agentchord.orchestration.shared_context.SharedContext`:
//! every read and write deep-copies its `serde_json::Value` to prevent
//! aliasing between agents, and every mutation is appended to a bounded
//! history log.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of mutation recorded against a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextOperation {
    /// The key was set (inserted or overwritten).
    Set,
    /// The key was removed.
    Delete,
}

/// One entry in a [`SharedContext`]'s update log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextUpdate {
    /// Key affected.
    pub key: String,
    /// New value (`Value::Null` for deletes).
    pub value: Value,
    /// Name of the agent that made the change (empty if unattributed).
    pub agent: String,
    /// When the update happened.
    pub timestamp: DateTime<Utc>,
    /// What kind of update this was.
    pub operation: ContextOperation,
}

struct Inner {
    data: HashMap<String, Value>,
    history: VecDeque<ContextUpdate>,
}

/// Thread-safe shared state for one team's collaborating agents.
///
/// `Value`s are cloned in and out on every access (`serde_json::Value`
/// clones are deep by construction) so no agent can observe another's
/// in-flight mutation through a shared reference.
pub struct SharedContext {
    inner: Mutex<Inner>,
    max_history: usize,
}

impl SharedContext {
    /// Construct a context seeded with `initial` values.
    #[must_use]
    pub fn new(initial: HashMap<String, Value>, max_history: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                data: initial,
                history: VecDeque::new(),
            }),
            max_history,
        }
    }

    /// Look up `key`, returning `default` if absent.
    #[must_use]
    pub fn get(&self, key: &str, default: Value) -> Value {
        self.inner.lock().data.get(key).cloned().unwrap_or(default)
    }

    /// Set `key` to `value`, attributed to `agent`.
    pub fn set(&self, key: impl Into<String>, value: Value, agent: &str) {
        let key = key.into();
        let mut inner = self.inner.lock();
        inner.data.insert(key.clone(), value.clone());
        Self::push(&mut inner.history, self.max_history, ContextUpdate {
            key,
            value,
            agent: agent.to_string(),
            timestamp: Utc::now(),
            operation: ContextOperation::Set,
        });
    }

    /// Set multiple keys at once, attributed to `agent`.
    pub fn update(&self, entries: HashMap<String, Value>, agent: &str) {
        let mut inner = self.inner.lock();
        for (key, value) in entries {
            inner.data.insert(key.clone(), value.clone());
            Self::push(&mut inner.history, self.max_history, ContextUpdate {
                key,
                value,
                agent: agent.to_string(),
                timestamp: Utc::now(),
                operation: ContextOperation::Set,
            });
        }
    }

    /// Delete `key`, returning whether it existed.
    pub fn delete(&self, key: &str, agent: &str) -> bool {
        let mut inner = self.inner.lock();
        let existed = inner.data.remove(key).is_some();
        if existed {
            Self::push(&mut inner.history, self.max_history, ContextUpdate {
                key: key.to_string(),
                value: Value::Null,
                agent: agent.to_string(),
                timestamp: Utc::now(),
                operation: ContextOperation::Delete,
            });
        }
        existed
    }

    /// Whether `key` is currently set.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.inner.lock().data.contains_key(key)
    }

    /// All currently-set keys.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.inner.lock().data.keys().cloned().collect()
    }

    /// A deep copy of the full current state.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.inner.lock().data.clone()
    }

    /// Every update in chronological order.
    #[must_use]
    pub fn get_history(&self) -> Vec<ContextUpdate> {
        self.inner.lock().history.iter().cloned().collect()
    }

    /// Updates made by `agent`.
    #[must_use]
    pub fn get_agent_updates(&self, agent: &str) -> Vec<ContextUpdate> {
        self.inner
            .lock()
            .history
            .iter()
            .filter(|u| u.agent == agent)
            .cloned()
            .collect()
    }

    /// Number of keys currently set.
    #[must_use]
    pub fn size(&self) -> usize {
        self.inner.lock().data.len()
    }

    /// Total updates recorded so far.
    #[must_use]
    pub fn update_count(&self) -> usize {
        self.inner.lock().history.len()
    }

    /// Clear all data and history.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.data.clear();
        inner.history.clear();
    }

    fn push(history: &mut VecDeque<ContextUpdate>, max_history: usize, update: ContextUpdate) {
        history.push_back(update);
        if max_history > 0 {
            while history.len() > max_history {
                history.pop_front();
            }
        }
    }
}

impl Default for SharedContext {
    fn default() -> Self {
        Self::new(HashMap::new(), 10_000)
    }
}
