//! Async message routing between the agents of one team (`§4.6`).
//!
//! Grounded on `agentchord.orchestration.message_bus.MessageBus`: each
//! registered agent gets a dedicated mailbox; messages are delivered
//! directly or broadcast, and a bounded ring buffer keeps full history for
//! observability independent of delivery.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::Duration;

/// Default timeout for [`MessageBus::receive`] when the caller does not
/// specify one (`§4.6`).
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_secs(30);

/// Capacity of each agent's mailbox channel.
const MAILBOX_CAPACITY: usize = 256;

/// How a message was addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// A task handed to an agent.
    Task,
    /// An agent's result for a task.
    Result,
    /// A direct response to another agent.
    Response,
    /// Delivered to every registered agent except the sender.
    Broadcast,
}

/// One message exchanged between team agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMessage {
    /// Agent name that sent this message (or `"system"`).
    pub sender: String,
    /// Addressed recipient, or `None` to broadcast.
    pub recipient: Option<String>,
    /// The message kind.
    pub message_type: MessageType,
    /// Message body.
    pub content: String,
    /// Free-form metadata (round number, phase, ...).
    #[serde(default)]
    pub metadata: Value,
    /// When the message was sent.
    pub timestamp: DateTime<Utc>,
}

impl AgentMessage {
    /// Construct a message, stamping it with the current time.
    #[must_use]
    pub fn new(
        sender: impl Into<String>,
        recipient: Option<String>,
        message_type: MessageType,
        content: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            recipient,
            message_type,
            content: content.into(),
            metadata: Value::Null,
            timestamp: Utc::now(),
        }
    }

    /// Attach metadata to this message.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Per-team routing of [`AgentMessage`]s between named agents.
///
/// Senders and receivers live in independent maps so that awaiting a
/// [`receive`](MessageBus::receive) on one agent's mailbox never blocks
/// `register`/`send` for the rest of the team; only that one agent's own
/// mailbox lock is held across the await.
pub struct MessageBus {
    senders: DashMap<String, mpsc::Sender<AgentMessage>>,
    receivers: DashMap<String, Mutex<mpsc::Receiver<AgentMessage>>>,
    history: Mutex<VecDeque<AgentMessage>>,
    max_history: usize,
}

impl MessageBus {
    /// Create a bus retaining up to `max_history` messages (`0` = unbounded).
    #[must_use]
    pub fn new(max_history: usize) -> Self {
        Self {
            senders: DashMap::new(),
            receivers: DashMap::new(),
            history: Mutex::new(VecDeque::new()),
            max_history,
        }
    }

    /// Register an agent, giving it a mailbox. Idempotent.
    pub fn register(&self, agent_name: &str) {
        if self.senders.contains_key(agent_name) {
            return;
        }
        let (sender, receiver) = mpsc::channel(MAILBOX_CAPACITY);
        self.senders.insert(agent_name.to_string(), sender);
        self.receivers.insert(agent_name.to_string(), Mutex::new(receiver));
    }

    /// Remove an agent's mailbox.
    pub fn unregister(&self, agent_name: &str) {
        self.senders.remove(agent_name);
        self.receivers.remove(agent_name);
    }

    /// Names of every currently registered agent.
    #[must_use]
    pub fn registered_agents(&self) -> Vec<String> {
        self.senders.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Deliver `message`: to its `recipient`'s mailbox, or to every
    /// registered agent except the sender when unaddressed or a broadcast.
    /// Always appended to `history` regardless of delivery outcome.
    pub async fn send(&self, message: AgentMessage) {
        self.record(message.clone());

        let targets: Vec<mpsc::Sender<AgentMessage>> =
            if message.recipient.is_none() || message.message_type == MessageType::Broadcast {
                self.senders
                    .iter()
                    .filter(|entry| *entry.key() != message.sender)
                    .map(|entry| entry.value().clone())
                    .collect()
            } else {
                let recipient = message.recipient.as_deref().unwrap_or_default();
                self.senders.get(recipient).map(|s| vec![s.clone()]).unwrap_or_default()
            };

        for target in targets {
            let _ = target.send(message.clone()).await;
        }
    }

    /// Convenience wrapper for broadcasting a message from `sender`.
    pub async fn broadcast(&self, sender: &str, content: impl Into<String>, metadata: Value) -> AgentMessage {
        let message = AgentMessage::new(sender, None, MessageType::Broadcast, content).with_metadata(metadata);
        self.send(message.clone()).await;
        message
    }

    /// Pop the next message addressed to `agent_name`, waiting up to
    /// `timeout` (default [`DEFAULT_RECEIVE_TIMEOUT`]). Returns `None` on
    /// timeout or if the agent is not registered.
    pub async fn receive(&self, agent_name: &str, timeout: Option<Duration>) -> Option<AgentMessage> {
        let wait = timeout.unwrap_or(DEFAULT_RECEIVE_TIMEOUT);
        let mailbox = self.receivers.get(agent_name)?;
        let mut receiver = mailbox.lock();
        tokio::time::timeout(wait, receiver.recv()).await.ok().flatten()
    }

    fn record(&self, message: AgentMessage) {
        let mut history = self.history.lock();
        history.push_back(message);
        if self.max_history > 0 {
            while history.len() > self.max_history {
                history.pop_front();
            }
        }
    }

    /// All messages ever sent, in chronological order.
    #[must_use]
    pub fn get_history(&self) -> Vec<AgentMessage> {
        self.history.lock().iter().cloned().collect()
    }

    /// Messages where `agent_name` is sender or recipient.
    #[must_use]
    pub fn get_agent_messages(&self, agent_name: &str) -> Vec<AgentMessage> {
        self.history
            .lock()
            .iter()
            .filter(|m| m.sender == agent_name || m.recipient.as_deref() == Some(agent_name))
            .cloned()
            .collect()
    }

    /// Total messages sent so far.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.history.lock().len()
    }

    /// Clear history and drain every mailbox.
    pub fn clear(&self) {
        self.history.lock().clear();
        for entry in &self.receivers {
            let mut receiver = entry.value().lock();
            while receiver.try_recv().is_ok() {}
        }
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn direct_message_delivers_to_recipient_only() {
        let bus = MessageBus::default();
        bus.register("researcher");
        bus.register("writer");

        bus.send(AgentMessage::new(
            "researcher",
            Some("writer".to_string()),
            MessageType::Task,
            "draft this",
        ))
        .await;

        let received = bus.receive("writer", None).await;
        assert_eq!(received.unwrap().content, "draft this");
        assert!(bus.receive("researcher", Some(Duration::from_millis(10))).await.is_none());
    }

    #[tokio::test]
    async fn broadcast_skips_sender() {
        let bus = MessageBus::default();
        bus.register("a");
        bus.register("b");
        bus.register("c");

        bus.broadcast("a", "hello team", Value::Null).await;

        assert!(bus.receive("b", Some(Duration::from_millis(10))).await.is_some());
        assert!(bus.receive("c", Some(Duration::from_millis(10))).await.is_some());
        assert!(bus.receive("a", Some(Duration::from_millis(10))).await.is_none());
    }

    #[tokio::test]
    async fn receive_times_out_without_panicking() {
        let bus = MessageBus::default();
        bus.register("lonely");
        let received = bus.receive("lonely", Some(Duration::from_millis(10))).await;
        assert!(received.is_none());
    }

    #[tokio::test]
    async fn unregistered_agent_receive_returns_none() {
        let bus = MessageBus::default();
        assert!(bus.receive("ghost", Some(Duration::from_millis(1))).await.is_none());
    }

    #[tokio::test]
    async fn history_retains_messages_regardless_of_delivery() {
        let bus = MessageBus::default();
        bus.register("a");
        bus.register("b");
        bus.send(AgentMessage::new("a", Some("b".to_string()), MessageType::Task, "x")).await;
        bus.receive("b", None).await;
        assert_eq!(bus.message_count(), 1);
        assert_eq!(bus.get_history().len(), 1);
        assert_eq!(bus.get_agent_messages("a").len(), 1);
    }

    #[tokio::test]
    async fn zero_max_history_is_unbounded() {
        let bus = MessageBus::new(0);
        bus.register("a");
        for i in 0..50 {
            bus.send(AgentMessage::new("a", None, MessageType::Broadcast, i.to_string())).await;
        }
        assert_eq!(bus.message_count(), 50);
    }

    #[tokio::test]
    async fn history_caps_at_max_and_drops_oldest() {
        let bus = MessageBus::new(3);
        bus.register("a");
        for i in 0..5 {
            bus.send(AgentMessage::new("a", None, MessageType::Broadcast, i.to_string())).await;
        }
        let history = bus.get_history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].content, "2");
    }

    #[tokio::test]
    async fn clear_drains_history_and_mailboxes() {
        let bus = MessageBus::default();
        bus.register("a");
        bus.register("b");
        bus.send(AgentMessage::new("a", Some("b".to_string()), MessageType::Task, "x")).await;
        bus.clear();
        assert_eq!(bus.message_count(), 0);
        assert!(bus.receive("b", Some(Duration::from_millis(10))).await.is_none());
    }
}
