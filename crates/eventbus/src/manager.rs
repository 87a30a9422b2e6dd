//! The background execution manager: owns each execution's in-flight task
//! handle, its event buffer, and its subscriber list.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use nebula_core::id::ExecutionId;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::event::{push_bounded, ExecutionEvent, ExecutionEventType, EVENT_TTL_SECONDS};

/// Capacity of the bounded channel handed to each subscriber.
const SUBSCRIBER_CHANNEL_CAPACITY: usize = 256;

/// A future representing one execution's run-to-completion work.
pub type RunFuture = Pin<Box<dyn Future<Output = Result<(), String>> + Send>>;

/// Opaque handle returned by [`BackgroundExecutionManager::subscribe`];
/// pass it back to [`BackgroundExecutionManager::unsubscribe`] to detach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

struct Subscriber {
    id: SubscriberId,
    sender: mpsc::Sender<ExecutionEvent>,
}

struct ExecutionSlot {
    /// Best-effort handle for `shutdown`'s abort; may be stale (`Some` after
    /// the task it names has already finished). `running` is the source of
    /// truth for `is_running`.
    task: Option<JoinHandle<()>>,
    running: bool,
    events: VecDeque<ExecutionEvent>,
    subscribers: Vec<Subscriber>,
    last_activity: chrono::DateTime<Utc>,
}

impl ExecutionSlot {
    fn new() -> Self {
        Self {
            task: None,
            running: false,
            events: VecDeque::new(),
            subscribers: Vec::new(),
            last_activity: Utc::now(),
        }
    }

    fn record(&mut self, event: ExecutionEvent) {
        self.last_activity = Utc::now();
        self.subscribers
            .retain(|sub| sub.sender.try_send(event.clone()).is_ok() || !sub.sender.is_closed());
        push_bounded(&mut self.events, event);
    }

    fn is_expired(&self, now: chrono::DateTime<Utc>) -> bool {
        !self.running && (now - self.last_activity).num_seconds() >= EVENT_TTL_SECONDS
    }
}

/// Owns per-execution lifecycle state for every in-flight or recently
/// finished execution: the task handle, the event buffer, and subscribers.
///
/// One instance is shared across the process (wrap in `Arc` at the call
/// site); all methods take `&self`.
#[derive(Default)]
pub struct BackgroundExecutionManager {
    slots: DashMap<ExecutionId, ExecutionSlot>,
    next_subscriber_id: AtomicU64,
}

impl BackgroundExecutionManager {
    /// Construct an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sweep executions whose task has finished and whose last activity is
    /// older than [`EVENT_TTL_SECONDS`], dropping their buffer and
    /// subscribers. Called at the start of every `dispatch`.
    pub fn sweep_expired(&self) {
        let now = Utc::now();
        self.slots.retain(|_, slot| !slot.is_expired(now));
    }

    /// Start `run_fn` as a background task under `execution_id`. Sweeps
    /// expired state first, emits `started` immediately, and emits
    /// `completed` or `failed` when the task finishes.
    pub fn dispatch<F>(self: &Arc<Self>, execution_id: ExecutionId, run_fn: F)
    where
        F: FnOnce() -> RunFuture + Send + 'static,
    {
        self.sweep_expired();

        self.emit(
            execution_id,
            ExecutionEventType::Started,
            serde_json::json!({}),
        );

        // Mark running before spawning: the spawned task cannot observe or
        // clear this until it is actually polled, so `is_running` can never
        // race a task that finishes before the handle is stored below.
        self.slots
            .entry(execution_id)
            .or_insert_with(ExecutionSlot::new)
            .running = true;

        let manager = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let outcome = run_fn().await;
            match outcome {
                Ok(()) => {
                    info!(%execution_id, "execution completed");
                    manager.emit(
                        execution_id,
                        ExecutionEventType::Completed,
                        serde_json::json!({}),
                    );
                }
                Err(error) => {
                    warn!(%execution_id, %error, "execution failed");
                    manager.emit(
                        execution_id,
                        ExecutionEventType::Failed,
                        serde_json::json!({ "error": error }),
                    );
                }
            }
            if let Some(mut slot) = manager.slots.get_mut(&execution_id) {
                slot.running = false;
                slot.task = None;
            }
        });

        if let Some(mut slot) = self.slots.get_mut(&execution_id) {
            slot.task = Some(handle);
        }
    }

    /// Record `event_type` for `execution_id`, mirroring it to every current
    /// subscriber and appending it to the buffer.
    pub fn emit(&self, execution_id: ExecutionId, event_type: ExecutionEventType, data: serde_json::Value) {
        let event = ExecutionEvent::new(execution_id, event_type, data);
        self.slots
            .entry(execution_id)
            .or_insert_with(ExecutionSlot::new)
            .record(event);
    }

    /// Subscribe to future events for `execution_id`. Returns the id to pass
    /// to [`Self::unsubscribe`] and a receiver mirroring every emission made
    /// after this call.
    pub fn subscribe(&self, execution_id: ExecutionId) -> (SubscriberId, mpsc::Receiver<ExecutionEvent>) {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CHANNEL_CAPACITY);
        let id = SubscriberId(self.next_subscriber_id.fetch_add(1, Ordering::Relaxed));
        self.slots
            .entry(execution_id)
            .or_insert_with(ExecutionSlot::new)
            .subscribers
            .push(Subscriber { id, sender: tx });
        (id, rx)
    }

    /// Detach subscriber `id` from `execution_id`. A no-op if either is
    /// already gone.
    pub fn unsubscribe(&self, execution_id: ExecutionId, id: SubscriberId) {
        if let Some(mut slot) = self.slots.get_mut(&execution_id) {
            slot.subscribers.retain(|sub| sub.id != id);
        }
    }

    /// True iff `execution_id` currently has a running background task.
    #[must_use]
    pub fn is_running(&self, execution_id: ExecutionId) -> bool {
        self.slots
            .get(&execution_id)
            .is_some_and(|slot| slot.running)
    }

    /// The full current event buffer for `execution_id`, oldest first.
    #[must_use]
    pub fn get_events(&self, execution_id: ExecutionId) -> Vec<ExecutionEvent> {
        self.slots
            .get(&execution_id)
            .map(|slot| slot.events.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Abort every in-flight task, emitting `failed` with a shutdown reason
    /// on each, then clear all state.
    pub async fn shutdown(&self) {
        let running: Vec<ExecutionId> = self
            .slots
            .iter()
            .filter(|entry| entry.value().running)
            .map(|entry| *entry.key())
            .collect();

        for execution_id in running {
            if let Some(mut slot) = self.slots.get_mut(&execution_id) {
                if let Some(handle) = slot.task.take() {
                    handle.abort();
                }
                slot.running = false;
            }
            self.emit(
                execution_id,
                ExecutionEventType::Failed,
                serde_json::json!({ "error": "Server shutting down" }),
            );
        }

        // Give aborted tasks a tick to settle before clearing state.
        tokio::task::yield_now().await;
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed_ok() -> RunFuture {
        Box::pin(async { Ok(()) })
    }

    fn boxed_err(message: &'static str) -> RunFuture {
        Box::pin(async move { Err(message.to_string()) })
    }

    #[tokio::test]
    async fn dispatch_emits_started_then_completed_on_success() {
        let manager = Arc::new(BackgroundExecutionManager::new());
        let execution_id = ExecutionId::v4();

        manager.dispatch(execution_id, boxed_ok);
        // Wait for the spawned task to run.
        for _ in 0..50 {
            if !manager.is_running(execution_id) {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let events = manager.get_events(execution_id);
        assert_eq!(events[0].event_type, ExecutionEventType::Started);
        assert_eq!(
            events.last().unwrap().event_type,
            ExecutionEventType::Completed
        );
        assert!(!manager.is_running(execution_id));
    }

    #[tokio::test]
    async fn dispatch_emits_failed_on_error_return() {
        let manager = Arc::new(BackgroundExecutionManager::new());
        let execution_id = ExecutionId::v4();

        manager.dispatch(execution_id, || boxed_err("boom"));
        for _ in 0..50 {
            if !manager.is_running(execution_id) {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let events = manager.get_events(execution_id);
        let failed = events
            .iter()
            .find(|e| e.event_type == ExecutionEventType::Failed)
            .unwrap();
        assert_eq!(failed.data["error"], "boom");
    }

    #[tokio::test]
    async fn subscribe_receives_emissions_after_subscription_only() {
        let manager = Arc::new(BackgroundExecutionManager::new());
        let execution_id = ExecutionId::v4();

        manager.emit(execution_id, ExecutionEventType::Started, serde_json::json!({}));
        let (_id, mut rx) = manager.subscribe(execution_id);
        manager.emit(
            execution_id,
            ExecutionEventType::NodeStarted,
            serde_json::json!({"node": "a"}),
        );

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event_type, ExecutionEventType::NodeStarted);
    }

    #[tokio::test]
    async fn unsubscribe_removes_the_subscriber() {
        let manager = Arc::new(BackgroundExecutionManager::new());
        let execution_id = ExecutionId::v4();

        let (id, mut rx) = manager.subscribe(execution_id);
        manager.unsubscribe(execution_id, id);
        manager.emit(execution_id, ExecutionEventType::Started, serde_json::json!({}));

        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn is_running_reflects_task_presence() {
        let manager = Arc::new(BackgroundExecutionManager::new());
        let execution_id = ExecutionId::v4();
        assert!(!manager.is_running(execution_id));

        manager.dispatch(execution_id, || {
            Box::pin(async {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                Ok(())
            })
        });
        assert!(manager.is_running(execution_id));
    }

    #[tokio::test]
    async fn shutdown_aborts_running_tasks_and_clears_state() {
        let manager = Arc::new(BackgroundExecutionManager::new());
        let execution_id = ExecutionId::v4();

        manager.dispatch(execution_id, || {
            Box::pin(async {
                tokio::time::sleep(std::time::Duration::from_secs(30)).await;
                Ok(())
            })
        });
        assert!(manager.is_running(execution_id));

        manager.shutdown().await;
        assert!(manager.get_events(execution_id).is_empty());
    }

    #[tokio::test]
    async fn get_events_returns_empty_for_unknown_execution() {
        let manager = BackgroundExecutionManager::new();
        assert!(manager.get_events(ExecutionId::v4()).is_empty());
    }
}
