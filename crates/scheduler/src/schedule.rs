//! The `Schedule` entity and its repository contract (`§6`, ported
//! shape-for-shape from `repositories/interfaces.py`'s
//! `IScheduleRepository`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nebula_core::id::{ScheduleId, UserId, WorkflowId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchedulerError;

/// A cron trigger bound to a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    /// Stable identifier.
    pub id: ScheduleId,
    /// The workflow this schedule dispatches.
    pub workflow_id: WorkflowId,
    /// 5- or 6-field cron expression.
    pub expression: String,
    /// IANA timezone name the expression is evaluated against.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Input handed to the execution on each fire.
    #[serde(default)]
    pub input: Value,
    /// Whether this schedule currently participates in the trigger table.
    pub enabled: bool,
    /// When this schedule last fired.
    #[serde(default)]
    pub last_run_at: Option<DateTime<Utc>>,
    /// The next time this schedule is due, stored in UTC.
    #[serde(default)]
    pub next_run_at: Option<DateTime<Utc>>,
    /// When this schedule was created.
    pub created_at: DateTime<Utc>,
    /// The schedule's owner, propagated into `context["_user_id"]` on every
    /// dispatched execution and consulted by the ownership guard (`§3`,
    /// `§4.10`).
    pub owner_id: UserId,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Schedule {
    /// Construct a new, enabled schedule with no run history yet.
    #[must_use]
    pub fn new(
        id: ScheduleId,
        workflow_id: WorkflowId,
        expression: impl Into<String>,
        timezone: impl Into<String>,
        input: Value,
        owner_id: UserId,
    ) -> Self {
        Self {
            id,
            workflow_id,
            expression: expression.into(),
            timezone: timezone.into(),
            input,
            enabled: true,
            last_run_at: None,
            next_run_at: None,
            created_at: Utc::now(),
            owner_id,
        }
    }
}

/// Durable store for the schedule table, consulted on startup and by every
/// add/update/remove/enable/disable reconciliation.
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Persist a new schedule.
    async fn create(&self, schedule: Schedule) -> Result<Schedule, SchedulerError>;

    /// Fetch one schedule by id.
    async fn get(&self, id: ScheduleId) -> Result<Option<Schedule>, SchedulerError>;

    /// All schedules bound to `workflow_id`.
    async fn list_by_workflow(&self, workflow_id: WorkflowId) -> Result<Vec<Schedule>, SchedulerError>;

    /// Every enabled schedule, loaded on `SchedulerManager::start`.
    async fn list_all_enabled(&self) -> Result<Vec<Schedule>, SchedulerError>;

    /// Overwrite a schedule's stored fields (used by `update`/
    /// `enable`/`disable`).
    async fn update(&self, schedule: Schedule) -> Result<Schedule, SchedulerError>;

    /// Remove a schedule permanently.
    async fn delete(&self, id: ScheduleId) -> Result<bool, SchedulerError>;

    /// Record that `id` fired at `timestamp`.
    async fn update_last_run(&self, id: ScheduleId, timestamp: DateTime<Utc>) -> Result<(), SchedulerError>;

    /// Record the next computed fire time for `id`.
    async fn update_next_run(&self, id: ScheduleId, timestamp: Option<DateTime<Utc>>) -> Result<(), SchedulerError>;
}

/// Fetches the workflow a schedule dispatches. A trait contract only —
/// `nebula-scheduler` does not implement persistence.
#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    /// Load a workflow definition by id.
    async fn get(&self, id: WorkflowId) -> Result<Option<nebula_workflow::Workflow>, SchedulerError>;
}
