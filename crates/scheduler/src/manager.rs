//! [`SchedulerManager`]: the C8 timer wheel (`§4.8`).
//!
//! Wraps a [`tokio_cron_scheduler::JobScheduler`] — the actual timer wheel —
//! with the bookkeeping `§4.8` asks for on top of it: `next_run_at`/
//! `last_run_at` written back to the [`ScheduleRepository`] on every fire,
//! a 60s misfire grace window evaluated at `start`, and add/update/remove/
//! enable/disable reconciliation of the in-process job table.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use nebula_core::id::{ExecutionId, ScheduleId};
use nebula_engine::{GraphRuntime, RuntimeServices};
use nebula_eventbus::BackgroundExecutionManager;
use nebula_execution::ExecutionContext;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{info, warn};
use uuid::Uuid;

use crate::cron::{calculate_next_run, resolve_timezone, validate_cron_expression};
use crate::error::SchedulerError;
use crate::schedule::{Schedule, ScheduleRepository, WorkflowRepository};

/// A misfired schedule (scheduler offline past its `next_run_at`) fires
/// immediately if still within this window of its due time; past it, the
/// firing is silently dropped (`§4.8`).
pub const MISFIRE_GRACE: StdDuration = StdDuration::from_secs(60);

/// Cron-triggered dispatch: loads enabled schedules on [`Self::start`],
/// keeps one registered timer-wheel job per enabled schedule, and fires
/// executions through a [`BackgroundExecutionManager`].
pub struct SchedulerManager {
    timer: JobScheduler,
    jobs: dashmap::DashMap<ScheduleId, Uuid>,
    schedules: Arc<dyn ScheduleRepository>,
    workflows: Arc<dyn WorkflowRepository>,
    events: Arc<BackgroundExecutionManager>,
    runtime: Arc<GraphRuntime>,
    services: Arc<RuntimeServices>,
}

impl SchedulerManager {
    /// Build a manager over the given repositories and dispatch
    /// collaborators. Constructs (but does not start) the underlying timer
    /// wheel.
    pub async fn new(
        schedules: Arc<dyn ScheduleRepository>,
        workflows: Arc<dyn WorkflowRepository>,
        events: Arc<BackgroundExecutionManager>,
        runtime: Arc<GraphRuntime>,
        services: Arc<RuntimeServices>,
    ) -> Result<Self, SchedulerError> {
        let timer = JobScheduler::new()
            .await
            .map_err(|e| SchedulerError::TimerWheel(e.to_string()))?;
        Ok(Self {
            timer,
            jobs: dashmap::DashMap::new(),
            schedules,
            workflows,
            events,
            runtime,
            services,
        })
    }

    /// Load every enabled schedule, register its timer-wheel job, fire any
    /// schedule that misfired within [`MISFIRE_GRACE`] while the process was
    /// down, and start the wheel ticking.
    pub async fn start(&self) -> Result<(), SchedulerError> {
        let enabled = self.schedules.list_all_enabled().await?;
        let now = Utc::now();

        for schedule in enabled {
            self.reconcile_misfire(&schedule, now).await?;
            self.register_job(&schedule).await?;
        }

        self.timer
            .start()
            .await
            .map_err(|e| SchedulerError::TimerWheel(e.to_string()))?;
        info!("scheduler started");
        Ok(())
    }

    /// If `schedule.next_run_at` is due and within grace, fire it now and
    /// advance its bookkeeping; if overdue past grace, silently advance
    /// `next_run_at` without firing (`§4.8` misfire handling). A schedule
    /// with no prior `next_run_at` just gets one computed.
    async fn reconcile_misfire(&self, schedule: &Schedule, now: DateTime<Utc>) -> Result<(), SchedulerError> {
        let Some(due) = schedule.next_run_at else {
            let next = calculate_next_run(&schedule.expression, &schedule.timezone, now)?;
            self.schedules.update_next_run(schedule.id, Some(next)).await?;
            return Ok(());
        };

        if due > now {
            return Ok(());
        }

        let overdue = (now - due).to_std().unwrap_or_default();
        if overdue <= MISFIRE_GRACE {
            warn!(schedule_id = %schedule.id, "misfired schedule within grace window, firing now");
            Self::fire(
                schedule.id,
                Arc::clone(&self.schedules),
                Arc::clone(&self.workflows),
                Arc::clone(&self.events),
                Arc::clone(&self.runtime),
                Arc::clone(&self.services),
                now,
            )
            .await?;
        } else {
            warn!(schedule_id = %schedule.id, "misfired schedule past grace window, dropping fire");
            let next = calculate_next_run(&schedule.expression, &schedule.timezone, now)?;
            self.schedules.update_next_run(schedule.id, Some(next)).await?;
        }
        Ok(())
    }

    /// Register (or re-register) the timer-wheel job for `schedule`. A
    /// prior job under the same id, if any, is removed first.
    async fn register_job(&self, schedule: &Schedule) -> Result<(), SchedulerError> {
        if let Some((_, old)) = self.jobs.remove(&schedule.id) {
            let _ = self.timer.remove(&old).await;
        }

        let schedule_id = schedule.id;
        let schedules = Arc::clone(&self.schedules);
        let workflows = Arc::clone(&self.workflows);
        let events = Arc::clone(&self.events);
        let runtime = Arc::clone(&self.runtime);
        let services = Arc::clone(&self.services);
        let tz = resolve_timezone(&schedule.timezone);

        let job = Job::new_async_tz(schedule.expression.as_str(), tz, move |_uuid, _lock| {
            let schedules = Arc::clone(&schedules);
            let workflows = Arc::clone(&workflows);
            let events = Arc::clone(&events);
            let runtime = Arc::clone(&runtime);
            let services = Arc::clone(&services);
            Box::pin(async move {
                if let Err(err) = SchedulerManager::fire(
                    schedule_id,
                    schedules,
                    workflows,
                    events,
                    runtime,
                    services,
                    Utc::now(),
                )
                .await
                {
                    warn!(schedule_id = %schedule_id, error = %err, "scheduled fire failed");
                }
            })
        })
        .map_err(|e| SchedulerError::TimerWheel(e.to_string()))?;

        let uuid = self
            .timer
            .add(job)
            .await
            .map_err(|e| SchedulerError::TimerWheel(e.to_string()))?;
        self.jobs.insert(schedule.id, uuid);
        Ok(())
    }

    /// Dispatch one fire of `schedule_id` through the background execution
    /// manager, then advance `last_run_at`/`next_run_at` (`§8` invariant 6).
    /// Reads the schedule fresh so a fire racing a concurrent disable/delete
    /// is a no-op rather than a stale dispatch.
    async fn fire(
        schedule_id: ScheduleId,
        schedules: Arc<dyn ScheduleRepository>,
        workflows: Arc<dyn WorkflowRepository>,
        events: Arc<BackgroundExecutionManager>,
        runtime: Arc<GraphRuntime>,
        services: Arc<RuntimeServices>,
        fire_time: DateTime<Utc>,
    ) -> Result<(), SchedulerError> {
        let Some(schedule) = schedules.get(schedule_id).await? else {
            return Ok(());
        };
        if !schedule.enabled {
            return Ok(());
        }
        let workflow = workflows
            .get(schedule.workflow_id)
            .await?
            .ok_or(SchedulerError::WorkflowNotFound {
                schedule: schedule_id,
                workflow: schedule.workflow_id,
            })?;

        let context = ExecutionContext::new(schedule.input.clone(), schedule.owner_id);
        let execution_id = ExecutionId::v4();

        events.dispatch(execution_id, move || {
            Box::pin(async move {
                runtime
                    .run(&workflow, execution_id, context, &services)
                    .await
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            })
        });

        schedules.update_last_run(schedule_id, fire_time).await?;
        let next = calculate_next_run(&schedule.expression, &schedule.timezone, fire_time)?;
        schedules.update_next_run(schedule_id, Some(next)).await?;
        Ok(())
    }

    /// Validate, persist, and register a new schedule.
    pub async fn add(&self, mut schedule: Schedule) -> Result<Schedule, SchedulerError> {
        if !validate_cron_expression(&schedule.expression) {
            return Err(SchedulerError::InvalidCronExpression {
                expression: schedule.expression.clone(),
                reason: "rejected before acceptance".to_string(),
            });
        }
        schedule.next_run_at = Some(calculate_next_run(
            &schedule.expression,
            &schedule.timezone,
            Utc::now(),
        )?);
        let saved = self.schedules.create(schedule).await?;
        if saved.enabled {
            self.register_job(&saved).await?;
        }
        Ok(saved)
    }

    /// Persist updated fields and re-register the job against the new
    /// expression/timezone/enabled state.
    pub async fn update(&self, schedule: Schedule) -> Result<Schedule, SchedulerError> {
        if !validate_cron_expression(&schedule.expression) {
            return Err(SchedulerError::InvalidCronExpression {
                expression: schedule.expression.clone(),
                reason: "rejected before acceptance".to_string(),
            });
        }
        let saved = self.schedules.update(schedule).await?;
        if let Some((_, old)) = self.jobs.remove(&saved.id) {
            let _ = self.timer.remove(&old).await;
        }
        if saved.enabled {
            self.register_job(&saved).await?;
        }
        Ok(saved)
    }

    /// Remove a schedule from both the repository and the timer wheel.
    pub async fn remove(&self, id: ScheduleId) -> Result<bool, SchedulerError> {
        if let Some((_, old)) = self.jobs.remove(&id) {
            let _ = self.timer.remove(&old).await;
        }
        self.schedules.delete(id).await
    }

    /// Mark a schedule enabled and register its job.
    pub async fn enable(&self, id: ScheduleId) -> Result<Schedule, SchedulerError> {
        let mut schedule = self.schedules.get(id).await?.ok_or(SchedulerError::NotFound(id))?;
        schedule.enabled = true;
        schedule.next_run_at = Some(calculate_next_run(
            &schedule.expression,
            &schedule.timezone,
            Utc::now(),
        )?);
        let saved = self.schedules.update(schedule).await?;
        self.register_job(&saved).await?;
        Ok(saved)
    }

    /// Mark a schedule disabled and remove its job from the wheel.
    pub async fn disable(&self, id: ScheduleId) -> Result<Schedule, SchedulerError> {
        let mut schedule = self.schedules.get(id).await?.ok_or(SchedulerError::NotFound(id))?;
        schedule.enabled = false;
        let saved = self.schedules.update(schedule).await?;
        if let Some((_, old)) = self.jobs.remove(&id) {
            let _ = self.timer.remove(&old).await;
        }
        Ok(saved)
    }

    /// Stop the timer wheel. Does not touch the repository; enabled
    /// schedules are reloaded and re-registered on the next `start`.
    pub async fn shutdown(&self) -> Result<(), SchedulerError> {
        self.timer
            .shutdown()
            .await
            .map_err(|e| SchedulerError::TimerWheel(e.to_string()))
    }
}
