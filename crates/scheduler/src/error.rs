//! Scheduler error type.

use nebula_core::id::ScheduleId;
use nebula_error::ErrorCode;
use thiserror::Error;

/// Errors raised by the cron trigger table (C8).
#[derive(Debug, Error, ErrorCode)]
pub enum SchedulerError {
    /// A cron expression failed validation.
    #[error("invalid cron expression {expression:?}: {reason}")]
    #[code = "invalid_cron_expression"]
    InvalidCronExpression {
        /// The rejected expression.
        expression: String,
        /// Why the cron library rejected it.
        reason: String,
    },

    /// No schedule exists for the given id.
    #[error("schedule not found: {0}")]
    #[code = "schedule_not_found"]
    NotFound(ScheduleId),

    /// The `tokio-cron-scheduler` timer wheel failed to register, remove,
    /// or start a job.
    #[error("timer wheel error: {0}")]
    #[code = "timer_wheel_error"]
    TimerWheel(String),

    /// The schedule's workflow could not be loaded for dispatch.
    #[error("workflow not found for schedule {schedule}: {workflow}")]
    #[code = "workflow_not_found"]
    WorkflowNotFound {
        /// The schedule whose workflow is missing.
        schedule: ScheduleId,
        /// The dangling workflow id.
        workflow: nebula_core::id::WorkflowId,
    },

    /// An execution-layer error surfaced while dispatching a fire.
    #[error(transparent)]
    #[code = "execution_error"]
    Execution(#[from] nebula_execution::ExecutionError),
}
