//! Cron expression parsing and next-run calculation (`§4.8`), ported from
//! `scheduler.py`'s `calculate_next_run`/`validate_cron_expression`:
//! `croner` replaces `croniter`, `chrono-tz` replaces `pytz`. Cron
//! expressions may be 5- or 6-field (seconds optional); timezone is a
//! per-schedule IANA name, defaulting to UTC with a logged warning when
//! unset or unrecognised.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use croner::Cron;
use tracing::warn;

use crate::error::SchedulerError;

/// Resolve an IANA timezone name, falling back to UTC and logging a
/// warning when `timezone` is empty or not a recognised zone.
pub fn resolve_timezone(timezone: &str) -> Tz {
    if timezone.is_empty() {
        return Tz::UTC;
    }
    match timezone.parse::<Tz>() {
        Ok(tz) => tz,
        Err(_) => {
            warn!(timezone, "unknown or invalid timezone, falling back to UTC");
            Tz::UTC
        }
    }
}

fn parse(expression: &str) -> Result<Cron, SchedulerError> {
    Cron::new(expression)
        .with_seconds_optional()
        .parse()
        .map_err(|source| SchedulerError::InvalidCronExpression {
            expression: expression.to_string(),
            reason: source.to_string(),
        })
}

/// Validate a cron expression's syntax without computing a next run
/// (`§4.8`: "validation of cron expressions happens before acceptance").
#[must_use]
pub fn validate_cron_expression(expression: &str) -> bool {
    parse(expression).is_ok()
}

/// Compute the next run time strictly after `base_time`, evaluated in
/// `timezone` and returned in UTC for storage.
pub fn calculate_next_run(
    expression: &str,
    timezone: &str,
    base_time: DateTime<Utc>,
) -> Result<DateTime<Utc>, SchedulerError> {
    let cron = parse(expression)?;
    let tz = resolve_timezone(timezone);
    let base_in_tz = base_time.with_timezone(&tz);
    let next = cron
        .find_next_occurrence(&base_in_tz, false)
        .map_err(|source| SchedulerError::InvalidCronExpression {
            expression: expression.to_string(),
            reason: source.to_string(),
        })?;
    Ok(next.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn valid_five_field_expression_passes() {
        assert!(validate_cron_expression("0 9 * * *"));
    }

    #[test]
    fn valid_six_field_expression_with_seconds_passes() {
        assert!(validate_cron_expression("0 0 9 * * *"));
    }

    #[test]
    fn malformed_expression_fails() {
        assert!(!validate_cron_expression("not a cron expression"));
    }

    #[test]
    fn next_run_advances_to_the_next_matching_minute() {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 8, 59, 0).unwrap();
        let next = calculate_next_run("0 9 * * *", "UTC", base).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap());
    }

    #[test]
    fn unknown_timezone_falls_back_to_utc() {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 8, 59, 0).unwrap();
        let next = calculate_next_run("0 9 * * *", "Not/AZone", base).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap());
    }

    #[test]
    fn empty_timezone_defaults_to_utc() {
        assert_eq!(resolve_timezone(""), Tz::UTC);
    }
}
