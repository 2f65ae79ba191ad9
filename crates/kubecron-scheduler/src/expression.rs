//! Cron expression handling.
//!
//! Expressions are parsed by the `cron` crate, which expects a leading
//! seconds field. The usual five-field form (`min hour dom mon dow`) is
//! accepted and runs at second zero. Note that the crate numbers weekdays
//! 1-7 starting on Sunday; names (`MON-FRI`) avoid the ambiguity.

use std::str::FromStr;

use chrono::{DateTime, Local};
use cron::Schedule;

use crate::error::{Result, SchedulerError};

/// Parse `expression`, accepting five to seven whitespace-separated fields.
pub fn parse_expression(expression: &str) -> Result<Schedule> {
    let trimmed = expression.trim();
    let normalized = match trimmed.split_whitespace().count() {
        5 => format!("0 {trimmed}"),
        _ => trimmed.to_string(),
    };
    Schedule::from_str(&normalized).map_err(|e| SchedulerError::InvalidExpression {
        expression: expression.to_string(),
        reason: e.to_string(),
    })
}

/// First match strictly after `after`, in local time.
pub fn next_fire(schedule: &Schedule, after: DateTime<Local>) -> Option<DateTime<Local>> {
    schedule.after(&after).next()
}
