//! Cron expressions for the built-in scheduler.

use crate::error::PlaysyncError;
use chrono::{DateTime, TimeZone};
use cron::Schedule;
use itertools::Itertools;
use std::fmt;
use std::str::FromStr;

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Clone)]
pub struct SyncSchedule {
    expression: String,
    schedule: Schedule,
}

fn day_number(value: &str) -> Option<usize> {
    value.parse::<usize>().ok().filter(|day| *day <= 7)
}

fn crontab_day_item(item: &str) -> String {
    let (range, step) = match item.split_once('/') {
        Some((range, step)) => match step.parse::<usize>() {
            Ok(step) if step > 0 => (range, Some(step)),
            _ => return item.to_string(),
        },
        None => (item, None),
    };

    let bounds = match range.split_once('-') {
        _ if range == "*" || range == "?" => step.map(|_| (0, 6)),
        Some((start, end)) => day_number(start).zip(day_number(end)),
        None => day_number(range).map(|day| if step.is_some() { (day, 6) } else { (day, day) }),
    };
    match bounds {
        Some((start, end)) if start <= end => (start..=end)
            .step_by(step.unwrap_or(1))
            .map(|day| WEEKDAYS[day % 7])
            .join(","),
        _ => item.to_string(),
    }
}

/// Rewrites a crontab day-of-week field (0-7, Sunday is 0 and 7) into day
/// names. The `cron` crate counts 1-7 from Sunday, so numbers can't be
/// passed through. Non-numeric items are left for the `cron` crate to judge.
fn crontab_day_of_week(field: &str) -> String {
    let days = field.split(',').map(crontab_day_item).join(",");
    days.split(',').unique().join(",")
}

impl SyncSchedule {
    pub fn parse(expression: &str) -> Result<Self, PlaysyncError> {
        let expression = expression.trim();
        let fields = expression.split_whitespace().collect_vec();
        let schedule = match fields.as_slice() {
            // crontab: min hour dom month dow; the `cron` crate wants seconds first.
            [minute, hour, day, month, weekday] => Schedule::from_str(&format!(
                "0 {minute} {hour} {day} {month} {}",
                crontab_day_of_week(weekday)
            )),
            _ => Schedule::from_str(expression),
        }
        .map_err(|e| PlaysyncError::Schedule {
            expression: expression.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            expression: expression.to_string(),
            schedule,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// The first fire time strictly after `now`.
    pub fn next_after<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        self.schedule.after(now).next()
    }

    pub fn upcoming<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
        count: usize,
    ) -> Vec<DateTime<Tz>> {
        self.schedule.after(now).take(count).collect()
    }
}

impl FromStr for SyncSchedule {
    type Err = PlaysyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SyncSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}
