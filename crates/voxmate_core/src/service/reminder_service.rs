//! Reminder use-case service.
//!
//! # Responsibility
//! - Parse spoken or typed trigger times.
//! - Report due reminders and persist their `notified` flag.
//!
//! # Invariants
//! - There is no background scheduler; the shell polls [`ReminderService::due_reminders`].
//! - A reminder is reported as due at most once.

use super::{required_text, TaskError};
use crate::model::reminder::Reminder;
use crate::model::RecordId;
use crate::repo::json_repo::CollectionRepository;
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;

/// User-facing message for unparsable trigger times.
pub const INVALID_TIME_MESSAGE: &str =
    "Invalid date format. Please use YYYY-MM-DD HH:MM format.";

static RELATIVE_TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^in (\d{1,4}) (minute|minutes|min|mins|hour|hours|day|days)$")
        .expect("valid relative time regex")
});

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

pub struct ReminderService<R: CollectionRepository<Reminder>> {
    repo: R,
}

impl<R: CollectionRepository<Reminder>> ReminderService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Adds one reminder; `when` goes through [`parse_trigger_time`].
    pub fn add_reminder(
        &self,
        text: &str,
        when: &str,
        now: NaiveDateTime,
    ) -> Result<Reminder, TaskError> {
        let text = required_text(text, "reminder text")?;
        let trigger_time = parse_trigger_time(when, now)?;
        let reminder = self.repo.add(Reminder::new(text, trigger_time, now))?;
        info!(
            "event=reminder_add module=service status=ok id={} trigger_time={}",
            reminder.id, reminder.trigger_time
        );
        Ok(reminder)
    }

    /// Returns reminders due at `now` and marks them notified.
    pub fn due_reminders(&self, now: NaiveDateTime) -> Result<Vec<Reminder>, TaskError> {
        let due = self.repo.update_matching(|reminder| {
            if reminder.is_due(now) {
                reminder.notified = true;
                true
            } else {
                false
            }
        })?;
        if !due.is_empty() {
            info!(
                "event=reminder_due module=service status=ok count={}",
                due.len()
            );
        }
        Ok(due)
    }

    pub fn list_reminders(&self) -> Result<Vec<Reminder>, TaskError> {
        Ok(self.repo.list()?)
    }

    /// Un-notified reminders ordered by trigger time.
    pub fn upcoming_reminders(&self) -> Vec<Reminder> {
        let mut pending = self
            .repo
            .list_or_empty()
            .into_iter()
            .filter(|reminder| !reminder.notified)
            .collect::<Vec<_>>();
        pending.sort_by_key(|reminder| reminder.trigger_time);
        pending
    }

    pub fn remove_reminder(&self, id: RecordId) -> Result<bool, TaskError> {
        Ok(self.repo.remove(id)?)
    }
}

/// Parses a trigger time.
///
/// Accepted forms:
/// - ISO-8601 with or without offset (`2025-04-02T15:45:00`, `...+02:00`)
/// - `YYYY-MM-DD HH:MM` (optionally with seconds)
/// - `YYYY-MM-DD` (midnight)
/// - `in N minutes|hours|days`, relative to `now`
pub fn parse_trigger_time(value: &str, now: NaiveDateTime) -> Result<NaiveDateTime, TaskError> {
    let trimmed = value.trim();
    let invalid = || TaskError::InvalidTime(trimmed.to_string());
    if trimmed.is_empty() {
        return Err(invalid());
    }

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(with_offset.with_timezone(&Local).naive_local());
    }
    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(parsed);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).ok_or_else(invalid);
    }

    let lowered = trimmed.to_lowercase();
    let captures = RELATIVE_TIME_RE.captures(&lowered).ok_or_else(invalid)?;
    let amount = captures[1].parse::<i64>().map_err(|_| invalid())?;
    let offset = match &captures[2] {
        "minute" | "minutes" | "min" | "mins" => Duration::minutes(amount),
        "hour" | "hours" => Duration::hours(amount),
        _ => Duration::days(amount),
    };
    now.checked_add_signed(offset).ok_or_else(invalid)
}

/// Formats one reminder as `"{id}. {YYYY-MM-DD HH:MM}: {text}"`.
pub fn format_reminder_line(reminder: &Reminder) -> String {
    format!(
        "{}. {}: {}",
        reminder.id,
        reminder.trigger_time.format("%Y-%m-%d %H:%M"),
        reminder.text
    )
}

#[cfg(test)]
mod tests {
    use super::parse_trigger_time;
    use crate::service::TaskError;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 4, 2)
            .and_then(|date| date.and_hms_opt(hour, minute, 0))
            .expect("valid timestamp")
    }

    #[test]
    fn parses_absolute_forms() {
        let now = at(8, 0);
        assert_eq!(parse_trigger_time("2025-04-02 15:45", now).unwrap(), at(15, 45));
        assert_eq!(parse_trigger_time("2025-04-02T15:45:00", now).unwrap(), at(15, 45));
        assert_eq!(parse_trigger_time("2025-04-02T15:45", now).unwrap(), at(15, 45));
        assert_eq!(parse_trigger_time("2025-04-02", now).unwrap(), at(0, 0));
    }

    #[test]
    fn parses_relative_offsets() {
        let now = at(8, 0);
        assert_eq!(parse_trigger_time("in 15 minutes", now).unwrap(), at(8, 15));
        assert_eq!(parse_trigger_time("In 2 hours", now).unwrap(), at(10, 0));
        assert_eq!(
            parse_trigger_time("in 1 day", now).unwrap(),
            at(8, 0) + chrono::Duration::days(1)
        );
    }

    #[test]
    fn rejects_unparsable_values() {
        for value in ["tomorrow-ish", "", "2025-13-40 10:00", "in many minutes"] {
            let err = parse_trigger_time(value, at(8, 0)).expect_err("should be rejected");
            assert!(matches!(err, TaskError::InvalidTime(_)));
        }
    }
}
