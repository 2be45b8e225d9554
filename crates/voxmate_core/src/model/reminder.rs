//! Reminder model.
//!
//! # Invariants
//! - A reminder fires at most once: `notified` flips to `true` when the shell
//!   announces it and never flips back.

use super::{Record, RecordId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    #[serde(default)]
    pub id: RecordId,
    pub text: String,
    #[serde(alias = "time")]
    pub trigger_time: NaiveDateTime,
    #[serde(alias = "created")]
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub notified: bool,
}

impl Reminder {
    pub fn new(text: impl Into<String>, trigger_time: NaiveDateTime, created_at: NaiveDateTime) -> Self {
        Self {
            id: 0,
            text: text.into(),
            trigger_time,
            created_at,
            notified: false,
        }
    }

    /// Returns whether the reminder should fire at wall-clock `now`.
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        !self.notified && self.trigger_time <= now
    }
}

impl Record for Reminder {
    const FILE_NAME: &'static str = "reminders.json";
    const COLLECTION: &'static str = "reminders";

    fn id(&self) -> RecordId {
        self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = id;
    }
}
