//! To-do item model.
//!
//! # Invariants
//! - `completed_at` is `Some` only while `done` is `true`.
//! - Legacy snapshots using `task`/`created`/`completed` keys still load.

use super::{Record, RecordId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Spoken priority for a to-do item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Parses a spoken priority, ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" | "normal" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    #[serde(default)]
    pub id: RecordId,
    #[serde(alias = "task")]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(alias = "created")]
    pub created_at: NaiveDateTime,
    #[serde(default, alias = "completed")]
    pub done: bool,
    #[serde(
        default,
        alias = "completed_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<NaiveDateTime>,
}

impl TodoItem {
    /// Creates an open item; the repository assigns the id on insert.
    pub fn new(description: impl Into<String>, priority: Priority, created_at: NaiveDateTime) -> Self {
        Self {
            id: 0,
            description: description.into(),
            priority,
            created_at,
            done: false,
            completed_at: None,
        }
    }

    pub fn set_done(&mut self, done: bool, now: NaiveDateTime) {
        self.done = done;
        self.completed_at = if done { Some(now) } else { None };
    }

    pub fn toggle_done(&mut self, now: NaiveDateTime) {
        self.set_done(!self.done, now);
    }
}

impl Record for TodoItem {
    const FILE_NAME: &'static str = "todo.json";
    const COLLECTION: &'static str = "todo";

    fn id(&self) -> RecordId {
        self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = id;
    }
}
