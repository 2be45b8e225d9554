//! Note model.
//!
//! Notes are immutable once created; the only mutation is deletion.

use super::{Record, RecordId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default)]
    pub title: String,
    #[serde(alias = "content")]
    pub text: String,
    #[serde(alias = "created")]
    pub created_at: NaiveDateTime,
}

impl Note {
    pub fn new(title: impl Into<String>, text: impl Into<String>, created_at: NaiveDateTime) -> Self {
        Self {
            id: 0,
            title: title.into(),
            text: text.into(),
            created_at,
        }
    }

    /// Case-insensitive containment check over title and text.
    ///
    /// `query_lower` must already be lower-cased.
    pub fn matches(&self, query_lower: &str) -> bool {
        self.title.to_lowercase().contains(query_lower)
            || self.text.to_lowercase().contains(query_lower)
    }
}

impl Record for Note {
    const FILE_NAME: &'static str = "notes.json";
    const COLLECTION: &'static str = "notes";

    fn id(&self) -> RecordId {
        self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = id;
    }
}
