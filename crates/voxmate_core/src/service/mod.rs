//! Task-manager use-case services.
//!
//! # Responsibility
//! - Validate spoken input before it reaches the JSON repositories.
//! - Keep timestamps explicit (`now` is passed in) so callers control time.
//!
//! # Invariants
//! - Services never panic on user input; bad input maps to [`TaskError`].
//! - "Not found" is reported as `None`/`false`, matching the repository layer.

use crate::repo::json_repo::StorageError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod note_service;
pub mod reminder_service;
pub mod todo_service;

/// Error shared by to-do, note and reminder services.
#[derive(Debug)]
pub enum TaskError {
    /// Required text field was empty after trimming.
    EmptyText(&'static str),
    /// Reminder time could not be parsed.
    InvalidTime(String),
    /// Persistence-layer failure.
    Storage(StorageError),
}

impl Display for TaskError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText(field) => write!(f, "{field} must not be empty"),
            Self::InvalidTime(value) => write!(f, "invalid reminder time: `{value}`"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StorageError> for TaskError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

pub(crate) fn required_text(value: &str, field: &'static str) -> Result<String, TaskError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TaskError::EmptyText(field));
    }
    Ok(trimmed.to_string())
}
