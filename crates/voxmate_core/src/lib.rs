//! Core of the Voxmate voice assistant.
//! Command matching, handlers, persistence and platform seams live here;
//! the shell crate only does terminal I/O.

pub mod assistant;
pub mod capability;
pub mod command;
pub mod config;
pub mod conversation;
pub mod handlers;
pub mod logging;
pub mod model;
pub mod platform;
pub mod repo;
pub mod service;

pub use assistant::{Assistant, CommandOutcome, ERROR_MESSAGE};
pub use capability::{Capability, CapabilityError, CapabilitySet};
pub use command::{match_command, CommandKind, CommandMatch, FALLBACK_MESSAGE};
pub use config::{AssistantConfig, ConfigError};
pub use conversation::{Conversation, ScriptedConversation};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::Note;
pub use model::reminder::Reminder;
pub use model::todo::{Priority, TodoItem};
pub use model::{Record, RecordId};
pub use repo::json_repo::{CollectionRepository, JsonFileRepository, StorageError};
pub use service::note_service::NoteService;
pub use service::reminder_service::ReminderService;
pub use service::todo_service::{TodoPatch, TodoService};
pub use service::TaskError;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
