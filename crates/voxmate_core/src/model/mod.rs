//! Records persisted by the task manager.
//!
//! # Responsibility
//! - Define the to-do, note and reminder shapes stored as JSON arrays.
//! - Expose the [`Record`] contract used by generic JSON repositories.
//!
//! # Invariants
//! - Every record carries a positive integer id unique within its collection.
//! - The three collections are independent; no record references another.

use serde::de::DeserializeOwned;
use serde::Serialize;

pub mod note;
pub mod reminder;
pub mod todo;

/// Incrementing integer identity, unique per collection.
pub type RecordId = u64;

/// Contract shared by every persisted collection item.
pub trait Record: Serialize + DeserializeOwned + Clone {
    /// File name of the backing snapshot inside the data directory.
    const FILE_NAME: &'static str;
    /// Short collection label used in log events.
    const COLLECTION: &'static str;

    fn id(&self) -> RecordId;

    /// Assigns the id chosen by the repository on insert.
    fn assign_id(&mut self, id: RecordId);
}
