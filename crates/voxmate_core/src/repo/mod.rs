//! Repository layer over JSON snapshot files.
//!
//! # Responsibility
//! - Define the collection CRUD contract used by task-manager services.
//! - Isolate filesystem and serde details from services and handlers.
//!
//! # Invariants
//! - Repository APIs report "not found" as `None`/`false`, never as errors.
//! - Only unreadable or corrupt files produce [`json_repo::StorageError`].

pub mod json_repo;
