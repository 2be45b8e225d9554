//! Handler set, one module per feature area.
//!
//! # Responsibility
//! - Each handler is a free function taking only what it needs and
//!   returning the reply text.
//!
//! # Invariants
//! - Handlers check their [`crate::capability::Capability`] before touching
//!   an optional dependency.
//! - Handlers return fallback strings instead of errors.

pub mod chat;
pub mod entertainment;
pub mod language;
pub mod online;
pub mod system;
pub mod tasks;
