//! Storage adapter contract and local persistence implementation.
//!
//! # Responsibility
//! - Define the note list store boundary used by the autosave engine.
//! - Keep SQLite query details out of engine orchestration.
//!
//! # Invariants
//! - Adapters return semantic errors (`NotFound`, `Validation`) in addition
//!   to transport/database errors.

pub mod note_store;
pub mod sqlite_store;
