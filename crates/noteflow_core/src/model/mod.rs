//! Domain model for notes edited through the autosave engine.
//!
//! # Responsibility
//! - Define persisted note records and the draft/persisted identity split.
//! - Own the opaque rich-text document type and its projections.
//!
//! # Invariants
//! - Persisted identifiers are assigned by storage, never by the engine.
//! - Draft identifiers never leave the process.

pub mod content;
pub mod note;
