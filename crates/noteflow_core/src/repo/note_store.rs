//! Storage adapter contract for note lists.
//!
//! # Responsibility
//! - Define the list/create/update/delete boundary the autosave engine
//!   talks to, whether backed by a remote API or local device storage.
//! - Classify failures so the engine can pick a recovery policy.
//!
//! # Invariants
//! - `update` and `delete` fail with `StoreError::NotFound` for unknown ids;
//!   they never silently no-op.
//! - `create` returns the storage-assigned id and canonical fields.

use crate::db::DbError;
use crate::model::content::{ContentDoc, ContentValidationError};
use crate::model::note::{Note, NoteId, NotePatch};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure reported by a storage adapter.
#[derive(Debug)]
pub enum StoreError {
    /// Input rejected before or by storage (e.g. malformed content).
    Validation(String),
    /// Target note does not exist (anymore).
    NotFound(NoteId),
    /// Network or device-storage transport failure.
    Transport(String),
    /// Local database failure.
    Db(DbError),
    /// Stored data could not be decoded.
    InvalidData(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(message) => write!(f, "validation failed: {message}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::Transport(message) => write!(f, "transport failure: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid stored note data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ContentValidationError> for StoreError {
    fn from(value: ContentValidationError) -> Self {
        Self::Validation(value.to_string())
    }
}

/// Asynchronous-in-spirit key/value list store for notes.
///
/// Calls are synchronous at this boundary; hosts with a remote transport run
/// them off the UI loop through `SaveJob` and report results back.
pub trait NoteStore {
    /// Returns all persisted notes, in adapter-defined order.
    fn list(&mut self) -> StoreResult<Vec<Note>>;
    /// Creates one note and returns the canonical stored record.
    fn create(&mut self, title: &str, content: &ContentDoc) -> StoreResult<Note>;
    /// Applies a partial update and returns the canonical stored record.
    fn update(&mut self, id: &NoteId, patch: &NotePatch) -> StoreResult<Note>;
    /// Removes one note.
    fn delete(&mut self, id: &NoteId) -> StoreResult<()>;
}

impl<S: NoteStore + ?Sized> NoteStore for Box<S> {
    fn list(&mut self) -> StoreResult<Vec<Note>> {
        (**self).list()
    }

    fn create(&mut self, title: &str, content: &ContentDoc) -> StoreResult<Note> {
        (**self).create(title, content)
    }

    fn update(&mut self, id: &NoteId, patch: &NotePatch) -> StoreResult<Note> {
        (**self).update(id, patch)
    }

    fn delete(&mut self, id: &NoteId) -> StoreResult<()> {
        (**self).delete(id)
    }
}
