//! Core autosave engine for noteflow.
//! Keeps one editor buffer in sync with persisted notes.

pub mod autosave;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use autosave::{
    AutosaveEngine, AutosaveState, DeletedNote, EditorBuffer, FlushOutcome, MemoryEditor,
    NoteListItem, Notification, NotificationKind, NotificationLevel, SaveIntent, SaveJob, SaveOp,
    SessionId,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AutosaveConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::content::{ContentDoc, ContentValidationError};
pub use model::note::{ActiveNote, DraftId, Note, NoteId, NotePatch, NoteRef};
pub use repo::note_store::{NoteStore, StoreError, StoreResult};
pub use repo::sqlite_store::SqliteNoteStore;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
