//! Editor autosave and note identity synchronization.
//!
//! # Responsibility
//! - `engine`: orchestrates the active note, saves, and list reconciliation.
//! - `scheduler`: debounce timers, dirty tracking, and save serialization.
//! - `identity`: draft allocation and one-shot promotion.
//! - `guard`: typing and programmatic-update windows.
//!
//! # See also
//! - `repo::note_store` for the storage boundary the engine drives.

pub mod editor;
pub mod engine;
pub mod guard;
pub mod identity;
pub mod notify;
pub mod scheduler;
pub mod timer;

pub use editor::{EditorBuffer, MemoryEditor};
pub use engine::{AutosaveEngine, AutosaveState, FlushOutcome, NoteListItem, SaveIntent};
pub use identity::SessionId;
pub use notify::{DeletedNote, Notification, NotificationKind, NotificationLevel};
pub use scheduler::{SaveJob, SaveOp};
