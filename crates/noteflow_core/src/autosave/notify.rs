//! User-facing notifications emitted by the engine.

use crate::model::content::ContentDoc;
use crate::model::note::NoteId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    NoteCreated,
    NoteSaved,
    NoteDeleted,
    NoteRestored,
    CreateFailed,
    SaveFailed,
    DeleteFailed,
    RestoreFailed,
    LoadFailed,
    InvalidContent,
}

impl NotificationKind {
    pub fn level(self) -> NotificationLevel {
        match self {
            Self::NoteCreated | Self::NoteSaved | Self::NoteDeleted | Self::NoteRestored => {
                NotificationLevel::Success
            }
            _ => NotificationLevel::Error,
        }
    }
}

/// Toast-style message for the host UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn level(&self) -> NotificationLevel {
        self.kind.level()
    }
}

/// Everything needed to undo a deletion by re-creating the note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedNote {
    pub id: NoteId,
    pub title: String,
    pub content: ContentDoc,
}
