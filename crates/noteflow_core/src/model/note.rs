//! Note identity and record types.
//!
//! # Responsibility
//! - Define persisted note records returned by storage adapters.
//! - Model the draft/persisted identity split as a tagged union.
//!
//! # Invariants
//! - `DraftId` values are unique within the process, even when allocated in
//!   the same millisecond.
//! - A `NoteRef::Draft` is never sent to storage as a key.

use crate::model::content::ContentDoc;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_DRAFT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Storage-assigned note identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for NoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Locally generated identifier of a never-persisted note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DraftId {
    created_at: i64,
    seq: u64,
}

impl DraftId {
    /// Allocates a fresh id from the process-wide counter.
    pub fn allocate(now_ms: i64) -> Self {
        Self {
            created_at: now_ms,
            seq: NEXT_DRAFT_SEQ.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl Display for DraftId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "draft-{}-{}", self.created_at, self.seq)
    }
}

/// Identity of the note bound to the editor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NoteRef {
    Draft(DraftId),
    Persisted(NoteId),
}

impl NoteRef {
    pub fn is_draft(&self) -> bool {
        matches!(self, Self::Draft(_))
    }

    pub fn persisted_id(&self) -> Option<&NoteId> {
        match self {
            Self::Draft(_) => None,
            Self::Persisted(id) => Some(id),
        }
    }
}

impl Display for NoteRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft(id) => write!(f, "{id}"),
            Self::Persisted(id) => write!(f, "{id}"),
        }
    }
}

/// Persisted note record as returned by a storage adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: ContentDoc,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds, refreshed on every successful save.
    pub updated_at: i64,
}

/// Partial update for an existing note. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<ContentDoc>,
}

impl NotePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}

/// The note currently bound to the editor, draft or persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveNote {
    pub id: NoteRef,
    /// Committed title; the live input value is tracked by the engine.
    pub title: String,
    pub content: ContentDoc,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl ActiveNote {
    /// Empty draft with a freshly allocated id.
    pub fn draft(now_ms: i64) -> Self {
        Self {
            id: NoteRef::Draft(DraftId::allocate(now_ms)),
            title: String::new(),
            content: ContentDoc::empty(),
            created_at: None,
            updated_at: None,
        }
    }
}

impl From<&Note> for ActiveNote {
    fn from(note: &Note) -> Self {
        Self {
            id: NoteRef::Persisted(note.id.clone()),
            title: note.title.clone(),
            content: note.content.clone(),
            created_at: Some(note.created_at),
            updated_at: Some(note.updated_at),
        }
    }
}
