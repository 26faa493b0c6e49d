//! Active-note identity and draft promotion.
//!
//! # Responsibility
//! - Single source of truth for which note is bound to the editor.
//! - Allocate drafts and promote them to persisted identity exactly once.
//!
//! # Invariants
//! - Exactly one note is active at any time.
//! - Every activation (new draft, selection, deletion fallback) starts a new
//!   session; promotion keeps the session because the logical note is the
//!   same.
//! - Promotion only applies to the active draft it was issued for, so a
//!   persisted identifier is never promoted again.

use crate::model::content::ContentDoc;
use crate::model::note::{ActiveNote, DraftId, Note, NoteRef};
use log::warn;

/// Generation counter for one editor binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

#[derive(Debug, Clone)]
pub struct NoteIdentityManager {
    active: ActiveNote,
    session: SessionId,
}

impl NoteIdentityManager {
    /// Starts with an empty draft as the active note.
    pub fn new(now_ms: i64) -> Self {
        Self {
            active: ActiveNote::draft(now_ms),
            session: SessionId(1),
        }
    }

    pub fn active(&self) -> &ActiveNote {
        &self.active
    }

    pub(crate) fn active_mut(&mut self) -> &mut ActiveNote {
        &mut self.active
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Activates a fresh empty draft.
    pub fn create_draft(&mut self, now_ms: i64) -> &ActiveNote {
        self.activate(ActiveNote::draft(now_ms))
    }

    /// Activates an already persisted note.
    pub fn select(&mut self, note: &Note) -> &ActiveNote {
        self.activate(ActiveNote::from(note))
    }

    /// Rebinds the active draft to its persisted identity.
    ///
    /// `live_title` and `live_content` are what the user sees now, which may
    /// be newer than what was sent with the create call.
    ///
    /// Returns `false` (and changes nothing) when `draft_id` is not the
    /// active note.
    pub fn promote(
        &mut self,
        draft_id: DraftId,
        persisted: &Note,
        live_title: String,
        live_content: ContentDoc,
    ) -> bool {
        if self.active.id != NoteRef::Draft(draft_id) {
            warn!(
                "event=note_promote module=identity status=skipped draft={} persisted={} active={}",
                draft_id, persisted.id, self.active.id
            );
            return false;
        }

        self.active = ActiveNote {
            id: NoteRef::Persisted(persisted.id.clone()),
            title: live_title,
            content: live_content,
            created_at: Some(persisted.created_at),
            updated_at: Some(persisted.updated_at),
        };
        true
    }

    /// Replaces the active note with a fresh draft when its persisted id is
    /// absent from `remaining`. Drafts are never in the persisted list, so
    /// an active draft is left alone.
    pub fn on_external_deletion(&mut self, remaining: &[Note], now_ms: i64) -> Option<&ActiveNote> {
        let NoteRef::Persisted(id) = &self.active.id else {
            return None;
        };
        if remaining.iter().any(|note| &note.id == id) {
            return None;
        }
        Some(self.create_draft(now_ms))
    }

    fn activate(&mut self, note: ActiveNote) -> &ActiveNote {
        self.active = note;
        self.session = SessionId(self.session.0 + 1);
        &self.active
    }
}

#[cfg(test)]
mod tests {
    use super::NoteIdentityManager;
    use crate::model::content::ContentDoc;
    use crate::model::note::{Note, NoteId, NoteRef};

    fn persisted(id: &str, title: &str) -> Note {
        Note {
            id: NoteId::new(id),
            title: title.to_string(),
            content: ContentDoc::from_plain_text("body"),
            created_at: 10,
            updated_at: 20,
        }
    }

    #[test]
    fn create_draft_starts_new_session_with_distinct_id() {
        let mut identity = NoteIdentityManager::new(0);
        let first = identity.active().id.clone();
        let first_session = identity.session();

        let second = identity.create_draft(0).id.clone();
        assert_ne!(first, second);
        assert!(identity.session() > first_session);
    }

    #[test]
    fn promote_keeps_live_fields_and_session() {
        let mut identity = NoteIdentityManager::new(0);
        let NoteRef::Draft(draft_id) = identity.active().id.clone() else {
            panic!("new manager should start on a draft");
        };
        let session = identity.session();
        let live = ContentDoc::from_plain_text("typed during round trip");

        let promoted = identity.promote(
            draft_id,
            &persisted("n1", "sent title"),
            "live title".to_string(),
            live.clone(),
        );

        assert!(promoted);
        let active = identity.active();
        assert_eq!(active.id, NoteRef::Persisted(NoteId::new("n1")));
        assert_eq!(active.title, "live title");
        assert_eq!(active.content, live);
        assert_eq!(active.updated_at, Some(20));
        assert_eq!(identity.session(), session);
    }

    #[test]
    fn promote_is_single_shot() {
        let mut identity = NoteIdentityManager::new(0);
        let NoteRef::Draft(draft_id) = identity.active().id.clone() else {
            panic!("new manager should start on a draft");
        };
        assert!(identity.promote(
            draft_id,
            &persisted("n1", "a"),
            "a".to_string(),
            ContentDoc::empty()
        ));
        assert!(!identity.promote(
            draft_id,
            &persisted("n2", "b"),
            "b".to_string(),
            ContentDoc::empty()
        ));
        assert_eq!(identity.active().id, NoteRef::Persisted(NoteId::new("n1")));
    }

    #[test]
    fn external_deletion_replaces_missing_persisted_note() {
        let mut identity = NoteIdentityManager::new(0);
        identity.select(&persisted("n1", "kept"));
        assert!(identity
            .on_external_deletion(&[persisted("n1", "kept")], 5)
            .is_none());

        let replacement = identity
            .on_external_deletion(&[persisted("n2", "other")], 5)
            .expect("missing active note should be replaced")
            .clone();
        assert!(replacement.id.is_draft());
        assert!(replacement.title.is_empty());
    }

    #[test]
    fn external_deletion_ignores_active_draft() {
        let mut identity = NoteIdentityManager::new(0);
        let draft = identity.active().id.clone();
        assert!(identity.on_external_deletion(&[], 5).is_none());
        assert_eq!(identity.active().id, draft);
    }
}
