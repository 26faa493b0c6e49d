//! Debounced save scheduling for the active note.
//!
//! # Responsibility
//! - Coalesce content and title edits into debounced flushes.
//! - Track last-saved snapshots so unchanged state never hits storage.
//! - Serialize saves: at most one in flight per active note.
//! - Decide between create (draft) and partial update (persisted).
//!
//! # Invariants
//! - Content and title timers are independent; arming one never resets the
//!   other.
//! - `is_saving` is cleared on every completion path, success or failure.
//! - The untitled fallback applies to creates only.

use crate::autosave::identity::SessionId;
use crate::autosave::timer::DebounceTimer;
use crate::config::AutosaveConfig;
use crate::model::content::ContentDoc;
use crate::model::note::{Note, NoteId, NotePatch, NoteRef};
use crate::repo::note_store::{NoteStore, StoreResult};

/// Storage operation chosen for one flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOp {
    Create { title: String, content: ContentDoc },
    Update { id: NoteId, patch: NotePatch },
}

/// Which debounce timers fired during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FiredTimers {
    pub content: bool,
    pub title: bool,
}

impl FiredTimers {
    pub fn any(self) -> bool {
        self.content || self.title
    }
}

/// One save round trip, captured at flush time.
///
/// Carries everything needed to reconcile the response even if the user
/// kept typing or switched notes while it was in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveJob {
    session: SessionId,
    target: NoteRef,
    op: SaveOp,
    sent_title: String,
    sent_content: String,
}

impl SaveJob {
    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn target(&self) -> &NoteRef {
        &self.target
    }

    pub fn op(&self) -> &SaveOp {
        &self.op
    }

    pub fn is_create(&self) -> bool {
        matches!(self.op, SaveOp::Create { .. })
    }

    /// Display title at flush time, before any untitled substitution.
    pub fn sent_title(&self) -> &str {
        &self.sent_title
    }

    /// Content snapshot at flush time.
    pub fn sent_content(&self) -> &str {
        &self.sent_content
    }

    /// Performs the storage call for this job.
    pub fn execute<S: NoteStore + ?Sized>(&self, store: &mut S) -> StoreResult<Note> {
        match &self.op {
            SaveOp::Create { title, content } => store.create(title, content),
            SaveOp::Update { id, patch } => store.update(id, patch),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SaveScheduler {
    content_timer: DebounceTimer,
    title_timer: DebounceTimer,
    content_delay_ms: u64,
    title_delay_ms: u64,
    last_saved_content: String,
    last_saved_title: String,
    is_saving: bool,
    last_failed: bool,
}

impl SaveScheduler {
    /// Baseline is an empty draft.
    pub fn new(config: &AutosaveConfig) -> Self {
        Self {
            content_timer: DebounceTimer::new(),
            title_timer: DebounceTimer::new(),
            content_delay_ms: config.content_debounce_ms,
            title_delay_ms: config.title_debounce_ms,
            last_saved_content: ContentDoc::empty().to_snapshot(),
            last_saved_title: String::new(),
            is_saving: false,
            last_failed: false,
        }
    }

    /// Starts tracking a newly activated note from a clean state.
    pub fn reset_baseline(&mut self, title: &str, content: &ContentDoc) {
        self.cancel_timers();
        self.last_saved_title = title.to_string();
        self.last_saved_content = content.to_snapshot();
        self.is_saving = false;
        self.last_failed = false;
    }

    /// Arms the content timer unless `content` matches the saved snapshot.
    /// Returns whether the timer is armed afterwards.
    pub fn on_content_changed(&mut self, now_ms: i64, content: &ContentDoc) -> bool {
        self.last_failed = false;
        if content.to_snapshot() == self.last_saved_content {
            self.content_timer.cancel();
            return false;
        }
        self.content_timer.arm(now_ms, self.content_delay_ms);
        true
    }

    pub fn on_title_changed(&mut self, now_ms: i64) {
        self.last_failed = false;
        self.title_timer.arm(now_ms, self.title_delay_ms);
    }

    /// Disarms and reports every timer whose deadline has passed.
    pub fn take_due(&mut self, now_ms: i64) -> FiredTimers {
        FiredTimers {
            content: self.content_timer.fire_if_due(now_ms),
            title: self.title_timer.fire_if_due(now_ms),
        }
    }

    /// Re-arms the timers in `fired` with their full delay.
    pub fn rearm(&mut self, now_ms: i64, fired: FiredTimers) {
        if fired.content {
            self.content_timer.arm(now_ms, self.content_delay_ms);
        }
        if fired.title {
            self.title_timer.arm(now_ms, self.title_delay_ms);
        }
    }

    pub fn cancel_timers(&mut self) {
        self.content_timer.cancel();
        self.title_timer.cancel();
    }

    pub fn has_pending_timer(&self) -> bool {
        self.content_timer.is_armed() || self.title_timer.is_armed()
    }

    pub fn content_timer_armed(&self) -> bool {
        self.content_timer.is_armed()
    }

    pub fn is_saving(&self) -> bool {
        self.is_saving
    }

    pub fn last_save_failed(&self) -> bool {
        self.last_failed
    }

    pub fn title_differs(&self, title: &str) -> bool {
        title != self.last_saved_title
    }

    pub fn content_differs(&self, content: &ContentDoc) -> bool {
        content.to_snapshot() != self.last_saved_content
    }

    pub fn is_dirty(&self, title: &str, content: &ContentDoc) -> bool {
        self.title_differs(title) || self.content_differs(content)
    }

    /// Captures a save job and marks a save in flight.
    ///
    /// Returns `None` when a save is already running; the caller drops the
    /// flush instead of queueing it.
    pub fn begin(
        &mut self,
        session: SessionId,
        target: &NoteRef,
        title: &str,
        content: &ContentDoc,
        untitled_title: &str,
    ) -> Option<SaveJob> {
        if self.is_saving {
            return None;
        }

        let op = match target {
            NoteRef::Draft(_) => SaveOp::Create {
                title: create_title(title, untitled_title),
                content: content.clone(),
            },
            NoteRef::Persisted(id) => SaveOp::Update {
                id: id.clone(),
                patch: NotePatch {
                    title: self.title_differs(title).then(|| title.to_string()),
                    content: self.content_differs(content).then(|| content.clone()),
                },
            },
        };

        self.is_saving = true;
        Some(SaveJob {
            session,
            target: target.clone(),
            op,
            sent_title: title.to_string(),
            sent_content: content.to_snapshot(),
        })
    }

    /// Records a successful save of the given snapshots and clears the
    /// in-flight flag.
    pub fn complete_success(&mut self, saved_title: &str, saved_content: &str) {
        self.is_saving = false;
        self.last_failed = false;
        self.last_saved_title = saved_title.to_string();
        self.last_saved_content = saved_content.to_string();
    }

    /// Clears the in-flight flag after a failed save; snapshots are kept so
    /// the note stays dirty. The failure mark lasts until the next edit.
    pub fn complete_failure(&mut self) {
        self.is_saving = false;
        self.last_failed = true;
    }

    /// Adopts storage-side values as the new saved baseline.
    pub fn accept_title(&mut self, title: &str) {
        self.last_saved_title = title.to_string();
    }

    pub fn accept_content(&mut self, content: &ContentDoc) {
        self.last_saved_content = content.to_snapshot();
    }
}

/// Title sent with a create call: blank titles become `untitled_title`.
pub fn create_title(title: &str, untitled_title: &str) -> String {
    if title.trim().is_empty() {
        untitled_title.to_string()
    } else {
        title.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{create_title, SaveOp, SaveScheduler};
    use crate::autosave::identity::NoteIdentityManager;
    use crate::config::AutosaveConfig;
    use crate::model::content::ContentDoc;
    use crate::model::note::{NoteId, NotePatch, NoteRef};

    fn scheduler() -> SaveScheduler {
        SaveScheduler::new(&AutosaveConfig::default())
    }

    #[test]
    fn unchanged_content_does_not_arm() {
        let mut scheduler = scheduler();
        assert!(!scheduler.on_content_changed(0, &ContentDoc::empty()));
        assert!(!scheduler.has_pending_timer());
    }

    #[test]
    fn content_and_title_timers_fire_independently() {
        let mut scheduler = scheduler();
        assert!(scheduler.on_content_changed(0, &ContentDoc::from_plain_text("a")));
        scheduler.on_title_changed(500);

        let fired = scheduler.take_due(1_000);
        assert!(fired.content);
        assert!(!fired.title);

        let fired = scheduler.take_due(2_500);
        assert!(!fired.content);
        assert!(fired.title);
        assert!(!scheduler.take_due(10_000).any());
    }

    #[test]
    fn draft_create_substitutes_untitled_title() {
        let mut scheduler = scheduler();
        let identity = NoteIdentityManager::new(0);
        let job = scheduler
            .begin(
                identity.session(),
                &identity.active().id,
                "   ",
                &ContentDoc::from_plain_text("body"),
                "Untitled Note",
            )
            .expect("idle scheduler should start a job");

        assert_eq!(
            job.op(),
            &SaveOp::Create {
                title: "Untitled Note".to_string(),
                content: ContentDoc::from_plain_text("body"),
            }
        );
        assert_eq!(job.sent_title(), "   ");
        assert!(scheduler.is_saving());
    }

    #[test]
    fn update_patch_carries_only_changed_fields() {
        let mut scheduler = scheduler();
        let content = ContentDoc::from_plain_text("x");
        scheduler.reset_baseline("Old", &content);
        let identity = NoteIdentityManager::new(0);

        let job = scheduler
            .begin(
                identity.session(),
                &NoteRef::Persisted(NoteId::new("n1")),
                "",
                &content,
                "Untitled Note",
            )
            .expect("idle scheduler should start a job");

        assert_eq!(
            job.op(),
            &SaveOp::Update {
                id: NoteId::new("n1"),
                patch: NotePatch {
                    title: Some(String::new()),
                    content: None,
                },
            }
        );
    }

    #[test]
    fn second_begin_while_saving_is_dropped() {
        let mut scheduler = scheduler();
        let identity = NoteIdentityManager::new(0);
        let content = ContentDoc::from_plain_text("a");
        let target = identity.active().id.clone();

        assert!(scheduler
            .begin(identity.session(), &target, "t", &content, "Untitled Note")
            .is_some());
        assert!(scheduler
            .begin(identity.session(), &target, "t", &content, "Untitled Note")
            .is_none());

        scheduler.complete_failure();
        assert!(!scheduler.is_saving());
        assert!(scheduler.last_save_failed());
        assert!(scheduler.is_dirty("t", &content));
    }

    #[test]
    fn edit_after_failure_clears_failure_mark() {
        let mut scheduler = scheduler();
        let identity = NoteIdentityManager::new(0);
        let content = ContentDoc::from_plain_text("a");
        scheduler
            .begin(identity.session(), &identity.active().id, "", &content, "Untitled Note")
            .unwrap();
        scheduler.complete_failure();
        assert!(scheduler.last_save_failed());

        scheduler.on_title_changed(10);
        assert!(!scheduler.last_save_failed());
    }

    #[test]
    fn rearm_restores_only_fired_timers() {
        let mut scheduler = scheduler();
        scheduler.on_content_changed(0, &ContentDoc::from_plain_text("a"));
        let fired = scheduler.take_due(1_000);
        assert!(fired.content);
        assert!(!scheduler.has_pending_timer());

        scheduler.rearm(1_000, fired);
        assert!(scheduler.content_timer_armed());
        assert!(!scheduler.take_due(1_999).any());
        assert!(scheduler.take_due(2_000).content);
    }

    #[test]
    fn success_moves_baseline() {
        let mut scheduler = scheduler();
        let content = ContentDoc::from_plain_text("saved");
        scheduler.complete_success("title", &content.to_snapshot());
        assert!(!scheduler.is_dirty("title", &content));
        assert!(scheduler.is_dirty("title 2", &content));
    }

    #[test]
    fn create_title_keeps_non_blank_input_verbatim() {
        assert_eq!(create_title(" Groceries ", "Untitled Note"), " Groceries ");
        assert_eq!(create_title("", "Untitled Note"), "Untitled Note");
    }
}
