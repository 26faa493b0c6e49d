//! Autosave engine: note-editor synchronization state machine.
//!
//! # Responsibility
//! - Bind one active note (draft or persisted) to the editor buffer.
//! - Turn editor/title events into debounced, serialized saves.
//! - Promote drafts on first successful create without losing input typed
//!   during the round trip.
//! - Keep the visible note list optimistic while protecting in-progress
//!   edits from list refreshes.
//!
//! # Invariants
//! - At most one save is in flight for the active note.
//! - At most one draft is visible: the active one.
//! - Storage failures become notifications; no engine call returns an error.
//! - A save completing for a previous session only touches the note list.
//!
//! # Driving the engine
//! The host forwards UI events (`on_content_changed`, `on_title_changed`,
//! `on_blur`, `on_document_click`) and calls `tick` from its event loop so
//! due debounce timers fire. Synchronous adapters use `flush`; hosts with a
//! remote transport use `begin_flush` / `SaveJob::execute` /
//! `complete_flush`.

use crate::autosave::editor::EditorBuffer;
use crate::autosave::guard::UpdateGuard;
use crate::autosave::identity::NoteIdentityManager;
use crate::autosave::notify::{DeletedNote, Notification, NotificationKind};
use crate::autosave::scheduler::{SaveJob, SaveScheduler};
use crate::clock::{Clock, SystemClock};
use crate::config::AutosaveConfig;
use crate::model::content::ContentDoc;
use crate::model::note::{ActiveNote, Note, NoteId, NoteRef};
use crate::repo::note_store::{NoteStore, StoreError, StoreResult};
use log::{debug, error, info, warn};

/// Observable state of the active note slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutosaveState {
    EmptyDraft,
    DirtyDraft,
    SavingCreate,
    Persisted,
    DirtyPersisted,
    SavingUpdate,
}

/// Save intent attached to the active note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveIntent {
    None,
    Pending,
    InFlight,
    Error,
}

/// Result of one flush attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing changed since the last successful save.
    Clean,
    /// A save is already in flight; this flush was dropped.
    Busy,
    /// Content failed validation; nothing was sent.
    Rejected,
    Created(NoteId),
    Updated(NoteId),
    /// Storage reported an error; local state is kept.
    Failed,
}

/// One row of the sidebar note list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteListItem {
    pub id: NoteRef,
    pub title: String,
    pub preview: Option<String>,
    pub updated_at: Option<i64>,
    pub is_active: bool,
}

pub struct AutosaveEngine<S: NoteStore, E: EditorBuffer> {
    store: S,
    editor: E,
    clock: Box<dyn Clock>,
    config: AutosaveConfig,
    identity: NoteIdentityManager,
    scheduler: SaveScheduler,
    guard: UpdateGuard,
    display_title: String,
    notes: Vec<Note>,
    notifications: Vec<Notification>,
}

impl<S: NoteStore, E: EditorBuffer> AutosaveEngine<S, E> {
    /// Creates an engine on the wall clock. Call [`AutosaveEngine::start`]
    /// before forwarding events.
    pub fn new(store: S, editor: E, config: AutosaveConfig) -> Self {
        Self::with_clock(store, editor, config, Box::new(SystemClock))
    }

    pub fn with_clock(store: S, editor: E, config: AutosaveConfig, clock: Box<dyn Clock>) -> Self {
        let now = clock.now_ms();
        Self {
            store,
            editor,
            identity: NoteIdentityManager::new(now),
            scheduler: SaveScheduler::new(&config),
            guard: UpdateGuard::new(&config),
            clock,
            config,
            display_title: String::new(),
            notes: Vec::new(),
            notifications: Vec::new(),
        }
    }

    /// Loads persisted notes and binds the editor: to the first listed note,
    /// or to the initial empty draft when storage has none.
    pub fn start(&mut self) {
        self.reload_list();
        match self.notes.first().map(|note| note.id.clone()) {
            Some(id) => {
                self.select(&id);
            }
            None => self.bind_active(),
        }
        info!(
            "event=engine_start module=autosave status=ok notes={} active={}",
            self.notes.len(),
            self.identity.active().id
        );
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut E {
        &mut self.editor
    }

    pub fn config(&self) -> &AutosaveConfig {
        &self.config
    }

    pub fn active_note(&self) -> &ActiveNote {
        self.identity.active()
    }

    pub fn active_ref(&self) -> &NoteRef {
        &self.identity.active().id
    }

    /// Title as currently shown in the input.
    pub fn display_title(&self) -> &str {
        &self.display_title
    }

    /// Persisted notes with optimistic edits applied.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn is_user_typing(&self) -> bool {
        self.guard.is_user_typing(self.now())
    }

    pub fn is_programmatic_update(&self) -> bool {
        self.guard.is_programmatic_update(self.now())
    }

    pub fn state(&self) -> AutosaveState {
        let active = self.identity.active();
        let saving = self.scheduler.is_saving();
        let dirty = self.scheduler.is_dirty(&self.display_title, &active.content);
        match (active.id.is_draft(), saving, dirty) {
            (true, true, _) => AutosaveState::SavingCreate,
            (true, false, true) => AutosaveState::DirtyDraft,
            (true, false, false) => AutosaveState::EmptyDraft,
            (false, true, _) => AutosaveState::SavingUpdate,
            (false, false, true) => AutosaveState::DirtyPersisted,
            (false, false, false) => AutosaveState::Persisted,
        }
    }

    pub fn save_intent(&self) -> SaveIntent {
        if self.scheduler.is_saving() {
            return SaveIntent::InFlight;
        }
        let dirty = self
            .scheduler
            .is_dirty(&self.display_title, &self.identity.active().content);
        match (dirty, self.scheduler.last_save_failed()) {
            (true, true) => SaveIntent::Error,
            (true, false) => SaveIntent::Pending,
            (false, _) => SaveIntent::None,
        }
    }

    /// Drains queued notifications.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Sidebar rows: the active draft first (if any), then persisted notes.
    pub fn list_view(&self) -> Vec<NoteListItem> {
        let active = self.identity.active();
        let mut items = Vec::with_capacity(self.notes.len() + 1);

        if active.id.is_draft() {
            items.push(NoteListItem {
                id: active.id.clone(),
                title: self.display_title.clone(),
                preview: active.content.preview(),
                updated_at: None,
                is_active: true,
            });
        }

        for note in &self.notes {
            items.push(NoteListItem {
                id: NoteRef::Persisted(note.id.clone()),
                title: note.title.clone(),
                preview: note.content.preview(),
                updated_at: Some(note.updated_at),
                is_active: active.id.persisted_id() == Some(&note.id),
            });
        }
        items
    }

    /// Editor change event.
    ///
    /// Events inside the programmatic settle window are echoes of the
    /// engine's own `set_content` and are ignored.
    pub fn on_content_changed(&mut self, doc: ContentDoc) {
        let now = self.now();
        if self.guard.is_programmatic_update(now) {
            debug!(
                "event=editor_change module=autosave status=ignored reason=echo note={}",
                self.identity.active().id
            );
            return;
        }

        self.identity.active_mut().content = doc;
        let armed = self
            .scheduler
            .on_content_changed(now, &self.identity.active().content);
        self.apply_optimistic_edit();
        debug!(
            "event=editor_change module=autosave status=ok note={} armed={armed}",
            self.identity.active().id
        );
    }

    /// Title input keystroke. The display title updates immediately.
    pub fn on_title_changed(&mut self, title: impl Into<String>) {
        let now = self.now();
        self.display_title = title.into();
        self.guard.note_keystroke(now);
        self.scheduler.on_title_changed(now);
        self.apply_optimistic_edit();
    }

    /// Editor lost focus: cancel pending timers and save right away.
    pub fn on_blur(&mut self) -> FlushOutcome {
        self.scheduler.cancel_timers();

        if !self.guard.is_programmatic_update(self.now()) {
            let live = self.editor.get_content();
            if live != self.identity.active().content {
                debug!(
                    "event=editor_capture module=autosave status=ok note={}",
                    self.identity.active().id
                );
                self.identity.active_mut().content = live;
                self.apply_optimistic_edit();
            }
        }

        self.flush()
    }

    /// Document-level click. Clicks outside the widget root flush like blur.
    pub fn on_document_click(&mut self, inside_widget: bool) -> Option<FlushOutcome> {
        if inside_widget {
            return None;
        }
        Some(self.on_blur())
    }

    /// Fires due debounce timers. Returns the flush outcome when one fired.
    ///
    /// Timers that fire while a save is in flight are re-armed, so edits made
    /// during the round trip get their own save afterwards.
    pub fn tick(&mut self) -> Option<FlushOutcome> {
        let fired = self.scheduler.take_due(self.now());
        if !fired.any() {
            return None;
        }
        debug!(
            "event=debounce_fire module=autosave content={} title={} note={}",
            fired.content,
            fired.title,
            self.identity.active().id
        );
        let outcome = self.flush();
        if outcome == FlushOutcome::Busy {
            self.scheduler.rearm(self.clock.now_ms(), fired);
        }
        Some(outcome)
    }

    /// Saves the active note now if it has unsaved changes.
    pub fn flush(&mut self) -> FlushOutcome {
        let job = match self.prepare_flush() {
            Ok(job) => job,
            Err(outcome) => return outcome,
        };
        let result = job.execute(&mut self.store);
        self.complete_flush(job, result)
    }

    /// First half of a flush: captures a save job and marks it in flight.
    ///
    /// Returns `None` when the note is clean, invalid, or already saving.
    pub fn begin_flush(&mut self) -> Option<SaveJob> {
        self.prepare_flush().ok()
    }

    /// Second half of a flush: reconciles a storage response.
    pub fn complete_flush(&mut self, job: SaveJob, result: StoreResult<Note>) -> FlushOutcome {
        let current = job.session() == self.identity.session();
        match result {
            Ok(note) if job.is_create() => self.finish_create(&job, note, current),
            Ok(note) => self.finish_update(&job, note, current),
            Err(err) => self.fail_save(&job, err, current),
        }
    }

    /// Replaces the active note with a fresh draft.
    ///
    /// Pending edits of the current note are flushed first; an unsaved draft
    /// that cannot be flushed is discarded.
    pub fn create_draft(&mut self) -> NoteRef {
        self.flush_before_switch();
        self.identity.create_draft(self.clock.now_ms());
        self.bind_active();
        info!(
            "event=draft_create module=autosave status=ok note={}",
            self.identity.active().id
        );
        self.identity.active().id.clone()
    }

    /// Activates a persisted note from the current list.
    ///
    /// Returns `false` when `id` is not listed.
    pub fn select(&mut self, id: &NoteId) -> bool {
        if self.identity.active().id.persisted_id() == Some(id) {
            return true;
        }

        self.flush_before_switch();
        let Some(note) = self.notes.iter().find(|note| &note.id == id).cloned() else {
            warn!("event=note_select module=autosave status=error error_code=not_listed note={id}");
            return false;
        };

        self.identity.select(&note);
        self.bind_active();
        info!("event=note_select module=autosave status=ok note={id}");
        true
    }

    /// Deletes a note. Deleting the active note activates a fresh draft.
    ///
    /// A storage not-found counts as success. Returns the data needed for
    /// [`AutosaveEngine::restore`] when a persisted note was removed.
    pub fn delete(&mut self, target: &NoteRef) -> Option<DeletedNote> {
        let is_active = &self.identity.active().id == target;
        let id = match target {
            NoteRef::Draft(_) => {
                if is_active {
                    info!("event=draft_discard module=autosave status=ok note={target}");
                    self.replace_active_with_draft();
                }
                return None;
            }
            NoteRef::Persisted(id) => id.clone(),
        };

        let deleted = if is_active {
            DeletedNote {
                id: id.clone(),
                title: self.display_title.clone(),
                content: self.identity.active().content.clone(),
            }
        } else {
            match self.notes.iter().find(|note| note.id == id) {
                Some(note) => DeletedNote {
                    id: id.clone(),
                    title: note.title.clone(),
                    content: note.content.clone(),
                },
                None => DeletedNote {
                    id: id.clone(),
                    title: String::new(),
                    content: ContentDoc::empty(),
                },
            }
        };

        match self.store.delete(&id) {
            Ok(()) => info!("event=note_delete module=autosave status=ok note={id}"),
            Err(err) if err.is_not_found() => {
                info!("event=note_delete module=autosave status=ok reason=already_gone note={id}")
            }
            Err(err) => {
                error!(
                    "event=note_delete module=autosave status=error note={id} error={err}"
                );
                self.notify(
                    NotificationKind::DeleteFailed,
                    format!("Failed to delete note: {err}"),
                );
                return None;
            }
        }

        self.notes.retain(|note| note.id != id);
        if is_active {
            self.replace_active_with_draft();
        }
        self.notify(NotificationKind::NoteDeleted, "Note deleted");
        self.reload_list();
        Some(deleted)
    }

    /// Undo for [`AutosaveEngine::delete`]: re-creates the note.
    pub fn restore(&mut self, deleted: &DeletedNote) -> Option<NoteId> {
        match self.store.create(&deleted.title, &deleted.content) {
            Ok(note) => {
                info!(
                    "event=note_restore module=autosave status=ok from={} note={}",
                    deleted.id, note.id
                );
                self.notify(NotificationKind::NoteRestored, "Note restored");
                self.reload_list();
                Some(note.id)
            }
            Err(err) => {
                error!(
                    "event=note_restore module=autosave status=error from={} error={err}",
                    deleted.id
                );
                self.notify(
                    NotificationKind::RestoreFailed,
                    format!("Failed to restore note: {err}"),
                );
                None
            }
        }
    }

    /// Re-reads the list from storage and reconciles the active note.
    /// Returns `false` when storage failed.
    pub fn reload_list(&mut self) -> bool {
        match self.store.list() {
            Ok(notes) => {
                self.apply_list(notes);
                true
            }
            Err(err) => {
                error!("event=list_reload module=autosave status=error error={err}");
                self.notify(
                    NotificationKind::LoadFailed,
                    format!("Failed to load notes: {err}"),
                );
                false
            }
        }
    }

    /// Reconciles an externally delivered list of persisted notes.
    ///
    /// - Active note missing: replaced by a fresh draft.
    /// - Title: adopted from storage unless the user is typing, a save is in
    ///   flight, or the live title is unsaved.
    /// - Content: adopted unless a save is in flight, an edit is waiting on
    ///   the content timer, or the live content is unsaved.
    pub fn apply_list(&mut self, notes: Vec<Note>) {
        let now = self.now();
        self.notes = notes;

        if self
            .identity
            .on_external_deletion(&self.notes, now)
            .is_some()
        {
            info!(
                "event=list_reload module=autosave status=ok reason=active_removed note={}",
                self.identity.active().id
            );
            self.bind_active();
            return;
        }

        let Some(id) = self.identity.active().id.persisted_id().cloned() else {
            return;
        };
        if let Some(server) = self.notes.iter().find(|note| note.id == id).cloned() {
            self.reconcile_active(server, now);
        }
    }

    fn reconcile_active(&mut self, server: Note, now: i64) {
        let saving = self.scheduler.is_saving();

        let title_busy = saving
            || self.guard.is_user_typing(now)
            || self.scheduler.title_differs(&self.display_title);
        if title_busy {
            debug!(
                "event=list_reload module=autosave status=ok title=kept note={}",
                server.id
            );
        } else if self.display_title != server.title {
            self.display_title = server.title.clone();
            self.identity.active_mut().title = server.title.clone();
            self.scheduler.accept_title(&server.title);
        }

        let content_busy = saving
            || self.scheduler.content_timer_armed()
            || self
                .scheduler
                .content_differs(&self.identity.active().content);
        if content_busy {
            debug!(
                "event=list_reload module=autosave status=ok content=kept note={}",
                server.id
            );
        } else if server.content != self.identity.active().content {
            self.scheduler.accept_content(&server.content);
            self.identity.active_mut().content = server.content.clone();
            self.guard.mark_programmatic(now);
            self.editor.set_content(&server.content);
            debug!(
                "event=list_reload module=autosave status=ok content=adopted note={}",
                server.id
            );
        }

        let active = self.identity.active_mut();
        active.created_at = Some(server.created_at);
        active.updated_at = Some(server.updated_at);
        self.apply_optimistic_edit();
    }

    fn prepare_flush(&mut self) -> Result<SaveJob, FlushOutcome> {
        if self.scheduler.is_saving() {
            debug!(
                "event=autosave_flush module=autosave status=dropped reason=in_flight note={}",
                self.identity.active().id
            );
            return Err(FlushOutcome::Busy);
        }

        self.identity.active_mut().title = self.display_title.clone();
        let active = self.identity.active();
        if !self.scheduler.is_dirty(&self.display_title, &active.content) {
            return Err(FlushOutcome::Clean);
        }

        if let Err(err) = active.content.validate() {
            warn!(
                "event=autosave_flush module=autosave status=rejected note={} error={err}",
                active.id
            );
            self.notify(
                NotificationKind::InvalidContent,
                format!("Cannot save note: {err}"),
            );
            return Err(FlushOutcome::Rejected);
        }

        let active = self.identity.active();
        let job = self
            .scheduler
            .begin(
                self.identity.session(),
                &active.id,
                &self.display_title,
                &active.content,
                &self.config.untitled_title,
            )
            .ok_or(FlushOutcome::Busy)?;
        info!(
            "event=autosave_flush module=autosave status=start note={} op={}",
            job.target(),
            if job.is_create() { "create" } else { "update" }
        );
        Ok(job)
    }

    fn finish_create(&mut self, job: &SaveJob, note: Note, current: bool) -> FlushOutcome {
        let id = note.id.clone();
        if current {
            if let NoteRef::Draft(draft_id) = job.target() {
                let live_title = if self.display_title == job.sent_title() {
                    note.title.clone()
                } else {
                    self.display_title.clone()
                };
                let live_content = self.identity.active().content.clone();
                self.identity
                    .promote(*draft_id, &note, live_title.clone(), live_content);
                self.display_title = live_title;
            }
            self.scheduler
                .complete_success(&note.title, job.sent_content());
        }

        info!(
            "event=autosave_flush module=autosave status=ok op=create draft={} note={id} current={current}",
            job.target()
        );
        self.notify(NotificationKind::NoteCreated, "Note created");
        self.reload_list();
        FlushOutcome::Created(id)
    }

    fn finish_update(&mut self, job: &SaveJob, note: Note, current: bool) -> FlushOutcome {
        let id = note.id.clone();
        if current {
            self.scheduler
                .complete_success(job.sent_title(), job.sent_content());
            let active = self.identity.active_mut();
            active.created_at = Some(note.created_at);
            active.updated_at = Some(note.updated_at);
        }

        if let Some(entry) = self.notes.iter_mut().find(|entry| entry.id == id) {
            *entry = note;
        }
        self.apply_optimistic_edit();

        info!(
            "event=autosave_flush module=autosave status=ok op=update note={id} current={current}"
        );
        self.notify(NotificationKind::NoteSaved, "Note saved");
        FlushOutcome::Updated(id)
    }

    fn fail_save(&mut self, job: &SaveJob, err: StoreError, current: bool) -> FlushOutcome {
        if current {
            self.scheduler.complete_failure();
        }

        let (kind, op) = if job.is_create() {
            (NotificationKind::CreateFailed, "create")
        } else {
            (NotificationKind::SaveFailed, "update")
        };
        error!(
            "event=autosave_flush module=autosave status=error op={op} note={} current={current} error={err}",
            job.target()
        );

        let message = match &err {
            StoreError::NotFound(id) => {
                format!("Note {id} no longer exists; save again to keep your changes")
            }
            StoreError::Validation(details) => format!("Note was rejected: {details}"),
            other => format!("Failed to save note: {other}"),
        };
        self.notify(kind, message);
        FlushOutcome::Failed
    }

    fn flush_before_switch(&mut self) {
        self.scheduler.cancel_timers();
        let outcome = self.flush();
        let active = self.identity.active();
        if active.id.is_draft()
            && matches!(outcome, FlushOutcome::Failed | FlushOutcome::Rejected)
        {
            warn!(
                "event=draft_discard module=autosave status=lost note={} outcome={outcome:?}",
                active.id
            );
        }
    }

    fn replace_active_with_draft(&mut self) {
        self.identity.create_draft(self.clock.now_ms());
        self.bind_active();
    }

    /// Starts a clean session for the newly active note and pushes its
    /// content into the editor inside the echo window.
    fn bind_active(&mut self) {
        let now = self.now();
        let active = self.identity.active();
        let title = active.title.clone();
        let content = active.content.clone();

        self.scheduler.reset_baseline(&title, &content);
        self.display_title = title;
        self.guard.clear_typing();
        self.guard.mark_programmatic(now);
        self.editor.set_content(&content);
    }

    /// Mirrors the live title/content of the active persisted note into its
    /// list entry so the sidebar updates before storage confirms.
    fn apply_optimistic_edit(&mut self) {
        let active = self.identity.active();
        let NoteRef::Persisted(id) = &active.id else {
            return;
        };
        if let Some(entry) = self.notes.iter_mut().find(|entry| &entry.id == id) {
            entry.title = self.display_title.clone();
            entry.content = active.content.clone();
        }
    }

    fn notify(&mut self, kind: NotificationKind, message: impl Into<String>) {
        self.notifications.push(Notification::new(kind, message));
    }

    fn now(&self) -> i64 {
        self.clock.now_ms()
    }
}
