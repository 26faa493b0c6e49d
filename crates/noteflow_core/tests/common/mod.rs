#![allow(dead_code)]

use noteflow_core::{
    AutosaveConfig, AutosaveEngine, ContentDoc, FlushOutcome, ManualClock, MemoryEditor, Note,
    NoteId, NotePatch, NoteStore, StoreError, StoreResult,
};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    List,
    Create { title: String, content: ContentDoc },
    Update { id: NoteId, patch: NotePatch },
    Delete(NoteId),
}

/// In-memory store that records every call and can fail scripted writes.
#[derive(Debug, Default)]
pub struct MockStore {
    pub notes: Vec<Note>,
    pub calls: Vec<StoreCall>,
    /// Consumed in order by create/update/delete.
    pub write_failures: VecDeque<StoreError>,
    pub fail_next_list: bool,
    next_id: u32,
    now: i64,
}

impl MockStore {
    pub fn with_notes(notes: Vec<Note>) -> Self {
        let now = notes.iter().map(|note| note.updated_at).max().unwrap_or(0);
        Self {
            notes,
            now,
            ..Self::default()
        }
    }

    pub fn remove(&mut self, id: &str) {
        self.notes.retain(|note| note.id.as_str() != id);
    }

    pub fn get(&self, id: &NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| &note.id == id)
    }

    fn stamp(&mut self) -> i64 {
        self.now += 10;
        self.now
    }

    fn scripted_failure(&mut self) -> StoreResult<()> {
        match self.write_failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl NoteStore for MockStore {
    fn list(&mut self) -> StoreResult<Vec<Note>> {
        self.calls.push(StoreCall::List);
        if std::mem::take(&mut self.fail_next_list) {
            return Err(StoreError::Transport("list unavailable".to_string()));
        }
        let mut notes = self.notes.clone();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        Ok(notes)
    }

    fn create(&mut self, title: &str, content: &ContentDoc) -> StoreResult<Note> {
        self.calls.push(StoreCall::Create {
            title: title.to_string(),
            content: content.clone(),
        });
        self.scripted_failure()?;

        self.next_id += 1;
        let now = self.stamp();
        let note = Note {
            id: NoteId::new(format!("n-{}", self.next_id)),
            title: title.to_string(),
            content: content.clone(),
            created_at: now,
            updated_at: now,
        };
        self.notes.push(note.clone());
        Ok(note)
    }

    fn update(&mut self, id: &NoteId, patch: &NotePatch) -> StoreResult<Note> {
        self.calls.push(StoreCall::Update {
            id: id.clone(),
            patch: patch.clone(),
        });
        self.scripted_failure()?;

        let now = self.stamp();
        let note = self
            .notes
            .iter_mut()
            .find(|note| &note.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if let Some(title) = &patch.title {
            note.title = title.clone();
        }
        if let Some(content) = &patch.content {
            note.content = content.clone();
        }
        note.updated_at = now;
        Ok(note.clone())
    }

    fn delete(&mut self, id: &NoteId) -> StoreResult<()> {
        self.calls.push(StoreCall::Delete(id.clone()));
        self.scripted_failure()?;

        let before = self.notes.len();
        self.notes.retain(|note| &note.id != id);
        if self.notes.len() == before {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }
}

pub fn text(value: &str) -> ContentDoc {
    ContentDoc::from_plain_text(value)
}

pub fn note(id: &str, title: &str, body: &str, updated_at: i64) -> Note {
    Note {
        id: NoteId::new(id),
        title: title.to_string(),
        content: text(body),
        created_at: updated_at,
        updated_at,
    }
}

/// Engine wired to a mock store and a manual clock, started and settled.
pub struct Harness {
    pub engine: AutosaveEngine<MockStore, MemoryEditor>,
    pub clock: ManualClock,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(MockStore::default())
    }

    pub fn with_notes(notes: Vec<Note>) -> Self {
        Self::with_store(MockStore::with_notes(notes))
    }

    pub fn with_store(store: MockStore) -> Self {
        let clock = ManualClock::new(0);
        let mut engine = AutosaveEngine::with_clock(
            store,
            MemoryEditor::default(),
            AutosaveConfig::default(),
            Box::new(clock.clone()),
        );
        engine.start();
        let mut harness = Self { engine, clock };
        harness.settle();
        harness
    }

    /// Lets the programmatic echo window close.
    pub fn settle(&mut self) {
        self.clock.advance(500);
    }

    /// User edit: lands in the buffer and fires the change event.
    pub fn type_content(&mut self, body: &str) {
        let doc = text(body);
        self.engine.editor_mut().type_content(doc.clone());
        self.engine.on_content_changed(doc);
    }

    pub fn type_title(&mut self, title: &str) {
        self.engine.on_title_changed(title);
    }

    /// Advances time, then runs one engine tick.
    pub fn advance(&mut self, ms: i64) -> Option<FlushOutcome> {
        self.clock.advance(ms);
        self.engine.tick()
    }

    pub fn store(&self) -> &MockStore {
        self.engine.store()
    }

    pub fn store_mut(&mut self) -> &mut MockStore {
        self.engine.store_mut()
    }

    /// Store calls other than `list`.
    pub fn write_calls(&self) -> Vec<StoreCall> {
        self.store()
            .calls
            .iter()
            .filter(|call| **call != StoreCall::List)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&mut self) {
        self.store_mut().calls.clear();
    }

    pub fn draft_count(&self) -> usize {
        self.engine
            .list_view()
            .iter()
            .filter(|item| item.id.is_draft())
            .count()
    }
}
