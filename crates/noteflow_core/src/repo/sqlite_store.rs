//! SQLite-backed note store (local device storage).
//!
//! # Responsibility
//! - Persist note records in the `notes` table.
//! - Assign stable uuid identifiers on create.
//!
//! # Invariants
//! - Writes validate content structure before touching SQL.
//! - `updated_at` never moves backwards for one note; an empty patch leaves
//!   it untouched.
//! - Listing order is `updated_at DESC, id ASC`.

use crate::clock::now_epoch_ms;
use crate::db::{open_db, open_db_in_memory};
use crate::model::content::ContentDoc;
use crate::model::note::{Note, NoteId, NotePatch};
use crate::repo::note_store::{NoteStore, StoreError, StoreResult};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use uuid::Uuid;

const NOTE_SELECT_SQL: &str = "SELECT id, title, content, created_at, updated_at FROM notes";
const REQUIRED_COLUMNS: [&str; 5] = ["id", "title", "content", "created_at", "updated_at"];

/// Note store over one migrated SQLite connection.
pub struct SqliteNoteStore {
    conn: Connection,
}

impl SqliteNoteStore {
    /// Wraps a migrated connection after checking the `notes` schema.
    pub fn try_new(conn: Connection) -> StoreResult<Self> {
        ensure_connection_ready(&conn)?;
        Ok(Self { conn })
    }

    /// Opens a database file, applying migrations first.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::try_new(open_db(path)?)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Gets one note by id.
    pub fn get(&self, id: &NoteId) -> StoreResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
        let raw = stmt.query_row([id.as_str()], raw_note_row).optional()?;
        raw.map(RawNoteRow::into_note).transpose()
    }

    fn read_back(&self, id: &NoteId) -> StoreResult<Note> {
        self.get(id)?.ok_or_else(|| {
            StoreError::InvalidData(format!("note `{id}` missing after write read-back"))
        })
    }
}

impl NoteStore for SqliteNoteStore {
    fn list(&mut self) -> StoreResult<Vec<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} ORDER BY updated_at DESC, id ASC;"))?;
        let rows = stmt.query_map([], raw_note_row)?;

        let mut notes = Vec::new();
        for raw in rows {
            notes.push(raw?.into_note()?);
        }
        Ok(notes)
    }

    fn create(&mut self, title: &str, content: &ContentDoc) -> StoreResult<Note> {
        content.validate()?;

        let id = NoteId::new(Uuid::new_v4().to_string());
        let now = now_epoch_ms();
        self.conn.execute(
            "INSERT INTO notes (id, title, content, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4);",
            params![id.as_str(), title, content.to_snapshot(), now],
        )?;
        debug!("event=store_create module=store status=ok note={id}");

        self.read_back(&id)
    }

    fn update(&mut self, id: &NoteId, patch: &NotePatch) -> StoreResult<Note> {
        if patch.is_empty() {
            return self.get(id)?.ok_or_else(|| StoreError::NotFound(id.clone()));
        }
        if let Some(content) = patch.content.as_ref() {
            content.validate()?;
        }

        let changed = self.conn.execute(
            "UPDATE notes
             SET
                title = COALESCE(?2, title),
                content = COALESCE(?3, content),
                updated_at = MAX(updated_at, ?4)
             WHERE id = ?1;",
            params![
                id.as_str(),
                patch.title.as_deref(),
                patch.content.as_ref().map(ContentDoc::to_snapshot),
                now_epoch_ms(),
            ],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(id.clone()));
        }
        debug!(
            "event=store_update module=store status=ok note={id} title={} content={}",
            patch.title.is_some(),
            patch.content.is_some()
        );

        self.read_back(id)
    }

    fn delete(&mut self, id: &NoteId) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?1;", [id.as_str()])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.clone()));
        }
        debug!("event=store_delete module=store status=ok note={id}");
        Ok(())
    }
}

struct RawNoteRow {
    id: String,
    title: String,
    content: String,
    created_at: i64,
    updated_at: i64,
}

impl RawNoteRow {
    fn into_note(self) -> StoreResult<Note> {
        let value = serde_json::from_str(&self.content).map_err(|err| {
            StoreError::InvalidData(format!("invalid content json for note `{}`: {err}", self.id))
        })?;
        Ok(Note {
            id: NoteId::new(self.id),
            title: self.title,
            content: ContentDoc::from_value(value),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn raw_note_row(row: &Row<'_>) -> rusqlite::Result<RawNoteRow> {
    Ok(RawNoteRow {
        id: row.get("id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn ensure_connection_ready(conn: &Connection) -> StoreResult<()> {
    let mut stmt = conn.prepare("PRAGMA table_info(notes);")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    if columns.is_empty() {
        return Err(StoreError::InvalidData(
            "missing required table `notes`".to_string(),
        ));
    }

    for required in REQUIRED_COLUMNS {
        if !columns.iter().any(|column| column == required) {
            return Err(StoreError::InvalidData(format!(
                "missing required column `notes.{required}`"
            )));
        }
    }
    Ok(())
}
