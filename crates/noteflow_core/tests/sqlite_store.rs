use noteflow_core::db::migrations::{latest_version, schema_version};
use noteflow_core::db::open_db_in_memory;
use noteflow_core::{
    AutosaveConfig, AutosaveEngine, ContentDoc, FlushOutcome, ManualClock, MemoryEditor, NoteId,
    NotePatch, NoteRef, NoteStore, SqliteNoteStore, StoreError,
};
use rusqlite::params;
use serde_json::json;

#[test]
fn migrations_record_latest_version() {
    let conn = open_db_in_memory().unwrap();
    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    assert!(latest_version() >= 1);
}

#[test]
fn create_update_delete_round_trip() {
    let mut store = SqliteNoteStore::open_in_memory().unwrap();

    let created = store
        .create("Groceries", &ContentDoc::from_plain_text("milk"))
        .unwrap();
    assert!(!created.id.as_str().is_empty());
    assert_eq!(created.created_at, created.updated_at);

    let updated = store
        .update(
            &created.id,
            &NotePatch {
                title: None,
                content: Some(ContentDoc::from_plain_text("milk\neggs")),
            },
        )
        .unwrap();
    assert_eq!(updated.title, "Groceries");
    assert_eq!(updated.content.plain_text(), "milk\neggs");
    assert!(updated.updated_at >= created.updated_at);

    let renamed = store
        .update(
            &created.id,
            &NotePatch {
                title: Some(String::new()),
                content: None,
            },
        )
        .unwrap();
    assert_eq!(renamed.title, "");
    assert_eq!(renamed.content, updated.content);

    store.delete(&created.id).unwrap();
    assert!(store.get(&created.id).unwrap().is_none());
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn unknown_ids_report_not_found() {
    let mut store = SqliteNoteStore::open_in_memory().unwrap();
    let missing = NoteId::new("missing");

    let err = store
        .update(
            &missing,
            &NotePatch {
                title: Some("x".to_string()),
                content: None,
            },
        )
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(store.delete(&missing).unwrap_err().is_not_found());
}

#[test]
fn empty_patch_reads_back_without_touching_timestamps() {
    let mut store = SqliteNoteStore::open_in_memory().unwrap();
    let created = store.create("keep", &ContentDoc::empty()).unwrap();
    store
        .connection()
        .execute(
            "UPDATE notes SET updated_at = 5 WHERE id = ?1;",
            params![created.id.as_str()],
        )
        .unwrap();

    let unchanged = store.update(&created.id, &NotePatch::default()).unwrap();
    assert_eq!(unchanged.updated_at, 5);
    assert_eq!(unchanged.title, "keep");

    let missing = store
        .update(&NoteId::new("missing"), &NotePatch::default())
        .unwrap_err();
    assert!(missing.is_not_found());
}

#[test]
fn malformed_content_is_rejected() {
    let mut store = SqliteNoteStore::open_in_memory().unwrap();
    let err = store
        .create("bad", &ContentDoc::from_value(json!("plain string")))
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn list_orders_by_recency() {
    let mut store = SqliteNoteStore::open_in_memory().unwrap();
    let first = store.create("first", &ContentDoc::empty()).unwrap();
    let second = store.create("second", &ContentDoc::empty()).unwrap();

    store
        .connection()
        .execute(
            "UPDATE notes SET updated_at = ?2 WHERE id = ?1;",
            params![first.id.as_str(), 2_000_i64],
        )
        .unwrap();
    store
        .connection()
        .execute(
            "UPDATE notes SET updated_at = ?2 WHERE id = ?1;",
            params![second.id.as_str(), 1_000_i64],
        )
        .unwrap();

    let titles = store
        .list()
        .unwrap()
        .into_iter()
        .map(|note| note.title)
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["first".to_string(), "second".to_string()]);
}

#[test]
fn corrupt_content_surfaces_as_invalid_data() {
    let mut store = SqliteNoteStore::open_in_memory().unwrap();
    store
        .connection()
        .execute(
            "INSERT INTO notes (id, title, content, created_at, updated_at)
             VALUES ('broken', 't', '{not json', 1, 1);",
            [],
        )
        .unwrap();

    assert!(matches!(
        store.list().unwrap_err(),
        StoreError::InvalidData(_)
    ));
}

#[test]
fn connection_without_notes_table_is_rejected() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    assert!(matches!(
        SqliteNoteStore::try_new(conn),
        Err(StoreError::InvalidData(_))
    ));
}

#[test]
fn engine_persists_draft_to_disk_and_reopens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.db");

    let created_id = {
        let clock = ManualClock::new(0);
        let mut engine = AutosaveEngine::with_clock(
            SqliteNoteStore::open(&path).unwrap(),
            MemoryEditor::default(),
            AutosaveConfig::default(),
            Box::new(clock.clone()),
        );
        engine.start();
        clock.advance(500);

        engine.on_title_changed("Trip");
        engine.on_content_changed(ContentDoc::from_plain_text("passport"));
        clock.advance(1_000);
        let Some(FlushOutcome::Created(id)) = engine.tick() else {
            panic!("content debounce should create the draft");
        };
        id
    };

    let clock = ManualClock::new(0);
    let mut engine = AutosaveEngine::with_clock(
        SqliteNoteStore::open(&path).unwrap(),
        MemoryEditor::default(),
        AutosaveConfig::default(),
        Box::new(clock),
    );
    engine.start();

    assert_eq!(engine.active_ref(), &NoteRef::Persisted(created_id));
    assert_eq!(engine.display_title(), "Trip");
    assert_eq!(engine.active_note().content.plain_text(), "passport");
}
