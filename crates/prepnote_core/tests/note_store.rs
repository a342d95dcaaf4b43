use prepnote_core::db::open_store_in_memory;
use prepnote_core::{
    Collection, Command, DocumentPosition, EditorSession, NoteFormat, NoteLibrary, NoteMetadata, NoteStore,
    NoteTheme, SavedDocument, SelectionState, SqliteNoteStore, StoreError, UserId,
};
use rusqlite::Connection;

fn user(id: &str) -> UserId {
    UserId::new(id).unwrap()
}

fn library(conn: &Connection) -> NoteLibrary<SqliteNoteStore<'_>> {
    NoteLibrary::with_user(SqliteNoteStore::new(conn), user("u-1"))
}

#[test]
fn saving_the_same_name_twice_keeps_the_latest_content() {
    let conn = open_store_in_memory().unwrap();
    let library = library(&conn);

    library
        .save(Collection::UserMade, "Draft1", "<p>first</p>", NoteMetadata::default())
        .unwrap();
    let second = library
        .save(Collection::UserMade, " Draft1 ", "<p>second</p>", NoteMetadata::default())
        .unwrap();

    let notes = library.list(Collection::UserMade).unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].name, "Draft1");
    assert_eq!(notes[0].content, "<p>second</p>");
    assert_eq!(notes[0].saved_at, second.saved_at);
}

#[test]
fn collections_and_users_are_isolated() {
    let conn = open_store_in_memory().unwrap();
    let store = SqliteNoteStore::new(&conn);
    let record = SavedDocument::new("Draft1", "<p>x</p>", NoteMetadata::default());

    store.save(&user("u-1"), Collection::UserMade, &record).unwrap();

    assert_eq!(store.list(&user("u-1"), Collection::UserMade).unwrap().len(), 1);
    assert!(store.list(&user("u-1"), Collection::AiNotes).unwrap().is_empty());
    assert!(store.list(&user("u-2"), Collection::UserMade).unwrap().is_empty());
}

#[test]
fn list_is_newest_first_then_by_name() {
    let conn = open_store_in_memory().unwrap();
    let store = SqliteNoteStore::new(&conn);
    let owner = user("u-1");
    let mut older = SavedDocument::new("b-old", "", NoteMetadata::default());
    older.saved_at = "2026-01-01T00:00:00Z".parse().unwrap();
    let mut tie_b = SavedDocument::new("b", "", NoteMetadata::default());
    tie_b.saved_at = "2026-02-01T00:00:00Z".parse().unwrap();
    let mut tie_a = tie_b.clone();
    tie_a.name = "a".to_string();

    for record in [&older, &tie_b, &tie_a] {
        store.save(&owner, Collection::UserMade, record).unwrap();
    }

    let names: Vec<String> = store
        .list(&owner, Collection::UserMade)
        .unwrap()
        .into_iter()
        .map(|note| note.name)
        .collect();
    assert_eq!(names, vec!["a", "b", "b-old"]);
}

#[test]
fn ai_notes_keep_metadata_and_user_notes_drop_it() {
    let conn = open_store_in_memory().unwrap();
    let library = library(&conn);
    let metadata = NoteMetadata {
        format: Some(NoteFormat::Flashcard),
        theme: Some(NoteTheme::Minimal),
        topic: Some("Graphs".to_string()),
    };

    library
        .save(Collection::AiNotes, "Graphs", "<p>g</p>", metadata.clone())
        .unwrap();
    library
        .save(Collection::UserMade, "Graphs", "<p>g</p>", metadata.clone())
        .unwrap();

    let ai = library.load(Collection::AiNotes, "Graphs").unwrap().unwrap();
    assert_eq!(ai.metadata, metadata);
    let mine = library.load(Collection::UserMade, "Graphs").unwrap().unwrap();
    assert!(mine.metadata.is_empty());
}

#[test]
fn signed_out_library_is_unauthenticated() {
    let conn = open_store_in_memory().unwrap();
    let mut library = library(&conn);
    library.sign_out();

    let err = library
        .save(Collection::UserMade, "Draft1", "<p>x</p>", NoteMetadata::default())
        .unwrap_err();
    assert!(matches!(err, StoreError::Unauthenticated));
    assert!(matches!(
        library.load(Collection::UserMade, "Draft1"),
        Err(StoreError::Unauthenticated)
    ));
}

#[test]
fn delete_is_idempotent() {
    let conn = open_store_in_memory().unwrap();
    let library = library(&conn);
    library
        .save(Collection::UserMade, "Draft1", "<p>x</p>", NoteMetadata::default())
        .unwrap();

    assert!(library.delete(Collection::UserMade, "Draft1").unwrap());
    assert!(!library.delete(Collection::UserMade, "Draft1").unwrap());
    assert!(library.load(Collection::UserMade, "Draft1").unwrap().is_none());
}

#[test]
fn sessions_save_into_their_collection_and_reopen() {
    let conn = open_store_in_memory().unwrap();
    let library = library(&conn);

    let mut session = EditorSession::user_notes();
    session.dispatch(Command::InsertPlainText("Queues are FIFO".into()));
    let saved = library
        .save_session("Queues", &session, NoteMetadata::default())
        .unwrap();
    assert_eq!(saved.content, "<p>Queues are FIFO</p>");

    let mut reopened = EditorSession::user_notes();
    assert!(library.open_in(&mut reopened, "Queues").unwrap());
    assert_eq!(reopened.document(), session.document());
    assert!(!reopened.can_undo());

    let mut ai = EditorSession::ai_notes();
    assert!(!library.open_in(&mut ai, "Queues").unwrap());
}

#[test]
fn record_shape_uses_date_and_omits_empty_metadata() {
    let mut record = SavedDocument::new("Draft1", "<p>x</p>", NoteMetadata::default());
    record.saved_at = "2026-05-04T03:02:01Z".parse().unwrap();

    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "name": "Draft1",
            "content": "<p>x</p>",
            "date": "2026-05-04T03:02:01Z"
        })
    );

    let mut ai = record.clone();
    ai.metadata.format = Some(NoteFormat::Bullet);
    ai.metadata.theme = Some(NoteTheme::Classic);
    let value = serde_json::to_value(&ai).unwrap();
    assert_eq!(value["format"], "bullet");
    assert_eq!(value["theme"], "classic");
    assert!(value.get("topic").is_none());

    let back: SavedDocument = serde_json::from_value(value).unwrap();
    assert_eq!(back, ai);
}

#[test]
fn reopened_session_keeps_spaces_at_block_edges() {
    let conn = open_store_in_memory().unwrap();
    let library = library(&conn);

    let mut session = EditorSession::user_notes();
    session.dispatch(Command::InsertPlainText("A stack is  LIFO storage.".into()));
    session
        .select(SelectionState::new(
            DocumentPosition::new(0, 2),
            DocumentPosition::new(0, 7),
        ))
        .unwrap();
    session.dispatch(Command::InsertDefinitionBlock);
    assert_eq!(session.document().plain_text(), "A \nstack\n is  LIFO storage.");

    library
        .save_session("Stacks", &session, NoteMetadata::default())
        .unwrap();
    let mut reopened = EditorSession::user_notes();
    assert!(library.open_in(&mut reopened, "Stacks").unwrap());
    assert_eq!(reopened.document(), session.document());
}
