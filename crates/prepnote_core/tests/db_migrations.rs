use prepnote_core::db::migrations::{current_version, latest_version};
use prepnote_core::db::{open_store, open_store_from_config, open_store_in_memory, DbError};
use prepnote_core::CoreConfig;
use rusqlite::Connection;

#[test]
fn in_memory_store_applies_all_migrations() {
    let conn = open_store_in_memory().unwrap();

    assert_eq!(current_version(&conn).unwrap(), latest_version());
    assert_table_exists(&conn, "saved_notes");
}

#[test]
fn reopening_the_same_file_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prepnote.db");

    let first = open_store(&path).unwrap();
    first
        .execute(
            "INSERT INTO saved_notes (user_id, collection, name, content, saved_at)
             VALUES ('u-1', 'usermade', 'Draft1', '<p>x</p>', '2026-01-01T00:00:00Z');",
            [],
        )
        .unwrap();
    drop(first);

    let second = open_store(&path).unwrap();
    assert_eq!(current_version(&second).unwrap(), latest_version());
    let rows: i64 = second
        .query_row("SELECT COUNT(*) FROM saved_notes;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn config_store_path_selects_the_store_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("configured.db");
    let config = CoreConfig {
        store_path: Some(path.clone()),
        ..CoreConfig::default()
    };

    let conn = open_store_from_config(&config).unwrap();
    assert_eq!(current_version(&conn).unwrap(), latest_version());
    assert!(path.exists());

    let memory = open_store_from_config(&CoreConfig::default()).unwrap();
    assert_table_exists(&memory, "saved_notes");
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_store(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn schema_rejects_unknown_collections() {
    let conn = open_store_in_memory().unwrap();
    let result = conn.execute(
        "INSERT INTO saved_notes (user_id, collection, name, content, saved_at)
         VALUES ('u-1', 'drafts', 'Draft1', '', '2026-01-01T00:00:00Z');",
        [],
    );
    assert!(result.is_err());
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "expected table `{table_name}` to exist");
}
