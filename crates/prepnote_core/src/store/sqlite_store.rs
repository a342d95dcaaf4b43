//! SQLite implementation of `NoteStore`.

use super::{NoteStore, StoreError, StoreResult};
use crate::db::DbError;
use crate::model::saved::{
    Collection, NoteFormat, NoteMetadata, NoteTheme, SavedDocument, UserId,
};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

const NOTE_SELECT_SQL: &str = "SELECT
    name,
    content,
    format,
    theme,
    topic,
    saved_at
FROM saved_notes";

/// Row as read from SQLite, before validation.
struct RawNote {
    name: String,
    content: String,
    format: Option<String>,
    theme: Option<String>,
    topic: Option<String>,
    saved_at: String,
}

/// Note store over a borrowed SQLite connection.
pub struct SqliteNoteStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteStore<'conn> {
    /// `conn` must come from `db::open_store*` so the schema is in place.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NoteStore for SqliteNoteStore<'_> {
    fn save(
        &self,
        user: &UserId,
        collection: Collection,
        document: &SavedDocument,
    ) -> StoreResult<()> {
        self.conn
            .execute(
                "INSERT INTO saved_notes (
                    user_id,
                    collection,
                    name,
                    content,
                    format,
                    theme,
                    topic,
                    saved_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT (user_id, collection, name) DO UPDATE SET
                    content = excluded.content,
                    format = excluded.format,
                    theme = excluded.theme,
                    topic = excluded.topic,
                    saved_at = excluded.saved_at;",
                params![
                    user.as_str(),
                    collection.as_str(),
                    document.name.as_str(),
                    document.content.as_str(),
                    document.metadata.format.map(NoteFormat::as_str),
                    document.metadata.theme.map(NoteTheme::as_str),
                    document.metadata.topic.as_deref(),
                    timestamp_to_db(&document.saved_at),
                ],
            )
            .map_err(|err| StoreError::Write(DbError::from(err)))?;
        Ok(())
    }

    fn list(&self, user: &UserId, collection: Collection) -> StoreResult<Vec<SavedDocument>> {
        let sql = format!(
            "{NOTE_SELECT_SQL}
             WHERE user_id = ?1 AND collection = ?2
             ORDER BY saved_at DESC, name ASC;"
        );
        let rows = self
            .conn
            .prepare(&sql)
            .and_then(|mut stmt| {
                let rows = stmt
                    .query_map(params![user.as_str(), collection.as_str()], read_row)?
                    .collect::<rusqlite::Result<Vec<_>>>();
                rows
            })
            .map_err(|err| StoreError::Read(DbError::from(err)))?;

        rows.into_iter().map(parse_note).collect()
    }

    fn get(
        &self,
        user: &UserId,
        collection: Collection,
        name: &str,
    ) -> StoreResult<Option<SavedDocument>> {
        let sql = format!(
            "{NOTE_SELECT_SQL}
             WHERE user_id = ?1 AND collection = ?2 AND name = ?3;"
        );
        self.conn
            .query_row(
                &sql,
                params![user.as_str(), collection.as_str(), name],
                read_row,
            )
            .optional()
            .map_err(|err| StoreError::Read(DbError::from(err)))?
            .map(parse_note)
            .transpose()
    }

    fn delete(&self, user: &UserId, collection: Collection, name: &str) -> StoreResult<bool> {
        let changed = self
            .conn
            .execute(
                "DELETE FROM saved_notes
                 WHERE user_id = ?1 AND collection = ?2 AND name = ?3;",
                params![user.as_str(), collection.as_str(), name],
            )
            .map_err(|err| StoreError::Delete(DbError::from(err)))?;
        Ok(changed > 0)
    }
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawNote> {
    Ok(RawNote {
        name: row.get(0)?,
        content: row.get(1)?,
        format: row.get(2)?,
        theme: row.get(3)?,
        topic: row.get(4)?,
        saved_at: row.get(5)?,
    })
}

fn parse_note(raw: RawNote) -> StoreResult<SavedDocument> {
    let format = raw
        .format
        .as_deref()
        .map(|value| {
            NoteFormat::parse(value).ok_or_else(|| {
                StoreError::InvalidData(format!("unknown format `{value}` for `{}`", raw.name))
            })
        })
        .transpose()?;
    let theme = raw
        .theme
        .as_deref()
        .map(|value| {
            NoteTheme::parse(value).ok_or_else(|| {
                StoreError::InvalidData(format!("unknown theme `{value}` for `{}`", raw.name))
            })
        })
        .transpose()?;
    let saved_at = timestamp_from_db(&raw.saved_at).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "invalid timestamp `{}` for `{}`",
            raw.saved_at, raw.name
        ))
    })?;

    Ok(SavedDocument {
        name: raw.name,
        content: raw.content,
        metadata: NoteMetadata {
            format,
            theme,
            topic: raw.topic,
        },
        saved_at,
    })
}

// Fixed-width nanoseconds keep lexical order equal to time order.
fn timestamp_to_db(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn timestamp_from_db(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_store_in_memory;
    use chrono::TimeZone;

    #[test]
    fn timestamps_round_trip_at_full_precision() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap()
            + chrono::Duration::nanoseconds(123);
        let stored = timestamp_to_db(&at);
        assert_eq!(stored, "2026-03-01T09:30:00.000000123Z");
        assert_eq!(timestamp_from_db(&stored), Some(at));
    }

    #[test]
    fn unknown_stored_format_is_invalid_data() {
        let conn = open_store_in_memory().unwrap();
        conn.execute_batch("PRAGMA ignore_check_constraints = ON;").unwrap();
        conn.execute(
            "INSERT INTO saved_notes (user_id, collection, name, content, format, saved_at)
             VALUES ('u', 'ainotes', 'n', '<p>x</p>', 'poster', '2026-03-01T09:30:00Z');",
            [],
        )
        .unwrap();

        let store = SqliteNoteStore::new(&conn);
        let user = UserId::new("u").unwrap();
        let err = store.list(&user, Collection::AiNotes).unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
    }
}
