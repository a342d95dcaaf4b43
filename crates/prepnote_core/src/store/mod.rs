//! Persistence gateway for named note records.
//!
//! # Responsibility
//! - Define the store contract used by the note library.
//! - Keep SQL details inside the SQLite implementation.
//!
//! # Invariants
//! - Records are keyed by `(user, collection, name)`; saving an existing key
//!   overwrites it.
//! - Listing is ordered by `saved_at DESC, name ASC`.
//! - Deleting a missing key succeeds.

use crate::db::DbError;
use crate::model::saved::{Collection, NameError, SavedDocument, UserId};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod sqlite_store;

pub use sqlite_store::SqliteNoteStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence failure surfaced to callers.
#[derive(Debug)]
pub enum StoreError {
    /// No user is signed in.
    Unauthenticated,
    Read(DbError),
    Write(DbError),
    Delete(DbError),
    InvalidName(NameError),
    /// A stored row could not be mapped back to a record.
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "no user is signed in"),
            Self::Read(err) => write!(f, "failed to read notes: {err}"),
            Self::Write(err) => write!(f, "failed to save note: {err}"),
            Self::Delete(err) => write!(f, "failed to delete note: {err}"),
            Self::InvalidName(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid stored note: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read(err) | Self::Write(err) | Self::Delete(err) => Some(err),
            Self::InvalidName(err) => Some(err),
            Self::Unauthenticated | Self::InvalidData(_) => None,
        }
    }
}

impl From<NameError> for StoreError {
    fn from(value: NameError) -> Self {
        Self::InvalidName(value)
    }
}

impl StoreError {
    /// Short code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Read(_) => "read_failed",
            Self::Write(_) => "write_failed",
            Self::Delete(_) => "delete_failed",
            Self::InvalidName(_) => "invalid_name",
            Self::InvalidData(_) => "invalid_data",
        }
    }
}

/// Storage backend for note records.
pub trait NoteStore {
    /// Inserts or overwrites `document` under its name.
    fn save(
        &self,
        user: &UserId,
        collection: Collection,
        document: &SavedDocument,
    ) -> StoreResult<()>;

    /// All records in `collection`, newest first.
    fn list(&self, user: &UserId, collection: Collection) -> StoreResult<Vec<SavedDocument>>;

    fn get(
        &self,
        user: &UserId,
        collection: Collection,
        name: &str,
    ) -> StoreResult<Option<SavedDocument>>;

    /// Removes the record; returns whether one existed.
    fn delete(&self, user: &UserId, collection: Collection, name: &str) -> StoreResult<bool>;
}
