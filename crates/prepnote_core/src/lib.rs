//! Core of the interview-prep note editor.
//!
//! Owns the document model, editing history, command dispatch, the note
//! store and the generation adapter. Rendering surfaces stay outside.

pub mod config;
pub mod db;
pub mod editor;
pub mod generate;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use config::{load_config, ConfigError, CoreConfig};
pub use db::{open_store, open_store_from_config, open_store_in_memory, DbError, DbResult};
pub use editor::command::{Command, CommandError, Justify};
pub use editor::history::{HistoryStack, Snapshot, SnapshotId, MAX_HISTORY};
pub use editor::selection::{SelectionRange, SelectionState};
pub use editor::session::{
    DispatchOutcome, EditorSession, NoteSurface, RequestOutcome, RequestToken, SessionId,
};
pub use generate::{
    generate_document, generate_into, Difficulty, GenerationError, GenerationRequest,
    NoteGenerator, NoteLength,
};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::document::{Document, DocumentPosition, TextRange};
pub use model::html::{parse_html, render_print_page, to_html};
pub use model::saved::{
    Collection, NoteFormat, NoteMetadata, NoteTheme, SavedDocument, UserId,
};
pub use service::note_library::NoteLibrary;
pub use store::{NoteStore, SqliteNoteStore, StoreError, StoreResult};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
