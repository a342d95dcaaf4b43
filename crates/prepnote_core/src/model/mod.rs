//! Domain model for editable notes and their persisted records.
//!
//! # Responsibility
//! - Define the structured document edited by a session.
//! - Define the markup codec used for storage and export.
//! - Define the record shape saved per user collection.
//!
//! # Invariants
//! - Documents are values: edits replace them wholesale.
//! - Stored content is always markup produced by `html::to_html`.

pub mod document;
pub mod html;
pub mod saved;
