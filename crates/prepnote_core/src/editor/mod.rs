//! Editing core: history, selection and command dispatch.
//!
//! # Responsibility
//! - Keep the undo/redo log of document snapshots.
//! - Track logical selections independent of any rendering surface.
//! - Turn named commands into recorded document edits.
//!
//! # Invariants
//! - One session owns one history stack; there is a single writer.
//! - Rendering-surface effects (print dialogs, native commands) never run
//!   from this module.

pub mod command;
pub mod history;
pub mod selection;
pub mod session;
