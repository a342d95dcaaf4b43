//! Editing session: command dispatch over one history stack.
//!
//! # Responsibility
//! - Gate commands on the surface's editability.
//! - Apply commands at the tracked selection and record the results.
//! - Drive undo/redo, external loads and request fencing.
//!
//! # Invariants
//! - Only successful, content-changing commands push snapshots.
//! - Undo/redo never push; they only move the history cursor.
//! - The user-notes surface is always editable.
//! - A request completion is applied only when its token is the latest one
//!   issued; older completions are discarded.
//!
//! # See also
//! - `editor::command` for per-command semantics.

use crate::config::CoreConfig;
use crate::editor::command::{apply_command, Command, CommandError};
use crate::editor::history::{HistoryStack, Snapshot, MAX_HISTORY};
use crate::editor::selection::{SelectionRange, SelectionState, SelectionTracker};
use crate::model::document::{Document, TextRange};
use crate::model::html::{parse_html, to_html};
use crate::model::saved::Collection;
use log::{debug, info, warn};
use std::fmt::Display;
use uuid::Uuid;

/// Stable id attached to a session's log events.
pub type SessionId = Uuid;

/// Which note editor a session backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteSurface {
    /// User-authored notes; always editable.
    UserNotes,
    /// Generated notes; read-only until editing is enabled.
    AiNotes,
}

impl NoteSurface {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserNotes => "user_notes",
            Self::AiNotes => "ai_notes",
        }
    }

    /// Store partition holding this surface's saved notes.
    pub fn collection(self) -> Collection {
        match self {
            Self::UserNotes => Collection::UserMade,
            Self::AiNotes => Collection::AiNotes,
        }
    }

    fn editable_by_default(self) -> bool {
        matches!(self, Self::UserNotes)
    }
}

/// What a dispatched command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A new snapshot was recorded.
    Applied,
    /// The command ran but produced the current document again.
    Unchanged,
    /// The command was rejected and silently ignored.
    Ignored(CommandError),
}

/// Ticket for one outstanding asynchronous request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// How a request completion was handled.
#[derive(Debug)]
pub enum RequestOutcome<E> {
    /// The result replaced the session document.
    Applied,
    /// A newer request was started meanwhile; the result was dropped.
    Superseded,
    /// The request failed; the document is unchanged.
    Failed(E),
}

/// One editing session over a single document.
#[derive(Debug)]
pub struct EditorSession {
    id: SessionId,
    surface: NoteSurface,
    editable: bool,
    history: HistoryStack,
    selection: SelectionTracker,
    last_request: u64,
    pending: Option<RequestToken>,
}

impl EditorSession {
    /// Session for user-authored notes, starting empty.
    pub fn user_notes() -> Self {
        Self::with_capacity(NoteSurface::UserNotes, MAX_HISTORY)
    }

    /// Session for generated notes, starting empty and read-only.
    pub fn ai_notes() -> Self {
        Self::with_capacity(NoteSurface::AiNotes, MAX_HISTORY)
    }

    /// Session whose history depth comes from `config`.
    pub fn from_config(surface: NoteSurface, config: &CoreConfig) -> Self {
        Self::with_capacity(surface, config.max_history)
    }

    pub fn with_capacity(surface: NoteSurface, max_history: usize) -> Self {
        let session = Self {
            id: Uuid::new_v4(),
            surface,
            editable: surface.editable_by_default(),
            history: HistoryStack::with_capacity(Document::new(), max_history),
            selection: SelectionTracker::new(),
            last_request: 0,
            pending: None,
        };
        info!(
            "event=session_open module=editor status=ok session_id={} surface={} editable={} max_history={}",
            session.id,
            surface.as_str(),
            session.editable,
            session.history.capacity()
        );
        session
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn surface(&self) -> NoteSurface {
        self.surface
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    /// Enables or disables editing; returns the effective state.
    ///
    /// The user-notes surface ignores attempts to disable editing.
    pub fn set_editable(&mut self, editable: bool) -> bool {
        let effective = editable || self.surface == NoteSurface::UserNotes;
        if effective != self.editable {
            self.editable = effective;
            debug!(
                "event=editable_changed module=editor status=ok session_id={} editable={}",
                self.id, effective
            );
        }
        self.editable
    }

    pub fn document(&self) -> &Document {
        self.history.current().document()
    }

    pub fn snapshot(&self) -> &Snapshot {
        self.history.current()
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    /// Current document as note markup.
    pub fn to_html(&self) -> String {
        to_html(self.document())
    }

    /// Records the selection reported by the surface.
    pub fn select(&mut self, state: SelectionState) -> Option<SelectionRange> {
        self.selection.capture(state, self.history.current())
    }

    /// Re-activates a cached range; stale ranges are ignored.
    pub fn restore_selection(&mut self, range: SelectionRange) -> Option<SelectionRange> {
        self.selection.restore(range, self.history.current())
    }

    /// Active non-empty selection on the current snapshot.
    pub fn selection(&self) -> Option<SelectionRange> {
        self.selection.active(self.history.current())
    }

    /// Applies `command` at the current selection.
    ///
    /// Rejected commands are logged at debug level and otherwise ignored.
    pub fn dispatch(&mut self, command: Command) -> DispatchOutcome {
        let target = self.command_target();
        let result = apply_command(
            self.history.current().document(),
            &target,
            &command,
            self.editable,
        );

        let output = match result {
            Ok(output) => output,
            Err(err) => {
                debug!(
                    "event=command_ignored module=editor status=ignored session_id={} command={} reason={}",
                    self.id,
                    command.name(),
                    err
                );
                return DispatchOutcome::Ignored(err);
            }
        };

        let recorded = self.history.push(output.document);
        self.selection
            .rebase(output.selection, self.history.current());
        debug!(
            "event=command_applied module=editor status=ok session_id={} command={} recorded={} history_len={} cursor={}",
            self.id,
            command.name(),
            recorded,
            self.history.len(),
            self.history.cursor()
        );
        if recorded {
            DispatchOutcome::Applied
        } else {
            DispatchOutcome::Unchanged
        }
    }

    /// Steps back one snapshot; at the oldest snapshot nothing changes.
    pub fn undo(&mut self) -> &Document {
        if self.history.undo().is_some() {
            self.selection.clear();
            self.log_history_move("undo");
        }
        self.document()
    }

    /// Steps forward one snapshot; at the newest snapshot nothing changes.
    pub fn redo(&mut self) -> &Document {
        if self.history.redo().is_some() {
            self.selection.clear();
            self.log_history_move("redo");
        }
        self.document()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Replaces the document from an external source.
    ///
    /// History restarts from the loaded document and the selection is
    /// dropped.
    pub fn load(&mut self, document: Document) {
        self.history.reset(document);
        self.selection.clear();
        info!(
            "event=document_load module=editor status=ok session_id={} blocks={}",
            self.id,
            self.document().blocks().len()
        );
    }

    /// Parses `markup` and loads it.
    pub fn load_html(&mut self, markup: &str) {
        self.load(parse_html(markup));
    }

    /// Starts a request whose result may later replace the document.
    ///
    /// Any request still outstanding is superseded.
    pub fn begin_request(&mut self) -> RequestToken {
        self.last_request += 1;
        let token = RequestToken(self.last_request);
        if let Some(previous) = self.pending.replace(token) {
            info!(
                "event=request_superseded module=editor status=ok session_id={} previous={} current={}",
                self.id,
                previous.value(),
                token.value()
            );
        }
        token
    }

    /// Whether a request is outstanding.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Settles the request identified by `token`.
    ///
    /// Only the latest token may change the session: a successful result
    /// is loaded, a failure leaves the document unchanged. Older tokens are
    /// reported as superseded.
    pub fn complete_request<E>(
        &mut self,
        token: RequestToken,
        result: Result<Document, E>,
    ) -> RequestOutcome<E>
    where
        E: Display,
    {
        if self.pending != Some(token) {
            warn!(
                "event=request_complete module=editor status=superseded session_id={} token={}",
                self.id,
                token.value()
            );
            return RequestOutcome::Superseded;
        }
        self.pending = None;

        match result {
            Ok(document) => {
                self.load(document);
                RequestOutcome::Applied
            }
            Err(err) => {
                warn!(
                    "event=request_complete module=editor status=error session_id={} token={} error={}",
                    self.id,
                    token.value(),
                    err
                );
                RequestOutcome::Failed(err)
            }
        }
    }

    /// Range commands act on: the selection, else the caret, else the end.
    fn command_target(&self) -> TextRange {
        let snapshot = self.history.current();
        if let Some(range) = self.selection.active(snapshot) {
            return range.text_range();
        }
        let caret = self
            .selection
            .caret(snapshot)
            .unwrap_or_else(|| snapshot.document().end_position());
        TextRange::collapsed(caret)
    }

    fn log_history_move(&self, direction: &str) {
        debug!(
            "event=history_move module=editor status=ok session_id={} direction={} cursor={} history_len={}",
            self.id,
            direction,
            self.history.cursor(),
            self.history.len()
        );
    }
}
