//! Logical selection capture and restore.
//!
//! # Responsibility
//! - Translate selection state reported by a rendering surface into
//!   document-relative ranges bound to one snapshot.
//! - Remember the caret for insertion commands.
//!
//! # Invariants
//! - A range is only valid against the snapshot it was captured from.
//! - Restoring a stale or unmappable range logs and returns `None`; it never
//!   errors.
//! - Collapsed selections are carets, never ranges.

use crate::editor::history::{Snapshot, SnapshotId};
use crate::model::document::{DocumentPosition, TextRange};
use log::{debug, warn};

/// Selection as reported by the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionState {
    pub anchor: DocumentPosition,
    pub focus: DocumentPosition,
}

impl SelectionState {
    pub fn new(anchor: DocumentPosition, focus: DocumentPosition) -> Self {
        Self { anchor, focus }
    }

    pub fn caret(position: DocumentPosition) -> Self {
        Self::new(position, position)
    }
}

/// Non-empty selection bound to the snapshot it was captured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRange {
    anchor: DocumentPosition,
    focus: DocumentPosition,
    snapshot: SnapshotId,
}

impl SelectionRange {
    pub fn anchor(&self) -> DocumentPosition {
        self.anchor
    }

    pub fn focus(&self) -> DocumentPosition {
        self.focus
    }

    pub fn start(&self) -> DocumentPosition {
        self.anchor.min(self.focus)
    }

    pub fn end(&self) -> DocumentPosition {
        self.anchor.max(self.focus)
    }

    pub fn snapshot(&self) -> SnapshotId {
        self.snapshot
    }

    pub fn text_range(&self) -> TextRange {
        TextRange::new(self.anchor, self.focus)
    }

    /// Whether this range still addresses `snapshot`.
    pub fn is_valid_for(&self, snapshot: &Snapshot) -> bool {
        self.snapshot == snapshot.id()
            && snapshot.document().contains_position(self.anchor)
            && snapshot.document().contains_position(self.focus)
    }
}

/// Where the selection lands after an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionAfter {
    Range(TextRange),
    Caret(DocumentPosition),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Caret {
    position: DocumentPosition,
    snapshot: SnapshotId,
}

/// Caches the current selection or caret of one editing session.
#[derive(Debug, Default, Clone)]
pub struct SelectionTracker {
    range: Option<SelectionRange>,
    caret: Option<Caret>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures surface state against `snapshot`.
    ///
    /// Returns `None` when the selection is collapsed (the caret is tracked
    /// instead) or does not fit the snapshot document.
    pub fn capture(&mut self, state: SelectionState, snapshot: &Snapshot) -> Option<SelectionRange> {
        let document = snapshot.document();
        if !document.contains_position(state.anchor) || !document.contains_position(state.focus) {
            warn!(
                "event=selection_capture module=editor status=rejected snapshot={} anchor={}:{} focus={}:{}",
                snapshot.id().value(),
                state.anchor.block,
                state.anchor.offset,
                state.focus.block,
                state.focus.offset
            );
            self.clear();
            return None;
        }

        if state.anchor == state.focus {
            self.range = None;
            self.caret = Some(Caret {
                position: state.anchor,
                snapshot: snapshot.id(),
            });
            return None;
        }

        let range = SelectionRange {
            anchor: state.anchor,
            focus: state.focus,
            snapshot: snapshot.id(),
        };
        self.range = Some(range);
        self.caret = None;
        Some(range)
    }

    /// Re-activates a previously captured range, best effort.
    pub fn restore(&mut self, range: SelectionRange, snapshot: &Snapshot) -> Option<SelectionRange> {
        if range.snapshot != snapshot.id() {
            warn!(
                "event=selection_restore module=editor status=stale range_snapshot={} current_snapshot={}",
                range.snapshot.value(),
                snapshot.id().value()
            );
            return None;
        }
        if !range.is_valid_for(snapshot) {
            warn!(
                "event=selection_restore module=editor status=unmappable snapshot={}",
                snapshot.id().value()
            );
            return None;
        }

        self.range = Some(range);
        self.caret = None;
        Some(range)
    }

    /// Cached range, if it still belongs to `snapshot`.
    pub fn active(&self, snapshot: &Snapshot) -> Option<SelectionRange> {
        self.range.filter(|range| range.is_valid_for(snapshot))
    }

    /// Cached caret, if it still belongs to `snapshot`.
    pub fn caret(&self, snapshot: &Snapshot) -> Option<DocumentPosition> {
        self.caret
            .filter(|caret| {
                caret.snapshot == snapshot.id() && snapshot.document().contains_position(caret.position)
            })
            .map(|caret| caret.position)
    }

    /// Carries the post-edit selection onto the snapshot the edit produced.
    pub fn rebase(&mut self, after: SelectionAfter, snapshot: &Snapshot) {
        match after {
            SelectionAfter::Range(range) if !range.is_collapsed() => {
                self.range = Some(SelectionRange {
                    anchor: range.start,
                    focus: range.end,
                    snapshot: snapshot.id(),
                });
                self.caret = None;
            }
            SelectionAfter::Range(range) => self.set_caret(range.start, snapshot),
            SelectionAfter::Caret(position) => self.set_caret(position, snapshot),
        }
        debug!(
            "event=selection_rebase module=editor status=ok snapshot={} has_range={}",
            snapshot.id().value(),
            self.range.is_some()
        );
    }

    pub fn clear(&mut self) {
        self.range = None;
        self.caret = None;
    }

    fn set_caret(&mut self, position: DocumentPosition, snapshot: &Snapshot) {
        self.range = None;
        self.caret = Some(Caret {
            position,
            snapshot: snapshot.id(),
        });
    }
}
