//! Bounded snapshot history with a movable cursor.
//!
//! # Responsibility
//! - Record document snapshots produced by successful edits.
//! - Move a cursor for undo/redo without copying documents.
//!
//! # Invariants
//! - The stack is never empty and `cursor < len`.
//! - Adjacent snapshots never hold equal documents.
//! - `len <= capacity`; the oldest snapshot is evicted first.
//! - Pushing while the cursor is not at the end prunes the redo branch.
//! - Snapshot ids are unique for the lifetime of one stack.

use crate::model::document::Document;
use std::collections::VecDeque;

/// Default number of snapshots kept per editing session.
pub const MAX_HISTORY: usize = 50;

/// Identity of one snapshot inside a history stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotId(u64);

impl SnapshotId {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Immutable capture of a document at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    id: SnapshotId,
    document: Document,
}

impl Snapshot {
    pub fn id(&self) -> SnapshotId {
        self.id
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

/// Undo/redo log for one editing session.
#[derive(Debug, Clone)]
pub struct HistoryStack {
    entries: VecDeque<Snapshot>,
    cursor: usize,
    capacity: usize,
    next_id: u64,
}

impl HistoryStack {
    /// Creates a stack holding `initial` with the default capacity.
    pub fn new(initial: Document) -> Self {
        Self::with_capacity(initial, MAX_HISTORY)
    }

    /// Creates a stack holding `initial`; capacity is at least 1.
    pub fn with_capacity(initial: Document, capacity: usize) -> Self {
        let mut stack = Self {
            entries: VecDeque::new(),
            cursor: 0,
            capacity: capacity.max(1),
            next_id: 0,
        };
        let base = stack.snapshot(initial);
        stack.entries.push_back(base);
        stack
    }

    /// Records `document` as the newest snapshot.
    ///
    /// Returns `false` (and changes nothing) when `document` equals the
    /// snapshot at the cursor.
    pub fn push(&mut self, document: Document) -> bool {
        if self.current().document == document {
            return false;
        }

        self.entries.truncate(self.cursor + 1);
        let snapshot = self.snapshot(document);
        self.entries.push_back(snapshot);
        self.cursor = self.entries.len() - 1;

        if self.entries.len() > self.capacity {
            self.entries.pop_front();
            self.cursor -= 1;
        }
        true
    }

    /// Moves the cursor one step back.
    ///
    /// Returns `None` at the oldest snapshot; the stack is left unchanged.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    /// Moves the cursor one step forward.
    ///
    /// Returns `None` at the newest snapshot; the stack is left unchanged.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    pub fn current(&self) -> &Snapshot {
        &self.entries[self.cursor]
    }

    /// Drops every snapshot and starts over from `document`.
    pub fn reset(&mut self, document: Document) {
        self.entries.clear();
        let base = self.snapshot(document);
        self.entries.push_back(base);
        self.cursor = 0;
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshots from oldest to newest.
    pub fn snapshots(&self) -> impl Iterator<Item = &Snapshot> {
        self.entries.iter()
    }

    fn snapshot(&mut self, document: Document) -> Snapshot {
        let id = SnapshotId(self.next_id);
        self.next_id += 1;
        Snapshot { id, document }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        Document::from_plain_text(text)
    }

    fn texts(stack: &HistoryStack) -> Vec<String> {
        stack
            .snapshots()
            .map(|snapshot| snapshot.document().plain_text())
            .collect()
    }

    #[test]
    fn push_equal_to_current_is_ignored() {
        let mut stack = HistoryStack::new(Document::new());
        assert!(stack.push(doc("a")));
        assert!(!stack.push(doc("a")));
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn push_after_undo_prunes_redo_branch() {
        let mut stack = HistoryStack::new(doc("A"));
        for text in ["B", "C", "D"] {
            stack.push(doc(text));
        }
        stack.undo();
        stack.undo();
        assert_eq!(stack.cursor(), 1);

        stack.push(doc("E"));
        assert_eq!(texts(&stack), vec!["A", "B", "E"]);
        assert_eq!(stack.cursor(), 2);
        assert!(!stack.can_redo());
    }

    #[test]
    fn overflow_evicts_oldest_and_keeps_current() {
        let mut stack = HistoryStack::with_capacity(doc("0"), 3);
        stack.push(doc("1"));
        stack.push(doc("2"));
        stack.push(doc("3"));

        assert_eq!(stack.len(), 3);
        assert_eq!(stack.cursor(), 2);
        assert_eq!(stack.current().document().plain_text(), "3");
        assert_eq!(texts(&stack), vec!["1", "2", "3"]);
    }

    #[test]
    fn boundaries_are_no_ops() {
        let mut stack = HistoryStack::new(doc("only"));
        let before = stack.current().id();
        assert!(stack.undo().is_none());
        assert!(stack.redo().is_none());
        assert_eq!(stack.current().id(), before);
        assert_eq!(stack.cursor(), 0);
    }

    #[test]
    fn snapshot_ids_are_never_reused() {
        let mut stack = HistoryStack::new(Document::new());
        stack.push(doc("a"));
        let pruned = stack.current().id();
        stack.undo();
        stack.push(doc("b"));
        assert_ne!(stack.current().id(), pruned);

        stack.reset(doc("c"));
        assert!(stack.current().id() > pruned);
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut stack = HistoryStack::with_capacity(Document::new(), 0);
        stack.push(doc("x"));
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.current().document().plain_text(), "x");
        assert!(!stack.can_undo());
    }

    #[test]
    fn large_capacity_keeps_every_snapshot() {
        let capacity = MAX_HISTORY * 5;
        let mut stack = HistoryStack::with_capacity(doc("0"), capacity);
        for step in 1..capacity {
            stack.push(doc(&step.to_string()));
        }
        assert_eq!(stack.len(), capacity);
        assert_eq!(stack.snapshots().next().unwrap().document().plain_text(), "0");

        stack.push(doc("last"));
        assert_eq!(stack.len(), capacity);
        assert_eq!(stack.snapshots().next().unwrap().document().plain_text(), "1");
    }
}
