use prepnote_core::{
    Command, CommandError, DispatchOutcome, DocumentPosition, EditorSession, Justify, SelectionState,
};

fn select(session: &mut EditorSession, block: usize, start: usize, end: usize) {
    session
        .select(SelectionState::new(
            DocumentPosition::new(block, start),
            DocumentPosition::new(block, end),
        ))
        .unwrap();
}

#[test]
fn typing_bolding_and_undo_redo_walk_the_history() {
    let mut session = EditorSession::user_notes();

    session.dispatch(Command::InsertPlainText("Hello".into()));
    select(&mut session, 0, 0, 5);
    assert_eq!(session.dispatch(Command::Bold), DispatchOutcome::Applied);
    assert_eq!(session.to_html(), "<p><b>Hello</b></p>");

    assert_eq!(session.undo().plain_text(), "Hello");
    assert_eq!(session.to_html(), "<p>Hello</p>");
    assert_eq!(session.undo().plain_text(), "");
    assert!(!session.can_undo());
    assert_eq!(session.undo().plain_text(), "");

    assert_eq!(session.redo().plain_text(), "Hello");
    assert!(session.can_redo());
}

#[test]
fn highlight_without_selection_changes_nothing() {
    let mut session = EditorSession::user_notes();
    session.dispatch(Command::InsertPlainText("Hello".into()));
    let before = session.history().len();

    let outcome = session.dispatch(Command::InsertHighlightSpan);
    assert!(matches!(outcome, DispatchOutcome::Ignored(_)));
    assert_eq!(session.history().len(), before);
    assert_eq!(session.to_html(), "<p>Hello</p>");
}

#[test]
fn new_edit_after_undo_discards_redo_branch() {
    let mut session = EditorSession::user_notes();
    session.dispatch(Command::InsertPlainText("one".into()));
    session.dispatch(Command::InsertPlainText(" two".into()));
    session.undo();
    assert!(session.can_redo());

    session.dispatch(Command::InsertPlainText(" three".into()));
    assert!(!session.can_redo());
    assert_eq!(session.document().plain_text(), "one three");
}

#[test]
fn selection_from_an_undone_snapshot_is_stale() {
    let mut session = EditorSession::user_notes();
    session.dispatch(Command::InsertPlainText("Hello world".into()));
    select(&mut session, 0, 6, 11);
    let before_italic = session.selection().unwrap();

    session.dispatch(Command::Italic);
    let after_italic = session.selection().unwrap();
    session.undo();
    assert!(session.selection().is_none());

    assert!(session.restore_selection(after_italic).is_none());
    assert_eq!(
        session.dispatch(Command::Bold),
        DispatchOutcome::Ignored(CommandError::EmptySelection)
    );

    assert_eq!(session.restore_selection(before_italic), Some(before_italic));
    assert_eq!(session.dispatch(Command::Bold), DispatchOutcome::Applied);
    assert_eq!(session.to_html(), "<p>Hello <b>world</b></p>");
}

#[test]
fn definition_block_and_alignment_render_as_markup() {
    let mut session = EditorSession::user_notes();
    session.dispatch(Command::InsertPlainText("Term\nA stack is LIFO.".into()));
    select(&mut session, 1, 0, 16);
    session.dispatch(Command::InsertDefinitionBlock);
    select(&mut session, 0, 0, 4);
    session.dispatch(Command::Justify(Justify::Center));

    assert_eq!(
        session.to_html(),
        "<p style=\"text-align:center\">Term</p><div class=\"definition\">A stack is LIFO.</div>"
    );
}

#[test]
fn loading_markup_resets_history_and_selection() {
    let mut session = EditorSession::user_notes();
    session.dispatch(Command::InsertPlainText("draft".into()));
    select(&mut session, 0, 0, 5);

    session.load_html("<h2>Loaded</h2><ul><li>a</li><li>b</li></ul>");
    assert!(!session.can_undo());
    assert!(session.selection().is_none());
    assert_eq!(session.to_html(), "<h2>Loaded</h2><ul><li>a</li><li>b</li></ul>");
}
