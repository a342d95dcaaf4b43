use prepnote_core::{Document, HistoryStack};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Push(u8),
    Undo,
    Redo,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0_u8..4).prop_map(Op::Push),
        1 => Just(Op::Undo),
        1 => Just(Op::Redo),
    ]
}

fn doc(value: u8) -> Document {
    Document::from_plain_text(&format!("v{value}"))
}

fn apply(stack: &mut HistoryStack, op: &Op) {
    match op {
        Op::Push(value) => {
            stack.push(doc(*value));
        }
        Op::Undo => {
            stack.undo();
        }
        Op::Redo => {
            stack.redo();
        }
    }
}

proptest! {
    #[test]
    fn history_stays_bounded_and_deduplicated(
        capacity in 1_usize..8,
        ops in prop::collection::vec(op(), 0..64),
    ) {
        let mut stack = HistoryStack::with_capacity(Document::new(), capacity);
        for op in &ops {
            apply(&mut stack, op);

            prop_assert!(stack.len() <= capacity);
            prop_assert!(stack.cursor() < stack.len());
            let docs: Vec<&Document> = stack.snapshots().map(|s| s.document()).collect();
            for pair in docs.windows(2) {
                prop_assert_ne!(pair[0], pair[1]);
            }
        }
    }

    #[test]
    fn undo_then_redo_returns_to_the_same_snapshot(
        ops in prop::collection::vec(op(), 0..48),
    ) {
        let mut stack = HistoryStack::new(Document::new());
        for op in &ops {
            apply(&mut stack, op);
        }

        let before = stack.current().id();
        if stack.undo().is_some() {
            let redone = stack.redo().map(|snapshot| snapshot.id());
            prop_assert_eq!(redone, Some(before));
        } else {
            prop_assert_eq!(stack.cursor(), 0);
            prop_assert_eq!(stack.current().id(), before);
        }
    }
}
