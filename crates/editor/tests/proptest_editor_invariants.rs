//! Property tests over random editing sessions.
//!
//! 1. **Lane exclusivity** holds after every command, whatever fails.
//! 2. **Spans stay valid**: every overlay keeps `from >= 0` and at least one frame.
//! 3. **Failed edits are no-ops**: a rejected gesture, split or duplicate leaves
//!    the collection exactly as it was.
//! 4. **Undo/redo round trip**: undoing every step then redoing every step
//!    lands on the same collection.
//! 5. **Duplicates never collide** in their lane.

use editor::{DragMode, Editor, EditorConfig};
use proptest::prelude::*;
use timeline::{lanes_are_exclusive, Frame, Overlay, OverlayDraft, OverlayKind, Row};

#[derive(Debug, Clone)]
enum Op {
    Add { from: Frame, duration: Frame, row: Row },
    Drag { pick: usize, mode: DragMode, dx: f32, dy: f32 },
    Split { pick: usize, at: f64 },
    Duplicate { pick: usize },
    Delete { pick: usize },
    Undo,
    Redo,
}

fn drag_mode() -> impl Strategy<Value = DragMode> {
    prop_oneof![Just(DragMode::Move), Just(DragMode::ResizeStart), Just(DragMode::ResizeEnd)]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0i64..600, 1i64..120, 0u32..5).prop_map(|(from, duration, row)| Op::Add { from, duration, row }),
        4 => (any::<usize>(), drag_mode(), -300.0f32..300.0, -120.0f32..120.0)
            .prop_map(|(pick, mode, dx, dy)| Op::Drag { pick, mode, dx, dy }),
        2 => (any::<usize>(), 0.0f64..1.0).prop_map(|(pick, at)| Op::Split { pick, at }),
        2 => any::<usize>().prop_map(|pick| Op::Duplicate { pick }),
        1 => any::<usize>().prop_map(|pick| Op::Delete { pick }),
        1 => Just(Op::Undo),
        1 => Just(Op::Redo),
    ]
}

fn text(from: Frame, duration: Frame, row: Row) -> OverlayDraft {
    OverlayDraft::new(from, duration, row, OverlayKind::Text { content: "p".into() })
}

fn pick(ed: &Editor, pick: usize) -> Option<Overlay> {
    let overlays = ed.overlays();
    (!overlays.is_empty()).then(|| overlays[pick % overlays.len()].clone())
}

/// Apply `op`, returning whether it failed.
fn run(ed: &mut Editor, op: &Op) -> bool {
    match *op {
        Op::Add { from, duration, row } => ed.add(text(from, duration, row)).is_err(),
        Op::Drag { pick: p, mode, dx, dy } => {
            let Some(target) = pick(ed, p) else { return false };
            ed.begin_gesture(target.id, 500.0, 100.0, mode).unwrap();
            ed.move_gesture(500.0 + dx, 100.0 + dy).unwrap();
            ed.end_gesture().is_err()
        }
        Op::Split { pick: p, at } => {
            let Some(target) = pick(ed, p) else { return false };
            let offset = 1 + ((target.duration_in_frames - 1) as f64 * at) as Frame;
            ed.split(target.id, target.from + offset).is_err()
        }
        Op::Duplicate { pick: p } => {
            let Some(target) = pick(ed, p) else { return false };
            match ed.duplicate(target.id) {
                Ok(id) => {
                    let copy = ed.get(id).unwrap().clone();
                    assert_eq!(copy.row, target.row);
                    assert!(ed
                        .overlays()
                        .iter()
                        .filter(|o| o.id != id && o.row == copy.row)
                        .all(|o| copy.end() <= o.from || o.end() <= copy.from));
                    false
                }
                Err(_) => true,
            }
        }
        Op::Delete { pick: p } => {
            let Some(target) = pick(ed, p) else { return false };
            ed.delete(target.id).is_err()
        }
        Op::Undo => !ed.undo(),
        Op::Redo => !ed.redo(),
    }
}

fn spans_valid(overlays: &[Overlay]) -> bool {
    overlays.iter().all(|o| o.from >= 0 && o.duration_in_frames >= 1)
}

proptest! {
    #[test]
    fn invariants_hold_across_sessions(ops in prop::collection::vec(op(), 1..60)) {
        let mut ed = Editor::new(EditorConfig::default()).unwrap();
        for op in &ops {
            let before = ed.overlays().to_vec();
            let failed = run(&mut ed, op);
            prop_assert!(lanes_are_exclusive(ed.overlays()), "lane overlap after {:?}", op);
            prop_assert!(spans_valid(ed.overlays()), "invalid span after {:?}", op);
            if failed {
                prop_assert_eq!(ed.overlays(), before.as_slice());
            }
            prop_assert!(ed.gesture().is_none());
        }
    }
}

proptest! {
    #[test]
    fn without_push_the_lanes_still_hold(ops in prop::collection::vec(op(), 1..40)) {
        let cfg = EditorConfig { push_enabled: false, snap_enabled: false, ..Default::default() };
        let mut ed = Editor::new(cfg).unwrap();
        for op in &ops {
            run(&mut ed, op);
            prop_assert!(lanes_are_exclusive(ed.overlays()));
        }
    }
}

proptest! {
    #[test]
    fn undo_all_then_redo_all_round_trips(ops in prop::collection::vec(op(), 1..40)) {
        let mut ed = Editor::new(EditorConfig::default()).unwrap();
        for op in ops.iter().filter(|op| !matches!(op, Op::Undo | Op::Redo)) {
            run(&mut ed, op);
        }
        let last = ed.overlays().to_vec();

        let mut steps = 0;
        while ed.undo() {
            steps += 1;
        }
        prop_assert!(ed.overlays().is_empty());
        prop_assert!(!ed.undo());

        for _ in 0..steps {
            prop_assert!(ed.redo());
        }
        prop_assert!(!ed.can_redo());
        prop_assert_eq!(ed.overlays(), last.as_slice());
    }
}

proptest! {
    #[test]
    fn new_edit_after_undo_drops_redo(from in 0i64..500, duration in 1i64..100) {
        let mut ed = Editor::new(EditorConfig::default()).unwrap();
        ed.add(text(from, duration, 0)).unwrap();
        ed.add(text(from, duration, 1)).unwrap();
        prop_assert!(ed.undo());
        prop_assert!(ed.can_redo());
        ed.add(text(from, duration, 2)).unwrap();
        prop_assert!(!ed.can_redo());
    }
}
