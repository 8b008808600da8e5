//! The editor facade: owns the store, the history and the live gesture, and
//! is the only thing that writes committed state.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use timeline::{check_overlap, resolve_push, Frame, Overlay, OverlayDraft, OverlayId, Placement, PushResolution, Row};

use crate::command::{CommandOutcome, EditorCommand};
use crate::config::{ConfigError, EditorConfig};
use crate::history::{CommitOrigin, HistoryStore};
use crate::interaction::{DragMode, DragState, GhostPreview};
use crate::keyframes::KeyframeCache;
use crate::store::{OverlayStore, OverlayUpdate};
use crate::EditError;

/// Result of a gesture that ended cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureCommit {
    pub placement: Placement,
    /// Neighbours displaced to make room, as frame deltas.
    pub pushed: BTreeMap<OverlayId, Frame>,
    /// False when the gesture ended where it started.
    pub changed: bool,
}

pub struct Editor {
    config: EditorConfig,
    store: OverlayStore,
    history: HistoryStore,
    gesture: Option<DragState>,
}

impl Editor {
    pub fn new(config: EditorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let store = OverlayStore::new(config.fps, config.overlap_buffer);
        let history = HistoryStore::new(store.snapshot(), config.history_limit);
        Ok(Self { config, store, history, gesture: None })
    }

    /// Start from an existing collection. The collection becomes the base of
    /// history and is taken as given; use [`timeline::find_violations`] to
    /// vet untrusted input first.
    pub fn with_overlays(config: EditorConfig, overlays: Vec<Overlay>) -> Result<Self, ConfigError> {
        let mut editor = Self::new(config)?;
        editor.store.restore(Arc::new(overlays));
        editor.history.clear(editor.store.snapshot());
        Ok(editor)
    }

    pub fn set_keyframe_cache(&mut self, cache: Arc<dyn KeyframeCache>) {
        self.store.set_keyframe_cache(cache);
    }

    pub fn config(&self) -> &EditorConfig { &self.config }

    pub fn overlays(&self) -> &[Overlay] { self.store.overlays() }

    pub fn get(&self, id: OverlayId) -> Option<&Overlay> { self.store.get(id) }

    pub fn selected(&self) -> Option<OverlayId> { self.store.selected() }

    pub fn gesture(&self) -> Option<&DragState> { self.gesture.as_ref() }

    fn commit(&mut self, label: &str) {
        self.history.record(label, self.store.snapshot(), CommitOrigin::User);
    }

    fn check_row(&self, row: Row) -> Result<(), EditError> {
        if row >= self.config.max_rows {
            return Err(EditError::RowOutOfRange { row, max_rows: self.config.max_rows });
        }
        Ok(())
    }

    // ---- mutation commands ----

    /// Add `draft` if its row exists and no overlay in that lane shares a
    /// frame with it. Edge-to-edge neighbours are fine.
    pub fn add(&mut self, draft: OverlayDraft) -> Result<OverlayId, EditError> {
        self.check_row(draft.row)?;
        let end = draft.from.saturating_add(draft.duration_in_frames);
        let taken = self.store.overlays().iter().any(|o| o.row == draft.row && draft.from < o.end() && o.from < end);
        if taken {
            warn!(from = draft.from, row = draft.row, "add rejected: lane is occupied");
            return Err(EditError::LaneOccupied { row: draft.row, from: draft.from });
        }
        let id = self.store.add(draft)?;
        self.commit("Add overlay");
        Ok(id)
    }

    /// Apply a patch or transform. The resulting row must exist; collisions
    /// are not checked here, callers that move overlays should go through the
    /// gesture path.
    pub fn update(&mut self, id: OverlayId, update: impl Into<OverlayUpdate>) -> Result<(), EditError> {
        let max_rows = self.config.max_rows;
        self.store.update_checked(id, update, |next| {
            if next.row >= max_rows {
                return Err(EditError::RowOutOfRange { row: next.row, max_rows });
            }
            Ok(())
        })?;
        self.commit("Update overlay");
        Ok(())
    }

    pub fn delete(&mut self, id: OverlayId) -> Result<(), EditError> {
        self.store.delete(id)?;
        self.commit("Delete overlay");
        Ok(())
    }

    pub fn delete_by_row(&mut self, row: Row) -> Vec<OverlayId> {
        let removed = self.store.delete_by_row(row);
        if !removed.is_empty() {
            self.commit("Delete row");
        }
        removed
    }

    pub fn duplicate(&mut self, id: OverlayId) -> Result<OverlayId, EditError> {
        let new_id = self.store.duplicate(id)?;
        self.commit("Duplicate overlay");
        Ok(new_id)
    }

    pub fn split(&mut self, id: OverlayId, at_frame: Frame) -> Result<OverlayId, EditError> {
        let new_id = self.store.split(id, at_frame)?;
        self.commit("Split overlay");
        Ok(new_id)
    }

    pub fn select(&mut self, id: Option<OverlayId>) -> Result<(), EditError> { self.store.select(id) }

    /// Empty the timeline. The reset itself can be undone.
    pub fn reset(&mut self) {
        self.gesture = None;
        self.store.reset();
        self.commit("Reset");
    }

    /// Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo() else { return false };
        self.gesture = None;
        self.store.restore(Arc::clone(&snapshot));
        self.history.record("undo", snapshot, CommitOrigin::Undo);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo() else { return false };
        self.gesture = None;
        self.store.restore(Arc::clone(&snapshot));
        self.history.record("redo", snapshot, CommitOrigin::Redo);
        true
    }

    // ---- queries ----

    pub fn can_undo(&self) -> bool { self.history.can_undo() }

    pub fn can_redo(&self) -> bool { self.history.can_redo() }

    pub fn undo_label(&self) -> Option<&str> { self.history.undo_label() }

    pub fn redo_label(&self) -> Option<&str> { self.history.redo_label() }

    pub fn check_overlap(&self, candidate: &Placement) -> bool {
        check_overlap(candidate, self.store.overlays(), self.config.overlap_buffer)
    }

    /// Full resolution for `candidate`. With pushing disabled this only
    /// reports whether the candidate fits as is.
    pub fn check_and_resolve_push(&self, candidate: &Placement) -> PushResolution {
        if self.config.push_enabled {
            resolve_push(candidate, self.store.overlays(), self.config.overlap_buffer)
        } else {
            PushResolution { can_push: !self.check_overlap(candidate), pushed_items: BTreeMap::new() }
        }
    }

    // ---- gestures ----

    pub fn begin_gesture(&mut self, id: OverlayId, x: f32, y: f32, mode: DragMode) -> Result<(), EditError> {
        if let Some(active) = &self.gesture {
            return Err(EditError::GestureInProgress { id: active.id });
        }
        let overlay = self.store.get(id).ok_or(EditError::NotFound(id))?;
        self.gesture = Some(DragState::begin(overlay, mode, x, y));
        debug!(id, ?mode, "gesture started");
        Ok(())
    }

    /// Recompute the candidate for the pointer at `(x, y)`. Nothing is
    /// written to the store.
    pub fn move_gesture(&mut self, x: f32, y: f32) -> Result<GhostPreview, EditError> {
        let state = self.gesture.as_mut().ok_or(EditError::NoActiveGesture)?;
        let (placement, snap) = state.propose(x, y, &self.config, self.store.overlays());

        let mut ghost = GhostPreview::new(placement, &self.config);
        ghost.snap = snap;
        ghost.overlaps = check_overlap(&placement, self.store.overlays(), self.config.overlap_buffer);
        if self.config.push_enabled {
            ghost.push = Some(resolve_push(&placement, self.store.overlays(), self.config.overlap_buffer));
        }
        Ok(ghost)
    }

    /// Validate the latest candidate and commit it together with any pushes,
    /// or revert. The gesture is over either way.
    pub fn end_gesture(&mut self) -> Result<GestureCommit, EditError> {
        let state = self.gesture.take().ok_or(EditError::NoActiveGesture)?;
        let candidate = state.candidate;
        self.store.get(state.id).ok_or(EditError::NotFound(state.id))?;

        if candidate == state.original() {
            return Ok(GestureCommit { placement: candidate, pushed: BTreeMap::new(), changed: false });
        }

        let resolution = self.check_and_resolve_push(&candidate);
        if !resolution.can_push {
            warn!(id = state.id, from = candidate.from, row = candidate.row, "gesture reverted: placement infeasible");
            return Err(EditError::InfeasiblePlacement { id: state.id });
        }

        let mut placements = vec![candidate];
        for (&id, &delta) in &resolution.pushed_items {
            let neighbour = self.store.get(id).ok_or(EditError::NotFound(id))?;
            placements.push(neighbour.placement().shifted(delta));
        }
        self.store.apply_placements(&placements)?;
        self.commit(state.mode.label());

        debug!(
            id = state.id,
            from = candidate.from,
            duration = candidate.duration_in_frames,
            row = candidate.row,
            pushed = resolution.pushed_items.len(),
            "gesture committed"
        );
        Ok(GestureCommit { placement: candidate, pushed: resolution.pushed_items, changed: true })
    }

    /// Drop the live gesture. Returns false when none was active.
    pub fn cancel_gesture(&mut self) -> bool {
        match self.gesture.take() {
            Some(state) => {
                debug!(id = state.id, "gesture cancelled");
                true
            }
            None => false,
        }
    }

    // ---- command dispatch ----

    pub fn apply(&mut self, command: EditorCommand) -> Result<CommandOutcome, EditError> {
        Ok(match command {
            EditorCommand::Add { overlay } => CommandOutcome::Created { id: self.add(overlay)? },
            EditorCommand::Update { id, patch } => {
                self.update(id, patch)?;
                CommandOutcome::Done
            }
            EditorCommand::Delete { id } => {
                self.delete(id)?;
                CommandOutcome::Removed { ids: vec![id] }
            }
            EditorCommand::DeleteByRow { row } => CommandOutcome::Removed { ids: self.delete_by_row(row) },
            EditorCommand::Duplicate { id } => CommandOutcome::Created { id: self.duplicate(id)? },
            EditorCommand::Split { id, at_frame } => CommandOutcome::Created { id: self.split(id, at_frame)? },
            EditorCommand::Undo => CommandOutcome::Stepped { changed: self.undo() },
            EditorCommand::Redo => CommandOutcome::Stepped { changed: self.redo() },
            EditorCommand::Reset => {
                self.reset();
                CommandOutcome::Done
            }
            EditorCommand::Select { id } => {
                self.select(id)?;
                CommandOutcome::Done
            }
            EditorCommand::BeginGesture { id, x, y, mode } => {
                self.begin_gesture(id, x, y, mode)?;
                CommandOutcome::Done
            }
            EditorCommand::MoveGesture { x, y } => CommandOutcome::Ghost { preview: self.move_gesture(x, y)? },
            EditorCommand::EndGesture => CommandOutcome::Committed { commit: self.end_gesture()? },
            EditorCommand::CancelGesture => CommandOutcome::Stepped { changed: self.cancel_gesture() },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timeline::OverlayKind;

    fn text(from: Frame, duration: Frame, row: Row) -> OverlayDraft {
        OverlayDraft::new(from, duration, row, OverlayKind::Text { content: "t".into() })
    }

    fn editor() -> Editor { Editor::new(EditorConfig::default()).unwrap() }

    fn span(editor: &Editor, id: OverlayId) -> (Frame, Frame, Row) {
        let o = editor.get(id).unwrap();
        (o.from, o.duration_in_frames, o.row)
    }

    #[test]
    fn bad_config_is_refused() {
        let cfg = EditorConfig { max_rows: 0, ..Default::default() };
        assert!(Editor::new(cfg).is_err());
    }

    #[test]
    fn add_checks_row_and_lane() {
        let mut ed = editor();
        ed.add(text(0, 100, 0)).unwrap();
        assert_eq!(ed.add(text(0, 10, 5)), Err(EditError::RowOutOfRange { row: 5, max_rows: 5 }));
        assert_eq!(ed.add(text(50, 10, 0)), Err(EditError::LaneOccupied { row: 0, from: 50 }));
        assert_eq!(ed.add(text(95, 10, 0)), Err(EditError::LaneOccupied { row: 0, from: 95 }));
        assert_eq!(ed.add(text(50, 10, 1)).unwrap(), 1);
        assert_eq!(ed.overlays().len(), 2);
    }

    #[test]
    fn add_accepts_back_to_back_overlays() {
        let mut ed = editor();
        ed.add(text(0, 100, 0)).unwrap();
        let b = ed.add(text(100, 100, 0)).unwrap();
        let c = ed.add(text(200, 50, 0)).unwrap();
        assert_eq!(span(&ed, b), (100, 100, 0));
        assert_eq!(span(&ed, c), (200, 50, 0));
        assert!(timeline::lanes_are_exclusive(ed.overlays()));
    }

    #[test]
    fn add_sees_every_id_in_the_lane() {
        let top = text(0, 10, 0).with_id(OverlayId::MAX);
        let mut ed = Editor::with_overlays(EditorConfig::default(), vec![top]).unwrap();
        assert_eq!(ed.add(text(5, 5, 0)), Err(EditError::LaneOccupied { row: 0, from: 5 }));
        assert_eq!(ed.add(text(5, 5, 1)), Err(EditError::IdsExhausted));
        assert!(!ed.can_undo());
    }

    #[test]
    fn transform_cannot_leave_the_rows() {
        let mut ed = editor();
        let a = ed.add(text(0, 10, 0)).unwrap();
        let err = ed.update(a, OverlayUpdate::transform(|o| Overlay { row: 7, ..o.clone() }));
        assert_eq!(err, Err(EditError::RowOutOfRange { row: 7, max_rows: 5 }));
        assert_eq!(span(&ed, a), (0, 10, 0));
        assert_eq!(ed.undo_label(), Some("Add overlay"));

        ed.update(a, OverlayUpdate::transform(|o| Overlay { row: 4, ..o.clone() })).unwrap();
        assert_eq!(span(&ed, a), (0, 10, 4));
    }

    #[test]
    fn move_gesture_commits_and_records() {
        let mut ed = editor();
        let id = ed.add(text(0, 30, 0)).unwrap();
        ed.begin_gesture(id, 0.0, 0.0, DragMode::Move).unwrap();
        let ghost = ed.move_gesture(100.0, 44.0).unwrap();
        assert_eq!(ghost.placement.from, 90);
        assert_eq!(ghost.placement.row, 1);
        // preview writes nothing
        assert_eq!(span(&ed, id), (0, 30, 0));

        let commit = ed.end_gesture().unwrap();
        assert!(commit.changed);
        assert_eq!(span(&ed, id), (90, 30, 1));
        assert_eq!(ed.undo_label(), Some("Move overlay"));
        assert!(ed.gesture().is_none());
    }

    #[test]
    fn gesture_push_moves_neighbours_atomically() {
        let mut ed = editor();
        let a = ed.add(text(0, 30, 0)).unwrap();
        let b = ed.add(text(40, 30, 0)).unwrap();
        let c = ed.add(text(75, 30, 0)).unwrap();

        ed.begin_gesture(a, 0.0, 0.0, DragMode::ResizeEnd).unwrap();
        // +20px = +18 frames -> a ends at 48
        let ghost = ed.move_gesture(20.0, 0.0).unwrap();
        assert!(ghost.overlaps);
        let preview = ghost.push.unwrap();
        assert!(preview.can_push);

        let commit = ed.end_gesture().unwrap();
        assert_eq!(commit.pushed, preview.pushed_items);
        assert_eq!(span(&ed, a), (0, 48, 0));
        // b to 49, c clears b's new end at 79
        assert_eq!(span(&ed, b), (49, 30, 0));
        assert_eq!(span(&ed, c), (80, 30, 0));

        assert!(ed.undo());
        assert_eq!(span(&ed, a), (0, 30, 0));
        assert_eq!(span(&ed, b), (40, 30, 0));
        assert_eq!(span(&ed, c), (75, 30, 0));
    }

    #[test]
    fn infeasible_gesture_reverts() {
        let mut ed = editor();
        let a = ed.add(text(100, 30, 0)).unwrap();
        let b = ed.add(text(5, 20, 0)).unwrap();
        let before = ed.overlays().to_vec();

        ed.begin_gesture(a, 0.0, 0.0, DragMode::Move).unwrap();
        // -90px = -81 frames -> a at [19, 49), b would have to start at -2
        ed.move_gesture(-90.0, 0.0).unwrap();
        assert_eq!(ed.end_gesture(), Err(EditError::InfeasiblePlacement { id: a }));
        assert_eq!(ed.overlays(), before.as_slice());
        assert_eq!(span(&ed, b), (5, 20, 0));
        assert_eq!(ed.undo_label(), Some("Add overlay"));
    }

    #[test]
    fn push_disabled_rejects_any_overlap() {
        let cfg = EditorConfig { push_enabled: false, ..Default::default() };
        let mut ed = Editor::new(cfg).unwrap();
        let a = ed.add(text(0, 30, 0)).unwrap();
        ed.add(text(40, 30, 0)).unwrap();

        ed.begin_gesture(a, 0.0, 0.0, DragMode::Move).unwrap();
        let ghost = ed.move_gesture(20.0, 0.0).unwrap();
        assert!(ghost.overlaps);
        assert!(ghost.push.is_none());
        assert!(ed.end_gesture().is_err());
        assert_eq!(span(&ed, a), (0, 30, 0));
    }

    #[test]
    fn one_gesture_at_a_time() {
        let mut ed = editor();
        let a = ed.add(text(0, 30, 0)).unwrap();
        assert_eq!(ed.move_gesture(1.0, 1.0), Err(EditError::NoActiveGesture));
        ed.begin_gesture(a, 0.0, 0.0, DragMode::Move).unwrap();
        assert_eq!(ed.begin_gesture(a, 0.0, 0.0, DragMode::ResizeEnd), Err(EditError::GestureInProgress { id: a }));
        assert!(ed.cancel_gesture());
        assert!(!ed.cancel_gesture());
        assert_eq!(ed.end_gesture(), Err(EditError::NoActiveGesture));
    }

    #[test]
    fn cancel_leaves_store_untouched() {
        let mut ed = editor();
        let a = ed.add(text(0, 30, 0)).unwrap();
        ed.begin_gesture(a, 0.0, 0.0, DragMode::Move).unwrap();
        ed.move_gesture(300.0, 88.0).unwrap();
        ed.cancel_gesture();
        assert_eq!(span(&ed, a), (0, 30, 0));
        assert_eq!(ed.undo_label(), Some("Add overlay"));
    }

    #[test]
    fn stationary_gesture_records_nothing() {
        let mut ed = editor();
        let a = ed.add(text(0, 30, 0)).unwrap();
        ed.begin_gesture(a, 10.0, 10.0, DragMode::Move).unwrap();
        ed.move_gesture(10.4, 12.0).unwrap();
        let commit = ed.end_gesture().unwrap();
        assert!(!commit.changed);
        ed.undo();
        assert!(ed.overlays().is_empty());
    }

    #[test]
    fn undo_redo_through_split_and_reset() {
        let mut ed = editor();
        let a = ed.add(text(0, 100, 0)).unwrap();
        let tail = ed.split(a, 40).unwrap();
        ed.reset();
        assert!(ed.overlays().is_empty());

        assert!(ed.undo());
        assert_eq!(span(&ed, tail), (40, 60, 0));
        assert!(ed.undo());
        assert_eq!(span(&ed, a), (0, 100, 0));
        assert!(ed.get(tail).is_none());
        assert!(ed.redo());
        assert!(ed.get(tail).is_some());
        assert!(ed.can_redo());
    }

    #[test]
    fn failed_edits_do_not_touch_history() {
        let mut ed = editor();
        let a = ed.add(text(10, 10, 0)).unwrap();
        assert!(ed.split(a, 10).is_err());
        assert!(ed.delete(99).is_err());
        assert!(ed.delete_by_row(3).is_empty());
        assert!(ed.undo());
        assert!(!ed.can_undo());
    }

    #[test]
    fn commands_drive_the_editor() {
        let mut ed = editor();
        let out = ed.apply(EditorCommand::Add { overlay: text(0, 30, 2) }).unwrap();
        assert_eq!(out, CommandOutcome::Created { id: 0 });
        ed.apply(EditorCommand::BeginGesture { id: 0, x: 0.0, y: 0.0, mode: DragMode::ResizeStart }).unwrap();
        ed.apply(EditorCommand::MoveGesture { x: 10.0, y: 0.0 }).unwrap();
        let out = ed.apply(EditorCommand::EndGesture).unwrap();
        let CommandOutcome::Committed { commit } = out else { panic!("expected a commit") };
        assert_eq!((commit.placement.from, commit.placement.duration_in_frames), (9, 21));
        assert_eq!(ed.apply(EditorCommand::Undo).unwrap(), CommandOutcome::Stepped { changed: true });
        assert_eq!(span(&ed, 0), (0, 30, 2));
    }
}
