//! Pointer gestures on the timeline: move, resize-start and resize-end.
//!
//! A gesture captures the overlay's span and lane when the pointer goes
//! down. Every pointer move is converted from pixels into a whole-frame and
//! whole-row delta against that origin, so the candidate never accumulates
//! rounding error however many moves arrive.

use serde::{Deserialize, Serialize};

use timeline::{snap_placement, Frame, Overlay, OverlayId, Placement, PushResolution, Row, SnapEdges, SnapMatch};

use crate::config::EditorConfig;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragMode { Move, ResizeStart, ResizeEnd }

impl DragMode {
    /// Candidate edges the snapper may move for this gesture.
    pub fn snap_edges(self) -> SnapEdges {
        match self {
            DragMode::Move => SnapEdges::BOTH,
            DragMode::ResizeStart => SnapEdges::START,
            DragMode::ResizeEnd => SnapEdges::END,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DragMode::Move => "Move overlay",
            DragMode::ResizeStart | DragMode::ResizeEnd => "Resize overlay",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct DragState {
    pub id: OverlayId,
    pub mode: DragMode,
    pub start_x: f32,
    pub start_y: f32,
    pub orig_from: Frame,
    pub orig_dur: Frame,
    pub orig_row: Row,
    /// Latest proposal, after snapping.
    pub candidate: Placement,
}

impl DragState {
    pub fn begin(overlay: &Overlay, mode: DragMode, x: f32, y: f32) -> Self {
        Self {
            id: overlay.id,
            mode,
            start_x: x,
            start_y: y,
            orig_from: overlay.from,
            orig_dur: overlay.duration_in_frames,
            orig_row: overlay.row,
            candidate: overlay.placement(),
        }
    }

    pub fn original(&self) -> Placement { Placement::new(self.id, self.orig_from, self.orig_dur, self.orig_row) }

    /// Candidate for the pointer at `(x, y)` before any snapping.
    pub fn translate(&self, x: f32, y: f32, cfg: &EditorConfig) -> Placement {
        let delta_frames = (f64::from(x - self.start_x) * cfg.frames_per_px()).round() as Frame;
        let orig_end = self.orig_from + self.orig_dur;

        match self.mode {
            DragMode::Move => {
                let delta_rows = (f64::from(y - self.start_y) / f64::from(cfg.row_height_px)).round() as i64;
                let max_row = i64::from(cfg.max_rows.saturating_sub(1));
                let row = (i64::from(self.orig_row) + delta_rows).clamp(0, max_row) as Row;
                let from = (self.orig_from + delta_frames).max(0);
                Placement::new(self.id, from, self.orig_dur, row)
            }
            DragMode::ResizeStart => {
                let from = (self.orig_from + delta_frames).max(0).min(orig_end - 1);
                Placement::new(self.id, from, orig_end - from, self.orig_row)
            }
            DragMode::ResizeEnd => {
                let duration = (self.orig_dur + delta_frames).max(1);
                Placement::new(self.id, self.orig_from, duration, self.orig_row)
            }
        }
    }

    /// Translate, then snap against adjacent lanes when enabled. Stores and
    /// returns the result.
    pub fn propose(&mut self, x: f32, y: f32, cfg: &EditorConfig, overlays: &[Overlay]) -> (Placement, Option<SnapMatch>) {
        let raw = self.translate(x, y, cfg);
        let snapped = if cfg.snap_enabled {
            snap_placement(&raw, self.mode.snap_edges(), overlays, cfg.snap_threshold)
        } else {
            None
        };
        self.candidate = snapped.map_or(raw, |m| m.placement);
        (self.candidate, snapped)
    }
}

/// What the host draws while a gesture is live. Percentages are relative to
/// the full timeline width and the full lane stack height.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GhostPreview {
    pub placement: Placement,
    pub left_pct: f32,
    pub width_pct: f32,
    pub top_pct: f32,
    pub snap: Option<SnapMatch>,
    /// True when the candidate collides in its lane.
    pub overlaps: bool,
    /// Non-committing push resolution, present only when pushing is enabled.
    pub push: Option<PushResolution>,
}

impl GhostPreview {
    pub fn new(placement: Placement, cfg: &EditorConfig) -> Self {
        let total = cfg.total_duration_frames as f32;
        Self {
            placement,
            left_pct: placement.from as f32 / total * 100.0,
            width_pct: placement.duration_in_frames as f32 / total * 100.0,
            top_pct: placement.row as f32 / cfg.max_rows as f32 * 100.0,
            snap: None,
            overlaps: false,
            push: None,
        }
    }
}
