//! Adjacent-lane edge snapping.
//!
//! While an overlay is dragged, its relevant edges are compared against the
//! start/end edges of overlays in the lanes directly above and below. The
//! closest edge within the threshold wins and the candidate is rewritten so
//! that edge lands on it exactly.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::overlay::{Overlay, OverlayId, Placement};
use crate::Frame;

pub const DEFAULT_SNAP_THRESHOLD: Frame = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SnapEdge { Start, End }

/// Which candidate edges a gesture is allowed to snap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapEdges {
    pub start: bool,
    pub end: bool,
}

impl SnapEdges {
    pub const BOTH: SnapEdges = SnapEdges { start: true, end: true };
    pub const START: SnapEdges = SnapEdges { start: true, end: false };
    pub const END: SnapEdges = SnapEdges { start: false, end: true };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapMatch {
    /// Candidate after snapping.
    pub placement: Placement,
    pub edge: SnapEdge,
    pub target_frame: Frame,
    pub target_id: OverlayId,
}

fn adjacent(row: u32, other: u32) -> bool { row.abs_diff(other) == 1 }

/// Snap `candidate` to the nearest adjacent-lane edge, if any lies within
/// `threshold` frames.
///
/// With both edges enabled (a move) the interval keeps its duration and is
/// shifted. With one edge enabled (a resize) the opposite edge stays put and
/// the duration is recomputed with a floor of one frame. Matches that would
/// push the start below zero are skipped. Ties go to the lower neighbour id,
/// then start edges before end edges.
pub fn snap_placement(
    candidate: &Placement,
    edges: SnapEdges,
    overlays: &[Overlay],
    threshold: Frame,
) -> Option<SnapMatch> {
    let mut best: Option<(Frame, OverlayId, SnapEdge, SnapEdge, Frame)> = None;

    for other in overlays.iter().filter(|o| o.id != candidate.id && adjacent(candidate.row, o.row)) {
        for (own_edge, own_frame) in [(SnapEdge::Start, candidate.from), (SnapEdge::End, candidate.end())] {
            let enabled = match own_edge {
                SnapEdge::Start => edges.start,
                SnapEdge::End => edges.end,
            };
            if !enabled { continue; }

            for (their_edge, target) in [(SnapEdge::Start, other.from), (SnapEdge::End, other.end())] {
                let distance = (own_frame - target).abs();
                if distance > threshold { continue; }
                if own_edge == SnapEdge::End && edges.start && target - candidate.duration_in_frames < 0 {
                    continue;
                }
                let key = (distance, other.id, own_edge, their_edge, target);
                if best.map_or(true, |b| key < b) {
                    best = Some(key);
                }
            }
        }
    }

    let (distance, target_id, edge, _, target_frame) = best?;
    let placement = apply_snap(candidate, edges, edge, target_frame);
    trace!(id = candidate.id, target_id, target_frame, distance, "edge snapped");
    Some(SnapMatch { placement, edge, target_frame, target_id })
}

fn apply_snap(candidate: &Placement, edges: SnapEdges, edge: SnapEdge, target: Frame) -> Placement {
    let end = candidate.end();
    match (edges.start && edges.end, edge) {
        (true, SnapEdge::Start) => Placement { from: target, ..*candidate },
        (true, SnapEdge::End) => Placement { from: target - candidate.duration_in_frames, ..*candidate },
        (false, SnapEdge::Start) => {
            let from = target.min(end - 1);
            Placement { from, duration_in_frames: end - from, ..*candidate }
        }
        (false, SnapEdge::End) => {
            Placement { duration_in_frames: (target - candidate.from).max(1), ..*candidate }
        }
    }
}
