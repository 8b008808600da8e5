//! Lane collision checks and push propagation.
//!
//! Intervals are compared with a small symmetric buffer (in frames). With the
//! default buffer of one frame, two overlays that merely touch count as
//! colliding, so a committed lane always keeps at least one free frame
//! between neighbours and resolved pushes land one frame clear.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::overlay::{Overlay, OverlayId, Placement};
use crate::Frame;

pub const DEFAULT_OVERLAP_BUFFER: Frame = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PushDirection { Left, Right }

/// Outcome of [`resolve_push`]. `pushed_items` maps each displaced overlay to
/// its signed frame delta relative to its committed `from`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushResolution {
    pub can_push: bool,
    pub pushed_items: BTreeMap<OverlayId, Frame>,
}

impl PushResolution {
    fn infeasible() -> Self { Self { can_push: false, pushed_items: BTreeMap::new() } }

    pub fn is_noop(&self) -> bool { self.can_push && self.pushed_items.is_empty() }
}

/// Buffered interval test between a moving `candidate` and a resting `other`.
pub fn intervals_overlap(candidate: &Placement, other: &Placement, buffer: Frame) -> bool {
    let (start, end) = (candidate.from, candidate.end());
    let (o_start, o_end) = (other.from, other.end());

    let start_inside = start >= o_start - buffer && start < o_end + buffer;
    let end_inside = end > o_start - buffer && end <= o_end + buffer;
    let encompasses = start <= o_start && end >= o_end;
    start_inside || end_inside || encompasses
}

fn same_lane<'a>(candidate: &'a Placement, overlays: &'a [Overlay]) -> impl Iterator<Item = &'a Overlay> + 'a {
    overlays.iter().filter(move |o| o.row == candidate.row && o.id != candidate.id)
}

/// True when `candidate` collides with any other overlay in its lane.
pub fn check_overlap(candidate: &Placement, overlays: &[Overlay], buffer: Frame) -> bool {
    same_lane(candidate, overlays).any(|o| intervals_overlap(candidate, &o.placement(), buffer))
}

/// Ids of lane neighbours that collide with `candidate`.
pub fn colliding_ids(candidate: &Placement, overlays: &[Overlay], buffer: Frame) -> Vec<OverlayId> {
    same_lane(candidate, overlays)
        .filter(|o| intervals_overlap(candidate, &o.placement(), buffer))
        .map(|o| o.id)
        .collect()
}

/// Work out how far each lane neighbour has to move so `candidate` fits.
///
/// Neighbours hit by the candidate directly move away from it, left when
/// their centre lies left of the candidate's centre and right otherwise
/// (equal centres push right). A displaced neighbour is then re-checked
/// against the rest of the lane and keeps its direction down the chain. The
/// whole resolution fails when an item would be pushed both ways, below frame
/// zero, or back into the candidate.
///
/// Hits going the same way are placed farthest first, so each nearer one
/// then packs the farther ones behind it and lane order is preserved.
pub fn resolve_push(candidate: &Placement, overlays: &[Overlay], buffer: Frame) -> PushResolution {
    let mut lane: BTreeMap<OverlayId, Placement> =
        same_lane(candidate, overlays).map(|o| (o.id, o.placement())).collect();
    let original: BTreeMap<OverlayId, Frame> = lane.iter().map(|(id, p)| (*id, p.from)).collect();

    let mut settled: BTreeMap<OverlayId, PushDirection> = BTreeMap::new();
    let mut work: Vec<(Placement, Option<PushDirection>)> = vec![(*candidate, None)];

    // Each item only ever moves one way, so the chain is finite; the cap is
    // a backstop against a lane that keeps re-colliding.
    let budget = (lane.len() + 1).pow(2) * 4;
    let mut steps = 0usize;

    while let Some((mover, inherited)) = work.pop() {
        // moved again since this entry was queued
        if mover.id != candidate.id && lane.get(&mover.id) != Some(&mover) {
            continue;
        }

        let mut hits: Vec<(Placement, PushDirection)> = lane
            .values()
            .filter(|p| p.id != mover.id && intervals_overlap(&mover, p, buffer))
            .map(|p| (*p, inherited.unwrap_or_else(|| direction_from(&mover, p))))
            .collect();
        hits.sort_by_key(|(p, direction)| match direction {
            PushDirection::Right => (1, -p.from),
            PushDirection::Left => (0, p.from),
        });

        for (hit, direction) in hits {
            steps += 1;
            if steps > budget {
                debug!(id = candidate.id, steps, "push resolution exceeded its step budget");
                return PushResolution::infeasible();
            }

            if let Some(prev) = settled.get(&hit.id) {
                if *prev != direction {
                    debug!(id = hit.id, "conflicting push directions");
                    return PushResolution::infeasible();
                }
            }

            let new_from = match direction {
                PushDirection::Right => mover.end() + buffer,
                PushDirection::Left => mover.from - buffer - hit.duration_in_frames,
            };
            if new_from < 0 {
                debug!(id = hit.id, new_from, "push would move overlay before frame zero");
                return PushResolution::infeasible();
            }

            let moved = Placement { from: new_from, ..hit };
            if mover.id != candidate.id && intervals_overlap(candidate, &moved, buffer) {
                return PushResolution::infeasible();
            }

            lane.insert(hit.id, moved);
            settled.insert(hit.id, direction);
            work.push((moved, Some(direction)));
        }
    }

    let pushed_items = lane
        .iter()
        .filter_map(|(id, p)| {
            let delta = p.from - original[id];
            (delta != 0).then_some((*id, delta))
        })
        .collect::<BTreeMap<_, _>>();

    if !pushed_items.is_empty() {
        debug!(id = candidate.id, pushed = pushed_items.len(), "push resolved");
    }
    PushResolution { can_push: true, pushed_items }
}

fn direction_from(mover: &Placement, hit: &Placement) -> PushDirection {
    if hit.center_x2() < mover.center_x2() { PushDirection::Left } else { PushDirection::Right }
}
