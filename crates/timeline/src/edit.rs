//! Split and duplicate: edits that create a second overlay from an existing
//! one without going through the gesture pipeline.

use crate::caption::split_captions;
use crate::overlap::colliding_ids;
use crate::overlay::{Overlay, OverlayId, OverlayKind, Placement};
use crate::{Fps, Frame, TimelineError};

/// Cut `overlay` at `at_frame` into a head (same id) and a tail (`new_id`).
///
/// `at_frame` must lie strictly inside the overlay. Video and sound tails
/// advance their media offset by the head's length so playback stays
/// continuous; caption tails get their words re-timed to the cut.
pub fn split_overlay(
    overlay: &Overlay,
    at_frame: Frame,
    fps: Fps,
    new_id: OverlayId,
) -> Result<(Overlay, Overlay), TimelineError> {
    if at_frame <= overlay.from || at_frame >= overlay.end() {
        return Err(TimelineError::InvalidSplitPoint {
            id: overlay.id,
            frame: at_frame,
            from: overlay.from,
            end: overlay.end(),
        });
    }

    let head_len = at_frame - overlay.from;
    let mut head = overlay.clone();
    head.duration_in_frames = head_len;

    let mut tail = overlay.clone();
    tail.id = new_id;
    tail.from = at_frame;
    tail.duration_in_frames = overlay.end() - at_frame;

    match &mut tail.kind {
        OverlayKind::Video { media_start_offset, .. } | OverlayKind::Sound { media_start_offset, .. } => {
            *media_start_offset += head_len;
        }
        OverlayKind::Caption { captions } => {
            let (left, right) = split_captions(captions, fps.frames_to_ms(head_len));
            *captions = right;
            if let OverlayKind::Caption { captions } = &mut head.kind {
                *captions = left;
            }
        }
        _ => {}
    }

    Ok((head, tail))
}

/// Build a copy of `source` with `new_id`, placed after it in the same lane.
///
/// The copy first tries the frame right after the source. Whenever that
/// collides, it jumps past the latest-ending colliding neighbour and tries
/// again; a lane of n overlays needs at most n + 1 attempts.
pub fn duplicate_from(
    overlays: &[Overlay],
    source: &Overlay,
    new_id: OverlayId,
    buffer: Frame,
) -> Result<Overlay, TimelineError> {
    let gap = buffer.max(1);
    let mut candidate = Placement { id: new_id, from: source.end(), ..source.placement() };
    let attempts = overlays.iter().filter(|o| o.row == source.row).count() + 1;

    for _ in 0..attempts {
        let hits = colliding_ids(&candidate, overlays, buffer);
        if hits.is_empty() {
            let mut copy = source.clone();
            copy.id = new_id;
            copy.apply_placement(&candidate);
            return Ok(copy);
        }
        let latest_end = overlays
            .iter()
            .filter(|o| hits.contains(&o.id))
            .map(Overlay::end)
            .max()
            .unwrap_or(candidate.end());
        candidate.from = latest_end + gap;
    }

    Err(TimelineError::InfeasiblePlacement { id: source.id })
}
