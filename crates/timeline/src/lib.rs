//! Frame-indexed overlay model and the pure scheduling algorithms that run
//! over it: lane overlap checks, push propagation, adjacent-lane edge
//! snapping, split/duplicate placement, and whole-collection checks.
//!
//! Everything here is synchronous and side-effect free apart from `tracing`
//! output. Ownership of the live overlay collection lives in the `editor`
//! crate; this crate only reads slices of overlays and returns proposals.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod caption;
pub mod check;
pub mod edit;
pub mod overlap;
pub mod overlay;
pub mod snap;

pub use caption::{collapses_at, Caption, CaptionWord};
pub use check::{find_violations, lanes_are_exclusive, spans_intersect, Violation};
pub use edit::{duplicate_from, split_overlay};
pub use overlap::{check_overlap, colliding_ids, intervals_overlap, resolve_push, PushDirection, PushResolution, DEFAULT_OVERLAP_BUFFER};
pub use overlay::{Layout, Overlay, OverlayDraft, OverlayId, OverlayKind, Placement, Row};
pub use snap::{snap_placement, SnapEdge, SnapEdges, SnapMatch, DEFAULT_SNAP_THRESHOLD};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimelineError {
    #[error("split frame {frame} is outside overlay {id} span [{from}, {end})")]
    InvalidSplitPoint { id: OverlayId, frame: Frame, from: Frame, end: Frame },

    #[error("no collision-free placement for overlay {id}")]
    InfeasiblePlacement { id: OverlayId },

    #[error("invalid span: from={from} duration={duration}")]
    InvalidSpan { from: Frame, duration: Frame },

    #[error("invalid operation: {0}")]
    InvalidOp(String),
}

pub type Frame = i64; // 0-based time in frames

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fps {
    pub num: u32,
    pub den: u32,
}

impl Default for Fps {
    fn default() -> Self { Self::new(30, 1) }
}

impl Fps {
    pub const fn new(num: u32, den: u32) -> Self { Self { num, den } }

    pub fn as_f64(&self) -> f64 {
        if self.den == 0 { return 0.0; }
        self.num as f64 / self.den as f64
    }

    pub fn frames_to_seconds(&self, frames: Frame) -> f64 {
        if self.num == 0 { return 0.0; }
        frames as f64 * self.den.max(1) as f64 / self.num as f64
    }

    pub fn frames_to_ms(&self, frames: Frame) -> f64 {
        if self.num == 0 { return 0.0; }
        frames as f64 * 1000.0 * self.den.max(1) as f64 / self.num as f64
    }

    pub fn ms_to_frames(&self, ms: f64) -> Frame { (ms / 1000.0 * self.as_f64()).round() as Frame }

    /// `MM:SS:FF` display string. Negative inputs render as zero.
    pub fn format_timecode(&self, frames: Frame) -> String {
        let per_sec = self.as_f64().round().max(1.0) as Frame;
        let frames = frames.max(0);
        let total_secs = frames / per_sec;
        format!("{:02}:{:02}:{:02}", total_secs / 60, total_secs % 60, frames % per_sec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_conversions() {
        let fps = Fps::default();
        assert_eq!(fps.frames_to_ms(30), 1000.0);
        assert_eq!(fps.frames_to_ms(15), 500.0);
        assert_eq!(fps.ms_to_frames(2000.0), 60);

        let ntsc = Fps::new(30000, 1001);
        assert!((ntsc.frames_to_seconds(30000) - 1001.0).abs() < 1e-9);
    }

    #[test]
    fn zero_fps_is_harmless() {
        let fps = Fps::new(0, 1);
        assert_eq!(fps.frames_to_seconds(100), 0.0);
        assert_eq!(fps.format_timecode(10), "00:10:00");
    }

    #[test]
    fn timecode_display() {
        let fps = Fps::default();
        assert_eq!(fps.format_timecode(0), "00:00:00");
        assert_eq!(fps.format_timecode(95), "00:03:05");
        assert_eq!(fps.format_timecode(30 * 125 + 7), "02:05:07");
        assert_eq!(fps.format_timecode(-4), "00:00:00");
    }
}
