use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::caption::Caption;
use crate::{Frame, TimelineError};

pub type OverlayId = u64;
pub type Row = u32;

/// On-canvas geometry. Carried through every edit untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OverlayKind {
    #[serde(rename = "text")]
    Text { content: String },

    #[serde(rename = "image")]
    Image { src: String },

    #[serde(rename = "shape")]
    Shape { content: String },

    /// `media_start_offset` is the frame inside the source file that plays at `from`.
    #[serde(rename = "video")]
    Video {
        src: String,
        #[serde(default)]
        content: String,
        #[serde(default)]
        media_start_offset: Frame,
    },

    #[serde(rename = "sound")]
    Sound {
        src: String,
        #[serde(default)]
        content: String,
        #[serde(default)]
        media_start_offset: Frame,
    },

    #[serde(rename = "caption")]
    Caption { captions: Vec<Caption> },

    #[serde(rename = "sticker")]
    Sticker { content: String, #[serde(default)] category: String },

    #[serde(rename = "template")]
    Template { template_id: String },
}

impl OverlayKind {
    pub fn name(&self) -> &'static str {
        match self {
            OverlayKind::Text { .. } => "text",
            OverlayKind::Image { .. } => "image",
            OverlayKind::Shape { .. } => "shape",
            OverlayKind::Video { .. } => "video",
            OverlayKind::Sound { .. } => "sound",
            OverlayKind::Caption { .. } => "caption",
            OverlayKind::Sticker { .. } => "sticker",
            OverlayKind::Template { .. } => "template",
        }
    }

    pub fn is_video(&self) -> bool { matches!(self, OverlayKind::Video { .. }) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    pub id: OverlayId,
    pub from: Frame,
    pub duration_in_frames: Frame,
    pub row: Row,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub styles: Value,
    #[serde(flatten)]
    pub kind: OverlayKind,
}

impl Overlay {
    pub fn end(&self) -> Frame { self.from + self.duration_in_frames }

    pub fn placement(&self) -> Placement {
        Placement { id: self.id, from: self.from, duration_in_frames: self.duration_in_frames, row: self.row }
    }

    /// Copy the temporal fields of `placement` onto this overlay.
    pub fn apply_placement(&mut self, placement: &Placement) {
        self.from = placement.from;
        self.duration_in_frames = placement.duration_in_frames;
        self.row = placement.row;
    }

    pub fn validate_span(&self) -> Result<(), TimelineError> {
        validate_span(self.from, self.duration_in_frames)
    }
}

/// An overlay that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayDraft {
    pub from: Frame,
    pub duration_in_frames: Frame,
    pub row: Row,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub styles: Value,
    #[serde(flatten)]
    pub kind: OverlayKind,
}

impl OverlayDraft {
    pub fn new(from: Frame, duration_in_frames: Frame, row: Row, kind: OverlayKind) -> Self {
        Self { from, duration_in_frames, row, layout: Layout::default(), styles: Value::Null, kind }
    }

    pub fn with_id(self, id: OverlayId) -> Overlay {
        Overlay {
            id,
            from: self.from,
            duration_in_frames: self.duration_in_frames,
            row: self.row,
            layout: self.layout,
            styles: self.styles,
            kind: self.kind,
        }
    }
}

/// Candidate interval and lane for one overlay. This is what the gesture
/// pipeline proposes and the resolver validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    pub id: OverlayId,
    pub from: Frame,
    pub duration_in_frames: Frame,
    pub row: Row,
}

impl Placement {
    pub fn new(id: OverlayId, from: Frame, duration_in_frames: Frame, row: Row) -> Self {
        Self { id, from, duration_in_frames, row }
    }

    pub fn end(&self) -> Frame { self.from + self.duration_in_frames }

    /// Twice the centre frame, kept integral so ties compare exactly.
    pub fn center_x2(&self) -> Frame { 2 * self.from + self.duration_in_frames }

    pub fn shifted(&self, delta: Frame) -> Self { Self { from: self.from + delta, ..*self } }

    pub fn validate_span(&self) -> Result<(), TimelineError> {
        validate_span(self.from, self.duration_in_frames)
    }
}

pub(crate) fn validate_span(from: Frame, duration: Frame) -> Result<(), TimelineError> {
    if from < 0 || duration < 1 {
        return Err(TimelineError::InvalidSpan { from, duration });
    }
    Ok(())
}
