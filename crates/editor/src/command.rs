//! Serializable command vocabulary for driving an [`Editor`](crate::Editor)
//! from scripts, IPC or tests.

use serde::{Deserialize, Serialize};

use timeline::{Frame, OverlayDraft, OverlayId, Row};

use crate::editor::GestureCommit;
use crate::interaction::{DragMode, GhostPreview};
use crate::store::OverlayPatch;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum EditorCommand {
    Add { overlay: OverlayDraft },
    Update { id: OverlayId, patch: OverlayPatch },
    Delete { id: OverlayId },
    DeleteByRow { row: Row },
    Duplicate { id: OverlayId },
    Split { id: OverlayId, at_frame: Frame },
    Undo,
    Redo,
    Reset,
    Select { id: Option<OverlayId> },
    BeginGesture { id: OverlayId, x: f32, y: f32, mode: DragMode },
    MoveGesture { x: f32, y: f32 },
    EndGesture,
    CancelGesture,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    Done,
    Created { id: OverlayId },
    Removed { ids: Vec<OverlayId> },
    /// Undo, redo or cancel; `changed` is false when there was nothing to do.
    Stepped { changed: bool },
    Ghost { preview: GhostPreview },
    Committed { commit: GestureCommit },
}
