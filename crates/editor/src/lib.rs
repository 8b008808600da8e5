//! Interactive editing on top of the `timeline` model.
//!
//! [`Editor`] is the entry point. It owns the [`OverlayStore`] (the only
//! writer of committed overlays), the [`HistoryStore`] of snapshots, and at
//! most one live pointer gesture. Hosts drive it either through its methods
//! or through serialized [`EditorCommand`]s.

use thiserror::Error;

use timeline::{Frame, OverlayId, Row, TimelineError};

pub mod command;
pub mod config;
pub mod editor;
pub mod history;
pub mod interaction;
pub mod keyframes;
pub mod store;

pub use command::{CommandOutcome, EditorCommand};
pub use config::{ConfigError, EditorConfig};
pub use editor::{Editor, GestureCommit};
pub use history::{CommitOrigin, HistoryEntry, HistoryStore, Snapshot};
pub use interaction::{DragMode, DragState, GhostPreview};
pub use keyframes::{KeyframeCache, ThumbnailCache};
pub use store::{OverlayPatch, OverlayStore, OverlayTransform, OverlayUpdate};

/// Recoverable editing failures. Every operation that returns one of these
/// has left the editor exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("overlay {0} not found")]
    NotFound(OverlayId),

    #[error(transparent)]
    Timeline(#[from] TimelineError),

    #[error("no collision-free placement for overlay {id}")]
    InfeasiblePlacement { id: OverlayId },

    #[error("row {row} is already occupied around frame {from}")]
    LaneOccupied { row: Row, from: Frame },

    #[error("row {row} is outside 0..{max_rows}")]
    RowOutOfRange { row: Row, max_rows: Row },

    #[error("no overlay ids left to hand out")]
    IdsExhausted,

    #[error("no gesture in progress")]
    NoActiveGesture,

    #[error("gesture on overlay {id} is already in progress")]
    GestureInProgress { id: OverlayId },
}
