//! The overlay collection and the selection.
//!
//! The collection is held behind an `Arc` and written through
//! `Arc::make_mut`, so [`OverlayStore::snapshot`] is a pointer copy and a
//! mutation only clones the vector when a history snapshot still shares it.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use timeline::{
    duplicate_from, split_overlay, Fps, Frame, Layout, Overlay, OverlayDraft, OverlayId, OverlayKind, Placement, Row,
};

use crate::keyframes::KeyframeCache;
use crate::EditError;

/// Field-wise partial update. `None` leaves the field alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayPatch {
    pub from: Option<Frame>,
    pub duration_in_frames: Option<Frame>,
    pub row: Option<Row>,
    pub layout: Option<Layout>,
    pub styles: Option<Value>,
    pub kind: Option<OverlayKind>,
}

impl OverlayPatch {
    /// Patch carrying only the temporal fields of `placement`.
    pub fn placement(placement: &Placement) -> Self {
        Self {
            from: Some(placement.from),
            duration_in_frames: Some(placement.duration_in_frames),
            row: Some(placement.row),
            ..Default::default()
        }
    }

    fn apply(self, overlay: &Overlay) -> Overlay {
        let mut next = overlay.clone();
        if let Some(from) = self.from { next.from = from; }
        if let Some(duration) = self.duration_in_frames { next.duration_in_frames = duration; }
        if let Some(row) = self.row { next.row = row; }
        if let Some(layout) = self.layout { next.layout = layout; }
        if let Some(styles) = self.styles { next.styles = styles; }
        if let Some(kind) = self.kind { next.kind = kind; }
        next
    }
}

pub type OverlayTransform = Box<dyn FnOnce(&Overlay) -> Overlay>;

/// Either a partial patch or a function from the previous overlay to the next.
pub enum OverlayUpdate {
    Patch(OverlayPatch),
    Transform(OverlayTransform),
}

impl OverlayUpdate {
    pub fn transform(f: impl FnOnce(&Overlay) -> Overlay + 'static) -> Self {
        OverlayUpdate::Transform(Box::new(f))
    }

    fn apply(self, overlay: &Overlay) -> Overlay {
        match self {
            OverlayUpdate::Patch(patch) => patch.apply(overlay),
            OverlayUpdate::Transform(f) => f(overlay),
        }
    }
}

impl From<OverlayPatch> for OverlayUpdate {
    fn from(patch: OverlayPatch) -> Self { OverlayUpdate::Patch(patch) }
}

impl fmt::Debug for OverlayUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlayUpdate::Patch(patch) => f.debug_tuple("Patch").field(patch).finish(),
            OverlayUpdate::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

pub struct OverlayStore {
    overlays: Arc<Vec<Overlay>>,
    selected: Option<OverlayId>,
    keyframes: Option<Arc<dyn KeyframeCache>>,
    fps: Fps,
    overlap_buffer: Frame,
}

impl Default for OverlayStore {
    fn default() -> Self { Self::new(Fps::default(), timeline::DEFAULT_OVERLAP_BUFFER) }
}

impl OverlayStore {
    pub fn new(fps: Fps, overlap_buffer: Frame) -> Self {
        Self { overlays: Arc::new(Vec::new()), selected: None, keyframes: None, fps, overlap_buffer }
    }

    pub fn set_keyframe_cache(&mut self, cache: Arc<dyn KeyframeCache>) {
        self.keyframes = Some(cache);
    }

    pub fn overlays(&self) -> &[Overlay] { &self.overlays }

    pub fn get(&self, id: OverlayId) -> Option<&Overlay> { self.overlays.iter().find(|o| o.id == id) }

    pub fn selected(&self) -> Option<OverlayId> { self.selected }

    pub fn select(&mut self, id: Option<OverlayId>) -> Result<(), EditError> {
        if let Some(id) = id {
            self.position(id)?;
        }
        self.selected = id;
        Ok(())
    }

    fn position(&self, id: OverlayId) -> Result<usize, EditError> {
        self.overlays.iter().position(|o| o.id == id).ok_or(EditError::NotFound(id))
    }

    fn next_id(&self) -> Result<OverlayId, EditError> {
        match self.overlays.iter().map(|o| o.id).max() {
            None => Ok(0),
            Some(max) => max.checked_add(1).ok_or(EditError::IdsExhausted),
        }
    }

    /// Insert `draft` under a fresh id and select it.
    pub fn add(&mut self, draft: OverlayDraft) -> Result<OverlayId, EditError> {
        let overlay = draft.with_id(self.next_id()?);
        overlay.validate_span()?;
        let id = overlay.id;
        debug!(id, kind = overlay.kind.name(), from = overlay.from, row = overlay.row, "overlay added");
        Arc::make_mut(&mut self.overlays).push(overlay);
        self.selected = Some(id);
        Ok(id)
    }

    /// Replace overlay `id` with the result of `update`. The id always
    /// survives. Lane collisions are the caller's responsibility.
    pub fn update(&mut self, id: OverlayId, update: impl Into<OverlayUpdate>) -> Result<(), EditError> {
        self.update_checked(id, update, |_| Ok(()))
    }

    /// Like [`OverlayStore::update`], but `accept` gets to veto the result
    /// before it is written.
    pub fn update_checked(
        &mut self,
        id: OverlayId,
        update: impl Into<OverlayUpdate>,
        accept: impl FnOnce(&Overlay) -> Result<(), EditError>,
    ) -> Result<(), EditError> {
        let idx = self.position(id)?;
        let mut next = update.into().apply(&self.overlays[idx]);
        next.id = id;
        next.validate_span()?;
        accept(&next)?;
        Arc::make_mut(&mut self.overlays)[idx] = next;
        Ok(())
    }

    /// Move several overlays at once. Either every placement lands or none does.
    pub fn apply_placements(&mut self, placements: &[Placement]) -> Result<(), EditError> {
        let mut indices = Vec::with_capacity(placements.len());
        for p in placements {
            indices.push(self.position(p.id)?);
            p.validate_span()?;
        }
        let overlays = Arc::make_mut(&mut self.overlays);
        for (idx, p) in indices.into_iter().zip(placements) {
            overlays[idx].apply_placement(p);
        }
        Ok(())
    }

    /// Remove overlay `id`, telling the keyframe cache first if it is a video.
    pub fn delete(&mut self, id: OverlayId) -> Result<Overlay, EditError> {
        let idx = self.position(id)?;
        self.before_delete(&self.overlays[idx]);
        let removed = Arc::make_mut(&mut self.overlays).remove(idx);
        if self.selected == Some(id) {
            self.selected = None;
        }
        debug!(id, "overlay deleted");
        Ok(removed)
    }

    /// Remove every overlay in `row`, returning their ids.
    pub fn delete_by_row(&mut self, row: Row) -> Vec<OverlayId> {
        let doomed: Vec<OverlayId> = self.overlays.iter().filter(|o| o.row == row).map(|o| o.id).collect();
        if doomed.is_empty() {
            return doomed;
        }
        for overlay in self.overlays.iter().filter(|o| o.row == row) {
            self.before_delete(overlay);
        }
        Arc::make_mut(&mut self.overlays).retain(|o| o.row != row);
        if self.selected.is_some_and(|id| doomed.contains(&id)) {
            self.selected = None;
        }
        debug!(row, removed = doomed.len(), "row cleared");
        doomed
    }

    fn before_delete(&self, overlay: &Overlay) {
        if let (Some(cache), true) = (&self.keyframes, overlay.kind.is_video()) {
            cache.invalidate(overlay.id);
        }
    }

    /// Copy overlay `id` into the first free slot after it in its lane and
    /// select the copy.
    pub fn duplicate(&mut self, id: OverlayId) -> Result<OverlayId, EditError> {
        let idx = self.position(id)?;
        let new_id = self.next_id()?;
        let copy = duplicate_from(&self.overlays, &self.overlays[idx], new_id, self.overlap_buffer).map_err(|err| {
            warn!(id, %err, "duplicate rejected");
            err
        })?;
        debug!(id, new_id, from = copy.from, "overlay duplicated");
        Arc::make_mut(&mut self.overlays).push(copy);
        self.selected = Some(new_id);
        Ok(new_id)
    }

    /// Cut overlay `id` at `at_frame`. The head keeps `id`; the tail gets a
    /// fresh id and is inserted right after it.
    pub fn split(&mut self, id: OverlayId, at_frame: Frame) -> Result<OverlayId, EditError> {
        let idx = self.position(id)?;
        let new_id = self.next_id()?;
        let (head, tail) = split_overlay(&self.overlays[idx], at_frame, self.fps, new_id).map_err(|err| {
            warn!(id, at_frame, %err, "split rejected");
            err
        })?;
        debug!(id, new_id, at_frame, "overlay split");
        let overlays = Arc::make_mut(&mut self.overlays);
        overlays[idx] = head;
        overlays.insert(idx + 1, tail);
        Ok(new_id)
    }

    /// Drop every overlay and the whole keyframe cache.
    pub fn reset(&mut self) {
        if let Some(cache) = &self.keyframes {
            cache.invalidate_all();
        }
        self.overlays = Arc::new(Vec::new());
        self.selected = None;
        debug!("store reset");
    }

    /// Cheap shared copy of the committed collection.
    pub fn snapshot(&self) -> Arc<Vec<Overlay>> { Arc::clone(&self.overlays) }

    /// Replace the collection with `snapshot`. Video overlays that do not
    /// survive the swap are invalidated like a delete.
    pub fn restore(&mut self, snapshot: Arc<Vec<Overlay>>) {
        for overlay in self.overlays.iter() {
            if !snapshot.iter().any(|o| o.id == overlay.id) {
                self.before_delete(overlay);
            }
        }
        if self.selected.is_some_and(|id| !snapshot.iter().any(|o| o.id == id)) {
            self.selected = None;
        }
        self.overlays = snapshot;
    }
}
