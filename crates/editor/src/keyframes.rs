//! Per-overlay keyframe thumbnail cache.
//!
//! Thumbnails are produced outside the editor (a decoder thread, usually) and
//! keyed by overlay id. The store only needs to tell the cache when an id
//! stops meaning anything, which is what [`KeyframeCache`] captures.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use timeline::OverlayId;

/// Invalidation hook called from the store's delete path.
pub trait KeyframeCache: Send + Sync {
    fn invalidate(&self, id: OverlayId);
    fn invalidate_all(&self);
}

/// Thread-safe thumbnail map. Clones share the same storage, so one handle
/// can live in the store while another is filled by a render thread.
pub struct ThumbnailCache<T> {
    entries: Arc<Mutex<HashMap<OverlayId, Vec<T>>>>,
}

impl<T> Clone for ThumbnailCache<T> {
    fn clone(&self) -> Self { Self { entries: Arc::clone(&self.entries) } }
}

impl<T> Default for ThumbnailCache<T> {
    fn default() -> Self { Self { entries: Arc::new(Mutex::new(HashMap::new())) } }
}

impl<T: Clone> ThumbnailCache<T> {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&self, id: OverlayId, frames: Vec<T>) {
        self.entries.lock().insert(id, frames);
    }

    pub fn get(&self, id: OverlayId) -> Option<Vec<T>> {
        self.entries.lock().get(&id).cloned()
    }

    pub fn contains(&self, id: OverlayId) -> bool { self.entries.lock().contains_key(&id) }

    pub fn len(&self) -> usize { self.entries.lock().len() }

    pub fn is_empty(&self) -> bool { self.entries.lock().is_empty() }
}

impl<T: Send> KeyframeCache for ThumbnailCache<T> {
    fn invalidate(&self, id: OverlayId) {
        if self.entries.lock().remove(&id).is_some() {
            debug!(id, "keyframes invalidated");
        }
    }

    fn invalidate_all(&self) {
        let mut entries = self.entries.lock();
        let dropped = entries.len();
        entries.clear();
        debug!(dropped, "keyframe cache cleared");
    }
}
