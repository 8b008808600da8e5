//! Snapshot-based undo/redo over the overlay collection.
//!
//! The history keeps three parts: `past`, `present` and `future`. `present`
//! always mirrors the store's committed state. Every commit is tagged with a
//! [`CommitOrigin`]; only user commits grow `past`, so restoring a snapshot
//! during undo or redo never records itself as a new step.
//!
//! Snapshots are `Arc<Vec<Overlay>>` shared with the store, so recording a
//! commit never copies the collection.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use timeline::Overlay;

pub type Snapshot = Arc<Vec<Overlay>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitOrigin { User, Undo, Redo }

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Label of the action that produced `snapshot`'s successor.
    pub label: String,
    pub snapshot: Snapshot,
}

pub struct HistoryStore {
    past: VecDeque<HistoryEntry>,
    present: Snapshot,
    /// Label of the action that produced `present`.
    present_label: String,
    future: Vec<HistoryEntry>,
    max_entries: usize,
}

impl Default for HistoryStore {
    fn default() -> Self { Self::new(Arc::new(Vec::new()), 0) }
}

impl HistoryStore {
    /// Start a history whose present is `initial`. `max_entries == 0` keeps
    /// every step.
    pub fn new(initial: Snapshot, max_entries: usize) -> Self {
        Self {
            past: VecDeque::new(),
            present: initial,
            present_label: String::new(),
            future: Vec::new(),
            max_entries,
        }
    }

    pub fn present(&self) -> &Snapshot { &self.present }

    /// Record `snapshot` as the new present.
    ///
    /// A user commit pushes the old present onto `past` and drops the redo
    /// branch. Undo/redo commits only resync `present`.
    pub fn record(&mut self, label: &str, snapshot: Snapshot, origin: CommitOrigin) {
        if origin != CommitOrigin::User {
            debug!(label, ?origin, "history resync");
            self.present = snapshot;
            return;
        }
        if Arc::ptr_eq(&snapshot, &self.present) {
            return;
        }

        let previous = std::mem::replace(&mut self.present, snapshot);
        let previous_label = std::mem::replace(&mut self.present_label, label.to_string());
        self.past.push_back(HistoryEntry { label: previous_label, snapshot: previous });
        self.future.clear();

        if self.max_entries > 0 {
            while self.past.len() > self.max_entries {
                self.past.pop_front();
            }
        }

        debug!(label, undo_depth = self.past.len(), "history entry recorded");
    }

    /// Step back. Returns the snapshot the store should restore.
    pub fn undo(&mut self) -> Option<Snapshot> {
        let entry = self.past.pop_back()?;
        let label = std::mem::replace(&mut self.present_label, entry.label);
        let current = std::mem::replace(&mut self.present, entry.snapshot);
        debug!(label = %label, undo_remaining = self.past.len(), "undo");
        self.future.push(HistoryEntry { label, snapshot: current });
        Some(Arc::clone(&self.present))
    }

    /// Step forward again after an undo.
    pub fn redo(&mut self) -> Option<Snapshot> {
        let entry = self.future.pop()?;
        let label = std::mem::replace(&mut self.present_label, entry.label);
        let current = std::mem::replace(&mut self.present, entry.snapshot);
        debug!(label = %self.present_label, redo_remaining = self.future.len(), "redo");
        self.past.push_back(HistoryEntry { label, snapshot: current });
        Some(Arc::clone(&self.present))
    }

    pub fn can_undo(&self) -> bool { !self.past.is_empty() }

    pub fn can_redo(&self) -> bool { !self.future.is_empty() }

    /// Label of the step `undo` would revert.
    pub fn undo_label(&self) -> Option<&str> {
        self.can_undo().then_some(self.present_label.as_str())
    }

    /// Label of the step `redo` would reapply.
    pub fn redo_label(&self) -> Option<&str> {
        self.future.last().map(|e| e.label.as_str())
    }

    pub fn undo_depth(&self) -> usize { self.past.len() }

    pub fn redo_depth(&self) -> usize { self.future.len() }

    /// Forget every step and make `present` the new starting point.
    pub fn clear(&mut self, present: Snapshot) {
        self.past.clear();
        self.future.clear();
        self.present = present;
        self.present_label.clear();
        debug!("history cleared");
    }
}
