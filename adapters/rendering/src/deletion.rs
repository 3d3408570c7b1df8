//! Deferred release of visual handles, collected once per tick.

use std::collections::{BTreeMap, BTreeSet};

use lane_defence_core::{CellCoord, EntityKey, InventorySlot};

use crate::{VisualBackend, VisualHandle};

/// Name under which a visual is registered with the deletion manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VisualKey {
    /// Visual of an entity held by one of the world's stores.
    Entity(EntityKey),
    /// Remaining-life marker at the given index.
    Life(u32),
    /// Collected pickup shown at the given wallet position.
    Wallet(usize),
    /// Template clone carried by a drag, numbered per gesture.
    Held(u32),
    /// Inventory template.
    Template(InventorySlot),
    /// Placement cell.
    Cell(CellCoord),
    /// Base rectangle.
    Base,
    /// Visual built for an entity the world then declined to create.
    Unclaimed(VisualHandle),
}

/// Defers the release of visual resources to a single collection point.
///
/// Marking is an idempotent set insert. [`DeferredDeletion::flush`] releases
/// the handle registered for every marked key, forgets the key and clears the
/// mark set, so no observer ever sees a handle released mid-tick.
#[derive(Debug, Default)]
pub struct DeferredDeletion {
    handles: BTreeMap<VisualKey, VisualHandle>,
    marked: BTreeSet<VisualKey>,
}

impl DeferredDeletion {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates `handle` with `key`, returning the handle it replaces.
    pub fn register(&mut self, key: VisualKey, handle: VisualHandle) -> Option<VisualHandle> {
        self.handles.insert(key, handle)
    }

    /// Handle registered under `key`.
    #[must_use]
    pub fn handle(&self, key: VisualKey) -> Option<VisualHandle> {
        self.handles.get(&key).copied()
    }

    /// Every registered key with its handle, in key order.
    pub fn handles(&self) -> impl Iterator<Item = (VisualKey, VisualHandle)> + '_ {
        self.handles.iter().map(|(key, handle)| (*key, *handle))
    }

    /// Number of registered handles, marked or not.
    #[must_use]
    pub fn registered_len(&self) -> usize {
        self.handles.len()
    }

    /// Marks `key` for release at the next flush. Returns `false` when the key
    /// was already marked.
    pub fn mark_for_deletion(&mut self, key: VisualKey) -> bool {
        self.marked.insert(key)
    }

    /// Reports whether `key` awaits the next flush.
    #[must_use]
    pub fn is_marked(&self, key: VisualKey) -> bool {
        self.marked.contains(&key)
    }

    /// Number of keys awaiting the next flush.
    #[must_use]
    pub fn marked_len(&self) -> usize {
        self.marked.len()
    }

    /// Releases every marked visual and clears the mark set.
    ///
    /// Returns the number of handles handed back to the backend. Marked keys
    /// without a registered handle are dropped silently.
    pub fn flush<B: VisualBackend + ?Sized>(&mut self, backend: &mut B) -> usize {
        let mut released = 0;
        for key in std::mem::take(&mut self.marked) {
            if let Some(handle) = self.handles.remove(&key) {
                backend.release_visual(handle);
                released += 1;
            }
        }
        if released > 0 {
            tracing::debug!(released, "flushed deferred deletions");
        }
        released
    }
}
