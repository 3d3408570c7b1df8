//! Identifier-allocating entity stores.

use std::collections::BTreeMap;

use lane_defence_core::{AttackerId, DefenderId, PickupId, ProjectileId};

/// Identifier types that a [`Store`] can allocate.
pub(crate) trait StoreKey: Copy + Ord {
    /// Wraps the raw allocation index into the typed identifier.
    fn from_index(index: u32) -> Self;
}

impl StoreKey for AttackerId {
    fn from_index(index: u32) -> Self {
        Self::new(index)
    }
}

impl StoreKey for DefenderId {
    fn from_index(index: u32) -> Self {
        Self::new(index)
    }
}

impl StoreKey for ProjectileId {
    fn from_index(index: u32) -> Self {
        Self::new(index)
    }
}

impl StoreKey for PickupId {
    fn from_index(index: u32) -> Self {
        Self::new(index)
    }
}

/// Registry that stores one entity kind and manages identifier allocation.
///
/// Identifiers are never reused within a session, so a stale identifier held
/// by a system can only miss, never alias a newer entity.
#[derive(Debug)]
pub(crate) struct Store<K, V> {
    entries: BTreeMap<K, V>,
    next_index: u32,
}

impl<K: StoreKey, V> Store<K, V> {
    /// Creates an empty store with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_index: 0,
        }
    }

    /// Allocates the next identifier and stores the entity built for it.
    pub(crate) fn insert_with(&mut self, build: impl FnOnce(K) -> V) -> K {
        let id = K::from_index(self.next_index);
        self.next_index = self.next_index.wrapping_add(1);
        let _ = self.entries.insert(id, build(id));
        id
    }

    pub(crate) fn get(&self, id: K) -> Option<&V> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: K) -> Option<&mut V> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: K) -> Option<V> {
        self.entries.remove(&id)
    }

    /// Iterates entities in identifier order.
    pub(crate) fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    /// Iterates entities mutably in identifier order.
    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.entries.values_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_starts_empty_with_zero_identifier() {
        let store: Store<AttackerId, u8> = Store::new();
        assert_eq!(store.len(), 0);
        assert_eq!(store.next_index, 0);
    }

    #[test]
    fn identifiers_are_not_reused_after_removal() {
        let mut store: Store<PickupId, &str> = Store::new();
        let first = store.insert_with(|_| "first");
        assert_eq!(store.remove(first), Some("first"));

        let second = store.insert_with(|_| "second");
        assert_eq!(first, PickupId::new(0));
        assert_eq!(second, PickupId::new(1));
        assert!(store.get(first).is_none());
    }

    #[test]
    fn builder_receives_allocated_identifier() {
        let mut store: Store<DefenderId, DefenderId> = Store::new();
        let id = store.insert_with(|id| id);
        assert_eq!(store.get(id), Some(&id));

        if let Some(value) = store.get_mut(id) {
            *value = DefenderId::new(99);
        }
        assert_eq!(store.values().copied().collect::<Vec<_>>(), vec![DefenderId::new(99)]);
    }
}
