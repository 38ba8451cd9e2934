//! Packed keyed storage.
//!
//! A [`PackedStore`] maps generational [`Entity`] keys to values kept in a
//! single contiguous `Vec`. Lookups go through a sparse
//! [`SecondaryMap`](slotmap::SecondaryMap) that records each key's dense
//! index, so insert, lookup and remove are all O(1) while the values stay
//! densely packed for bulk iteration.
//!
//! Removal swap-removes from the dense arrays: the last element moves into
//! the hole and its sparse entry is patched. Dense indices are therefore only
//! stable between structural mutations.

use slotmap::SecondaryMap;

use crate::entity::Entity;

// ---------------------------------------------------------------------------
// PackedStore
// ---------------------------------------------------------------------------

/// Generational-key sparse set with packed value storage.
#[derive(Debug, Clone)]
pub struct PackedStore<T> {
    /// Key -> dense index.
    sparse: SecondaryMap<Entity, usize>,
    /// Tightly packed values.
    dense: Vec<T>,
    /// Owning key of `dense[i]`.
    keys: Vec<Entity>,
}

impl<T> PackedStore<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            sparse: SecondaryMap::new(),
            dense: Vec::new(),
            keys: Vec::new(),
        }
    }

    /// Create an empty store with room for `capacity` values.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sparse: SecondaryMap::with_capacity(capacity),
            dense: Vec::with_capacity(capacity),
            keys: Vec::with_capacity(capacity),
        }
    }

    /// Insert `value` under an explicit `key`, returning its dense index.
    ///
    /// If the key is already present the value is overwritten in place and
    /// the existing index is returned. Returns `None` if the key is rejected
    /// (the null key, or a key older than the slot's current occupant).
    ///
    /// Callers must remove a key's value before the key's slot is recycled;
    /// otherwise the old value is orphaned in the dense arrays.
    pub fn insert(&mut self, key: Entity, value: T) -> Option<usize> {
        if let Some(&index) = self.sparse.get(key) {
            self.dense[index] = value;
            return Some(index);
        }

        let index = self.dense.len();
        self.sparse.insert(key, index);
        if !self.sparse.contains_key(key) {
            return None;
        }
        self.dense.push(value);
        self.keys.push(key);
        Some(index)
    }

    /// Shared reference to the value stored under `key`.
    #[inline]
    pub fn get(&self, key: Entity) -> Option<&T> {
        let &index = self.sparse.get(key)?;
        self.dense.get(index)
    }

    /// Mutable reference to the value stored under `key`.
    #[inline]
    pub fn get_mut(&mut self, key: Entity) -> Option<&mut T> {
        let &index = self.sparse.get(key)?;
        self.dense.get_mut(index)
    }

    /// Whether `key` currently resolves to a value.
    #[inline]
    pub fn contains_key(&self, key: Entity) -> bool {
        self.sparse.contains_key(key)
    }

    /// Remove and return the value stored under `key`.
    pub fn remove(&mut self, key: Entity) -> Option<T> {
        let index = self.sparse.remove(key)?;
        let value = self.dense.swap_remove(index);
        self.keys.swap_remove(index);

        // Patch the sparse entry of the element moved into the hole.
        if let Some(&moved) = self.keys.get(index) {
            if let Some(slot) = self.sparse.get_mut(moved) {
                *slot = index;
            }
        }
        Some(value)
    }

    /// The key owning the value at dense position `index`.
    #[inline]
    pub fn key_at(&self, index: usize) -> Option<Entity> {
        self.keys.get(index).copied()
    }

    /// Dense position of the value stored under `key`.
    #[inline]
    pub fn index_of(&self, key: Entity) -> Option<usize> {
        self.sparse.get(key).copied()
    }

    /// Number of stored values.
    #[inline]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Whether the store holds no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// All values, densely packed.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.dense
    }

    /// All values, densely packed, mutably.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.dense
    }

    /// Owner keys in dense order (parallel to [`as_slice`](Self::as_slice)).
    #[inline]
    pub fn keys(&self) -> &[Entity] {
        &self.keys
    }

    /// Iterate `(key, value)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.keys.iter().copied().zip(self.dense.iter())
    }

    /// Iterate `(key, value)` pairs in dense order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.keys.iter().copied().zip(self.dense.iter_mut())
    }

    /// Remove every value.
    pub fn clear(&mut self) {
        self.sparse.clear();
        self.dense.clear();
        self.keys.clear();
    }
}

impl<T> Default for PackedStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::{Key, SlotMap};

    fn keys(n: usize) -> (SlotMap<Entity, ()>, Vec<Entity>) {
        let mut map = SlotMap::with_key();
        let keys = (0..n).map(|_| map.insert(())).collect();
        (map, keys)
    }

    #[test]
    fn insert_and_get() {
        let (_map, k) = keys(3);
        let mut store = PackedStore::new();
        assert_eq!(store.insert(k[0], "a"), Some(0));
        assert_eq!(store.insert(k[1], "b"), Some(1));
        assert_eq!(store.get(k[0]), Some(&"a"));
        assert_eq!(store.get(k[1]), Some(&"b"));
        assert_eq!(store.get(k[2]), None);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn insert_existing_key_overwrites_in_place() {
        let (_map, k) = keys(2);
        let mut store = PackedStore::new();
        store.insert(k[0], 1);
        store.insert(k[1], 2);
        assert_eq!(store.insert(k[0], 10), Some(0));
        assert_eq!(store.len(), 2);
        assert_eq!(store.as_slice(), &[10, 2]);
    }

    #[test]
    fn null_key_is_rejected() {
        let mut store = PackedStore::new();
        assert_eq!(store.insert(Entity::null(), 1), None);
        assert!(store.is_empty());
    }

    #[test]
    fn remove_swaps_last_into_hole() {
        let (_map, k) = keys(3);
        let mut store = PackedStore::new();
        for (i, &key) in k.iter().enumerate() {
            store.insert(key, i);
        }

        assert_eq!(store.remove(k[0]), Some(0));
        assert_eq!(store.len(), 2);
        // The last element moved into slot 0.
        assert_eq!(store.key_at(0), Some(k[2]));
        assert_eq!(store.index_of(k[2]), Some(0));
        assert_eq!(store.get(k[2]), Some(&2));
        assert_eq!(store.get(k[1]), Some(&1));
        assert!(!store.contains_key(k[0]));
    }

    #[test]
    fn remove_missing_key_is_none() {
        let (_map, k) = keys(2);
        let mut store = PackedStore::new();
        store.insert(k[0], 1);
        assert_eq!(store.remove(k[1]), None);
        assert_eq!(store.remove(k[0]), Some(1));
        assert_eq!(store.remove(k[0]), None);
    }

    #[test]
    fn stale_key_does_not_resolve_after_recycle() {
        let mut map: SlotMap<Entity, ()> = SlotMap::with_key();
        let old = map.insert(());
        let mut store = PackedStore::new();
        store.insert(old, "old");
        store.remove(old);
        map.remove(old);

        let new = map.insert(());
        store.insert(new, "new");
        assert_eq!(store.get(old), None);
        assert_eq!(store.get(new), Some(&"new"));
    }

    #[test]
    fn keys_parallel_to_values() {
        let (_map, k) = keys(4);
        let mut store = PackedStore::with_capacity(4);
        for (i, &key) in k.iter().enumerate() {
            store.insert(key, i * 10);
        }
        store.remove(k[1]);
        for (key, value) in store.iter() {
            assert_eq!(store.get(key), Some(value));
        }
        assert_eq!(store.keys().len(), store.as_slice().len());
    }

    #[test]
    fn clear_empties_everything() {
        let (_map, k) = keys(2);
        let mut store = PackedStore::new();
        store.insert(k[0], 1);
        store.insert(k[1], 2);
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.get(k[0]), None);
    }
}
