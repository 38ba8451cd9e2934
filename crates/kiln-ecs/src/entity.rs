//! Entity handles and the entity registry.
//!
//! An [`Entity`] is a generational slot-map key: a slot index plus a version
//! that is bumped every time the slot is released. A handle whose version no
//! longer matches its slot is *stale* and never resolves again, even after the
//! slot is reused by a later [`EntityRegistry::create`].
//!
//! The only per-entity payload is an [`EntityMeta`] carrying the
//! [`ComponentMask`] presence bitmask, kept in a [`PackedStore`] so live
//! entities can be enumerated densely.

use slotmap::SlotMap;

use crate::component::ComponentTypeId;
use crate::store::PackedStore;

slotmap::new_key_type! {
    /// A generational entity handle.
    ///
    /// Handles are plain `Copy` values; they never keep an entity alive and
    /// are validated on every access.
    pub struct Entity;
}

// ---------------------------------------------------------------------------
// ComponentMask
// ---------------------------------------------------------------------------

/// Per-entity component presence bitmask, one bit per [`ComponentTypeId`].
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ComponentMask(u64);

impl ComponentMask {
    /// The empty mask.
    pub const EMPTY: Self = Self(0);

    /// Set the bit for `id`.
    #[inline]
    pub fn insert(&mut self, id: ComponentTypeId) {
        self.0 |= id.bit();
    }

    /// Clear the bit for `id`.
    #[inline]
    pub fn remove(&mut self, id: ComponentTypeId) {
        self.0 &= !id.bit();
    }

    /// Whether the bit for `id` is set.
    #[inline]
    pub fn contains(self, id: ComponentTypeId) -> bool {
        self.0 & id.bit() != 0
    }

    /// Whether no bit is set.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of set bits.
    #[inline]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Raw `u64` representation.
    #[inline]
    pub fn bits(self) -> u64 {
        self.0
    }

    /// Iterate the ids whose bits are set, lowest id first.
    pub fn iter(self) -> impl Iterator<Item = ComponentTypeId> {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let bit = bits.trailing_zeros();
            bits &= bits - 1;
            // `bit < 64`, so `bit + 1` is always a valid id.
            ComponentTypeId::try_new(bit as u8 + 1)
        })
    }
}

impl std::fmt::Debug for ComponentMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ComponentMask({:#018x})", self.0)
    }
}

// ---------------------------------------------------------------------------
// EntityMeta
// ---------------------------------------------------------------------------

/// Metadata stored for every live entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityMeta {
    /// Which component types are attached.
    pub mask: ComponentMask,
}

// ---------------------------------------------------------------------------
// EntityRegistry
// ---------------------------------------------------------------------------

/// Allocates entity handles and tracks live entities.
///
/// Keys come from a [`SlotMap`], which versions every slot; metadata lives in
/// a [`PackedStore`] keyed by the same handle so that
/// [`at`](Self::at)/[`total`](Self::total) enumerate live entities densely.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    keys: SlotMap<Entity, ()>,
    meta: PackedStore<EntityMeta>,
}

impl EntityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with room for `capacity` entities.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: SlotMap::with_capacity_and_key(capacity),
            meta: PackedStore::with_capacity(capacity),
        }
    }

    /// Allocate a new live entity with an empty component mask.
    pub fn create(&mut self) -> Entity {
        let entity = self.keys.insert(());
        // A freshly issued key is never rejected by the store.
        let _ = self.meta.insert(entity, EntityMeta::default());
        entity
    }

    /// Whether `entity` refers to a live slot with a matching generation.
    #[inline]
    pub fn exists(&self, entity: Entity) -> bool {
        self.keys.contains_key(entity)
    }

    /// Release `entity`, returning the component mask it carried.
    ///
    /// Returns `None` (and changes nothing) if the handle is stale or was
    /// never issued.
    pub fn remove(&mut self, entity: Entity) -> Option<ComponentMask> {
        self.keys.remove(entity)?;
        self.meta.remove(entity).map(|meta| meta.mask)
    }

    /// The live entity at dense position `index`.
    #[inline]
    pub fn at(&self, index: usize) -> Option<Entity> {
        self.meta.key_at(index)
    }

    /// Number of live entities.
    #[inline]
    pub fn total(&self) -> usize {
        self.meta.len()
    }

    /// Iterate live entities in dense order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.meta.keys().iter().copied()
    }

    /// The component mask of a live entity.
    #[inline]
    pub fn mask(&self, entity: Entity) -> Option<ComponentMask> {
        self.meta.get(entity).map(|meta| meta.mask)
    }

    /// Mutable access to the component mask of a live entity.
    #[inline]
    pub(crate) fn mask_mut(&mut self, entity: Entity) -> Option<&mut ComponentMask> {
        self.meta.get_mut(entity).map(|meta| &mut meta.mask)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
