//! Component type registration and metadata.
//!
//! Every component type is identified by a small integer
//! [`ComponentTypeId`] in `1..=64`, which doubles as its bit in an entity's
//! [`ComponentMask`](crate::entity::ComponentMask). Registering a type in the
//! [`ComponentRegistry`] allocates one [`PackedStore`] for it; components are
//! stored under their owning entity's own key, so "does E have T" and "fetch
//! T of E" are each a single store lookup.

use std::any::{Any, TypeId};
use std::fmt;

use crate::entity::Entity;
use crate::store::PackedStore;
use crate::EcsError;

// ---------------------------------------------------------------------------
// ComponentTypeId
// ---------------------------------------------------------------------------

/// Identifier of a registered component type, valid in `1..=64`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(u8);

impl ComponentTypeId {
    /// Largest valid id; the presence mask is a `u64`.
    pub const MAX: u8 = 64;

    /// Construct an id.
    ///
    /// # Panics
    ///
    /// Panics if `id` is 0 or greater than [`MAX`](Self::MAX). In a `const`
    /// item this is a compile error.
    pub const fn new(id: u8) -> Self {
        assert!(id >= 1 && id <= Self::MAX, "component type id must be in 1..=64");
        Self(id)
    }

    /// Construct an id, returning `None` if `id` is out of range.
    pub const fn try_new(id: u8) -> Option<Self> {
        if id >= 1 && id <= Self::MAX {
            Some(Self(id))
        } else {
            None
        }
    }

    /// The raw integer id.
    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// This id's bit in a component mask.
    #[inline]
    pub(crate) const fn bit(self) -> u64 {
        1u64 << (self.0 - 1)
    }
}

impl fmt::Debug for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentTypeId({})", self.0)
    }
}

impl fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// A fixed-size data block that can be attached to an entity.
///
/// ```
/// use kiln_ecs::prelude::*;
///
/// struct Health(u32);
///
/// impl Component for Health {
///     const TYPE_ID: ComponentTypeId = ComponentTypeId::new(10);
///     const NAME: &'static str = "health";
/// }
/// ```
pub trait Component: 'static {
    /// The registry id and mask bit for this type.
    const TYPE_ID: ComponentTypeId;
    /// Human-readable name used in logs and errors.
    const NAME: &'static str;
}

// ---------------------------------------------------------------------------
// ComponentInfo
// ---------------------------------------------------------------------------

/// Metadata about a registered component type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentInfo {
    /// Id assigned by the component type.
    pub id: ComponentTypeId,
    /// [`Component::NAME`].
    pub name: &'static str,
    /// `std::mem::size_of::<T>()`
    pub size: usize,
    /// `std::mem::align_of::<T>()`
    pub align: usize,
    /// Rust `TypeId` for runtime type checking.
    pub type_id: TypeId,
}

impl ComponentInfo {
    fn of<T: Component>() -> Self {
        Self {
            id: T::TYPE_ID,
            name: T::NAME,
            size: std::mem::size_of::<T>(),
            align: std::mem::align_of::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }
}

// ---------------------------------------------------------------------------
// ErasedStore -- type-erased view of a PackedStore<T>
// ---------------------------------------------------------------------------

/// Operations the registry and world need without knowing the concrete type.
pub(crate) trait ErasedStore: fmt::Debug {
    fn len(&self) -> usize;
    fn owner_at(&self, index: usize) -> Option<Entity>;
    /// Drop the value stored under `entity`, if any.
    fn remove_entity(&mut self, entity: Entity) -> bool;
    fn owners(&self) -> Vec<Entity>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: fmt::Debug + 'static> ErasedStore for PackedStore<T> {
    fn len(&self) -> usize {
        PackedStore::len(self)
    }

    fn owner_at(&self, index: usize) -> Option<Entity> {
        self.key_at(index)
    }

    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_some()
    }

    fn owners(&self) -> Vec<Entity> {
        self.keys().to_vec()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// ComponentRegistry
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct RegisteredType {
    info: ComponentInfo,
    store: Box<dyn ErasedStore>,
}

/// Table of registered component types and their stores.
///
/// Lookup by id is a linear scan; type counts are small and fixed at
/// start-up.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    types: Vec<RegisteredType>,
    /// Initial capacity of each newly allocated store.
    store_capacity: usize,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry whose stores start with room for
    /// `store_capacity` components each.
    pub fn with_store_capacity(store_capacity: usize) -> Self {
        Self {
            types: Vec::new(),
            store_capacity,
        }
    }

    /// Register `T` under [`Component::TYPE_ID`].
    ///
    /// Returns `Ok(true)` if a new store was allocated and `Ok(false)` if `T`
    /// was already registered.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ComponentTypeConflict`] if a different Rust type
    /// already holds the id. The table is left unchanged.
    pub fn register<T>(&mut self) -> Result<bool, EcsError>
    where
        T: Component + fmt::Debug,
    {
        if let Some(existing) = self.info(T::TYPE_ID) {
            if existing.type_id == TypeId::of::<T>() {
                return Ok(false);
            }
            return Err(EcsError::ComponentTypeConflict {
                id: T::TYPE_ID,
                registered: existing.name,
                requested: T::NAME,
            });
        }

        self.types.push(RegisteredType {
            info: ComponentInfo::of::<T>(),
            store: Box::new(PackedStore::<T>::with_capacity(self.store_capacity)),
        });
        Ok(true)
    }

    /// Remove a type and drop its store, returning its metadata.
    pub fn unregister(&mut self, id: ComponentTypeId) -> Option<ComponentInfo> {
        let pos = self.position(id)?;
        Some(self.types.swap_remove(pos).info)
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: ComponentTypeId) -> bool {
        self.position(id).is_some()
    }

    /// Metadata for a registered id.
    pub fn info(&self, id: ComponentTypeId) -> Option<&ComponentInfo> {
        self.types.iter().find(|t| t.info.id == id).map(|t| &t.info)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no type is registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Names of all registered types, sorted.
    pub fn registered_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.types.iter().map(|t| t.info.name).collect();
        names.sort_unstable();
        names
    }

    /// Typed access to `T`'s store.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnregisteredComponent`] if `T::TYPE_ID` is not registered,
    /// [`EcsError::ComponentTypeMismatch`] if it is registered to another
    /// Rust type.
    pub fn store<T: Component>(&self) -> Result<&PackedStore<T>, EcsError> {
        let ty = self.get(T::TYPE_ID)?;
        ty.store
            .as_any()
            .downcast_ref::<PackedStore<T>>()
            .ok_or_else(|| mismatch::<T>(&ty.info))
    }

    /// Typed mutable access to `T`'s store.
    ///
    /// # Errors
    ///
    /// Same as [`store`](Self::store).
    pub fn store_mut<T: Component>(&mut self) -> Result<&mut PackedStore<T>, EcsError> {
        let pos = self
            .position(T::TYPE_ID)
            .ok_or(EcsError::UnregisteredComponent { id: T::TYPE_ID })?;
        let ty = &mut self.types[pos];
        let registered = ty.info.name;
        ty.store
            .as_any_mut()
            .downcast_mut::<PackedStore<T>>()
            .ok_or(EcsError::ComponentTypeMismatch {
                id: T::TYPE_ID,
                registered,
                requested: T::NAME,
            })
    }

    pub(crate) fn erased(&self, id: ComponentTypeId) -> Option<&dyn ErasedStore> {
        self.get(id).ok().map(|t| t.store.as_ref())
    }

    pub(crate) fn erased_mut(&mut self, id: ComponentTypeId) -> Option<&mut dyn ErasedStore> {
        let pos = self.position(id)?;
        Some(self.types[pos].store.as_mut())
    }

    fn get(&self, id: ComponentTypeId) -> Result<&RegisteredType, EcsError> {
        self.types
            .iter()
            .find(|t| t.info.id == id)
            .ok_or(EcsError::UnregisteredComponent { id })
    }

    fn position(&self, id: ComponentTypeId) -> Option<usize> {
        self.types.iter().position(|t| t.info.id == id)
    }
}

fn mismatch<T: Component>(info: &ComponentInfo) -> EcsError {
    EcsError::ComponentTypeMismatch {
        id: T::TYPE_ID,
        registered: info.name,
        requested: T::NAME,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Pos {
        x: f32,
        y: f32,
    }

    impl Component for Pos {
        const TYPE_ID: ComponentTypeId = ComponentTypeId::new(10);
        const NAME: &'static str = "position";
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Vel {
        dx: f32,
        dy: f32,
    }

    impl Component for Vel {
        const TYPE_ID: ComponentTypeId = ComponentTypeId::new(11);
        const NAME: &'static str = "velocity";
    }

    /// Claims the same id as `Pos`.
    #[derive(Debug)]
    struct Impostor;

    impl Component for Impostor {
        const TYPE_ID: ComponentTypeId = ComponentTypeId::new(10);
        const NAME: &'static str = "impostor";
    }

    #[test]
    fn type_id_range() {
        assert_eq!(ComponentTypeId::try_new(0), None);
        assert_eq!(ComponentTypeId::try_new(65), None);
        assert_eq!(ComponentTypeId::try_new(1).map(ComponentTypeId::get), Some(1));
        assert_eq!(ComponentTypeId::try_new(64).map(ComponentTypeId::get), Some(64));
        assert_eq!(ComponentTypeId::new(64).bit(), 1 << 63);
    }

    #[test]
    #[should_panic(expected = "component type id must be in 1..=64")]
    fn zero_type_id_panics() {
        let _ = ComponentTypeId::new(0);
    }

    #[test]
    fn register_and_lookup() {
        let mut reg = ComponentRegistry::new();
        assert!(reg.register::<Pos>().unwrap());
        assert!(reg.contains(Pos::TYPE_ID));
        assert!(reg.store::<Pos>().unwrap().is_empty());
    }

    #[test]
    fn register_twice_is_noop() {
        let mut reg = ComponentRegistry::new();
        assert!(reg.register::<Pos>().unwrap());
        assert!(!reg.register::<Pos>().unwrap());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn conflicting_registration_rejected() {
        let mut reg = ComponentRegistry::new();
        reg.register::<Pos>().unwrap();
        let err = reg.register::<Impostor>().unwrap_err();
        assert!(matches!(err, EcsError::ComponentTypeConflict { .. }));
        assert_eq!(reg.info(Pos::TYPE_ID).unwrap().name, "position");
    }

    #[test]
    fn downcast_to_wrong_type_is_mismatch() {
        let mut reg = ComponentRegistry::new();
        reg.register::<Pos>().unwrap();
        assert!(matches!(
            reg.store::<Impostor>(),
            Err(EcsError::ComponentTypeMismatch { .. })
        ));
        assert!(matches!(
            reg.store_mut::<Impostor>(),
            Err(EcsError::ComponentTypeMismatch { .. })
        ));
    }

    #[test]
    fn unregistered_store_is_error() {
        let reg = ComponentRegistry::new();
        assert!(matches!(
            reg.store::<Vel>(),
            Err(EcsError::UnregisteredComponent { .. })
        ));
    }

    #[test]
    fn info_correctness() {
        let mut reg = ComponentRegistry::new();
        reg.register::<Pos>().unwrap();
        let info = reg.info(Pos::TYPE_ID).unwrap();
        assert_eq!(info.name, "position");
        assert_eq!(info.size, std::mem::size_of::<Pos>());
        assert_eq!(info.align, std::mem::align_of::<Pos>());
        assert_eq!(info.type_id, TypeId::of::<Pos>());
    }

    #[test]
    fn unregister_drops_store() {
        let mut reg = ComponentRegistry::new();
        reg.register::<Pos>().unwrap();
        reg.register::<Vel>().unwrap();
        let info = reg.unregister(Pos::TYPE_ID).unwrap();
        assert_eq!(info.name, "position");
        assert!(!reg.contains(Pos::TYPE_ID));
        assert!(reg.contains(Vel::TYPE_ID));
        assert!(reg.unregister(Pos::TYPE_ID).is_none());
        assert_eq!(reg.registered_names(), vec!["velocity"]);
    }
}
