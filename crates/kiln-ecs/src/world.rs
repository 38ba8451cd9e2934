//! The [`World`] is the top-level container. It exclusively owns the entity
//! registry and every component store, and provides the component
//! operations: add, lookup, remove and bulk iteration.
//!
//! References returned by component accessors borrow the world, so the
//! borrow checker forbids holding one across a structural mutation (entity
//! or component add/remove, store growth). Hold [`Entity`] handles across
//! frames and re-resolve them instead.

use std::fmt::Debug;

use tracing::{debug, trace, warn};

use crate::component::{Component, ComponentInfo, ComponentRegistry, ComponentTypeId};
use crate::config::WorldConfig;
use crate::entity::{ComponentMask, Entity, EntityRegistry};
use crate::render::RenderComponent;
use crate::transform::TransformComponent;
use crate::EcsError;

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// The top-level ECS container.
///
/// [`TransformComponent`] and [`RenderComponent`] are registered on
/// construction; other types are registered with
/// [`register_component`](Self::register_component).
pub struct World {
    /// Entity handles and presence masks.
    pub(crate) entities: EntityRegistry,
    /// Component type table and stores.
    pub(crate) components: ComponentRegistry,
    /// Configuration used to create this world.
    config: WorldConfig,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entity_count", &self.entities.total())
            .field("component_types", &self.components.len())
            .finish()
    }
}

impl World {
    /// Create an empty world with the default configuration.
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Create an empty world pre-sized by `config`.
    pub fn with_config(config: WorldConfig) -> Self {
        let mut world = Self {
            entities: EntityRegistry::with_capacity(config.entity_capacity),
            components: ComponentRegistry::with_store_capacity(config.component_capacity),
            config,
        };
        // Built-in ids are distinct, so registering into an empty table
        // cannot conflict.
        let _ = world.components.register::<TransformComponent>();
        let _ = world.components.register::<RenderComponent>();
        world
    }

    /// The configuration this world was created with.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Read-only access to the component type table.
    pub fn registry(&self) -> &ComponentRegistry {
        &self.components
    }

    // -- entity lifecycle ---------------------------------------------------

    /// Create a live entity with no components.
    pub fn create_entity(&mut self) -> Entity {
        let entity = self.entities.create();
        trace!(?entity, "entity created");
        entity
    }

    /// Whether `entity` is live.
    #[inline]
    pub fn entity_exists(&self, entity: Entity) -> bool {
        self.entities.exists(entity)
    }

    /// Remove an entity and every component attached to it.
    ///
    /// A transform is detached from the hierarchy first (see
    /// [`detach_transform`](Self::detach_transform)). Returns `false` and
    /// changes nothing if the handle is stale.
    pub fn remove_entity(&mut self, entity: Entity) -> bool {
        let Some(mask) = self.entities.mask(entity) else {
            debug!(?entity, "remove_entity: stale handle ignored");
            return false;
        };

        if mask.contains(TransformComponent::TYPE_ID) {
            self.detach_transform(entity);
        }
        for id in mask.iter() {
            if let Some(store) = self.components.erased_mut(id) {
                store.remove_entity(entity);
            }
        }
        self.entities.remove(entity);
        trace!(?entity, components = mask.len(), "entity removed");
        true
    }

    /// The live entity at dense position `index`.
    #[inline]
    pub fn entity_at(&self, index: usize) -> Option<Entity> {
        self.entities.at(index)
    }

    /// Number of live entities.
    #[inline]
    pub fn entity_total(&self) -> usize {
        self.entities.total()
    }

    /// Iterate live entities in dense order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter()
    }

    /// The component presence mask of a live entity.
    pub fn component_mask(&self, entity: Entity) -> Option<ComponentMask> {
        self.entities.mask(entity)
    }

    // -- type registration --------------------------------------------------

    /// Register a component type. Registering the same type again is a no-op
    /// returning `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ComponentTypeConflict`] if another type already
    /// holds `T::TYPE_ID`.
    pub fn register_component<T>(&mut self) -> Result<bool, EcsError>
    where
        T: Component + Debug,
    {
        let registered = self.components.register::<T>();
        match &registered {
            Ok(true) => debug!(id = %T::TYPE_ID, name = T::NAME, "component type registered"),
            Ok(false) => {}
            Err(err) => warn!(%err, "component registration rejected"),
        }
        registered
    }

    /// Unregister a component type, dropping every stored component and
    /// clearing the type's bit on every owner.
    ///
    /// Transforms are dropped wholesale, so no hierarchy detach is performed.
    pub fn unregister_component(&mut self, id: ComponentTypeId) -> Option<ComponentInfo> {
        let owners = self.components.erased(id)?.owners();
        for &entity in &owners {
            if let Some(mask) = self.entities.mask_mut(entity) {
                mask.remove(id);
            }
        }
        let info = self.components.unregister(id);
        debug!(%id, dropped = owners.len(), "component type unregistered");
        info
    }

    /// Whether a component type is registered.
    pub fn is_registered(&self, id: ComponentTypeId) -> bool {
        self.components.contains(id)
    }

    // -- component access ---------------------------------------------------

    /// Attach `value` to `entity`, overwriting any existing `T`.
    ///
    /// Overwriting a [`TransformComponent`] detaches the old one from the
    /// hierarchy first, so no relation keeps pointing at the replaced node.
    ///
    /// Returns a reference to the stored component, valid until the next
    /// structural mutation.
    ///
    /// # Errors
    ///
    /// [`EcsError::StaleEntity`] if the entity is not live;
    /// [`EcsError::UnregisteredComponent`] or
    /// [`EcsError::ComponentTypeMismatch`] if `T` has no store.
    pub fn try_add_component<T: Component>(
        &mut self,
        entity: Entity,
        value: T,
    ) -> Result<&mut T, EcsError> {
        if !self.entities.exists(entity) {
            return Err(EcsError::StaleEntity { entity });
        }
        self.components.store::<T>()?;
        if T::TYPE_ID == TransformComponent::TYPE_ID && self.has_component(entity, T::TYPE_ID) {
            self.detach_transform(entity);
        }
        let store = self.components.store_mut::<T>()?;
        let index = store
            .insert(entity, value)
            .ok_or(EcsError::StaleEntity { entity })?;
        if let Some(mask) = self.entities.mask_mut(entity) {
            mask.insert(T::TYPE_ID);
        }
        Ok(&mut store.as_mut_slice()[index])
    }

    /// Attach `value` to `entity`, silently ignoring stale handles and
    /// unregistered types.
    pub fn add_component<T: Component>(&mut self, entity: Entity, value: T) -> Option<&mut T> {
        match self.try_add_component(entity, value) {
            Ok(component) => Some(component),
            Err(err) => {
                debug!(%err, component = T::NAME, "add_component ignored");
                None
            }
        }
    }

    /// Shared reference to `entity`'s `T`, if the entity is live and has one.
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        if !self.has_component(entity, T::TYPE_ID) {
            return None;
        }
        self.components.store::<T>().ok()?.get(entity)
    }

    /// Mutable reference to `entity`'s `T`, if the entity is live and has one.
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.has_component(entity, T::TYPE_ID) {
            return None;
        }
        self.components.store_mut::<T>().ok()?.get_mut(entity)
    }

    /// Whether `entity` is live and its mask has the bit for `id`.
    #[inline]
    pub fn has_component(&self, entity: Entity, id: ComponentTypeId) -> bool {
        self.entities
            .mask(entity)
            .is_some_and(|mask| mask.contains(id))
    }

    /// Detach and return `entity`'s `T`.
    ///
    /// Removing a [`TransformComponent`] detaches it from the hierarchy
    /// first.
    ///
    /// # Errors
    ///
    /// [`EcsError::StaleEntity`], [`EcsError::MissingComponent`], or the
    /// store errors of [`try_add_component`](Self::try_add_component).
    pub fn try_remove_component<T: Component>(&mut self, entity: Entity) -> Result<T, EcsError> {
        if !self.entities.exists(entity) {
            return Err(EcsError::StaleEntity { entity });
        }
        self.components.store::<T>()?;
        if !self.has_component(entity, T::TYPE_ID) {
            return Err(EcsError::MissingComponent {
                entity,
                id: T::TYPE_ID,
            });
        }

        if T::TYPE_ID == TransformComponent::TYPE_ID {
            self.detach_transform(entity);
        }
        let value = self
            .components
            .store_mut::<T>()?
            .remove(entity)
            .ok_or(EcsError::MissingComponent {
                entity,
                id: T::TYPE_ID,
            })?;
        if let Some(mask) = self.entities.mask_mut(entity) {
            mask.remove(T::TYPE_ID);
        }
        Ok(value)
    }

    /// Detach and return `entity`'s `T`, silently ignoring failures.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        match self.try_remove_component(entity) {
            Ok(value) => Some(value),
            Err(err) => {
                debug!(%err, component = T::NAME, "remove_component ignored");
                None
            }
        }
    }

    // -- bulk iteration -----------------------------------------------------

    /// Number of stored components of type `id`; 0 if unregistered.
    pub fn component_count(&self, id: ComponentTypeId) -> usize {
        self.components.erased(id).map_or(0, |store| store.len())
    }

    /// Every `T`, densely packed. Empty if `T` has no store.
    pub fn components<T: Component>(&self) -> &[T] {
        self.components
            .store::<T>()
            .map(|store| store.as_slice())
            .unwrap_or(&[])
    }

    /// Every `T`, densely packed, mutably. Empty if `T` has no store.
    pub fn components_mut<T: Component>(&mut self) -> &mut [T] {
        match self.components.store_mut::<T>() {
            Ok(store) => store.as_mut_slice(),
            Err(_) => &mut [],
        }
    }

    /// The entity owning the component of type `id` at dense position
    /// `index`.
    pub fn component_owner(&self, id: ComponentTypeId, index: usize) -> Option<Entity> {
        self.components.erased(id)?.owner_at(index)
    }

    /// Iterate `(owner, component)` pairs of type `T` in dense order.
    pub fn iter_components<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.components
            .store::<T>()
            .ok()
            .into_iter()
            .flat_map(|store| store.iter())
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
