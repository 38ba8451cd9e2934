//! Kiln ECS -- entity/component storage with a cached transform hierarchy.
//!
//! This crate is the storage layer every other engine subsystem goes through:
//! generational [`Entity`](entity::Entity) handles, one packed store per
//! component type keyed by the owning entity's own handle, a `u64` presence
//! mask per entity, and a [`TransformComponent`](transform::TransformComponent)
//! hierarchy whose world matrices are recomputed incrementally.
//!
//! Everything is single-threaded and synchronous. Invalid handles and
//! unregistered types are absorbed as silent no-ops by the plain API; the
//! `try_` variants report them as [`EcsError`].
//!
//! # Quick Start
//!
//! ```
//! use kiln_ecs::prelude::*;
//! use glam::{Mat4, Vec3};
//!
//! let mut world = World::new();
//!
//! let parent = world.create_entity();
//! let child = world.create_entity();
//! world.create_transform(parent);
//! world.create_transform(child);
//!
//! world.set_pose(parent, Pose::from_translation(Vec3::new(1.0, 0.0, 0.0)));
//! world.set_parent(child, parent);
//! world.set_pose(child, Pose::from_translation(Vec3::new(0.0, 1.0, 0.0)));
//!
//! assert_eq!(
//!     world.world_matrix(child),
//!     Some(Mat4::from_translation(Vec3::new(1.0, 1.0, 0.0)))
//! );
//! ```

#![deny(unsafe_code)]

pub mod component;
pub mod config;
pub mod entity;
// Pod/Zeroable derives expand to unsafe impls.
#[allow(unsafe_code)]
pub mod render;
pub mod store;
pub mod transform;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by the strict (`try_`) ECS operations.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// The entity does not exist (stale generation or never allocated).
    #[error("entity {entity:?} does not exist (stale or never allocated)")]
    StaleEntity { entity: entity::Entity },

    /// A component type id was used that has not been registered.
    #[error("component type {id} is not registered")]
    UnregisteredComponent { id: component::ComponentTypeId },

    /// Registration of a second Rust type under an id already in use.
    #[error("component type {id} is already registered as '{registered}', cannot register '{requested}'")]
    ComponentTypeConflict {
        id: component::ComponentTypeId,
        registered: &'static str,
        requested: &'static str,
    },

    /// Typed access with a Rust type other than the registered one.
    #[error("component type {id} is registered as '{registered}', not '{requested}'")]
    ComponentTypeMismatch {
        id: component::ComponentTypeId,
        registered: &'static str,
        requested: &'static str,
    },

    /// The entity is live but does not carry the component.
    #[error("entity {entity:?} has no component of type {id}")]
    MissingComponent {
        entity: entity::Entity,
        id: component::ComponentTypeId,
    },

    /// A [`WorldConfig`](config::WorldConfig) failed to parse or validate.
    #[error("invalid world config: {details}")]
    InvalidConfig { details: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::component::{Component, ComponentInfo, ComponentRegistry, ComponentTypeId};
    pub use crate::config::WorldConfig;
    pub use crate::entity::{ComponentMask, Entity};
    pub use crate::render::{MaterialId, MeshId, RenderComponent, RenderInstance, MAX_MATERIALS};
    pub use crate::store::PackedStore;
    pub use crate::transform::{Children, Pose, TransformComponent};
    pub use crate::world::World;
    pub use crate::EcsError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------
