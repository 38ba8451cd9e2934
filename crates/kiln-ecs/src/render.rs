//! Render component: a mesh reference plus a fixed array of material
//! references. It has no relations and no cached state.
//!
//! Render components are plain-old-data so the whole packed store can be
//! handed to render-input assembly as bytes (see [`World::render_bytes`]).

use glam::Mat4;

use crate::component::{Component, ComponentTypeId};
use crate::entity::Entity;
use crate::transform::TransformComponent;
use crate::world::World;

/// Number of material slots per render component.
pub const MAX_MATERIALS: usize = 8;

// ---------------------------------------------------------------------------
// Resource handles
// ---------------------------------------------------------------------------

/// Handle of a mesh owned by the resource layer.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, bytemuck_derive::Pod, bytemuck_derive::Zeroable)]
pub struct MeshId(pub u32);

impl MeshId {
    /// No mesh assigned.
    pub const NONE: Self = Self(u32::MAX);

    /// Whether this handle refers to a resource.
    pub fn is_some(self) -> bool {
        self != Self::NONE
    }
}

/// Handle of a material owned by the resource layer.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, bytemuck_derive::Pod, bytemuck_derive::Zeroable)]
pub struct MaterialId(pub u32);

impl MaterialId {
    /// No material assigned.
    pub const NONE: Self = Self(u32::MAX);

    /// Whether this handle refers to a resource.
    pub fn is_some(self) -> bool {
        self != Self::NONE
    }
}

// ---------------------------------------------------------------------------
// RenderComponent
// ---------------------------------------------------------------------------

/// What to draw for an entity.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, bytemuck_derive::Pod, bytemuck_derive::Zeroable)]
pub struct RenderComponent {
    /// Mesh to draw.
    pub mesh: MeshId,
    /// Material per submesh; unused slots hold [`MaterialId::NONE`].
    pub materials: [MaterialId; MAX_MATERIALS],
}

impl Component for RenderComponent {
    const TYPE_ID: ComponentTypeId = ComponentTypeId::new(2);
    const NAME: &'static str = "render";
}

impl Default for RenderComponent {
    fn default() -> Self {
        Self {
            mesh: MeshId::NONE,
            materials: [MaterialId::NONE; MAX_MATERIALS],
        }
    }
}

impl RenderComponent {
    /// A component drawing `mesh` with no materials.
    pub fn with_mesh(mesh: MeshId) -> Self {
        Self {
            mesh,
            ..Self::default()
        }
    }

    /// Assign `material` to `slot`. Returns `false` if the slot is out of
    /// range.
    pub fn set_material(&mut self, slot: usize, material: MaterialId) -> bool {
        match self.materials.get_mut(slot) {
            Some(entry) => {
                *entry = material;
                true
            }
            None => false,
        }
    }

    /// Assigned materials with their slot index.
    pub fn materials(&self) -> impl Iterator<Item = (usize, MaterialId)> + '_ {
        self.materials
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, m)| m.is_some())
    }
}

// ---------------------------------------------------------------------------
// RenderInstance
// ---------------------------------------------------------------------------

/// One entry of render-input assembly.
#[derive(Debug, Clone, Copy)]
pub struct RenderInstance<'w> {
    /// Owning entity.
    pub entity: Entity,
    /// The entity's render component.
    pub render: &'w RenderComponent,
    /// The owner's cached world matrix, identity without a transform.
    pub world: Mat4,
}

// ---------------------------------------------------------------------------
// World API
// ---------------------------------------------------------------------------

impl World {
    /// Attach a render component with no mesh and every material slot empty.
    pub fn create_render(&mut self, entity: Entity) -> Option<&mut RenderComponent> {
        self.add_component(entity, RenderComponent::default())
    }

    /// The render component of a live entity.
    pub fn render(&self, entity: Entity) -> Option<&RenderComponent> {
        self.get_component::<RenderComponent>(entity)
    }

    /// The render component of a live entity, mutably.
    pub fn render_mut(&mut self, entity: Entity) -> Option<&mut RenderComponent> {
        self.get_component_mut::<RenderComponent>(entity)
    }

    /// Every render component in packed order, paired with its owner and the
    /// owner's cached world matrix.
    pub fn render_instances(&self) -> impl Iterator<Item = RenderInstance<'_>> {
        self.iter_components::<RenderComponent>()
            .map(move |(entity, render)| RenderInstance {
                entity,
                render,
                world: self
                    .get_component::<TransformComponent>(entity)
                    .map_or(Mat4::IDENTITY, |t| t.world_matrix()),
            })
    }

    /// The packed render store as raw bytes, in the same order as
    /// [`components::<RenderComponent>`](World::components).
    pub fn render_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.components::<RenderComponent>())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
