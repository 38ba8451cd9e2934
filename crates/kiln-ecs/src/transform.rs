//! Transform component and scene-graph hierarchy.
//!
//! A [`TransformComponent`] stores a local [`Pose`], its cached local matrix,
//! a cached world matrix, and four relation handles forming an intrusive
//! doubly-linked sibling list per parent:
//!
//! ```text
//!            parent
//!              | first_child
//!              v
//!   None <- child_a <-> child_b <-> child_c -> None
//!          prev / next sibling
//! ```
//!
//! Relations are plain [`Entity`] handles rather than owned child vectors,
//! because components live in packed stores. [`World::set_pose`] and
//! [`World::set_parent`] are the only places that recompute cached matrices;
//! both cascade the recomputation over the whole subtree in pre-order, so a
//! parent's world matrix is final before any child reads it.
//!
//! # Invariants
//!
//! - `world == parent.world * local` for a live parent, else `world == local`.
//! - If `a.next_sibling == Some(b)` then `b.prev_sibling == Some(a)`, and
//!   the parent's `first_child` is the head of the list.
//! - No entity is its own ancestor. This is not checked; cascades stop with
//!   a warning once they visit more nodes than there are transforms.
//!
//! Re-parenting does not unlink a child from its previous parent's list: the
//! old parent keeps a stale entry (see `set_parent`). A node's `parent` field
//! is therefore authoritative. Cascades and detaches only touch a node's real
//! children, and when a child list turns out to be stale they scan the
//! transform store for them instead.

use glam::{Mat4, Quat, Vec3};
use std::collections::HashSet;

use tracing::{debug, trace, warn};

use crate::component::{Component, ComponentTypeId};
use crate::entity::Entity;
use crate::world::World;

// ---------------------------------------------------------------------------
// Pose
// ---------------------------------------------------------------------------

/// Local scale, rotation and translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Per-axis scale.
    pub scale: Vec3,
    /// Rotation as a unit quaternion.
    pub rotation: Quat,
    /// Translation.
    pub translation: Vec3,
}

impl Pose {
    /// Unit scale, no rotation, origin.
    pub const IDENTITY: Self = Self {
        scale: Vec3::ONE,
        rotation: Quat::IDENTITY,
        translation: Vec3::ZERO,
    };

    /// A pure translation.
    #[must_use]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// A pure rotation.
    #[must_use]
    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            rotation,
            ..Self::IDENTITY
        }
    }

    /// Compose the local matrix: translate * rotate * scale.
    #[must_use]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ---------------------------------------------------------------------------
// TransformComponent
// ---------------------------------------------------------------------------

/// Pose, cached matrices and hierarchy links of one entity.
///
/// Fields are read through accessors; they change only through the
/// [`World`] hierarchy operations so the cached matrices stay coherent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformComponent {
    pub(crate) pose: Pose,
    pub(crate) local: Mat4,
    pub(crate) world: Mat4,
    pub(crate) parent: Option<Entity>,
    pub(crate) first_child: Option<Entity>,
    pub(crate) next_sibling: Option<Entity>,
    pub(crate) prev_sibling: Option<Entity>,
}

impl Component for TransformComponent {
    const TYPE_ID: ComponentTypeId = ComponentTypeId::new(1);
    const NAME: &'static str = "transform";
}

impl Default for TransformComponent {
    fn default() -> Self {
        Self {
            pose: Pose::IDENTITY,
            local: Mat4::IDENTITY,
            world: Mat4::IDENTITY,
            parent: None,
            first_child: None,
            next_sibling: None,
            prev_sibling: None,
        }
    }
}

impl TransformComponent {
    /// The local pose.
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Cached `compose(pose)`.
    pub fn local_matrix(&self) -> Mat4 {
        self.local
    }

    /// Cached world matrix.
    pub fn world_matrix(&self) -> Mat4 {
        self.world
    }

    /// Parent handle, if linked.
    pub fn parent(&self) -> Option<Entity> {
        self.parent
    }

    /// Head of this node's child list.
    pub fn first_child(&self) -> Option<Entity> {
        self.first_child
    }

    /// Next node in the parent's child list.
    pub fn next_sibling(&self) -> Option<Entity> {
        self.next_sibling
    }

    /// Previous node in the parent's child list.
    pub fn prev_sibling(&self) -> Option<Entity> {
        self.prev_sibling
    }
}

// ---------------------------------------------------------------------------
// Children iterator
// ---------------------------------------------------------------------------

/// Iterator over a node's child list, following `next_sibling` links.
///
/// Stops at the first handle that no longer resolves to a live transform.
#[derive(Debug, Clone)]
pub struct Children<'w> {
    world: &'w World,
    next: Option<Entity>,
    remaining: usize,
}

impl Iterator for Children<'_> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        let current = self.next?;
        // Bounded so a corrupted list cannot loop forever.
        if self.remaining == 0 {
            self.next = None;
            return None;
        }
        self.remaining -= 1;
        let transform = self.world.get_component::<TransformComponent>(current)?;
        self.next = transform.next_sibling;
        Some(current)
    }
}

// ---------------------------------------------------------------------------
// Hierarchy operations
// ---------------------------------------------------------------------------

impl World {
    /// Attach a transform with identity pose and no relations. An existing
    /// transform is detached from the hierarchy and replaced.
    pub fn create_transform(&mut self, entity: Entity) -> Option<&mut TransformComponent> {
        self.add_component(entity, TransformComponent::default())
    }

    /// The transform of a live entity.
    pub fn transform(&self, entity: Entity) -> Option<&TransformComponent> {
        self.get_component::<TransformComponent>(entity)
    }

    /// Cached world matrix. O(1), never recomputes.
    pub fn world_matrix(&self, entity: Entity) -> Option<Mat4> {
        self.transform(entity).map(|t| t.world)
    }

    /// Cached local matrix.
    pub fn local_matrix(&self, entity: Entity) -> Option<Mat4> {
        self.transform(entity).map(|t| t.local)
    }

    /// Parent of `entity`, if both are live transforms.
    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.transform(entity)?
            .parent
            .filter(|&p| self.has_component(p, TransformComponent::TYPE_ID))
    }

    /// Iterate the child list of `entity`.
    pub fn children(&self, entity: Entity) -> Children<'_> {
        Children {
            world: self,
            next: self.transform(entity).and_then(|t| t.first_child),
            remaining: self.component_count(TransformComponent::TYPE_ID),
        }
    }

    /// Write `pose`, recompute the cached matrices and cascade to every
    /// descendant.
    ///
    /// The world matrix accounts for a live parent. No-op if `entity` has no
    /// transform.
    pub fn set_pose(&mut self, entity: Entity, pose: Pose) {
        let parent_world = self.parent_world(entity);
        let Some(transform) = self.get_component_mut::<TransformComponent>(entity) else {
            debug!(?entity, "set_pose: no transform, ignored");
            return;
        };
        transform.pose = pose;
        transform.local = pose.to_matrix();
        transform.world = parent_world * transform.local;
        self.propagate_world(entity);
    }

    /// Make `child` the first child of `parent`, then recompute `child`'s
    /// world matrix and cascade to its subtree.
    ///
    /// No-op unless both entities have transforms and differ. `child` is not
    /// unlinked from a previous parent's list; that parent keeps a stale
    /// entry. If `child` is already reachable from `parent`'s list (its
    /// current parent, or a stale entry left by an earlier re-parent), only
    /// the parent link and matrices are updated, so the list never loops.
    pub fn set_parent(&mut self, child: Entity, parent: Entity) {
        if child == parent {
            debug!(?child, "set_parent: entity cannot parent itself, ignored");
            return;
        }
        let (Some(child_t), Some(parent_t)) = (self.transform(child), self.transform(parent))
        else {
            debug!(?child, ?parent, "set_parent: missing transform, ignored");
            return;
        };
        let already_linked = child_t.parent == Some(parent);
        let old_head = parent_t.first_child;
        let parent_world = parent_t.world;
        let in_list = already_linked || self.children(parent).any(|c| c == child);

        if !in_list {
            if let Some(head) = old_head {
                if let Some(head_t) = self.get_component_mut::<TransformComponent>(head) {
                    head_t.prev_sibling = Some(child);
                }
            }
            if let Some(parent_t) = self.get_component_mut::<TransformComponent>(parent) {
                parent_t.first_child = Some(child);
            }
        }

        if let Some(child_t) = self.get_component_mut::<TransformComponent>(child) {
            child_t.parent = Some(parent);
            if !in_list {
                child_t.next_sibling = old_head;
                child_t.prev_sibling = None;
            }
            child_t.world = parent_world * child_t.local;
        }
        self.propagate_world(child);
    }

    /// Unlink `entity` from its parent's child list and turn each of its
    /// children into a root (`world = local`), cascading the recomputation.
    ///
    /// Only nodes whose parent is `entity` are orphaned; stale entries that
    /// now belong to another parent keep their links. Called before a
    /// transform is removed or overwritten, directly or with its entity.
    pub fn detach_transform(&mut self, entity: Entity) {
        let Some(t) = self.transform(entity).copied() else {
            return;
        };

        if let Some(prev) = t.prev_sibling {
            if let Some(prev_t) = self.get_component_mut::<TransformComponent>(prev) {
                if prev_t.next_sibling == Some(entity) {
                    prev_t.next_sibling = t.next_sibling;
                }
            }
        } else if let Some(parent) = t.parent {
            if let Some(parent_t) = self.get_component_mut::<TransformComponent>(parent) {
                if parent_t.first_child == Some(entity) {
                    parent_t.first_child = t.next_sibling;
                }
            }
        }
        if let Some(next) = t.next_sibling {
            if let Some(next_t) = self.get_component_mut::<TransformComponent>(next) {
                if next_t.prev_sibling == Some(entity) {
                    next_t.prev_sibling = t.prev_sibling;
                }
            }
        }

        let orphans = self.real_children(entity);
        for &orphan in &orphans {
            if let Some(orphan_t) = self.get_component_mut::<TransformComponent>(orphan) {
                orphan_t.parent = None;
                orphan_t.next_sibling = None;
                orphan_t.prev_sibling = None;
                orphan_t.world = orphan_t.local;
            }
        }
        if let Some(t) = self.get_component_mut::<TransformComponent>(entity) {
            t.parent = None;
            t.first_child = None;
            t.next_sibling = None;
            t.prev_sibling = None;
            t.world = t.local;
        }
        for orphan in orphans {
            self.propagate_world(orphan);
        }
    }

    /// World matrix of `entity`'s live parent, or identity.
    fn parent_world(&self, entity: Entity) -> Mat4 {
        self.parent(entity)
            .and_then(|p| self.world_matrix(p))
            .unwrap_or(Mat4::IDENTITY)
    }

    /// Recompute the world matrix of every descendant of `root`, pre-order,
    /// using an explicit stack. `root`'s own world matrix must be final.
    ///
    /// Only real children are pushed, so each node is computed after its
    /// parent. Every node has one parent, so without a cycle no node is
    /// visited twice and the transform count bounds the walk.
    fn propagate_world(&mut self, root: Entity) {
        let budget = self.component_count(TransformComponent::TYPE_ID);
        let mut stack: Vec<Entity> = Vec::new();
        push_children(self, root, &mut stack);

        let mut visited = 0usize;
        while let Some(node) = stack.pop() {
            visited += 1;
            if visited > budget {
                warn!(?root, budget, "hierarchy cascade exceeded transform count; cycle suspected");
                return;
            }
            let parent_world = self.parent_world(node);
            if let Some(t) = self.get_component_mut::<TransformComponent>(node) {
                t.world = parent_world * t.local;
            }
            push_children(self, node, &mut stack);
        }
    }

    /// Live transforms whose parent is `node`, in list order.
    ///
    /// The child list is trusted only while every entry resolves, names
    /// `node` as its parent and appears once. Otherwise a re-parent has left
    /// it stale and the transform store is scanned instead.
    fn real_children(&self, node: Entity) -> Vec<Entity> {
        let mut found = Vec::new();
        let mut seen = HashSet::new();
        let mut next = self.transform(node).and_then(|t| t.first_child);
        while let Some(current) = next {
            match self.transform(current) {
                Some(t) if t.parent == Some(node) && seen.insert(current) => {
                    found.push(current);
                    next = t.next_sibling;
                }
                _ => {
                    trace!(?node, "stale child list, scanning transforms");
                    return self.scan_children(node);
                }
            }
        }
        found
    }

    /// Every live transform whose parent is `node`, in packed order.
    fn scan_children(&self, node: Entity) -> Vec<Entity> {
        self.iter_components::<TransformComponent>()
            .filter(|(_, t)| t.parent == Some(node))
            .map(|(entity, _)| entity)
            .collect()
    }
}

/// Push `node`'s real children so the first child is popped first.
fn push_children(world: &World, node: Entity, stack: &mut Vec<Entity>) {
    let start = stack.len();
    stack.extend(world.real_children(node));
    stack[start..].reverse();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
