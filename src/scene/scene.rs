//! Scene: node arena, hierarchy bookkeeping and per-capability component
//! tables.
//!
//! Nodes live in a [`SlotMap`]; every component kind (camera, light,
//! collider, render data, behavior, picker) lives in its own
//! [`SparseSecondaryMap`] keyed by [`NodeHandle`]. Attaching a component
//! kind a node already has replaces the previous instance. Structural
//! mutations bump a graph version counter that pickers use to decide
//! whether a new pass is needed.

use std::sync::atomic::{AtomicU32, Ordering};

use glam::{Affine3A, Vec3};
use slotmap::{SecondaryMap, SlotMap, SparseSecondaryMap};

use crate::errors::{ParallaxError, Result};
use crate::resources::render_data::RenderData;
use crate::scene::behavior::{Behavior, BehaviorComponent};
use crate::scene::camera::Camera;
use crate::scene::collider::Collider;
use crate::scene::light::Light;
use crate::scene::node::Node;
use crate::scene::picker::Picker;
use crate::scene::{transform_system, NodeHandle};

static NEXT_SCENE_ID: AtomicU32 = AtomicU32::new(1);

/// A component kind storable in the scene's per-capability tables.
///
/// Implemented by [`Camera`], [`Light`], [`Collider`], [`RenderData`],
/// [`BehaviorComponent`] and [`Picker`]; lets generic code address "the
/// table for component type `C`" without a match per kind.
pub trait Capability: Sized {
    fn storage(scene: &Scene) -> &SparseSecondaryMap<NodeHandle, Self>;
    fn storage_mut(scene: &mut Scene) -> &mut SparseSecondaryMap<NodeHandle, Self>;
    fn is_enabled(&self) -> bool;
}

macro_rules! impl_capability {
    ($ty:ty, $field:ident) => {
        impl Capability for $ty {
            fn storage(scene: &Scene) -> &SparseSecondaryMap<NodeHandle, Self> {
                &scene.$field
            }
            fn storage_mut(scene: &mut Scene) -> &mut SparseSecondaryMap<NodeHandle, Self> {
                &mut scene.$field
            }
            fn is_enabled(&self) -> bool {
                self.enabled
            }
        }
    };
}

impl_capability!(Camera, cameras);
impl_capability!(Light, lights);
impl_capability!(Collider, colliders);
impl_capability!(RenderData, render_datas);
impl_capability!(BehaviorComponent, behaviors);
impl_capability!(Picker, pickers);

pub struct Scene {
    pub id: u32,

    nodes: SlotMap<NodeHandle, Node>,
    root_nodes: Vec<NodeHandle>,
    names: SecondaryMap<NodeHandle, String>,

    cameras: SparseSecondaryMap<NodeHandle, Camera>,
    lights: SparseSecondaryMap<NodeHandle, Light>,
    colliders: SparseSecondaryMap<NodeHandle, Collider>,
    render_datas: SparseSecondaryMap<NodeHandle, RenderData>,
    behaviors: SparseSecondaryMap<NodeHandle, BehaviorComponent>,
    pickers: SparseSecondaryMap<NodeHandle, Picker>,

    graph_version: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed),
            nodes: SlotMap::with_key(),
            root_nodes: Vec::new(),
            names: SecondaryMap::new(),
            cameras: SparseSecondaryMap::new(),
            lights: SparseSecondaryMap::new(),
            colliders: SparseSecondaryMap::new(),
            render_datas: SparseSecondaryMap::new(),
            behaviors: SparseSecondaryMap::new(),
            pickers: SparseSecondaryMap::new(),
            graph_version: 0,
        }
    }

    /// Monotonic counter bumped on every structural mutation (node or
    /// component added/removed, reparenting). Pickers compare it between
    /// frames to know whether the graph may have moved under an unchanged
    /// ray.
    #[must_use]
    pub fn graph_version(&self) -> u64 {
        self.graph_version
    }

    // ========================================================================
    // Nodes & hierarchy
    // ========================================================================

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn root_nodes(&self) -> &[NodeHandle] {
        &self.root_nodes
    }

    /// Create a fresh root node.
    pub fn create_node(&mut self) -> NodeHandle {
        self.add_node(Node::new())
    }

    /// Create a fresh node parented under `parent`.
    pub fn create_child(&mut self, parent: NodeHandle) -> Result<NodeHandle> {
        let handle = self.add_node(Node::new());
        self.attach(handle, parent)?;
        Ok(handle)
    }

    /// Insert a detached node as a new root.
    pub fn add_node(&mut self, mut node: Node) -> NodeHandle {
        node.parent = None;
        node.children.clear();
        let handle = self.nodes.insert(node);
        self.root_nodes.push(handle);
        self.graph_version += 1;
        handle
    }

    /// Insert a detached node directly under `parent`.
    pub fn add_to_parent(&mut self, node: Node, parent: NodeHandle) -> Result<NodeHandle> {
        let handle = self.add_node(node);
        self.attach(handle, parent)?;
        Ok(handle)
    }

    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    #[must_use]
    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    pub fn set_name(&mut self, handle: NodeHandle, name: impl Into<String>) {
        if self.nodes.contains_key(handle) {
            self.names.insert(handle, name.into());
        }
    }

    #[must_use]
    pub fn name(&self, handle: NodeHandle) -> Option<&str> {
        self.names.get(handle).map(String::as_str)
    }

    /// First node with the given name, in arbitrary order.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<NodeHandle> {
        self.names
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(h, _)| h)
    }

    /// Reparent `child` under `parent`, detaching it from its current
    /// parent (or the root list) first.
    ///
    /// Rejects self-parenting and any attachment that would make `parent` a
    /// descendant of `child`.
    pub fn attach(&mut self, child: NodeHandle, parent: NodeHandle) -> Result<()> {
        if !self.nodes.contains_key(child) || !self.nodes.contains_key(parent) {
            return Err(ParallaxError::InvalidHandle(
                "attach: node no longer exists".into(),
            ));
        }
        if child == parent {
            log::warn!("rejected attach: node {child:?} to itself");
            return Err(ParallaxError::HierarchyCycle(
                "cannot attach a node to itself".into(),
            ));
        }
        // Walk the ancestor chain of the new parent.
        let mut cursor = self.nodes[parent].parent;
        while let Some(ancestor) = cursor {
            if ancestor == child {
                log::warn!("rejected attach: {parent:?} is a descendant of {child:?}");
                return Err(ParallaxError::HierarchyCycle(
                    "new parent is a descendant of the node".into(),
                ));
            }
            cursor = self.nodes[ancestor].parent;
        }

        self.unlink(child);
        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);
        // World matrices must be rebuilt against the new parent even if the
        // local TRS did not change; refresh the subtree right away so reads
        // before the next frame update see consistent positions.
        self.nodes[child].transform.mark_dirty();
        transform_system::update_subtree(&mut self.nodes, &mut self.cameras, child);
        self.graph_version += 1;
        Ok(())
    }

    /// Detach `child` from its parent; it becomes a root node.
    pub fn detach(&mut self, child: NodeHandle) -> Result<()> {
        if !self.nodes.contains_key(child) {
            return Err(ParallaxError::InvalidHandle(
                "detach: node no longer exists".into(),
            ));
        }
        self.unlink(child);
        self.root_nodes.push(child);
        self.nodes[child].transform.mark_dirty();
        transform_system::update_subtree(&mut self.nodes, &mut self.cameras, child);
        self.graph_version += 1;
        Ok(())
    }

    /// Remove the node and its whole subtree, dropping every attached
    /// component. Outstanding handles into the subtree go stale and never
    /// alias new nodes.
    pub fn remove_node(&mut self, handle: NodeHandle) {
        if !self.nodes.contains_key(handle) {
            return;
        }
        self.unlink(handle);

        let mut stack = vec![handle];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(current) {
                stack.extend(node.children.iter().copied());
            }
            self.names.remove(current);
            self.cameras.remove(current);
            self.lights.remove(current);
            self.colliders.remove(current);
            self.render_datas.remove(current);
            self.behaviors.remove(current);
            self.pickers.remove(current);
        }
        self.graph_version += 1;
    }

    /// Remove `child` from its parent's child list or the root list,
    /// leaving it dangling (caller re-homes it).
    fn unlink(&mut self, child: NodeHandle) {
        match self.nodes[child].parent.take() {
            Some(parent) => {
                if let Some(parent_node) = self.nodes.get_mut(parent) {
                    parent_node.children.retain(|&c| c != child);
                }
            }
            None => {
                self.root_nodes.retain(|&r| r != child);
            }
        }
    }

    /// All live node handles, depth-first pre-order over the root list.
    /// This is the canonical traversal order used by picking.
    #[must_use]
    pub fn traversal_order(&self) -> Vec<NodeHandle> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeHandle> = self.root_nodes.iter().rev().copied().collect();
        while let Some(handle) = stack.pop() {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            order.push(handle);
            stack.extend(node.children.iter().rev().copied());
        }
        order
    }

    // ========================================================================
    // Components
    // ========================================================================

    /// Attach a component to a node, replacing (and returning) any previous
    /// component of the same kind.
    pub fn attach_component<C: Capability>(
        &mut self,
        handle: NodeHandle,
        component: C,
    ) -> Result<Option<C>> {
        if !self.nodes.contains_key(handle) {
            return Err(ParallaxError::InvalidHandle(
                "attach_component: node no longer exists".into(),
            ));
        }
        self.graph_version += 1;
        Ok(C::storage_mut(self).insert(handle, component))
    }

    #[must_use]
    pub fn component<C: Capability>(&self, handle: NodeHandle) -> Option<&C> {
        C::storage(self).get(handle)
    }

    #[must_use]
    pub fn component_mut<C: Capability>(&mut self, handle: NodeHandle) -> Option<&mut C> {
        C::storage_mut(self).get_mut(handle)
    }

    pub fn remove_component<C: Capability>(&mut self, handle: NodeHandle) -> Option<C> {
        let removed = C::storage_mut(self).remove(handle);
        if removed.is_some() {
            self.graph_version += 1;
        }
        removed
    }

    /// Enabled components of kind `C` on visible nodes in the subtree rooted
    /// at `root`, depth-first pre-order. Lazy; an invisible node's component
    /// is skipped but its children are still visited.
    pub fn components_in_subtree<'a, C: Capability + 'a>(
        &'a self,
        root: NodeHandle,
    ) -> impl Iterator<Item = (NodeHandle, &'a C)> {
        let storage = C::storage(self);
        let mut stack = if self.nodes.contains_key(root) {
            vec![root]
        } else {
            Vec::new()
        };
        std::iter::from_fn(move || {
            while let Some(handle) = stack.pop() {
                let Some(node) = self.nodes.get(handle) else {
                    continue;
                };
                stack.extend(node.children.iter().rev().copied());
                if !node.visible {
                    continue;
                }
                if let Some(component) = storage.get(handle) {
                    if component.is_enabled() {
                        return Some((handle, component));
                    }
                }
            }
            None
        })
    }

    // Named conveniences over the generic accessors.

    pub fn set_camera(&mut self, handle: NodeHandle, camera: Camera) -> Result<Option<Camera>> {
        self.attach_component(handle, camera)
    }

    #[must_use]
    pub fn get_camera(&self, handle: NodeHandle) -> Option<&Camera> {
        self.cameras.get(handle)
    }

    #[must_use]
    pub fn get_camera_mut(&mut self, handle: NodeHandle) -> Option<&mut Camera> {
        self.cameras.get_mut(handle)
    }

    pub fn set_light(&mut self, handle: NodeHandle, light: Light) -> Result<Option<Light>> {
        self.attach_component(handle, light)
    }

    #[must_use]
    pub fn get_light(&self, handle: NodeHandle) -> Option<&Light> {
        self.lights.get(handle)
    }

    #[must_use]
    pub fn get_light_mut(&mut self, handle: NodeHandle) -> Option<&mut Light> {
        self.lights.get_mut(handle)
    }

    pub fn set_collider(
        &mut self,
        handle: NodeHandle,
        collider: Collider,
    ) -> Result<Option<Collider>> {
        self.attach_component(handle, collider)
    }

    #[must_use]
    pub fn get_collider(&self, handle: NodeHandle) -> Option<&Collider> {
        self.colliders.get(handle)
    }

    #[must_use]
    pub fn get_collider_mut(&mut self, handle: NodeHandle) -> Option<&mut Collider> {
        self.colliders.get_mut(handle)
    }

    pub fn set_render_data(
        &mut self,
        handle: NodeHandle,
        render_data: RenderData,
    ) -> Result<Option<RenderData>> {
        self.attach_component(handle, render_data)
    }

    #[must_use]
    pub fn get_render_data(&self, handle: NodeHandle) -> Option<&RenderData> {
        self.render_datas.get(handle)
    }

    #[must_use]
    pub fn get_render_data_mut(&mut self, handle: NodeHandle) -> Option<&mut RenderData> {
        self.render_datas.get_mut(handle)
    }

    pub fn set_behavior(
        &mut self,
        handle: NodeHandle,
        behavior: Box<dyn Behavior>,
    ) -> Result<Option<BehaviorComponent>> {
        self.attach_component(handle, BehaviorComponent::new(behavior))
    }

    /// Attach a picker; its ray will be derived from this node's world
    /// transform each pass.
    pub fn set_picker(&mut self, handle: NodeHandle, mut picker: Picker) -> Result<Option<Picker>> {
        picker.set_owner(Some(handle));
        self.attach_component(handle, picker)
    }

    #[must_use]
    pub fn get_picker(&self, handle: NodeHandle) -> Option<&Picker> {
        self.pickers.get(handle)
    }

    #[must_use]
    pub fn get_picker_mut(&mut self, handle: NodeHandle) -> Option<&mut Picker> {
        self.pickers.get_mut(handle)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Enabled lights on visible nodes, with the owning node's world
    /// matrix.
    pub fn iter_active_lights(&self) -> impl Iterator<Item = (&Light, &Affine3A)> {
        self.lights.iter().filter_map(|(handle, light)| {
            if !light.enabled {
                return None;
            }
            let node = self.nodes.get(handle)?;
            if !node.visible {
                return None;
            }
            Some((light, node.world_matrix()))
        })
    }

    /// All render-data components, regardless of enablement; callers filter.
    pub fn iter_render_data(&self) -> impl Iterator<Item = (NodeHandle, &RenderData)> {
        self.render_datas.iter()
    }

    /// First enabled camera on a visible node, if any.
    #[must_use]
    pub fn main_camera(&self) -> Option<(NodeHandle, &Camera)> {
        self.cameras.iter().find(|(handle, camera)| {
            camera.enabled && self.nodes.get(*handle).is_some_and(|n| n.visible)
        })
    }

    // ========================================================================
    // Frame update
    // ========================================================================

    /// Per-frame update, in fixed order:
    ///
    /// 1. behaviors (may mutate their node's transform)
    /// 2. hierarchy world-matrix walk (cameras refresh in the same pass)
    /// 3. light world position/direction refresh
    /// 4. pickers
    pub fn update(&mut self, dt: f32) {
        for (handle, component) in &mut self.behaviors {
            if !component.enabled {
                continue;
            }
            if let Some(node) = self.nodes.get_mut(handle) {
                component.behavior.update(node, dt);
            }
        }

        transform_system::update_hierarchy(&mut self.nodes, &mut self.cameras, &self.root_nodes);

        for (handle, light) in &mut self.lights {
            if let Some(node) = self.nodes.get(handle) {
                let world = node.world_matrix();
                light.position = Vec3::from(world.translation);
                light.direction = world.transform_vector3(-Vec3::Z).normalize_or_zero();
            }
        }

        // A picker pass borrows the scene immutably, so each picker is
        // lifted out of its table for the duration of its pass.
        let picker_handles: Vec<NodeHandle> = self.pickers.keys().collect();
        for handle in picker_handles {
            if let Some(mut picker) = self.pickers.remove(handle) {
                picker.process(self);
                self.pickers.insert(handle, picker);
            }
        }
    }
}
