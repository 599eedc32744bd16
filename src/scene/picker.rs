//! Ray picking against the scene's colliders.
//!
//! A picker casts one world-space ray per pass, collects hits from enabled
//! colliders on visible nodes in graph traversal order, sorts them by
//! distance and diffs the hit set against the previous pass to drive
//! enter/exit/inside events. All per-collider events for a pass precede the
//! pass's single pick/no-pick summary event, and exits precede
//! enters/insides.

use glam::Vec3;
use rustc_hash::FxHashSet;

use crate::scene::collider::Ray;
use crate::scene::{NodeHandle, Scene};

/// One collider hit, immutable, produced fresh each pick pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickedObject {
    /// Owning node of the hit collider; collider identity for diffing.
    pub node: NodeHandle,
    pub hit_point: Vec3,
    /// Non-negative distance along the ray.
    pub distance: f32,
}

/// Pick event sink. Delivery is synchronous, in registration order, on the
/// thread running the pass. All methods default to no-ops.
pub trait PickListener: Send {
    /// Collider newly hit this pass.
    fn on_enter(&mut self, _picked: &PickedObject) {}
    /// Collider hit last pass but not this one. The handle may already be
    /// stale if the collider's node was removed.
    fn on_exit(&mut self, _node: NodeHandle) {}
    /// Collider hit last pass and this pass.
    fn on_inside(&mut self, _picked: &PickedObject) {}
    /// The hit set changed and is non-empty; fired once per pass, after all
    /// per-collider events.
    fn on_pick(&mut self, _picked: &[PickedObject]) {}
    /// The hit set changed and is empty; fired once per pass.
    fn on_no_pick(&mut self) {}
}

pub struct Picker {
    pub enabled: bool,
    owner: Option<NodeHandle>,
    manual_ray: Option<Ray>,

    last_ray: Option<Ray>,
    last_graph_version: Option<u64>,
    prev_hits: Vec<PickedObject>,

    listeners: Vec<Box<dyn PickListener>>,
}

impl Default for Picker {
    fn default() -> Self {
        Self::new()
    }
}

impl Picker {
    /// Standalone picker; the ray is set manually via [`Picker::set_ray`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            enabled: true,
            owner: None,
            manual_ray: None,
            last_ray: None,
            last_graph_version: None,
            prev_hits: Vec::new(),
            listeners: Vec::new(),
        }
    }

    /// Picker attached to a node: each pass derives the ray from the node's
    /// world translation and world-rotated forward axis (local −Z).
    #[must_use]
    pub fn attached_to(owner: NodeHandle) -> Self {
        let mut picker = Self::new();
        picker.owner = Some(owner);
        picker
    }

    #[must_use]
    pub fn owner(&self) -> Option<NodeHandle> {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: Option<NodeHandle>) {
        self.owner = owner;
    }

    /// Set the manual ray. Validation (finite, non-zero) already happened
    /// in [`Ray::new`].
    pub fn set_ray(&mut self, ray: Ray) {
        self.manual_ray = Some(ray);
    }

    pub fn add_listener(&mut self, listener: Box<dyn PickListener>) {
        self.listeners.push(listener);
    }

    /// Previous pass's hits, sorted ascending by distance.
    #[must_use]
    pub fn picked(&self) -> &[PickedObject] {
        &self.prev_hits
    }

    fn current_ray(&self, scene: &Scene) -> Option<Ray> {
        match self.owner {
            Some(owner) => {
                let node = scene.get_node(owner)?;
                let world = node.world_matrix();
                let origin = Vec3::from(world.translation);
                let direction = world.transform_vector3(-Vec3::Z);
                // World matrices of live nodes are finite; a degenerate
                // zero-scale forward axis yields no ray this frame.
                Ray::new(origin, direction).ok()
            }
            None => self.manual_ray,
        }
    }

    /// Per-frame evaluation: runs a pick pass when the ray or the scene
    /// changed since the last pass.
    pub fn process(&mut self, scene: &Scene) {
        if !self.enabled {
            return;
        }
        let Some(ray) = self.current_ray(scene) else {
            return;
        };

        let unchanged = self.last_ray == Some(ray)
            && self.last_graph_version == Some(scene.graph_version());
        if unchanged {
            return;
        }

        self.run_pass(scene, ray);
    }

    /// On-demand evaluation: always runs a pass.
    pub fn do_pick(&mut self, scene: &Scene) {
        if !self.enabled {
            return;
        }
        let Some(ray) = self.current_ray(scene) else {
            return;
        };
        self.run_pass(scene, ray);
    }

    fn run_pass(&mut self, scene: &Scene, ray: Ray) {
        // 1. Collect hits in graph traversal order.
        let mut hits: Vec<PickedObject> = Vec::new();
        for handle in scene.traversal_order() {
            let Some(node) = scene.get_node(handle) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            let Some(collider) = scene.get_collider(handle) else {
                continue;
            };
            if !collider.enabled {
                continue;
            }
            if let Some((distance, hit_point)) = collider.intersect(&ray, node.world_matrix()) {
                hits.push(PickedObject {
                    node: handle,
                    hit_point,
                    distance,
                });
            }
        }

        // 2. Stable sort: equal distances keep traversal order.
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        // 3. Diff by collider identity against the previous pass.
        let prev_set: FxHashSet<NodeHandle> = self.prev_hits.iter().map(|p| p.node).collect();
        let new_set: FxHashSet<NodeHandle> = hits.iter().map(|p| p.node).collect();

        let listeners = &mut self.listeners;

        // Exits first. This includes colliders that were removed from the
        // scene mid-hit: their stale handles simply no longer intersect.
        for prev in &self.prev_hits {
            if !new_set.contains(&prev.node) {
                for listener in listeners.iter_mut() {
                    listener.on_exit(prev.node);
                }
            }
        }

        // Enter/inside in sorted hit order.
        for hit in &hits {
            if prev_set.contains(&hit.node) {
                for listener in listeners.iter_mut() {
                    listener.on_inside(hit);
                }
            } else {
                for listener in listeners.iter_mut() {
                    listener.on_enter(hit);
                }
            }
        }

        // 4. Exactly one summary event, only when the set changed. Two
        // consecutive empty passes stay silent.
        if prev_set != new_set {
            if hits.is_empty() {
                for listener in listeners.iter_mut() {
                    listener.on_no_pick();
                }
            } else {
                for listener in listeners.iter_mut() {
                    listener.on_pick(&hits);
                }
            }
        }

        // 5. Persist for the next pass.
        self.prev_hits = hits;
        self.last_ray = Some(ray);
        self.last_graph_version = Some(scene.graph_version());
    }
}

impl std::fmt::Debug for Picker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Picker")
            .field("enabled", &self.enabled)
            .field("owner", &self.owner)
            .field("prev_hits", &self.prev_hits.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
