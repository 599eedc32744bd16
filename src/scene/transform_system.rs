//! Hierarchy world-matrix update, decoupled from `Scene`.
//!
//! Borrows only the node arena, the camera table and the root list, so the
//! scene's other component maps stay free during the walk.

use glam::Affine3A;
use slotmap::{SlotMap, SparseSecondaryMap};

use crate::scene::camera::Camera;
use crate::scene::node::Node;
use crate::scene::NodeHandle;

/// Update world matrices for the whole hierarchy, pre-order.
///
/// Iterative (explicit stack) to survive deep hierarchies without stack
/// overflow. Cameras attached to updated nodes get their view/projection
/// refreshed in the same walk.
pub fn update_hierarchy(
    nodes: &mut SlotMap<NodeHandle, Node>,
    cameras: &mut SparseSecondaryMap<NodeHandle, Camera>,
    roots: &[NodeHandle],
) {
    // (node, parent world matrix, parent changed)
    let mut stack: Vec<(NodeHandle, Affine3A, bool)> = Vec::with_capacity(64);

    for &root in roots.iter().rev() {
        stack.push((root, Affine3A::IDENTITY, false));
    }

    while let Some((handle, parent_world, parent_changed)) = stack.pop() {
        let Some(node) = nodes.get_mut(handle) else {
            continue;
        };

        let local_changed = node.transform.update_local_matrix();
        let world_needs_update = local_changed || parent_changed;

        if world_needs_update {
            let new_world = parent_world * *node.transform.local_matrix();
            node.transform.set_world_matrix(new_world);

            if let Some(camera) = cameras.get_mut(handle) {
                camera.update_view_projection(&new_world);
            }
        }

        let current_world = node.transform.world_matrix;
        let child_count = node.children.len();

        // Reverse push keeps pre-order traversal.
        for i in (0..child_count).rev() {
            if let Some(node) = nodes.get(handle) {
                if let Some(&child) = node.children.get(i) {
                    stack.push((child, current_world, world_needs_update));
                }
            }
        }
    }
}

/// Update only the subtree below `root`, seeding from its parent's world
/// matrix. Runs on attach/detach so reparented nodes read consistent world
/// positions before the next frame update.
pub fn update_subtree(
    nodes: &mut SlotMap<NodeHandle, Node>,
    cameras: &mut SparseSecondaryMap<NodeHandle, Camera>,
    root: NodeHandle,
) {
    let parent_world = match nodes.get(root) {
        Some(node) => node
            .parent
            .and_then(|p| nodes.get(p))
            .map_or(Affine3A::IDENTITY, |p| p.transform.world_matrix),
        None => return,
    };

    let mut stack: Vec<(NodeHandle, Affine3A, bool)> = vec![(root, parent_world, true)];

    while let Some((handle, parent_world, parent_changed)) = stack.pop() {
        let Some(node) = nodes.get_mut(handle) else {
            continue;
        };

        let local_changed = node.transform.update_local_matrix();
        let world_needs_update = local_changed || parent_changed;

        if world_needs_update {
            let new_world = parent_world * *node.transform.local_matrix();
            node.transform.set_world_matrix(new_world);

            if let Some(camera) = cameras.get_mut(handle) {
                camera.update_view_projection(&new_world);
            }
        }

        let current_world = node.transform.world_matrix;
        let child_count = node.children.len();
        for i in (0..child_count).rev() {
            if let Some(node) = nodes.get(handle) {
                if let Some(&child) = node.children.get(i) {
                    stack.push((child, current_world, world_needs_update));
                }
            }
        }
    }
}
