//! Scene graph integration tests: hierarchy, transforms, components.

use glam::Vec3;
use parallax::scene::{BehaviorComponent, NodeHandle};
use parallax::{Camera, Collider, Light, Node, Scene};

// ============================================================================
// Hierarchy & transforms
// ============================================================================

#[test]
fn test_world_matrices_compose_through_update() {
    let mut scene = Scene::new();
    let parent = scene.create_node();
    let child = scene.create_child(parent).unwrap();
    let grandchild = scene.create_child(child).unwrap();

    scene.get_node_mut(parent).unwrap().transform.position = Vec3::new(1.0, 0.0, 0.0);
    scene.get_node_mut(child).unwrap().transform.position = Vec3::new(0.0, 2.0, 0.0);
    scene.get_node_mut(grandchild).unwrap().transform.position = Vec3::new(0.0, 0.0, 3.0);

    scene.update(0.016);

    let world = scene.get_node(grandchild).unwrap().world_matrix().translation;
    assert!((world.x - 1.0).abs() < 1e-5);
    assert!((world.y - 2.0).abs() < 1e-5);
    assert!((world.z - 3.0).abs() < 1e-5);
}

#[test]
fn test_reparent_rebuilds_world_matrix() {
    let mut scene = Scene::new();
    let a = scene.create_node();
    let b = scene.create_node();
    let child = scene.create_child(a).unwrap();

    scene.get_node_mut(a).unwrap().transform.position = Vec3::new(10.0, 0.0, 0.0);
    scene.get_node_mut(b).unwrap().transform.position = Vec3::new(-10.0, 0.0, 0.0);
    scene.update(0.016);
    assert!((scene.get_node(child).unwrap().world_matrix().translation.x - 10.0).abs() < 1e-5);

    // Local TRS unchanged; the world matrix must still follow the new parent.
    scene.attach(child, b).unwrap();
    scene.update(0.016);
    assert!((scene.get_node(child).unwrap().world_matrix().translation.x + 10.0).abs() < 1e-5);
}

#[test]
fn test_reparent_refreshes_world_matrix_immediately() {
    let mut scene = Scene::new();
    let anchor = scene.create_node();
    scene.get_node_mut(anchor).unwrap().transform.position = Vec3::new(4.0, 0.0, 0.0);
    scene.update(0.016);

    // No frame update between the graph mutation and the read.
    let orbit = scene.create_node();
    scene.attach(orbit, anchor).unwrap();
    assert!((scene.get_node(orbit).unwrap().world_matrix().translation.x - 4.0).abs() < 1e-5);

    scene.detach(orbit).unwrap();
    assert!(scene.get_node(orbit).unwrap().world_matrix().translation.x.abs() < 1e-5);
}

#[test]
fn test_unchanged_subtree_is_not_recomputed_incorrectly() {
    let mut scene = Scene::new();
    let parent = scene.create_node();
    let child = scene.create_child(parent).unwrap();
    scene.get_node_mut(child).unwrap().transform.position = Vec3::new(0.0, 1.0, 0.0);

    scene.update(0.016);
    scene.update(0.016);
    scene.update(0.016);

    let world = scene.get_node(child).unwrap().world_matrix().translation;
    assert!((world.y - 1.0).abs() < 1e-5);
}

#[test]
fn test_named_lookup() {
    let mut scene = Scene::new();
    let a = scene.create_node();
    scene.set_name(a, "player");
    assert_eq!(scene.name(a), Some("player"));
    assert_eq!(scene.find_by_name("player"), Some(a));
    assert_eq!(scene.find_by_name("missing"), None);

    scene.remove_node(a);
    assert_eq!(scene.find_by_name("player"), None);
}

#[test]
fn test_add_existing_node_becomes_root() {
    let mut scene = Scene::new();
    let mut node = Node::new();
    node.transform.position = Vec3::new(5.0, 0.0, 0.0);
    let handle = scene.add_node(node);

    assert_eq!(scene.root_nodes(), &[handle]);
    assert!(scene.get_node(handle).unwrap().parent().is_none());
}

// ============================================================================
// Components
// ============================================================================

#[test]
fn test_attach_component_replaces_previous() {
    let mut scene = Scene::new();
    let a = scene.create_node();

    assert!(scene.set_collider(a, Collider::sphere(1.0)).unwrap().is_none());
    let replaced = scene.set_collider(a, Collider::sphere(2.0)).unwrap();
    assert!(replaced.is_some());

    match scene.get_collider(a).unwrap().shape {
        parallax::ColliderShape::Sphere { radius } => assert!((radius - 2.0).abs() < 1e-6),
        parallax::ColliderShape::Box { .. } => panic!("expected sphere"),
    }
}

#[test]
fn test_attach_component_to_dead_node_fails() {
    let mut scene = Scene::new();
    let a = scene.create_node();
    scene.remove_node(a);
    assert!(scene.set_collider(a, Collider::sphere(1.0)).is_err());
}

#[test]
fn test_components_in_subtree_preorder() {
    let mut scene = Scene::new();
    let root = scene.create_node();
    let left = scene.create_child(root).unwrap();
    let right = scene.create_child(root).unwrap();
    let deep = scene.create_child(left).unwrap();
    let other_root = scene.create_node();

    scene.set_collider(root, Collider::sphere(1.0)).unwrap();
    scene.set_collider(deep, Collider::sphere(2.0)).unwrap();
    scene.set_collider(right, Collider::sphere(3.0)).unwrap();
    scene.set_collider(other_root, Collider::sphere(4.0)).unwrap();

    let found: Vec<NodeHandle> = scene
        .components_in_subtree::<Collider>(root)
        .map(|(h, _)| h)
        .collect();
    // Pre-order within the subtree; the unrelated root is not visited.
    assert_eq!(found, vec![root, deep, right]);

    // Invisible nodes and disabled components are filtered out, but an
    // invisible node's children are still visited.
    scene.get_node_mut(left).unwrap().visible = false;
    scene.get_collider_mut(right).unwrap().enabled = false;
    let found: Vec<NodeHandle> = scene
        .components_in_subtree::<Collider>(root)
        .map(|(h, _)| h)
        .collect();
    assert_eq!(found, vec![root, deep]);
}

#[test]
fn test_add_to_parent() {
    let mut scene = Scene::new();
    let root = scene.create_node();
    let mut node = Node::new();
    node.transform.position = Vec3::new(0.0, 1.0, 0.0);
    let child = scene.add_to_parent(node, root).unwrap();

    assert_eq!(scene.get_node(child).unwrap().parent(), Some(root));
    assert_eq!(scene.root_nodes(), &[root]);
}

#[test]
fn test_camera_view_follows_node() {
    let mut scene = Scene::new();
    let rig = scene.create_node();
    scene.get_node_mut(rig).unwrap().transform.position = Vec3::new(0.0, 0.0, 5.0);
    scene
        .set_camera(rig, Camera::new_perspective(60.0, 16.0 / 9.0, 0.1, 100.0))
        .unwrap();

    scene.update(0.016);

    // View matrix is the inverse of the node's world matrix.
    let view = scene.get_camera(rig).unwrap().view_matrix();
    let eye = view.transform_point3(Vec3::new(0.0, 0.0, 5.0));
    assert!(eye.length() < 1e-4);
}

#[test]
fn test_active_lights_skip_disabled_and_invisible() {
    let mut scene = Scene::new();
    let a = scene.create_node();
    let b = scene.create_node();
    let c = scene.create_node();

    scene.set_light(a, Light::new_directional(Vec3::ONE, 1.0)).unwrap();
    let mut off = Light::new_directional(Vec3::ONE, 1.0);
    off.enabled = false;
    scene.set_light(b, off).unwrap();
    scene.set_light(c, Light::new_directional(Vec3::ONE, 1.0)).unwrap();
    scene.get_node_mut(c).unwrap().visible = false;

    assert_eq!(scene.iter_active_lights().count(), 1);
}

#[test]
fn test_behavior_disabled_does_not_run() {
    let mut scene = Scene::new();
    let a = scene.create_node();
    scene
        .set_behavior(a, Box::new(|node: &mut Node, _dt: f32| {
            node.transform.position.x += 1.0;
        }))
        .unwrap();

    scene.component_mut::<BehaviorComponent>(a).unwrap().enabled = false;
    scene.update(1.0);

    assert!(scene.get_node(a).unwrap().world_matrix().translation.x.abs() < 1e-6);
}
