//! Behavior component: per-frame update callback attached to a node.

use crate::scene::node::Node;

/// Per-frame logic attached to a node. Runs during
/// [`Scene::update`](crate::scene::Scene::update), before the transform
/// walk, so transform changes it makes land in the same frame's matrices.
pub trait Behavior: Send {
    fn update(&mut self, node: &mut Node, dt: f32);
}

impl<F: FnMut(&mut Node, f32) + Send> Behavior for F {
    fn update(&mut self, node: &mut Node, dt: f32) {
        self(node, dt);
    }
}

/// Storage wrapper giving boxed behaviors the common enabled flag.
pub struct BehaviorComponent {
    pub enabled: bool,
    pub behavior: Box<dyn Behavior>,
}

impl BehaviorComponent {
    #[must_use]
    pub fn new(behavior: Box<dyn Behavior>) -> Self {
        Self {
            enabled: true,
            behavior,
        }
    }
}

impl std::fmt::Debug for BehaviorComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviorComponent")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}
