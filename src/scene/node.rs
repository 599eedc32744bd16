//! Scene node: the per-entity hot data.

use crate::scene::transform::Transform;
use crate::scene::NodeHandle;
use glam::Affine3A;

/// A minimal scene node containing only essential hot data.
///
/// Only the data traversed every frame lives here (hierarchy and
/// transform); components (render data, lights, colliders, cameras,
/// behaviors) are stored in the [`Scene`](crate::scene::Scene)'s
/// per-capability maps keyed by [`NodeHandle`].
///
/// Nodes form a tree: `parent` is `None` for root nodes, `children` keeps
/// insertion order, and a node has exactly one parent at a time.
#[derive(Debug, Clone)]
pub struct Node {
    /// Parent node handle (None for root nodes)
    pub(crate) parent: Option<NodeHandle>,
    /// Child node handles, insertion order significant
    pub(crate) children: Vec<NodeHandle>,

    /// Transform component (hot data accessed every frame)
    pub transform: Transform,

    /// Visibility flag; gates the node's components in picking, lighting
    /// and rendering
    pub visible: bool,
}

impl Node {
    /// Creates a new detached node with default transform and visibility.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            transform: Transform::new(),
            visible: true,
        }
    }

    /// Returns the parent node handle, if any.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    /// Returns a read-only slice of child node handles.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    /// Returns a reference to the world transformation matrix.
    ///
    /// Product of ancestor local matrices root-to-node; refreshed by the
    /// transform system each frame.
    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.transform.world_matrix
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}
