//! Mesh vertex layout and deferred mesh resolution.
//!
//! Geometry decoding is the asset provider's business; the core needs the
//! vertex attribute names (for `HAS_<attribute>` symbol resolution) and the
//! element counts the backend draws with.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::errors::{ParallaxError, Result};
use crate::utils::interner::{self, Symbol};

/// One named vertex attribute, e.g. `a_normal` with 3 components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub name: Symbol,
    pub components: u8,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,
    attributes: Vec<VertexAttribute>,
    pub vertex_count: usize,
    pub index_count: usize,
}

impl Mesh {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            vertex_count: 0,
            index_count: 0,
        }
    }

    /// Builder-style attribute registration, insertion order preserved.
    #[must_use]
    pub fn with_attribute(mut self, name: &str, components: u8) -> Self {
        self.attributes.push(VertexAttribute {
            name: interner::intern(name),
            components,
        });
        self
    }

    #[must_use]
    pub fn with_counts(mut self, vertex_count: usize, index_count: usize) -> Self {
        self.vertex_count = vertex_count;
        self.index_count = index_count;
        self
    }

    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        interner::get(name).is_some_and(|sym| self.has_attribute_symbol(sym))
    }

    #[must_use]
    pub fn has_attribute_symbol(&self, sym: Symbol) -> bool {
        self.attributes.iter().any(|a| a.name == sym)
    }

    #[must_use]
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }
}

enum SlotState {
    Empty,
    Ready(Arc<Mesh>),
    /// Resolution in flight; the sender side is held by the asset loader.
    Pending(flume::Receiver<Arc<Mesh>>),
}

/// A synchronously-set or deferred mesh handle.
///
/// A deferred slot blocks the caller only at the point the mesh is actually
/// needed (shader binding or drawing); the resolved mesh is cached so every
/// later access is non-blocking.
pub struct MeshSlot {
    state: Mutex<SlotState>,
}

impl Default for MeshSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshSlot {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Empty),
        }
    }

    /// Set the mesh synchronously.
    pub fn set(&self, mesh: Arc<Mesh>) {
        *self.state.lock() = SlotState::Ready(mesh);
    }

    /// Install a deferred handle whose value arrives on `receiver`.
    pub fn set_deferred(&self, receiver: flume::Receiver<Arc<Mesh>>) {
        *self.state.lock() = SlotState::Pending(receiver);
    }

    /// Whether a resolved mesh is available without blocking.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(&*self.state.lock(), SlotState::Ready(_))
    }

    /// Resolve the mesh, blocking on a pending handle. The result is cached;
    /// subsequent calls return immediately.
    pub fn resolve(&self) -> Result<Arc<Mesh>> {
        let mut state = self.state.lock();
        match &*state {
            SlotState::Ready(mesh) => Ok(mesh.clone()),
            SlotState::Empty => Err(ParallaxError::InvalidHandle(
                "render data has no mesh".into(),
            )),
            SlotState::Pending(receiver) => {
                let mesh = receiver.recv().map_err(|_| {
                    ParallaxError::AssetNotFound("deferred mesh load was dropped".into())
                })?;
                *state = SlotState::Ready(mesh.clone());
                Ok(mesh)
            }
        }
    }

    /// Non-blocking peek at the resolved mesh.
    #[must_use]
    pub fn get(&self) -> Option<Arc<Mesh>> {
        match &*self.state.lock() {
            SlotState::Ready(mesh) => Some(mesh.clone()),
            _ => None,
        }
    }
}

impl std::fmt::Debug for MeshSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &*self.state.lock() {
            SlotState::Empty => "Empty",
            SlotState::Ready(_) => "Ready",
            SlotState::Pending(_) => "Pending",
        };
        f.debug_struct("MeshSlot").field("state", &state).finish()
    }
}
