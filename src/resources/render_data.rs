//! Render-data aggregate: one mesh, one or more render passes.
//!
//! Each pass owns one (shared) material; pass order is draw order. The
//! lighting toggle feeds the shader engine's defined-symbol set, so flipping
//! it re-resolves the shader binding immediately rather than waiting for
//! the next frame.

use parking_lot::RwLock;
use smallvec::SmallVec;
use std::sync::Arc;

use crate::errors::{ParallaxError, Result};
use crate::resources::material::Material;
use crate::resources::mesh::{Mesh, MeshSlot};
use crate::scene::light::Light;
use crate::shader::ShaderEngine;

/// One (mesh draw, material) pairing.
#[derive(Debug, Clone, Default)]
pub struct RenderPass {
    material: Option<Arc<RwLock<Material>>>,
}

impl RenderPass {
    #[must_use]
    pub fn new(material: Arc<RwLock<Material>>) -> Self {
        Self {
            material: Some(material),
        }
    }

    #[must_use]
    pub fn material(&self) -> Option<Arc<RwLock<Material>>> {
        self.material.clone()
    }
}

#[derive(Debug)]
pub struct RenderData {
    mesh: MeshSlot,
    passes: SmallVec<[RenderPass; 1]>,
    lighting_enabled: bool,
    pub enabled: bool,
}

impl Default for RenderData {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderData {
    /// Create with a single empty pass. A pass without a material makes
    /// shader binding a no-op for that pass.
    #[must_use]
    pub fn new() -> Self {
        let mut passes = SmallVec::new();
        passes.push(RenderPass::default());
        Self {
            mesh: MeshSlot::new(),
            passes,
            lighting_enabled: true,
            enabled: true,
        }
    }

    #[must_use]
    pub fn with_material(material: Arc<RwLock<Material>>) -> Self {
        let mut rd = Self::new();
        rd.passes[0] = RenderPass::new(material);
        rd
    }

    // ========================================================================
    // Mesh
    // ========================================================================

    #[must_use]
    pub fn mesh_slot(&self) -> &MeshSlot {
        &self.mesh
    }

    pub fn set_mesh(&self, mesh: Arc<Mesh>) {
        self.mesh.set(mesh);
    }

    /// Install a deferred mesh; resolution blocks only when the mesh is
    /// first needed for binding or drawing.
    pub fn set_mesh_deferred(&self, receiver: flume::Receiver<Arc<Mesh>>) {
        self.mesh.set_deferred(receiver);
    }

    // ========================================================================
    // Passes & materials
    // ========================================================================

    #[must_use]
    pub fn passes(&self) -> &[RenderPass] {
        &self.passes
    }

    #[must_use]
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Append a pass, returning its index.
    pub fn add_pass(&mut self, material: Arc<RwLock<Material>>) -> usize {
        self.passes.push(RenderPass::new(material));
        self.passes.len() - 1
    }

    /// Material of the default pass (0).
    #[must_use]
    pub fn material(&self) -> Option<Arc<RwLock<Material>>> {
        self.passes.first().and_then(RenderPass::material)
    }

    /// Material of pass `index`; out-of-range is a logged error, never a
    /// frame-crashing panic.
    pub fn material_at(&self, index: usize) -> Result<Option<Arc<RwLock<Material>>>> {
        match self.passes.get(index) {
            Some(pass) => Ok(pass.material()),
            None => {
                log::error!("render pass index {index} out of range ({})", self.passes.len());
                Err(ParallaxError::IndexOutOfBounds {
                    context: "render pass".into(),
                    index,
                })
            }
        }
    }

    /// Set the material of the default pass (0).
    pub fn set_material(&mut self, material: Arc<RwLock<Material>>) {
        self.passes[0] = RenderPass::new(material);
    }

    pub fn set_material_at(&mut self, index: usize, material: Arc<RwLock<Material>>) -> Result<()> {
        match self.passes.get_mut(index) {
            Some(pass) => {
                *pass = RenderPass::new(material);
                Ok(())
            }
            None => {
                log::error!("render pass index {index} out of range ({})", self.passes.len());
                Err(ParallaxError::IndexOutOfBounds {
                    context: "render pass".into(),
                    index,
                })
            }
        }
    }

    // ========================================================================
    // Lighting toggle
    // ========================================================================

    #[must_use]
    pub fn lighting_enabled(&self) -> bool {
        self.lighting_enabled
    }

    /// Enable lighting and re-resolve the shader binding immediately: the
    /// defined-symbol set depends on this flag.
    pub fn enable_light(&mut self, engine: &ShaderEngine, lights: &[&Light]) -> Result<()> {
        self.lighting_enabled = true;
        engine.bind_shader(self, lights)
    }

    /// Disable lighting and re-resolve immediately against an empty light
    /// list.
    pub fn disable_light(&mut self, engine: &ShaderEngine, lights: &[&Light]) -> Result<()> {
        self.lighting_enabled = false;
        engine.bind_shader(self, lights)
    }
}
