//! Collaborator contracts.
//!
//! The engine core stays off the GPU and the filesystem: compiled programs,
//! draw submission and asset decoding live behind these traits. The render
//! thread owns the only [`RenderBackend`] instance; asset providers may be
//! called from any thread.

use std::sync::Arc;

use crate::errors::Result;
use crate::resources::{Mesh, Texture, UniformValue};

/// Opaque backend shader program id, as returned by
/// [`RenderBackend::compile_program`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// The native rendering layer the engine submits to.
///
/// All methods are invoked on the render thread only; `bind_shader` callers
/// on other threads marshal compile requests through the render queue.
pub trait RenderBackend {
    /// Compile and link a vertex/fragment pair into a program.
    ///
    /// Returns [`crate::ParallaxError::ShaderCompile`] for malformed source;
    /// the caller logs and leaves the variant uncompiled rather than
    /// crashing the frame.
    fn compile_program(&mut self, vertex_src: &str, fragment_src: &str) -> Result<ProgramId>;

    /// Upload one uniform value to a compiled program.
    fn bind_uniform(&mut self, program: ProgramId, name: &str, value: &UniformValue);

    /// Submit one mesh draw for the given pass.
    fn draw(&mut self, program: ProgramId, mesh: &Mesh, pass: usize);
}

/// Asynchronous asset source for meshes and textures.
///
/// Loads consult `still_wanted` before expensive work begins; once a load
/// has started it runs to completion. Failure of one asset never aborts
/// sibling loads.
pub trait AssetProvider: Send + Sync {
    /// Load a mesh by descriptor (file path, URI, builtin name).
    fn load_mesh(&self, descriptor: &str, still_wanted: &dyn Fn() -> bool) -> Result<Arc<Mesh>>;

    /// Load a texture by descriptor.
    fn load_texture(&self, descriptor: &str, still_wanted: &dyn Fn() -> bool)
        -> Result<Arc<Texture>>;
}
