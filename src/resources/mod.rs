//! CPU-side resource layer.
//!
//! - [`UniformValue`]/[`UniformType`]: typed uniform slots and descriptors
//! - [`Material`]: descriptor-enforced uniform/texture store
//! - [`Texture`]: shared texture record
//! - [`Mesh`] / [`MeshSlot`]: vertex layout and deferred mesh resolution
//! - [`RenderData`]: mesh + render passes aggregate

pub mod material;
pub mod mesh;
pub mod render_data;
pub mod texture;
pub mod uniforms;

pub use material::Material;
pub use mesh::{Mesh, MeshSlot, VertexAttribute};
pub use render_data::{RenderData, RenderPass};
pub use texture::Texture;
pub use uniforms::{UniformDescriptor, UniformType, UniformValue};
