// Lint policy lives in Cargo.toml's [lints] tables.

pub mod backend;
pub mod errors;
pub mod resources;
pub mod scene;
pub mod shader;
pub mod utils;

pub use backend::{AssetProvider, ProgramId, RenderBackend};
pub use errors::{ParallaxError, Result};
pub use resources::{Material, Mesh, MeshSlot, RenderData, RenderPass, Texture, UniformType, UniformValue};
pub use scene::{
    Camera, Collider, ColliderShape, Light, LightKind, Node, PickListener, PickedObject, Picker,
    Ray, Scene, Transform,
};
pub use shader::{ShaderEngine, ShaderTemplate, ShaderTemplateRegistry, ShaderVariant};
pub use utils::interner;
