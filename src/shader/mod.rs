//! Shader variant generation and binding.
//!
//! - [`ShaderTemplate`]: master + named optional segments, `@placeholder`
//!   substitution, light-source injection
//! - [`ShaderEngine`]: defined-symbol resolution, signature memoization,
//!   at-most-one compile per signature
//! - [`RenderQueue`]: marshals compile tasks onto the render thread

pub mod engine;
pub mod queue;
pub mod template;

pub use engine::{ShaderEngine, ShaderVariant};
pub use queue::RenderQueue;
pub use template::{ShaderStage, ShaderTemplate, ShaderTemplateRegistry};
