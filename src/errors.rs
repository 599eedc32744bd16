//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! All public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, ParallaxError>`. Configuration errors (unknown
//! uniform keys, missing template segments) are raised synchronously to the
//! caller; errors local to one node, material or light never abort a whole
//! scene update or pick pass — the offending entity is skipped and logged.

use thiserror::Error;

/// The main error type for the Parallax engine.
#[derive(Error, Debug)]
pub enum ParallaxError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// A uniform key that is not part of the material's uniform descriptor.
    #[error("Unknown uniform: {0}")]
    UnknownUniform(String),

    /// A texture slot that is not part of the material's texture descriptor.
    #[error("Unknown texture: {0}")]
    UnknownTexture(String),

    /// The value type does not match the descriptor entry for this key.
    #[error("Uniform type mismatch for '{name}': expected {expected}, got {got}")]
    UniformTypeMismatch {
        /// The uniform key being set
        name: String,
        /// Type declared in the descriptor
        expected: &'static str,
        /// Type of the supplied value
        got: &'static str,
    },

    /// A shader template has no master segment for the requested stage.
    #[error("Missing template segment: {0}")]
    MissingTemplate(String),

    /// A value rejected at the setter (non-finite ray, malformed descriptor).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ========================================================================
    // Runtime Graph Errors
    // ========================================================================
    /// Attaching the node would introduce a cycle in the scene graph.
    #[error("Hierarchy cycle: {0}")]
    HierarchyCycle(String),

    /// A node or component handle that no longer resolves.
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    /// Index out of bounds (render pass, attribute slot).
    #[error("Index out of bounds: {context} (index: {index})")]
    IndexOutOfBounds {
        /// Description of what was being accessed
        context: String,
        /// The invalid index
        index: usize,
    },

    // ========================================================================
    // Compile & Resource Errors
    // ========================================================================
    /// The backend rejected the generated shader source. Fatal for that
    /// signature's variant only; the affected object is skipped at draw.
    #[error("Shader compile error: {0}")]
    ShaderCompile(String),

    /// The requested asset was not found.
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Alias for `Result<T, ParallaxError>`.
pub type Result<T> = std::result::Result<T, ParallaxError>;
