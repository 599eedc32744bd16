//! Uniform types, values and descriptor parsing.
//!
//! A descriptor is an immutable string fixed at construction time that
//! defines the legal key set of a material (or the uniform block of a light
//! class), e.g. `"float4 diffuse_color; float u_opacity"`. Setting or
//! getting a key outside the descriptor is a configuration error, never a
//! silent no-op.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::errors::{ParallaxError, Result};
use crate::utils::interner::{self, Symbol};

/// Declared type of one descriptor entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    Float,
    Int,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
    Sampler2D,
}

impl UniformType {
    /// Parse a descriptor type token. Accepts both `floatN` (descriptor
    /// convention) and `vecN` spellings.
    pub fn parse(token: &str) -> Result<Self> {
        match token {
            "float" => Ok(Self::Float),
            "int" => Ok(Self::Int),
            "float2" | "vec2" => Ok(Self::Vec2),
            "float3" | "vec3" => Ok(Self::Vec3),
            "float4" | "vec4" => Ok(Self::Vec4),
            "mat4" => Ok(Self::Mat4),
            "sampler2D" => Ok(Self::Sampler2D),
            _ => Err(ParallaxError::InvalidArgument(format!(
                "unknown descriptor type '{token}'"
            ))),
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Int => "int",
            Self::Vec2 => "float2",
            Self::Vec3 => "float3",
            Self::Vec4 => "float4",
            Self::Mat4 => "mat4",
            Self::Sampler2D => "sampler2D",
        }
    }
}

/// A typed uniform value, up to 4x4 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl UniformValue {
    #[must_use]
    pub fn ty(&self) -> UniformType {
        match self {
            Self::Float(_) => UniformType::Float,
            Self::Int(_) => UniformType::Int,
            Self::Vec2(_) => UniformType::Vec2,
            Self::Vec3(_) => UniformType::Vec3,
            Self::Vec4(_) => UniformType::Vec4,
            Self::Mat4(_) => UniformType::Mat4,
        }
    }
}

/// Parsed descriptor: ordered `(type, name)` entries.
///
/// Entry order follows the descriptor text, so generated uniform blocks are
/// deterministic for a given descriptor string.
#[derive(Debug, Clone, Default)]
pub struct UniformDescriptor {
    entries: Vec<(UniformType, Symbol)>,
}

impl UniformDescriptor {
    /// Parse a descriptor string. Entries are `type name` pairs separated
    /// by whitespace, `;` or `,`.
    pub fn parse(descriptor: &str) -> Result<Self> {
        let mut entries = Vec::new();
        let mut tokens = descriptor
            .split(|c: char| c.is_whitespace() || c == ';' || c == ',')
            .filter(|t| !t.is_empty());

        while let Some(ty_token) = tokens.next() {
            let ty = UniformType::parse(ty_token)?;
            let Some(name) = tokens.next() else {
                return Err(ParallaxError::InvalidArgument(format!(
                    "descriptor entry '{ty_token}' has no name"
                )));
            };
            entries.push((ty, interner::intern(name)));
        }

        Ok(Self { entries })
    }

    /// Declared type of `name`, or None when the key is not in the
    /// descriptor.
    #[must_use]
    pub fn type_of(&self, name: &str) -> Option<UniformType> {
        let sym = interner::get(name)?;
        self.entries
            .iter()
            .find(|(_, n)| *n == sym)
            .map(|(ty, _)| *ty)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.type_of(name).is_some()
    }

    /// Iterate entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (UniformType, Symbol)> + '_ {
        self.entries.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
