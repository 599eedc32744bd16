//! Material: descriptor-enforced shader data.
//!
//! A material owns a typed uniform map and a texture slot map. Both key sets
//! are fixed at construction by descriptor strings; any access outside the
//! descriptor is a configuration error and leaves the maps unchanged.
//!
//! The shader-variant engine reads the declared uniforms and bound textures
//! to compute the defined-symbol set, and writes the resolved
//! [`ShaderVariant`] back onto the material.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3, Vec4};
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::backend::ProgramId;
use crate::errors::{ParallaxError, Result};
use crate::resources::texture::Texture;
use crate::resources::uniforms::{UniformDescriptor, UniformType, UniformValue};
use crate::shader::ShaderVariant;
use crate::utils::interner::{self, Symbol};

#[derive(Debug)]
pub struct Material {
    pub uuid: Uuid,
    pub name: Option<String>,
    /// Shader template this material resolves against (registry key).
    pub shader_name: String,
    version: AtomicU64,

    uniform_descriptor: UniformDescriptor,
    texture_descriptor: UniformDescriptor,

    uniforms: FxHashMap<Symbol, UniformValue>,
    textures: FxHashMap<Symbol, Arc<Texture>>,

    /// Resolved shader variant, assigned by the shader engine.
    variant: Option<Arc<ShaderVariant>>,
}

impl Material {
    /// Create a material from its descriptor strings.
    ///
    /// Every declared uniform starts at a zero default so reads of declared
    /// keys always succeed. Texture slots start unbound.
    pub fn new(uniform_descriptor: &str, texture_descriptor: &str) -> Result<Self> {
        let uniform_descriptor = UniformDescriptor::parse(uniform_descriptor)?;
        let texture_descriptor = UniformDescriptor::parse(texture_descriptor)?;

        let mut uniforms = FxHashMap::default();
        for (ty, name) in uniform_descriptor.iter() {
            uniforms.insert(name, Self::zero_value(ty)?);
        }

        Ok(Self {
            uuid: Uuid::new_v4(),
            name: None,
            shader_name: String::new(),
            version: AtomicU64::new(0),
            uniform_descriptor,
            texture_descriptor,
            uniforms,
            textures: FxHashMap::default(),
            variant: None,
        })
    }

    /// Builder-style shader selection.
    #[must_use]
    pub fn with_shader(mut self, shader_name: impl Into<String>) -> Self {
        self.shader_name = shader_name.into();
        self
    }

    fn zero_value(ty: UniformType) -> Result<UniformValue> {
        match ty {
            UniformType::Float => Ok(UniformValue::Float(0.0)),
            UniformType::Int => Ok(UniformValue::Int(0)),
            UniformType::Vec2 => Ok(UniformValue::Vec2(Vec2::ZERO)),
            UniformType::Vec3 => Ok(UniformValue::Vec3(Vec3::ZERO)),
            UniformType::Vec4 => Ok(UniformValue::Vec4(Vec4::ZERO)),
            UniformType::Mat4 => Ok(UniformValue::Mat4(Mat4::IDENTITY)),
            UniformType::Sampler2D => Err(ParallaxError::InvalidArgument(
                "sampler2D belongs in the texture descriptor".into(),
            )),
        }
    }

    // ========================================================================
    // Uniform access
    // ========================================================================

    /// Set a uniform value. Fails with [`ParallaxError::UnknownUniform`] for
    /// keys outside the descriptor and [`ParallaxError::UniformTypeMismatch`]
    /// for wrong value types; the map is unchanged on error.
    pub fn set(&mut self, name: &str, value: UniformValue) -> Result<()> {
        let Some(expected) = self.uniform_descriptor.type_of(name) else {
            return Err(ParallaxError::UnknownUniform(name.to_string()));
        };
        if expected != value.ty() {
            return Err(ParallaxError::UniformTypeMismatch {
                name: name.to_string(),
                expected: expected.name(),
                got: value.ty().name(),
            });
        }
        // Key symbol exists: type_of resolved it above.
        let sym = interner::intern(name);
        self.uniforms.insert(sym, value);
        self.mark_dirty();
        Ok(())
    }

    pub fn set_float(&mut self, name: &str, value: f32) -> Result<()> {
        self.set(name, UniformValue::Float(value))
    }

    pub fn set_int(&mut self, name: &str, value: i32) -> Result<()> {
        self.set(name, UniformValue::Int(value))
    }

    pub fn set_vec2(&mut self, name: &str, value: Vec2) -> Result<()> {
        self.set(name, UniformValue::Vec2(value))
    }

    pub fn set_vec3(&mut self, name: &str, value: Vec3) -> Result<()> {
        self.set(name, UniformValue::Vec3(value))
    }

    pub fn set_vec4(&mut self, name: &str, value: Vec4) -> Result<()> {
        self.set(name, UniformValue::Vec4(value))
    }

    pub fn set_mat4(&mut self, name: &str, value: Mat4) -> Result<()> {
        self.set(name, UniformValue::Mat4(value))
    }

    /// Read a uniform value. Keys outside the descriptor fail with
    /// [`ParallaxError::UnknownUniform`].
    pub fn get(&self, name: &str) -> Result<UniformValue> {
        if !self.uniform_descriptor.contains(name) {
            return Err(ParallaxError::UnknownUniform(name.to_string()));
        }
        let sym = interner::intern(name);
        self.uniforms
            .get(&sym)
            .copied()
            .ok_or_else(|| ParallaxError::UnknownUniform(name.to_string()))
    }

    pub fn get_float(&self, name: &str) -> Result<f32> {
        match self.get(name)? {
            UniformValue::Float(v) => Ok(v),
            other => Err(ParallaxError::UniformTypeMismatch {
                name: name.to_string(),
                expected: "float",
                got: other.ty().name(),
            }),
        }
    }

    pub fn get_vec4(&self, name: &str) -> Result<Vec4> {
        match self.get(name)? {
            UniformValue::Vec4(v) => Ok(v),
            other => Err(ParallaxError::UniformTypeMismatch {
                name: name.to_string(),
                expected: "float4",
                got: other.ty().name(),
            }),
        }
    }

    /// Whether `name` is declared in the uniform descriptor. Used by the
    /// shader engine's `HAS_<name>` symbol resolution.
    #[must_use]
    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniform_descriptor.contains(name)
    }

    // ========================================================================
    // Texture access
    // ========================================================================

    /// Bind a texture to a declared slot. Undeclared slots fail with
    /// [`ParallaxError::UnknownTexture`].
    pub fn set_texture(&mut self, name: &str, texture: Arc<Texture>) -> Result<()> {
        if !self.texture_descriptor.contains(name) {
            return Err(ParallaxError::UnknownTexture(name.to_string()));
        }
        let sym = interner::intern(name);
        self.textures.insert(sym, texture);
        self.mark_dirty();
        Ok(())
    }

    /// Fetch a bound texture. Undeclared slots are an error; a declared but
    /// unbound slot returns `None`.
    pub fn texture(&self, name: &str) -> Result<Option<Arc<Texture>>> {
        if !self.texture_descriptor.contains(name) {
            return Err(ParallaxError::UnknownTexture(name.to_string()));
        }
        Ok(interner::get(name).and_then(|sym| self.textures.get(&sym).cloned()))
    }

    /// Whether a texture is actually bound under `name`. A declared but
    /// unbound slot reports false, which simply leaves the matching
    /// `HAS_<name>` symbol undefined.
    #[must_use]
    pub fn has_texture(&self, name: &str) -> bool {
        interner::get(name).is_some_and(|sym| self.textures.contains_key(&sym))
    }

    // ========================================================================
    // Shader binding & versioning
    // ========================================================================

    /// Assign the resolved variant. Called by the shader engine.
    pub fn bind_variant(&mut self, variant: Arc<ShaderVariant>) {
        self.variant = Some(variant);
    }

    #[must_use]
    pub fn variant(&self) -> Option<&Arc<ShaderVariant>> {
        self.variant.as_ref()
    }

    /// Backend program id once the variant has compiled; `None` while the
    /// compile is pending or after it failed (the object is skipped at draw).
    #[must_use]
    pub fn bound_program(&self) -> Option<ProgramId> {
        self.variant.as_ref().and_then(|v| v.program())
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Relaxed)
    }

    pub fn mark_dirty(&self) {
        self.version.fetch_add(1, Ordering::Relaxed);
    }
}
