//! Shader templates and source synthesis.
//!
//! A template is a flat registry entry: a shader name plus named source
//! segments. `"VertexTemplate"` / `"FragmentTemplate"` are the master
//! segments for the two stages; every other segment prefixed with the stage
//! name is optional and replaces its `@SegmentName` placeholder in the
//! master when it is defined (or default-on). `@ShaderName` and
//! `@LIGHTSOURCES` are substituted last, and the emitted source is preceded
//! by a fixed version header and one `#define` line per active symbol.

use std::collections::BTreeSet;

use crate::errors::{ParallaxError, Result};
use crate::resources::uniforms::{UniformDescriptor, UniformType};
use crate::scene::light::Light;

/// Fixed header prepended to every generated stage source.
pub const VERSION_HEADER: &str = "#version 300 es";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Vertex => "Vertex",
            Self::Fragment => "Fragment",
        }
    }

    /// Name of the generated light-accumulation entry point.
    #[must_use]
    pub fn light_entry(self) -> &'static str {
        match self {
            Self::Vertex => "LightVertex",
            Self::Fragment => "LightPixel",
        }
    }
}

fn glsl_type(ty: UniformType) -> &'static str {
    match ty {
        UniformType::Float => "float",
        UniformType::Int => "int",
        UniformType::Vec2 => "vec2",
        UniformType::Vec3 => "vec3",
        UniformType::Vec4 => "vec4",
        UniformType::Mat4 => "mat4",
        UniformType::Sampler2D => "sampler2D",
    }
}

/// `DirectionalLight` -> `directional_light`, used for per-instance uniform
/// names.
fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// One shader-family descriptor in the flat registry.
///
/// Segment registration order is preserved; synthesis walks segments in that
/// order so generated source is deterministic for a given template.
#[derive(Debug, Clone)]
pub struct ShaderTemplate {
    pub name: String,
    pub uniform_descriptor: String,
    pub texture_descriptor: String,
    segments: Vec<(String, String)>,
}

impl ShaderTemplate {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uniform_descriptor: String::new(),
            texture_descriptor: String::new(),
            segments: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_descriptors(
        mut self,
        uniform_descriptor: impl Into<String>,
        texture_descriptor: impl Into<String>,
    ) -> Self {
        self.uniform_descriptor = uniform_descriptor.into();
        self.texture_descriptor = texture_descriptor.into();
        self
    }

    /// Register (or replace) a named segment.
    #[must_use]
    pub fn with_segment(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        let name = name.into();
        let source = source.into();
        if let Some(entry) = self.segments.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = source;
        } else {
            self.segments.push((name, source));
        }
        self
    }

    #[must_use]
    pub fn segment(&self, name: &str) -> Option<&str> {
        self.segments
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s.as_str())
    }

    /// All `HAS_<name>` symbols referenced anywhere in the registered
    /// segment sources, deduplicated and sorted.
    #[must_use]
    pub fn referenced_symbols(&self) -> BTreeSet<String> {
        let mut symbols = BTreeSet::new();
        for (_, source) in &self.segments {
            scan_has_symbols(source, &mut symbols);
        }
        symbols
    }

    /// Whether an optional segment is default-on: a segment that no source
    /// gates behind `HAS_<segmentName>` is always substituted.
    fn is_default_on(&self, segment_name: &str) -> bool {
        let gate = format!("HAS_{segment_name}");
        !self.segments.iter().any(|(_, src)| contains_token(src, &gate))
    }

    /// Synthesize one stage's source.
    ///
    /// `defined` is the resolved defined-symbol set; `lights` is the active
    /// light instance list (already empty when lighting is disabled).
    pub fn generate_stage(
        &self,
        stage: ShaderStage,
        defined: &BTreeSet<String>,
        lights: &[&Light],
    ) -> Result<String> {
        let prefix = stage.prefix();
        let master_name = format!("{prefix}Template");
        let Some(master) = self.segment(&master_name) else {
            return Err(ParallaxError::MissingTemplate(format!(
                "{} has no {master_name} segment",
                self.name
            )));
        };

        let mut body = master.to_string();
        let mut substituted: Vec<&str> = Vec::new();

        // Optional segments, registration order.
        for (name, source) in &self.segments {
            if name == &master_name || !name.starts_with(prefix) {
                continue;
            }
            let placeholder = format!("@{name}");
            let on = defined.contains(name.as_str()) || self.is_default_on(name);
            if on {
                body = body.replace(&placeholder, source);
                substituted.push(name);
            } else {
                body = body.replace(&placeholder, "");
            }
        }

        body = body.replace("@ShaderName", &self.name);
        body = body.replace("@LIGHTSOURCES", &light_block(stage, lights));

        let mut out = String::with_capacity(body.len() + 256);
        out.push_str(VERSION_HEADER);
        out.push('\n');
        for name in substituted {
            out.push_str(&format!("#define HAS_{name} 1\n"));
        }
        for symbol in defined {
            out.push_str(&format!("#define HAS_{symbol} 1\n"));
        }
        out.push_str(&body);
        Ok(out)
    }
}

/// Generate the light-source block for one stage.
///
/// Per distinct light class (first-appearance order): one uniform struct
/// declaration and the class's contribution function, exactly once. Per
/// light instance: one uniform declaration and one accumulation call inside
/// the stage's entry function.
fn light_block(stage: ShaderStage, lights: &[&Light]) -> String {
    if lights.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    let mut emitted_classes: Vec<&str> = Vec::new();

    for light in lights {
        let class = light.class();
        if emitted_classes.contains(&class.name) {
            continue;
        }
        emitted_classes.push(class.name);

        out.push_str(&format!("struct U{} {{\n", class.name));
        if let Ok(descriptor) = UniformDescriptor::parse(class.uniform_descriptor) {
            for (ty, name) in descriptor.iter() {
                out.push_str(&format!(
                    "    {} {};\n",
                    glsl_type(ty),
                    crate::utils::interner::resolve(name)
                ));
            }
        }
        out.push_str("};\n");

        let contribution = match stage {
            ShaderStage::Vertex => class.vertex_shader,
            ShaderStage::Fragment => class.fragment_shader,
        };
        out.push_str(contribution);
        out.push('\n');
    }

    // One uniform declaration per instance.
    for (i, light) in lights.iter().enumerate() {
        let class = light.class();
        out.push_str(&format!(
            "uniform U{} u_{}{};\n",
            class.name,
            snake_case(class.name),
            i
        ));
    }

    // The stage entry accumulates every instance.
    out.push_str(&format!("vec4 {}() {{\n", stage.light_entry()));
    out.push_str("    vec4 color = vec4(0.0);\n");
    for (i, light) in lights.iter().enumerate() {
        let class = light.class();
        out.push_str(&format!(
            "    color += {}(u_{}{});\n",
            class.name,
            snake_case(class.name),
            i
        ));
    }
    out.push_str("    return color;\n}\n");
    out
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Collect the `<name>` of every `HAS_<name>` token in `source`.
fn scan_has_symbols(source: &str, out: &mut BTreeSet<String>) {
    let bytes = source.as_bytes();
    let mut start = 0;
    while let Some(pos) = source[start..].find("HAS_") {
        let at = start + pos;
        // Must start a fresh identifier.
        let preceded = at > 0 && is_ident_char(bytes[at - 1] as char);
        let name_start = at + 4;
        let name_end = source[name_start..]
            .find(|c: char| !is_ident_char(c))
            .map_or(source.len(), |off| name_start + off);
        if !preceded && name_end > name_start {
            out.insert(source[name_start..name_end].to_string());
        }
        start = name_end.max(at + 4);
    }
}

/// Whole-token containment check (`HAS_Foo` must not match `HAS_FooBar`).
fn contains_token(source: &str, token: &str) -> bool {
    let bytes = source.as_bytes();
    let mut start = 0;
    while let Some(pos) = source[start..].find(token) {
        let at = start + pos;
        let before_ok = at == 0 || !is_ident_char(bytes[at - 1] as char);
        let end = at + token.len();
        let after_ok = end >= source.len() || !is_ident_char(bytes[end] as char);
        if before_ok && after_ok {
            return true;
        }
        start = at + token.len();
    }
    false
}

/// Flat shader registry: shader name -> template descriptor.
#[derive(Debug, Default)]
pub struct ShaderTemplateRegistry {
    templates: rustc_hash::FxHashMap<String, std::sync::Arc<ShaderTemplate>>,
}

impl ShaderTemplateRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, template: ShaderTemplate) {
        self.templates
            .insert(template.name.clone(), std::sync::Arc::new(template));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<std::sync::Arc<ShaderTemplate>> {
        self.templates.get(name).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
