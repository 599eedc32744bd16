//! Shader variant resolution, memoization and binding.
//!
//! `bind_shader` may be called from any thread. The variant cache is shared
//! by every render-data using this engine; insert-if-absent happens under
//! one lock, and only the inserting thread schedules the compile task, so at
//! most one compile runs per distinct signature. Compilation itself is
//! marshaled onto the render queue and executes on the render thread.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use bitflags::bitflags;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use crate::backend::ProgramId;
use crate::errors::{ParallaxError, Result};
use crate::resources::render_data::RenderData;
use crate::resources::Mesh;
use crate::scene::light::Light;
use crate::scene::Scene;
use crate::shader::queue::RenderQueue;
use crate::shader::template::{ShaderStage, ShaderTemplate, ShaderTemplateRegistry};

bitflags! {
    /// Base defines derived from the light list rather than from
    /// material/mesh attribute discovery.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct LightingFlags: u32 {
        const SHADOWS = 1 << 0;
    }
}

impl LightingFlags {
    fn from_lights(lights: &[&Light]) -> Self {
        let mut flags = Self::empty();
        if lights.iter().any(|l| l.cast_shadow) {
            flags |= Self::SHADOWS;
        }
        flags
    }

    fn symbols(self) -> impl Iterator<Item = &'static str> {
        self.iter_names().map(|(name, _)| name)
    }
}

/// Memoized compiled-shader record, keyed by signature.
///
/// The entry itself is the memo: concurrent binds for the same signature
/// share one `Arc<ShaderVariant>` and observe the pending compile through
/// [`ShaderVariant::program`].
#[derive(Debug)]
pub struct ShaderVariant {
    pub signature: String,
    pub vertex_source: String,
    pub fragment_source: String,
    program: OnceLock<ProgramId>,
    failed: AtomicBool,
}

impl ShaderVariant {
    fn new(signature: String, vertex_source: String, fragment_source: String) -> Self {
        Self {
            signature,
            vertex_source,
            fragment_source,
            program: OnceLock::new(),
            failed: AtomicBool::new(false),
        }
    }

    /// Backend id once compiled, `None` while pending or failed.
    #[must_use]
    pub fn program(&self) -> Option<ProgramId> {
        self.program.get().copied()
    }

    #[must_use]
    pub fn is_compiled(&self) -> bool {
        self.program.get().is_some()
    }

    /// Whether the backend rejected this variant's source. The variant stays
    /// in the cache so the bad signature is never re-compiled; objects bound
    /// to it are skipped at draw.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }
}

/// Compose the deterministic variant signature.
///
/// Pure function of its inputs: shader name, sorted defined symbols, and a
/// per-light-class histogram sorted by class name — permuting light
/// instances of the same class multiset yields the same string.
#[must_use]
pub fn compose_signature(shader_name: &str, defined: &BTreeSet<String>, lights: &[&Light]) -> String {
    let mut histogram: std::collections::BTreeMap<&str, usize> = std::collections::BTreeMap::new();
    for light in lights {
        *histogram.entry(light.class().name).or_insert(0) += 1;
    }

    let defines: Vec<&str> = defined.iter().map(String::as_str).collect();
    let classes: Vec<String> = histogram
        .iter()
        .map(|(class, count)| format!("{class}:{count}"))
        .collect();

    format!("{shader_name}${}${}", defines.join(";"), classes.join(";"))
}

pub struct ShaderEngine {
    registry: RwLock<ShaderTemplateRegistry>,
    variants: Mutex<FxHashMap<String, Arc<ShaderVariant>>>,
    queue: RenderQueue,
}

impl Default for ShaderEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderEngine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(ShaderTemplateRegistry::new()),
            variants: Mutex::new(FxHashMap::default()),
            queue: RenderQueue::new(),
        }
    }

    pub fn register_template(&self, template: ShaderTemplate) {
        self.registry.write().register(template);
    }

    #[must_use]
    pub fn template(&self, name: &str) -> Option<Arc<ShaderTemplate>> {
        self.registry.read().get(name)
    }

    /// The render-thread work queue; the render loop drains it once per
    /// frame before draw submission.
    #[must_use]
    pub fn queue(&self) -> &RenderQueue {
        &self.queue
    }

    #[must_use]
    pub fn variant_count(&self) -> usize {
        self.variants.lock().len()
    }

    /// Drop all memoized variants. Materials keep their `Arc` until rebound.
    pub fn reset(&self) {
        self.variants.lock().clear();
    }

    /// Resolve the defined-symbol set for one (template, material, mesh,
    /// lights) combination.
    ///
    /// Base defines come first (shadow flag from the light list), then every
    /// `HAS_<name>` symbol referenced by the template's segments is defined
    /// iff the material declares a uniform `name`, binds a texture `name`,
    /// or the mesh carries a vertex attribute `name`. A missing texture
    /// simply leaves its symbol undefined.
    #[must_use]
    pub fn compute_defined_symbols(
        template: &ShaderTemplate,
        material: &crate::resources::Material,
        mesh: &Mesh,
        lights: &[&Light],
    ) -> BTreeSet<String> {
        let mut defined = BTreeSet::new();

        for symbol in LightingFlags::from_lights(lights).symbols() {
            defined.insert(symbol.to_string());
        }

        for symbol in template.referenced_symbols() {
            if material.has_uniform(&symbol)
                || material.has_texture(&symbol)
                || mesh.has_attribute(&symbol)
            {
                defined.insert(symbol);
            }
        }

        defined
    }

    /// Resolve and bind the shader variant for every pass of `render_data`.
    ///
    /// Callable from any thread. A pass without a material is a no-op; a
    /// disabled lighting flag binds against an empty light list. On a cache
    /// miss the sources are synthesized immediately and exactly one compile
    /// task is scheduled on the render queue.
    pub fn bind_shader(&self, render_data: &RenderData, lights: &[&Light]) -> Result<()> {
        let lights: &[&Light] = if render_data.lighting_enabled() {
            lights
        } else {
            &[]
        };

        for (pass_index, pass) in render_data.passes().iter().enumerate() {
            let Some(material_arc) = pass.material() else {
                continue;
            };

            // Deferred meshes resolve (and block) here, at the point the
            // mesh is actually needed.
            let mesh = render_data.mesh_slot().resolve()?;

            let shader_name = material_arc.read().shader_name.clone();
            let Some(template) = self.template(&shader_name) else {
                return Err(ParallaxError::MissingTemplate(format!(
                    "shader '{shader_name}' is not registered (pass {pass_index})"
                )));
            };

            let variant = {
                let material = material_arc.read();
                let defined = Self::compute_defined_symbols(&template, &material, &mesh, lights);
                let signature = compose_signature(&template.name, &defined, lights);

                let mut cache = self.variants.lock();
                if let Some(hit) = cache.get(&signature) {
                    log::debug!("shader variant cache hit: {signature}");
                    hit.clone()
                } else {
                    let vertex_source =
                        template.generate_stage(ShaderStage::Vertex, &defined, lights)?;
                    let fragment_source =
                        template.generate_stage(ShaderStage::Fragment, &defined, lights)?;
                    let variant = Arc::new(ShaderVariant::new(
                        signature.clone(),
                        vertex_source,
                        fragment_source,
                    ));
                    cache.insert(signature.clone(), variant.clone());
                    log::debug!("shader variant cache miss, compiling: {signature}");

                    // Only the inserting thread schedules the compile, so a
                    // signature compiles at most once.
                    self.schedule_compile(variant.clone());
                    variant
                }
            };

            material_arc.write().bind_variant(variant);
        }

        Ok(())
    }

    fn schedule_compile(&self, variant: Arc<ShaderVariant>) {
        self.queue.post(Box::new(move |backend| {
            match backend.compile_program(&variant.vertex_source, &variant.fragment_source) {
                Ok(id) => {
                    let _ = variant.program.set(id);
                }
                Err(err) => {
                    variant.failed.store(true, Ordering::Release);
                    log::error!(
                        "shader compile failed for signature '{}': {err}",
                        variant.signature
                    );
                }
            }
        }));
    }

    /// Per-frame binding over a whole scene.
    ///
    /// Errors local to one render-data are logged and that entity is
    /// skipped; they never abort the rest of the pass.
    pub fn bind_scene(&self, scene: &Scene) {
        let lights: Vec<&Light> = scene.iter_active_lights().map(|(light, _)| light).collect();

        for (handle, render_data) in scene.iter_render_data() {
            if !render_data.enabled {
                continue;
            }
            if let Err(err) = self.bind_shader(render_data, &lights) {
                log::warn!("skipping shader binding for node {handle:?}: {err}");
            }
        }
    }
}
