//! Shader variant generation, memoization and binding integration tests.

use std::sync::Arc;

use glam::{Vec3, Vec4};
use parallax::backend::{ProgramId, RenderBackend};
use parallax::errors::{ParallaxError, Result};
use parallax::shader::engine::compose_signature;
use parallax::shader::ShaderStage;
use parallax::{
    Light, Material, Mesh, RenderData, ShaderEngine, ShaderTemplate, Texture, UniformValue,
};
use parking_lot::RwLock;

// ============================================================================
// Test fixtures
// ============================================================================

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct MockBackend {
    compiles: usize,
    fail: bool,
}

impl MockBackend {
    fn new() -> Self {
        Self {
            compiles: 0,
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            compiles: 0,
            fail: true,
        }
    }
}

impl RenderBackend for MockBackend {
    fn compile_program(&mut self, _vertex: &str, _fragment: &str) -> Result<ProgramId> {
        self.compiles += 1;
        if self.fail {
            Err(ParallaxError::ShaderCompile("forced failure".into()))
        } else {
            Ok(ProgramId(self.compiles as u32))
        }
    }

    fn bind_uniform(&mut self, _program: ProgramId, _name: &str, _value: &UniformValue) {}

    fn draw(&mut self, _program: ProgramId, _mesh: &Mesh, _pass: usize) {}
}

fn color_template() -> ShaderTemplate {
    ShaderTemplate::new("Color")
        .with_descriptors("float4 diffuse_color", "sampler2D diffuseTexture")
        .with_segment(
            "VertexTemplate",
            "precision highp float;\n\
             in vec3 a_position;\n\
             #ifdef HAS_a_normal\n\
             in vec3 a_normal;\n\
             out vec3 v_normal;\n\
             #endif\n\
             @VertexSurface\n\
             void main() { gl_Position = vec4(a_position, 1.0); }\n",
        )
        .with_segment("VertexSurface", "// @ShaderName vertex surface\n")
        .with_segment(
            "FragmentTemplate",
            "precision highp float;\n\
             uniform vec4 diffuse_color;\n\
             #ifdef HAS_diffuseTexture\n\
             uniform sampler2D diffuseTexture;\n\
             in vec2 v_texcoord;\n\
             #endif\n\
             @LIGHTSOURCES\n\
             @FragmentSurface\n\
             out vec4 frag_color;\n\
             void main() { frag_color = Surface(); }\n",
        )
        .with_segment(
            "FragmentSurface",
            "vec4 Surface() { return diffuse_color; }\n",
        )
}

fn color_material() -> Material {
    let mut material = Material::new("float4 diffuse_color", "sampler2D diffuseTexture")
        .unwrap()
        .with_shader("Color");
    material
        .set("diffuse_color", UniformValue::Vec4(Vec4::ONE))
        .unwrap();
    material
}

fn quad_mesh() -> Arc<Mesh> {
    Arc::new(
        Mesh::new("quad")
            .with_attribute("a_position", 3)
            .with_counts(4, 6),
    )
}

fn render_data_with(material: Material, mesh: Arc<Mesh>) -> RenderData {
    let rd = RenderData::with_material(Arc::new(RwLock::new(material)));
    rd.set_mesh(mesh);
    rd
}

// ============================================================================
// Signatures
// ============================================================================

#[test]
fn test_signature_invariant_under_light_permutation() {
    let defined = std::collections::BTreeSet::new();
    let d1 = Light::new_directional(Vec3::ONE, 1.0);
    let p1 = Light::new_point(Vec3::ONE, 1.0, 10.0);
    let p2 = Light::new_point(Vec3::ONE, 0.5, 20.0);

    let a = compose_signature("Color", &defined, &[&d1, &p1, &p2]);
    let b = compose_signature("Color", &defined, &[&p2, &d1, &p1]);
    assert_eq!(a, b);

    // A different class multiset is a different signature.
    let c = compose_signature("Color", &defined, &[&d1, &p1]);
    assert_ne!(a, c);
}

#[test]
fn test_signature_depends_on_defines_and_name() {
    let empty = std::collections::BTreeSet::new();
    let mut with_texture = std::collections::BTreeSet::new();
    with_texture.insert("diffuseTexture".to_string());

    assert_ne!(
        compose_signature("Color", &empty, &[]),
        compose_signature("Color", &with_texture, &[])
    );
    assert_ne!(
        compose_signature("Color", &empty, &[]),
        compose_signature("Phong", &empty, &[])
    );
}

// ============================================================================
// Defined-symbol resolution
// ============================================================================

#[test]
fn test_unbound_texture_leaves_symbol_undefined() {
    let template = color_template();
    let material = color_material();
    let mesh = quad_mesh();

    let defined = ShaderEngine::compute_defined_symbols(&template, &material, &mesh, &[]);
    assert!(!defined.contains("diffuseTexture"));
    assert!(!defined.contains("a_normal"));
}

#[test]
fn test_bound_texture_and_attribute_define_symbols() {
    let template = color_template();
    let mut material = color_material();
    material
        .set_texture("diffuseTexture", Arc::new(Texture::new(64, 64).with_name("checker")))
        .unwrap();
    let mesh = Arc::new(
        Mesh::new("quad")
            .with_attribute("a_position", 3)
            .with_attribute("a_normal", 3),
    );

    let defined = ShaderEngine::compute_defined_symbols(&template, &material, &mesh, &[]);
    assert!(defined.contains("diffuseTexture"));
    assert!(defined.contains("a_normal"));
}

#[test]
fn test_shadow_flag_from_light_list() {
    let template = color_template();
    let material = color_material();
    let mesh = quad_mesh();
    let shadow_light = Light::new_directional(Vec3::ONE, 1.0).with_shadow(true);

    let defined =
        ShaderEngine::compute_defined_symbols(&template, &material, &mesh, &[&shadow_light]);
    assert!(defined.contains("SHADOWS"));
}

// ============================================================================
// Source synthesis
// ============================================================================

#[test]
fn test_generated_source_shape() {
    let template = color_template();
    let mut defined = std::collections::BTreeSet::new();
    defined.insert("diffuseTexture".to_string());

    let source = template
        .generate_stage(ShaderStage::Fragment, &defined, &[])
        .unwrap();

    assert!(source.starts_with("#version 300 es\n"));
    assert!(source.contains("#define HAS_diffuseTexture 1"));
    // Default-on surface segment was substituted and advertised.
    assert!(source.contains("#define HAS_FragmentSurface 1"));
    assert!(source.contains("vec4 Surface()"));
    // No placeholder survives synthesis.
    assert!(!source.contains('@'));
}

#[test]
fn test_light_block_dedups_classes() {
    let template = color_template();
    let defined = std::collections::BTreeSet::new();
    let p1 = Light::new_point(Vec3::ONE, 1.0, 10.0);
    let p2 = Light::new_point(Vec3::ONE, 1.0, 20.0);
    let d1 = Light::new_directional(Vec3::ONE, 1.0);
    let lights = [&p1, &p2, &d1];

    let source = template
        .generate_stage(ShaderStage::Fragment, &defined, &lights)
        .unwrap();

    // One struct/function per class, one uniform per instance.
    assert_eq!(source.matches("struct UPointLight").count(), 1);
    assert_eq!(source.matches("struct UDirectionalLight").count(), 1);
    assert!(source.contains("uniform UPointLight u_point_light0;"));
    assert!(source.contains("uniform UPointLight u_point_light1;"));
    assert!(source.contains("uniform UDirectionalLight u_directional_light2;"));
    // Accumulation entry calls every instance.
    assert!(source.contains("vec4 LightPixel()"));
    assert!(source.contains("color += PointLight(u_point_light0);"));
    assert!(source.contains("color += DirectionalLight(u_directional_light2);"));
}

#[test]
fn test_no_lights_no_light_block() {
    let template = color_template();
    let source = template
        .generate_stage(ShaderStage::Fragment, &std::collections::BTreeSet::new(), &[])
        .unwrap();
    assert!(!source.contains("LightPixel"));
}

// ============================================================================
// Engine binding & memoization
// ============================================================================

#[test]
fn test_bind_shader_caches_variant() {
    let engine = ShaderEngine::new();
    engine.register_template(color_template());
    let rd = render_data_with(color_material(), quad_mesh());

    engine.bind_shader(&rd, &[]).unwrap();
    assert_eq!(engine.variant_count(), 1);
    assert_eq!(engine.queue().pending(), 1);

    // Same inputs: cache hit, no second compile task.
    engine.bind_shader(&rd, &[]).unwrap();
    assert_eq!(engine.variant_count(), 1);
    assert_eq!(engine.queue().pending(), 1);

    let material = rd.material().unwrap();
    let material = material.read();
    let variant = material.variant().unwrap();
    assert!(!variant.is_compiled());

    drop(material);
    let mut backend = MockBackend::new();
    assert_eq!(engine.queue().drain(&mut backend), 1);
    assert_eq!(backend.compiles, 1);

    let material = rd.material().unwrap();
    assert_eq!(material.read().bound_program(), Some(ProgramId(1)));
}

#[test]
fn test_concurrent_binds_compile_once() {
    init_logging();
    let engine = ShaderEngine::new();
    engine.register_template(color_template());
    let rd = render_data_with(color_material(), quad_mesh());

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                engine.bind_shader(&rd, &[]).unwrap();
            });
        }
    });

    assert_eq!(engine.variant_count(), 1);
    assert_eq!(engine.queue().pending(), 1);

    let mut backend = MockBackend::new();
    engine.queue().drain(&mut backend);
    assert_eq!(backend.compiles, 1);
}

#[test]
fn test_missing_template_is_an_error() {
    let engine = ShaderEngine::new();
    let rd = render_data_with(color_material(), quad_mesh());

    let err = engine.bind_shader(&rd, &[]).unwrap_err();
    assert!(matches!(err, ParallaxError::MissingTemplate(_)));
}

#[test]
fn test_lighting_disabled_ignores_light_list() {
    let engine = ShaderEngine::new();
    engine.register_template(color_template());
    let mut rd = render_data_with(color_material(), quad_mesh());

    let d1 = Light::new_directional(Vec3::ONE, 1.0);
    rd.disable_light(&engine, &[&d1]).unwrap();

    let material = rd.material().unwrap();
    let material = material.read();
    let signature = &material.variant().unwrap().signature;
    assert!(!signature.contains("DirectionalLight"));
}

#[test]
fn test_lighting_toggle_rebinds_immediately() {
    let engine = ShaderEngine::new();
    engine.register_template(color_template());
    let mut rd = render_data_with(color_material(), quad_mesh());

    let d1 = Light::new_directional(Vec3::ONE, 1.0);
    rd.enable_light(&engine, &[&d1]).unwrap();
    let lit = rd.material().unwrap().read().variant().unwrap().signature.clone();
    assert!(lit.contains("DirectionalLight:1"));

    rd.disable_light(&engine, &[&d1]).unwrap();
    let unlit = rd.material().unwrap().read().variant().unwrap().signature.clone();
    assert_ne!(lit, unlit);
    assert_eq!(engine.variant_count(), 2);
}

#[test]
fn test_failed_compile_marks_variant() {
    init_logging();
    let engine = ShaderEngine::new();
    engine.register_template(color_template());
    let rd = render_data_with(color_material(), quad_mesh());

    engine.bind_shader(&rd, &[]).unwrap();
    let mut backend = MockBackend::failing();
    engine.queue().drain(&mut backend);

    let material = rd.material().unwrap();
    let material = material.read();
    let variant = material.variant().unwrap();
    assert!(variant.is_failed());
    assert!(material.bound_program().is_none());

    // The failed variant stays memoized; rebinding never re-compiles it.
    drop(material);
    engine.bind_shader(&rd, &[]).unwrap();
    assert_eq!(engine.queue().pending(), 0);
}

#[test]
fn test_reset_forgets_variants() {
    let engine = ShaderEngine::new();
    engine.register_template(color_template());
    let rd = render_data_with(color_material(), quad_mesh());

    engine.bind_shader(&rd, &[]).unwrap();
    assert_eq!(engine.variant_count(), 1);

    engine.reset();
    assert_eq!(engine.variant_count(), 0);

    // Material keeps its Arc until the next bind replaces it.
    assert!(rd.material().unwrap().read().variant().is_some());
}

// ============================================================================
// Scene-wide binding
// ============================================================================

#[test]
fn test_bind_scene_skips_broken_entities() {
    use parallax::Scene;

    let engine = ShaderEngine::new();
    engine.register_template(color_template());

    let mut scene = Scene::new();
    let good = scene.create_node();
    scene
        .set_render_data(good, render_data_with(color_material(), quad_mesh()))
        .unwrap();

    // This entity references an unregistered shader; it is logged and
    // skipped without aborting the good one.
    let bad = scene.create_node();
    let bad_material = Material::new("float4 diffuse_color", "")
        .unwrap()
        .with_shader("Nope");
    scene
        .set_render_data(bad, render_data_with(bad_material, quad_mesh()))
        .unwrap();

    scene.update(0.016);
    engine.bind_scene(&scene);

    assert_eq!(engine.variant_count(), 1);
    let rd = scene.get_render_data(good).unwrap();
    assert!(rd.material().unwrap().read().variant().is_some());
    let rd = scene.get_render_data(bad).unwrap();
    assert!(rd.material().unwrap().read().variant().is_none());
}
