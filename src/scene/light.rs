//! Light component.
//!
//! Each concrete light class carries a uniform descriptor and per-stage
//! shader source fragments; the shader engine injects each class's
//! contribution exactly once and one uniform declaration per instance. The
//! world-space position and direction are recomputed every frame from the
//! owning node's world transform.

use glam::Vec3;
use uuid::Uuid;

/// Static descriptor of one concrete light class.
///
/// `name` is the identity used for signature histograms and for
/// deduplicating the injected contribution function.
#[derive(Debug, Clone, Copy)]
pub struct LightClass {
    pub name: &'static str,
    pub uniform_descriptor: &'static str,
    pub vertex_output_descriptor: Option<&'static str>,
    pub vertex_shader: &'static str,
    pub fragment_shader: &'static str,
}

pub const DIRECTIONAL_LIGHT: LightClass = LightClass {
    name: "DirectionalLight",
    uniform_descriptor: "float3 color float intensity float3 direction",
    vertex_output_descriptor: None,
    vertex_shader: "vec4 DirectionalLight(UDirectionalLight light) { return vec4(0.0); }",
    fragment_shader: "vec4 DirectionalLight(UDirectionalLight light) {\n    float d = max(dot(v_normal, -light.direction), 0.0);\n    return vec4(light.color * light.intensity * d, 1.0);\n}",
};

pub const POINT_LIGHT: LightClass = LightClass {
    name: "PointLight",
    uniform_descriptor: "float3 color float intensity float3 position float range",
    vertex_output_descriptor: None,
    vertex_shader: "vec4 PointLight(UPointLight light) { return vec4(0.0); }",
    fragment_shader: "vec4 PointLight(UPointLight light) {\n    vec3 to_light = light.position - v_world_position;\n    float atten = clamp(1.0 - length(to_light) / light.range, 0.0, 1.0);\n    float d = max(dot(v_normal, normalize(to_light)), 0.0);\n    return vec4(light.color * light.intensity * d * atten, 1.0);\n}",
};

pub const SPOT_LIGHT: LightClass = LightClass {
    name: "SpotLight",
    uniform_descriptor:
        "float3 color float intensity float3 position float3 direction float range float inner_cone_cos float outer_cone_cos",
    vertex_output_descriptor: None,
    vertex_shader: "vec4 SpotLight(USpotLight light) { return vec4(0.0); }",
    fragment_shader: "vec4 SpotLight(USpotLight light) {\n    vec3 to_light = light.position - v_world_position;\n    float cone = dot(normalize(-to_light), light.direction);\n    float falloff = smoothstep(light.outer_cone_cos, light.inner_cone_cos, cone);\n    float d = max(dot(v_normal, normalize(to_light)), 0.0);\n    return vec4(light.color * light.intensity * d * falloff, 1.0);\n}",
};

#[derive(Debug, Clone)]
pub enum LightKind {
    Directional,
    Point { range: f32 },
    Spot { range: f32, inner_cone: f32, outer_cone: f32 },
}

impl LightKind {
    #[must_use]
    pub fn class(&self) -> &'static LightClass {
        match self {
            Self::Directional => &DIRECTIONAL_LIGHT,
            Self::Point { .. } => &POINT_LIGHT,
            Self::Spot { .. } => &SPOT_LIGHT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Light {
    pub uuid: Uuid,
    pub enabled: bool,

    pub color: Vec3,
    pub intensity: f32,
    pub kind: LightKind,
    pub cast_shadow: bool,

    /// World-space position, refreshed each frame from the owning node.
    pub position: Vec3,
    /// World-space forward (−Z) direction, refreshed each frame.
    pub direction: Vec3,
}

impl Light {
    fn base(color: Vec3, intensity: f32, kind: LightKind) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            enabled: true,
            color,
            intensity,
            kind,
            cast_shadow: false,
            position: Vec3::ZERO,
            direction: -Vec3::Z,
        }
    }

    #[must_use]
    pub fn new_directional(color: Vec3, intensity: f32) -> Self {
        Self::base(color, intensity, LightKind::Directional)
    }

    #[must_use]
    pub fn new_point(color: Vec3, intensity: f32, range: f32) -> Self {
        Self::base(color, intensity, LightKind::Point { range })
    }

    #[must_use]
    pub fn new_spot(
        color: Vec3,
        intensity: f32,
        range: f32,
        inner_cone: f32,
        outer_cone: f32,
    ) -> Self {
        Self::base(
            color,
            intensity,
            LightKind::Spot {
                range,
                inner_cone,
                outer_cone,
            },
        )
    }

    #[must_use]
    pub fn with_shadow(mut self, cast_shadow: bool) -> Self {
        self.cast_shadow = cast_shadow;
        self
    }

    #[must_use]
    pub fn class(&self) -> &'static LightClass {
        self.kind.class()
    }
}
