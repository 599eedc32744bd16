//! Scene graph and spatial components.
//!
//! - [`Node`]: hierarchy + transform hot data
//! - [`Transform`]: TRS with cached local/world matrices
//! - [`Scene`]: node arena, per-capability component tables, frame update
//! - Components: [`Camera`], [`Light`], [`Collider`], [`Picker`], behaviors

pub mod behavior;
pub mod camera;
pub mod collider;
pub mod light;
pub mod node;
pub mod picker;
pub mod scene;
pub mod transform;
pub mod transform_system;

pub use behavior::{Behavior, BehaviorComponent};
pub use camera::{Camera, ProjectionType};
pub use collider::{BoundingBox, Collider, ColliderShape, Ray};
pub use light::{Light, LightClass, LightKind};
pub use node::Node;
pub use picker::{PickListener, PickedObject, Picker};
pub use scene::{Capability, Scene};
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    /// Stable handle into the scene's node arena. Handles are versioned:
    /// a handle to a removed node never aliases a new one.
    pub struct NodeHandle;
}
