//! Ray and collider intersection.
//!
//! Colliders define the test volume for picking. Spheres are tested in
//! world space (center at the owning node's world translation); boxes are
//! tested in the collider's local space by inverse-transforming the ray.

use glam::{Affine3A, Vec3};

use crate::errors::{ParallaxError, Result};

/// World-space picking ray. Non-finite components are rejected at the
/// setter, never during traversal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Normalized.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Result<Self> {
        if !origin.is_finite() || !direction.is_finite() {
            return Err(ParallaxError::InvalidArgument(
                "ray origin/direction must be finite".into(),
            ));
        }
        if direction.length_squared() < 1e-12 {
            return Err(ParallaxError::InvalidArgument(
                "ray direction must be non-zero".into(),
            ));
        }
        Ok(Self {
            origin,
            direction: direction.normalize(),
        })
    }

    #[must_use]
    pub fn point_at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// Axis-aligned box in the collider's local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn unit() -> Self {
        Self {
            min: Vec3::splat(-0.5),
            max: Vec3::splat(0.5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    /// Sphere of `radius` in local units, centered at the node origin.
    Sphere { radius: f32 },
    /// Local-space axis-aligned box.
    Box { bounds: BoundingBox },
}

#[derive(Debug, Clone)]
pub struct Collider {
    pub enabled: bool,
    pub shape: ColliderShape,
}

impl Collider {
    #[must_use]
    pub fn sphere(radius: f32) -> Self {
        Self {
            enabled: true,
            shape: ColliderShape::Sphere { radius },
        }
    }

    #[must_use]
    pub fn aabb(bounds: BoundingBox) -> Self {
        Self {
            enabled: true,
            shape: ColliderShape::Box { bounds },
        }
    }

    /// Intersect a world-space ray against this collider under the given
    /// world transform. Returns `(distance, world hit point)` of the
    /// nearest non-negative hit.
    #[must_use]
    pub fn intersect(&self, ray: &Ray, world: &Affine3A) -> Option<(f32, Vec3)> {
        match self.shape {
            ColliderShape::Sphere { radius } => {
                let center = Vec3::from(world.translation);
                // Conservative world radius under non-uniform scale.
                let scale = world
                    .matrix3
                    .x_axis
                    .length()
                    .max(world.matrix3.y_axis.length())
                    .max(world.matrix3.z_axis.length());
                intersect_sphere(ray, center, radius * scale)
            }
            ColliderShape::Box { bounds } => intersect_box(ray, &bounds, world),
        }
    }
}

fn intersect_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<(f32, Vec3)> {
    let oc = ray.origin - center;
    let b = oc.dot(ray.direction);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sqrt_disc = disc.sqrt();
    // Nearest non-negative root; origin inside the sphere hits the far wall.
    let t = if -b - sqrt_disc >= 0.0 {
        -b - sqrt_disc
    } else if -b + sqrt_disc >= 0.0 {
        -b + sqrt_disc
    } else {
        return None;
    };
    Some((t, ray.point_at(t)))
}

fn intersect_box(ray: &Ray, bounds: &BoundingBox, world: &Affine3A) -> Option<(f32, Vec3)> {
    let inv = world.inverse();
    let local_origin = inv.transform_point3(ray.origin);
    let local_dir = inv.transform_vector3(ray.direction);

    // Slab test in local space.
    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;

    for axis in 0..3 {
        let o = local_origin[axis];
        let d = local_dir[axis];
        let (lo, hi) = (bounds.min[axis], bounds.max[axis]);

        if d.abs() < 1e-9 {
            if o < lo || o > hi {
                return None;
            }
        } else {
            let mut t0 = (lo - o) / d;
            let mut t1 = (hi - o) / d;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
    }

    let t_local = if t_min >= 0.0 {
        t_min
    } else if t_max >= 0.0 {
        t_max
    } else {
        return None;
    };

    // Distance is measured in world space along the (normalized) world ray.
    let world_point = world.transform_point3(local_origin + local_dir * t_local);
    let distance = (world_point - ray.origin).dot(ray.direction);
    if distance < 0.0 {
        return None;
    }
    Some((distance, world_point))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_rejects_nan() {
        assert!(Ray::new(Vec3::new(f32::NAN, 0.0, 0.0), -Vec3::Z).is_err());
        assert!(Ray::new(Vec3::ZERO, Vec3::new(0.0, f32::INFINITY, 0.0)).is_err());
        assert!(Ray::new(Vec3::ZERO, Vec3::ZERO).is_err());
    }

    #[test]
    fn test_sphere_hit_distance() {
        let ray = Ray::new(Vec3::ZERO, -Vec3::Z).unwrap();
        let world = Affine3A::from_translation(Vec3::new(0.0, 0.0, -5.0));
        let collider = Collider::sphere(1.0);

        let (t, point) = collider.intersect(&ray, &world).unwrap();
        assert!((t - 4.0).abs() < 1e-5);
        assert!((point.z + 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_sphere_miss() {
        let ray = Ray::new(Vec3::ZERO, -Vec3::Z).unwrap();
        let world = Affine3A::from_translation(Vec3::new(10.0, 0.0, -5.0));
        assert!(Collider::sphere(1.0).intersect(&ray, &world).is_none());
    }

    #[test]
    fn test_sphere_scaled_by_world() {
        let ray = Ray::new(Vec3::ZERO, -Vec3::Z).unwrap();
        let world = Affine3A::from_scale_rotation_translation(
            Vec3::splat(2.0),
            glam::Quat::IDENTITY,
            Vec3::new(0.0, 0.0, -5.0),
        );
        let (t, _) = Collider::sphere(1.0).intersect(&ray, &world).unwrap();
        assert!((t - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_box_hit() {
        let ray = Ray::new(Vec3::ZERO, -Vec3::Z).unwrap();
        let world = Affine3A::from_translation(Vec3::new(0.0, 0.0, -3.0));
        let collider = Collider::aabb(BoundingBox::unit());

        let (t, _) = collider.intersect(&ray, &world).unwrap();
        assert!((t - 2.5).abs() < 1e-5);
    }

    #[test]
    fn test_box_behind_ray() {
        let ray = Ray::new(Vec3::ZERO, -Vec3::Z).unwrap();
        let world = Affine3A::from_translation(Vec3::new(0.0, 0.0, 3.0));
        assert!(Collider::aabb(BoundingBox::unit())
            .intersect(&ray, &world)
            .is_none());
    }
}
