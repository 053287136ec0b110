/*!
Core data types and math aliases shared by the interaction modules.

This module intentionally contains no algorithms. It defines the values
exchanged between:
- pointers and the raycast port (rays, hits)
- the focus lock and gesture layers (target handles)
- the scene transform port (transform snapshots)
*/

use nalgebra as na;
use serde::{Deserialize, Serialize};

/// Common math aliases for clarity and consistency.
pub type Vec2 = na::Vector2<f32>;
pub type Vec3 = na::Vector3<f32>;
pub type Quat = na::UnitQuaternion<f32>;

/// Opaque handle to a scene object owned by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub u64);

/// Stable identity of a pointer for its whole lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointerId(pub u32);

/// Identity of an input source (controller, hand, mouse).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub u32);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
    #[default]
    None,
}

/// A half-line in world space. `direction` is always unit length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Build a ray, normalizing `direction`.
    ///
    /// Returns `None` for non-finite inputs or a direction too short to normalize.
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        if !is_finite_vec(&origin) || !is_finite_vec(&direction) {
            return None;
        }
        let len = direction.norm();
        if len <= crate::settings::DIST_EPS {
            return None;
        }
        Some(Self {
            origin,
            direction: direction / len,
        })
    }

    #[inline]
    pub fn point_at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// One straight segment of a (possibly curved) pointer ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayStep {
    pub origin: Vec3,
    pub terminus: Vec3,
}

impl RayStep {
    pub fn new(origin: Vec3, terminus: Vec3) -> Self {
        Self { origin, terminus }
    }

    #[inline]
    pub fn length(&self) -> f32 {
        (self.terminus - self.origin).norm()
    }

    /// The segment as a ray, or `None` if it has no length.
    pub fn ray(&self) -> Option<Ray> {
        Ray::new(self.origin, self.terminus - self.origin)
    }
}

/// Result of a successful ray or sweep query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    /// World-space contact point on the obstructing surface.
    pub point: Vec3,
    /// World-space surface normal, facing against the query direction.
    pub normal: Vec3,
    /// Distance travelled along the query before contact (meters).
    /// For sweeps this is the travel of the sphere center.
    pub distance: f32,
    pub target: TargetId,
}

impl Hit {
    /// True when every component is finite and the normal is usable.
    pub fn is_valid(&self) -> bool {
        is_finite_vec(&self.point)
            && is_finite_vec(&self.normal)
            && self.distance.is_finite()
            && self.normal.norm_squared() > crate::settings::DIST_EPS
    }
}

/// Position, rotation and local scale of a scene object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    #[inline]
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self::new(position, Quat::identity(), Vec3::repeat(1.0))
    }
}

#[inline]
pub fn is_finite_vec(v: &Vec3) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}
