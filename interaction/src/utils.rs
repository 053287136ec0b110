use crate::types::{Quat, Vec2, Vec3, is_finite_vec};

/// Signed angle (degrees) from `from` to `to`, counter-clockwise positive.
///
/// Either vector being zero yields 0.
#[inline]
pub fn signed_angle_deg(from: Vec2, to: Vec2) -> f32 {
    let cross = from.x * to.y - from.y * to.x;
    let dot = from.dot(&to);
    cross.atan2(dot).to_degrees()
}

/// Wrap an angle in degrees into [-180, 180].
#[inline]
pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = (angle + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid maps +180 onto -180; keep the sign of the input for the back direction.
    if wrapped == -180.0 && angle > 0.0 {
        180.0
    } else {
        wrapped
    }
}

/// Exponential approach of `current` toward `target`.
///
/// `t = dt * rate` is clamped to [0, 1] so large frames never overshoot.
#[inline]
pub fn smooth_toward(current: Vec3, target: Vec3, dt: f32, rate: f32) -> Vec3 {
    let t = (dt * rate).clamp(0.0, 1.0);
    current + (target - current) * t
}

/// Yaw-only rotation about world +Y.
#[inline]
pub fn yaw(degrees: f32) -> Quat {
    Quat::from_axis_angle(&Vec3::y_axis(), degrees.to_radians())
}

/// Rotate `point` about a vertical axis through `pivot`.
#[inline]
pub fn rotate_about(point: Vec3, pivot: Vec3, rotation: Quat) -> Vec3 {
    pivot + rotation * (point - pivot)
}

/// Planar (XZ) unit forward of `rotation`, or `None` if it looks straight up or down.
pub fn planar_forward(rotation: Quat) -> Option<Vec3> {
    let forward = rotation * Vec3::new(0.0, 0.0, -1.0);
    let planar = Vec3::new(forward.x, 0.0, forward.z);
    let len = planar.norm();
    if len <= 1.0e-4 || !is_finite_vec(&planar) {
        return None;
    }
    Some(planar / len)
}
