//! Pins a pointer's hit result to a fixed object and grab point.
//!
//! The lock is stored in the target's local frame, so the pinned point follows the
//! object while it is being moved. Whether the lock still holds is checked on every
//! query: an inactive or destroyed target releases it.

use std::collections::HashMap;

use crate::{
    pointer::{Pointer, PointerResult},
    ports::SceneTransformPort,
    types::{PointerId, TargetId, Vec3},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FocusLock {
    pub target: TargetId,
    /// Grab point relative to the target's position, rotation and scale.
    local_point: Vec3,
    normal: Vec3,
}

impl FocusLock {
    /// World-space grab point for the target's current transform.
    pub fn world_point(&self, scene: &dyn SceneTransformPort) -> Option<Vec3> {
        let transform = scene.transform(self.target)?;
        Some(transform.position + transform.rotation * self.local_point.component_mul(&transform.scale))
    }
}

#[derive(Debug, Default)]
pub struct FocusLockController {
    locks: HashMap<PointerId, FocusLock>,
}

impl FocusLockController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock `pointer` onto `target` at world-space `point`.
    ///
    /// Fails without side effects unless the pointer currently hits `target`.
    pub fn try_lock(
        &mut self,
        pointer: &Pointer,
        target: TargetId,
        point: Vec3,
        scene: &dyn SceneTransformPort,
    ) -> bool {
        if pointer.result().target != Some(target) {
            return false;
        }
        let Some(transform) = scene.transform(target) else {
            return false;
        };

        let inv_scale = transform.scale.map(|s| if s.abs() > f32::EPSILON { 1.0 / s } else { 0.0 });
        let local_point = (transform.rotation.inverse() * (point - transform.position))
            .component_mul(&inv_scale);

        self.locks.insert(
            pointer.id(),
            FocusLock {
                target,
                local_point,
                normal: pointer.result().normal,
            },
        );
        log::debug!("pointer {:?} locked on {:?}", pointer.id(), target);
        true
    }

    pub fn unlock(&mut self, pointer: PointerId) {
        if self.locks.remove(&pointer).is_some() {
            log::debug!("pointer {:?} unlocked", pointer);
        }
    }

    /// Whether `pointer` holds a lock on a still-active target.
    pub fn is_locked(&mut self, pointer: PointerId, scene: &dyn SceneTransformPort) -> bool {
        self.lock(pointer, scene).is_some()
    }

    /// The live lock for `pointer`, dropping it first if its target went inactive.
    pub fn lock(&mut self, pointer: PointerId, scene: &dyn SceneTransformPort) -> Option<FocusLock> {
        let lock = *self.locks.get(&pointer)?;
        if !scene.is_active(lock.target) {
            log::debug!(
                "pointer {:?} lost lock: {:?} is inactive",
                pointer,
                lock.target
            );
            self.locks.remove(&pointer);
            return None;
        }
        Some(lock)
    }

    /// Overwrite the pointer's result with its locked point, if any.
    pub fn resolve(&mut self, pointer: &mut Pointer, scene: &dyn SceneTransformPort) {
        let Some(lock) = self.lock(pointer.id(), scene) else {
            return;
        };
        let Some(point) = lock.world_point(scene) else {
            return;
        };
        let distance = pointer
            .ray()
            .map(|ray| (point - ray.origin).norm())
            .unwrap_or(pointer.result().distance);

        pointer.set_result(PointerResult {
            target: Some(lock.target),
            point,
            normal: lock.normal,
            distance,
            ray_step_index: 0,
        });
    }
}
