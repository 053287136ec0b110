//! Per-pointer targeting record, refreshed by the host every frame.

use crate::{
    bitmask_flags::{LayerMask, default_raycast_mask},
    error::PointerError,
    input::InputAdapter,
    ports::RaycastPort,
    settings::DEFAULT_POINTER_EXTENT,
    types::{Handedness, PointerId, Quat, Ray, RayStep, SourceId, TargetId, Vec3, is_finite_vec},
};

/// Overrides for whether a pointer may interact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PointerBehavior {
    /// Derived from source presence, tracking and (for pinch-gated adapters) the press.
    #[default]
    Default,
    AlwaysOn,
    AlwaysOff,
}

/// What the pointer currently points at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerResult {
    pub target: Option<TargetId>,
    /// Hit point, or the end of the last ray step on a miss.
    pub point: Vec3,
    pub normal: Vec3,
    /// Distance along the ray steps to `point` (meters).
    pub distance: f32,
    /// Index of the ray step that produced `point`.
    pub ray_step_index: usize,
}

impl Default for PointerResult {
    fn default() -> Self {
        Self {
            target: None,
            point: Vec3::zeros(),
            normal: Vec3::zeros(),
            distance: 0.0,
            ray_step_index: 0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Pointer {
    id: PointerId,
    handedness: Handedness,
    source: Option<SourceId>,
    adapter: InputAdapter,
    pub behavior: PointerBehavior,
    pub layer_mask: LayerMask,
    /// Keep the pointer alive when its source is lost.
    pub persist_on_source_lost: bool,
    extent: f32,
    ray_steps: Vec<RayStep>,
    result: PointerResult,
    is_select_pressed: bool,
    is_holding: bool,
    is_tracked: bool,
}

impl Pointer {
    pub fn new(id: PointerId, handedness: Handedness, adapter: InputAdapter) -> Self {
        let extent = DEFAULT_POINTER_EXTENT;
        Self {
            id,
            handedness,
            source: None,
            adapter,
            behavior: PointerBehavior::Default,
            layer_mask: default_raycast_mask(),
            persist_on_source_lost: false,
            extent,
            ray_steps: vec![RayStep::new(Vec3::zeros(), Vec3::new(0.0, 0.0, -extent))],
            result: PointerResult::default(),
            is_select_pressed: false,
            is_holding: false,
            is_tracked: false,
        }
    }

    pub fn with_source(mut self, source: SourceId) -> Self {
        self.source = Some(source);
        self
    }

    #[inline]
    pub fn id(&self) -> PointerId {
        self.id
    }

    #[inline]
    pub fn handedness(&self) -> Handedness {
        self.handedness
    }

    #[inline]
    pub fn source(&self) -> Option<SourceId> {
        self.source
    }

    #[inline]
    pub fn adapter(&self) -> InputAdapter {
        self.adapter
    }

    #[inline]
    pub fn extent(&self) -> f32 {
        self.extent
    }

    /// Set the pointer length. Non-positive or non-finite values are rejected.
    pub fn set_extent(&mut self, extent: f32) -> Result<(), PointerError> {
        if !extent.is_finite() || extent <= 0.0 {
            log::warn!("pointer {:?}: rejected extent {}", self.id, extent);
            return Err(PointerError::InvalidExtent(extent));
        }
        self.extent = extent;

        // Straight rays follow the extent; curved rays keep their own shape.
        if self.ray_steps.len() == 1 && !matches!(self.adapter, InputAdapter::Teleport(_)) {
            if let Some(ray) = self.ray_steps[0].ray() {
                self.ray_steps[0] = RayStep::new(ray.origin, ray.point_at(extent));
            }
        }
        Ok(())
    }

    /// Point a straight ray from `origin` along `direction`, `extent` long.
    pub fn set_ray(&mut self, origin: Vec3, direction: Vec3) -> Result<(), PointerError> {
        let ray = Ray::new(origin, direction).ok_or(PointerError::DegenerateDirection)?;
        self.ray_steps = vec![RayStep::new(ray.origin, ray.point_at(self.extent))];
        Ok(())
    }

    pub fn set_ray_steps(&mut self, steps: Vec<RayStep>) -> Result<(), PointerError> {
        if steps.is_empty() {
            return Err(PointerError::NoRaySteps);
        }
        if steps
            .iter()
            .any(|s| !is_finite_vec(&s.origin) || !is_finite_vec(&s.terminus))
        {
            return Err(PointerError::DegenerateDirection);
        }
        self.ray_steps = steps;
        Ok(())
    }

    /// Rebuild the ray steps from a device pose through this pointer's adapter.
    pub fn apply_pose(&mut self, position: Vec3, rotation: Quat) -> Result<(), PointerError> {
        let steps = self.adapter.ray_steps(position, rotation, self.extent);
        self.set_ray_steps(steps)?;
        self.is_tracked = true;
        Ok(())
    }

    pub fn ray_steps(&self) -> &[RayStep] {
        &self.ray_steps
    }

    /// The first ray step as a ray; the one manipulation follows.
    pub fn ray(&self) -> Option<Ray> {
        self.ray_steps.first().and_then(RayStep::ray)
    }

    #[inline]
    pub fn result(&self) -> &PointerResult {
        &self.result
    }

    pub(crate) fn set_result(&mut self, result: PointerResult) {
        self.result = result;
    }

    /// Cast every ray step in order; the first hit wins.
    pub fn update_result(&mut self, raycast: &dyn RaycastPort) {
        let mut travelled = 0.0;
        let last_index = self.ray_steps.len().saturating_sub(1);

        for (index, step) in self.ray_steps.iter().enumerate() {
            let length = step.length();
            let Some(ray) = step.ray() else {
                continue;
            };
            if let Some(hit) = raycast.raycast(&ray, length, self.layer_mask) {
                if hit.is_valid() {
                    self.result = PointerResult {
                        target: Some(hit.target),
                        point: hit.point,
                        normal: hit.normal,
                        distance: travelled + hit.distance,
                        ray_step_index: index,
                    };
                    return;
                }
            }
            travelled += length;
        }

        let end = self
            .ray_steps
            .last()
            .map(|s| s.terminus)
            .unwrap_or_else(Vec3::zeros);
        self.result = PointerResult {
            target: None,
            point: end,
            normal: Vec3::zeros(),
            distance: travelled,
            ray_step_index: last_index,
        };
    }

    pub fn set_select_pressed(&mut self, pressed: bool) {
        self.is_select_pressed = pressed;
    }

    #[inline]
    pub fn is_select_pressed(&self) -> bool {
        self.is_select_pressed
    }

    pub(crate) fn set_holding(&mut self, holding: bool) {
        self.is_holding = holding;
    }

    pub fn is_interaction_enabled(&self) -> bool {
        match self.behavior {
            PointerBehavior::AlwaysOn => true,
            PointerBehavior::AlwaysOff => false,
            PointerBehavior::Default => {
                let gated = self.adapter.capabilities().pinch_gated;
                self.source.is_some()
                    && self.is_tracked
                    && (!gated || self.is_select_pressed || self.is_holding)
            }
        }
    }

    /// Detach from the source. Returns true if the pointer should be kept.
    pub fn on_source_lost(&mut self) -> bool {
        self.source = None;
        self.is_tracked = false;
        self.is_select_pressed = false;
        self.result = PointerResult::default();
        self.persist_on_source_lost
    }

    pub fn on_source_detected(&mut self, source: SourceId) {
        self.source = Some(source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Block, FlatFloor};

    fn controller() -> Pointer {
        Pointer::new(PointerId(1), Handedness::Right, InputAdapter::ControllerRay)
            .with_source(SourceId(7))
    }

    #[test]
    fn extent_stays_positive_after_any_setter_sequence() {
        let mut p = controller();
        let inputs = [3.0, 0.0, -1.0, f32::NAN, 0.5, f32::INFINITY, -0.0, 2.0, -100.0];
        for v in inputs {
            let _ = p.set_extent(v);
            assert!(p.extent() > 0.0);
        }
        assert_eq!(p.extent(), 2.0);
    }

    #[test]
    fn rejected_extent_keeps_previous_value() {
        let mut p = controller();
        p.set_extent(4.0).unwrap();
        assert_eq!(p.set_extent(0.0), Err(PointerError::InvalidExtent(0.0)));
        assert_eq!(p.extent(), 4.0);
    }

    #[test]
    fn straight_ray_tracks_extent() {
        let mut p = controller();
        p.set_ray(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, -2.0))
            .unwrap();
        p.set_extent(3.0).unwrap();
        let step = p.ray_steps()[0];
        assert!((step.terminus - Vec3::new(0.0, 1.0, -3.0)).norm() < 1.0e-5);
    }

    #[test]
    fn degenerate_direction_is_rejected() {
        let mut p = controller();
        let before = p.ray_steps().to_vec();
        assert_eq!(
            p.set_ray(Vec3::zeros(), Vec3::zeros()),
            Err(PointerError::DegenerateDirection)
        );
        assert_eq!(p.ray_steps(), &before[..]);
    }

    #[test]
    fn result_reports_hit_and_step_index() {
        let floor = FlatFloor::new(0.0, TargetId(100));
        let mut p = controller();
        p.set_ray_steps(vec![
            RayStep::new(Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, 2.0, -1.0)),
            RayStep::new(Vec3::new(0.0, 2.0, -1.0), Vec3::new(0.0, -2.0, -1.0)),
        ])
        .unwrap();
        p.update_result(&floor);

        let r = p.result();
        assert_eq!(r.target, Some(TargetId(100)));
        assert_eq!(r.ray_step_index, 1);
        assert!((r.point - Vec3::new(0.0, 0.0, -1.0)).norm() < 1.0e-5);
        assert!((r.distance - 3.0).abs() < 1.0e-5);
    }

    #[test]
    fn miss_reports_end_of_ray() {
        let floor = FlatFloor::new(-10.0, TargetId(100));
        let mut p = controller();
        p.set_ray(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, -1.0))
            .unwrap();
        p.update_result(&floor);
        assert_eq!(p.result().target, None);
        assert!((p.result().distance - p.extent()).abs() < 1.0e-5);
    }

    #[test]
    fn nearest_block_wins_over_floor() {
        let floor = FlatFloor::new(0.0, TargetId(100)).with_block(Block::cube(
            TargetId(5),
            Vec3::new(0.0, 0.5, -3.0),
            0.5,
        ));
        let mut p = controller();
        p.set_ray(Vec3::new(0.0, 0.5, 0.0), Vec3::new(0.0, 0.0, -1.0))
            .unwrap();
        p.update_result(&floor);
        assert_eq!(p.result().target, Some(TargetId(5)));
        assert!((p.result().distance - 2.5).abs() < 1.0e-5);
    }

    #[test]
    fn interaction_enabled_follows_behavior_and_gating() {
        let mut p = controller();
        assert!(!p.is_interaction_enabled());
        p.apply_pose(Vec3::zeros(), Quat::identity()).unwrap();
        assert!(p.is_interaction_enabled());
        p.behavior = PointerBehavior::AlwaysOff;
        assert!(!p.is_interaction_enabled());

        let mut hand = Pointer::new(PointerId(2), Handedness::Left, InputAdapter::HandRay)
            .with_source(SourceId(3));
        hand.apply_pose(Vec3::zeros(), Quat::identity()).unwrap();
        assert!(!hand.is_interaction_enabled());
        hand.set_select_pressed(true);
        assert!(hand.is_interaction_enabled());
    }

    #[test]
    fn source_loss_respects_persistence() {
        let mut p = controller();
        assert!(!p.on_source_lost());
        assert_eq!(p.source(), None);

        let mut kept = controller();
        kept.persist_on_source_lost = true;
        assert!(kept.on_source_lost());
    }
}
