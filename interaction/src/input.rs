//! Tagged input samples, action bindings and the pointer input adapters.

use serde::{Deserialize, Serialize};

use crate::{
    settings::{
        PRESS_THRESHOLD, RELEASE_THRESHOLD, TELEPORT_ARC_GRAVITY, TELEPORT_ARC_STEP_TIME,
        TELEPORT_ARC_STEPS, TELEPORT_ARC_VELOCITY,
    },
    types::{Handedness, Quat, RayStep, SourceId, Vec2, Vec3},
};

/// Symbolic action identifier assigned by the host's input mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputValue {
    Digital(bool),
    Axis1D(f32),
    Axis2D(Vec2),
    Pose { position: Vec3, rotation: Quat },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InputSample {
    pub source: SourceId,
    pub handedness: Handedness,
    pub action: ActionId,
    pub value: InputValue,
}

impl InputSample {
    pub fn new(source: SourceId, handedness: Handedness, action: ActionId, value: InputValue) -> Self {
        Self {
            source,
            handedness,
            action,
            value,
        }
    }
}

/// Which action ids each component reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionBindings {
    /// Pose of the pointing device.
    pub pointer_pose: ActionId,
    /// Press that starts and ends manipulation (digital or trigger).
    pub select: ActionId,
    /// 2-axis stream feeding the gesture discriminator.
    pub manipulate: ActionId,
    /// 2-axis stream feeding the teleport navigator.
    pub navigate: ActionId,
    /// Discrete confirmation for teleports in `ConfirmMode::Digital`.
    pub teleport_confirm: ActionId,
}

impl Default for ActionBindings {
    fn default() -> Self {
        Self {
            pointer_pose: ActionId(0),
            select: ActionId(1),
            manipulate: ActionId(2),
            navigate: ActionId(3),
            teleport_confirm: ActionId(4),
        }
    }
}

/// Turns a 1-axis trigger into a press flag with release hysteresis.
#[derive(Clone, Copy, Debug)]
pub struct TriggerLatch {
    pub press_threshold: f32,
    pub release_threshold: f32,
    pressed: bool,
}

impl Default for TriggerLatch {
    fn default() -> Self {
        Self::new(PRESS_THRESHOLD, RELEASE_THRESHOLD)
    }
}

impl TriggerLatch {
    pub fn new(press_threshold: f32, release_threshold: f32) -> Self {
        Self {
            press_threshold,
            release_threshold: release_threshold.min(press_threshold),
            pressed: false,
        }
    }

    /// Feed one trigger value; returns the new press flag.
    pub fn update(&mut self, value: f32) -> bool {
        if self.pressed {
            if value < self.release_threshold {
                self.pressed = false;
            }
        } else if value >= self.press_threshold {
            self.pressed = true;
        }
        self.pressed
    }
}

/// Behaviour switches that differ between pointer kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdapterCapabilities {
    pub rotate: bool,
    pub nudge: bool,
    pub scale: bool,
    pub manipulation: bool,
    pub teleport: bool,
    /// Interaction requires the select press (hand pinch) to be held.
    pub pinch_gated: bool,
}

/// Parabolic arc parameters for teleport pointers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeleportArc {
    pub velocity: f32,
    pub gravity: f32,
    pub steps: usize,
    pub step_time: f32,
}

impl Default for TeleportArc {
    fn default() -> Self {
        Self {
            velocity: TELEPORT_ARC_VELOCITY,
            gravity: TELEPORT_ARC_GRAVITY,
            steps: TELEPORT_ARC_STEPS,
            step_time: TELEPORT_ARC_STEP_TIME,
        }
    }
}

impl TeleportArc {
    /// Sample the ballistic arc leaving `origin` along `direction`.
    pub fn ray_steps(&self, origin: Vec3, direction: Vec3) -> Vec<RayStep> {
        let steps = self.steps.max(1);
        let velocity = direction * self.velocity;
        let gravity = Vec3::new(0.0, -self.gravity.abs(), 0.0);

        let point = |t: f32| origin + velocity * t + gravity * (0.5 * t * t);

        (0..steps)
            .map(|i| {
                let t0 = i as f32 * self.step_time;
                let t1 = (i + 1) as f32 * self.step_time;
                RayStep::new(point(t0), point(t1))
            })
            .collect()
    }
}

/// How a pointer's pose is turned into ray steps and which capabilities it has.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputAdapter {
    /// Screen-space mouse ray; scroll/stick drive nudge and scale.
    Mouse,
    /// Articulated hand ray; gated by pinch, no stick rotation.
    HandRay,
    /// Controller ray bent into a parabola for teleport targeting.
    Teleport(TeleportArc),
    /// Straight controller ray with full manipulation.
    ControllerRay,
}

impl InputAdapter {
    pub fn capabilities(&self) -> AdapterCapabilities {
        match self {
            InputAdapter::Mouse => AdapterCapabilities {
                rotate: false,
                nudge: true,
                scale: true,
                manipulation: true,
                teleport: false,
                pinch_gated: false,
            },
            InputAdapter::HandRay => AdapterCapabilities {
                rotate: false,
                nudge: false,
                scale: false,
                manipulation: true,
                teleport: false,
                pinch_gated: true,
            },
            InputAdapter::Teleport(_) => AdapterCapabilities {
                rotate: false,
                nudge: false,
                scale: false,
                manipulation: false,
                teleport: true,
                pinch_gated: false,
            },
            InputAdapter::ControllerRay => AdapterCapabilities {
                rotate: true,
                nudge: true,
                scale: true,
                manipulation: true,
                teleport: false,
                pinch_gated: false,
            },
        }
    }

    /// Build the pointer's ray steps from a device pose.
    ///
    /// The pose forward is the rotated `-Z` axis.
    pub fn ray_steps(&self, position: Vec3, rotation: Quat, extent: f32) -> Vec<RayStep> {
        let forward = rotation * Vec3::new(0.0, 0.0, -1.0);
        match self {
            InputAdapter::Teleport(arc) => arc.ray_steps(position, forward),
            _ => vec![RayStep::new(position, position + forward * extent)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_latch_has_release_hysteresis() {
        let mut latch = TriggerLatch::new(0.8, 0.6);
        assert!(!latch.update(0.7));
        assert!(latch.update(0.8));
        // Dropping below press but above release keeps it held.
        assert!(latch.update(0.7));
        assert!(!latch.update(0.59));
    }

    #[test]
    fn teleport_arc_is_continuous_and_falls() {
        let arc = TeleportArc::default();
        let steps = arc.ray_steps(Vec3::new(0.0, 1.5, 0.0), Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(steps.len(), TELEPORT_ARC_STEPS);
        for pair in steps.windows(2) {
            assert!((pair[0].terminus - pair[1].origin).norm() < 1.0e-5);
        }
        let last = steps.last().map(|s| s.terminus.y).unwrap_or(f32::MAX);
        assert!(last < 1.5);
    }

    #[test]
    fn straight_adapters_produce_single_step_of_extent() {
        let steps = InputAdapter::ControllerRay.ray_steps(Vec3::zeros(), Quat::identity(), 4.0);
        assert_eq!(steps.len(), 1);
        assert!((steps[0].length() - 4.0).abs() < 1.0e-5);
        assert!((steps[0].terminus - Vec3::new(0.0, 0.0, -4.0)).norm() < 1.0e-5);
    }

    #[test]
    fn hand_ray_is_pinch_gated_without_stick_gestures() {
        let caps = InputAdapter::HandRay.capabilities();
        assert!(caps.pinch_gated);
        assert!(caps.manipulation);
        assert!(!caps.rotate && !caps.nudge && !caps.scale);
    }
}
