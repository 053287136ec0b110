/*!
Single-stick gesture discrimination for manipulation.

One 2-axis stream plus a press flag is turned into at most one active gesture
per frame:

- Released stick sweeps (`RotateCandidate` → `Rotating`) rotate in discrete
  ticks: the signed angle between consecutive readings accumulates, and once it
  exceeds `rotation_angle_activation` the whole accumulated angle is emitted and
  the accumulator starts over.
- While pressed, `|y|` inside `nudge_zone` nudges and `|x|` inside `scale_zone`
  scales, one step per frame. Both inside at once is ambiguous and fires nothing.
- Rotation owns the stick until it returns to exactly zero.
*/

use serde::{Deserialize, Serialize};

use crate::{
    error::InteractionError,
    input::AdapterCapabilities,
    settings::{
        NUDGE_AMOUNT, NUDGE_MAX_EXTENT, NUDGE_MIN_EXTENT, NUDGE_ZONE_MAX, NUDGE_ZONE_MIN,
        ROTATION_ANGLE_ACTIVATION, ROTATION_ZONE_MAX, ROTATION_ZONE_MIN, SCALE_AMOUNT, SCALE_MAX,
        SCALE_MIN, SCALE_ZONE_MAX, SCALE_ZONE_MIN,
    },
    types::{Vec2, Vec3},
    utils::signed_angle_deg,
};

/// Closed interval over the absolute value of one axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub min: f32,
    pub max: f32,
}

impl Zone {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn contains(&self, value: f32) -> bool {
        let v = value.abs();
        v >= self.min && v <= self.max
    }
}

/// Inclusive bounds a gesture may not push a value across.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    pub min: f32,
    pub max: f32,
}

impl Constraints {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub rotation_zone: Zone,
    /// Degrees of stick sweep per rotation tick.
    pub rotation_angle_activation: f32,
    pub nudge_zone: Zone,
    pub scale_zone: Zone,
    pub nudge_amount: f32,
    pub nudge_constraints: Constraints,
    pub scale_amount: f32,
    pub scale_constraints: Constraints,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            rotation_zone: Zone::new(ROTATION_ZONE_MIN, ROTATION_ZONE_MAX),
            rotation_angle_activation: ROTATION_ANGLE_ACTIVATION,
            nudge_zone: Zone::new(NUDGE_ZONE_MIN, NUDGE_ZONE_MAX),
            scale_zone: Zone::new(SCALE_ZONE_MIN, SCALE_ZONE_MAX),
            nudge_amount: NUDGE_AMOUNT,
            nudge_constraints: Constraints::new(NUDGE_MIN_EXTENT, NUDGE_MAX_EXTENT),
            scale_amount: SCALE_AMOUNT,
            scale_constraints: Constraints::new(SCALE_MIN, SCALE_MAX),
        }
    }
}

impl GestureConfig {
    pub fn validate(&self) -> Result<(), InteractionError> {
        for (name, zone) in [
            ("rotation_zone", self.rotation_zone),
            ("nudge_zone", self.nudge_zone),
            ("scale_zone", self.scale_zone),
        ] {
            if !(zone.min >= 0.0 && zone.min <= zone.max) {
                return Err(InteractionError::InvalidConfig(format!(
                    "{name} must satisfy 0 <= min <= max"
                )));
            }
        }
        if !(self.rotation_angle_activation > 0.0) {
            return Err(InteractionError::InvalidConfig(
                "rotation_angle_activation must be positive".into(),
            ));
        }
        if !(self.nudge_amount > 0.0) {
            return Err(InteractionError::InvalidConfig(
                "nudge_amount must be positive".into(),
            ));
        }
        if !(self.scale_amount > 0.0) || self.scale_amount == 1.0 {
            return Err(InteractionError::InvalidConfig(
                "scale_amount must be positive and not 1".into(),
            ));
        }
        if !(self.nudge_constraints.min > 0.0 && self.nudge_constraints.min < self.nudge_constraints.max) {
            return Err(InteractionError::InvalidConfig(
                "nudge_constraints must satisfy 0 < min < max".into(),
            ));
        }
        if !(self.scale_constraints.min > 0.0 && self.scale_constraints.min < self.scale_constraints.max) {
            return Err(InteractionError::InvalidConfig(
                "scale_constraints must satisfy 0 < min < max".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GestureState {
    #[default]
    Idle,
    RotateCandidate,
    Rotating,
    NudgeOrScaleCandidate,
    Nudging,
    Scaling,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ActiveGesture {
    #[default]
    None,
    Nudge,
    Scale,
    Rotate,
}

/// An incremental change to apply this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureDelta {
    /// Yaw about the vertical axis at the pivot, counter-clockwise positive (degrees).
    Rotate { degrees: f32 },
    /// New pointer extent (meters). Equal to the input when the step was rejected.
    Nudge { extent: f32 },
    /// New local scale. Equal to the input when the step was rejected.
    Scale { scale: Vec3 },
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GestureFrame {
    pub active: ActiveGesture,
    pub delta: Option<GestureDelta>,
}

impl GestureFrame {
    const NONE: Self = Self {
        active: ActiveGesture::None,
        delta: None,
    };
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureInput {
    pub axis: Vec2,
    pub pressed: bool,
}

/// Which gestures a pointer kind may produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GesturePermissions {
    pub rotate: bool,
    pub nudge: bool,
    pub scale: bool,
}

impl Default for GesturePermissions {
    fn default() -> Self {
        Self {
            rotate: true,
            nudge: true,
            scale: true,
        }
    }
}

impl From<AdapterCapabilities> for GesturePermissions {
    fn from(caps: AdapterCapabilities) -> Self {
        Self {
            rotate: caps.rotate,
            nudge: caps.nudge,
            scale: caps.scale,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GestureDiscriminator {
    config: GestureConfig,
    permissions: GesturePermissions,
    state: GestureState,
    last_axis: Vec2,
    accumulated: f32,
}

impl GestureDiscriminator {
    pub fn new(config: GestureConfig, permissions: GesturePermissions) -> Self {
        Self {
            config,
            permissions,
            state: GestureState::Idle,
            last_axis: Vec2::zeros(),
            accumulated: 0.0,
        }
    }

    #[inline]
    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Advance one frame.
    ///
    /// `extent` and `scale` are the current pointer extent and object scale; nudge and
    /// scale deltas are computed from them.
    pub fn update(&mut self, input: GestureInput, extent: f32, scale: Vec3) -> GestureFrame {
        let axis = if input.axis.x.is_finite() && input.axis.y.is_finite() {
            input.axis
        } else {
            Vec2::zeros()
        };
        let previous = self.last_axis;
        self.last_axis = axis;

        if axis.x == 0.0 && axis.y == 0.0 {
            self.enter(GestureState::Idle);
            self.accumulated = 0.0;
            return GestureFrame::NONE;
        }

        let released_press = !input.pressed
            && matches!(
                self.state,
                GestureState::NudgeOrScaleCandidate | GestureState::Nudging | GestureState::Scaling
            );
        if released_press {
            self.enter(GestureState::Idle);
        }

        if matches!(
            self.state,
            GestureState::RotateCandidate | GestureState::Rotating
        ) {
            return self.track_rotation(previous, axis);
        }

        if !input.pressed {
            let zone = self.config.rotation_zone;
            if self.permissions.rotate
                && self.state == GestureState::Idle
                && (zone.contains(axis.x) || zone.contains(axis.y))
            {
                self.enter(GestureState::RotateCandidate);
                self.accumulated = 0.0;
                // The pressed reading belongs to nudge/scale; rotation starts from here.
                let from = if released_press { axis } else { previous };
                return self.track_rotation(from, axis);
            }
            return GestureFrame::NONE;
        }

        let scale_in = self.permissions.scale && self.config.scale_zone.contains(axis.x);
        let nudge_in = self.permissions.nudge && self.config.nudge_zone.contains(axis.y);

        match (scale_in, nudge_in) {
            (true, false) => {
                self.enter(GestureState::Scaling);
                GestureFrame {
                    active: ActiveGesture::Scale,
                    delta: Some(GestureDelta::Scale {
                        scale: self.scale_step(axis.x, scale),
                    }),
                }
            }
            (false, true) => {
                self.enter(GestureState::Nudging);
                GestureFrame {
                    active: ActiveGesture::Nudge,
                    delta: Some(GestureDelta::Nudge {
                        extent: self.nudge_step(axis.y, extent),
                    }),
                }
            }
            // Ambiguous overlap or neither zone: nothing fires.
            _ => {
                self.enter(GestureState::NudgeOrScaleCandidate);
                GestureFrame::NONE
            }
        }
    }

    fn enter(&mut self, state: GestureState) {
        if self.state != state {
            log::debug!("gesture {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    fn track_rotation(&mut self, previous: Vec2, current: Vec2) -> GestureFrame {
        self.accumulated += signed_angle_deg(previous, current);

        if self.accumulated.abs() > self.config.rotation_angle_activation {
            let degrees = self.accumulated;
            self.accumulated = 0.0;
            self.enter(GestureState::Rotating);
            return GestureFrame {
                active: ActiveGesture::Rotate,
                delta: Some(GestureDelta::Rotate { degrees }),
            };
        }

        GestureFrame {
            active: if self.state == GestureState::Rotating {
                ActiveGesture::Rotate
            } else {
                ActiveGesture::None
            },
            delta: None,
        }
    }

    fn nudge_step(&self, y: f32, extent: f32) -> f32 {
        let Constraints { min, max } = self.config.nudge_constraints;
        let step = self.config.nudge_amount * y.signum();
        let next = extent + step;
        if (step < 0.0 && next < min) || (step > 0.0 && next > max) {
            return extent;
        }
        next
    }

    fn scale_step(&self, x: f32, scale: Vec3) -> Vec3 {
        let Constraints { min, max } = self.config.scale_constraints;
        let next = if x < 0.0 {
            scale * self.config.scale_amount
        } else {
            scale / self.config.scale_amount
        };
        let growing = next.norm_squared() > scale.norm_squared();
        let crosses = if growing {
            next.iter().any(|&c| c > max)
        } else {
            next.iter().any(|&c| c < min)
        };
        if crosses || !next.iter().all(|c| c.is_finite()) {
            return scale;
        }
        next
    }
}
