/*!
Surface snapping for held objects.

Each frame the proposed move is swept from the current position. A near,
upward-facing surface captures the object (`Snapped`): from then on its height
is pinned to the surface plus half the object's bounding height. Letting go
uses a different, larger threshold (`unsnap_tolerance`) than capture
(`snap_distance`), and a downward probe must keep seeing the same surface.

Failed or degenerate queries reject the move; the caller keeps the last valid
position.
*/

use serde::{Deserialize, Serialize};

use crate::{
    bitmask_flags::{LayerMask, default_raycast_mask},
    error::InteractionError,
    ports::{RaycastPort, SweepQuery},
    settings::{
        DEFAULT_SKIN, DIST_EPS, SNAP_DISTANCE, SNAP_PROBE_DISTANCE, SNAP_SURFACE_ANGLE,
        SWEEP_RADIUS, UNSNAP_TOLERANCE,
    },
    types::{TargetId, Vec3, is_finite_vec},
};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    /// Sweep hit distance at or under which a surface captures the object (meters).
    pub snap_distance: f32,
    /// Move distance at or beyond which a snapped object is released (meters).
    pub unsnap_tolerance: f32,
    /// Maximum tilt of a capturing surface from world-up (degrees).
    pub surface_angle: f32,
    /// Reach of the per-frame downward probe below the object's bottom (meters).
    pub probe_distance: f32,
    /// Gap kept from obstructions that do not capture (meters).
    pub skin: f32,
    pub layer_mask: LayerMask,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            snap_distance: SNAP_DISTANCE,
            unsnap_tolerance: UNSNAP_TOLERANCE,
            surface_angle: SNAP_SURFACE_ANGLE,
            probe_distance: SNAP_PROBE_DISTANCE,
            skin: DEFAULT_SKIN,
            layer_mask: default_raycast_mask(),
        }
    }
}

impl SnapConfig {
    pub fn validate(&self) -> Result<(), InteractionError> {
        if !(self.snap_distance >= 0.0) {
            return Err(InteractionError::InvalidConfig(
                "snap_distance must be non-negative".into(),
            ));
        }
        if !(self.unsnap_tolerance > self.snap_distance) {
            return Err(InteractionError::InvalidConfig(
                "unsnap_tolerance must exceed snap_distance".into(),
            ));
        }
        if !(0.0..90.0).contains(&self.surface_angle) {
            return Err(InteractionError::InvalidConfig(
                "surface_angle must be in [0, 90)".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum SnapState {
    #[default]
    Idle,
    Snapped {
        surface: TargetId,
        /// Height every accepted position is pinned to.
        vertical_position: f32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnapRequest {
    /// The object being moved; excluded from the sweep.
    pub target: TargetId,
    pub current: Vec3,
    pub proposed: Vec3,
    /// Half of the object's bounding height (meters).
    pub half_height: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapTransition {
    None,
    Snapped(TargetId),
    Unsnapped,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SnapOutcome {
    Accepted {
        position: Vec3,
        transition: SnapTransition,
    },
    /// Hold the last valid position this frame.
    Rejected,
}

#[derive(Clone, Debug, Default)]
pub struct SnapEngine {
    config: SnapConfig,
    state: SnapState,
}

impl SnapEngine {
    pub fn new(config: SnapConfig) -> Self {
        Self {
            config,
            state: SnapState::Idle,
        }
    }

    #[inline]
    pub fn state(&self) -> SnapState {
        self.state
    }

    #[inline]
    pub fn is_snapped(&self) -> bool {
        matches!(self.state, SnapState::Snapped { .. })
    }

    pub fn evaluate(&mut self, req: SnapRequest, raycast: &dyn RaycastPort) -> SnapOutcome {
        if !is_finite_vec(&req.current) || !is_finite_vec(&req.proposed) || !req.half_height.is_finite()
        {
            return SnapOutcome::Rejected;
        }
        let half_height = req.half_height.max(0.0);

        match self.state {
            SnapState::Snapped {
                surface,
                vertical_position,
            } => self.evaluate_snapped(req, half_height, surface, vertical_position, raycast),
            SnapState::Idle => self.evaluate_idle(req, half_height, raycast),
        }
    }

    fn evaluate_snapped(
        &mut self,
        req: SnapRequest,
        half_height: f32,
        surface: TargetId,
        vertical_position: f32,
        raycast: &dyn RaycastPort,
    ) -> SnapOutcome {
        let distance = (req.proposed - req.current).norm();
        if distance >= self.config.unsnap_tolerance {
            return self.unsnap(req.proposed, "moved past unsnap tolerance");
        }

        let pinned = Vec3::new(req.proposed.x, vertical_position, req.proposed.z);
        // Thin sweep so the probe never reports the held object itself.
        let probe = SweepQuery {
            origin: pinned,
            direction: Vec3::new(0.0, -1.0, 0.0),
            max_distance: half_height + self.config.probe_distance,
            radius: SWEEP_RADIUS,
            layer_mask: self.config.layer_mask,
            ignore: Some(req.target),
        };

        match raycast.sweep(&probe) {
            Ok(Some(hit)) if hit.is_valid() && hit.target == surface => SnapOutcome::Accepted {
                position: pinned,
                transition: SnapTransition::None,
            },
            Ok(_) => self.unsnap(req.proposed, "surface lost beneath"),
            Err(err) => {
                log::debug!("snap probe failed: {err}");
                SnapOutcome::Rejected
            }
        }
    }

    fn evaluate_idle(
        &mut self,
        req: SnapRequest,
        half_height: f32,
        raycast: &dyn RaycastPort,
    ) -> SnapOutcome {
        let delta = req.proposed - req.current;
        let distance = delta.norm();
        if distance <= DIST_EPS {
            return SnapOutcome::Accepted {
                position: req.proposed,
                transition: SnapTransition::None,
            };
        }
        let direction = delta / distance;

        let query = SweepQuery {
            origin: req.current,
            direction,
            max_distance: distance,
            radius: half_height.max(SWEEP_RADIUS),
            layer_mask: self.config.layer_mask,
            ignore: Some(req.target),
        };

        let hit = match raycast.sweep(&query) {
            Ok(Some(hit)) => hit,
            Ok(None) => {
                return SnapOutcome::Accepted {
                    position: req.proposed,
                    transition: SnapTransition::None,
                };
            }
            Err(err) => {
                log::debug!("snap sweep failed: {err}");
                return SnapOutcome::Rejected;
            }
        };
        if !hit.is_valid() {
            return SnapOutcome::Rejected;
        }

        if hit.distance <= self.config.snap_distance && self.is_floor(hit.normal) {
            let vertical_position = hit.point.y + half_height;
            self.state = SnapState::Snapped {
                surface: hit.target,
                vertical_position,
            };
            log::debug!("snapped onto {:?} at y={vertical_position}", hit.target);
            return SnapOutcome::Accepted {
                position: Vec3::new(req.proposed.x, vertical_position, req.proposed.z),
                transition: SnapTransition::Snapped(hit.target),
            };
        }

        // Obstructed but not capturing: stop short of the contact.
        let travel = (hit.distance - self.config.skin).clamp(0.0, distance);
        SnapOutcome::Accepted {
            position: req.current + direction * travel,
            transition: SnapTransition::None,
        }
    }

    fn unsnap(&mut self, position: Vec3, reason: &str) -> SnapOutcome {
        log::debug!("unsnapped: {reason}");
        self.state = SnapState::Idle;
        SnapOutcome::Accepted {
            position,
            transition: SnapTransition::Unsnapped,
        }
    }

    fn is_floor(&self, normal: Vec3) -> bool {
        let len = normal.norm();
        if len <= DIST_EPS {
            return false;
        }
        let cos = (normal.y / len).clamp(-1.0, 1.0);
        cos >= self.config.surface_angle.to_radians().cos()
    }
}
