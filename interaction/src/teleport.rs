/*!
Joystick-driven teleport navigation.

The stick direction is read as an angle (`atan2(x, y)` in degrees, forward =
0, right = +90) and classified into one of four zones:

- `Teleport`: the forward cone. Arms a teleport request; the teleport itself
  only happens on confirmation.
- `Rotate`: a band centered on either side. One discrete turn of
  `rotation_amount`.
- `Strafe`: a band centered on the back. One step back of `strafe_amount`.
- `None`: everything in between.

Every discrete action disarms the navigator until the stick returns under
`input_threshold`, so a held deflection fires once.
*/

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::InteractionError,
    ports::{SceneTransformPort, ValidationPort},
    settings::{
        BACK_STRAFE_ACTIVATION_ANGLE, ROTATE_ACTIVATION_ANGLE, ROTATION_AMOUNT, STRAFE_AMOUNT,
        TELEPORT_ACTIVATION_ANGLE, TELEPORT_INPUT_THRESHOLD, TELEPORT_UP_ANGLE,
    },
    types::{Hit, PointerId, TargetId, Vec2, Vec3},
    utils::{planar_forward, rotate_about, wrap_degrees, yaw},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TeleportValidation {
    /// No hit target this frame.
    #[default]
    Unknown,
    Valid,
    Invalid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavigationZone {
    Teleport,
    Rotate,
    Strafe,
    None,
}

/// What completes a requested teleport.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmMode {
    /// Returning the stick to neutral commits or cancels.
    #[default]
    StickRelease,
    /// Releasing the bound confirm button (or trigger) commits or cancels.
    Digital,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeleportConfig {
    /// Stick magnitude under which the stick is neutral.
    pub input_threshold: f32,
    /// Half-width of the forward teleport cone (degrees).
    pub teleport_activation_angle: f32,
    /// Width of the side rotate bands (degrees).
    pub rotate_activation_angle: f32,
    /// Width of the back strafe band (degrees).
    pub back_strafe_activation_angle: f32,
    pub rotation_amount: f32,
    pub strafe_amount: f32,
    /// Added to the raw stick angle so that "push forward" reads as zero.
    pub angle_offset: f32,
    pub confirm_mode: ConfirmMode,
    pub can_rotate: bool,
    pub can_strafe: bool,
}

impl Default for TeleportConfig {
    fn default() -> Self {
        Self {
            input_threshold: TELEPORT_INPUT_THRESHOLD,
            teleport_activation_angle: TELEPORT_ACTIVATION_ANGLE,
            rotate_activation_angle: ROTATE_ACTIVATION_ANGLE,
            back_strafe_activation_angle: BACK_STRAFE_ACTIVATION_ANGLE,
            rotation_amount: ROTATION_AMOUNT,
            strafe_amount: STRAFE_AMOUNT,
            angle_offset: 0.0,
            confirm_mode: ConfirmMode::StickRelease,
            can_rotate: true,
            can_strafe: true,
        }
    }
}

impl TeleportConfig {
    /// Thresholds must leave the zones disjoint.
    pub fn validate(&self) -> Result<(), InteractionError> {
        let rotate_half = self.rotate_activation_angle * 0.5;
        let strafe_half = self.back_strafe_activation_angle * 0.5;
        if !(self.input_threshold > 0.0 && self.input_threshold <= 1.0) {
            return Err(InteractionError::InvalidConfig(
                "input_threshold must be in (0, 1]".into(),
            ));
        }
        if !(self.teleport_activation_angle >= 0.0
            && self.rotate_activation_angle >= 0.0
            && self.back_strafe_activation_angle >= 0.0)
        {
            return Err(InteractionError::InvalidConfig(
                "activation angles must be non-negative".into(),
            ));
        }
        if self.teleport_activation_angle > 90.0 - rotate_half
            || 90.0 + rotate_half > 180.0 - strafe_half
        {
            return Err(InteractionError::InvalidConfig(
                "teleport, rotate and strafe zones overlap".into(),
            ));
        }
        Ok(())
    }

    pub fn in_teleport_zone(&self, angle: f32) -> bool {
        angle.abs() < self.teleport_activation_angle
    }

    pub fn in_rotate_zone(&self, angle: f32) -> bool {
        let folded = angle.abs();
        let half = self.rotate_activation_angle * 0.5;
        90.0 - half < folded && folded < 90.0 + half
    }

    pub fn in_strafe_zone(&self, angle: f32) -> bool {
        angle.abs() > 180.0 - self.back_strafe_activation_angle * 0.5
    }

    /// Classify an angle in [-180, 180], first match wins.
    pub fn classify(&self, angle: f32) -> NavigationZone {
        if self.in_teleport_zone(angle) {
            NavigationZone::Teleport
        } else if self.in_rotate_zone(angle) {
            NavigationZone::Rotate
        } else if self.in_strafe_zone(angle) {
            NavigationZone::Strafe
        } else {
            NavigationZone::None
        }
    }

    /// Stick angle in degrees: forward 0, right +90, back ±180.
    pub fn stick_angle(&self, axis: Vec2) -> f32 {
        wrap_degrees(axis.x.atan2(axis.y).to_degrees() + self.angle_offset)
    }
}

/// A designated destination that overrides the landing spot and, optionally, facing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hotspot {
    pub target: TargetId,
    pub position: Vec3,
    pub override_orientation: bool,
    /// Facing applied to the rig when `override_orientation` is set (degrees about +Y).
    pub yaw_degrees: f32,
    pub is_active: bool,
}

/// The objects a teleport moves: the rig root and the tracked head under it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerRig {
    pub body: TargetId,
    pub head: TargetId,
}

/// Identity of the locomotion provider that requested a teleport target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProviderId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TeleportSession {
    pub provider: ProviderId,
    pub pointer: PointerId,
    pub validation: TeleportValidation,
    pub destination: Option<Hit>,
    pub hotspot: Option<Hotspot>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TeleportEvent {
    Requested { provider: ProviderId },
    Started { destination: Vec3 },
    Completed { destination: Vec3 },
    Canceled { provider: ProviderId },
    /// Turned in place; positive turns right (clockwise seen from above).
    Rotated { degrees: f32 },
    Strafed { offset: Vec3 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TeleportInput<'a> {
    pub axis: Vec2,
    /// Digital confirm state if a sample arrived this frame.
    pub confirm: Option<bool>,
    /// The pointer's current hit.
    pub hit: Option<&'a Hit>,
}

#[derive(Clone, Debug)]
pub struct TeleportNavigator {
    config: TeleportConfig,
    pointer: PointerId,
    provider: Option<ProviderId>,
    rig: Option<PlayerRig>,
    armed: bool,
    confirm_pressed: bool,
    session: Option<TeleportSession>,
    hotspots: HashMap<TargetId, Hotspot>,
}

impl TeleportNavigator {
    pub fn new(config: TeleportConfig, pointer: PointerId) -> Self {
        Self {
            config,
            pointer,
            provider: None,
            rig: None,
            armed: true,
            confirm_pressed: false,
            session: None,
            hotspots: HashMap::new(),
        }
    }

    pub fn config(&self) -> &TeleportConfig {
        &self.config
    }

    pub fn set_provider(&mut self, provider: Option<ProviderId>) {
        self.provider = provider;
    }

    pub fn set_rig(&mut self, rig: Option<PlayerRig>) {
        self.rig = rig;
    }

    pub fn add_hotspot(&mut self, hotspot: Hotspot) {
        self.hotspots.insert(hotspot.target, hotspot);
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn session(&self) -> Option<&TeleportSession> {
        self.session.as_ref()
    }

    pub fn validation(&self) -> TeleportValidation {
        self.session
            .map(|s| s.validation)
            .unwrap_or(TeleportValidation::Unknown)
    }

    /// Drop any pending request.
    pub fn cancel(&mut self) -> Option<TeleportEvent> {
        let session = self.session.take()?;
        log::debug!("teleport canceled for {:?}", session.provider);
        Some(TeleportEvent::Canceled {
            provider: session.provider,
        })
    }

    pub fn update(
        &mut self,
        input: TeleportInput<'_>,
        validation: Option<&dyn ValidationPort>,
        scene: &mut dyn SceneTransformPort,
    ) -> Vec<TeleportEvent> {
        let mut events = Vec::new();
        self.refresh_validation(input.hit, validation);

        if self.config.confirm_mode == ConfirmMode::Digital {
            if let Some(pressed) = input.confirm {
                let released = self.confirm_pressed && !pressed;
                self.confirm_pressed = pressed;
                if released {
                    self.finish(scene, &mut events);
                }
            }
        }

        let axis = if input.axis.x.is_finite() && input.axis.y.is_finite() {
            input.axis
        } else {
            Vec2::zeros()
        };

        if axis.norm() < self.config.input_threshold {
            if !self.armed {
                log::debug!("teleport navigator re-armed");
            }
            self.armed = true;
            if self.config.confirm_mode == ConfirmMode::StickRelease {
                self.finish(scene, &mut events);
            }
            return events;
        }

        if !self.armed || self.session.is_some() {
            return events;
        }

        let angle = self.config.stick_angle(axis);
        match self.config.classify(angle) {
            NavigationZone::Teleport => {
                let Some(provider) = self.provider else {
                    return events;
                };
                self.session = Some(TeleportSession {
                    provider,
                    pointer: self.pointer,
                    validation: TeleportValidation::Unknown,
                    destination: None,
                    hotspot: None,
                });
                self.armed = false;
                self.refresh_validation(input.hit, validation);
                log::debug!("teleport requested by {:?}", provider);
                events.push(TeleportEvent::Requested { provider });
            }
            NavigationZone::Rotate if self.config.can_rotate => {
                let degrees = self.config.rotation_amount.abs() * angle.signum();
                self.armed = false;
                if self.rotate_in_place(degrees, scene) {
                    events.push(TeleportEvent::Rotated { degrees });
                }
            }
            NavigationZone::Strafe if self.config.can_strafe => {
                self.armed = false;
                if let Some(offset) = self.strafe_back(scene) {
                    events.push(TeleportEvent::Strafed { offset });
                }
            }
            _ => {}
        }
        events
    }

    fn refresh_validation(&mut self, hit: Option<&Hit>, validation: Option<&dyn ValidationPort>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let hotspot = hit
            .and_then(|h| self.hotspots.get(&h.target))
            .filter(|h| h.is_active)
            .copied();

        session.destination = hit.copied();
        session.hotspot = hotspot;
        session.validation = match (hit, validation) {
            (Some(hit), Some(port)) if hit.is_valid() => port.validate(hit, hotspot.as_ref()),
            _ => TeleportValidation::Unknown,
        };
    }

    fn finish(&mut self, scene: &mut dyn SceneTransformPort, events: &mut Vec<TeleportEvent>) {
        let Some(session) = self.session.take() else {
            return;
        };

        let committed = session.validation == TeleportValidation::Valid
            && session
                .destination
                .is_some_and(|hit| self.teleport(&hit, session.hotspot, scene, events));

        if !committed {
            log::debug!("teleport canceled ({:?})", session.validation);
            events.push(TeleportEvent::Canceled {
                provider: session.provider,
            });
        }
    }

    fn teleport(
        &self,
        hit: &Hit,
        hotspot: Option<Hotspot>,
        scene: &mut dyn SceneTransformPort,
        events: &mut Vec<TeleportEvent>,
    ) -> bool {
        let Some(rig) = self.rig else {
            log::warn!("teleport requested without a player rig");
            return false;
        };
        let (Some(body), Some(head), Some(rotation)) = (
            scene.position(rig.body),
            scene.position(rig.head),
            scene.rotation(rig.body),
        ) else {
            return false;
        };

        let destination = hotspot.map(|h| h.position).unwrap_or(hit.point);
        events.push(TeleportEvent::Started { destination });

        // Land with the head, not the rig origin, above the destination.
        let mut head_offset = Vec3::new(head.x - body.x, 0.0, head.z - body.z);
        if let Some(h) = hotspot.filter(|h| h.override_orientation) {
            let target_rotation = yaw(h.yaw_degrees);
            head_offset = target_rotation * (rotation.inverse() * head_offset);
            head_offset.y = 0.0;
            scene.set_rotation(rig.body, target_rotation);
        }
        scene.set_position(
            rig.body,
            Vec3::new(
                destination.x - head_offset.x,
                destination.y,
                destination.z - head_offset.z,
            ),
        );

        log::debug!("teleported to {destination:?}");
        events.push(TeleportEvent::Completed { destination });
        true
    }

    fn rotate_in_place(&self, degrees: f32, scene: &mut dyn SceneTransformPort) -> bool {
        let Some(rig) = self.rig else {
            return false;
        };
        let (Some(body), Some(head), Some(rotation)) = (
            scene.position(rig.body),
            scene.position(rig.head),
            scene.rotation(rig.body),
        ) else {
            return false;
        };

        // Right turns are clockwise from above, i.e. negative about +Y.
        let turn = yaw(-degrees);
        let pivot = Vec3::new(head.x, body.y, head.z);
        scene.set_position(rig.body, rotate_about(body, pivot, turn));
        scene.set_rotation(rig.body, turn * rotation);
        true
    }

    fn strafe_back(&self, scene: &mut dyn SceneTransformPort) -> Option<Vec3> {
        let rig = self.rig?;
        let body = scene.position(rig.body)?;
        let forward = planar_forward(scene.rotation(rig.head)?)?;
        let offset = -forward * self.config.strafe_amount;
        scene.set_position(rig.body, body + offset);
        Some(offset)
    }
}

/// Default validation: upward-facing surfaces are valid, listed targets are not.
#[derive(Clone, Debug)]
pub struct SurfaceValidator {
    /// Maximum angle between the hit normal and world-up (degrees).
    pub up_angle: f32,
    pub blocked: Vec<TargetId>,
}

impl Default for SurfaceValidator {
    fn default() -> Self {
        Self {
            up_angle: TELEPORT_UP_ANGLE,
            blocked: Vec::new(),
        }
    }
}

impl ValidationPort for SurfaceValidator {
    fn validate(&self, hit: &Hit, hotspot: Option<&Hotspot>) -> TeleportValidation {
        if hotspot.is_some_and(|h| h.is_active) {
            return TeleportValidation::Valid;
        }
        if self.blocked.contains(&hit.target) {
            return TeleportValidation::Invalid;
        }
        let len = hit.normal.norm();
        if len <= f32::EPSILON {
            return TeleportValidation::Invalid;
        }
        if hit.normal.y / len >= self.up_angle.to_radians().cos() {
            TeleportValidation::Valid
        } else {
            TeleportValidation::Invalid
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test_support::MemoryScene,
        types::{Quat, Transform},
    };

    const BODY: TargetId = TargetId(1);
    const HEAD: TargetId = TargetId(2);
    const FLOOR: TargetId = TargetId(100);
    const WALL: TargetId = TargetId(101);
    const PAD: TargetId = TargetId(300);

    fn scene() -> MemoryScene {
        let mut scene = MemoryScene::default();
        scene.insert(BODY, Transform::from_position(Vec3::new(0.0, 0.0, 0.0)), 0.0);
        scene.insert(HEAD, Transform::from_position(Vec3::new(0.2, 1.6, 0.0)), 0.1);
        scene
    }

    fn navigator() -> TeleportNavigator {
        let mut nav = TeleportNavigator::new(TeleportConfig::default(), PointerId(9));
        nav.set_provider(Some(ProviderId(1)));
        nav.set_rig(Some(PlayerRig {
            body: BODY,
            head: HEAD,
        }));
        nav
    }

    fn stick(x: f32, y: f32) -> TeleportInput<'static> {
        TeleportInput {
            axis: Vec2::new(x, y),
            confirm: None,
            hit: None,
        }
    }

    fn floor_hit(point: Vec3) -> Hit {
        Hit {
            point,
            normal: Vec3::new(0.0, 1.0, 0.0),
            distance: 3.0,
            target: FLOOR,
        }
    }

    #[test]
    fn boundary_angles_classify() {
        let c = TeleportConfig::default();
        assert_eq!(c.classify(0.0), NavigationZone::Teleport);
        assert_eq!(c.classify(44.9), NavigationZone::Teleport);
        assert_eq!(c.classify(-44.9), NavigationZone::Teleport);
        assert_eq!(c.classify(45.1), NavigationZone::None);
        assert_eq!(c.classify(90.0), NavigationZone::Rotate);
        assert_eq!(c.classify(-90.0), NavigationZone::Rotate);
        assert_eq!(c.classify(180.0), NavigationZone::Strafe);
        assert_eq!(c.classify(-180.0), NavigationZone::Strafe);
        assert_eq!(c.classify(135.0), NavigationZone::None);
    }

    #[test]
    fn zones_never_overlap() {
        let c = TeleportConfig::default();
        let mut angle = -180.0f32;
        while angle <= 180.0 {
            let matches = [
                c.in_teleport_zone(angle),
                c.in_rotate_zone(angle),
                c.in_strafe_zone(angle),
            ]
            .iter()
            .filter(|&&m| m)
            .count();
            assert!(matches <= 1, "angle {angle} in {matches} zones");
            angle += 0.25;
        }
    }

    #[test]
    fn stick_angle_reads_forward_as_zero() {
        let c = TeleportConfig::default();
        assert!(c.stick_angle(Vec2::new(0.0, 1.0)).abs() < 1.0e-4);
        assert!((c.stick_angle(Vec2::new(1.0, 0.0)) - 90.0).abs() < 1.0e-4);
        assert!((c.stick_angle(Vec2::new(-1.0, 0.0)) + 90.0).abs() < 1.0e-4);
        assert!((c.stick_angle(Vec2::new(0.0, -1.0)).abs() - 180.0).abs() < 1.0e-4);

        let offset = TeleportConfig {
            angle_offset: -90.0,
            ..TeleportConfig::default()
        };
        assert!(offset.stick_angle(Vec2::new(1.0, 0.0)).abs() < 1.0e-4);
    }

    #[test]
    fn overlapping_thresholds_are_rejected() {
        assert!(TeleportConfig::default().validate().is_ok());
        let bad = TeleportConfig {
            teleport_activation_angle: 85.0,
            ..TeleportConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn rotate_fires_once_until_rearmed() {
        let mut nav = navigator();
        let mut scene = scene();

        let events = nav.update(stick(1.0, 0.0), None, &mut scene);
        assert_eq!(events, vec![TeleportEvent::Rotated { degrees: 90.0 }]);
        assert!(!nav.is_armed());

        for _ in 0..5 {
            assert!(nav.update(stick(0.9, 0.1), None, &mut scene).is_empty());
        }

        assert!(nav.update(stick(0.1, 0.0), None, &mut scene).is_empty());
        assert!(nav.is_armed());
        let events = nav.update(stick(-1.0, 0.0), None, &mut scene);
        assert_eq!(events, vec![TeleportEvent::Rotated { degrees: -90.0 }]);
    }

    #[test]
    fn forward_push_after_turn_waits_for_neutral() {
        let mut nav = navigator();
        let mut scene = scene();

        let events = nav.update(stick(1.0, 0.0), None, &mut scene);
        assert_eq!(events, vec![TeleportEvent::Rotated { degrees: 90.0 }]);
        assert!(nav.update(stick(0.0, 1.0), None, &mut scene).is_empty());
        assert!(nav.session().is_none());

        assert!(nav.update(stick(0.0, 0.0), None, &mut scene).is_empty());
        let events = nav.update(stick(0.0, 1.0), None, &mut scene);
        assert_eq!(
            events,
            vec![TeleportEvent::Requested {
                provider: ProviderId(1)
            }]
        );
    }

    #[test]
    fn held_back_deflection_strafes_once() {
        let mut nav = navigator();
        let mut scene = scene();

        let mut strafes = 0;
        for _ in 0..6 {
            strafes += nav
                .update(stick(0.0, -1.0), None, &mut scene)
                .iter()
                .filter(|e| matches!(e, TeleportEvent::Strafed { .. }))
                .count();
        }
        assert_eq!(strafes, 1);
        let body = scene.position(BODY).unwrap();
        assert!((body - Vec3::new(0.0, 0.0, STRAFE_AMOUNT)).norm() < 1.0e-5);

        // A forward push straight out of the strafe is swallowed too.
        assert!(nav.update(stick(0.0, 1.0), None, &mut scene).is_empty());
        assert!(nav.session().is_none());
    }

    #[test]
    fn right_turn_rotates_rig_about_head() {
        let mut nav = navigator();
        let mut scene = scene();
        nav.update(stick(1.0, 0.0), None, &mut scene);

        // Head stays put; forward (-Z) turns to +X.
        let rotation = scene.rotation(BODY).unwrap();
        let forward = rotation * Vec3::new(0.0, 0.0, -1.0);
        assert!((forward - Vec3::new(1.0, 0.0, 0.0)).norm() < 1.0e-5);
        let body = scene.position(BODY).unwrap();
        assert!((body - Vec3::new(0.2, 0.0, -0.2)).norm() < 1.0e-5);
    }

    #[test]
    fn strafe_steps_back_and_keeps_height() {
        let mut nav = navigator();
        let mut scene = scene();
        scene.set_position(BODY, Vec3::new(0.0, 2.0, 0.0));
        let events = nav.update(stick(0.0, -1.0), None, &mut scene);
        assert_eq!(events.len(), 1);
        let body = scene.position(BODY).unwrap();
        assert!((body - Vec3::new(0.0, 2.0, STRAFE_AMOUNT)).norm() < 1.0e-5);
    }

    #[test]
    fn valid_release_commits_teleport() {
        let mut nav = navigator();
        let mut scene = scene();
        let validator = SurfaceValidator::default();
        let hit = floor_hit(Vec3::new(3.0, 0.5, -4.0));

        let input = TeleportInput {
            axis: Vec2::new(0.0, 1.0),
            confirm: None,
            hit: Some(&hit),
        };
        let events = nav.update(input, Some(&validator), &mut scene);
        assert_eq!(
            events,
            vec![TeleportEvent::Requested {
                provider: ProviderId(1)
            }]
        );
        assert_eq!(nav.validation(), TeleportValidation::Valid);

        let release = TeleportInput {
            axis: Vec2::zeros(),
            confirm: None,
            hit: Some(&hit),
        };
        let events = nav.update(release, Some(&validator), &mut scene);
        assert_eq!(
            events,
            vec![
                TeleportEvent::Started {
                    destination: hit.point
                },
                TeleportEvent::Completed {
                    destination: hit.point
                },
            ]
        );
        assert!(nav.session().is_none());
        // Head lands over the destination.
        let body = scene.position(BODY).unwrap();
        assert!((body - Vec3::new(2.8, 0.5, -4.0)).norm() < 1.0e-5);
    }

    #[test]
    fn invalid_or_unknown_release_cancels() {
        let mut nav = navigator();
        let mut scene = scene();
        let validator = SurfaceValidator::default();
        let wall = Hit {
            point: Vec3::new(0.0, 1.0, -2.0),
            normal: Vec3::new(0.0, 0.0, 1.0),
            distance: 2.0,
            target: WALL,
        };
        let aim = TeleportInput {
            axis: Vec2::new(0.0, 1.0),
            confirm: None,
            hit: Some(&wall),
        };
        nav.update(aim, Some(&validator), &mut scene);
        assert_eq!(nav.validation(), TeleportValidation::Invalid);
        let events = nav.update(stick(0.0, 0.0), Some(&validator), &mut scene);
        assert_eq!(
            events,
            vec![TeleportEvent::Canceled {
                provider: ProviderId(1)
            }]
        );

        // No hit at all: Unknown, and release cancels.
        nav.update(stick(0.0, 1.0), Some(&validator), &mut scene);
        assert_eq!(nav.validation(), TeleportValidation::Unknown);
        let events = nav.update(stick(0.0, 0.0), Some(&validator), &mut scene);
        assert!(matches!(events[..], [TeleportEvent::Canceled { .. }]));
        assert_eq!(scene.position(BODY), Some(Vec3::zeros()));
    }

    #[test]
    fn digital_mode_waits_for_button_release() {
        let mut nav = TeleportNavigator::new(
            TeleportConfig {
                confirm_mode: ConfirmMode::Digital,
                ..TeleportConfig::default()
            },
            PointerId(9),
        );
        nav.set_provider(Some(ProviderId(1)));
        nav.set_rig(Some(PlayerRig {
            body: BODY,
            head: HEAD,
        }));
        let mut scene = scene();
        let validator = SurfaceValidator::default();
        let hit = floor_hit(Vec3::new(0.0, 0.0, -5.0));

        let frame = |axis: Vec2, confirm: Option<bool>| TeleportInput {
            axis,
            confirm,
            hit: Some(&hit),
        };

        nav.update(frame(Vec2::new(0.0, 1.0), Some(true)), Some(&validator), &mut scene);
        assert!(nav.session().is_some());
        // Stick back to neutral does not commit in digital mode.
        assert!(
            nav.update(frame(Vec2::zeros(), None), Some(&validator), &mut scene)
                .is_empty()
        );
        assert!(nav.session().is_some());

        let events = nav.update(frame(Vec2::zeros(), Some(false)), Some(&validator), &mut scene);
        assert!(matches!(
            events[..],
            [TeleportEvent::Started { .. }, TeleportEvent::Completed { .. }]
        ));
    }

    #[test]
    fn hotspot_overrides_destination_and_facing() {
        let mut nav = navigator();
        let mut scene = scene();
        nav.add_hotspot(Hotspot {
            target: PAD,
            position: Vec3::new(10.0, 0.0, 0.0),
            override_orientation: true,
            yaw_degrees: 90.0,
            is_active: true,
        });
        let validator = SurfaceValidator::default();
        let hit = Hit {
            point: Vec3::new(9.7, 0.0, 0.3),
            normal: Vec3::new(0.0, 1.0, 0.0),
            distance: 10.0,
            target: PAD,
        };
        let aim = TeleportInput {
            axis: Vec2::new(0.0, 1.0),
            confirm: None,
            hit: Some(&hit),
        };
        nav.update(aim, Some(&validator), &mut scene);
        let events = nav.update(
            TeleportInput {
                axis: Vec2::zeros(),
                ..aim
            },
            Some(&validator),
            &mut scene,
        );
        assert!(events.contains(&TeleportEvent::Completed {
            destination: Vec3::new(10.0, 0.0, 0.0)
        }));
        let rotation = scene.rotation(BODY).unwrap();
        assert!(rotation.angle_to(&yaw(90.0)) < 1.0e-4);
        // Head offset (0.2, 0, 0) rotated by +90 about Y becomes (0, 0, -0.2).
        let body = scene.position(BODY).unwrap();
        assert!((body - Vec3::new(10.0, 0.0, 0.2)).norm() < 1.0e-4);
    }

    #[test]
    fn missing_collaborators_are_silent() {
        let mut nav = TeleportNavigator::new(TeleportConfig::default(), PointerId(9));
        let mut scene = scene();
        assert!(nav.update(stick(0.0, 1.0), None, &mut scene).is_empty());
        assert!(nav.session().is_none());
        assert!(nav.update(stick(1.0, 0.0), None, &mut scene).is_empty());
        assert_eq!(scene.position(BODY), Some(Vec3::zeros()));
        assert_eq!(scene.rotation(BODY), Some(Quat::identity()));
    }

    #[test]
    fn surface_validator_checks_normal_and_blocklist() {
        let v = SurfaceValidator {
            blocked: vec![WALL],
            ..SurfaceValidator::default()
        };
        let mut hit = floor_hit(Vec3::zeros());
        assert_eq!(v.validate(&hit, None), TeleportValidation::Valid);
        hit.normal = Vec3::new(1.0, 0.2, 0.0);
        assert_eq!(v.validate(&hit, None), TeleportValidation::Invalid);
        hit.normal = Vec3::new(0.0, 1.0, 0.0);
        hit.target = WALL;
        assert_eq!(v.validate(&hit, None), TeleportValidation::Invalid);
    }
}
