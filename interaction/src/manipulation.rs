/*!
Grab-and-move sessions driven by a pointer.

A session starts when the select action is held (or toggled, with
`use_hold == false`) while the pointer hits an object. From then on the
pointer's result is focus-locked on the grab point and every frame:

1. the manipulate stick goes through the gesture discriminator and its delta
   (rotate, nudge or scale) is applied directly;
2. the translation target is the point at the pointer's extent minus the
   grab offset;
3. the snap engine accepts, clamps, pins or rejects that target;
4. the result is smoothed, except on the frame a snap happens and while a
   gesture is active.

Only one pointer may drive a given object (or any object in its hierarchy).
Canceling a session writes the start snapshot back verbatim.
*/

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::InteractionError,
    focus_lock::FocusLockController,
    gesture::{ActiveGesture, GestureConfig, GestureDelta, GestureDiscriminator, GestureInput},
    pointer::Pointer,
    ports::{MeshDisplay, RaycastPort, SceneTransformPort, SpatialMeshPort},
    settings::{DIST_EPS, SMOOTHING_FACTOR},
    snap::{SnapConfig, SnapEngine, SnapOutcome, SnapRequest, SnapState, SnapTransition},
    types::{PointerId, TargetId, Transform, Vec3, is_finite_vec},
    utils::{smooth_toward, yaw},
};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManipulationConfig {
    /// Hold select to manipulate; otherwise each press toggles the session.
    pub use_hold: bool,
    pub smoothing: bool,
    /// Rate of the exponential approach toward the translation target (1/s).
    pub smoothing_factor: f32,
    /// Gestures still apply but the object is not moved with the pointer.
    pub lock_translation: bool,
    pub snap_to_surfaces: bool,
    /// Spatial-mesh display while a session is active; `None` leaves it alone.
    pub mesh_display: Option<MeshDisplay>,
    pub gesture: GestureConfig,
    pub snap: SnapConfig,
}

impl Default for ManipulationConfig {
    fn default() -> Self {
        Self {
            use_hold: true,
            smoothing: true,
            smoothing_factor: SMOOTHING_FACTOR,
            lock_translation: false,
            snap_to_surfaces: true,
            mesh_display: Some(MeshDisplay::Occlusion),
            gesture: GestureConfig::default(),
            snap: SnapConfig::default(),
        }
    }
}

impl ManipulationConfig {
    pub fn validate(&self) -> Result<(), InteractionError> {
        if !(self.smoothing_factor.is_finite() && self.smoothing_factor > 0.0) {
            return Err(InteractionError::InvalidConfig(
                "smoothing_factor must be positive".into(),
            ));
        }
        self.gesture.validate()?;
        self.snap.validate()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ManipulationSession {
    pub pointer: PointerId,
    pub target: TargetId,
    /// World offset from the object origin to the grab point.
    pub grab_offset: Vec3,
    /// Transform at session start, restored on cancel.
    pub start: Transform,
    pub start_extent: f32,
    pub active_gesture: ActiveGesture,
    pub snap: SnapState,
    /// Mesh display to restore, if this session overrode it.
    pub mesh_display_before: Option<MeshDisplay>,
}

impl ManipulationSession {
    #[inline]
    pub fn is_snapped(&self) -> bool {
        matches!(self.snap, SnapState::Snapped { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ManipulationEvent {
    Started { pointer: PointerId, target: TargetId },
    Ended {
        pointer: PointerId,
        target: TargetId,
        canceled: bool,
    },
    Rotated { target: TargetId, degrees: f32 },
    Nudged { target: TargetId, extent: f32 },
    Scaled { target: TargetId, scale: Vec3 },
    Snapped { target: TargetId, surface: TargetId },
    Unsnapped { target: TargetId },
}

/// Host collaborators a session reads and writes.
pub struct ManipulationPorts<'a> {
    pub scene: &'a mut dyn SceneTransformPort,
    pub raycast: &'a dyn RaycastPort,
    pub mesh: Option<&'a mut dyn SpatialMeshPort>,
}

#[derive(Clone, Debug)]
struct Slot {
    session: ManipulationSession,
    gesture: GestureDiscriminator,
    snap: SnapEngine,
}

#[derive(Clone, Debug, Default)]
pub struct ManipulationController {
    config: ManipulationConfig,
    slots: HashMap<PointerId, Slot>,
}

impl ManipulationController {
    pub fn new(config: ManipulationConfig) -> Self {
        Self {
            config,
            slots: HashMap::new(),
        }
    }

    pub fn config(&self) -> &ManipulationConfig {
        &self.config
    }

    pub fn session(&self, pointer: PointerId) -> Option<&ManipulationSession> {
        self.slots.get(&pointer).map(|s| &s.session)
    }

    pub fn sessions(&self) -> impl Iterator<Item = &ManipulationSession> {
        self.slots.values().map(|s| &s.session)
    }

    /// The pointer currently driving `target`, if any.
    pub fn driver_of(&self, target: TargetId) -> Option<PointerId> {
        self.sessions()
            .find(|s| s.target == target)
            .map(|s| s.pointer)
    }

    /// Feed the select press. Starts or ends a session on press edges.
    pub fn on_select(
        &mut self,
        pointer: &mut Pointer,
        pressed: bool,
        focus: &mut FocusLockController,
        ports: &mut ManipulationPorts<'_>,
    ) -> Option<ManipulationEvent> {
        let was_pressed = pointer.is_select_pressed();
        pointer.set_select_pressed(pressed);
        if pressed == was_pressed {
            return None;
        }

        let holding = self.slots.contains_key(&pointer.id());
        match (self.config.use_hold, pressed) {
            (true, true) => self.begin_hold(pointer, focus, ports),
            (true, false) => self.end_hold(pointer, false, focus, ports),
            (false, true) if holding => self.end_hold(pointer, false, focus, ports),
            (false, true) => self.begin_hold(pointer, focus, ports),
            (false, false) => None,
        }
    }

    /// Start a session on whatever the pointer hits.
    ///
    /// No-op without a hit target, when the pointer kind cannot manipulate, or
    /// when another pointer already drives the target.
    pub fn begin_hold(
        &mut self,
        pointer: &mut Pointer,
        focus: &mut FocusLockController,
        ports: &mut ManipulationPorts<'_>,
    ) -> Option<ManipulationEvent> {
        let capabilities = pointer.adapter().capabilities();
        if !capabilities.manipulation || self.slots.contains_key(&pointer.id()) {
            return None;
        }
        let target = pointer.result().target?;

        if let Some(other) = self.sessions().find(|s| {
            ports.scene.is_within(target, s.target) || ports.scene.is_within(s.target, target)
        }) {
            log::warn!(
                "pointer {:?} cannot grab {:?}: driven by {:?}",
                pointer.id(),
                target,
                other.pointer
            );
            return None;
        }

        let start = ports.scene.transform(target)?;
        let point = pointer.result().point;
        if !focus.try_lock(pointer, target, point, &*ports.scene) {
            return None;
        }

        let start_extent = pointer.extent();
        let grab_distance = pointer.result().distance;
        if grab_distance > DIST_EPS {
            let _ = pointer.set_extent(grab_distance);
        }
        pointer.set_holding(true);

        let mesh_display_before = match (self.config.mesh_display, ports.mesh.as_deref_mut()) {
            (Some(display), Some(mesh)) => {
                let before = mesh.display();
                mesh.set_display(display);
                Some(before)
            }
            _ => None,
        };

        let session = ManipulationSession {
            pointer: pointer.id(),
            target,
            grab_offset: point - start.position,
            start,
            start_extent,
            active_gesture: ActiveGesture::None,
            snap: SnapState::Idle,
            mesh_display_before,
        };
        self.slots.insert(
            pointer.id(),
            Slot {
                session,
                gesture: GestureDiscriminator::new(self.config.gesture, capabilities.into()),
                snap: SnapEngine::new(self.config.snap),
            },
        );
        log::debug!("pointer {:?} started manipulating {:?}", pointer.id(), target);
        Some(ManipulationEvent::Started {
            pointer: pointer.id(),
            target,
        })
    }

    /// End the pointer's session. With `is_canceled` the start transform is restored.
    pub fn end_hold(
        &mut self,
        pointer: &mut Pointer,
        is_canceled: bool,
        focus: &mut FocusLockController,
        ports: &mut ManipulationPorts<'_>,
    ) -> Option<ManipulationEvent> {
        let slot = self.slots.remove(&pointer.id())?;
        let session = slot.session;

        if is_canceled {
            ports.scene.set_transform(session.target, session.start);
        }
        focus.unlock(session.pointer);
        let _ = pointer.set_extent(session.start_extent);
        pointer.set_holding(false);

        if let (Some(before), Some(mesh)) = (session.mesh_display_before, ports.mesh.as_deref_mut())
        {
            mesh.set_display(before);
        }

        log::debug!(
            "pointer {:?} stopped manipulating {:?} (canceled: {})",
            session.pointer,
            session.target,
            is_canceled
        );
        Some(ManipulationEvent::Ended {
            pointer: session.pointer,
            target: session.target,
            canceled: is_canceled,
        })
    }

    /// Advance the pointer's session by one frame.
    ///
    /// The pointer's result must already be resolved through the focus lock.
    pub fn update(
        &mut self,
        pointer: &mut Pointer,
        input: GestureInput,
        dt: f32,
        focus: &mut FocusLockController,
        ports: &mut ManipulationPorts<'_>,
    ) -> Vec<ManipulationEvent> {
        let mut events = Vec::new();
        let Some(target) = self.slots.get(&pointer.id()).map(|s| s.session.target) else {
            return events;
        };

        if !ports.scene.is_active(target) {
            log::debug!("{:?} went inactive while held", target);
            events.extend(self.end_hold(pointer, true, focus, ports));
            return events;
        }
        let (Some(current), Some(slot)) = (
            ports.scene.transform(target),
            self.slots.get_mut(&pointer.id()),
        ) else {
            return events;
        };

        let frame = slot.gesture.update(input, pointer.extent(), current.scale);
        slot.session.active_gesture = frame.active;
        match frame.delta {
            Some(GestureDelta::Rotate { degrees }) => {
                ports.scene.set_rotation(target, yaw(degrees) * current.rotation);
                events.push(ManipulationEvent::Rotated { target, degrees });
            }
            Some(GestureDelta::Nudge { extent }) => {
                if pointer.set_extent(extent).is_ok() {
                    events.push(ManipulationEvent::Nudged { target, extent });
                }
            }
            Some(GestureDelta::Scale { scale }) if is_finite_vec(&scale) => {
                ports.scene.set_scale(target, scale);
                events.push(ManipulationEvent::Scaled { target, scale });
            }
            _ => {}
        }

        if self.config.lock_translation {
            return events;
        }
        let Some(ray) = pointer.ray() else {
            return events;
        };
        let proposed = ray.point_at(pointer.extent()) - slot.session.grab_offset;

        let (goal, snapped_now) = if self.config.snap_to_surfaces {
            let request = SnapRequest {
                target,
                current: current.position,
                proposed,
                half_height: ports.scene.half_height(target).unwrap_or(0.0),
            };
            let outcome = slot.snap.evaluate(request, ports.raycast);
            slot.session.snap = slot.snap.state();
            match outcome {
                SnapOutcome::Rejected => return events,
                SnapOutcome::Accepted {
                    position,
                    transition,
                } => match transition {
                    SnapTransition::Snapped(surface) => {
                        events.push(ManipulationEvent::Snapped { target, surface });
                        (position, true)
                    }
                    SnapTransition::Unsnapped => {
                        events.push(ManipulationEvent::Unsnapped { target });
                        (position, false)
                    }
                    SnapTransition::None => (position, false),
                },
            }
        } else {
            (proposed, false)
        };

        let position = if self.config.smoothing
            && !snapped_now
            && slot.session.active_gesture == ActiveGesture::None
        {
            smooth_toward(current.position, goal, dt, self.config.smoothing_factor)
        } else {
            goal
        };

        if is_finite_vec(&position) {
            ports.scene.set_position(target, position);
        }
        events
    }

    /// End every session, restoring each start snapshot.
    pub fn cancel_all<'p>(
        &mut self,
        pointers: impl IntoIterator<Item = &'p mut Pointer>,
        focus: &mut FocusLockController,
        ports: &mut ManipulationPorts<'_>,
    ) -> Vec<ManipulationEvent> {
        pointers
            .into_iter()
            .filter_map(|p| self.end_hold(p, true, focus, ports))
            .collect()
    }
}
