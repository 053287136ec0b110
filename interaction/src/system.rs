/*!
Frame-stepped driver that owns the pointers and wires the components together.

Lifecycle is two-phase: build with [`InteractionSystem::new`] plus the optional
`with_*` ports, then [`InteractionSystem::activate`], which fails fast on an invalid
configuration or a missing collaborator. Until activation every frame is a no-op.

Each [`InteractionSystem::frame`] runs, in order:
1. input routing (polled port plus pushed samples) to the pointers of each source;
2. pointer results against the raycast port;
3. focus-lock resolution;
4. select edges, then gesture discrimination, snapping and the transform commit
   for pointers holding a session;
5. teleport navigation for teleport-capable pointers.

The host keeps its raycast geometry in sync with the scene after each frame (see
[`InteractionSystem::raycast_mut`]).
*/

use std::collections::BTreeMap;

use crate::{
    config::InteractionConfig,
    error::InteractionError,
    focus_lock::FocusLockController,
    gesture::GestureInput,
    input::{InputAdapter, InputSample, InputValue, TriggerLatch},
    manipulation::{ManipulationController, ManipulationEvent, ManipulationPorts},
    pointer::{Pointer, PointerResult},
    ports::{InputPort, RaycastPort, SceneTransformPort, SpatialMeshPort, ValidationPort},
    teleport::{Hotspot, PlayerRig, ProviderId, TeleportEvent, TeleportInput, TeleportNavigator},
    types::{Handedness, Hit, PointerId, SourceId, Vec2},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InteractionEvent {
    PointerCreated { pointer: PointerId, source: SourceId },
    PointerRemoved { pointer: PointerId },
    Manipulation(ManipulationEvent),
    Teleport {
        pointer: PointerId,
        event: TeleportEvent,
    },
}

/// Per-pointer input state accumulated by routing.
#[derive(Clone, Debug)]
struct PointerInput {
    select_latch: TriggerLatch,
    /// Latest select state seen since the last frame.
    select: Option<bool>,
    manipulate_axis: Vec2,
    manipulate_pressed: bool,
    navigate_axis: Vec2,
    confirm_latch: TriggerLatch,
    confirm: Option<bool>,
}

impl PointerInput {
    fn new(config: &InteractionConfig) -> Self {
        Self {
            select_latch: TriggerLatch::new(config.press_threshold, config.release_threshold),
            select: None,
            manipulate_axis: Vec2::zeros(),
            manipulate_pressed: false,
            navigate_axis: Vec2::zeros(),
            confirm_latch: TriggerLatch::new(config.press_threshold, config.release_threshold),
            confirm: None,
        }
    }
}

pub struct InteractionSystem<R: RaycastPort, S: SceneTransformPort> {
    config: InteractionConfig,
    raycast: R,
    scene: S,
    validation: Option<Box<dyn ValidationPort>>,
    input: Option<Box<dyn InputPort>>,
    mesh: Option<Box<dyn SpatialMeshPort>>,
    rig: Option<PlayerRig>,
    provider: Option<ProviderId>,
    hotspots: Vec<Hotspot>,
    active: bool,

    next_pointer: u32,
    pointers: BTreeMap<PointerId, Pointer>,
    inputs: BTreeMap<PointerId, PointerInput>,
    navigators: BTreeMap<PointerId, TeleportNavigator>,
    focus: FocusLockController,
    manipulation: ManipulationController,

    pending: Vec<InputSample>,
    events: Vec<InteractionEvent>,
}

fn mesh_port(mesh: &mut Option<Box<dyn SpatialMeshPort>>) -> Option<&mut dyn SpatialMeshPort> {
    match mesh {
        Some(mesh) => Some(mesh.as_mut()),
        None => None,
    }
}

impl<R: RaycastPort, S: SceneTransformPort> InteractionSystem<R, S> {
    pub fn new(config: InteractionConfig, raycast: R, scene: S) -> Self {
        Self {
            manipulation: ManipulationController::new(config.manipulation),
            config,
            raycast,
            scene,
            validation: None,
            input: None,
            mesh: None,
            rig: None,
            provider: None,
            hotspots: Vec::new(),
            active: false,
            next_pointer: 1,
            pointers: BTreeMap::new(),
            inputs: BTreeMap::new(),
            navigators: BTreeMap::new(),
            focus: FocusLockController::new(),
            pending: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn with_validation(mut self, port: impl ValidationPort + 'static) -> Self {
        self.validation = Some(Box::new(port));
        self
    }

    pub fn with_input(mut self, port: impl InputPort + 'static) -> Self {
        self.input = Some(Box::new(port));
        self
    }

    pub fn with_spatial_mesh(mut self, port: impl SpatialMeshPort + 'static) -> Self {
        self.mesh = Some(Box::new(port));
        self
    }

    pub fn with_rig(mut self, rig: PlayerRig) -> Self {
        self.rig = Some(rig);
        self
    }

    /// Bind the locomotion provider that owns teleport requests.
    pub fn with_provider(mut self, provider: ProviderId) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Validate the configuration and bound ports, then start accepting frames.
    ///
    /// A bound teleport provider needs both a validation port and a player rig.
    pub fn activate(&mut self) -> Result<(), InteractionError> {
        if self.active {
            return Err(InteractionError::AlreadyActive);
        }
        self.config.validate()?;
        if self.provider.is_some() {
            if self.validation.is_none() {
                return Err(InteractionError::MissingPort("validation"));
            }
            if self.rig.is_none() {
                return Err(InteractionError::MissingPort("player rig"));
            }
        }
        self.active = true;
        log::info!(
            "interaction system active (teleport: {})",
            self.provider.is_some()
        );
        Ok(())
    }

    /// Cancel every session and pending teleport and stop processing frames.
    pub fn deactivate(&mut self) -> Vec<InteractionEvent> {
        let mut events = std::mem::take(&mut self.events);
        let mut ports = ManipulationPorts {
            scene: &mut self.scene,
            raycast: &self.raycast,
            mesh: mesh_port(&mut self.mesh),
        };
        events.extend(
            self.manipulation
                .cancel_all(self.pointers.values_mut(), &mut self.focus, &mut ports)
                .into_iter()
                .map(InteractionEvent::Manipulation),
        );
        for (&pointer, nav) in self.navigators.iter_mut() {
            if let Some(event) = nav.cancel() {
                events.push(InteractionEvent::Teleport { pointer, event });
            }
        }
        if self.active {
            log::info!("interaction system deactivated");
        }
        self.active = false;
        events
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    pub fn raycast(&self) -> &R {
        &self.raycast
    }

    /// Mutable access for the host to keep query geometry in sync with the scene.
    pub fn raycast_mut(&mut self) -> &mut R {
        &mut self.raycast
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn pointer(&self, id: PointerId) -> Option<&Pointer> {
        self.pointers.get(&id)
    }

    pub fn pointer_mut(&mut self, id: PointerId) -> Option<&mut Pointer> {
        self.pointers.get_mut(&id)
    }

    pub fn pointers(&self) -> impl Iterator<Item = &Pointer> {
        self.pointers.values()
    }

    pub fn manipulation(&self) -> &ManipulationController {
        &self.manipulation
    }

    pub fn navigator(&self, pointer: PointerId) -> Option<&TeleportNavigator> {
        self.navigators.get(&pointer)
    }

    pub fn is_locked(&mut self, pointer: PointerId) -> bool {
        self.focus.is_locked(pointer, &self.scene)
    }

    /// The parabolic adapter configured for teleport pointers.
    pub fn teleport_adapter(&self) -> InputAdapter {
        InputAdapter::Teleport(self.config.teleport_arc)
    }

    pub fn add_hotspot(&mut self, hotspot: Hotspot) {
        for nav in self.navigators.values_mut() {
            nav.add_hotspot(hotspot);
        }
        self.hotspots.retain(|h| h.target != hotspot.target);
        self.hotspots.push(hotspot);
    }

    /// Create a pointer per adapter for a new source.
    ///
    /// Pointers kept alive by `persist_on_source_lost` with the same handedness and
    /// adapter are reattached instead.
    pub fn on_source_detected(
        &mut self,
        source: SourceId,
        handedness: Handedness,
        adapters: &[InputAdapter],
    ) -> Vec<PointerId> {
        let mut ids = Vec::with_capacity(adapters.len());
        for &adapter in adapters {
            if let Some(pointer) = self.pointers.values_mut().find(|p| {
                p.source().is_none() && p.handedness() == handedness && p.adapter() == adapter
            }) {
                pointer.on_source_detected(source);
                log::debug!("reattached {:?} to {:?}", pointer.id(), source);
                ids.push(pointer.id());
                continue;
            }

            let id = PointerId(self.next_pointer);
            self.next_pointer += 1;
            let mut pointer = Pointer::new(id, handedness, adapter).with_source(source);
            if let Err(err) = pointer.set_extent(self.config.pointer_extent) {
                log::warn!("pointer {:?}: {err}", id);
            }

            if adapter.capabilities().teleport {
                let mut nav = TeleportNavigator::new(self.config.teleport, id);
                nav.set_provider(self.provider);
                nav.set_rig(self.rig);
                for hotspot in &self.hotspots {
                    nav.add_hotspot(*hotspot);
                }
                self.navigators.insert(id, nav);
            }
            self.inputs.insert(id, PointerInput::new(&self.config));
            self.pointers.insert(id, pointer);
            self.events
                .push(InteractionEvent::PointerCreated { pointer: id, source });
            log::debug!("created {:?} ({:?}) for {:?}", id, adapter, source);
            ids.push(id);
        }
        ids
    }

    /// End everything the source was doing and drop its pointers unless they persist.
    pub fn on_source_lost(&mut self, source: SourceId) {
        let ids: Vec<PointerId> = self
            .pointers
            .values()
            .filter(|p| p.source() == Some(source))
            .map(Pointer::id)
            .collect();

        for id in ids {
            let Some(pointer) = self.pointers.get_mut(&id) else {
                continue;
            };
            let mut ports = ManipulationPorts {
                scene: &mut self.scene,
                raycast: &self.raycast,
                mesh: mesh_port(&mut self.mesh),
            };
            if let Some(event) =
                self.manipulation
                    .end_hold(pointer, false, &mut self.focus, &mut ports)
            {
                self.events.push(InteractionEvent::Manipulation(event));
            }
            self.focus.unlock(id);
            if let Some(event) = self.navigators.get_mut(&id).and_then(TeleportNavigator::cancel) {
                self.events
                    .push(InteractionEvent::Teleport { pointer: id, event });
            }
            self.inputs.insert(id, PointerInput::new(&self.config));

            if !pointer.on_source_lost() {
                self.pointers.remove(&id);
                self.inputs.remove(&id);
                self.navigators.remove(&id);
                self.events
                    .push(InteractionEvent::PointerRemoved { pointer: id });
                log::debug!("removed {:?} after losing {:?}", id, source);
            }
        }
    }

    /// Queue a sample for the next frame.
    pub fn push_sample(&mut self, sample: InputSample) {
        self.pending.push(sample);
    }

    /// Advance one frame. Returns everything that happened since the previous frame.
    pub fn frame(&mut self, dt: f32) -> Vec<InteractionEvent> {
        if !self.active {
            if !self.pending.is_empty() {
                log::debug!("dropping {} samples: system inactive", self.pending.len());
                self.pending.clear();
            }
            return Vec::new();
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let mut events = std::mem::take(&mut self.events);

        if let Some(input) = self.input.as_mut() {
            input.poll(&mut self.pending);
        }
        let mut samples = std::mem::take(&mut self.pending);
        for sample in &samples {
            self.route(sample);
        }
        samples.clear();
        self.pending = samples;

        for (id, pointer) in self.pointers.iter_mut() {
            let pressing = self
                .inputs
                .get(id)
                .is_some_and(|s| s.select == Some(true));
            if pointer.is_interaction_enabled() || (pressing && pointer.source().is_some()) {
                pointer.update_result(&self.raycast);
            } else {
                pointer.set_result(PointerResult::default());
            }
            self.focus.resolve(pointer, &self.scene);
        }

        for (&id, pointer) in self.pointers.iter_mut() {
            let Some(state) = self.inputs.get_mut(&id) else {
                continue;
            };
            let mut ports = ManipulationPorts {
                scene: &mut self.scene,
                raycast: &self.raycast,
                mesh: mesh_port(&mut self.mesh),
            };

            if let Some(pressed) = state.select.take() {
                events.extend(
                    self.manipulation
                        .on_select(pointer, pressed, &mut self.focus, &mut ports)
                        .map(InteractionEvent::Manipulation),
                );
            }

            if self.manipulation.session(id).is_some() {
                let input = GestureInput {
                    axis: state.manipulate_axis,
                    pressed: state.manipulate_pressed,
                };
                events.extend(
                    self.manipulation
                        .update(pointer, input, dt, &mut self.focus, &mut ports)
                        .into_iter()
                        .map(InteractionEvent::Manipulation),
                );
            }

            if let Some(nav) = self.navigators.get_mut(&id) {
                let result = pointer.result();
                let hit = result.target.map(|target| Hit {
                    point: result.point,
                    normal: result.normal,
                    distance: result.distance,
                    target,
                });
                let input = TeleportInput {
                    axis: state.navigate_axis,
                    confirm: state.confirm.take(),
                    hit: hit.as_ref(),
                };
                for event in nav.update(input, self.validation.as_deref(), &mut self.scene) {
                    events.push(InteractionEvent::Teleport { pointer: id, event });
                }
            }
        }
        events
    }

    fn route(&mut self, sample: &InputSample) {
        let bindings = self.config.bindings;
        let mut routed = false;

        for (id, pointer) in self.pointers.iter_mut() {
            if pointer.source() != Some(sample.source) {
                continue;
            }
            let Some(state) = self.inputs.get_mut(id) else {
                continue;
            };
            routed = true;

            let action = sample.action;
            match sample.value {
                InputValue::Pose { position, rotation } if action == bindings.pointer_pose => {
                    if let Err(err) = pointer.apply_pose(position, rotation) {
                        log::warn!("pointer {:?}: {err}", id);
                    }
                }
                InputValue::Digital(pressed) if action == bindings.select => {
                    state.select = Some(pressed);
                }
                InputValue::Axis1D(value) if action == bindings.select => {
                    state.select = Some(state.select_latch.update(value));
                }
                InputValue::Axis2D(axis) if action == bindings.manipulate => {
                    state.manipulate_axis = axis;
                }
                InputValue::Digital(pressed) if action == bindings.manipulate => {
                    state.manipulate_pressed = pressed;
                }
                InputValue::Axis2D(axis) if action == bindings.navigate => {
                    state.navigate_axis = axis;
                }
                InputValue::Digital(pressed) if action == bindings.teleport_confirm => {
                    state.confirm = Some(pressed);
                }
                InputValue::Axis1D(value) if action == bindings.teleport_confirm => {
                    state.confirm = Some(state.confirm_latch.update(value));
                }
                _ => {}
            }
        }

        if !routed {
            log::debug!("no pointer for sample from {:?}", sample.source);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::{
        input::ActionId,
        teleport::SurfaceValidator,
        test_support::{Block, FakeMesh, FlatFloor, MemoryScene},
        types::{Quat, TargetId, Transform, Vec3},
    };

    const CUBE: TargetId = TargetId(5);
    const FLOOR: TargetId = TargetId(100);
    const BODY: TargetId = TargetId(1);
    const HEAD: TargetId = TargetId(2);
    const RIGHT: SourceId = SourceId(10);

    type System = InteractionSystem<FlatFloor, MemoryScene>;

    struct ScriptedInput {
        frames: VecDeque<Vec<InputSample>>,
    }

    impl InputPort for ScriptedInput {
        fn poll(&mut self, out: &mut Vec<InputSample>) {
            if let Some(frame) = self.frames.pop_front() {
                out.extend(frame);
            }
        }
    }

    fn world() -> (FlatFloor, MemoryScene) {
        let raycast = FlatFloor::new(0.0, FLOOR).with_block(Block::cube(
            CUBE,
            Vec3::new(0.0, 0.5, -3.0),
            0.5,
        ));
        let mut scene = MemoryScene::default();
        scene.insert(CUBE, Transform::from_position(Vec3::new(0.0, 0.5, -3.0)), 0.5);
        scene.insert(BODY, Transform::from_position(Vec3::zeros()), 0.0);
        scene.insert(HEAD, Transform::from_position(Vec3::new(0.0, 1.6, 0.0)), 0.1);
        (raycast, scene)
    }

    fn config() -> InteractionConfig {
        let mut config = InteractionConfig::default();
        config.manipulation.smoothing = false;
        config
    }

    fn sample(action: ActionId, value: InputValue) -> InputSample {
        InputSample::new(RIGHT, Handedness::Right, action, value)
    }

    fn pose(origin: Vec3, rotation: Quat) -> InputSample {
        sample(
            ActionId(0),
            InputValue::Pose {
                position: origin,
                rotation,
            },
        )
    }

    fn select(pressed: bool) -> InputSample {
        sample(ActionId(1), InputValue::Digital(pressed))
    }

    fn manipulation_events(events: &[InteractionEvent]) -> Vec<ManipulationEvent> {
        events
            .iter()
            .filter_map(|e| match e {
                InteractionEvent::Manipulation(m) => Some(*m),
                _ => None,
            })
            .collect()
    }

    fn teleport_events(events: &[InteractionEvent]) -> Vec<TeleportEvent> {
        events
            .iter()
            .filter_map(|e| match e {
                InteractionEvent::Teleport { event, .. } => Some(*event),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn activation_fails_fast() {
        let (raycast, scene) = world();
        let mut system = System::new(config(), raycast, scene).with_provider(ProviderId(1));
        assert_eq!(
            system.activate(),
            Err(InteractionError::MissingPort("validation"))
        );

        let (raycast, scene) = world();
        let mut bad = config();
        bad.pointer_extent = -1.0;
        let mut system = System::new(bad, raycast, scene);
        assert!(matches!(
            system.activate(),
            Err(InteractionError::InvalidConfig(_))
        ));

        let (raycast, scene) = world();
        let mut system = System::new(config(), raycast, scene);
        assert!(system.activate().is_ok());
        assert_eq!(system.activate(), Err(InteractionError::AlreadyActive));
    }

    #[test]
    fn inactive_system_ignores_frames() {
        let (raycast, scene) = world();
        let mut system = System::new(config(), raycast, scene);
        system.on_source_detected(RIGHT, Handedness::Right, &[InputAdapter::ControllerRay]);
        system.push_sample(pose(Vec3::new(0.0, 0.5, 0.0), Quat::identity()));
        system.push_sample(select(true));
        assert!(system.frame(0.016).is_empty());
        assert!(system.manipulation().sessions().next().is_none());
    }

    #[test]
    fn grab_move_release() {
        let (raycast, scene) = world();
        let mut system = System::new(config(), raycast, scene).with_spatial_mesh(FakeMesh::default());
        system.activate().unwrap();
        let ids = system.on_source_detected(RIGHT, Handedness::Right, &[InputAdapter::ControllerRay]);
        let id = ids[0];

        system.push_sample(pose(Vec3::new(0.0, 0.5, 0.0), Quat::identity()));
        system.push_sample(select(true));
        let events = system.frame(0.016);
        assert!(events.contains(&InteractionEvent::PointerCreated {
            pointer: id,
            source: RIGHT
        }));
        assert!(manipulation_events(&events).contains(&ManipulationEvent::Started {
            pointer: id,
            target: CUBE
        }));
        assert!(system.is_locked(id));

        system.push_sample(pose(Vec3::new(1.0, 0.5, 0.0), Quat::identity()));
        system.frame(0.016);
        let p = system.scene().position(CUBE).unwrap();
        assert!((p - Vec3::new(1.0, 0.5, -3.0)).norm() < 1.0e-4);
        assert_eq!(system.pointer(id).unwrap().result().target, Some(CUBE));

        system.push_sample(select(false));
        let events = system.frame(0.016);
        assert!(matches!(
            manipulation_events(&events).as_slice(),
            [ManipulationEvent::Ended { canceled: false, .. }]
        ));
        assert!(!system.is_locked(id));
    }

    #[test]
    fn trigger_select_uses_hysteresis() {
        let (raycast, scene) = world();
        let frames = VecDeque::from(vec![
            vec![
                pose(Vec3::new(0.0, 0.5, 0.0), Quat::identity()),
                sample(ActionId(1), InputValue::Axis1D(0.9)),
            ],
            vec![sample(ActionId(1), InputValue::Axis1D(0.7))],
            vec![sample(ActionId(1), InputValue::Axis1D(0.3))],
        ]);
        let mut system = System::new(config(), raycast, scene).with_input(ScriptedInput { frames });
        system.activate().unwrap();
        let id = system.on_source_detected(RIGHT, Handedness::Right, &[InputAdapter::ControllerRay])[0];

        system.frame(0.016);
        assert!(system.manipulation().session(id).is_some());
        system.frame(0.016);
        assert!(system.manipulation().session(id).is_some());
        system.frame(0.016);
        assert!(system.manipulation().session(id).is_none());
    }

    #[test]
    fn teleport_arms_validates_and_commits() {
        let (raycast, scene) = world();
        let mut system = System::new(config(), raycast, scene)
            .with_provider(ProviderId(7))
            .with_rig(PlayerRig {
                body: BODY,
                head: HEAD,
            })
            .with_validation(SurfaceValidator::default());
        system.activate().unwrap();
        let adapter = system.teleport_adapter();
        let id = system.on_source_detected(RIGHT, Handedness::Right, &[adapter])[0];

        let pitched = Quat::from_axis_angle(&Vec3::x_axis(), (-30.0f32).to_radians());
        system.push_sample(pose(Vec3::new(0.0, 1.6, 0.0), pitched));
        system.push_sample(sample(ActionId(3), InputValue::Axis2D(Vec2::new(0.0, 1.0))));
        let events = system.frame(0.016);
        assert_eq!(
            teleport_events(&events),
            vec![TeleportEvent::Requested {
                provider: ProviderId(7)
            }]
        );
        assert_eq!(system.pointer(id).unwrap().result().target, Some(FLOOR));

        system.push_sample(sample(ActionId(3), InputValue::Axis2D(Vec2::zeros())));
        let events = teleport_events(&system.frame(0.016));
        assert!(matches!(
            events.as_slice(),
            [
                TeleportEvent::Started { .. },
                TeleportEvent::Completed { .. }
            ]
        ));
        let body = system.scene().position(BODY).unwrap();
        assert!(body.z < -1.0);
    }

    #[test]
    fn source_loss_ends_session_and_drops_pointer() {
        let (raycast, scene) = world();
        let mut system = System::new(config(), raycast, scene);
        system.activate().unwrap();
        let id = system.on_source_detected(RIGHT, Handedness::Right, &[InputAdapter::ControllerRay])[0];
        system.push_sample(pose(Vec3::new(0.0, 0.5, 0.0), Quat::identity()));
        system.push_sample(select(true));
        system.frame(0.016);
        assert!(system.manipulation().session(id).is_some());

        system.on_source_lost(RIGHT);
        let events = system.frame(0.016);
        assert!(events.contains(&InteractionEvent::PointerRemoved { pointer: id }));
        assert!(matches!(
            manipulation_events(&events).as_slice(),
            [ManipulationEvent::Ended { canceled: false, .. }]
        ));
        assert!(system.pointer(id).is_none());
        assert!(system.manipulation().sessions().next().is_none());
    }

    #[test]
    fn persisted_pointer_is_reattached() {
        let (raycast, scene) = world();
        let mut system = System::new(config(), raycast, scene);
        system.activate().unwrap();
        let id = system.on_source_detected(RIGHT, Handedness::Right, &[InputAdapter::ControllerRay])[0];
        system.pointer_mut(id).unwrap().persist_on_source_lost = true;

        system.on_source_lost(RIGHT);
        assert_eq!(system.pointer(id).unwrap().source(), None);

        let again = system.on_source_detected(SourceId(11), Handedness::Right, &[InputAdapter::ControllerRay]);
        assert_eq!(again, vec![id]);
        assert_eq!(system.pointer(id).unwrap().source(), Some(SourceId(11)));
    }

    #[test]
    fn deactivate_cancels_sessions() {
        let (raycast, scene) = world();
        let mut system = System::new(config(), raycast, scene);
        system.activate().unwrap();
        let id = system.on_source_detected(RIGHT, Handedness::Right, &[InputAdapter::ControllerRay])[0];
        system.push_sample(pose(Vec3::new(0.0, 0.5, 0.0), Quat::identity()));
        system.push_sample(select(true));
        system.frame(0.016);
        system.push_sample(pose(Vec3::new(1.0, 0.5, 0.0), Quat::identity()));
        system.frame(0.016);

        let events = system.deactivate();
        assert!(manipulation_events(&events).contains(&ManipulationEvent::Ended {
            pointer: id,
            target: CUBE,
            canceled: true
        }));
        let p = system.scene().position(CUBE).unwrap();
        assert_eq!(p, Vec3::new(0.0, 0.5, -3.0));
        assert!(!system.is_active());
    }
}
