//! Bevy host for the interaction core.
//!
//! The [`InteractionSystem`] lives in a non-send resource. Each frame:
//! 1. `track_sources` attaches or drops the mouse source as the cursor enters or leaves.
//! 2. `pull_scene` mirrors entity world transforms into [`SceneMirror`].
//! 3. `run_frame` feeds the sampled input, advances the core and writes every transform it
//!    touched back onto entities and the rapier query world.

use std::{
    cell::Cell,
    collections::{HashMap, HashSet},
    rc::Rc,
};

use bevy::{prelude::*, window::PrimaryWindow};
use interaction::{
    ColliderShapeDef, Handedness, Hotspot, InputAdapter, InteractionConfig, InteractionEvent,
    InteractionSystem, Layer, LayerMask, ManipulationEvent, MeshDisplay, PlayerRig, ProviderId,
    QueryColliderDef, RapierQueryWorld, SceneTransformPort, SpatialMeshPort, SurfaceValidator,
    TargetId, TeleportEvent,
};
use nalgebra as na;

use crate::input::{CONTROLLER_SOURCE, MOUSE_SOURCE, PendingSamples, collect_samples};

pub const BODY_TARGET: TargetId = TargetId(1);
pub const HEAD_TARGET: TargetId = TargetId(2);
const LOCOMOTION: ProviderId = ProviderId(1);

/// Ties an entity to the core's target handle.
#[derive(Component, Clone, Copy, Debug)]
pub struct SceneTarget(pub TargetId);

/// Query geometry registered with the rapier world at startup (unscaled).
#[derive(Component, Clone, Copy, Debug)]
pub struct QueryShape {
    pub layers: LayerMask,
    pub shape: ColliderShapeDef,
}

#[derive(Component, Clone, Copy, Debug)]
pub struct TeleportHotspot {
    pub yaw_degrees: Option<f32>,
}

/// Geometry standing in for the spatial-awareness mesh.
#[derive(Component)]
pub struct SpatialMesh;

#[derive(Message, Clone, Debug)]
pub struct InteractionMessage(pub InteractionEvent);

#[inline]
pub fn to_na(v: Vec3) -> interaction::Vec3 {
    interaction::Vec3::new(v.x, v.y, v.z)
}

#[inline]
pub fn from_na(v: &interaction::Vec3) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

#[inline]
pub fn quat_to_na(q: Quat) -> interaction::Quat {
    na::UnitQuaternion::new_normalize(na::Quaternion::new(q.w, q.x, q.y, q.z))
}

#[inline]
pub fn quat_from_na(q: &interaction::Quat) -> Quat {
    let c = q.coords;
    Quat::from_xyzw(c.x, c.y, c.z, c.w)
}

struct MirrorEntry {
    transform: interaction::Transform,
    half_height: Option<f32>,
    parent: Option<TargetId>,
    active: bool,
}

/// World-space copy of every [`SceneTarget`], written back through the dirty set.
#[derive(Default)]
pub struct SceneMirror {
    entries: HashMap<TargetId, MirrorEntry>,
    dirty: HashSet<TargetId>,
}

impl SceneMirror {
    /// Refresh a target from the ECS. Targets written this frame keep the core's value.
    fn track(&mut self, target: TargetId, entry: MirrorEntry) {
        if !self.dirty.contains(&target) {
            self.entries.insert(target, entry);
        }
    }

    fn take_dirty(&mut self) -> Vec<(TargetId, interaction::Transform)> {
        let mut out: Vec<_> = self
            .dirty
            .drain()
            .filter_map(|t| self.entries.get(&t).map(|e| (t, e.transform)))
            .collect();
        out.sort_by_key(|(t, _)| *t);
        out
    }

    fn entry_mut(&mut self, target: TargetId) -> Option<&mut MirrorEntry> {
        let entry = self.entries.get_mut(&target);
        if entry.is_some() {
            self.dirty.insert(target);
        } else {
            warn!("write to unknown target {target:?}");
        }
        entry
    }
}

impl SceneTransformPort for SceneMirror {
    fn position(&self, target: TargetId) -> Option<interaction::Vec3> {
        self.entries.get(&target).map(|e| e.transform.position)
    }

    fn rotation(&self, target: TargetId) -> Option<interaction::Quat> {
        self.entries.get(&target).map(|e| e.transform.rotation)
    }

    fn scale(&self, target: TargetId) -> Option<interaction::Vec3> {
        self.entries.get(&target).map(|e| e.transform.scale)
    }

    fn set_position(&mut self, target: TargetId, position: interaction::Vec3) {
        if let Some(entry) = self.entry_mut(target) {
            entry.transform.position = position;
        }
    }

    fn set_rotation(&mut self, target: TargetId, rotation: interaction::Quat) {
        if let Some(entry) = self.entry_mut(target) {
            entry.transform.rotation = rotation;
        }
    }

    fn set_scale(&mut self, target: TargetId, scale: interaction::Vec3) {
        if let Some(entry) = self.entry_mut(target) {
            entry.transform.scale = scale;
        }
    }

    fn is_active(&self, target: TargetId) -> bool {
        self.entries.get(&target).is_some_and(|e| e.active)
    }

    fn parent(&self, target: TargetId) -> Option<TargetId> {
        self.entries.get(&target).and_then(|e| e.parent)
    }

    fn half_height(&self, target: TargetId) -> Option<f32> {
        self.entries.get(&target).and_then(|e| e.half_height)
    }
}

/// Spatial-mesh display shared between the core and the ECS.
#[derive(Clone, Default)]
struct SharedMeshDisplay(Rc<Cell<MeshDisplay>>);

impl SpatialMeshPort for SharedMeshDisplay {
    fn display(&self) -> MeshDisplay {
        self.0.get()
    }

    fn set_display(&mut self, display: MeshDisplay) {
        self.0.set(display);
    }
}

pub struct InteractionRuntime {
    pub system: InteractionSystem<RapierQueryWorld, SceneMirror>,
    entities: HashMap<TargetId, Entity>,
    shapes: HashMap<TargetId, (QueryShape, interaction::Vec3)>,
    mesh_display: SharedMeshDisplay,
    mouse_present: bool,
}

impl InteractionRuntime {
    fn new(config: InteractionConfig) -> Self {
        let mesh_display = SharedMeshDisplay::default();
        let system = InteractionSystem::new(config, RapierQueryWorld::new(), SceneMirror::default())
            .with_validation(SurfaceValidator::default())
            .with_spatial_mesh(mesh_display.clone())
            .with_rig(PlayerRig {
                body: BODY_TARGET,
                head: HEAD_TARGET,
            })
            .with_provider(LOCOMOTION);
        Self {
            system,
            entities: HashMap::new(),
            shapes: HashMap::new(),
            mesh_display,
            mouse_present: false,
        }
    }
}

pub(super) fn plugin(app: &mut App) {
    app.add_message::<InteractionMessage>();
    app.insert_non_send_resource(InteractionRuntime::new(InteractionConfig::default()));
    app.add_systems(PostStartup, (register_scene, activate).chain());
    app.add_systems(
        Update,
        (track_sources, pull_scene, run_frame, apply_mesh_display)
            .chain()
            .after(collect_samples),
    );
    app.add_systems(Update, (log_events, draw_pointers).after(run_frame));
}

/// Scale a collider shape the way rendering scales the mesh.
fn scaled_shape(shape: ColliderShapeDef, scale: &interaction::Vec3) -> ColliderShapeDef {
    let radial = scale.x.abs().max(scale.z.abs());
    match shape {
        ColliderShapeDef::Plane { .. } => shape,
        ColliderShapeDef::Cuboid { half_extents } => ColliderShapeDef::Cuboid {
            half_extents: half_extents.component_mul(&scale.abs()),
        },
        ColliderShapeDef::Sphere { radius } => ColliderShapeDef::Sphere {
            radius: radius * scale.abs().max(),
        },
        ColliderShapeDef::CapsuleY {
            radius,
            half_height,
        } => ColliderShapeDef::CapsuleY {
            radius: radius * radial,
            half_height: half_height * scale.y.abs(),
        },
        ColliderShapeDef::CylinderY {
            radius,
            half_height,
        } => ColliderShapeDef::CylinderY {
            radius: radius * radial,
            half_height: half_height * scale.y.abs(),
        },
    }
}

fn register_scene(
    mut runtime: NonSendMut<InteractionRuntime>,
    targets: Query<(
        Entity,
        &SceneTarget,
        &Transform,
        Option<&QueryShape>,
        Option<&TeleportHotspot>,
    )>,
) {
    let runtime = &mut *runtime;
    for (entity, target, transform, shape, hotspot) in &targets {
        let target = target.0;
        runtime.entities.insert(target, entity);

        if let Some(shape) = shape {
            let scale = to_na(transform.scale);
            runtime.system.raycast_mut().insert(&QueryColliderDef {
                target,
                layers: shape.layers,
                translation: to_na(transform.translation),
                rotation: quat_to_na(transform.rotation),
                shape: scaled_shape(shape.shape, &scale),
            });
            runtime.shapes.insert(target, (*shape, scale));
        }

        if let Some(hotspot) = hotspot {
            runtime.system.add_hotspot(Hotspot {
                target,
                position: to_na(transform.translation),
                override_orientation: hotspot.yaw_degrees.is_some(),
                yaw_degrees: hotspot.yaw_degrees.unwrap_or_default(),
                is_active: true,
            });
        }
    }
    runtime.system.raycast_mut().refresh();
    info!("registered {} scene targets", runtime.entities.len());
}

fn activate(mut runtime: NonSendMut<InteractionRuntime>) {
    let system = &mut runtime.system;
    if let Err(err) = system.activate() {
        error!("interaction system failed to activate: {err}");
        return;
    }
    let arc = system.teleport_adapter();
    system.on_source_detected(CONTROLLER_SOURCE, Handedness::Right, &[arc]);
}

fn track_sources(
    mut runtime: NonSendMut<InteractionRuntime>,
    window: Single<&Window, With<PrimaryWindow>>,
) {
    if !runtime.system.is_active() {
        return;
    }
    let present = window.cursor_position().is_some();
    if present == runtime.mouse_present {
        return;
    }
    runtime.mouse_present = present;
    if present {
        let ids = runtime
            .system
            .on_source_detected(MOUSE_SOURCE, Handedness::None, &[InputAdapter::Mouse]);
        // The mouse only grabs; scenery stays out of its reach.
        for id in ids {
            if let Some(pointer) = runtime.system.pointer_mut(id) {
                pointer.layer_mask = LayerMask::from_flags(&[Layer::Interactable, Layer::Ui]);
            }
        }
    } else {
        runtime.system.on_source_lost(MOUSE_SOURCE);
    }
}

fn pull_scene(
    mut runtime: NonSendMut<InteractionRuntime>,
    targets: Query<(
        &SceneTarget,
        &GlobalTransform,
        Option<&InheritedVisibility>,
        Option<&ChildOf>,
        Option<&QueryShape>,
    )>,
    parents: Query<&SceneTarget>,
) {
    let mirror = runtime.system.scene_mut();
    for (target, global, visibility, child_of, shape) in &targets {
        let (scale, rotation, translation) = global.to_scale_rotation_translation();
        let half_height = shape
            .and_then(|s| s.shape.half_height())
            .map(|h| h * scale.y.abs());
        mirror.track(
            target.0,
            MirrorEntry {
                transform: interaction::Transform::new(
                    to_na(translation),
                    quat_to_na(rotation),
                    to_na(scale),
                ),
                half_height,
                parent: child_of.and_then(|c| parents.get(c.parent()).ok().map(|p| p.0)),
                active: visibility.is_none_or(|v| v.get()),
            },
        );
    }
}

fn run_frame(
    mut runtime: NonSendMut<InteractionRuntime>,
    mut pending: ResMut<PendingSamples>,
    time: Res<Time>,
    mut transforms: Query<&mut Transform>,
    globals: Query<&GlobalTransform>,
    parents: Query<&ChildOf>,
    mut messages: MessageWriter<InteractionMessage>,
) {
    let runtime = &mut *runtime;
    for sample in pending.samples.drain(..) {
        runtime.system.push_sample(sample);
    }

    let events = runtime.system.frame(time.delta_secs());
    messages.write_batch(events.into_iter().map(InteractionMessage));

    let dirty = runtime.system.scene_mut().take_dirty();
    if dirty.is_empty() {
        return;
    }

    for (target, moved) in dirty {
        let Some(&entity) = runtime.entities.get(&target) else {
            continue;
        };
        let world = Transform {
            translation: from_na(&moved.position),
            rotation: quat_from_na(&moved.rotation),
            scale: from_na(&moved.scale),
        };
        let local = match parents.get(entity).and_then(|c| globals.get(c.parent())) {
            Ok(parent) => GlobalTransform::from(world).reparented_to(parent),
            Err(_) => world,
        };
        if let Ok(mut transform) = transforms.get_mut(entity) {
            *transform = local;
        }

        let queries = runtime.system.raycast_mut();
        if !queries.contains(target) {
            continue;
        }
        match runtime.shapes.get_mut(&target) {
            Some((shape, scale)) if (*scale - moved.scale).norm() > f32::EPSILON => {
                *scale = moved.scale;
                queries.remove(target);
                queries.insert(&QueryColliderDef {
                    target,
                    layers: shape.layers,
                    translation: moved.position,
                    rotation: moved.rotation,
                    shape: scaled_shape(shape.shape, &moved.scale),
                });
            }
            _ => queries.set_pose(target, moved.position, moved.rotation),
        }
    }
    runtime.system.raycast_mut().refresh();
}

fn apply_mesh_display(
    runtime: NonSend<InteractionRuntime>,
    mut meshes: Query<&mut Visibility, With<SpatialMesh>>,
) {
    let visibility = match runtime.mesh_display.display() {
        MeshDisplay::Visible => Visibility::Inherited,
        MeshDisplay::Occlusion | MeshDisplay::None => Visibility::Hidden,
    };
    for mut current in &mut meshes {
        current.set_if_neq(visibility);
    }
}

fn log_events(mut messages: MessageReader<InteractionMessage>) {
    for InteractionMessage(event) in messages.read() {
        match event {
            InteractionEvent::Manipulation(ManipulationEvent::Started { pointer, target }) => {
                info!("{pointer:?} grabbed {target:?}");
            }
            InteractionEvent::Manipulation(ManipulationEvent::Ended {
                target, canceled, ..
            }) => {
                info!("released {target:?} (canceled: {canceled})");
            }
            InteractionEvent::Teleport {
                event: TeleportEvent::Completed { destination },
                ..
            } => {
                info!("teleported to {destination:?}");
            }
            other => debug!("{other:?}"),
        }
    }
}

fn draw_pointers(runtime: NonSend<InteractionRuntime>, mut gizmos: Gizmos) {
    let system = &runtime.system;
    for pointer in system.pointers() {
        let result = pointer.result();
        let held = system.manipulation().session(pointer.id()).is_some();
        let color = match (held, result.target) {
            (true, _) => Color::srgb(1.0, 0.8, 0.2),
            (false, Some(_)) => Color::srgb(0.3, 1.0, 0.4),
            (false, None) => Color::srgb(0.8, 0.8, 0.8),
        };

        let steps = pointer.ray_steps();
        let last = if result.target.is_some() {
            result.ray_step_index.min(steps.len().saturating_sub(1))
        } else {
            steps.len().saturating_sub(1)
        };
        for (i, step) in steps.iter().enumerate().take(last + 1) {
            let end = if i == last { result.point } else { step.terminus };
            gizmos.line(from_na(&step.origin), from_na(&end), color);
        }

        if let Some(validation) = system
            .navigator(pointer.id())
            .filter(|nav| nav.is_armed())
            .map(|nav| nav.validation())
        {
            let ring = match validation {
                interaction::TeleportValidation::Valid => Color::srgb(0.2, 0.6, 1.0),
                _ => Color::srgb(1.0, 0.2, 0.2),
            };
            gizmos.circle(
                Isometry3d::new(
                    from_na(&result.point),
                    Quat::from_rotation_arc(Vec3::Z, Vec3::Y),
                ),
                0.3,
                ring,
            );
        }
    }
}
