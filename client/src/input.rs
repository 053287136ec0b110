//! Keyboard, mouse and gamepad bindings turned into the core's tagged input samples.
//!
//! Two sources are simulated:
//! - the mouse, whose pointer follows the cursor ray and grabs objects
//! - a "controller" riding the head, whose pointer is the teleport arc

use bevy::{prelude::*, window::PrimaryWindow};
use interaction::{ActionBindings, Handedness, InputSample, InputValue, SourceId, Vec2 as NaVec2};
use leafwing_input_manager::prelude::*;

use crate::{
    camera::Head,
    runtime::{quat_to_na, to_na},
};

pub const MOUSE_SOURCE: SourceId = SourceId(0);
pub const CONTROLLER_SOURCE: SourceId = SourceId(1);

#[derive(Reflect, Actionlike, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputAction {
    Select,
    /// Stick or arrow keys driving rotate/nudge/scale while holding.
    #[actionlike(DualAxis)]
    Manipulate,
    /// Touchpad-style click that turns manipulate into a scale gesture.
    ManipulateClick,
    #[actionlike(DualAxis)]
    Navigate,
    TeleportConfirm,
}

/// Samples gathered this frame, drained by the runtime.
#[derive(Resource, Debug, Default)]
pub struct PendingSamples {
    pub bindings: ActionBindings,
    pub samples: Vec<InputSample>,
}

impl PendingSamples {
    fn push(&mut self, source: SourceId, handedness: Handedness, action: interaction::ActionId, value: InputValue) {
        self.samples
            .push(InputSample::new(source, handedness, action, value));
    }
}

pub(super) fn plugin(app: &mut App) {
    app.add_plugins(InputManagerPlugin::<InputAction>::default());

    app.register_type::<InputAction>();

    let input_map = InputMap::<InputAction>::default()
        .with(InputAction::Select, MouseButton::Left)
        .with(InputAction::Select, GamepadButton::RightTrigger2)
        .with(InputAction::ManipulateClick, MouseButton::Right)
        .with(InputAction::ManipulateClick, GamepadButton::RightThumb)
        .with_dual_axis(InputAction::Manipulate, VirtualDPad::arrow_keys())
        .with_dual_axis(InputAction::Manipulate, GamepadStick::RIGHT)
        .with_dual_axis(InputAction::Navigate, VirtualDPad::wasd())
        .with_dual_axis(InputAction::Navigate, GamepadStick::LEFT)
        .with(InputAction::TeleportConfirm, KeyCode::Space)
        .with(InputAction::TeleportConfirm, GamepadButton::South);
    app.insert_resource(input_map);
    app.insert_resource(ActionState::<InputAction>::default());

    app.init_resource::<PendingSamples>();
    app.add_systems(Update, collect_samples);
}

fn axis(v: Vec2) -> NaVec2 {
    NaVec2::new(v.x, v.y)
}

/// Emit pose, press and axis samples for both simulated sources.
pub(crate) fn collect_samples(
    actions: Res<ActionState<InputAction>>,
    window: Single<&Window, With<PrimaryWindow>>,
    head: Single<(&Camera, &GlobalTransform), With<Head>>,
    mut pending: ResMut<PendingSamples>,
) {
    let bindings = pending.bindings;
    let (camera, head_transform) = *head;

    if let Some(cursor) = window.cursor_position() {
        match camera.viewport_to_world(head_transform, cursor) {
            Ok(ray) => {
                let rotation = Quat::from_rotation_arc(Vec3::NEG_Z, *ray.direction);
                pending.push(
                    MOUSE_SOURCE,
                    Handedness::None,
                    bindings.pointer_pose,
                    InputValue::Pose {
                        position: to_na(ray.origin),
                        rotation: quat_to_na(rotation),
                    },
                );
            }
            Err(err) => debug!("cursor ray unavailable: {err:?}"),
        }
        pending.push(
            MOUSE_SOURCE,
            Handedness::None,
            bindings.select,
            InputValue::Digital(actions.pressed(&InputAction::Select)),
        );
        pending.push(
            MOUSE_SOURCE,
            Handedness::None,
            bindings.manipulate,
            InputValue::Axis2D(axis(actions.axis_pair(&InputAction::Manipulate))),
        );
        pending.push(
            MOUSE_SOURCE,
            Handedness::None,
            bindings.manipulate,
            InputValue::Digital(actions.pressed(&InputAction::ManipulateClick)),
        );
    }

    let (_, rotation, translation) = head_transform.to_scale_rotation_translation();
    pending.push(
        CONTROLLER_SOURCE,
        Handedness::Right,
        bindings.pointer_pose,
        InputValue::Pose {
            position: to_na(translation),
            rotation: quat_to_na(rotation),
        },
    );
    pending.push(
        CONTROLLER_SOURCE,
        Handedness::Right,
        bindings.navigate,
        InputValue::Axis2D(axis(actions.axis_pair(&InputAction::Navigate))),
    );
    if actions.just_pressed(&InputAction::TeleportConfirm)
        || actions.just_released(&InputAction::TeleportConfirm)
    {
        pending.push(
            CONTROLLER_SOURCE,
            Handedness::Right,
            bindings.teleport_confirm,
            InputValue::Digital(actions.pressed(&InputAction::TeleportConfirm)),
        );
    }
}
