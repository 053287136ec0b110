use bevy::{camera::Exposure, prelude::*};

use crate::runtime::{BODY_TARGET, HEAD_TARGET, SceneTarget};

/// Tracked head of the player rig; the render camera.
#[derive(Component)]
pub struct Head;

/// Rig root moved by teleport, turn and strafe.
#[derive(Component)]
pub struct RigBody;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, spawn_rig);
}

/// Standing eye height above the rig origin.
const HEAD_HEIGHT: f32 = 1.6;
const HEAD_PITCH_DEGREES: f32 = -20.0;

fn spawn_rig(mut commands: Commands) {
    commands.spawn((
        RigBody,
        SceneTarget(BODY_TARGET),
        Transform::from_xyz(0.0, 0.0, 2.0),
        Visibility::default(),
        children![(
            Head,
            SceneTarget(HEAD_TARGET),
            Camera3d::default(),
            Exposure { ev100: 9.7 },
            bevy::core_pipeline::tonemapping::Tonemapping::AcesFitted,
            Transform::from_xyz(0.0, HEAD_HEIGHT, 0.0)
                .with_rotation(Quat::from_rotation_x(HEAD_PITCH_DEGREES.to_radians())),
            DistanceFog {
                color: Color::srgba(0.35, 0.48, 0.66, 1.0),
                directional_light_color: Color::srgba(1.0, 0.95, 0.85, 0.5),
                directional_light_exponent: 30.0,
                falloff: FogFalloff::from_visibility_colors(
                    60.0,
                    Color::srgb(0.35, 0.5, 0.66),
                    Color::srgb(0.8, 0.8, 0.7),
                ),
            },
        )],
    ));
}
