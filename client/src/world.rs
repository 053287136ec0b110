use bevy::prelude::*;
use interaction::{ColliderShapeDef, Layer, LayerMask, TargetId};

use crate::runtime::{QueryShape, SceneTarget, SpatialMesh, TeleportHotspot, to_na};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, setup);
}

const FLOOR: TargetId = TargetId(10);
const TABLE: TargetId = TargetId(11);
const SCAN_WALL: TargetId = TargetId(12);
const PAD: TargetId = TargetId(30);

const TABLE_HALF: Vec3 = Vec3::new(0.6, 0.4, 0.4);
const CUBE_HALF: f32 = 0.15;

fn cuboid(half: Vec3) -> ColliderShapeDef {
    ColliderShapeDef::Cuboid {
        half_extents: to_na(half),
    }
}

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    info!("World setup");

    commands.spawn((
        SceneTarget(FLOOR),
        QueryShape {
            layers: LayerMask::from_flags(&[
                Layer::Default,
                Layer::TeleportSurface,
                Layer::SpatialAwareness,
            ]),
            shape: ColliderShapeDef::Plane {
                offset_along_normal: 0.0,
            },
        },
        Transform::default(),
        Mesh3d(meshes.add(Plane3d::default().mesh().size(50., 50.).build())),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::linear_rgb(0.2, 0.3, 0.25),
            perceptual_roughness: 1.0,
            metallic: 0.0,
            ..default()
        })),
    ));

    commands.spawn((
        SceneTarget(TABLE),
        QueryShape {
            layers: LayerMask::from_flags(&[Layer::Default, Layer::TeleportSurface]),
            shape: cuboid(TABLE_HALF),
        },
        Transform::from_xyz(1.5, TABLE_HALF.y, -2.0),
        Mesh3d(meshes.add(Cuboid::from_size(TABLE_HALF * 2.0))),
        MeshMaterial3d(materials.add(Color::srgb_u8(150, 110, 80))),
    ));

    // Stand-in for a room scan; hidden while an object is held.
    commands.spawn((
        SceneTarget(SCAN_WALL),
        SpatialMesh,
        QueryShape {
            layers: LayerMask::from_flags(&[Layer::SpatialAwareness]),
            shape: cuboid(Vec3::new(4.0, 1.5, 0.05)),
        },
        Transform::from_xyz(0.0, 1.5, -5.0),
        Mesh3d(meshes.add(Cuboid::new(8.0, 3.0, 0.1))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgba(0.6, 0.8, 1.0, 0.25),
            alpha_mode: AlphaMode::Blend,
            ..default()
        })),
    ));

    commands.spawn((
        SceneTarget(PAD),
        TeleportHotspot {
            yaw_degrees: Some(90.0),
        },
        QueryShape {
            layers: LayerMask::from_flags(&[Layer::Hotspot, Layer::TeleportSurface]),
            shape: ColliderShapeDef::CylinderY {
                radius: 0.5,
                half_height: 0.01,
            },
        },
        Transform::from_xyz(-2.0, 0.01, -3.0),
        Mesh3d(meshes.add(Cylinder::new(0.5, 0.02))),
        MeshMaterial3d(materials.add(Color::srgb_u8(240, 200, 60))),
    ));

    let cube_mesh = meshes.add(Cuboid::from_length(CUBE_HALF * 2.0));
    let cube_material = materials.add(Color::srgb_u8(124, 144, 255));
    let cubes = [
        Vec3::new(-0.5, CUBE_HALF, -1.5),
        Vec3::new(0.3, CUBE_HALF, -1.0),
        Vec3::new(1.5, TABLE_HALF.y * 2.0 + CUBE_HALF, -2.0),
    ];
    for (i, position) in cubes.into_iter().enumerate() {
        commands.spawn((
            SceneTarget(TargetId(20 + i as u64)),
            QueryShape {
                layers: LayerMask::from_flags(&[Layer::Default, Layer::Interactable]),
                shape: cuboid(Vec3::splat(CUBE_HALF)),
            },
            Transform::from_translation(position),
            Mesh3d(cube_mesh.clone()),
            MeshMaterial3d(cube_material.clone()),
        ));
    }

    commands.spawn((
        PointLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4.0, 8.0, 4.0),
    ));
}
