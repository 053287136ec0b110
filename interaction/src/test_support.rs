//! In-memory fakes of the host ports for unit tests.

use std::collections::HashMap;

use crate::{
    bitmask_flags::LayerMask,
    error::QueryError,
    ports::{MeshDisplay, RaycastPort, SceneTransformPort, SpatialMeshPort, SweepQuery},
    types::{Hit, Quat, Ray, TargetId, Transform, Vec3, is_finite_vec},
};

const EPS: f32 = 1.0e-6;

/// Axis-aligned box obstacle.
#[derive(Clone, Copy, Debug)]
pub struct Block {
    pub target: TargetId,
    pub min: Vec3,
    pub max: Vec3,
}

impl Block {
    pub fn cube(target: TargetId, center: Vec3, half: f32) -> Self {
        Self {
            target,
            min: center - Vec3::repeat(half),
            max: center + Vec3::repeat(half),
        }
    }

    /// Slab test; returns entry distance and the face normal.
    fn intersect(&self, ray: &Ray, inflate: f32, max_distance: f32) -> Option<(f32, Vec3)> {
        let min = self.min - Vec3::repeat(inflate);
        let max = self.max + Vec3::repeat(inflate);
        let mut t_enter = 0.0f32;
        let mut t_exit = max_distance;
        let mut normal = Vec3::zeros();

        for axis in 0..3 {
            let o = ray.origin[axis];
            let d = ray.direction[axis];
            if d.abs() < EPS {
                if o < min[axis] || o > max[axis] {
                    return None;
                }
                continue;
            }
            let mut t0 = (min[axis] - o) / d;
            let mut t1 = (max[axis] - o) / d;
            let mut n = Vec3::zeros();
            n[axis] = -1.0;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
                n[axis] = 1.0;
            }
            if t0 > t_enter {
                t_enter = t0;
                normal = n;
            }
            t_exit = t_exit.min(t1);
            if t_enter > t_exit {
                return None;
            }
        }
        Some((t_enter, normal))
    }
}

/// A horizontal floor at `height` plus optional boxes.
#[derive(Clone, Debug)]
pub struct FlatFloor {
    pub height: f32,
    pub target: TargetId,
    pub blocks: Vec<Block>,
    /// Makes every sweep report a failure.
    pub broken_sweeps: bool,
}

impl FlatFloor {
    pub fn new(height: f32, target: TargetId) -> Self {
        Self {
            height,
            target,
            blocks: Vec::new(),
            broken_sweeps: false,
        }
    }

    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    fn nearest(
        &self,
        ray: &Ray,
        max_distance: f32,
        radius: f32,
        ignore: Option<TargetId>,
    ) -> Option<Hit> {
        let mut best: Option<Hit> = None;
        let mut consider = |hit: Hit| {
            if best.as_ref().is_none_or(|b| hit.distance < b.distance) {
                best = Some(hit);
            }
        };

        if ray.direction.y < -EPS && ignore != Some(self.target) {
            let t = (self.height + radius - ray.origin.y) / ray.direction.y;
            if (0.0..=max_distance).contains(&t) {
                let normal = Vec3::new(0.0, 1.0, 0.0);
                consider(Hit {
                    point: ray.point_at(t) - normal * radius,
                    normal,
                    distance: t,
                    target: self.target,
                });
            }
        }

        for block in &self.blocks {
            if ignore == Some(block.target) {
                continue;
            }
            if let Some((t, normal)) = block.intersect(ray, radius, max_distance) {
                consider(Hit {
                    point: ray.point_at(t) - normal * radius,
                    normal,
                    distance: t,
                    target: block.target,
                });
            }
        }
        best
    }
}

impl RaycastPort for FlatFloor {
    fn raycast(&self, ray: &Ray, max_distance: f32, layer_mask: LayerMask) -> Option<Hit> {
        if layer_mask == LayerMask::none() {
            return None;
        }
        self.nearest(ray, max_distance, 0.0, None)
    }

    fn sweep(&self, query: &SweepQuery) -> Result<Option<Hit>, QueryError> {
        if self.broken_sweeps {
            return Err(QueryError::NonFinite);
        }
        let ray = Ray::new(query.origin, query.direction).ok_or(QueryError::DegenerateDirection)?;
        Ok(self.nearest(&ray, query.max_distance, query.radius, query.ignore))
    }
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    transform: Transform,
    active: bool,
    parent: Option<TargetId>,
    half_height: f32,
}

/// Hash-map backed scene.
#[derive(Default, Debug)]
pub struct MemoryScene {
    entries: HashMap<TargetId, Entry>,
}

impl MemoryScene {
    pub fn insert(&mut self, target: TargetId, transform: Transform, half_height: f32) {
        self.entries.insert(
            target,
            Entry {
                transform,
                active: true,
                parent: None,
                half_height,
            },
        );
    }

    pub fn set_active(&mut self, target: TargetId, active: bool) {
        if let Some(e) = self.entries.get_mut(&target) {
            e.active = active;
        }
    }

    pub fn set_parent(&mut self, target: TargetId, parent: TargetId) {
        if let Some(e) = self.entries.get_mut(&target) {
            e.parent = Some(parent);
        }
    }
}

impl SceneTransformPort for MemoryScene {
    fn position(&self, target: TargetId) -> Option<Vec3> {
        self.entries.get(&target).map(|e| e.transform.position)
    }

    fn rotation(&self, target: TargetId) -> Option<Quat> {
        self.entries.get(&target).map(|e| e.transform.rotation)
    }

    fn scale(&self, target: TargetId) -> Option<Vec3> {
        self.entries.get(&target).map(|e| e.transform.scale)
    }

    fn set_position(&mut self, target: TargetId, position: Vec3) {
        assert!(is_finite_vec(&position), "non-finite position written");
        if let Some(e) = self.entries.get_mut(&target) {
            e.transform.position = position;
        }
    }

    fn set_rotation(&mut self, target: TargetId, rotation: Quat) {
        if let Some(e) = self.entries.get_mut(&target) {
            e.transform.rotation = rotation;
        }
    }

    fn set_scale(&mut self, target: TargetId, scale: Vec3) {
        if let Some(e) = self.entries.get_mut(&target) {
            e.transform.scale = scale;
        }
    }

    fn is_active(&self, target: TargetId) -> bool {
        self.entries.get(&target).is_some_and(|e| e.active)
    }

    fn parent(&self, target: TargetId) -> Option<TargetId> {
        self.entries.get(&target).and_then(|e| e.parent)
    }

    fn half_height(&self, target: TargetId) -> Option<f32> {
        self.entries.get(&target).map(|e| e.half_height)
    }
}

#[derive(Debug, Default)]
pub struct FakeMesh {
    pub display: MeshDisplay,
}

impl SpatialMeshPort for FakeMesh {
    fn display(&self) -> MeshDisplay {
        self.display
    }

    fn set_display(&mut self, display: MeshDisplay) {
        self.display = display;
    }
}
