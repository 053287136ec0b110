//! Rapier-backed implementation of [`RaycastPort`].
//!
//! Hosts describe their interactable geometry as [`QueryColliderDef`]s. Each one becomes a
//! parentless collider tagged with the owning [`TargetId`] and its [`LayerMask`]. Held
//! objects move by [`RapierQueryWorld::set_pose`]; call [`RapierQueryWorld::refresh`]
//! once per frame after moving things so the broad phase sees the new poses.
//!
//! Queries
//! - Ray casts go through the borrowed `QueryPipeline` (`cast_ray_and_get_normal`).
//! - Sweeps are ball shape casts through the same pipeline.
//! - Layer masks and the sweep's ignored target are applied with a `QueryFilter` predicate.

use std::collections::HashMap;

pub use rapier3d;

use rapier3d::{
    na::Translation3,
    parry::{
        query::{Ray as RapierRay, ShapeCastOptions},
        shape::Ball,
    },
    prelude::*,
};

use crate::{
    bitmask_flags::LayerMask,
    error::QueryError,
    ports::{RaycastPort, SweepQuery},
    settings::DIST_EPS,
    types::{Hit, Quat, Ray, TargetId, Vec3, is_finite_vec},
};

/// Collider description for one scene object.
///
/// Conventions
/// - Units are meters.
/// - For planes the normal is `rotation * +Y` and the plane passes through
///   `translation + normal * offset_along_normal`.
#[derive(Clone, Debug)]
pub struct QueryColliderDef {
    pub target: TargetId,
    pub layers: LayerMask,
    pub translation: Vec3,
    pub rotation: Quat,
    pub shape: ColliderShapeDef,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColliderShapeDef {
    /// Infinite plane (half-space).
    Plane { offset_along_normal: f32 },
    Cuboid { half_extents: Vec3 },
    Sphere { radius: f32 },
    /// Y-aligned capsule.
    CapsuleY { radius: f32, half_height: f32 },
    /// Y-aligned cylinder.
    CylinderY { radius: f32, half_height: f32 },
}

impl ColliderShapeDef {
    /// Half of the shape's vertical extent at identity rotation. Planes have none.
    pub fn half_height(&self) -> Option<f32> {
        match *self {
            ColliderShapeDef::Plane { .. } => None,
            ColliderShapeDef::Cuboid { half_extents } => Some(half_extents.y),
            ColliderShapeDef::Sphere { radius } => Some(radius),
            ColliderShapeDef::CapsuleY {
                radius,
                half_height,
            } => Some(half_height + radius),
            ColliderShapeDef::CylinderY { half_height, .. } => Some(half_height),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Tag {
    target: TargetId,
    layers: LayerMask,
    /// Shape origin along the local +Y axis of the def pose (plane offsets).
    local_offset: f32,
}

/// In-memory rapier structures needed for scene queries.
///
/// Colliders are parentless; the body set stays empty and only exists because the
/// query pipeline borrows one.
pub struct RapierQueryWorld {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    tags: HashMap<ColliderHandle, Tag>,
    handles: HashMap<TargetId, ColliderHandle>,
    modified: Vec<ColliderHandle>,
    removed: Vec<ColliderHandle>,
}

impl Default for RapierQueryWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl RapierQueryWorld {
    pub fn new() -> Self {
        Self {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::default(),
            tags: HashMap::new(),
            handles: HashMap::new(),
            modified: Vec::new(),
            removed: Vec::new(),
        }
    }

    /// Build a ready-to-query world. Definitions are inserted in target order.
    pub fn build(mut defs: Vec<QueryColliderDef>) -> Self {
        defs.sort_by_key(|d| d.target);
        let mut world = Self::new();
        for def in &defs {
            world.insert(def);
        }
        world.refresh();
        world
    }

    /// Add (or replace) the collider of `def.target`.
    pub fn insert(&mut self, def: &QueryColliderDef) -> ColliderHandle {
        self.remove(def.target);

        let local_offset = match def.shape {
            ColliderShapeDef::Plane {
                offset_along_normal,
            } => offset_along_normal,
            _ => 0.0,
        };
        let mut collider = collider_from_def(def);
        collider.set_position(shape_pose(def.translation, def.rotation, local_offset));
        let handle = self.colliders.insert(collider);

        self.tags.insert(
            handle,
            Tag {
                target: def.target,
                layers: def.layers,
                local_offset,
            },
        );
        self.handles.insert(def.target, handle);
        self.mark_modified(handle);
        handle
    }

    pub fn remove(&mut self, target: TargetId) -> bool {
        let Some(handle) = self.handles.remove(&target) else {
            return false;
        };
        self.tags.remove(&handle);
        self.colliders
            .remove(handle, &mut IslandManager::new(), &mut self.bodies, false);
        self.modified.retain(|h| *h != handle);
        self.removed.push(handle);
        true
    }

    pub fn contains(&self, target: TargetId) -> bool {
        self.handles.contains_key(&target)
    }

    /// Move the collider of `target`. Takes effect for queries after [`Self::refresh`].
    pub fn set_pose(&mut self, target: TargetId, translation: Vec3, rotation: Quat) {
        if !is_finite_vec(&translation) {
            log::warn!("ignoring non-finite pose for {:?}", target);
            return;
        }
        let Some(&handle) = self.handles.get(&target) else {
            return;
        };
        let local_offset = self.tags.get(&handle).map_or(0.0, |t| t.local_offset);
        if let Some(collider) = self.colliders.get_mut(handle) {
            collider.set_position(shape_pose(translation, rotation, local_offset));
            self.mark_modified(handle);
        }
    }

    /// Push pending inserts, moves and removals into the broad phase BVH.
    pub fn refresh(&mut self) {
        if self.modified.is_empty() && self.removed.is_empty() {
            return;
        }

        let mut events = Vec::new();
        self.broad_phase.update(
            &IntegrationParameters::default(),
            &self.colliders,
            &self.bodies,
            &self.modified,
            &self.removed,
            &mut events,
        );
        self.modified.clear();
        self.removed.clear();
    }

    fn mark_modified(&mut self, handle: ColliderHandle) {
        if !self.modified.contains(&handle) {
            self.modified.push(handle);
        }
    }

    fn query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }

    fn accepts(&self, handle: ColliderHandle, mask: LayerMask, ignore: Option<TargetId>) -> bool {
        self.tags
            .get(&handle)
            .is_some_and(|t| t.layers.intersects(mask) && Some(t.target) != ignore)
    }
}

impl RaycastPort for RapierQueryWorld {
    fn raycast(&self, ray: &Ray, max_distance: f32, layer_mask: LayerMask) -> Option<Hit> {
        if !(max_distance.is_finite() && max_distance > 0.0) {
            return None;
        }
        let predicate = |handle: ColliderHandle, _: &Collider| self.accepts(handle, layer_mask, None);
        let pipeline = self.query_pipeline(QueryFilter::new().predicate(&predicate));

        let rapier_ray = RapierRay::new(ray.origin.into(), ray.direction);
        let (handle, hit) = pipeline.cast_ray_and_get_normal(&rapier_ray, max_distance, true)?;
        let tag = self.tags.get(&handle)?;

        Some(Hit {
            point: ray.point_at(hit.time_of_impact),
            normal: hit.normal,
            distance: hit.time_of_impact,
            target: tag.target,
        })
    }

    fn sweep(&self, query: &SweepQuery) -> Result<Option<Hit>, QueryError> {
        if !is_finite_vec(&query.origin) || !query.max_distance.is_finite() || !query.radius.is_finite()
        {
            return Err(QueryError::NonFinite);
        }
        if !is_finite_vec(&query.direction) || query.direction.norm() <= DIST_EPS {
            return Err(QueryError::DegenerateDirection);
        }
        let direction = query.direction.normalize();
        let radius = query.radius.max(DIST_EPS);

        let predicate = |handle: ColliderHandle, _: &Collider| {
            self.accepts(handle, query.layer_mask, query.ignore)
        };
        let pipeline = self.query_pipeline(QueryFilter::new().predicate(&predicate));

        let ball = Ball::new(radius);
        let start = Isometry::translation(query.origin.x, query.origin.y, query.origin.z);
        let mut options = ShapeCastOptions::with_max_time_of_impact(query.max_distance.max(0.0));
        options.stop_at_penetration = false;

        let Some((handle, hit)) = pipeline.cast_shape(&start, &direction, &ball, options) else {
            return Ok(None);
        };
        let Some(tag) = self.tags.get(&handle) else {
            return Ok(None);
        };

        // normal1 is on the moving ball; the surface normal must oppose the motion.
        let mut normal = -hit.normal1.into_inner();
        if normal.dot(&direction) > 0.0 {
            normal = -normal;
        }
        let center = query.origin + direction * hit.time_of_impact;

        Ok(Some(Hit {
            point: center - normal * radius,
            normal,
            distance: hit.time_of_impact,
            target: tag.target,
        }))
    }
}

/// World pose of a parentless collider whose shape sits `local_offset` along the def's +Y.
fn shape_pose(translation: Vec3, rotation: Quat, local_offset: f32) -> Isometry<f32> {
    let origin = translation + rotation * (Vector::y() * local_offset);
    Isometry::from_parts(Translation3::from(origin), rotation)
}

/// Build a rapier collider for a definition. The pose is applied by the caller.
fn collider_from_def(def: &QueryColliderDef) -> Collider {
    match def.shape {
        ColliderShapeDef::Plane { .. } => {
            // Local frame: the collider pose carries the rotation, so the normal is +Y here.
            let halfspace = HalfSpace::new(Vector::y_axis());
            ColliderBuilder::new(SharedShape::new(halfspace)).build()
        }
        ColliderShapeDef::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z).build()
        }
        ColliderShapeDef::Sphere { radius } => ColliderBuilder::ball(radius).build(),
        ColliderShapeDef::CapsuleY {
            radius,
            half_height,
        } => ColliderBuilder::capsule_y(half_height, radius).build(),
        ColliderShapeDef::CylinderY {
            radius,
            half_height,
        } => ColliderBuilder::cylinder(half_height, radius).build(),
    }
}
