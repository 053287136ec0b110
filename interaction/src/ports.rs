/*!
Capability interfaces the core consumes from the host.

The core never owns scene-graph memory. Every read or write of an object's
transform, every scene query and every teleport validation goes through one
of these traits, handed to the components as explicit arguments.
*/

use crate::{
    bitmask_flags::LayerMask,
    error::QueryError,
    teleport::{Hotspot, TeleportValidation},
    types::{Hit, Quat, Ray, TargetId, Transform, Vec3},
};

/// Parameters for a swept-sphere test along a straight line.
#[derive(Clone, Copy, Debug)]
pub struct SweepQuery {
    pub origin: Vec3,
    /// Unit direction of travel. Zero or non-finite makes the query fail.
    pub direction: Vec3,
    pub max_distance: f32,
    pub radius: f32,
    pub layer_mask: LayerMask,
    /// Object excluded from the test, typically the one being moved.
    pub ignore: Option<TargetId>,
}

pub trait RaycastPort {
    /// Nearest hit along `ray` within `max_distance`, restricted to `layer_mask`.
    fn raycast(&self, ray: &Ray, max_distance: f32, layer_mask: LayerMask) -> Option<Hit>;

    /// Nearest obstruction met by a sphere swept along the query.
    ///
    /// `Ok(None)` means the path is clear; `Err` means the sweep could not run.
    fn sweep(&self, query: &SweepQuery) -> Result<Option<Hit>, QueryError>;
}

pub trait SceneTransformPort {
    fn position(&self, target: TargetId) -> Option<Vec3>;
    fn rotation(&self, target: TargetId) -> Option<Quat>;
    fn scale(&self, target: TargetId) -> Option<Vec3>;

    fn set_position(&mut self, target: TargetId, position: Vec3);
    fn set_rotation(&mut self, target: TargetId, rotation: Quat);
    fn set_scale(&mut self, target: TargetId, scale: Vec3);

    /// Whether the object still exists and is enabled.
    fn is_active(&self, target: TargetId) -> bool;

    fn parent(&self, _target: TargetId) -> Option<TargetId> {
        None
    }

    /// Half of the object's world-space bounding height (meters).
    fn half_height(&self, _target: TargetId) -> Option<f32> {
        None
    }

    fn transform(&self, target: TargetId) -> Option<Transform> {
        Some(Transform::new(
            self.position(target)?,
            self.rotation(target)?,
            self.scale(target)?,
        ))
    }

    fn set_transform(&mut self, target: TargetId, transform: Transform) {
        self.set_position(target, transform.position);
        self.set_rotation(target, transform.rotation);
        self.set_scale(target, transform.scale);
    }

    /// True if `target` is `ancestor` or sits below it in the hierarchy.
    fn is_within(&self, target: TargetId, ancestor: TargetId) -> bool {
        let mut current = Some(target);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }
}

/// Decides whether a teleport pointer's hit is an acceptable destination.
pub trait ValidationPort {
    /// Only `Valid` or `Invalid`; `Unknown` is reserved for "no hit".
    fn validate(&self, hit: &Hit, hotspot: Option<&Hotspot>) -> TeleportValidation;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MeshDisplay {
    None,
    #[default]
    Visible,
    Occlusion,
}

/// The spatial-awareness mesh display the manipulation layer overrides while holding.
pub trait SpatialMeshPort {
    fn display(&self) -> MeshDisplay;
    fn set_display(&mut self, display: MeshDisplay);
}

/// Source of tagged input samples, polled once per frame.
pub trait InputPort {
    fn poll(&mut self, out: &mut Vec<crate::input::InputSample>);
}
