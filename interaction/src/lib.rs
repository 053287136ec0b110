pub mod bitmask_flags;
pub mod config;
pub mod error;
pub mod focus_lock;
pub mod gesture;
pub mod input;
pub mod manipulation;
pub mod pointer;
pub mod ports;
pub mod rapier_world;
pub mod settings;
pub mod snap;
pub mod system;
pub mod teleport;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use bitmask_flags::{Layer, LayerMask, default_raycast_mask};
pub use config::InteractionConfig;
pub use error::{InteractionError, PointerError, QueryError};
pub use focus_lock::{FocusLock, FocusLockController};
pub use gesture::{
    ActiveGesture, GestureConfig, GestureDelta, GestureDiscriminator, GestureFrame, GestureInput,
    GestureState,
};
pub use input::{ActionBindings, ActionId, InputAdapter, InputSample, InputValue, TeleportArc};
pub use manipulation::{
    ManipulationConfig, ManipulationController, ManipulationEvent, ManipulationPorts,
    ManipulationSession,
};
pub use pointer::{Pointer, PointerBehavior, PointerResult};
pub use ports::{
    InputPort, MeshDisplay, RaycastPort, SceneTransformPort, SpatialMeshPort, SweepQuery,
    ValidationPort,
};
pub use rapier_world::{ColliderShapeDef, QueryColliderDef, RapierQueryWorld};
pub use snap::{SnapConfig, SnapEngine, SnapOutcome, SnapState};
pub use system::{InteractionEvent, InteractionSystem};
pub use teleport::{
    ConfirmMode, Hotspot, PlayerRig, ProviderId, SurfaceValidator, TeleportConfig, TeleportEvent,
    TeleportNavigator, TeleportValidation,
};
pub use types::{Handedness, Hit, PointerId, Quat, Ray, RayStep, SourceId, TargetId, Transform, Vec2, Vec3};
