/*!
Interaction tunables and tolerances.

These constants are the defaults used by the configuration structs in
[`crate::config`]. Hosts override them per pointer or per application by
deserializing a config; the constants stay the single source of the shipped
values.

Notes
- Distances are in meters, time in seconds, angles in degrees.
- Axis values are normalized to [-1, 1].
- Zones are closed intervals over the absolute axis value.
*/

/// Practical small distance for comparisons (meters).
pub const DIST_EPS: f32 = 1.0e-6;

/// Default pointer length when the source does not supply one (meters).
pub const DEFAULT_POINTER_EXTENT: f32 = 10.0;

// --- Gesture discrimination ---

/// Lower bound of the absolute axis value that starts a rotate candidate.
pub const ROTATION_ZONE_MIN: f32 = 0.5;
pub const ROTATION_ZONE_MAX: f32 = 1.0;

/// Accumulated stick sweep (degrees) required before a rotation tick fires.
pub const ROTATION_ANGLE_ACTIVATION: f32 = 20.0;

/// Absolute `y` window that selects the nudge gesture while pressed.
pub const NUDGE_ZONE_MIN: f32 = 0.25;
pub const NUDGE_ZONE_MAX: f32 = 1.0;

/// Absolute `x` window that selects the scale gesture while pressed.
pub const SCALE_ZONE_MIN: f32 = 0.25;
pub const SCALE_ZONE_MAX: f32 = 1.0;

/// Extent change per nudging frame (meters).
pub const NUDGE_AMOUNT: f32 = 0.01;

/// Closest and farthest an object may be nudged along the pointer (meters).
pub const NUDGE_MIN_EXTENT: f32 = 0.25;
pub const NUDGE_MAX_EXTENT: f32 = 10.0;

/// Geometric scale factor per scaling frame. `x < 0` multiplies, `x > 0` divides.
pub const SCALE_AMOUNT: f32 = 0.99;

/// Smallest and largest per-axis local scale reachable by the scale gesture.
pub const SCALE_MIN: f32 = 0.1;
pub const SCALE_MAX: f32 = 10.0;

// --- Surface snapping ---

/// Sweep hit distance under which the object snaps onto a surface (meters).
pub const SNAP_DISTANCE: f32 = 0.0762;

/// Move distance at or beyond which a snapped object lets go (meters).
pub const UNSNAP_TOLERANCE: f32 = 1.0;

/// Maximum angle between a surface normal and world-up for it to count as a floor (degrees).
pub const SNAP_SURFACE_ANGLE: f32 = 10.0;

/// Extra distance the downward probe reaches below the snapped bottom (meters).
pub const SNAP_PROBE_DISTANCE: f32 = 0.1;

/// Radius of the ball swept along a proposed move (meters).
pub const SWEEP_RADIUS: f32 = 0.05;

/// Separation kept from obstructions when a move is clamped (meters).
pub const DEFAULT_SKIN: f32 = 0.01;

/// Exponential smoothing rate for translation updates (1/s).
pub const SMOOTHING_FACTOR: f32 = 20.0;

// --- Teleport navigation ---

/// Stick magnitude above which the stick is considered deflected.
pub const TELEPORT_INPUT_THRESHOLD: f32 = 0.5;

/// Half-width of the forward cone that requests a teleport (degrees).
pub const TELEPORT_ACTIVATION_ANGLE: f32 = 45.0;

/// Width of the sideways band that rotates the player in place (degrees).
pub const ROTATE_ACTIVATION_ANGLE: f32 = 22.5;

/// Width of the backward band that strafes the player back (degrees).
pub const BACK_STRAFE_ACTIVATION_ANGLE: f32 = 45.0;

/// Yaw applied by one rotate-in-place action (degrees).
pub const ROTATION_AMOUNT: f32 = 90.0;

/// Distance moved by one strafe-back action (meters).
pub const STRAFE_AMOUNT: f32 = 0.25;

/// 1-axis value at or above which a trigger counts as pressed.
pub const PRESS_THRESHOLD: f32 = 0.8;

/// 1-axis value below which a pressed trigger counts as released.
pub const RELEASE_THRESHOLD: f32 = 0.6;

/// Maximum angle from world-up for a default-valid teleport surface (degrees).
pub const TELEPORT_UP_ANGLE: f32 = 30.0;

/// Launch speed of the parabolic teleport arc (m/s).
pub const TELEPORT_ARC_VELOCITY: f32 = 8.0;

/// Gravity bending the teleport arc (m/s^2, positive magnitude).
pub const TELEPORT_ARC_GRAVITY: f32 = 9.81;

/// Number of straight segments approximating the teleport arc.
pub const TELEPORT_ARC_STEPS: usize = 12;

/// Time covered by each arc segment (seconds).
pub const TELEPORT_ARC_STEP_TIME: f32 = 0.08;
