//! Top-level runtime configuration.
//!
//! Every section defaults from `settings` and deserializes with `#[serde(default)]`, so a
//! host file only needs the values it overrides.

use serde::{Deserialize, Serialize};

use crate::{
    error::InteractionError,
    input::{ActionBindings, TeleportArc},
    manipulation::ManipulationConfig,
    settings::{DEFAULT_POINTER_EXTENT, PRESS_THRESHOLD, RELEASE_THRESHOLD},
    teleport::TeleportConfig,
};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    pub bindings: ActionBindings,
    /// Initial extent of newly created pointers (meters).
    pub pointer_extent: f32,
    /// Trigger value at which an `Axis1D` select counts as pressed.
    pub press_threshold: f32,
    /// Trigger value under which a pressed select releases.
    pub release_threshold: f32,
    pub manipulation: ManipulationConfig,
    pub teleport: TeleportConfig,
    pub teleport_arc: TeleportArc,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            bindings: ActionBindings::default(),
            pointer_extent: DEFAULT_POINTER_EXTENT,
            press_threshold: PRESS_THRESHOLD,
            release_threshold: RELEASE_THRESHOLD,
            manipulation: ManipulationConfig::default(),
            teleport: TeleportConfig::default(),
            teleport_arc: TeleportArc::default(),
        }
    }
}

impl InteractionConfig {
    pub fn validate(&self) -> Result<(), InteractionError> {
        if !(self.pointer_extent.is_finite() && self.pointer_extent > 0.0) {
            return Err(InteractionError::InvalidConfig(
                "pointer_extent must be positive".into(),
            ));
        }
        if !(0.0 < self.release_threshold
            && self.release_threshold <= self.press_threshold
            && self.press_threshold <= 1.0)
        {
            return Err(InteractionError::InvalidConfig(
                "expected 0 < release_threshold <= press_threshold <= 1".into(),
            ));
        }
        if self.teleport_arc.steps == 0 || !(self.teleport_arc.step_time > 0.0) {
            return Err(InteractionError::InvalidConfig(
                "teleport_arc needs at least one step of positive duration".into(),
            ));
        }
        self.manipulation.validate()?;
        self.teleport.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(InteractionConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let json = r#"{
            "pointer_extent": 4.0,
            "manipulation": { "use_hold": false, "snap": { "snap_distance": 0.05 } },
            "teleport": { "rotation_amount": 45.0 }
        }"#;
        let config: InteractionConfig = serde_json::from_str(json).unwrap();
        let defaults = InteractionConfig::default();

        assert_eq!(config.pointer_extent, 4.0);
        assert!(!config.manipulation.use_hold);
        assert_eq!(config.manipulation.snap.snap_distance, 0.05);
        assert_eq!(
            config.manipulation.snap.unsnap_tolerance,
            defaults.manipulation.snap.unsnap_tolerance
        );
        assert_eq!(config.teleport.rotation_amount, 45.0);
        assert_eq!(config.teleport.input_threshold, defaults.teleport.input_threshold);
        assert_eq!(config.bindings, defaults.bindings);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_sections_are_reported() {
        let mut config = InteractionConfig::default();
        config.pointer_extent = 0.0;
        assert!(config.validate().is_err());

        let mut config = InteractionConfig::default();
        config.release_threshold = 0.9;
        assert!(config.validate().is_err());

        let mut config = InteractionConfig::default();
        config.teleport.teleport_activation_angle = 170.0;
        assert!(matches!(
            config.validate(),
            Err(InteractionError::InvalidConfig(_))
        ));
    }
}
