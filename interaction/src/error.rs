use thiserror::Error;

/// Errors reported by the two-phase system lifecycle.
#[derive(Debug, Error, PartialEq)]
pub enum InteractionError {
    #[error("required port `{0}` is not bound")]
    MissingPort(&'static str),

    #[error("interaction system is already active")]
    AlreadyActive,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A pointer setter refused its input. The previous value is kept.
#[derive(Debug, Error, PartialEq)]
pub enum PointerError {
    #[error("pointer extent must be positive and finite, got {0}")]
    InvalidExtent(f32),

    #[error("pointer ray direction is zero-length or non-finite")]
    DegenerateDirection,

    #[error("pointer needs at least one ray step")]
    NoRaySteps,
}

/// A scene query could not be executed.
#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("query direction is zero-length or non-finite")]
    DegenerateDirection,

    #[error("query origin or distance is non-finite")]
    NonFinite,
}
