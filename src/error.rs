//! Error type shared by the storage, generation, and stepper modules.

use thiserror::Error;

/// Errors raised by the simulation engine.
///
/// Rejected actions at the stepper level are not errors: they come back as
/// a penalty reward. Everything here is either a construction-time
/// configuration problem or a caller bug.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// A battery was asked to move outside its legal interval this step.
    #[error("illegal charge delta {delta}: legal interval is [{low}, {high}]")]
    IllegalAction { delta: i64, low: i64, high: i64 },

    /// An action vector does not have one component per battery.
    #[error("action has {got} components, storage system has {expected} batteries")]
    DimensionMismatch { expected: usize, got: usize },

    /// A transition-matrix row is malformed.
    #[error("invalid transition matrix at row {row}: {reason}")]
    InvalidTransitionMatrix { row: usize, reason: String },

    #[error("invalid battery: {0}")]
    InvalidBattery(String),

    #[error("invalid degradation model: {0}")]
    InvalidDegradation(String),

    #[error("invalid generation system: {0}")]
    InvalidGeneration(String),

    #[error("invalid reset options: {0}")]
    InvalidReset(String),

    /// `step` was called after the trajectory terminated.
    #[error("episode has terminated; call reset before stepping again")]
    EpisodeTerminated,

    /// The combinatorial mask would enumerate more actions than allowed.
    #[error("action lattice has {size} points, limit is {limit}")]
    MaskTooLarge { size: u128, limit: u64 },

    #[error("storage system needs at least one battery")]
    EmptyStorage,
}
