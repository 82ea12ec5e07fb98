//! Physical storage components.

/// Single storage unit with rate and capacity limits.
pub mod battery;
/// Cycle-depth degradation cost model.
pub mod degradation;

// Re-export the main types for convenience
pub use battery::{Battery, ChargeBounds};
pub use degradation::DegradationModel;
