//! Cycle-depth stress function used to price battery wear.

use crate::error::SimError;

/// Exponential stress model: `alpha * exp(-beta * depth_of_discharge)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DegradationModel {
    alpha: f64,
    beta: f64,
}

impl DegradationModel {
    /// Creates a new degradation model.
    ///
    /// # Arguments
    ///
    /// * `alpha` - Stress scale (must be finite and > 0)
    /// * `beta` - Decay rate over cycle depth (must be finite and >= 0)
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidDegradation` if either parameter is out of range.
    pub fn new(alpha: f64, beta: f64) -> Result<Self, SimError> {
        if !alpha.is_finite() || alpha <= 0.0 {
            return Err(SimError::InvalidDegradation(format!(
                "alpha must be finite and > 0, got {alpha}"
            )));
        }
        if !beta.is_finite() || beta < 0.0 {
            return Err(SimError::InvalidDegradation(format!(
                "beta must be finite and >= 0, got {beta}"
            )));
        }
        Ok(Self { alpha, beta })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Wear cost for a step with the given cycle depth.
    ///
    /// Total over non-negative inputs; the result is always in `(0, alpha]`.
    pub fn percent_degradation(&self, depth_of_discharge: f64) -> f64 {
        self.alpha * (-self.beta * depth_of_discharge).exp()
    }
}
