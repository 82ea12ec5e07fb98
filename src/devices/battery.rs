use crate::devices::degradation::DegradationModel;
use crate::error::SimError;

/// Per-step movement limits of a battery, as non-negative magnitudes.
///
/// The legal delta for the step is `[-max_discharge, max_charge]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargeBounds {
    /// Largest amount the battery can release this step.
    pub max_discharge: i64,
    /// Largest amount the battery can absorb this step.
    pub max_charge: i64,
}

impl ChargeBounds {
    /// Lower end of the legal delta interval.
    pub fn low(&self) -> i64 {
        -self.max_discharge
    }

    /// Upper end of the legal delta interval.
    pub fn high(&self) -> i64 {
        self.max_charge
    }

    pub fn contains(&self, delta: i64) -> bool {
        (self.low()..=self.high()).contains(&delta)
    }
}

/// A discrete energy storage unit with integer charge levels.
///
/// `Battery` enforces rate limits and capacity bounds on every charge
/// movement and owns the degradation model used to price each step.
///
/// # Sign Convention
/// - Positive delta: charging (absorbs surplus generation)
/// - Negative delta: discharging (covers a generation deficit)
#[derive(Debug, Clone)]
pub struct Battery {
    /// Energy currently stored.
    present_charge: u32,

    /// Maximum storable energy.
    capacity_charge: u32,

    /// Maximum energy released per step.
    rate_discharge: i64,

    /// Maximum energy absorbed per step.
    rate_charge: i64,

    degradation_model: DegradationModel,
}

impl Battery {
    /// Creates a new battery with the specified parameters.
    ///
    /// # Arguments
    ///
    /// * `present_charge` - Initial stored energy (must be <= `capacity_charge`)
    /// * `capacity_charge` - Maximum storable energy (must be > 0)
    /// * `rate_discharge` - Per-step discharge limit (must be >= 0)
    /// * `rate_charge` - Per-step charge limit (must be >= 0)
    /// * `degradation_model` - Wear cost function for this unit
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidBattery` if any limit is out of range.
    pub fn new(
        present_charge: u32,
        capacity_charge: u32,
        rate_discharge: i64,
        rate_charge: i64,
        degradation_model: DegradationModel,
    ) -> Result<Self, SimError> {
        if capacity_charge == 0 {
            return Err(SimError::InvalidBattery("capacity_charge must be > 0".into()));
        }
        if present_charge > capacity_charge {
            return Err(SimError::InvalidBattery(format!(
                "present_charge {present_charge} exceeds capacity_charge {capacity_charge}"
            )));
        }
        if rate_discharge < 0 || rate_charge < 0 {
            return Err(SimError::InvalidBattery(format!(
                "rates must be >= 0, got discharge={rate_discharge} charge={rate_charge}"
            )));
        }

        Ok(Self {
            present_charge,
            capacity_charge,
            rate_discharge,
            rate_charge,
            degradation_model,
        })
    }

    pub fn present_charge(&self) -> u32 {
        self.present_charge
    }

    pub fn capacity_charge(&self) -> u32 {
        self.capacity_charge
    }

    pub fn rate_discharge(&self) -> i64 {
        self.rate_discharge
    }

    pub fn rate_charge(&self) -> i64 {
        self.rate_charge
    }

    pub fn degradation_model(&self) -> &DegradationModel {
        &self.degradation_model
    }

    /// Room left before the battery is full.
    pub fn headroom(&self) -> u32 {
        self.capacity_charge - self.present_charge
    }

    /// Returns how far the battery can move this step given its current charge.
    pub fn able_charge(&self) -> ChargeBounds {
        ChargeBounds {
            max_discharge: self.rate_discharge.min(i64::from(self.present_charge)),
            max_charge: self.rate_charge.min(i64::from(self.headroom())),
        }
    }

    /// Returns true if `delta` lies inside the current legal interval.
    pub fn constraint(&self, delta: i64) -> bool {
        self.able_charge().contains(delta)
    }

    /// Moves `delta` units of energy into (positive) or out of (negative) the battery.
    ///
    /// # Errors
    ///
    /// Returns `SimError::IllegalAction` and leaves the charge untouched if
    /// `delta` violates [`Battery::constraint`].
    pub fn charge_discharge(&mut self, delta: i64) -> Result<(), SimError> {
        let bounds = self.able_charge();
        if !bounds.contains(delta) {
            return Err(SimError::IllegalAction {
                delta,
                low: bounds.low(),
                high: bounds.high(),
            });
        }

        // In range: delta is within [-present_charge, headroom].
        let updated = i64::from(self.present_charge) + delta;
        self.present_charge = u32::try_from(updated).map_err(|_| SimError::IllegalAction {
            delta,
            low: bounds.low(),
            high: bounds.high(),
        })?;
        Ok(())
    }

    /// Overwrites the stored charge when a trajectory is reset.
    pub(crate) fn reset_charge(&mut self, charge: u32) -> Result<(), SimError> {
        if charge > self.capacity_charge {
            return Err(SimError::InvalidReset(format!(
                "charge {charge} exceeds capacity {}",
                self.capacity_charge
            )));
        }
        self.present_charge = charge;
        Ok(())
    }

    /// Degradation cost of having moved from `initial_charge` to the present charge.
    pub fn degradation_cost(&self, initial_charge: u32) -> f64 {
        let dod = self.present_charge.abs_diff(initial_charge);
        let cycle_depth = f64::from(dod) / f64::from(self.capacity_charge);
        self.degradation_model.percent_degradation(cycle_depth)
    }
}
