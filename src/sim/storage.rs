//! Multi-battery storage system: joint bounds, legality, and stepping.

use crate::devices::Battery;
use crate::error::SimError;

/// An ordered bank of batteries driven by one action vector.
///
/// Component `i` of every action applies to battery `i`.
#[derive(Debug, Clone)]
pub struct StorageSystem {
    batteries: Vec<Battery>,
}

impl StorageSystem {
    /// Creates a storage system from an ordered list of batteries.
    ///
    /// # Errors
    ///
    /// Returns `SimError::EmptyStorage` if `batteries` is empty.
    pub fn new(batteries: Vec<Battery>) -> Result<Self, SimError> {
        if batteries.is_empty() {
            return Err(SimError::EmptyStorage);
        }
        Ok(Self { batteries })
    }

    pub fn batteries(&self) -> &[Battery] {
        &self.batteries
    }

    pub(crate) fn batteries_mut(&mut self) -> &mut [Battery] {
        &mut self.batteries
    }

    pub fn n_batteries(&self) -> usize {
        self.batteries.len()
    }

    pub fn present_charges(&self) -> Vec<u32> {
        self.batteries.iter().map(Battery::present_charge).collect()
    }

    pub fn capacities(&self) -> Vec<u32> {
        self.batteries.iter().map(Battery::capacity_charge).collect()
    }

    /// Total energy currently stored across all batteries.
    pub fn total_charge(&self) -> u64 {
        self.batteries
            .iter()
            .map(|b| u64::from(b.present_charge()))
            .sum()
    }

    /// Total room left across all batteries.
    pub fn total_headroom(&self) -> u64 {
        self.batteries.iter().map(|b| u64::from(b.headroom())).sum()
    }

    /// Theoretical extreme bounds `(-capacity, capacity)` per battery.
    ///
    /// Static for the lifetime of the system; used to declare the outer
    /// action space, not to decide legality.
    pub fn action_bound_space(&self) -> Vec<(i64, i64)> {
        self.batteries
            .iter()
            .map(|b| {
                let cap = i64::from(b.capacity_charge());
                (-cap, cap)
            })
            .collect()
    }

    /// Legal `(low, high)` per battery for the current step.
    pub fn action_mask_bounds(&self) -> Vec<(i64, i64)> {
        self.batteries
            .iter()
            .map(|b| {
                let bounds = b.able_charge();
                (bounds.low(), bounds.high())
            })
            .collect()
    }

    fn check_dimension(&self, action: &[i64]) -> Result<(), SimError> {
        if action.len() != self.batteries.len() {
            return Err(SimError::DimensionMismatch {
                expected: self.batteries.len(),
                got: action.len(),
            });
        }
        Ok(())
    }

    /// Returns true if every component is legal for its battery.
    ///
    /// # Errors
    ///
    /// Returns `SimError::DimensionMismatch` if the action length differs
    /// from the number of batteries.
    pub fn constraint(&self, action: &[i64]) -> Result<bool, SimError> {
        self.check_dimension(action)?;
        Ok(self
            .batteries
            .iter()
            .zip(action)
            .all(|(battery, &delta)| battery.constraint(delta)))
    }

    /// L1 distance between `action` and its projection onto the legal box.
    ///
    /// Zero for legal actions.
    ///
    /// # Errors
    ///
    /// Returns `SimError::DimensionMismatch` on a length mismatch.
    pub fn legality_penalty(&self, action: &[i64]) -> Result<f64, SimError> {
        self.check_dimension(action)?;
        let distance: u128 = self
            .action_mask_bounds()
            .iter()
            .zip(action)
            .map(|(&(low, high), &a)| {
                (i128::from(a) - i128::from(a.clamp(low, high))).unsigned_abs()
            })
            .sum();
        Ok(distance as f64)
    }

    /// Applies `action` and returns `(reward, terminated)`.
    ///
    /// The reward is the negated sum of each battery's degradation cost and
    /// is never positive. `terminated` is true when every battery is empty.
    /// The action is validated in full before any battery moves.
    ///
    /// # Errors
    ///
    /// Returns `SimError::DimensionMismatch` or `SimError::IllegalAction`
    /// without mutating any battery.
    pub fn step(&mut self, action: &[i64]) -> Result<(f64, bool), SimError> {
        self.check_dimension(action)?;
        if let Some((battery, &delta)) = self
            .batteries
            .iter()
            .zip(action)
            .find(|(battery, delta)| !battery.constraint(**delta))
        {
            let bounds = battery.able_charge();
            return Err(SimError::IllegalAction {
                delta,
                low: bounds.low(),
                high: bounds.high(),
            });
        }

        let mut reward = 0.0;
        for (battery, &delta) in self.batteries.iter_mut().zip(action) {
            let initial_charge = battery.present_charge();
            battery.charge_discharge(delta)?;
            reward -= battery.degradation_cost(initial_charge);
        }

        let terminated = self.batteries.iter().all(|b| b.present_charge() == 0);
        Ok((reward, terminated))
    }

    /// Keeps only the candidates that satisfy [`StorageSystem::constraint`].
    ///
    /// # Errors
    ///
    /// Returns `SimError::DimensionMismatch` if any candidate has the wrong length.
    pub fn action_mask(&self, candidates: Vec<Vec<i64>>) -> Result<Vec<Vec<i64>>, SimError> {
        let mut legal = Vec::with_capacity(candidates.len());
        for action in candidates {
            if self.constraint(&action)? {
                legal.push(action);
            }
        }
        Ok(legal)
    }
}
