//! Scheduling stepper that validates actions against storage and generation,
//! applies them, and advances the generation process.

use rand::{Rng, SeedableRng, rngs::StdRng};

use super::generation::GenerationSystem;
use super::mask::{self, DEFAULT_MASK_LIMIT};
use super::storage::StorageSystem;
use super::types::{Observation, ResetOptions, StepInfo, StepOutcome};
use crate::error::SimError;

/// Lifecycle of a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Awaiting an action.
    Ready,
    /// The trajectory has ended; only `reset` is valid.
    Terminated,
}

/// Single-trajectory simulation stepper.
///
/// Owns both subsystems and the random source that drives generation
/// transitions and reset sampling, so independent steppers never share
/// state.
#[derive(Debug, Clone)]
pub struct SchedulingStepper {
    storage: StorageSystem,
    generation: GenerationSystem,
    rng: StdRng,
    phase: Phase,
    action_space_bounds: Vec<(i64, i64)>,
    mask_limit: u64,
}

impl SchedulingStepper {
    /// Creates a new stepper in the `Ready` phase.
    ///
    /// # Arguments
    ///
    /// * `storage` - Battery bank driven by the action vector
    /// * `generation` - Net-generation process the action must balance
    /// * `seed` - Seed of the trajectory's random source
    pub fn new(storage: StorageSystem, generation: GenerationSystem, seed: u64) -> Self {
        let action_space_bounds = storage.action_bound_space();
        Self {
            storage,
            generation,
            rng: StdRng::seed_from_u64(seed),
            phase: Phase::Ready,
            action_space_bounds,
            mask_limit: DEFAULT_MASK_LIMIT,
        }
    }

    /// Sets the largest lattice [`SchedulingStepper::legal_actions`] will enumerate.
    pub fn with_mask_limit(mut self, mask_limit: u64) -> Self {
        self.mask_limit = mask_limit;
        self
    }

    pub fn storage(&self) -> &StorageSystem {
        &self.storage
    }

    pub fn generation(&self) -> &GenerationSystem {
        &self.generation
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_terminated(&self) -> bool {
        self.phase == Phase::Terminated
    }

    pub fn mask_limit(&self) -> u64 {
        self.mask_limit
    }

    /// Theoretical per-battery action bounds, fixed at construction.
    pub fn action_space_bounds(&self) -> &[(i64, i64)] {
        &self.action_space_bounds
    }

    /// Per-battery legal bounds for the next step.
    pub fn action_mask_bounds(&self) -> Vec<(i64, i64)> {
        self.storage.action_mask_bounds()
    }

    pub fn observation(&self) -> Observation {
        Observation {
            storage: self.storage.present_charges(),
            generation_state: self.generation.current_state(),
            net_generation: self.generation.net_generation(),
        }
    }

    fn info(&self, accepted: bool, storage_penalty: f64, generation_penalty: f64) -> StepInfo {
        let (low_action, high_action): (Vec<i64>, Vec<i64>) =
            self.storage.action_mask_bounds().into_iter().unzip();
        StepInfo {
            present_charges: self.storage.present_charges(),
            capacities: self.storage.capacities(),
            net_generation: self.generation.net_generation(),
            low_action,
            high_action,
            accepted,
            storage_penalty,
            generation_penalty,
        }
    }

    /// Reinitializes battery charges and the generation state.
    ///
    /// A `seed` reseeds the trajectory's random source first. Values missing
    /// from `options` are sampled uniformly: each charge in
    /// `[0, capacity]`, the generation state in `[0, n_states)`.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidReset` if supplied values are out of range
    /// or the charge vector has the wrong length. Nothing is modified in
    /// that case.
    pub fn reset(
        &mut self,
        seed: Option<u64>,
        options: Option<ResetOptions>,
    ) -> Result<(Observation, StepInfo), SimError> {
        let options = options.unwrap_or_default();

        if let Some(charges) = &options.charges {
            if charges.len() != self.storage.n_batteries() {
                return Err(SimError::InvalidReset(format!(
                    "expected {} charges, got {}",
                    self.storage.n_batteries(),
                    charges.len()
                )));
            }
            if let Some((i, (charge, cap))) = charges
                .iter()
                .zip(self.storage.capacities())
                .enumerate()
                .find(|(_, (charge, cap))| **charge > *cap)
            {
                return Err(SimError::InvalidReset(format!(
                    "charge {charge} for battery {i} exceeds capacity {cap}"
                )));
            }
        }
        if let Some(state) = options.generation_state {
            if state >= self.generation.n_states() {
                return Err(SimError::InvalidReset(format!(
                    "generation state {state} out of range for {} states",
                    self.generation.n_states()
                )));
            }
        }

        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }

        let charges = match options.charges {
            Some(charges) => charges,
            None => self
                .storage
                .capacities()
                .into_iter()
                .map(|cap| self.rng.random_range(0..=cap))
                .collect(),
        };
        let state = match options.generation_state {
            Some(state) => state,
            None => self.rng.random_range(0..self.generation.n_states()),
        };

        for (battery, charge) in self.storage.batteries_mut().iter_mut().zip(charges) {
            battery.reset_charge(charge)?;
        }
        self.generation.reset_state(state)?;
        self.phase = Phase::Ready;

        let observation = self.observation();
        tracing::info!(
            charges = ?observation.storage,
            generation_state = observation.generation_state,
            net_generation = observation.net_generation,
            "trajectory reset"
        );
        Ok((observation, self.info(true, 0.0, 0.0)))
    }

    /// Advances the simulation by one step.
    ///
    /// An action that breaks either the storage or the generation constraint
    /// is rejected: the reward is the negated sum of both legality penalties,
    /// `terminated` is false, and no state changes. An accepted action is
    /// applied to the batteries, termination is evaluated, and the
    /// generation process transitions.
    ///
    /// # Errors
    ///
    /// Returns `SimError::EpisodeTerminated` in the `Terminated` phase and
    /// `SimError::DimensionMismatch` if the action length is wrong.
    pub fn step(&mut self, action: &[i64]) -> Result<StepOutcome, SimError> {
        if self.phase == Phase::Terminated {
            return Err(SimError::EpisodeTerminated);
        }

        let storage_ok = self.storage.constraint(action)?;
        let generation_ok = self.generation.constraint(action);

        if !(storage_ok && generation_ok) {
            let storage_penalty = self.storage.legality_penalty(action)?;
            let generation_penalty = self.generation.legality_penalty(action);
            tracing::debug!(
                ?action,
                storage_penalty,
                generation_penalty,
                net_generation = self.generation.net_generation(),
                "action rejected"
            );
            return Ok(StepOutcome {
                observation: self.observation(),
                reward: -(storage_penalty + generation_penalty),
                terminated: false,
                truncated: false,
                info: self.info(false, storage_penalty, generation_penalty),
            });
        }

        let net_generation = i128::from(self.generation.net_generation());
        let (reward, storage_terminated) = self.storage.step(action)?;

        let no_charge_left = i128::from(self.storage.total_charge()) < -net_generation;
        let no_capacity_left = i128::from(self.storage.total_headroom()) < net_generation;
        let terminated = storage_terminated || no_charge_left || no_capacity_left;

        self.generation.advance(&mut self.rng);
        if terminated {
            self.phase = Phase::Terminated;
        }

        tracing::debug!(
            ?action,
            reward,
            terminated,
            storage_terminated,
            no_charge_left,
            no_capacity_left,
            "action applied"
        );

        Ok(StepOutcome {
            observation: self.observation(),
            reward,
            terminated,
            truncated: false,
            info: self.info(true, 0.0, 0.0),
        })
    }

    /// Enumerates every action that would be accepted by the next `step`.
    ///
    /// Walks the integer lattice of the current legal box and keeps the
    /// points that balance the net generation. Exponential in the number
    /// of batteries; bounded by the stepper's mask limit.
    ///
    /// # Errors
    ///
    /// Returns `SimError::MaskTooLarge` if the lattice exceeds the limit.
    pub fn legal_actions(&self) -> Result<Vec<Vec<i64>>, SimError> {
        let lattice = mask::enumerate_lattice(&self.storage.action_mask_bounds(), self.mask_limit)?;
        Ok(self.generation.action_mask(lattice))
    }

    /// Returns true if at least one action would be accepted by the next `step`.
    pub fn balance_feasible(&self) -> bool {
        mask::balance_feasible(
            &self.storage.action_mask_bounds(),
            self.generation.net_generation(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{Battery, DegradationModel};

    fn bank(charges: [u32; 3]) -> StorageSystem {
        let batteries = charges
            .iter()
            .zip([5_u32, 10, 15])
            .map(|(&c, cap)| {
                let model = DegradationModel::new(1.0, 1.0).unwrap();
                Battery::new(c, cap, 5, 5, model).unwrap()
            })
            .collect();
        StorageSystem::new(batteries).unwrap()
    }

    fn stepper(charges: [u32; 3], r_values: Vec<i64>) -> SchedulingStepper {
        let generation = GenerationSystem::with_distance_decay(0, r_values, 0.01).unwrap();
        SchedulingStepper::new(bank(charges), generation, 42)
    }

    #[test]
    fn rejected_action_is_penalized_without_mutation() {
        let mut s = stepper([5, 5, 5], vec![-4, -1, 1, 5]);
        let before = s.observation();
        let outcome = s.step(&[0, 0, 0]).unwrap();
        assert_eq!(outcome.reward, -4.0);
        assert!(!outcome.terminated);
        assert!(!outcome.truncated);
        assert!(!outcome.info.accepted);
        assert_eq!(outcome.info.generation_penalty, 4.0);
        assert_eq!(outcome.info.storage_penalty, 0.0);
        assert_eq!(outcome.observation, before);
    }

    #[test]
    fn rejection_is_idempotent() {
        let mut s = stepper([5, 5, 5], vec![-4, -1, 1, 5]);
        let first = s.step(&[3, 0, 0]).unwrap();
        let second = s.step(&[3, 0, 0]).unwrap();
        assert_eq!(first, second);
        // storage: 3 over a full battery; generation: |-4 - 3| = 7
        assert_eq!(first.reward, -10.0);
    }

    #[test]
    fn accepted_action_moves_charge_and_advances() {
        let mut s = stepper([5, 5, 5], vec![-4, -1, 1, 5]);
        let outcome = s.step(&[-2, -1, -1]).unwrap();
        assert!(outcome.info.accepted);
        assert_eq!(outcome.observation.storage, vec![3, 4, 4]);
        assert!(outcome.reward < 0.0);
        assert!(!outcome.terminated);
        assert_eq!(s.phase(), Phase::Ready);
    }

    #[test]
    fn draining_all_batteries_terminates() {
        let mut s = stepper([5, 5, 5], vec![-15, 0]);
        let outcome = s.step(&[-5, -5, -5]).unwrap();
        assert!(outcome.terminated);
        assert_eq!(outcome.observation.storage, vec![0, 0, 0]);
        assert_eq!(s.step(&[0, 0, 0]).unwrap_err(), SimError::EpisodeTerminated);
    }

    #[test]
    fn insufficient_charge_terminates() {
        // total charge after the step (10) cannot cover a deficit of 12
        let matrix = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let generation = GenerationSystem::new(0, vec![-12, 0], matrix).unwrap();
        let mut s = SchedulingStepper::new(bank([5, 5, 12]), generation, 1);
        let outcome = s.step(&[-4, -4, -4]).unwrap();
        assert!(outcome.info.accepted);
        assert!(outcome.terminated);
    }

    #[test]
    fn insufficient_headroom_terminates() {
        let matrix = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let generation = GenerationSystem::new(0, vec![10, 0], matrix).unwrap();
        let mut s = SchedulingStepper::new(bank([0, 0, 3]), generation, 1);
        let outcome = s.step(&[4, 3, 3]).unwrap();
        assert!(outcome.info.accepted);
        // headroom left: 1 + 7 + 9 = 17 >= 10
        assert!(!outcome.terminated);
        let outcome = s.step(&[1, 5, 4]).unwrap();
        assert!(outcome.info.accepted);
        // headroom left: 0 + 2 + 5 = 7 < 10
        assert!(outcome.terminated);
    }

    #[test]
    fn wrong_length_is_an_error() {
        let mut s = stepper([5, 5, 5], vec![-4, -1, 1, 5]);
        assert_eq!(
            s.step(&[-4, 0]).unwrap_err(),
            SimError::DimensionMismatch {
                expected: 3,
                got: 2
            }
        );
    }

    #[test]
    fn reset_with_options_and_back_to_ready() {
        let mut s = stepper([5, 5, 5], vec![-15, 0]);
        s.step(&[-5, -5, -5]).unwrap();
        assert!(s.is_terminated());

        let options = ResetOptions {
            charges: Some(vec![1, 2, 3]),
            generation_state: Some(1),
        };
        let (obs, info) = s.reset(None, Some(options)).unwrap();
        assert_eq!(obs.storage, vec![1, 2, 3]);
        assert_eq!(obs.generation_state, 1);
        assert_eq!(obs.net_generation, 0);
        assert_eq!(info.capacities, vec![5, 10, 15]);
        assert_eq!(s.phase(), Phase::Ready);
    }

    #[test]
    fn reset_rejects_bad_options_without_mutation() {
        let mut s = stepper([5, 5, 5], vec![-4, -1, 1, 5]);
        let bad_charge = ResetOptions {
            charges: Some(vec![6, 0, 0]),
            generation_state: None,
        };
        assert!(s.reset(None, Some(bad_charge)).is_err());
        let bad_len = ResetOptions {
            charges: Some(vec![0, 0]),
            generation_state: None,
        };
        assert!(s.reset(None, Some(bad_len)).is_err());
        let bad_state = ResetOptions {
            charges: None,
            generation_state: Some(4),
        };
        assert!(s.reset(None, Some(bad_state)).is_err());
        assert_eq!(s.observation().storage, vec![5, 5, 5]);
        assert_eq!(s.observation().generation_state, 0);
    }

    #[test]
    fn seeded_reset_is_reproducible() {
        let mut a = stepper([5, 5, 5], vec![-4, -1, 1, 5]);
        let mut b = stepper([0, 0, 0], vec![-4, -1, 1, 5]);
        let (obs_a, _) = a.reset(Some(9), None).unwrap();
        let (obs_b, _) = b.reset(Some(9), None).unwrap();
        assert_eq!(obs_a, obs_b);
        for (charge, cap) in obs_a.storage.iter().zip([5, 10, 15]) {
            assert!(*charge <= cap);
        }
    }

    #[test]
    fn legal_actions_all_accepted() {
        let s = stepper([5, 5, 5], vec![-4, -1, 1, 5]);
        let legal = s.legal_actions().unwrap();
        assert!(!legal.is_empty());
        assert!(s.balance_feasible());
        for action in &legal {
            assert_eq!(action.iter().sum::<i64>(), -4);
            let mut probe = s.clone();
            assert!(probe.step(action).unwrap().info.accepted);
        }
    }

    #[test]
    fn legal_actions_respect_limit() {
        let s = stepper([5, 5, 5], vec![-4, -1, 1, 5]).with_mask_limit(10);
        assert!(matches!(
            s.legal_actions().unwrap_err(),
            SimError::MaskTooLarge { .. }
        ));
    }

    #[test]
    fn action_space_bounds_are_static() {
        let mut s = stepper([5, 5, 5], vec![-4, -1, 1, 5]);
        let declared = s.action_space_bounds().to_vec();
        s.step(&[-4, 0, 0]).unwrap();
        assert_eq!(s.action_space_bounds(), declared.as_slice());
        assert_eq!(declared, vec![(-5, 5), (-10, 10), (-15, 15)]);
    }
}
