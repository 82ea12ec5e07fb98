//! Rollout loop: drives a stepper with a controller until the episode ends.

use crate::error::SimError;
use crate::sim::controller::Controller;
use crate::sim::engine::SchedulingStepper;
use crate::sim::types::StepRecord;

/// Runs one episode from the stepper's current state.
///
/// Stops when the stepper terminates or after `max_steps` steps, whichever
/// comes first; the last record is marked `truncated` in the second case.
/// The stepper is not reset.
///
/// # Errors
///
/// Returns the first `SimError` from the stepper, e.g. a dimension mismatch
/// from a misbehaving controller or `EpisodeTerminated` if the stepper had
/// already ended.
pub fn run_episode<C: Controller + ?Sized>(
    stepper: &mut SchedulingStepper,
    controller: &mut C,
    max_steps: usize,
) -> Result<Vec<StepRecord>, SimError> {
    let mut records = Vec::new();

    for t in 0..max_steps {
        let generation_state = stepper.generation().current_state();
        let net_generation = stepper.generation().net_generation();
        let action = controller.propose(&stepper.action_mask_bounds(), net_generation);

        let outcome = stepper.step(&action)?;
        let penalty = outcome.info.storage_penalty + outcome.info.generation_penalty;
        let truncated = !outcome.terminated && t + 1 == max_steps;

        records.push(StepRecord {
            timestep: t,
            generation_state,
            net_generation,
            action,
            reward: outcome.reward,
            penalty,
            accepted: outcome.info.accepted,
            terminated: outcome.terminated,
            truncated,
            charges: outcome.observation.storage,
        });

        if outcome.terminated {
            break;
        }
    }

    tracing::info!(
        controller = controller.name(),
        steps = records.len(),
        terminated = stepper.is_terminated(),
        "episode finished"
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{Battery, DegradationModel};
    use crate::sim::controller::{GreedyController, IdleController};
    use crate::sim::generation::GenerationSystem;
    use crate::sim::storage::StorageSystem;

    fn stepper(r_values: Vec<i64>) -> SchedulingStepper {
        let batteries = (0..3)
            .map(|i| {
                let model = DegradationModel::new(1.0 / (i as f64 + 1.0), 1.0).unwrap();
                Battery::new(5, 5 * (i + 1), 2 * i64::from(i + 1), 2 * i64::from(i + 1), model)
                    .unwrap()
            })
            .collect();
        let storage = StorageSystem::new(batteries).unwrap();
        let generation = GenerationSystem::with_distance_decay(0, r_values, 0.01).unwrap();
        SchedulingStepper::new(storage, generation, 4)
    }

    #[test]
    fn horizon_truncates_episode() {
        let mut s = stepper(vec![0]);
        let records = run_episode(&mut s, &mut IdleController, 5).unwrap();
        assert_eq!(records.len(), 5);
        assert!(records.iter().all(|r| r.accepted));
        assert!(records[4].truncated);
        assert!(records[..4].iter().all(|r| !r.truncated));
    }

    #[test]
    fn termination_stops_episode() {
        let mut s = stepper(vec![-100]);
        let records = run_episode(&mut s, &mut GreedyController, 50).unwrap();
        // the greedy action cannot cover -100, so every step is rejected
        assert_eq!(records.len(), 50);
        assert!(records.iter().all(|r| !r.accepted));

        let mut s = stepper(vec![-6]);
        let records = run_episode(&mut s, &mut GreedyController, 50).unwrap();
        let last = records.last().unwrap();
        assert!(last.terminated);
        assert!(!last.truncated);
        assert!(records.len() < 50);
    }

    #[test]
    fn unbounded_horizon_runs_until_termination() {
        let mut s = stepper(vec![-6]);
        let records = run_episode(&mut s, &mut GreedyController, usize::MAX).unwrap();
        let last = records.last().unwrap();
        assert!(last.terminated);
        assert!(!last.truncated);
    }

    #[test]
    fn records_carry_charges_after_step() {
        let mut s = stepper(vec![-1]);
        let records = run_episode(&mut s, &mut GreedyController, 1).unwrap();
        assert_eq!(records[0].action, vec![-1, 0, 0]);
        assert_eq!(records[0].charges, vec![4, 5, 5]);
    }
}
