//! Action proposers used by the rollout runner.

use rand::{Rng, SeedableRng, rngs::StdRng};

use super::mask::{self, DEFAULT_MASK_LIMIT};

/// Proposes a joint charge/discharge action for the next step.
pub trait Controller {
    /// Returns one delta per battery.
    ///
    /// # Arguments
    ///
    /// * `legal_box` - Per-battery `(low, high)` legal interval this step
    /// * `net_generation` - Amount the action total must equal to be accepted
    fn propose(&mut self, legal_box: &[(i64, i64)], net_generation: i64) -> Vec<i64>;

    /// Returns a short name for reports.
    fn name(&self) -> &'static str;
}

/// Proposes zero movement on every battery.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdleController;

impl Controller for IdleController {
    fn propose(&mut self, legal_box: &[(i64, i64)], _net_generation: i64) -> Vec<i64> {
        vec![0; legal_box.len()]
    }

    fn name(&self) -> &'static str {
        "idle"
    }
}

/// Fills the net generation across batteries in order.
///
/// Each battery takes as much of the remainder as its legal interval
/// allows. The result is accepted whenever any balancing action exists;
/// otherwise the leftover is simply not covered and the step is rejected.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedyController;

impl Controller for GreedyController {
    fn propose(&mut self, legal_box: &[(i64, i64)], net_generation: i64) -> Vec<i64> {
        let mut remaining = net_generation;
        legal_box
            .iter()
            .map(|&(low, high)| {
                let delta = remaining.clamp(low.min(0), high.max(0));
                remaining -= delta;
                delta
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "greedy"
    }
}

/// Samples uniformly among every accepted action.
///
/// Enumerates the legal lattice each step, so it only suits small banks.
/// Falls back to the zero action when nothing balances or the lattice is
/// over the limit.
#[derive(Debug, Clone)]
pub struct MaskedRandomController {
    rng: StdRng,
    limit: u64,
}

impl MaskedRandomController {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            limit: DEFAULT_MASK_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }
}

impl Controller for MaskedRandomController {
    fn propose(&mut self, legal_box: &[(i64, i64)], net_generation: i64) -> Vec<i64> {
        match mask::balanced_actions(legal_box, net_generation, self.limit) {
            Ok(mut legal) if !legal.is_empty() => {
                let pick = self.rng.random_range(0..legal.len());
                legal.swap_remove(pick)
            }
            _ => vec![0; legal_box.len()],
        }
    }

    fn name(&self) -> &'static str {
        "random"
    }
}
