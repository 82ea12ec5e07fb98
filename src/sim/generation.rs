//! Markov-chain model of net generation (supply minus demand).

use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

use crate::error::SimError;

/// Default decay of transition probability with grid distance between states.
pub const DEFAULT_DECAY_RATE: f64 = 0.01;

/// Tolerance on row sums when validating a transition matrix.
pub const ROW_SUM_TOLERANCE: f64 = 1e-9;

/// Number of states per row of the grid used to place states for distance.
const GRID_WIDTH: usize = 10;

/// Builds a row-stochastic transition matrix over `n_states` states.
///
/// States are laid out on a grid of width 10 (`i -> (i / 10, i % 10)`) and
/// the probability of moving from `i` to `j` is proportional to
/// `exp(-decay_rate * distance(i, j))`, so nearby levels are likelier
/// successors than distant ones.
pub fn build_transition_matrix(n_states: usize, decay_rate: f64) -> Vec<Vec<f64>> {
    let coord = |i: usize| ((i / GRID_WIDTH) as f64, (i % GRID_WIDTH) as f64);

    (0..n_states)
        .map(|i| {
            let (ix, iy) = coord(i);
            let weights: Vec<f64> = (0..n_states)
                .map(|j| {
                    let (jx, jy) = coord(j);
                    let distance = (ix - jx).hypot(iy - jy);
                    (-decay_rate * distance).exp()
                })
                .collect();
            let total: f64 = weights.iter().sum();
            weights.into_iter().map(|w| w / total).collect()
        })
        .collect()
}

/// Discrete-state stochastic net-generation process.
#[derive(Debug, Clone)]
pub struct GenerationSystem {
    current_state: usize,
    r_values: Vec<i64>,
    transition_matrix: Vec<Vec<f64>>,
    samplers: Vec<WeightedIndex<f64>>,
}

impl GenerationSystem {
    /// Creates a generation system from explicit levels and transition matrix.
    ///
    /// # Arguments
    ///
    /// * `current_state` - Initial state index (must be < `r_values.len()`)
    /// * `r_values` - Net-generation level of each state (non-empty)
    /// * `transition_matrix` - Square row-stochastic matrix over the states
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidGeneration` for empty levels or an
    /// out-of-range state, and `SimError::InvalidTransitionMatrix` if the
    /// matrix is not square, has negative or non-finite entries, or a row
    /// does not sum to 1 within [`ROW_SUM_TOLERANCE`].
    pub fn new(
        current_state: usize,
        r_values: Vec<i64>,
        transition_matrix: Vec<Vec<f64>>,
    ) -> Result<Self, SimError> {
        let n = r_values.len();
        if n == 0 {
            return Err(SimError::InvalidGeneration("r_values must not be empty".into()));
        }
        if current_state >= n {
            return Err(SimError::InvalidGeneration(format!(
                "current_state {current_state} out of range for {n} states"
            )));
        }
        if transition_matrix.len() != n {
            return Err(SimError::InvalidTransitionMatrix {
                row: transition_matrix.len().min(n),
                reason: format!("expected {n} rows, got {}", transition_matrix.len()),
            });
        }

        let mut samplers = Vec::with_capacity(n);
        for (row, probs) in transition_matrix.iter().enumerate() {
            if probs.len() != n {
                return Err(SimError::InvalidTransitionMatrix {
                    row,
                    reason: format!("expected {n} columns, got {}", probs.len()),
                });
            }
            if probs.iter().any(|p| !p.is_finite() || *p < 0.0) {
                return Err(SimError::InvalidTransitionMatrix {
                    row,
                    reason: "entries must be finite and non-negative".into(),
                });
            }
            let sum: f64 = probs.iter().sum();
            if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
                return Err(SimError::InvalidTransitionMatrix {
                    row,
                    reason: format!("row sums to {sum}"),
                });
            }
            let sampler = WeightedIndex::new(probs).map_err(|e| SimError::InvalidTransitionMatrix {
                row,
                reason: e.to_string(),
            })?;
            samplers.push(sampler);
        }

        Ok(Self {
            current_state,
            r_values,
            transition_matrix,
            samplers,
        })
    }

    /// Creates a generation system whose transitions decay with state distance.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidGeneration` if `decay_rate` is negative or
    /// not finite, plus any error from [`GenerationSystem::new`].
    pub fn with_distance_decay(
        current_state: usize,
        r_values: Vec<i64>,
        decay_rate: f64,
    ) -> Result<Self, SimError> {
        if !decay_rate.is_finite() || decay_rate < 0.0 {
            return Err(SimError::InvalidGeneration(format!(
                "decay_rate must be finite and >= 0, got {decay_rate}"
            )));
        }
        let matrix = build_transition_matrix(r_values.len(), decay_rate);
        Self::new(current_state, r_values, matrix)
    }

    pub fn current_state(&self) -> usize {
        self.current_state
    }

    pub fn r_values(&self) -> &[i64] {
        &self.r_values
    }

    pub fn transition_matrix(&self) -> &[Vec<f64>] {
        &self.transition_matrix
    }

    pub fn n_states(&self) -> usize {
        self.r_values.len()
    }

    /// Supply minus demand in the current state.
    pub fn net_generation(&self) -> i64 {
        self.r_values[self.current_state]
    }

    /// Draws the next state from the current row of the transition matrix.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let previous = self.current_state;
        self.current_state = self.samplers[previous].sample(rng);
        tracing::debug!(
            from = previous,
            to = self.current_state,
            net_generation = self.net_generation(),
            "generation transition"
        );
    }

    /// Places the process in `state` when a trajectory is reset.
    pub(crate) fn reset_state(&mut self, state: usize) -> Result<(), SimError> {
        if state >= self.r_values.len() {
            return Err(SimError::InvalidReset(format!(
                "generation state {state} out of range for {} states",
                self.r_values.len()
            )));
        }
        self.current_state = state;
        Ok(())
    }

    /// Returns true if the action exactly offsets the current net generation.
    pub fn constraint(&self, action: &[i64]) -> bool {
        action_total(action) == i128::from(self.net_generation())
    }

    /// Absolute gap between the net generation and the action total.
    pub fn legality_penalty(&self, action: &[i64]) -> f64 {
        (i128::from(self.net_generation()) - action_total(action)).unsigned_abs() as f64
    }

    /// Keeps only the candidates whose total matches the net generation.
    pub fn action_mask(&self, candidates: Vec<Vec<i64>>) -> Vec<Vec<i64>> {
        candidates
            .into_iter()
            .filter(|action| self.constraint(action))
            .collect()
    }
}

/// Sum of the action components, widened so extreme entries cannot overflow.
fn action_total(action: &[i64]) -> i128 {
    action.iter().map(|&a| i128::from(a)).sum()
}
