//! Core simulation types: observations, step outcomes, and step records.

use std::fmt;

/// Joint state exposed to the outer control loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// Present charge of each battery, in battery order.
    pub storage: Vec<u32>,
    /// Index of the current generation state.
    pub generation_state: usize,
    /// Net generation level of that state.
    pub net_generation: i64,
}

/// Diagnostics returned alongside every observation.
#[derive(Debug, Clone, PartialEq)]
pub struct StepInfo {
    /// Present charge of each battery.
    pub present_charges: Vec<u32>,
    /// Capacity of each battery.
    pub capacities: Vec<u32>,
    /// Net generation the next action must offset.
    pub net_generation: i64,
    /// Lower end of each battery's legal interval for the next step.
    pub low_action: Vec<i64>,
    /// Upper end of each battery's legal interval for the next step.
    pub high_action: Vec<i64>,
    /// Whether the last action was accepted. `true` after a reset.
    pub accepted: bool,
    /// Storage part of the last penalty (L1 distance to the legal box).
    pub storage_penalty: f64,
    /// Generation part of the last penalty (gap to the net generation).
    pub generation_penalty: f64,
}

/// Caller-supplied initial values for [`reset`](super::engine::SchedulingStepper::reset).
///
/// Fields left as `None` are sampled uniformly within their declared bounds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResetOptions {
    /// Initial charge of each battery.
    pub charges: Option<Vec<u32>>,
    /// Initial generation state index.
    pub generation_state: Option<usize>,
}

/// Result of one call to `step`.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub observation: Observation,
    /// Negated degradation cost when accepted, negated penalty when rejected.
    pub reward: f64,
    pub terminated: bool,
    /// Always `false`; truncation belongs to the caller.
    pub truncated: bool,
    pub info: StepInfo,
}

/// Complete record of one rollout step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    /// Step index within the episode.
    pub timestep: usize,
    /// Generation state the action was checked against.
    pub generation_state: usize,
    /// Net generation the action had to offset.
    pub net_generation: i64,
    /// Action proposed by the controller.
    pub action: Vec<i64>,
    pub reward: f64,
    /// Total legality penalty (zero for accepted actions).
    pub penalty: f64,
    pub accepted: bool,
    pub terminated: bool,
    /// Set on the last step when the horizon cut the episode short.
    pub truncated: bool,
    /// Battery charges after the step.
    pub charges: Vec<u32>,
}

impl fmt::Display for StepRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>3} | gen[{:>2}]={:>4} | action={:?} | reward={:>8.4} \
             penalty={:>5.1} ok={} | charges={:?}{}",
            self.timestep,
            self.generation_state,
            self.net_generation,
            self.action,
            self.reward,
            self.penalty,
            self.accepted,
            self.charges,
            if self.terminated { " [terminated]" } else { "" },
        )
    }
}
