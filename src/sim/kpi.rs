//! Post-hoc episode summary computed from step records.

use std::fmt;

use super::types::StepRecord;

/// Aggregate indicators derived from a complete rollout.
///
/// Computed post-hoc from `Vec<StepRecord>` so the report always agrees
/// with the exported telemetry.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeReport {
    /// Number of steps taken.
    pub steps: usize,
    /// Steps whose action was rejected.
    pub rejected_steps: usize,
    /// Sum of all rewards.
    pub total_reward: f64,
    /// Degradation cost summed over accepted steps (positive).
    pub total_degradation_cost: f64,
    /// Legality penalty summed over rejected steps (positive).
    pub total_penalty: f64,
    /// Battery charges after the last step.
    pub final_charges: Vec<u32>,
    /// Whether the episode ended by termination.
    pub terminated: bool,
    /// Whether the horizon cut the episode short.
    pub truncated: bool,
}

impl EpisodeReport {
    /// Computes the report from the complete step record vector.
    pub fn from_records(records: &[StepRecord]) -> Self {
        let mut report = Self {
            steps: records.len(),
            rejected_steps: 0,
            total_reward: 0.0,
            total_degradation_cost: 0.0,
            total_penalty: 0.0,
            final_charges: Vec::new(),
            terminated: false,
            truncated: false,
        };

        for r in records {
            report.total_reward += r.reward;
            if r.accepted {
                report.total_degradation_cost -= r.reward;
            } else {
                report.rejected_steps += 1;
                report.total_penalty += r.penalty;
            }
        }

        if let Some(last) = records.last() {
            report.final_charges = last.charges.clone();
            report.terminated = last.terminated;
            report.truncated = last.truncated;
        }
        report
    }

    /// Share of steps whose action was accepted, in percent.
    pub fn acceptance_pct(&self) -> f64 {
        if self.steps == 0 {
            return 0.0;
        }
        100.0 * (self.steps - self.rejected_steps) as f64 / self.steps as f64
    }
}

impl fmt::Display for EpisodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Episode Report ---")?;
        writeln!(f, "Steps:                 {}", self.steps)?;
        writeln!(
            f,
            "Accepted actions:      {:.1}% ({} rejected)",
            self.acceptance_pct(),
            self.rejected_steps
        )?;
        writeln!(f, "Total reward:          {:.4}", self.total_reward)?;
        writeln!(f, "Degradation cost:      {:.4}", self.total_degradation_cost)?;
        writeln!(f, "Legality penalty:      {:.1}", self.total_penalty)?;
        writeln!(f, "Final charges:         {:?}", self.final_charges)?;
        let end = if self.terminated {
            "terminated"
        } else if self.truncated {
            "truncated"
        } else {
            "running"
        };
        write!(f, "Episode end:           {end}")
    }
}
