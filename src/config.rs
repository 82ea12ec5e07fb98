//! TOML-based scenario configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::devices::{Battery, DegradationModel};
use crate::error::SimError;
use crate::sim::engine::SchedulingStepper;
use crate::sim::generation::{DEFAULT_DECAY_RATE, GenerationSystem};
use crate::sim::mask::DEFAULT_MASK_LIMIT;
use crate::sim::storage::StorageSystem;

/// Controller names accepted by `simulation.controller`.
pub const CONTROLLERS: &[&str] = &["greedy", "random", "idle"];

/// Top-level scenario configuration parsed from TOML.
///
/// Sections left out fall back to the `default` preset. Load from TOML
/// with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::default_preset`] for the built-in scenario.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Rollout and engine parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Net-generation process.
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Battery bank, in action order.
    #[serde(default = "default_batteries")]
    pub batteries: Vec<BatteryConfig>,
}

/// Rollout and engine parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Master random seed.
    pub seed: u64,
    /// Truncation horizon for a rollout (must be > 0).
    pub max_steps: usize,
    /// Largest action lattice the combinatorial mask will enumerate.
    pub mask_limit: u64,
    /// Controller type: `"greedy"`, `"random"`, or `"idle"`.
    pub controller: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 4,
            max_steps: 100,
            mask_limit: DEFAULT_MASK_LIMIT,
            controller: "greedy".to_string(),
        }
    }
}

/// Net-generation process parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    /// Net-generation level of each state.
    pub r_values: Vec<i64>,
    /// Initial state index.
    pub initial_state: usize,
    /// Decay of transition probability with state distance (>= 0).
    pub decay_rate: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            r_values: vec![-4, -1, 1, 5],
            initial_state: 0,
            decay_rate: DEFAULT_DECAY_RATE,
        }
    }
}

/// One battery of the bank.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatteryConfig {
    /// Initial stored energy.
    pub present_charge: u32,
    /// Maximum storable energy.
    pub capacity_charge: u32,
    /// Per-step charge limit.
    pub rate_charge: i64,
    /// Per-step discharge limit.
    pub rate_discharge: i64,
    /// Degradation stress scale.
    pub alpha: f64,
    /// Degradation decay over cycle depth.
    pub beta: f64,
}

fn default_batteries() -> Vec<BatteryConfig> {
    (0..3_u32)
        .map(|i| BatteryConfig {
            present_charge: 5,
            capacity_charge: 5 * (1 + i),
            rate_charge: 2 * i64::from(1 + i),
            rate_discharge: 2 * i64::from(1 + i),
            alpha: 1.0 / f64::from(i + 1),
            beta: 1.0 / f64::from(2 * i + 1),
        })
        .collect()
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"generation.decay_rate"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl ScenarioConfig {
    /// Returns the default scenario: three small batteries and four
    /// generation levels.
    pub fn default_preset() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            generation: GenerationConfig::default(),
            batteries: default_batteries(),
        }
    }

    /// Returns the wide preset: a 100-level generation process with a
    /// steeper distance decay and a larger bank.
    pub fn wide() -> Self {
        Self {
            simulation: SimulationConfig {
                max_steps: 200,
                ..SimulationConfig::default()
            },
            generation: GenerationConfig {
                r_values: (-50..50).collect(),
                initial_state: 50,
                decay_rate: 0.5,
            },
            batteries: (0..3_u32)
                .map(|i| BatteryConfig {
                    present_charge: 50,
                    capacity_charge: 100 + 20 * i,
                    rate_charge: 20 + 2 * i64::from(i),
                    rate_discharge: 20 + 2 * i64::from(i),
                    alpha: 0.5,
                    beta: 0.5,
                })
                .collect(),
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["default", "wide"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "default" => Ok(Self::default_preset()),
            "wide" => Ok(Self::wide()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "scenario".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.simulation;

        if s.max_steps == 0 {
            errors.push(ConfigError {
                field: "simulation.max_steps".into(),
                message: "must be > 0".into(),
            });
        }
        if !CONTROLLERS.contains(&s.controller.as_str()) {
            errors.push(ConfigError {
                field: "simulation.controller".into(),
                message: format!(
                    "must be one of {}, got \"{}\"",
                    CONTROLLERS.join(", "),
                    s.controller
                ),
            });
        }

        let g = &self.generation;
        if g.r_values.is_empty() {
            errors.push(ConfigError {
                field: "generation.r_values".into(),
                message: "must not be empty".into(),
            });
        } else if g.initial_state >= g.r_values.len() {
            errors.push(ConfigError {
                field: "generation.initial_state".into(),
                message: format!("must be < {} (number of r_values)", g.r_values.len()),
            });
        }
        if !g.decay_rate.is_finite() || g.decay_rate < 0.0 {
            errors.push(ConfigError {
                field: "generation.decay_rate".into(),
                message: "must be finite and >= 0".into(),
            });
        }

        if self.batteries.is_empty() {
            errors.push(ConfigError {
                field: "batteries".into(),
                message: "at least one battery is required".into(),
            });
        }
        for (i, b) in self.batteries.iter().enumerate() {
            if b.capacity_charge == 0 {
                errors.push(ConfigError {
                    field: format!("batteries[{i}].capacity_charge"),
                    message: "must be > 0".into(),
                });
            }
            if b.present_charge > b.capacity_charge {
                errors.push(ConfigError {
                    field: format!("batteries[{i}].present_charge"),
                    message: "must be <= capacity_charge".into(),
                });
            }
            if b.rate_charge < 0 {
                errors.push(ConfigError {
                    field: format!("batteries[{i}].rate_charge"),
                    message: "must be >= 0".into(),
                });
            }
            if b.rate_discharge < 0 {
                errors.push(ConfigError {
                    field: format!("batteries[{i}].rate_discharge"),
                    message: "must be >= 0".into(),
                });
            }
            if !b.alpha.is_finite() || b.alpha <= 0.0 {
                errors.push(ConfigError {
                    field: format!("batteries[{i}].alpha"),
                    message: "must be finite and > 0".into(),
                });
            }
            if !b.beta.is_finite() || b.beta < 0.0 {
                errors.push(ConfigError {
                    field: format!("batteries[{i}].beta"),
                    message: "must be finite and >= 0".into(),
                });
            }
        }

        errors
    }

    /// Builds a ready stepper from this scenario.
    ///
    /// # Errors
    ///
    /// Returns the first `SimError` raised while constructing a battery,
    /// the storage system, or the generation system. Run
    /// [`ScenarioConfig::validate`] first for a full list of problems.
    pub fn build_stepper(&self) -> Result<SchedulingStepper, SimError> {
        let batteries = self
            .batteries
            .iter()
            .map(|b| {
                let model = DegradationModel::new(b.alpha, b.beta)?;
                Battery::new(
                    b.present_charge,
                    b.capacity_charge,
                    b.rate_discharge,
                    b.rate_charge,
                    model,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        let storage = StorageSystem::new(batteries)?;

        let g = &self.generation;
        let generation =
            GenerationSystem::with_distance_decay(g.initial_state, g.r_values.clone(), g.decay_rate)?;

        Ok(SchedulingStepper::new(storage, generation, self.simulation.seed)
            .with_mask_limit(self.simulation.mask_limit))
    }
}
