//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use energy_scheduling_sim::devices::{Battery, DegradationModel};
use energy_scheduling_sim::sim::engine::SchedulingStepper;
use energy_scheduling_sim::sim::generation::{DEFAULT_DECAY_RATE, GenerationSystem};
use energy_scheduling_sim::sim::storage::StorageSystem;

/// Default degradation model (alpha 1.0, beta 1.0).
pub fn unit_model() -> DegradationModel {
    DegradationModel::new(1.0, 1.0).expect("valid degradation parameters")
}

/// Battery with equal charge and discharge rates.
pub fn battery(present: u32, capacity: u32, rate: i64) -> Battery {
    Battery::new(present, capacity, rate, rate, unit_model()).expect("valid battery")
}

/// Three-battery bank with capacities 5/10/15, all holding 5 units, rate 5.
pub fn three_bank() -> StorageSystem {
    StorageSystem::new(vec![battery(5, 5, 5), battery(5, 10, 5), battery(5, 15, 5)])
        .expect("non-empty bank")
}

/// Four-level generation process starting in state 0 (net generation -4).
pub fn four_levels() -> GenerationSystem {
    GenerationSystem::with_distance_decay(0, vec![-4, -1, 1, 5], DEFAULT_DECAY_RATE)
        .expect("valid generation system")
}

/// Stepper over [`three_bank`] and [`four_levels`] with seed 42.
pub fn default_stepper() -> SchedulingStepper {
    SchedulingStepper::new(three_bank(), four_levels(), 42)
}
