//! Multi-battery energy-storage scheduling simulator.

pub mod config;
pub mod devices;
pub mod error;
/// Telemetry export.
pub mod io;
pub mod runner;
/// Storage, generation, masking, and stepping modules.
pub mod sim;

pub use error::SimError;
