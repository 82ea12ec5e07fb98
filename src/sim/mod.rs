/// Action proposers for rollouts.
pub mod controller;
pub mod engine;
/// Markov-chain net-generation process.
pub mod generation;
pub mod kpi;
/// Combinatorial action masking.
pub mod mask;
pub mod storage;
pub mod types;
