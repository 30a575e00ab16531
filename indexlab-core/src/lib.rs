//! IndexLab Core — periodically-rebalanced crypto index backtesting engine.
//!
//! This crate contains the heart of the simulator:
//! - Market dataset: date-indexed per-asset records with an asset-wise view
//! - Trailing volume averaging and date-window restriction
//! - Capped percentage allocation with pro-rata surplus redistribution
//! - Portfolio ledger: actively rebalanced holdings vs a buy-and-hold baseline
//! - Rebalance engine: candidate filtering, selection, diff and fee accrual
//! - Day-by-day simulation loop producing aligned value series
//!
//! One simulation run is sequential and deterministic: the dataset is fully
//! materialized before the loop starts and is never mutated by a run, so it
//! may be shared read-only across concurrent runs of different configurations.

pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;

pub use config::IndexConfig;
pub use engine::simulation::{run_index_simulation, Simulation, SimulationResult};
pub use error::{ConfigurationError, DataIntegrityError, SimulationError};
