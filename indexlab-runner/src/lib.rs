//! IndexLab Runner — orchestration around the core engine.
//!
//! - TOML run configuration and content-addressed run IDs
//! - Dataset loading and merging from normalized JSON
//! - CoinGecko ingestion of daily price/cap/volume histories
//! - Synthetic dataset generation for smoke runs and benches
//! - Single-run driver with summary metrics
//! - Parameter sweeps with per-run outcomes and ranking
//! - CSV/JSON artifact export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod fetch;
pub mod metrics;
pub mod runner;
pub mod sweep;
pub mod synthetic;

pub use config::{run_id, RunConfig};
pub use data_loader::{load_dataset, merge_datasets};
pub use export::{save_run_artifacts, write_sweep_csv, write_sweep_json};
pub use metrics::SeriesMetrics;
pub use runner::{run_from_config, run_simulation, IndexRunResult, RunError};
pub use sweep::{run_sweep, SweepGrid, SweepOutcome, SweepResults};
