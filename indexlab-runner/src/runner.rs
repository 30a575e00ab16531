//! Single-run driver — wires the loader, the core engine, and metrics.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use indexlab_core::data::RawDataset;
use indexlab_core::{run_index_simulation, IndexConfig, SimulationError, SimulationResult};

use crate::config::{run_id, ConfigError, RunConfig};
use crate::data_loader::{load_dataset, LoadError};
use crate::metrics::SeriesMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("data error: {0}")]
    Data(#[from] LoadError),

    #[error("simulation error: {0}")]
    Simulation(#[from] SimulationError),
}

/// Complete result of a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRunResult {
    pub run_id: String,
    pub config: IndexConfig,
    pub result: SimulationResult,
    pub metrics: SeriesMetrics,
}

/// Run one configuration against pre-loaded raw data — no I/O.
pub fn run_simulation(
    config: &IndexConfig,
    raw: &RawDataset,
) -> Result<IndexRunResult, RunError> {
    debug!("running configuration {:?}", config);

    let result = run_index_simulation(raw, config)?;
    let metrics = SeriesMetrics::compute(&result, config.initial_funds);

    Ok(IndexRunResult {
        run_id: run_id(config),
        config: config.clone(),
        result,
        metrics,
    })
}

/// Run from a TOML run file: load the referenced dataset, then simulate.
pub fn run_from_config(run: &RunConfig) -> Result<IndexRunResult, RunError> {
    let raw = load_dataset(&run.data.input)?;
    run_simulation(&run.index, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::synthetic_dataset;
    use chrono::NaiveDate;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
    }

    fn smoke_config() -> IndexConfig {
        IndexConfig {
            index_size: 3,
            rebalancing_period: 7,
            primary_usd_filter: 0.0,
            secondary_usd_filter: 0.0,
            max_asset_allocation: 0.5,
            fee: 0.01,
            volume_avg_window: 5,
            index_candidate_size: 6,
            primary_candidate_size: 2,
            secondary_candidate_size: 4,
            initial_funds: 10_000.0,
            start_date: None,
            end_date: None,
        }
    }

    #[test]
    fn smoke_run_on_synthetic_data() {
        let raw = synthetic_dataset(8, 30, start(), 42);
        let run = run_simulation(&smoke_config(), &raw).unwrap();

        assert_eq!(run.result.dates.len(), 30);
        assert_eq!(run.result.index_values.len(), 30);
        assert!(run.result.rebalances > 0);
        assert!((run.metrics.initial_value - 10_000.0).abs() < 1e-9);
        assert!(!run.run_id.is_empty());
    }

    #[test]
    fn identical_configs_share_a_run_id() {
        let raw = synthetic_dataset(8, 20, start(), 42);
        let a = run_simulation(&smoke_config(), &raw).unwrap();
        let b = run_simulation(&smoke_config(), &raw).unwrap();
        assert_eq!(a.run_id, b.run_id);
        assert_eq!(a.result, b.result);
    }

    #[test]
    fn invalid_config_surfaces_as_run_error() {
        let raw = synthetic_dataset(4, 10, start(), 1);
        let config = IndexConfig {
            index_size: 0,
            ..smoke_config()
        };
        assert!(matches!(
            run_simulation(&config, &raw),
            Err(RunError::Simulation(_))
        ));
    }
}
