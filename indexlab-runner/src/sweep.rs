//! Parameter sweeps over index configurations.
//!
//! A grid expands into concrete configurations (invalid combinations are
//! skipped up front), each runs independently, and every run produces an
//! explicit outcome: a success value or a typed failure, collected into the
//! batch's results. A failing configuration is logged and inspectable; it
//! never aborts the rest of the batch.

use rayon::prelude::*;
use tracing::{info, warn};

use indexlab_core::data::RawDataset;
use indexlab_core::IndexConfig;

use crate::config::run_id;
use crate::runner::{run_simulation, IndexRunResult, RunError};

/// Parameter grid: the cartesian product of these vectors, minus invalid
/// combinations.
#[derive(Debug, Clone)]
pub struct SweepGrid {
    pub index_sizes: Vec<usize>,
    pub rebalancing_periods: Vec<usize>,
    pub primary_usd_filters: Vec<f64>,
    pub secondary_usd_filters: Vec<f64>,
    pub max_allocations: Vec<f64>,
    pub volume_avg_windows: Vec<usize>,
    pub primary_candidate_sizes: Vec<usize>,
}

impl SweepGrid {
    /// The comparison grid used to search for well-performing index rules.
    pub fn comparison_default(index_size: usize) -> Self {
        Self {
            index_sizes: vec![index_size],
            rebalancing_periods: vec![0, 10, 60, 180],
            primary_usd_filters: vec![300_000.0, 600_000.0, 1_000_000.0, 1_500_000.0],
            secondary_usd_filters: vec![600_000.0, 1_000_000.0, 1_500_000.0, 2_000_000.0],
            max_allocations: vec![0.2, 0.3, 0.35, 0.45, 0.5],
            volume_avg_windows: vec![20, 30, 45],
            primary_candidate_sizes: vec![3, 5, 8, 15],
        }
    }

    /// Upper bound on the number of configurations (before validity
    /// filtering).
    pub fn size(&self) -> usize {
        self.index_sizes.len()
            * self.rebalancing_periods.len()
            * self.primary_usd_filters.len()
            * self.secondary_usd_filters.len()
            * self.max_allocations.len()
            * self.volume_avg_windows.len()
            * self.primary_candidate_sizes.len()
    }

    /// Expand into concrete configurations.
    ///
    /// Combinations where the primary volume filter is not below the
    /// secondary, or where the primary candidate count exceeds the index
    /// size, are skipped. Pool sizes derive from the index size: the
    /// candidate pool is twice the index, the secondary slice extends five
    /// past the primary.
    pub fn generate_configs(&self, base: &IndexConfig) -> Vec<IndexConfig> {
        let mut configs = Vec::new();

        for &index_size in &self.index_sizes {
            for &rebalancing_period in &self.rebalancing_periods {
                for &primary in &self.primary_usd_filters {
                    for &secondary in &self.secondary_usd_filters {
                        if primary >= secondary {
                            continue;
                        }
                        for &max_allocation in &self.max_allocations {
                            for &window in &self.volume_avg_windows {
                                for &primary_candidates in &self.primary_candidate_sizes {
                                    if primary_candidates > index_size {
                                        continue;
                                    }

                                    configs.push(IndexConfig {
                                        index_size,
                                        rebalancing_period,
                                        primary_usd_filter: primary,
                                        secondary_usd_filter: secondary,
                                        max_asset_allocation: max_allocation,
                                        volume_avg_window: window,
                                        index_candidate_size: index_size * 2,
                                        primary_candidate_size: primary_candidates,
                                        secondary_candidate_size: primary_candidates + 5,
                                        ..base.clone()
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }

        configs
    }
}

/// One grid entry's outcome: the configuration and its result or failure.
#[derive(Debug)]
pub struct SweepOutcome {
    pub run_id: String,
    pub config: IndexConfig,
    pub outcome: Result<IndexRunResult, RunError>,
}

/// All outcomes of a sweep.
#[derive(Debug)]
pub struct SweepResults {
    outcomes: Vec<SweepOutcome>,
}

impl SweepResults {
    pub fn outcomes(&self) -> &[SweepOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn successes(&self) -> impl Iterator<Item = &IndexRunResult> {
        self.outcomes.iter().filter_map(|o| o.outcome.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&IndexConfig, &RunError)> {
        self.outcomes.iter().filter_map(|o| {
            o.outcome
                .as_ref()
                .err()
                .map(|error| (&o.config, error))
        })
    }

    /// Successful runs, best final index value first.
    pub fn ranked_by_index_value(&self) -> Vec<&IndexRunResult> {
        let mut ranked: Vec<&IndexRunResult> = self.successes().collect();
        ranked.sort_by(|a, b| {
            b.result
                .final_index_value()
                .partial_cmp(&a.result.final_index_value())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked
    }

    /// Successful runs, best final baseline value first.
    pub fn ranked_by_baseline_value(&self) -> Vec<&IndexRunResult> {
        let mut ranked: Vec<&IndexRunResult> = self.successes().collect();
        ranked.sort_by(|a, b| {
            b.result
                .final_baseline_value()
                .partial_cmp(&a.result.final_baseline_value())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked
    }

    pub fn best(&self) -> Option<&IndexRunResult> {
        self.ranked_by_index_value().into_iter().next()
    }
}

/// Run every configuration against the shared raw dataset.
///
/// Runs are independent (the dataset is read-only and each run's state is
/// private), so the parallel path is a plain data-parallel map.
pub fn run_sweep(
    configs: Vec<IndexConfig>,
    raw: &RawDataset,
    parallel: bool,
) -> SweepResults {
    info!("sweeping {} configurations", configs.len());

    let execute = |config: IndexConfig| {
        let outcome = run_simulation(&config, raw);
        if let Err(error) = &outcome {
            warn!("configuration failed, skipping: {error} ({config:?})");
        }
        SweepOutcome {
            run_id: run_id(&config),
            config,
            outcome,
        }
    };

    let outcomes: Vec<SweepOutcome> = if parallel {
        configs.into_par_iter().map(execute).collect()
    } else {
        configs.into_iter().map(execute).collect()
    };

    let failed = outcomes.iter().filter(|o| o.outcome.is_err()).count();
    info!(
        "sweep finished: {} succeeded, {failed} failed",
        outcomes.len() - failed
    );

    SweepResults { outcomes }
}
