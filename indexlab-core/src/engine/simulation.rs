//! Day-by-day simulation loop.
//!
//! Walks the restricted date sequence, rebalances on schedule, and records
//! the baseline and index valuations for every date. The whole run is
//! synchronous and deterministic; nothing here performs I/O.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::ledger::PortfolioLedger;
use super::rebalance::RebalanceEngine;
use crate::config::IndexConfig;
use crate::data::dataset::{MarketDataset, RawDataset};
use crate::data::{volume, window};
use crate::domain::Portfolio;
use crate::error::{ConfigurationError, SimulationError};

/// Everything a run produces: the date axis, the two aligned value series,
/// the cumulative fee, and the final active composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub dates: Vec<NaiveDate>,
    /// Buy-and-hold valuation per date.
    pub baseline_values: Vec<f64>,
    /// Actively rebalanced valuation per date.
    pub index_values: Vec<f64>,
    /// Cumulative trading fees across all rebalances.
    pub total_fees: f64,
    /// Number of rebalances executed.
    pub rebalances: usize,
    /// Active holdings after the last simulated date.
    pub final_portfolio: Portfolio,
    /// Data-integrity warnings collected across the run.
    pub warnings: Vec<String>,
}

impl SimulationResult {
    pub fn final_index_value(&self) -> f64 {
        self.index_values.last().copied().unwrap_or(0.0)
    }

    pub fn final_baseline_value(&self) -> f64 {
        self.baseline_values.last().copied().unwrap_or(0.0)
    }
}

/// Cumulative state carried through the loop.
#[derive(Debug, Default)]
struct SimulationState {
    total_fees: f64,
    rebalances: usize,
    baseline_values: Vec<f64>,
    index_values: Vec<f64>,
    warnings: Vec<String>,
}

/// Whether date index `i` is a rebalance date.
///
/// Never on the first simulated day (the result would equal the initial
/// allocation). A positive period rebalances every `period` days by index; a
/// zero period rebalances on the first calendar day of each month.
fn is_rebalance_date(index: usize, date: NaiveDate, period: usize) -> bool {
    if index == 0 {
        return false;
    }
    if period > 0 {
        index % period == 0
    } else {
        date.day() == 1
    }
}

/// A prepared run: validated configuration plus a frozen, enriched dataset.
pub struct Simulation<'a> {
    dataset: &'a MarketDataset,
    config: &'a IndexConfig,
}

impl<'a> Simulation<'a> {
    /// The dataset must already be volume-enriched and date-restricted; use
    /// [`run_index_simulation`] for the full pipeline from raw records.
    pub fn new(
        dataset: &'a MarketDataset,
        config: &'a IndexConfig,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;
        if dataset.is_empty() {
            return Err(ConfigurationError::EmptyDateRange {
                start: config.start_date,
                end: config.end_date,
            });
        }
        Ok(Self { dataset, config })
    }

    pub fn run(&self) -> Result<SimulationResult, SimulationError> {
        let dates = self.dataset.dates();
        info!(
            "simulation period: {} - {}",
            dates[0],
            dates[dates.len() - 1]
        );

        let first_snapshot = self.dataset.snapshot(dates[0])?;
        let (mut ledger, init_warnings) =
            PortfolioLedger::initialize(self.config, first_snapshot, dates[0])?;

        let engine = RebalanceEngine::new(self.config);
        let mut state = SimulationState {
            warnings: init_warnings,
            ..SimulationState::default()
        };

        for (i, &date) in dates.iter().enumerate() {
            let snapshot = self.dataset.snapshot(date)?;

            if is_rebalance_date(i, date, self.config.rebalancing_period) {
                let outcome = engine.rebalance(snapshot, date, &mut ledger)?;
                state.total_fees += outcome.fee;
                state.rebalances += 1;
                state.warnings.extend(outcome.warnings);

                debug!(
                    "baseline portfolio value: {:.2}",
                    ledger.baseline().valuation(snapshot)
                );
            }

            state
                .baseline_values
                .push(ledger.baseline().valuation(snapshot));
            state.index_values.push(ledger.active().valuation(snapshot));
        }

        info!(
            "final values: baseline {:.2}, index {:.2}, fees {:.2}",
            state.baseline_values.last().copied().unwrap_or(0.0),
            state.index_values.last().copied().unwrap_or(0.0),
            state.total_fees
        );

        Ok(SimulationResult {
            dates: dates.to_vec(),
            baseline_values: state.baseline_values,
            index_values: state.index_values,
            total_fees: state.total_fees,
            rebalances: state.rebalances,
            final_portfolio: ledger.active().clone(),
            warnings: state.warnings,
        })
    }
}

/// Full pipeline: validate, align, enrich with the trailing volume average,
/// restrict to the configured window, then run.
///
/// The volume average is computed over the *unrestricted* date axis so the
/// first days of the window see real trailing history.
pub fn run_index_simulation(
    raw: &RawDataset,
    config: &IndexConfig,
) -> Result<SimulationResult, SimulationError> {
    config.validate()?;

    let dataset = MarketDataset::from_raw(raw);
    let dataset = volume::smooth(&dataset, config.volume_avg_window);
    let dataset = window::restrict(dataset, config.start_date, config.end_date)?;

    Simulation::new(&dataset, config)?.run()
}
