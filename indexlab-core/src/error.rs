//! Error types for the simulation engine.
//!
//! Two kinds exist: configuration problems are fatal to a run (but must never
//! take down a batch of runs; the sweep driver collects them per run), while
//! data-integrity problems are recoverable per asset and only escalate to an
//! error when the whole selection is affected.

use chrono::NaiveDate;
use thiserror::Error;

/// A parameter set that cannot produce a valid simulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("index size must be positive")]
    IndexSizeZero,

    #[error("max asset allocation {0} is outside (0, 1]")]
    MaxAllocationOutOfRange(f64),

    #[error("index size {index_size} with max allocation {max_allocation} cannot reach weight sum 1.0")]
    InfeasibleAllocation {
        index_size: usize,
        max_allocation: f64,
    },

    #[error("volume averaging window must be positive")]
    VolumeWindowZero,

    #[error("fee rate {0} must be non-negative")]
    NegativeFee(f64),

    #[error("initial funds {0} must be positive")]
    InitialFundsNotPositive(f64),

    #[error("index candidate size {candidate} is smaller than index size {index}")]
    CandidatePoolTooSmall { candidate: usize, index: usize },

    #[error("primary candidate size {primary} exceeds index candidate size {candidate}")]
    PrimaryCandidatesExceedPool { primary: usize, candidate: usize },

    #[error("secondary candidate size {secondary} is smaller than primary candidate size {primary}")]
    SecondaryBeforePrimary { secondary: usize, primary: usize },

    #[error("start date {start} is after end date {end}")]
    StartAfterEnd { start: NaiveDate, end: NaiveDate },

    #[error("no dates remain after restricting to [{}, {}]", fmt_bound(.start), fmt_bound(.end))]
    EmptyDateRange {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },

    #[error("total capitalization of the ranking is zero")]
    ZeroCapitalization,
}

fn fmt_bound(bound: &Option<NaiveDate>) -> String {
    match bound {
        Some(date) => date.to_string(),
        None => "..".to_string(),
    }
}

/// Bad market data encountered mid-run.
///
/// A single unpriceable asset is handled in place (excluded from distribution,
/// weight renormalized, warning recorded); these variants cover the cases that
/// leave the engine with nothing to act on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataIntegrityError {
    #[error("date {0} is not present in the dataset")]
    MissingDate(NaiveDate),

    #[error("no selected asset has a positive price on {date}")]
    UnpriceableSelection { date: NaiveDate },
}

/// Any failure of a single simulation run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("data integrity error: {0}")]
    DataIntegrity(#[from] DataIntegrityError),
}
