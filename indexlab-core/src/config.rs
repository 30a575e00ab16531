//! Immutable simulation configuration.
//!
//! Every tunable is bound into one value created up front and passed by
//! reference to the engine; no ambient parameter state. Validation happens
//! once, before a run starts, so the loop itself never re-checks parameters.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Parameters of one index simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Number of assets held after each rebalance.
    pub index_size: usize,

    /// Days between rebalances; `0` rebalances on the first calendar day of
    /// each month instead.
    pub rebalancing_period: usize,

    /// Minimum trailing volume in USD for an already-held asset to stay a
    /// candidate.
    pub primary_usd_filter: f64,

    /// Minimum trailing volume in USD for a new asset to become a candidate.
    pub secondary_usd_filter: f64,

    /// Hard cap on any single asset's post-normalization weight, in (0, 1].
    pub max_asset_allocation: f64,

    /// Fee rate applied to the USD value of every buy and sell.
    pub fee: f64,

    /// Trailing window (days) for the volume average.
    pub volume_avg_window: usize,

    /// Size of the candidate pool built from the capitalization ranking.
    pub index_candidate_size: usize,

    /// Number of top candidates admitted to the index unconditionally.
    pub primary_candidate_size: usize,

    /// End of the candidate slice in which already-held assets get priority.
    pub secondary_candidate_size: usize,

    /// Funds (USD) distributed at initialization.
    pub initial_funds: f64,

    /// Inclusive start of the simulated window; `None` means unbounded.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,

    /// Inclusive end of the simulated window; `None` means unbounded.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl Default for IndexConfig {
    /// The reference five-asset index: monthly rebalancing, 30-day volume
    /// averaging, 35% cap, 2% fee.
    fn default() -> Self {
        Self {
            index_size: 5,
            rebalancing_period: 0,
            primary_usd_filter: 600_000.0,
            secondary_usd_filter: 1_000_000.0,
            max_asset_allocation: 0.35,
            fee: 0.02,
            volume_avg_window: 30,
            index_candidate_size: 10,
            primary_candidate_size: 3,
            secondary_candidate_size: 7,
            initial_funds: 1000.0,
            start_date: None,
            end_date: None,
        }
    }
}

impl IndexConfig {
    /// Check parameter ranges and combinations.
    ///
    /// `index_size * max_asset_allocation` must reach 1.0: otherwise a
    /// full-size selection cannot be capped and still sum to full weight.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.index_size == 0 {
            return Err(ConfigurationError::IndexSizeZero);
        }
        if !(self.max_asset_allocation > 0.0 && self.max_asset_allocation <= 1.0) {
            return Err(ConfigurationError::MaxAllocationOutOfRange(
                self.max_asset_allocation,
            ));
        }
        if (self.index_size as f64) * self.max_asset_allocation < 1.0 {
            return Err(ConfigurationError::InfeasibleAllocation {
                index_size: self.index_size,
                max_allocation: self.max_asset_allocation,
            });
        }
        if self.volume_avg_window == 0 {
            return Err(ConfigurationError::VolumeWindowZero);
        }
        if self.fee < 0.0 {
            return Err(ConfigurationError::NegativeFee(self.fee));
        }
        if self.initial_funds <= 0.0 {
            return Err(ConfigurationError::InitialFundsNotPositive(
                self.initial_funds,
            ));
        }
        if self.index_candidate_size < self.index_size {
            return Err(ConfigurationError::CandidatePoolTooSmall {
                candidate: self.index_candidate_size,
                index: self.index_size,
            });
        }
        if self.primary_candidate_size > self.index_candidate_size {
            return Err(ConfigurationError::PrimaryCandidatesExceedPool {
                primary: self.primary_candidate_size,
                candidate: self.index_candidate_size,
            });
        }
        if self.secondary_candidate_size < self.primary_candidate_size {
            return Err(ConfigurationError::SecondaryBeforePrimary {
                secondary: self.secondary_candidate_size,
                primary: self.primary_candidate_size,
            });
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(ConfigurationError::StartAfterEnd { start, end });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(IndexConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_index_size() {
        let config = IndexConfig {
            index_size: 0,
            ..IndexConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigurationError::IndexSizeZero));
    }

    #[test]
    fn rejects_max_allocation_out_of_range() {
        for bad in [0.0, -0.1, 1.5] {
            let config = IndexConfig {
                max_asset_allocation: bad,
                ..IndexConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigurationError::MaxAllocationOutOfRange(_))
            ));
        }
    }

    #[test]
    fn rejects_infeasible_allocation() {
        // 5 assets capped at 15% can only reach 75% total weight.
        let config = IndexConfig {
            index_size: 5,
            max_asset_allocation: 0.15,
            ..IndexConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InfeasibleAllocation { .. })
        ));
    }

    #[test]
    fn rejects_primary_candidates_exceeding_pool() {
        let config = IndexConfig {
            index_candidate_size: 10,
            primary_candidate_size: 11,
            secondary_candidate_size: 12,
            ..IndexConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::PrimaryCandidatesExceedPool { .. })
        ));
    }

    #[test]
    fn rejects_secondary_before_primary() {
        let config = IndexConfig {
            primary_candidate_size: 5,
            secondary_candidate_size: 4,
            ..IndexConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::SecondaryBeforePrimary { .. })
        ));
    }

    #[test]
    fn rejects_inverted_date_window() {
        let config = IndexConfig {
            start_date: NaiveDate::from_ymd_opt(2021, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2020, 1, 1),
            ..IndexConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::StartAfterEnd { .. })
        ));
    }

    #[test]
    fn config_serialization_roundtrip() {
        let config = IndexConfig {
            start_date: NaiveDate::from_ymd_opt(2020, 10, 1),
            ..IndexConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let deser: IndexConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deser);
    }
}
