//! Portfolio ledger: the actively managed holdings and the buy-and-hold
//! baseline they are measured against.
//!
//! Single-writer discipline is enforced by the API: `commit` replaces the
//! active holdings (only the rebalance engine calls it) and no mutable access
//! to the baseline exists; it is written exactly once, at initialization.

use chrono::NaiveDate;
use tracing::{debug, info};

use super::allocation::{cap_allocation, distribute_funds, rank_by_cap};
use crate::config::IndexConfig;
use crate::data::Snapshot;
use crate::domain::Portfolio;
use crate::error::SimulationError;

#[derive(Debug, Clone)]
pub struct PortfolioLedger {
    active: Portfolio,
    baseline: Portfolio,
}

impl PortfolioLedger {
    /// Distribute the initial funds over the top `index_size` assets by
    /// capitalization on the first simulated date, and snapshot that
    /// allocation as the baseline.
    pub fn initialize(
        config: &IndexConfig,
        snapshot: &Snapshot,
        date: NaiveDate,
    ) -> Result<(Self, Vec<String>), SimulationError> {
        debug!(
            "initializing portfolio with {} USD on {date}",
            config.initial_funds
        );

        let mut ranking = rank_by_cap(snapshot);
        ranking.truncate(config.index_size);

        let weights = cap_allocation(&ranking, config.max_asset_allocation)?;
        let (portfolio, warnings) =
            distribute_funds(config.initial_funds, &weights, snapshot, date)?;

        info!("initial allocation: {:?}", portfolio);

        Ok((
            Self {
                active: portfolio.clone(),
                baseline: portfolio,
            },
            warnings,
        ))
    }

    pub fn active(&self) -> &Portfolio {
        &self.active
    }

    pub fn baseline(&self) -> &Portfolio {
        &self.baseline
    }

    /// Replace the active holdings with a freshly rebalanced portfolio.
    pub fn commit(&mut self, portfolio: Portfolio) {
        self.active = portfolio;
    }
}
