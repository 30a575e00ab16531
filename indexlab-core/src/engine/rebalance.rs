//! Rebalance engine.
//!
//! On a rebalance date: filter candidates by trailing USD volume, rank and
//! select the new index composition (held assets get priority in the
//! secondary slice), compute capped target weights, convert them into target
//! quantities, derive buy/sell deltas against the current holdings, accrue
//! the fee, and commit.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::allocation::{cap_allocation, distribute_funds, rank_by_cap};
use super::ledger::PortfolioLedger;
use crate::config::IndexConfig;
use crate::data::Snapshot;
use crate::domain::Portfolio;
use crate::error::SimulationError;

/// What one rebalance did.
#[derive(Debug, Clone)]
pub struct RebalanceOutcome {
    pub date: NaiveDate,
    /// USD value of the holdings immediately before reallocation.
    pub portfolio_value: f64,
    /// Fee accrued by this rebalance's buys and sells.
    pub fee: f64,
    /// The new index composition, capitalization-descending.
    pub selected: Vec<String>,
    /// Data-integrity warnings (assets excluded for zero price).
    pub warnings: Vec<String>,
}

pub struct RebalanceEngine<'a> {
    config: &'a IndexConfig,
}

impl<'a> RebalanceEngine<'a> {
    pub fn new(config: &'a IndexConfig) -> Self {
        Self { config }
    }

    /// Execute a full rebalance against `ledger` at `date`.
    ///
    /// The committed holdings distribute `portfolio_value - fee`, so the
    /// post-rebalance valuation equals the pre-rebalance valuation minus the
    /// accrued fee.
    pub fn rebalance(
        &self,
        snapshot: &Snapshot,
        date: NaiveDate,
        ledger: &mut PortfolioLedger,
    ) -> Result<RebalanceOutcome, SimulationError> {
        info!("rebalancing on {date}");

        let candidates = self.select_candidates(snapshot, ledger.active());
        let selected = self.select_index(&candidates, ledger.active());
        info!("index composition: {selected:?}");

        let ranking: Vec<(String, f64)> = selected
            .iter()
            .map(|asset| {
                let cap = snapshot.get(asset).map(|r| r.cap).unwrap_or(0.0);
                (asset.clone(), cap)
            })
            .collect();
        let weights = cap_allocation(&ranking, self.config.max_asset_allocation)?;
        debug!("capped allocation: {weights:?}");

        let portfolio_value = ledger.active().valuation(snapshot);

        // Provisional targets over the full value; the fee is derived from
        // the deltas they imply, then funded by shrinking the distribution.
        let (provisional, warnings) =
            distribute_funds(portfolio_value, &weights, snapshot, date)?;
        let fee = self.turnover_fee(ledger.active(), &provisional, snapshot);

        let scale = if portfolio_value > 0.0 {
            ((portfolio_value - fee) / portfolio_value).max(0.0)
        } else {
            0.0
        };
        let committed = Portfolio::from_quantities(
            provisional
                .iter()
                .map(|(asset, qty)| (asset.to_string(), qty * scale))
                .collect(),
        );

        info!("portfolio value: {portfolio_value:.2} USD, fee: {fee:.4} USD");
        debug!("new allocation: {committed:?}");

        ledger.commit(committed);

        Ok(RebalanceOutcome {
            date,
            portfolio_value,
            fee,
            selected,
            warnings,
        })
    }

    /// Build the candidate pool.
    ///
    /// Held assets survive when their trailing USD volume clears the primary
    /// threshold; the capitalization ranking tops the pool up with assets
    /// clearing the secondary threshold. If the pool is still short, the top
    /// of the ranking is admitted regardless of volume.
    fn select_candidates(&self, snapshot: &Snapshot, active: &Portfolio) -> Vec<String> {
        let mut candidates: Vec<String> = Vec::new();

        debug!("primary filtering:");
        for asset in active.assets() {
            let record = snapshot.get(asset).copied().unwrap_or_default();
            debug!(
                "  {asset}: {:.0} USD (avg volume {:.2}, price {:.4})",
                record.usd_volume(),
                record.volume_avg,
                record.price
            );
            if record.usd_volume() > self.config.primary_usd_filter {
                candidates.push(asset.to_string());
            }
        }
        debug!("preserved assets: {candidates:?}");

        let ranking = rank_by_cap(snapshot);

        debug!("secondary filtering:");
        for (asset, _) in ranking.iter().take(self.config.index_candidate_size) {
            if !candidates.contains(asset) {
                let record = snapshot.get(asset).copied().unwrap_or_default();
                if record.usd_volume() > self.config.secondary_usd_filter {
                    candidates.push(asset.clone());
                }
            }
            if candidates.len() >= self.config.index_candidate_size {
                break;
            }
        }

        if candidates.len() < self.config.index_candidate_size {
            for (asset, _) in ranking.iter().take(self.config.index_candidate_size) {
                if !candidates.contains(asset) {
                    candidates.push(asset.clone());
                }
            }
            warn!(
                "volume filters left the pool short, admitted top-capitalization assets: {candidates:?}"
            );
        }

        candidates.sort_by(|a, b| {
            let cap_a = snapshot.get(a).map(|r| r.cap).unwrap_or(0.0);
            let cap_b = snapshot.get(b).map(|r| r.cap).unwrap_or(0.0);
            cap_b
                .partial_cmp(&cap_a)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.cmp(b))
        });
        debug!("candidate pool: {candidates:?}");

        candidates
    }

    /// Pick the index composition from the capitalization-sorted candidates.
    ///
    /// The first `primary_candidate_size` enter unconditionally. Within the
    /// slice up to `secondary_candidate_size`, already-held assets enter even
    /// when better-capitalized newcomers exist. Remaining slots fill from the
    /// candidate ranking in order.
    fn select_index(&self, candidates: &[String], active: &Portfolio) -> Vec<String> {
        let mut selected: Vec<String> = candidates
            .iter()
            .take(self.config.primary_candidate_size)
            .cloned()
            .collect();

        let secondary_slice = candidates
            .iter()
            .take(self.config.secondary_candidate_size)
            .skip(self.config.primary_candidate_size);
        for asset in secondary_slice {
            if active.contains(asset) && selected.len() < self.config.index_size {
                selected.push(asset.clone());
            }
        }

        for asset in candidates {
            if selected.len() >= self.config.index_size {
                break;
            }
            if !selected.contains(asset) {
                selected.push(asset.clone());
            }
        }

        selected
    }

    /// Fee on the USD value of every buy and sell needed to move from `old`
    /// to `new`: assets fully exited sell their whole quantity, new entrants
    /// buy theirs.
    fn turnover_fee(&self, old: &Portfolio, new: &Portfolio, snapshot: &Snapshot) -> f64 {
        let assets: BTreeSet<&str> = old.assets().chain(new.assets()).collect();

        assets
            .iter()
            .map(|asset| {
                let delta = new.quantity(asset) - old.quantity(asset);
                let price = snapshot.get(*asset).map(|r| r.price).unwrap_or(0.0);
                delta.abs() * price * self.config.fee
            })
            .sum()
    }
}
