//! Capped percentage allocation.
//!
//! Turns a capitalization ranking into normalized weights, enforcing a
//! per-asset maximum with pro-rata redistribution of the surplus, and turns
//! weights into target quantities at snapshot prices.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::warn;

use crate::data::Snapshot;
use crate::domain::Portfolio;
use crate::error::{ConfigurationError, DataIntegrityError};

/// Rank a snapshot's assets by capitalization, descending; ties break on the
/// symbol so the ordering is deterministic.
pub fn rank_by_cap(snapshot: &Snapshot) -> Vec<(String, f64)> {
    let mut ranking: Vec<(String, f64)> = snapshot
        .iter()
        .map(|(asset, record)| (asset.clone(), record.cap))
        .collect();
    ranking.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ranking
}

/// Normalize a ranking of `(asset, capitalization)` pairs, already sorted
/// descending by capitalization, into weights summing to 1.0, capping each
/// weight at `max_allocation`.
///
/// Surplus above the cap is redistributed across the remaining tail in
/// proportion to each tail entry's share of the tail's total weight. The scan
/// is a single forward pass that stops at the first entry at-or-under the
/// cap: because redistribution scales the whole tail uniformly, the tail
/// stays sorted descending and everything past the stop is under the cap too.
///
/// When the tail cannot absorb surplus (empty, or zero total weight), the
/// entry is left uncapped so the weights still sum to 1.0; a single-asset
/// ranking therefore gets weight 1.0 regardless of the cap.
pub fn cap_allocation(
    ranking: &[(String, f64)],
    max_allocation: f64,
) -> Result<Vec<(String, f64)>, ConfigurationError> {
    let total: f64 = ranking.iter().map(|(_, cap)| cap).sum();
    if total <= 0.0 {
        return Err(ConfigurationError::ZeroCapitalization);
    }

    let mut weights: Vec<(String, f64)> = ranking
        .iter()
        .map(|(asset, cap)| (asset.clone(), cap / total))
        .collect();

    for i in 0..weights.len() {
        if weights[i].1 <= max_allocation {
            break;
        }

        let tail_sum: f64 = weights[i + 1..].iter().map(|(_, w)| w).sum();
        if tail_sum <= 0.0 {
            break;
        }

        let surplus = weights[i].1 - max_allocation;
        weights[i].1 = max_allocation;
        for entry in &mut weights[i + 1..] {
            entry.1 += surplus * entry.1 / tail_sum;
        }
    }

    Ok(weights)
}

/// Convert capped weights into target quantities: `funds * weight / price`
/// at the snapshot's prices.
///
/// An asset without a positive price cannot receive an allocation; it is
/// excluded, its weight renormalized over the remaining selection, and a
/// warning recorded. If nothing in the selection is priceable the funds have
/// nowhere to go and the call fails.
pub fn distribute_funds(
    funds: f64,
    weights: &[(String, f64)],
    snapshot: &Snapshot,
    date: NaiveDate,
) -> Result<(Portfolio, Vec<String>), DataIntegrityError> {
    let mut warnings = Vec::new();
    let mut priceable: Vec<(&str, f64, f64)> = Vec::with_capacity(weights.len());

    for (asset, weight) in weights {
        let price = snapshot.get(asset).map(|r| r.price).unwrap_or(0.0);
        if price > 0.0 {
            priceable.push((asset, *weight, price));
        } else {
            let message = format!("{date}: excluding {asset} from allocation, price is zero");
            warn!("{message}");
            warnings.push(message);
        }
    }

    if priceable.is_empty() {
        return Err(DataIntegrityError::UnpriceableSelection { date });
    }

    let weight_sum: f64 = priceable.iter().map(|(_, w, _)| w).sum();

    let holdings: BTreeMap<String, f64> = priceable
        .iter()
        .map(|(asset, weight, price)| {
            let quantity = funds * (weight / weight_sum) / price;
            (asset.to_string(), quantity)
        })
        .collect();

    Ok((Portfolio::from_quantities(holdings), warnings))
}
