//! Portfolio — asset → quantity holdings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::record::AssetRecord;

/// A set of holdings. Quantities may be fractional; committed portfolios hold
/// non-negative quantities only (signed deltas appear transiently in the
/// rebalance diff, never here).
///
/// Backed by a `BTreeMap` so iteration order, and everything derived from it
/// (candidate ordering, logs, serialized output), is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    holdings: BTreeMap<String, f64>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_quantities(holdings: BTreeMap<String, f64>) -> Self {
        Self { holdings }
    }

    /// Quantity held of `asset`; zero when absent.
    pub fn quantity(&self, asset: &str) -> f64 {
        self.holdings.get(asset).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, asset: &str) -> bool {
        self.holdings.contains_key(asset)
    }

    pub fn assets(&self) -> impl Iterator<Item = &str> {
        self.holdings.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.holdings.iter().map(|(asset, qty)| (asset.as_str(), *qty))
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    /// USD value of these holdings at the given snapshot's prices.
    ///
    /// Assets absent from the snapshot value at zero; the dataset alignment
    /// invariant means that only happens for genuinely unpriced assets.
    pub fn valuation(&self, snapshot: &BTreeMap<String, AssetRecord>) -> f64 {
        self.holdings
            .iter()
            .map(|(asset, qty)| {
                let price = snapshot.get(asset).map(|r| r.price).unwrap_or(0.0);
                qty * price
            })
            .sum()
    }

    pub fn into_quantities(self) -> BTreeMap<String, f64> {
        self.holdings
    }
}
