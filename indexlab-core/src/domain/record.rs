//! Per-asset daily market records.
//!
//! `RawRecord` is the wire format produced by the ingestion collaborators;
//! `AssetRecord` is the enriched form the engine reads. Keeping them as two
//! types means the raw ingested data is never mutated in place: enrichment
//! builds a new dataset instead of writing derived fields into shared state.

use serde::{Deserialize, Serialize};

/// Raw ingested record for one asset on one date.
///
/// All fields default to zero so sparse input (assets missing on some dates)
/// deserializes into zero-valued records rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub cap: f64,
    #[serde(default)]
    pub volume: f64,
}

/// Enriched record: raw fields plus the trailing volume average.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AssetRecord {
    pub price: f64,
    pub cap: f64,
    pub volume: f64,
    pub volume_avg: f64,
}

impl AssetRecord {
    pub fn from_raw(raw: &RawRecord) -> Self {
        Self {
            price: raw.price,
            cap: raw.cap,
            volume: raw.volume,
            volume_avg: 0.0,
        }
    }

    /// Trailing traded value in USD, the quantity both liquidity filters
    /// compare against their thresholds.
    pub fn usd_volume(&self) -> f64 {
        self.volume_avg * self.price
    }
}
