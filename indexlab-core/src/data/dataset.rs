//! Date-indexed market dataset.
//!
//! Built once from raw ingested records, enriched by the volume smoother,
//! restricted by the date filter, then frozen for the simulation. Alignment
//! happens at construction: every asset that appears on any date gets a
//! record (possibly all-zero) on every date, so per-asset lookups never fail.
//! Only missing *dates* are errors.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::domain::{AssetRecord, RawRecord};
use crate::error::DataIntegrityError;

/// Wire format of the normalized input: date → asset → raw record.
pub type RawDataset = BTreeMap<NaiveDate, BTreeMap<String, RawRecord>>;

/// One day's records for all assets.
pub type Snapshot = BTreeMap<String, AssetRecord>;

/// Immutable, date-indexed store of per-asset records.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketDataset {
    dates: Vec<NaiveDate>,
    snapshots: BTreeMap<NaiveDate, Snapshot>,
    assets: Vec<String>,
}

impl MarketDataset {
    /// Align raw records to a common asset universe.
    ///
    /// The date axis is the sorted set of input dates; assets missing on a
    /// date get a zero record. The raw input is only read, never mutated.
    pub fn from_raw(raw: &RawDataset) -> Self {
        let assets: BTreeSet<&String> = raw.values().flat_map(|day| day.keys()).collect();
        let assets: Vec<String> = assets.into_iter().cloned().collect();

        let mut snapshots = BTreeMap::new();
        for (date, day) in raw {
            let snapshot: Snapshot = assets
                .iter()
                .map(|asset| {
                    let record = day
                        .get(asset)
                        .map(AssetRecord::from_raw)
                        .unwrap_or_default();
                    (asset.clone(), record)
                })
                .collect();
            snapshots.insert(*date, snapshot);
        }

        let dates: Vec<NaiveDate> = snapshots.keys().copied().collect();

        Self {
            dates,
            snapshots,
            assets,
        }
    }

    pub(crate) fn from_parts(
        dates: Vec<NaiveDate>,
        snapshots: BTreeMap<NaiveDate, Snapshot>,
        assets: Vec<String>,
    ) -> Self {
        debug_assert_eq!(dates.len(), snapshots.len());
        Self {
            dates,
            snapshots,
            assets,
        }
    }

    /// The ordered, ascending date axis.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// All assets in the aligned universe, sorted.
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// All asset records on `date`.
    pub fn snapshot(&self, date: NaiveDate) -> Result<&Snapshot, DataIntegrityError> {
        self.snapshots
            .get(&date)
            .ok_or(DataIntegrityError::MissingDate(date))
    }

    /// Asset-wise view: `asset`'s record on every date, in date order.
    ///
    /// Alignment guarantees a record per date for any known asset; unknown
    /// assets yield zero records throughout.
    pub fn asset_series(&self, asset: &str) -> Vec<AssetRecord> {
        self.dates
            .iter()
            .map(|date| {
                self.snapshots[date]
                    .get(asset)
                    .copied()
                    .unwrap_or_default()
            })
            .collect()
    }

    pub(crate) fn snapshots(&self) -> &BTreeMap<NaiveDate, Snapshot> {
        &self.snapshots
    }
}
