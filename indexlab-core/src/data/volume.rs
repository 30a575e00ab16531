//! Trailing volume average.
//!
//! For each asset, `volume_avg` at date index `i` is the sum of raw volumes
//! over the window ending at `i`, divided by the full window length, also
//! for the shorter leading windows where fewer than `window` observations
//! exist. The average therefore ramps up from zero over the first `window`
//! days; downstream USD-volume filters see exactly this arithmetic.

use chrono::NaiveDate;

use super::dataset::{MarketDataset, Snapshot};

/// Build an enriched copy of `dataset` with `volume_avg` populated.
///
/// Raw price/cap/volume fields are carried over untouched. `window` must be
/// positive (validated by the configuration before any run).
pub fn smooth(dataset: &MarketDataset, window: usize) -> MarketDataset {
    let dates: Vec<NaiveDate> = dataset.dates().to_vec();
    let mut snapshots = dataset.snapshots().clone();

    for asset in dataset.assets() {
        let volumes: Vec<f64> = dataset
            .asset_series(asset)
            .iter()
            .map(|r| r.volume)
            .collect();

        let mut rolling_sum = 0.0;
        for (i, date) in dates.iter().enumerate() {
            rolling_sum += volumes[i];
            if i >= window {
                rolling_sum -= volumes[i - window];
            }

            let record = snapshots
                .get_mut(date)
                .and_then(|snapshot: &mut Snapshot| snapshot.get_mut(asset));
            if let Some(record) = record {
                record.volume_avg = rolling_sum / window as f64;
            }
        }
    }

    MarketDataset::from_parts(dates, snapshots, dataset.assets().to_vec())
}
