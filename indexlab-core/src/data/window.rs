//! Inclusive date-window restriction.

use chrono::NaiveDate;

use super::dataset::MarketDataset;
use crate::error::ConfigurationError;

/// Drop every date outside `[start, end]` from the dataset.
///
/// Either bound may be `None` (unbounded). The date axis and the per-date
/// snapshots are pruned consistently; the asset universe is unchanged, since
/// alignment already guarantees a record per asset on every remaining date.
/// An empty result is a configuration error.
pub fn restrict(
    dataset: MarketDataset,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<MarketDataset, ConfigurationError> {
    let in_window = |date: &NaiveDate| {
        start.map_or(true, |s| *date >= s) && end.map_or(true, |e| *date <= e)
    };

    let dates: Vec<NaiveDate> = dataset
        .dates()
        .iter()
        .copied()
        .filter(|date| in_window(date))
        .collect();

    if dates.is_empty() {
        return Err(ConfigurationError::EmptyDateRange { start, end });
    }

    let assets = dataset.assets().to_vec();
    let snapshots = dataset
        .snapshots()
        .iter()
        .filter(|(date, _)| in_window(date))
        .map(|(date, snapshot)| (*date, snapshot.clone()))
        .collect();

    Ok(MarketDataset::from_parts(dates, snapshots, assets))
}
