//! Synthetic dataset generation.
//!
//! Seeded random walks standing in for real market histories, used by the
//! CLI's `--synthetic` mode, the smoke tests, and the benches. Same seed,
//! same dataset.

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use indexlab_core::data::RawDataset;
use indexlab_core::domain::RawRecord;

/// Generate `days` consecutive days of data for `assets` synthetic assets,
/// starting at `start`.
///
/// Prices follow independent geometric random walks; capitalization is price
/// times a fixed per-asset supply, so the cap ranking shifts as prices
/// diverge; volumes wander around a per-asset base large enough to clear
/// typical USD filters.
pub fn synthetic_dataset(
    assets: usize,
    days: usize,
    start: NaiveDate,
    seed: u64,
) -> RawDataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut dataset = RawDataset::new();

    let mut prices: Vec<f64> = (0..assets)
        .map(|_| rng.gen_range(0.1..1000.0))
        .collect();
    let supplies: Vec<f64> = (0..assets)
        .map(|_| rng.gen_range(1e6..1e9))
        .collect();
    let volume_bases: Vec<f64> = (0..assets)
        .map(|_| rng.gen_range(1e5..1e8))
        .collect();

    for day in 0..days {
        let date = start + Duration::days(day as i64);
        let mut records = std::collections::BTreeMap::new();

        for asset in 0..assets {
            let drift: f64 = rng.gen_range(-0.05..0.05);
            prices[asset] = (prices[asset] * (1.0 + drift)).max(1e-6);

            let volume = volume_bases[asset] * rng.gen_range(0.5..1.5);
            records.insert(
                symbol(asset),
                RawRecord {
                    price: prices[asset],
                    cap: prices[asset] * supplies[asset],
                    volume,
                },
            );
        }

        dataset.insert(date, records);
    }

    dataset
}

fn symbol(index: usize) -> String {
    format!("SYN{index:03}")
}
