//! End-to-end simulation tests on small handcrafted datasets.

use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

use indexlab_core::config::IndexConfig;
use indexlab_core::data::dataset::RawDataset;
use indexlab_core::domain::RawRecord;
use indexlab_core::error::{ConfigurationError, SimulationError};
use indexlab_core::run_index_simulation;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// A dataset of `assets` assets over consecutive days starting at `start`.
/// Prices drift linearly per asset so valuations move between rebalances;
/// caps and volumes are constant and generous enough to clear any filter
/// used in these tests.
fn drifting_dataset(assets: &[&str], start: &str, days: usize) -> RawDataset {
    let start = date(start);
    let mut raw = RawDataset::new();
    for day in 0..days {
        let mut records = BTreeMap::new();
        for (rank, asset) in assets.iter().enumerate() {
            let base = 100.0 - 10.0 * rank as f64;
            records.insert(
                asset.to_string(),
                RawRecord {
                    price: base + day as f64 * (rank as f64 + 1.0) * 0.1,
                    cap: 1_000_000.0 * (assets.len() - rank) as f64,
                    volume: 500_000.0,
                },
            );
        }
        raw.insert(start + Duration::days(day as i64), records);
    }
    raw
}

fn small_config() -> IndexConfig {
    IndexConfig {
        index_size: 3,
        rebalancing_period: 0,
        primary_usd_filter: 1000.0,
        secondary_usd_filter: 2000.0,
        max_asset_allocation: 0.5,
        fee: 0.01,
        volume_avg_window: 5,
        index_candidate_size: 4,
        primary_candidate_size: 2,
        secondary_candidate_size: 3,
        initial_funds: 10_000.0,
        start_date: None,
        end_date: None,
    }
}

#[test]
fn series_cover_every_simulated_date() {
    let raw = drifting_dataset(&["AAA", "BBB", "CCC", "DDD"], "2020-01-15", 40);
    let result = run_index_simulation(&raw, &small_config()).unwrap();

    assert_eq!(result.dates.len(), 40);
    assert_eq!(result.baseline_values.len(), 40);
    assert_eq!(result.index_values.len(), 40);
    assert_eq!(result.dates[0], date("2020-01-15"));
}

#[test]
fn monthly_schedule_rebalances_on_the_first() {
    // Jan 15 .. Feb 23: exactly one first-of-month inside, Feb 1.
    let raw = drifting_dataset(&["AAA", "BBB", "CCC", "DDD"], "2020-01-15", 40);
    let result = run_index_simulation(&raw, &small_config()).unwrap();

    assert_eq!(result.rebalances, 1);
    assert!(result.total_fees > 0.0);
}

#[test]
fn fixed_period_rebalances_by_index() {
    let config = IndexConfig {
        rebalancing_period: 10,
        ..small_config()
    };
    let raw = drifting_dataset(&["AAA", "BBB", "CCC", "DDD"], "2020-01-15", 40);
    let result = run_index_simulation(&raw, &config).unwrap();

    // Indices 10, 20, 30 rebalance; index 0 never does.
    assert_eq!(result.rebalances, 3);
}

#[test]
fn first_day_starts_at_initial_funds() {
    let raw = drifting_dataset(&["AAA", "BBB", "CCC", "DDD"], "2020-01-15", 10);
    let config = small_config();
    let result = run_index_simulation(&raw, &config).unwrap();

    assert!((result.index_values[0] - config.initial_funds).abs() < 1e-6);
    assert!((result.baseline_values[0] - config.initial_funds).abs() < 1e-6);
}

#[test]
fn baseline_and_index_agree_until_the_first_rebalance() {
    let config = IndexConfig {
        rebalancing_period: 10,
        ..small_config()
    };
    let raw = drifting_dataset(&["AAA", "BBB", "CCC", "DDD"], "2020-01-15", 25);
    let result = run_index_simulation(&raw, &config).unwrap();

    for i in 0..10 {
        assert!(
            (result.baseline_values[i] - result.index_values[i]).abs() < 1e-9,
            "series diverged at index {i} before any rebalance"
        );
    }
    // After the rebalance the fee separates them.
    assert!(result.index_values[10] < result.baseline_values[10]);
}

#[test]
fn value_is_conserved_across_a_rebalance_boundary() {
    // 15 days, period 10: exactly one rebalance, at index 10. Until then the
    // active holdings equal the baseline, so the pre-rebalance value at the
    // boundary is the baseline valuation; the recorded post-rebalance index
    // value must be that minus the run's (single) fee.
    let config = IndexConfig {
        rebalancing_period: 10,
        ..small_config()
    };
    let raw = drifting_dataset(&["AAA", "BBB", "CCC", "DDD"], "2020-01-15", 15);
    let result = run_index_simulation(&raw, &config).unwrap();

    assert_eq!(result.rebalances, 1);
    let boundary = 10;
    let expected = result.baseline_values[boundary] - result.total_fees;
    assert!(
        (result.index_values[boundary] - expected).abs() < 1e-9,
        "post-rebalance value {} != pre-rebalance value minus fee {}",
        result.index_values[boundary],
        expected
    );
}

#[test]
fn date_window_restricts_the_run() {
    let config = IndexConfig {
        start_date: Some(date("2020-01-20")),
        end_date: Some(date("2020-01-29")),
        ..small_config()
    };
    let raw = drifting_dataset(&["AAA", "BBB", "CCC", "DDD"], "2020-01-15", 40);
    let result = run_index_simulation(&raw, &config).unwrap();

    assert_eq!(result.dates.len(), 10);
    assert_eq!(result.dates[0], date("2020-01-20"));
    assert_eq!(*result.dates.last().unwrap(), date("2020-01-29"));
}

#[test]
fn empty_window_fails_with_configuration_error() {
    let config = IndexConfig {
        start_date: Some(date("2030-01-01")),
        ..small_config()
    };
    let raw = drifting_dataset(&["AAA", "BBB", "CCC", "DDD"], "2020-01-15", 10);
    let result = run_index_simulation(&raw, &config);

    assert!(matches!(
        result,
        Err(SimulationError::Configuration(
            ConfigurationError::EmptyDateRange { .. }
        ))
    ));
}

#[test]
fn invalid_config_fails_before_touching_data() {
    let config = IndexConfig {
        index_candidate_size: 2,
        index_size: 3,
        ..small_config()
    };
    let result = run_index_simulation(&RawDataset::new(), &config);

    assert!(matches!(
        result,
        Err(SimulationError::Configuration(
            ConfigurationError::CandidatePoolTooSmall { .. }
        ))
    ));
}

#[test]
fn final_portfolio_holds_index_size_assets() {
    let raw = drifting_dataset(&["AAA", "BBB", "CCC", "DDD", "EEE"], "2020-01-15", 40);
    let config = IndexConfig {
        index_candidate_size: 5,
        ..small_config()
    };
    let result = run_index_simulation(&raw, &config).unwrap();

    assert_eq!(result.final_portfolio.len(), config.index_size);
}

#[test]
fn fees_accumulate_monotonically_over_more_rebalances() {
    let raw = drifting_dataset(&["AAA", "BBB", "CCC", "DDD"], "2020-01-15", 40);

    let sparse = IndexConfig {
        rebalancing_period: 20,
        ..small_config()
    };
    let dense = IndexConfig {
        rebalancing_period: 5,
        ..small_config()
    };

    let sparse_result = run_index_simulation(&raw, &sparse).unwrap();
    let dense_result = run_index_simulation(&raw, &dense).unwrap();

    assert!(dense_result.rebalances > sparse_result.rebalances);
    assert!(dense_result.total_fees >= sparse_result.total_fees);
}

#[test]
fn runs_share_the_dataset_without_interference() {
    // Two configurations over the same raw data: the first run must not
    // perturb the second (the dataset is read-only to a run).
    let raw = drifting_dataset(&["AAA", "BBB", "CCC", "DDD"], "2020-01-15", 30);
    let config = small_config();

    let first = run_index_simulation(&raw, &config).unwrap();
    let second = run_index_simulation(&raw, &config).unwrap();

    assert_eq!(first, second);
}
