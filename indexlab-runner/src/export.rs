//! Artifact export.
//!
//! One run saves into its own directory (keyed by run ID): `result.json`
//! with the full result, and `series.csv` with the date, baseline, and index
//! columns that plotting collaborators consume. A sweep additionally saves a
//! flat `sweep.csv` ranking table and `sweep.json` with every successful run.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::runner::IndexRunResult;
use crate::sweep::SweepResults;

/// Save one run's artifacts; returns the run directory.
pub fn save_run_artifacts(
    result: &IndexRunResult,
    output_dir: impl AsRef<Path>,
) -> Result<PathBuf> {
    let run_dir = output_dir.as_ref().join(&result.run_id[..12]);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create run directory {}", run_dir.display()))?;

    let json_path = run_dir.join("result.json");
    let file = File::create(&json_path)
        .with_context(|| format!("failed to create {}", json_path.display()))?;
    serde_json::to_writer_pretty(file, result)
        .with_context(|| format!("failed to write {}", json_path.display()))?;

    write_series_csv(
        &run_dir.join("series.csv"),
        &result.result.dates,
        &result.result.baseline_values,
        &result.result.index_values,
    )?;

    Ok(run_dir)
}

/// Write the aligned value series as `date,baseline,index` rows.
pub fn write_series_csv(
    path: &Path,
    dates: &[NaiveDate],
    baseline: &[f64],
    index: &[f64],
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create series CSV {}", path.display()))?;

    writer.write_record(["date", "baseline", "index"])?;
    for ((date, baseline_value), index_value) in dates.iter().zip(baseline).zip(index) {
        writer.write_record([
            date.to_string(),
            format!("{baseline_value:.4}"),
            format!("{index_value:.4}"),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the sweep ranking table: one row per successful run, best final
/// index value first.
pub fn write_sweep_csv(path: &Path, results: &SweepResults) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create sweep CSV {}", path.display()))?;

    writer.write_record([
        "run_id",
        "index_size",
        "rebalancing_period",
        "primary_usd_filter",
        "secondary_usd_filter",
        "max_asset_allocation",
        "volume_avg_window",
        "primary_candidate_size",
        "final_index_value",
        "final_baseline_value",
        "total_fees",
    ])?;

    for run in results.ranked_by_index_value() {
        let config = &run.config;
        writer.write_record([
            run.run_id[..12].to_string(),
            config.index_size.to_string(),
            config.rebalancing_period.to_string(),
            config.primary_usd_filter.to_string(),
            config.secondary_usd_filter.to_string(),
            config.max_asset_allocation.to_string(),
            config.volume_avg_window.to_string(),
            config.primary_candidate_size.to_string(),
            format!("{:.2}", run.result.final_index_value()),
            format!("{:.2}", run.result.final_baseline_value()),
            format!("{:.2}", run.result.total_fees),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Dump every successful run in full, for downstream tooling.
pub fn write_sweep_json(path: &Path, results: &SweepResults) -> Result<()> {
    let successes: Vec<&IndexRunResult> = results.ranked_by_index_value();
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer(file, &successes)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
