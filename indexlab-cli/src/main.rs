//! IndexLab CLI — crypto index backtesting commands.
//!
//! Commands:
//! - `fetch` — download daily price/cap/volume histories from CoinGecko
//! - `merge` — merge per-asset download files into one normalized dataset
//! - `run` — simulate one index configuration and save artifacts
//! - `sweep` — run a parameter grid and rank the configurations

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use indexlab_core::data::RawDataset;
use indexlab_core::IndexConfig;
use indexlab_runner::export::{save_run_artifacts, write_sweep_csv, write_sweep_json};
use indexlab_runner::fetch::{CoinGeckoClient, CoinSpec};
use indexlab_runner::runner::run_simulation;
use indexlab_runner::sweep::{run_sweep, SweepGrid};
use indexlab_runner::synthetic::synthetic_dataset;
use indexlab_runner::{load_dataset, merge_datasets, IndexRunResult, RunConfig};

#[derive(Parser)]
#[command(name = "indexlab", about = "IndexLab — crypto index backtesting")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download daily price, cap, and volume histories from CoinGecko.
    Fetch {
        /// Assets as SYMBOL=coingecko-id pairs (e.g. BTC=bitcoin ETH=ethereum).
        #[arg(required = true)]
        coins: Vec<String>,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD).
        #[arg(long)]
        end: String,

        /// Output file for the normalized dataset.
        #[arg(long, default_value = "input_data.json")]
        output: PathBuf,
    },
    /// Merge per-asset download files into one normalized dataset.
    Merge {
        /// Input dataset files, applied in order (later files win).
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output file.
        #[arg(long, default_value = "input_data.json")]
        output: PathBuf,
    },
    /// Simulate one index configuration.
    Run {
        /// Path to a TOML run config ([index] parameters + [data] input).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Normalized dataset (used when no config file is given).
        #[arg(long)]
        input: Option<PathBuf>,

        /// Use a generated synthetic dataset instead of an input file.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Index size (ignored with --config).
        #[arg(long, default_value_t = 5)]
        index_size: usize,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD).
        #[arg(long)]
        end: Option<String>,

        /// Output directory for run artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Run the comparison grid over one dataset and rank configurations.
    Sweep {
        /// Normalized dataset.
        #[arg(long)]
        input: Option<PathBuf>,

        /// Use a generated synthetic dataset instead of an input file.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Index size the grid is built around.
        #[arg(long, default_value_t = 5)]
        index_size: usize,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD).
        #[arg(long)]
        end: Option<String>,

        /// Run configurations sequentially instead of in parallel.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// How many top configurations to print.
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Output directory for sweep tables.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            coins,
            start,
            end,
            output,
        } => run_fetch(coins, &start, &end, output),
        Commands::Merge { files, output } => run_merge(files, output),
        Commands::Run {
            config,
            input,
            synthetic,
            index_size,
            start,
            end,
            output_dir,
        } => run_single(config, input, synthetic, index_size, start, end, output_dir),
        Commands::Sweep {
            input,
            synthetic,
            index_size,
            start,
            end,
            sequential,
            top,
            output_dir,
        } => run_sweep_cmd(
            input, synthetic, index_size, start, end, sequential, top, output_dir,
        ),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{raw}', expected YYYY-MM-DD"))
}

fn run_fetch(coins: Vec<String>, start: &str, end: &str, output: PathBuf) -> Result<()> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;

    let specs: Vec<CoinSpec> = coins
        .iter()
        .map(|c| CoinSpec::parse(c))
        .collect::<Result<_, _>>()?;

    let client = CoinGeckoClient::default();
    let dataset = client.fetch_dataset(&specs, start, end)?;

    let json = serde_json::to_string(&dataset)?;
    std::fs::write(&output, json)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "Fetched {} assets over {} dates into {}",
        specs.len(),
        dataset.len(),
        output.display()
    );
    Ok(())
}

fn run_merge(files: Vec<PathBuf>, output: PathBuf) -> Result<()> {
    let merged = merge_datasets(&files)?;

    let json = serde_json::to_string(&merged)?;
    std::fs::write(&output, json)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "Merged {} files into {} ({} dates)",
        files.len(),
        output.display(),
        merged.len()
    );
    Ok(())
}

/// Load the dataset for run/sweep: an input file, or a synthetic fallback.
fn load_input(input: Option<PathBuf>, synthetic: bool) -> Result<RawDataset> {
    match (input, synthetic) {
        (Some(_), true) => bail!("--input and --synthetic are mutually exclusive"),
        (Some(path), false) => Ok(load_dataset(&path)?),
        (None, true) => {
            let start = NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid date");
            Ok(synthetic_dataset(50, 730, start, 42))
        }
        (None, false) => bail!("one of --input or --synthetic is required"),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_single(
    config_path: Option<PathBuf>,
    input: Option<PathBuf>,
    synthetic: bool,
    index_size: usize,
    start: Option<String>,
    end: Option<String>,
    output_dir: PathBuf,
) -> Result<()> {
    let (config, raw) = if let Some(path) = config_path {
        if input.is_some() || synthetic {
            bail!("--config and --input/--synthetic are mutually exclusive");
        }
        let run_config = RunConfig::from_file(&path)?;
        let raw = load_dataset(&run_config.data.input)?;
        (run_config.index, raw)
    } else {
        let raw = load_input(input, synthetic)?;
        let config = IndexConfig {
            index_size,
            index_candidate_size: index_size * 2,
            primary_candidate_size: IndexConfig::default()
                .primary_candidate_size
                .min(index_size),
            start_date: start.as_deref().map(parse_date).transpose()?,
            end_date: end.as_deref().map(parse_date).transpose()?,
            ..IndexConfig::default()
        };
        (config, raw)
    };

    let run = run_simulation(&config, &raw)?;
    print_summary(&run);

    let run_dir = save_run_artifacts(&run, &output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_sweep_cmd(
    input: Option<PathBuf>,
    synthetic: bool,
    index_size: usize,
    start: Option<String>,
    end: Option<String>,
    sequential: bool,
    top: usize,
    output_dir: PathBuf,
) -> Result<()> {
    let raw = load_input(input, synthetic)?;

    let base = IndexConfig {
        start_date: start.as_deref().map(parse_date).transpose()?,
        end_date: end.as_deref().map(parse_date).transpose()?,
        ..IndexConfig::default()
    };

    let grid = SweepGrid::comparison_default(index_size);
    let configs = grid.generate_configs(&base);
    println!("Sweeping {} configurations...", configs.len());

    let results = run_sweep(configs, &raw, !sequential);

    println!();
    println!("=== Best configurations by final index value ===");
    for run in results.ranked_by_index_value().iter().take(top) {
        let c = &run.config;
        println!(
            "{:>10.2} USD (baseline {:>10.2}, fees {:>8.2}): rebalancing {}, filters {}/{}, cap {}, window {}, primary {}",
            run.result.final_index_value(),
            run.result.final_baseline_value(),
            run.result.total_fees,
            c.rebalancing_period,
            c.primary_usd_filter,
            c.secondary_usd_filter,
            c.max_asset_allocation,
            c.volume_avg_window,
            c.primary_candidate_size,
        );
    }

    let failed = results.failures().count();
    if failed > 0 {
        println!();
        println!("{failed} configuration(s) failed:");
        for (config, error) in results.failures() {
            println!(
                "  rebalancing {}, cap {}: {error}",
                config.rebalancing_period, config.max_asset_allocation
            );
        }
    }

    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    write_sweep_csv(&output_dir.join("sweep.csv"), &results)?;
    write_sweep_json(&output_dir.join("sweep.json"), &results)?;
    println!();
    println!("Sweep tables saved to: {}", output_dir.display());

    Ok(())
}

fn print_summary(run: &IndexRunResult) {
    let result = &run.result;
    let metrics = &run.metrics;

    println!();
    println!("=== Simulation Result ===");
    println!("Run ID:         {}", &run.run_id[..12]);
    println!(
        "Period:         {} to {} ({} days)",
        result.dates.first().map(|d| d.to_string()).unwrap_or_default(),
        result.dates.last().map(|d| d.to_string()).unwrap_or_default(),
        result.dates.len()
    );
    println!("Rebalances:     {}", result.rebalances);
    println!();
    println!("--- Performance ---");
    println!("Initial funds:  {:.2} USD", metrics.initial_value);
    println!(
        "Index:          {:.2} USD ({:+.2}%)",
        metrics.final_index_value,
        metrics.index_return * 100.0
    );
    println!(
        "Baseline:       {:.2} USD ({:+.2}%)",
        metrics.final_baseline_value,
        metrics.baseline_return * 100.0
    );
    println!(
        "Outperformance: {:+.2}%",
        metrics.outperformance * 100.0
    );
    println!("Max drawdown:   {:.2}%", metrics.max_drawdown * 100.0);
    println!(
        "Fees:           {:.2} USD ({:.2}% of initial funds)",
        result.total_fees,
        metrics.fee_drag * 100.0
    );

    if !result.warnings.is_empty() {
        println!();
        for warning in &result.warnings {
            println!("WARNING: {warning}");
        }
    }
    println!();
}
