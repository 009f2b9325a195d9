//! portsim CLI — run a backtest or a parameter sweep from a TOML config.
//!
//! Commands:
//! - `run` — execute one backtest over a CSV bar file or directory
//! - `sweep` — run a mean-reversion parameter grid in parallel
//!
//! Logging goes to stderr via `tracing`; set `RUST_LOG` to change the level.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use portsim_core::data::CachedProvider;
use portsim_runner::{
    load_csv, run_grid, run_single_backtest, save_artifacts, BacktestConfig, BacktestResult,
    ParamGrid, SweepResults,
};

#[derive(Parser)]
#[command(name = "portsim", about = "portsim — deterministic daily portfolio backtester")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// CSV bar file, or a directory of *.csv files.
        #[arg(long)]
        data: PathBuf,

        /// Write snapshots, fills, rejections, result.json and report.md here.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Sweep mean-reversion parameters over one config.
    Sweep {
        /// Path to a TOML config file with a MEAN_REVERSION strategy.
        #[arg(long)]
        config: PathBuf,

        /// CSV bar file, or a directory of *.csv files.
        #[arg(long)]
        data: PathBuf,

        /// Entry thresholds, comma separated (e.g. 1.0,1.5,2.0).
        #[arg(long, value_delimiter = ',')]
        entry_z: Vec<f64>,

        /// Exit thresholds, comma separated.
        #[arg(long, value_delimiter = ',')]
        exit_z: Vec<f64>,

        /// Short-horizon lookbacks, comma separated.
        #[arg(long, value_delimiter = ',')]
        lookback_short: Vec<usize>,

        /// Volatility lookbacks, comma separated.
        #[arg(long, value_delimiter = ',')]
        lookback_vol: Vec<usize>,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { config, data, out } => run_cmd(config, data, out),
        Commands::Sweep {
            config,
            data,
            entry_z,
            exit_z,
            lookback_short,
            lookback_vol,
        } => sweep_cmd(
            config,
            data,
            ParamGrid {
                lookback_short,
                lookback_vol,
                entry_z,
                exit_z,
            },
        ),
    }
}

fn load_config(path: &Path) -> Result<BacktestConfig> {
    BacktestConfig::load(path).with_context(|| format!("loading config {}", path.display()))
}

fn run_cmd(config_path: PathBuf, data: PathBuf, out: Option<PathBuf>) -> Result<()> {
    let config = load_config(&config_path)?;
    let result = run_single_backtest(&config, &data)
        .with_context(|| format!("running backtest on {}", data.display()))?;

    print_summary(&result);

    if let Some(dir) = out {
        let paths = save_artifacts(&dir, &result)
            .with_context(|| format!("saving artifacts to {}", dir.display()))?;
        println!("Artifacts saved to: {}", paths.dir.display());
    }
    Ok(())
}

fn sweep_cmd(config_path: PathBuf, data: PathBuf, grid: ParamGrid) -> Result<()> {
    if grid == ParamGrid::default() {
        bail!("nothing to sweep: pass at least one of --entry-z, --exit-z, --lookback-short, --lookback-vol");
    }
    let config = load_config(&config_path)?;
    let loaded = load_csv(&data).with_context(|| format!("loading bars from {}", data.display()))?;
    let provider = CachedProvider::new(loaded.provider);

    let results = run_grid(&config, &grid, &provider).context("expanding parameter grid")?;
    print_sweep(&results);

    let failed = results.entries.iter().filter(|e| e.outcome.is_err()).count();
    if failed == results.len() {
        bail!("all {failed} sweep variants failed");
    }
    if failed > 0 {
        warn!(failed, total = results.len(), "some sweep variants failed");
    }
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    let bt = &result.config.backtest;
    println!();
    println!("=== Backtest Summary ===");
    println!("Run:       {}", result.run_id.short());
    println!("Strategy:  {}", result.strategy);
    println!(
        "Universe:  {}",
        result.config.strategy.universe().join(", ")
    );
    println!("Period:    {} to {}", bt.start_date, bt.end_date);
    println!();
    println!("{:<24} {:>14}", "Metric", "Value");
    println!("{}", "-".repeat(39));
    for (label, value) in result.metrics.summary_rows() {
        println!("{label:<24} {value:>14}");
    }
    if let Some(bench) = &result.benchmark {
        println!(
            "{:<24} {:>13.2}%",
            format!("{} Return", bench.symbol),
            bench.total_return * 100.0
        );
    }

    if !result.run.warnings.is_empty() {
        println!();
        for w in &result.run.warnings {
            println!("warning: {w}");
        }
    }
}

fn print_sweep(results: &SweepResults) {
    let best = results.ranked_by_sharpe().first().map(|(label, _)| label.to_string());

    println!();
    println!(
        "{:<44} {:>10} {:>10} {:>8} {:>10} {:>6}",
        "Variant", "Return", "CAGR", "Sharpe", "MaxDD", "Fills"
    );
    println!("{}", "-".repeat(93));
    for entry in &results.entries {
        match &entry.outcome {
            Ok(r) => {
                let m = &r.metrics;
                let marker = if best.as_deref() == Some(entry.label.as_str()) { " *" } else { "" };
                println!(
                    "{:<44} {:>9.2}% {:>9.2}% {:>8.2} {:>9.2}% {:>6}{marker}",
                    entry.label,
                    m.total_return * 100.0,
                    m.cagr * 100.0,
                    m.sharpe,
                    m.max_drawdown * 100.0,
                    m.fill_count,
                );
            }
            Err(e) => println!("{:<44} error: {e}", entry.label),
        }
    }
}
