//! Backtest runner — wires together config, data, engine, and metrics.
//!
//! Two entry points:
//! - `run_single_backtest()`: loads CSV bars from disk, then runs. Used by the CLI.
//! - `run_backtest_from_config()`: takes an already-built data provider. Used by
//!   sweeps, which share one provider across many runs.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use portsim_core::data::{CachedProvider, DataProvider};
use portsim_core::domain::{is_valid_price, PriceField};
use portsim_core::engine::{BacktestEngine, EngineError, RunResult};
use portsim_core::fingerprint::{DatasetHash, RunId};
use portsim_core::strategy::StrategyError;

use crate::config::{BacktestConfig, ConfigError};
use crate::data_loader::{load_csv, LoadError};
use crate::metrics::PerformanceMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("strategy error: {0}")]
    Strategy(#[from] StrategyError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("none of the universe symbols ({0}) appear in the loaded data")]
    NoUniverseData(String),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// One point of a rebased benchmark series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Benchmark valuation series over the run's calendar, rebased so its first
/// point equals the portfolio's first-day equity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkCurve {
    pub symbol: String,
    pub points: Vec<BenchmarkPoint>,
    pub total_return: f64,
}

impl BenchmarkCurve {
    /// Build from the benchmark's valuation prices on each snapshot date.
    /// Days without a usable price are left out. Returns `None` when the
    /// symbol has no usable price at all.
    pub fn build(symbol: &str, run: &RunResult, data: &dyn DataProvider, field: PriceField) -> Option<Self> {
        let base_equity = run.snapshots.first()?.equity;
        let prices: Vec<(NaiveDate, f64)> = run
            .snapshots
            .iter()
            .filter_map(|s| {
                data.get_price(symbol, s.date, field)
                    .filter(|p| is_valid_price(*p))
                    .map(|p| (s.date, p))
            })
            .collect();
        let &(_, first) = prices.first()?;
        let &(_, last) = prices.last()?;

        let points = prices
            .iter()
            .map(|&(date, p)| BenchmarkPoint {
                date,
                value: p / first * base_equity,
            })
            .collect();
        Some(Self {
            symbol: symbol.to_string(),
            points,
            total_return: last / first - 1.0,
        })
    }
}

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub strategy: String,
    pub config: BacktestConfig,
    /// Hash of the bars the run read, when they came from disk.
    #[serde(default)]
    pub dataset_hash: Option<DatasetHash>,
    pub metrics: PerformanceMetrics,
    #[serde(default)]
    pub benchmark: Option<BenchmarkCurve>,
    pub run: RunResult,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Load bars from `data_path` (a CSV file or directory) and run `config`.
pub fn run_single_backtest(config: &BacktestConfig, data_path: impl AsRef<Path>) -> Result<BacktestResult, RunError> {
    let loaded = load_csv(data_path)?;

    let universe = config.strategy.universe();
    let missing: Vec<&str> = universe
        .iter()
        .map(String::as_str)
        .filter(|s| !loaded.provider.symbols().any(|have| have == *s))
        .collect();
    if missing.len() == universe.len() {
        return Err(RunError::NoUniverseData(universe.join(", ")));
    }
    if !missing.is_empty() {
        warn!(missing = ?missing, "universe symbols without data are never traded");
    }

    let provider = CachedProvider::new(loaded.provider);
    let mut result = run_backtest_from_config(config, &provider)?;
    result.dataset_hash = Some(loaded.dataset_hash);
    Ok(result)
}

/// Run `config` against pre-loaded data — no I/O.
pub fn run_backtest_from_config(config: &BacktestConfig, data: &dyn DataProvider) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let run_id = config.run_id()?;
    let strategy = config.strategy.build()?;

    info!(
        run_id = run_id.short(),
        strategy = strategy.name(),
        start = %config.backtest.start_date,
        end = %config.backtest.end_date,
        "starting backtest"
    );

    let run = BacktestEngine::new(config.engine_config(), data, strategy.as_ref())?.run()?;
    let metrics = PerformanceMetrics::compute(&run);

    let benchmark = config.backtest.benchmark.as_deref().and_then(|symbol| {
        let curve = BenchmarkCurve::build(symbol, &run, data, config.backtest.valuation_field);
        if curve.is_none() {
            warn!(symbol, "benchmark has no usable prices in the run window");
        }
        curve
    });

    info!(
        run_id = run_id.short(),
        total_return = metrics.total_return,
        sharpe = metrics.sharpe,
        fills = metrics.fill_count,
        "backtest finished"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        strategy: strategy.name().to_string(),
        config: config.clone(),
        dataset_hash: None,
        metrics,
        benchmark,
        run,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use portsim_core::data::InMemoryProvider;
    use portsim_core::domain::Bar;
    use portsim_core::engine::RebalanceSchedule;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn bar(symbol: &str, day: u32, price: f64) -> Bar {
        Bar {
            date: d(day),
            symbol: symbol.into(),
            open: price,
            high: price,
            low: price,
            close: price,
            adj_close: price,
            volume: 100,
        }
    }

    fn data() -> InMemoryProvider {
        InMemoryProvider::from_bars(vec![
            bar("AAA", 2, 10.0),
            bar("AAA", 3, 10.0),
            bar("AAA", 4, 11.0),
            bar("SPY", 2, 400.0),
            bar("SPY", 4, 420.0),
        ])
    }

    fn config() -> BacktestConfig {
        BacktestConfig::from_toml_str(
            r#"
[backtest]
start_date = "2024-01-02"
end_date = "2024-01-04"
initial_cash = 1000.0
rebalance = "daily"
benchmark = "SPY"

[strategy]
type = "EQUAL_WEIGHT"
universe = ["AAA"]
"#,
        )
        .unwrap()
    }

    #[test]
    fn runs_and_reports_metrics() {
        let result = run_backtest_from_config(&config(), &data()).unwrap();
        assert_eq!(result.strategy, "equal_weight");
        assert_eq!(result.config.backtest.rebalance, RebalanceSchedule::Daily);
        assert_eq!(result.metrics.trading_days, 3);
        assert_eq!(result.run_id, config().run_id().unwrap());
        // 100 shares bought at 10 on the 3rd, marked at 11 on the 4th
        assert_eq!(result.run.fills[0].shares, 100.0);
        assert!((result.metrics.final_equity - 1100.0).abs() < 1e-9);
        assert!((result.metrics.total_return - 0.10).abs() < 1e-12);
    }

    #[test]
    fn benchmark_is_rebased_and_skips_missing_days() {
        let result = run_backtest_from_config(&config(), &data()).unwrap();
        let bench = result.benchmark.unwrap();
        assert_eq!(bench.symbol, "SPY");
        assert_eq!(bench.points.len(), 2);
        assert_eq!(bench.points[0].value, 1000.0);
        assert!((bench.points[1].value - 1050.0).abs() < 1e-9);
        assert!((bench.total_return - 0.05).abs() < 1e-12);
    }

    #[test]
    fn unknown_benchmark_is_omitted() {
        let mut cfg = config();
        cfg.backtest.benchmark = Some("NOPE".into());
        let result = run_backtest_from_config(&cfg, &data()).unwrap();
        assert!(result.benchmark.is_none());
    }

    #[test]
    fn invalid_config_is_rejected_before_running() {
        let mut cfg = config();
        cfg.backtest.initial_cash = -1.0;
        assert!(matches!(
            run_backtest_from_config(&cfg, &data()),
            Err(RunError::Config(ConfigError::Invalid(_)))
        ));
    }

    #[test]
    fn result_round_trips_through_json() {
        let result = run_backtest_from_config(&config(), &data()).unwrap();
        let json = serde_json::to_string(&result).unwrap();
        let back: BacktestResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.run_id, result.run_id);
        assert_eq!(back.config, result.config);
        assert_eq!(back.run.fills, result.run.fills);
        assert_eq!(back.schema_version, SCHEMA_VERSION);
    }
}
