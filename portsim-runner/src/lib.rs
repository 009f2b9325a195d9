//! portsim runner — backtest orchestration on top of `portsim-core`.
//!
//! This crate provides:
//! - TOML backtest configs with validation and content-addressed run ids
//! - CSV bar loading into an in-memory provider
//! - Single-run orchestration with performance metrics and an optional benchmark
//! - Artifact export (CSV, JSON, Markdown)
//! - Parallel parameter sweeps

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod sweep;

pub use config::{BacktestConfig, BacktestSection, ConfigError};
pub use data_loader::{load_csv, read_bars, LoadError, LoadedData};
pub use export::{load_artifacts, save_artifacts, ArtifactPaths, ExportError};
pub use metrics::PerformanceMetrics;
pub use runner::{
    run_backtest_from_config, run_single_backtest, BacktestResult, BenchmarkCurve, BenchmarkPoint,
    RunError, SCHEMA_VERSION,
};
pub use sweep::{run_grid, run_sweep, ParamGrid, SweepEntry, SweepResults, SweepVariant};
