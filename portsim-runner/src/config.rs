//! TOML backtest configuration.
//!
//! A config file has three sections:
//!
//! ```toml
//! [backtest]
//! start_date = "2022-01-03"
//! end_date = "2022-12-30"
//! initial_cash = 100000.0
//! rebalance = "daily"
//! benchmark = "SPY"
//!
//! [strategy]
//! type = "MEAN_REVERSION"
//! universe = ["NVDA", "ORCL"]
//!
//! [execution]
//! fill_price = "next_open"
//! cost = { type = "BASIS_POINTS", commission_bps = 1.0, slippage_bps = 5.0 }
//! ```

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use portsim_core::domain::PriceField;
use portsim_core::engine::{EngineConfig, EngineError, ExecutionConfig, RebalanceSchedule};
use portsim_core::fingerprint::{self, RunId};
use portsim_core::strategy::{StrategyConfig, StrategyError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("invalid strategy: {0}")]
    Strategy(#[from] StrategyError),
    #[error("failed to fingerprint config: {0}")]
    Fingerprint(#[from] serde_json::Error),
}

/// The `[backtest]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSection {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_cash: f64,
    #[serde(default)]
    pub rebalance: RebalanceSchedule,
    #[serde(default)]
    pub valuation_field: PriceField,
    /// Symbol whose valuation series is reported alongside the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<String>,
}

/// Complete, reproducible description of one backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

impl BacktestConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bt = &self.backtest;
        if bt.start_date > bt.end_date {
            return Err(ConfigError::Invalid(format!(
                "start_date {} is after end_date {}",
                bt.start_date, bt.end_date
            )));
        }
        if !bt.initial_cash.is_finite() || bt.initial_cash <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "initial_cash must be positive and finite, got {}",
                bt.initial_cash
            )));
        }
        if let Some(benchmark) = &bt.benchmark {
            if benchmark.trim().is_empty() {
                return Err(ConfigError::Invalid("benchmark symbol is empty".into()));
            }
        }
        self.execution.cost.validate()?;
        self.strategy.validate()?;
        Ok(())
    }

    /// Engine-level view of this config.
    pub fn engine_config(&self) -> EngineConfig {
        let bt = &self.backtest;
        EngineConfig::new(bt.start_date, bt.end_date, bt.initial_cash)
            .with_rebalance(bt.rebalance)
            .with_valuation_field(bt.valuation_field)
            .with_execution(self.execution)
    }

    /// Content hash of everything that affects the run's outcome.
    ///
    /// The benchmark is reporting-only and does not change the id.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        Ok(fingerprint::run_id(&self.engine_config(), &self.strategy)?)
    }
}
