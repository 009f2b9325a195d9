//! Parameter sweeps over the mean-reversion strategy.
//!
//! A `ParamGrid` expands a base config into one config per parameter
//! combination; `run_sweep` runs them in parallel with rayon. Each run builds
//! its own engine and portfolio and shares only the read-only data provider.

use rayon::prelude::*;

use portsim_core::data::DataProvider;
use portsim_core::strategy::{MeanReversionParams, StrategyConfig};

use crate::config::{BacktestConfig, ConfigError};
use crate::runner::{run_backtest_from_config, BacktestResult, RunError};

/// Values to try for each mean-reversion parameter. An empty list keeps the
/// base config's value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamGrid {
    pub lookback_short: Vec<usize>,
    pub lookback_vol: Vec<usize>,
    pub entry_z: Vec<f64>,
    pub exit_z: Vec<f64>,
}

impl ParamGrid {
    /// Sweep only the entry threshold.
    pub fn entry_z(values: impl Into<Vec<f64>>) -> Self {
        Self {
            entry_z: values.into(),
            ..Self::default()
        }
    }

    /// Upper bound on the number of configurations (before invalid
    /// lookback pairs are dropped).
    pub fn size(&self) -> usize {
        [
            self.lookback_short.len(),
            self.lookback_vol.len(),
            self.entry_z.len(),
            self.exit_z.len(),
        ]
        .iter()
        .map(|&n| n.max(1))
        .product()
    }

    /// Expand `base` into one labelled config per combination. Combinations
    /// with `lookback_short > lookback_vol` are skipped.
    pub fn generate_configs(&self, base: &BacktestConfig) -> Result<Vec<SweepVariant>, ConfigError> {
        let StrategyConfig::MeanReversion(params) = &base.strategy else {
            return Err(ConfigError::Invalid(format!(
                "parameter grid needs a MEAN_REVERSION strategy, got {}",
                base.strategy.name()
            )));
        };

        let shorts = or_base(&self.lookback_short, params.lookback_short);
        let vols = or_base(&self.lookback_vol, params.lookback_vol);
        let entries = or_base(&self.entry_z, params.entry_z);
        let exits = or_base(&self.exit_z, params.exit_z);

        let mut variants = Vec::with_capacity(self.size());
        for &lookback_short in &shorts {
            for &lookback_vol in &vols {
                if lookback_short > lookback_vol {
                    continue;
                }
                for &entry_z in &entries {
                    for &exit_z in &exits {
                        let p = MeanReversionParams {
                            lookback_short,
                            lookback_vol,
                            entry_z,
                            exit_z,
                            ..params.clone()
                        };
                        let mut config = base.clone();
                        config.strategy = StrategyConfig::MeanReversion(p);
                        variants.push(SweepVariant {
                            label: format!(
                                "short={lookback_short} vol={lookback_vol} entry_z={entry_z} exit_z={exit_z}"
                            ),
                            config,
                        });
                    }
                }
            }
        }
        Ok(variants)
    }
}

fn or_base<T: Copy>(values: &[T], base: T) -> Vec<T> {
    if values.is_empty() {
        vec![base]
    } else {
        values.to_vec()
    }
}

/// One configuration to run, with a human-readable label.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepVariant {
    pub label: String,
    pub config: BacktestConfig,
}

/// Outcome of one variant. A failing variant does not stop the sweep.
#[derive(Debug)]
pub struct SweepEntry {
    pub label: String,
    pub outcome: Result<BacktestResult, RunError>,
}

/// Results in the same order as the variants that produced them.
#[derive(Debug, Default)]
pub struct SweepResults {
    pub entries: Vec<SweepEntry>,
}

impl SweepResults {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn successes(&self) -> impl Iterator<Item = (&str, &BacktestResult)> {
        self.entries
            .iter()
            .filter_map(|e| e.outcome.as_ref().ok().map(|r| (e.label.as_str(), r)))
    }

    /// Successful runs, best Sharpe first. Ties keep input order.
    pub fn ranked_by_sharpe(&self) -> Vec<(&str, &BacktestResult)> {
        let mut ranked: Vec<_> = self.successes().collect();
        ranked.sort_by(|a, b| b.1.metrics.sharpe.total_cmp(&a.1.metrics.sharpe));
        ranked
    }
}

/// Run every variant in parallel against shared data.
pub fn run_sweep(variants: Vec<SweepVariant>, data: &dyn DataProvider) -> SweepResults {
    let entries = variants
        .into_par_iter()
        .map(|v| SweepEntry {
            outcome: run_backtest_from_config(&v.config, data),
            label: v.label,
        })
        .collect();
    SweepResults { entries }
}

/// Expand `grid` over `base` and run the result.
pub fn run_grid(base: &BacktestConfig, grid: &ParamGrid, data: &dyn DataProvider) -> Result<SweepResults, ConfigError> {
    let variants = grid.generate_configs(base)?;
    tracing::info!(variants = variants.len(), "starting parameter sweep");
    Ok(run_sweep(variants, data))
}
