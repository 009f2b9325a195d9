//! Mean-reversion strategy — buy sharp short-horizon drops, exit on recovery.
//!
//! For each symbol the short-horizon return is scaled by the rolling standard
//! deviation of daily returns:
//!
//! ```text
//! z = (p[t] / p[t - lookback_short + 1] - 1) / stdev(returns over lookback_vol)
//! ```
//!
//! - `z < -|entry_z|` targets an equal 1/N weight.
//! - `z > -|exit_z|` while holding targets zero.
//! - Otherwise the current weight is kept.
//!
//! A symbol with too little history or volatility under the floor is targeted
//! at zero.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Strategy, StrategyError};
use crate::data::PriceHistory;
use crate::domain::PortfolioState;
use crate::sizers::TargetWeights;

/// Below this rolling volatility a z-score is meaningless.
pub const VOLATILITY_FLOOR: f64 = 1e-6;

fn default_lookback_short() -> usize {
    5
}
fn default_lookback_vol() -> usize {
    20
}
fn default_entry_z() -> f64 {
    1.5
}
fn default_exit_z() -> f64 {
    0.5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanReversionParams {
    pub universe: Vec<String>,
    #[serde(default = "default_lookback_short")]
    pub lookback_short: usize,
    #[serde(default = "default_lookback_vol")]
    pub lookback_vol: usize,
    /// Magnitude of the entry threshold; the sign is ignored.
    #[serde(default = "default_entry_z")]
    pub entry_z: f64,
    /// Magnitude of the exit threshold; the sign is ignored.
    #[serde(default = "default_exit_z")]
    pub exit_z: f64,
}

impl MeanReversionParams {
    pub fn new(universe: Vec<String>) -> Self {
        Self {
            universe,
            lookback_short: default_lookback_short(),
            lookback_vol: default_lookback_vol(),
            entry_z: default_entry_z(),
            exit_z: default_exit_z(),
        }
    }

    pub fn validate(&self) -> Result<(), StrategyError> {
        if self.lookback_short < 2 {
            return Err(StrategyError::InvalidParam {
                name: "lookback_short",
                reason: format!("must be at least 2, got {}", self.lookback_short),
            });
        }
        if self.lookback_vol < 2 {
            return Err(StrategyError::InvalidParam {
                name: "lookback_vol",
                reason: format!("must be at least 2, got {}", self.lookback_vol),
            });
        }
        if self.lookback_short > self.lookback_vol {
            return Err(StrategyError::InvalidParam {
                name: "lookback_short",
                reason: format!(
                    "must not exceed lookback_vol ({} > {})",
                    self.lookback_short, self.lookback_vol
                ),
            });
        }
        for (name, z) in [("entry_z", self.entry_z), ("exit_z", self.exit_z)] {
            if !z.is_finite() {
                return Err(StrategyError::InvalidParam {
                    name,
                    reason: format!("must be finite, got {z}"),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MeanReversion {
    params: MeanReversionParams,
}

/// Per-symbol evaluation outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Reading {
    /// Not enough history, or volatility below the floor.
    Flat,
    /// z-score, possibly NaN when prices are missing inside the window.
    Z(f64),
}

impl MeanReversion {
    /// Validate `params` and build the strategy.
    pub fn new(params: MeanReversionParams) -> Result<Self, StrategyError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &MeanReversionParams {
        &self.params
    }

    fn read(&self, prices: &[f64]) -> Reading {
        let n = prices.len();
        if n < self.required_lookback() {
            return Reading::Flat;
        }

        let window = &prices[n - self.params.lookback_vol - 1..];
        let returns: Vec<f64> = window.windows(2).map(|w| w[1] / w[0] - 1.0).collect();
        let vol = sample_std(&returns);
        if vol < VOLATILITY_FLOOR {
            return Reading::Flat;
        }

        let short_return = prices[n - 1] / prices[n - self.params.lookback_short] - 1.0;
        Reading::Z(short_return / vol)
    }
}

/// Sample standard deviation (n - 1); NaN if any input is non-finite.
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 || values.iter().any(|v| !v.is_finite()) {
        return f64::NAN;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    var.sqrt()
}

impl Strategy for MeanReversion {
    fn name(&self) -> &str {
        "mean_reversion"
    }

    fn universe(&self) -> &[String] {
        &self.params.universe
    }

    fn required_lookback(&self) -> usize {
        self.params.lookback_vol + 1
    }

    fn target_weights(
        &self,
        _date: NaiveDate,
        history: &PriceHistory,
        state: &PortfolioState<'_>,
    ) -> TargetWeights {
        let entry = -self.params.entry_z.abs();
        let exit = -self.params.exit_z.abs();
        let equal_weight = 1.0 / self.params.universe.len().max(1) as f64;

        let mut weights = TargetWeights::new();
        for symbol in &self.params.universe {
            let current = state.weight(symbol);
            let reading = history.column(symbol).map_or(Reading::Flat, |p| self.read(p));
            let target = match reading {
                Reading::Flat => 0.0,
                Reading::Z(z) if z < entry => equal_weight,
                Reading::Z(z) if z > exit && current > 0.0 => 0.0,
                // Includes NaN z: no signal, hold.
                Reading::Z(_) => current,
            };
            weights.insert(symbol.clone(), target);
        }
        weights
    }
}
