//! Strategy boundary — target weights from history and portfolio state.
//!
//! A strategy sees only the trailing price window ending on the rebalance day
//! and a read-only view of the portfolio. It returns desired weights; the
//! engine converts them to orders with the target-weight sizer, so strategies
//! never deal in share counts.

pub mod equal_weight;
pub mod mean_reversion;

pub use equal_weight::EqualWeight;
pub use mean_reversion::{MeanReversion, MeanReversionParams};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::PriceHistory;
use crate::domain::PortfolioState;
use crate::sizers::TargetWeights;

/// Decides target portfolio weights on rebalance days.
///
/// Implementations must be deterministic: identical inputs give identical
/// weights.
pub trait Strategy: Send + Sync {
    /// Short identifier (e.g., "mean_reversion").
    fn name(&self) -> &str;

    /// Symbols this strategy trades. Drives the calendar and history slices.
    fn universe(&self) -> &[String];

    /// Trading rows of history needed, including the rebalance day.
    fn required_lookback(&self) -> usize;

    fn target_weights(
        &self,
        date: NaiveDate,
        history: &PriceHistory,
        state: &PortfolioState<'_>,
    ) -> TargetWeights;
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    #[error("strategy universe is empty")]
    EmptyUniverse,
    #[error("duplicate symbol in universe: {0}")]
    DuplicateSymbol(String),
    #[error("invalid parameter {name}: {reason}")]
    InvalidParam { name: &'static str, reason: String },
}

/// Parameters for the equal-weight strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EqualWeightParams {
    pub universe: Vec<String>,
}

/// Serializable strategy choice, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyConfig {
    MeanReversion(MeanReversionParams),
    EqualWeight(EqualWeightParams),
}

impl StrategyConfig {
    pub fn name(&self) -> &'static str {
        match self {
            StrategyConfig::MeanReversion(_) => "mean_reversion",
            StrategyConfig::EqualWeight(_) => "equal_weight",
        }
    }

    pub fn universe(&self) -> &[String] {
        match self {
            StrategyConfig::MeanReversion(p) => &p.universe,
            StrategyConfig::EqualWeight(p) => &p.universe,
        }
    }

    pub fn validate(&self) -> Result<(), StrategyError> {
        validate_universe(self.universe())?;
        match self {
            StrategyConfig::MeanReversion(p) => p.validate(),
            StrategyConfig::EqualWeight(_) => Ok(()),
        }
    }

    /// Validate and construct the runtime strategy.
    pub fn build(&self) -> Result<Box<dyn Strategy>, StrategyError> {
        self.validate()?;
        Ok(match self {
            StrategyConfig::MeanReversion(p) => Box::new(MeanReversion::new(p.clone())?),
            StrategyConfig::EqualWeight(p) => Box::new(EqualWeight::new(p.universe.clone())),
        })
    }
}

fn validate_universe(universe: &[String]) -> Result<(), StrategyError> {
    if universe.is_empty() {
        return Err(StrategyError::EmptyUniverse);
    }
    let mut seen = std::collections::BTreeSet::new();
    for symbol in universe {
        if symbol.trim().is_empty() {
            return Err(StrategyError::InvalidParam {
                name: "universe",
                reason: "symbols must be non-empty".into(),
            });
        }
        if !seen.insert(symbol.as_str()) {
            return Err(StrategyError::DuplicateSymbol(symbol.clone()));
        }
    }
    Ok(())
}
