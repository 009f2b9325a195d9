//! Execution simulator — turns scheduled orders into fills or rejections.
//!
//! The simulator is stateless: it carries only the fill-price and cost models
//! chosen at construction. It reads market data but never touches the
//! portfolio; the caller applies the returned fills.

pub mod cost_model;
pub mod fill_price;

pub use cost_model::{BasisPointCost, CostModel, PerShareCost};
pub use fill_price::{FillPriceModel, NextClose, NextOpen};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::data::DataProvider;
use crate::domain::{Fill, Order};
use crate::engine::EngineError;

/// Which fill-price model to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPriceKind {
    #[default]
    NextOpen,
    NextClose,
}

/// Which cost model to use, with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CostConfig {
    BasisPoints(BasisPointCost),
    PerShare(PerShareCost),
}

impl CostConfig {
    /// Every cost parameter must be finite and non-negative.
    pub fn validate(&self) -> Result<(), EngineError> {
        let params = match self {
            CostConfig::BasisPoints(c) => [
                ("commission_bps", c.commission_bps),
                ("slippage_bps", c.slippage_bps),
            ],
            CostConfig::PerShare(c) => [("per_share", c.per_share), ("minimum", c.minimum)],
        };
        for (name, value) in params {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be non-negative and finite, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for CostConfig {
    fn default() -> Self {
        CostConfig::BasisPoints(BasisPointCost::frictionless())
    }
}

/// Serializable choice of execution models.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub fill_price: FillPriceKind,
    #[serde(default)]
    pub cost: CostConfig,
}

impl ExecutionConfig {
    pub fn frictionless() -> Self {
        Self::default()
    }

    pub fn basis_points(commission_bps: f64, slippage_bps: f64) -> Self {
        Self {
            fill_price: FillPriceKind::NextOpen,
            cost: CostConfig::BasisPoints(BasisPointCost::new(commission_bps, slippage_bps)),
        }
    }
}

/// An order that could not be filled, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub order: Order,
    pub reason: String,
}

/// Outcome of one batch of orders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionReport {
    pub fills: Vec<Fill>,
    pub rejections: Vec<Rejection>,
}

pub struct ExecutionSimulator {
    fill_model: Box<dyn FillPriceModel>,
    cost_model: Box<dyn CostModel>,
}

impl ExecutionSimulator {
    pub fn new(fill_model: Box<dyn FillPriceModel>, cost_model: Box<dyn CostModel>) -> Self {
        Self {
            fill_model,
            cost_model,
        }
    }

    pub fn from_config(config: &ExecutionConfig) -> Self {
        let fill_model: Box<dyn FillPriceModel> = match config.fill_price {
            FillPriceKind::NextOpen => Box::new(NextOpen),
            FillPriceKind::NextClose => Box::new(NextClose),
        };
        let cost_model: Box<dyn CostModel> = match config.cost {
            CostConfig::BasisPoints(c) => Box::new(c),
            CostConfig::PerShare(c) => Box::new(c),
        };
        Self::new(fill_model, cost_model)
    }

    pub fn cost_model_name(&self) -> &str {
        self.cost_model.name()
    }

    /// Process `orders` in input order. Orders without a usable price are
    /// rejected and never retried.
    pub fn simulate_execution(&self, orders: Vec<Order>, data: &dyn DataProvider) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        for order in orders {
            let Some(price) = self.fill_model.fill_price(&order, data) else {
                let reason = format!(
                    "missing or invalid {} price for {} on {}",
                    self.fill_model.field(),
                    order.symbol(),
                    order.execute().format("%Y-%m-%d"),
                );
                warn!(symbol = order.symbol(), date = %order.execute(), "order rejected: {reason}");
                report.rejections.push(Rejection { order, reason });
                continue;
            };
            let shares = order.shares() as f64;
            let fee = self.cost_model.fee(shares, price);
            report
                .fills
                .push(Fill::new(order.execute(), order.symbol(), shares, price, fee));
        }
        report
    }
}

impl Default for ExecutionSimulator {
    fn default() -> Self {
        Self::from_config(&ExecutionConfig::default())
    }
}
