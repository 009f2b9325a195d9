//! Cost models — transaction fees charged on each fill.
//!
//! Fees are always non-negative and symmetric between buys and sells. Slippage
//! is charged as a fee on notional rather than by moving the fill price, so a
//! fill's price is exactly what the fill-price model resolved.

use serde::{Deserialize, Serialize};

/// Computes the fee for trading `shares` at `price`.
pub trait CostModel: Send + Sync {
    fn fee(&self, shares: f64, price: f64) -> f64;

    fn name(&self) -> &str;
}

/// Commission plus slippage, both in basis points of absolute notional.
///
/// `fee = (commission_bps + slippage_bps) * |shares * price| / 10_000`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BasisPointCost {
    pub commission_bps: f64,
    pub slippage_bps: f64,
}

impl BasisPointCost {
    pub fn new(commission_bps: f64, slippage_bps: f64) -> Self {
        Self {
            commission_bps,
            slippage_bps,
        }
    }

    pub fn frictionless() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl CostModel for BasisPointCost {
    fn fee(&self, shares: f64, price: f64) -> f64 {
        let notional = (shares * price).abs();
        (self.commission_bps + self.slippage_bps) * notional / 10_000.0
    }

    fn name(&self) -> &str {
        "basis_points"
    }
}

/// Flat fee per share traded with a per-fill minimum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerShareCost {
    pub per_share: f64,
    #[serde(default)]
    pub minimum: f64,
}

impl CostModel for PerShareCost {
    fn fee(&self, shares: f64, _price: f64) -> f64 {
        (shares.abs() * self.per_share).max(self.minimum)
    }

    fn name(&self) -> &str {
        "per_share"
    }
}
