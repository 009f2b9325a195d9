//! Portfolio ledger — cash, positions, fill log and daily snapshots.
//!
//! The ledger is mutated only through [`Portfolio::apply_fill`] and
//! [`Portfolio::take_snapshot`]. Every price it uses is injected by the caller;
//! it never consults a clock or a data provider.
//!
//! Accounting identity, checked on every mark-to-market:
//! `equity == cash + sum(shares * price)` for all held symbols.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use super::bar::is_valid_price;
use super::fill::Fill;
use super::snapshot::DailySnapshot;

/// Positions smaller than this many shares are pruned from the book.
pub const POSITION_EPSILON: f64 = 1e-9;

/// Tolerance for the equity identity and the zero-equity guard.
pub const EQUITY_TOLERANCE: f64 = 1e-9;

/// Key of the synthetic cash entry in weight maps.
pub const CASH_KEY: &str = "cash";

/// Closing (or otherwise current) prices keyed by symbol.
pub type PriceMap = HashMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("invalid fill for {symbol}: {reason}")]
    InvalidFill { symbol: String, reason: String },

    #[error("missing price for held position '{symbol}' during mark-to-market")]
    MissingPrice { symbol: String },

    #[error("equity identity violated: equity={equity}, cash + positions = {expected}")]
    EquityMismatch { equity: f64, expected: f64 },
}

/// Read-only view of the portfolio handed to a strategy on rebalance days.
#[derive(Debug, Clone)]
pub struct PortfolioState<'a> {
    pub equity: f64,
    pub cash: f64,
    pub positions: &'a BTreeMap<String, f64>,
    /// Per-symbol weights plus a `"cash"` entry.
    pub weights: BTreeMap<String, f64>,
}

impl PortfolioState<'_> {
    /// Current weight of `symbol`, zero when not held.
    pub fn weight(&self, symbol: &str) -> f64 {
        self.weights.get(symbol).copied().unwrap_or(0.0)
    }

    pub fn shares(&self, symbol: &str) -> f64 {
        self.positions.get(symbol).copied().unwrap_or(0.0)
    }
}

/// The ledger for a single backtest run.
#[derive(Debug, Clone)]
pub struct Portfolio {
    initial_cash: f64,
    cash: f64,
    positions: BTreeMap<String, f64>,
    fees_paid: f64,
    fills: Vec<Fill>,
    snapshots: Vec<DailySnapshot>,
    last_equity: f64,
}

impl Portfolio {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            initial_cash,
            cash: initial_cash,
            positions: BTreeMap::new(),
            fees_paid: 0.0,
            fills: Vec::new(),
            snapshots: Vec::new(),
            last_equity: initial_cash,
        }
    }

    pub fn initial_cash(&self) -> f64 {
        self.initial_cash
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn fees_paid(&self) -> f64 {
        self.fees_paid
    }

    pub fn positions(&self) -> &BTreeMap<String, f64> {
        &self.positions
    }

    /// Signed share count for `symbol`, `None` when flat.
    pub fn position(&self, symbol: &str) -> Option<f64> {
        self.positions.get(symbol).copied()
    }

    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    pub fn snapshots(&self) -> &[DailySnapshot] {
        &self.snapshots
    }

    /// Consume the ledger, returning its fill log and snapshot history.
    pub fn into_history(self) -> (Vec<Fill>, Vec<DailySnapshot>) {
        (self.fills, self.snapshots)
    }

    /// Apply a fill. All validation happens before any state changes, so a
    /// rejected fill leaves the ledger untouched.
    pub fn apply_fill(&mut self, fill: Fill) -> Result<(), LedgerError> {
        let invalid = |reason: String| LedgerError::InvalidFill {
            symbol: fill.symbol.clone(),
            reason,
        };
        if !is_valid_price(fill.price) {
            return Err(invalid(format!("price must be positive, got {}", fill.price)));
        }
        if !(fill.fee.is_finite() && fill.fee >= 0.0) {
            return Err(invalid(format!("fee must be non-negative, got {}", fill.fee)));
        }
        if !fill.shares.is_finite() {
            return Err(invalid(format!("shares must be finite, got {}", fill.shares)));
        }

        let held = self.positions.get(&fill.symbol).copied().unwrap_or(0.0) + fill.shares;
        if held.abs() < POSITION_EPSILON {
            self.positions.remove(&fill.symbol);
        } else {
            self.positions.insert(fill.symbol.clone(), held);
        }

        self.cash += fill.cash_change();
        self.fees_paid += fill.fee;
        self.fills.push(fill);
        Ok(())
    }

    /// Market value of every held position. Fails on the first held symbol
    /// without a price rather than assuming a stale or zero value.
    fn position_values(&self, prices: &PriceMap) -> Result<Vec<(&str, f64)>, LedgerError> {
        self.positions
            .iter()
            .map(|(symbol, &shares)| match prices.get(symbol) {
                Some(&price) => Ok((symbol.as_str(), shares * price)),
                None => Err(LedgerError::MissingPrice {
                    symbol: symbol.clone(),
                }),
            })
            .collect()
    }

    /// Current equity: cash plus every position valued at `prices`.
    pub fn mark_to_market(&self, prices: &PriceMap) -> Result<f64, LedgerError> {
        let values = self.position_values(prices)?;
        let positions_value: f64 = values.iter().map(|(_, v)| v).sum();
        let equity = self.cash + positions_value;

        // Independent second pass straight off the position book.
        let mut rederived = self.cash;
        let mut partial = 0.0;
        for (symbol, shares) in &self.positions {
            partial += shares * prices[symbol];
        }
        rederived += partial;

        if (equity - rederived).abs() > EQUITY_TOLERANCE || !equity.is_finite() {
            return Err(LedgerError::EquityMismatch {
                equity,
                expected: rederived,
            });
        }
        Ok(equity)
    }

    /// Weight of each held symbol plus a `"cash"` entry, all relative to equity.
    ///
    /// With equity indistinguishable from zero every held symbol gets weight 0
    /// and no cash entry is produced.
    pub fn get_weights(&self, prices: &PriceMap) -> Result<BTreeMap<String, f64>, LedgerError> {
        let equity = self.mark_to_market(prices)?;
        if equity.abs() < EQUITY_TOLERANCE {
            return Ok(self.positions.keys().map(|s| (s.clone(), 0.0)).collect());
        }

        let mut weights: BTreeMap<String, f64> = self
            .position_values(prices)?
            .into_iter()
            .map(|(symbol, value)| (symbol.to_string(), value / equity))
            .collect();
        weights.insert(CASH_KEY.to_string(), self.cash / equity);
        Ok(weights)
    }

    /// Build the strategy-facing view at `prices`.
    pub fn state(&self, prices: &PriceMap) -> Result<PortfolioState<'_>, LedgerError> {
        Ok(PortfolioState {
            equity: self.mark_to_market(prices)?,
            cash: self.cash,
            positions: &self.positions,
            weights: self.get_weights(prices)?,
        })
    }

    /// Record the end-of-day snapshot for `date` and roll the return reference.
    pub fn take_snapshot(
        &mut self,
        date: NaiveDate,
        prices: &PriceMap,
    ) -> Result<DailySnapshot, LedgerError> {
        let equity = self.mark_to_market(prices)?;
        let positions_value = equity - self.cash;
        let gross_exposure: f64 = self
            .position_values(prices)?
            .iter()
            .map(|(_, value)| value.abs())
            .sum();
        let daily_return = if self.last_equity != 0.0 {
            equity / self.last_equity - 1.0
        } else {
            0.0
        };

        let snapshot = DailySnapshot::new(
            date,
            self.cash,
            positions_value,
            gross_exposure,
            self.positions.len(),
            daily_return,
        );
        if (snapshot.equity - equity).abs() > EQUITY_TOLERANCE {
            return Err(LedgerError::EquityMismatch {
                equity: snapshot.equity,
                expected: equity,
            });
        }

        self.last_equity = equity;
        self.snapshots.push(snapshot.clone());
        Ok(snapshot)
    }
}
