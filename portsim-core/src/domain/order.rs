//! Orders — immutable share-delta instructions scheduled for a future day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Order style tag. Only market orders are simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderStyle {
    /// Fill at whatever price the fill model resolves on the execution day.
    #[default]
    #[serde(rename = "MKT")]
    Market,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderError {
    #[error("order for {symbol}: execution date {execute} must be after generation date {generated}")]
    NotAfterGeneration {
        symbol: String,
        generated: NaiveDate,
        execute: NaiveDate,
    },
    #[error("order symbol must not be empty")]
    EmptySymbol,
    #[error("order for {symbol} has zero shares")]
    ZeroShares { symbol: String },
}

/// A trade intent: buy (positive) or sell (negative) `shares` of `symbol`.
///
/// Fields are private so an order cannot be altered after the generation/execution
/// ordering has been checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    symbol: String,
    shares: i64,
    generated: NaiveDate,
    execute: NaiveDate,
    style: OrderStyle,
}

impl Order {
    /// Market order generated on `generated` for execution on `execute`.
    pub fn market(
        symbol: impl Into<String>,
        shares: i64,
        generated: NaiveDate,
        execute: NaiveDate,
    ) -> Result<Self, OrderError> {
        let symbol = symbol.into();
        if symbol.is_empty() {
            return Err(OrderError::EmptySymbol);
        }
        if shares == 0 {
            return Err(OrderError::ZeroShares { symbol });
        }
        if execute <= generated {
            return Err(OrderError::NotAfterGeneration {
                symbol,
                generated,
                execute,
            });
        }
        Ok(Self {
            symbol,
            shares,
            generated,
            execute,
            style: OrderStyle::Market,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Signed share delta; positive buys.
    pub fn shares(&self) -> i64 {
        self.shares
    }

    pub fn generated(&self) -> NaiveDate {
        self.generated
    }

    pub fn execute(&self) -> NaiveDate {
        self.execute
    }

    pub fn style(&self) -> OrderStyle {
        self.style
    }

    pub fn is_buy(&self) -> bool {
        self.shares > 0
    }
}
