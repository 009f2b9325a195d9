//! Bar — one daily OHLCV row as served by the data provider.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Daily bar for a single symbol.
///
/// `open`/`high`/`low`/`adj_close` are expected to be corporate-action adjusted
/// by the data collaborator; `close` is the raw close kept for reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub symbol: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
}

impl Bar {
    /// Read one price column.
    pub fn field(&self, field: PriceField) -> f64 {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
            PriceField::AdjClose => self.adj_close,
        }
    }

    /// Sanity check used by loaders: positive open/close, high above low,
    /// no NaN columns.
    pub fn is_sane(&self) -> bool {
        let cols = [self.open, self.high, self.low, self.close, self.adj_close];
        if cols.iter().any(|v| !v.is_finite()) {
            return false;
        }
        self.open > 0.0 && self.close > 0.0 && self.high >= self.low
    }
}

/// Which price column a lookup refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
    #[default]
    AdjClose,
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PriceField::Open => "open",
            PriceField::High => "high",
            PriceField::Low => "low",
            PriceField::Close => "close",
            PriceField::AdjClose => "adj_close",
        };
        f.write_str(name)
    }
}

/// A price is usable for valuation or execution only when finite and positive.
pub fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}
