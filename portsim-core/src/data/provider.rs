//! Data provider trait and the history table it serves.
//!
//! The DataProvider trait is the engine's only window onto market data.
//! Implementations are read-only and infallible: an empty result means
//! "no data" and is never an error from the engine's point of view.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::domain::{Bar, PriceField};

/// Trailing price table: rows are dates (ascending), columns are symbols.
///
/// A symbol with no bar on a row date holds `NaN` in that cell; prices are
/// never forward-filled.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistory {
    field: PriceField,
    dates: Vec<NaiveDate>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl PriceHistory {
    pub fn empty(field: PriceField) -> Self {
        Self {
            field,
            dates: Vec::new(),
            columns: BTreeMap::new(),
        }
    }

    /// Build from a date axis and per-symbol columns. Columns whose length
    /// differs from the date axis are padded or truncated with `NaN`.
    pub fn new(field: PriceField, dates: Vec<NaiveDate>, columns: BTreeMap<String, Vec<f64>>) -> Self {
        let n = dates.len();
        let columns = columns
            .into_iter()
            .map(|(symbol, mut col)| {
                col.resize(n, f64::NAN);
                (symbol, col)
            })
            .collect();
        Self {
            field,
            dates,
            columns,
        }
    }

    pub fn field(&self) -> PriceField {
        self.field
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn column(&self, symbol: &str) -> Option<&[f64]> {
        self.columns.get(symbol).map(Vec::as_slice)
    }
}

/// Market data access used by the engine and execution simulator.
pub trait DataProvider: Send + Sync {
    /// All bars for `symbols` with `start <= date <= end`, ordered by date
    /// then symbol.
    fn get_bars(&self, symbols: &[String], start: NaiveDate, end: NaiveDate) -> Vec<Bar>;

    /// The last `lookback` trading rows for `symbols` ending at `end_date`
    /// (inclusive), reading `field`.
    fn get_history(
        &self,
        symbols: &[String],
        end_date: NaiveDate,
        lookback: usize,
        field: PriceField,
    ) -> PriceHistory;

    /// One price, or `None` when the symbol has no bar on `date`.
    fn get_price(&self, symbol: &str, date: NaiveDate, field: PriceField) -> Option<f64>;
}
