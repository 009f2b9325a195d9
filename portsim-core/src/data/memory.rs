//! In-memory data provider over fully materialized bars.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

use super::provider::{DataProvider, PriceHistory};
use crate::domain::{Bar, PriceField};

/// Bars held per symbol, keyed by date. Later duplicates of the same
/// (symbol, date) replace earlier ones.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    bars: BTreeMap<String, BTreeMap<NaiveDate, Bar>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bars(bars: impl IntoIterator<Item = Bar>) -> Self {
        let mut provider = Self::new();
        for bar in bars {
            provider.insert(bar);
        }
        provider
    }

    pub fn insert(&mut self, bar: Bar) {
        self.bars
            .entry(bar.symbol.clone())
            .or_default()
            .insert(bar.date, bar);
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.bars.keys().map(String::as_str)
    }

    pub fn bar_count(&self) -> usize {
        self.bars.values().map(BTreeMap::len).sum()
    }

    /// Every bar, ordered by symbol then date.
    pub fn iter_bars(&self) -> impl Iterator<Item = &Bar> {
        self.bars.values().flat_map(BTreeMap::values)
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

impl DataProvider for InMemoryProvider {
    fn get_bars(&self, symbols: &[String], start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
        if start > end {
            return Vec::new();
        }
        let mut out: Vec<Bar> = symbols
            .iter()
            .filter_map(|s| self.bars.get(s))
            .flat_map(|by_date| by_date.range(start..=end).map(|(_, bar)| bar.clone()))
            .collect();
        out.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.symbol.cmp(&b.symbol)));
        out.dedup_by(|a, b| a.date == b.date && a.symbol == b.symbol);
        out
    }

    fn get_history(
        &self,
        symbols: &[String],
        end_date: NaiveDate,
        lookback: usize,
        field: PriceField,
    ) -> PriceHistory {
        if lookback == 0 {
            return PriceHistory::empty(field);
        }

        let series: Vec<(&String, &BTreeMap<NaiveDate, Bar>)> = symbols
            .iter()
            .filter_map(|s| self.bars.get(s).map(|b| (s, b)))
            .collect();

        let all_dates: BTreeSet<NaiveDate> = series
            .iter()
            .flat_map(|(_, by_date)| by_date.range(..=end_date).map(|(d, _)| *d))
            .collect();
        let skip = all_dates.len().saturating_sub(lookback);
        let dates: Vec<NaiveDate> = all_dates.into_iter().skip(skip).collect();
        if dates.is_empty() {
            return PriceHistory::empty(field);
        }

        let columns = series
            .into_iter()
            .map(|(symbol, by_date)| {
                let col = dates
                    .iter()
                    .map(|d| by_date.get(d).map_or(f64::NAN, |b| b.field(field)))
                    .collect();
                (symbol.clone(), col)
            })
            .collect();
        PriceHistory::new(field, dates, columns)
    }

    fn get_price(&self, symbol: &str, date: NaiveDate, field: PriceField) -> Option<f64> {
        self.bars
            .get(symbol)
            .and_then(|by_date| by_date.get(&date))
            .map(|bar| bar.field(field))
    }
}
