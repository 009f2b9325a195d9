//! Trading calendar and rebalance schedule.
//!
//! The calendar is the sorted union of bar dates for the traded universe within
//! the run window. When no bars are available it falls back to Monday–Friday
//! business days, and the caller is told so through [`CalendarSource`].
//!
//! Rebalance days are pure calendar arithmetic on a date and never look at
//! whether data exists for it.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::data::DataProvider;

/// Where the trading days came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarSource {
    /// Union of bar dates for the universe.
    PriceHistory,
    /// Mon–Fri fallback; no bars were found.
    BusinessDays,
}

/// Ordered, de-duplicated trading days for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradingCalendar {
    days: Vec<NaiveDate>,
    source: CalendarSource,
}

impl TradingCalendar {
    /// Build from the universe's bars in `[start, end]`, falling back to
    /// business days when there are none.
    pub fn from_data(data: &dyn DataProvider, universe: &[String], start: NaiveDate, end: NaiveDate) -> Self {
        let days: BTreeSet<NaiveDate> = if universe.is_empty() {
            BTreeSet::new()
        } else {
            data.get_bars(universe, start, end).into_iter().map(|b| b.date).collect()
        };
        if days.is_empty() {
            return Self::business_days(start, end);
        }
        Self {
            days: days.into_iter().collect(),
            source: CalendarSource::PriceHistory,
        }
    }

    /// Every Monday–Friday in `[start, end]`.
    pub fn business_days(start: NaiveDate, end: NaiveDate) -> Self {
        let mut days = Vec::new();
        let mut day = start;
        while day <= end {
            if is_weekday(day) {
                days.push(day);
            }
            day += Duration::days(1);
        }
        Self {
            days,
            source: CalendarSource::BusinessDays,
        }
    }

    pub fn from_days(days: impl IntoIterator<Item = NaiveDate>) -> Self {
        let days: BTreeSet<NaiveDate> = days.into_iter().collect();
        Self {
            days: days.into_iter().collect(),
            source: CalendarSource::PriceHistory,
        }
    }

    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    pub fn source(&self) -> CalendarSource {
        self.source
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// First trading day strictly after `date`.
    pub fn next_after(&self, date: NaiveDate) -> Option<NaiveDate> {
        let idx = self.days.partition_point(|d| *d <= date);
        self.days.get(idx).copied()
    }
}

fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Last Monday–Friday of `date`'s month.
fn last_business_day_of_month(date: NaiveDate) -> NaiveDate {
    let (y, m) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    let mut day = NaiveDate::from_ymd_opt(y, m, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date);
    while !is_weekday(day) {
        day -= Duration::days(1);
    }
    day
}

/// How often the strategy is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalanceSchedule {
    #[serde(alias = "D")]
    Daily,
    /// Every Friday.
    #[serde(alias = "W")]
    Weekly,
    /// Last business day of each calendar month.
    #[default]
    #[serde(alias = "M")]
    MonthEnd,
}

impl RebalanceSchedule {
    pub fn is_rebalance_day(self, date: NaiveDate) -> bool {
        match self {
            RebalanceSchedule::Daily => true,
            RebalanceSchedule::Weekly => date.weekday() == Weekday::Fri,
            RebalanceSchedule::MonthEnd => date == last_business_day_of_month(date),
        }
    }
}
