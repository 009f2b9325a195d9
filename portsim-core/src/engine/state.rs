//! Engine configuration, warnings, errors, and run result types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::calendar::{CalendarSource, RebalanceSchedule};
use super::execution::{ExecutionConfig, Rejection};
use crate::domain::{DailySnapshot, Fill, LedgerError, OrderError, PriceField};

/// Configuration for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub initial_cash: f64,
    #[serde(default)]
    pub rebalance: RebalanceSchedule,
    /// Field used for marking to market and for strategy history.
    #[serde(default)]
    pub valuation_field: PriceField,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

impl EngineConfig {
    /// Month-end rebalancing, adjusted-close valuation, frictionless next-open fills.
    pub fn new(start: NaiveDate, end: NaiveDate, initial_cash: f64) -> Self {
        Self {
            start,
            end,
            initial_cash,
            rebalance: RebalanceSchedule::default(),
            valuation_field: PriceField::default(),
            execution: ExecutionConfig::frictionless(),
        }
    }

    pub fn with_rebalance(mut self, rebalance: RebalanceSchedule) -> Self {
        self.rebalance = rebalance;
        self
    }

    pub fn with_execution(mut self, execution: ExecutionConfig) -> Self {
        self.execution = execution;
        self
    }

    pub fn with_valuation_field(mut self, field: PriceField) -> Self {
        self.valuation_field = field;
        self
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.start > self.end {
            return Err(EngineError::InvalidConfig(format!(
                "start {} is after end {}",
                self.start, self.end
            )));
        }
        if !self.initial_cash.is_finite() || self.initial_cash <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "initial cash must be positive and finite, got {}",
                self.initial_cash
            )));
        }
        self.execution.cost.validate()

    }
}

/// A degraded-input condition handled locally during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineWarning {
    /// No bars for the universe in the window; Mon–Fri days were used instead.
    BusinessDayCalendar { start: NaiveDate, end: NaiveDate },
    /// Rebalance day with no history rows; no orders generated.
    EmptyHistory { date: NaiveDate },
    /// Orders sized on the final calendar day had nowhere to execute.
    NoNextTradingDay { date: NaiveDate, dropped_orders: usize },
}

impl fmt::Display for EngineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineWarning::BusinessDayCalendar { start, end } => write!(
                f,
                "no price data between {start} and {end}; using business-day calendar"
            ),
            EngineWarning::EmptyHistory { date } => {
                write!(f, "empty history window on {date}; no orders generated")
            }
            EngineWarning::NoNextTradingDay {
                date,
                dropped_orders,
            } => write!(
                f,
                "{dropped_orders} order(s) generated on final day {date} dropped: no next trading day"
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error("ledger error on {date}: {source}")]
    Ledger {
        date: NaiveDate,
        #[source]
        source: LedgerError,
    },
    #[error("run cancelled before {date}")]
    Cancelled { date: NaiveDate },
}

/// Result of a complete backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// One snapshot per calendar day, in order.
    pub snapshots: Vec<DailySnapshot>,
    /// Every applied fill, in application order.
    pub fills: Vec<Fill>,
    pub rejections: Vec<Rejection>,
    pub warnings: Vec<EngineWarning>,
    pub calendar_source: CalendarSource,
    pub fees_paid: f64,
    pub final_equity: f64,
}

impl RunResult {
    pub fn trading_days(&self) -> usize {
        self.snapshots.len()
    }

    pub fn equity_curve(&self) -> Vec<f64> {
        self.snapshots.iter().map(|s| s.equity).collect()
    }
}
