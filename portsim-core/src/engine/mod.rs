//! Backtesting engine — day-by-day event loop and supporting infrastructure.
//!
//! The engine owns the trading calendar, the order schedule and the portfolio
//! for one run. Each trading day runs three phases:
//!
//! 1. Execute orders scheduled for the day
//! 2. On rebalance days, size strategy target weights into next-day orders
//! 3. Mark to market and snapshot

pub mod calendar;
pub mod execution;
pub mod loop_runner;
pub mod schedule;
pub mod state;

pub use calendar::{CalendarSource, RebalanceSchedule, TradingCalendar};
pub use execution::{
    BasisPointCost, CostConfig, CostModel, ExecutionConfig, ExecutionReport, ExecutionSimulator,
    FillPriceKind, FillPriceModel, NextClose, NextOpen, PerShareCost, Rejection,
};
pub use loop_runner::{run_backtest, BacktestEngine};
pub use schedule::OrderSchedule;
pub use state::{EngineConfig, EngineError, EngineWarning, RunResult};
