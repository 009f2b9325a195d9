//! Day-by-day event loop — the heart of the backtesting engine.
//!
//! Three phases per trading day `t`:
//! 1. Execute orders scheduled for `t` and apply their fills.
//! 2. On rebalance days, ask the strategy for target weights, size them, and
//!    schedule orders for the next trading day.
//! 3. Mark to market at `t`'s valuation prices and snapshot.
//!
//! Orders generated on `t` can only execute on a later calendar day, so no
//! decision ever trades at a price it was computed from.

use chrono::NaiveDate;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::calendar::{CalendarSource, TradingCalendar};
use super::execution::{ExecutionSimulator, Rejection};
use super::schedule::OrderSchedule;
use super::state::{EngineConfig, EngineError, EngineWarning, RunResult};
use crate::data::DataProvider;
use crate::domain::{is_valid_price, Order, Portfolio, PriceMap};
use crate::sizers::target_weights_to_quantities;
use crate::strategy::Strategy;

/// A single backtest run. Consumed by [`BacktestEngine::run`].
pub struct BacktestEngine<'a> {
    config: EngineConfig,
    data: &'a dyn DataProvider,
    strategy: &'a dyn Strategy,
    simulator: ExecutionSimulator,
    calendar: TradingCalendar,
    schedule: OrderSchedule,
    portfolio: Portfolio,
    warnings: Vec<EngineWarning>,
    rejections: Vec<Rejection>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> BacktestEngine<'a> {
    /// Validate the config and build the trading calendar.
    pub fn new(
        config: EngineConfig,
        data: &'a dyn DataProvider,
        strategy: &'a dyn Strategy,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let calendar = TradingCalendar::from_data(data, strategy.universe(), config.start, config.end);
        let mut warnings = Vec::new();
        if calendar.source() == CalendarSource::BusinessDays {
            let warning = EngineWarning::BusinessDayCalendar {
                start: config.start,
                end: config.end,
            };
            warn!("{warning}");
            warnings.push(warning);
        }

        Ok(Self {
            simulator: ExecutionSimulator::from_config(&config.execution),
            portfolio: Portfolio::new(config.initial_cash),
            config,
            data,
            strategy,
            calendar,
            schedule: OrderSchedule::new(),
            warnings,
            rejections: Vec::new(),
            cancel: None,
        })
    }

    /// Replace the simulator built from `config.execution`, e.g. with custom
    /// fill-price or cost models.
    pub fn with_simulator(mut self, simulator: ExecutionSimulator) -> Self {
        self.simulator = simulator;
        self
    }

    /// Abort the run at the next day boundary once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Run every calendar day in order and return the full history.
    pub fn run(mut self) -> Result<RunResult, EngineError> {
        let days = self.calendar.days().to_vec();
        info!(
            strategy = self.strategy.name(),
            days = days.len(),
            calendar = ?self.calendar.source(),
            initial_cash = self.config.initial_cash,
            "starting backtest"
        );

        for date in days {
            if self.cancel.as_ref().is_some_and(|f| f.load(Ordering::Relaxed)) {
                warn!(%date, "backtest cancelled");
                return Err(EngineError::Cancelled { date });
            }

            self.execute_due(date)?;

            let prices = self.valuation_prices(date);
            if self.config.rebalance.is_rebalance_day(date) {
                let next_day = self.calendar.next_after(date);
                self.rebalance(date, next_day, &prices)?;
            }

            self.portfolio
                .take_snapshot(date, &prices)
                .map_err(|source| EngineError::Ledger { date, source })?;
        }

        // Orders only ever target a later calendar day, so all have been taken.
        debug_assert!(self.schedule.is_empty());
        let fees_paid = self.portfolio.fees_paid();
        let initial_cash = self.portfolio.initial_cash();
        let (fills, snapshots) = self.portfolio.into_history();
        let final_equity = snapshots.last().map_or(initial_cash, |s| s.equity);

        info!(
            final_equity,
            fills = fills.len(),
            rejections = self.rejections.len(),
            warnings = self.warnings.len(),
            "backtest complete"
        );

        Ok(RunResult {
            snapshots,
            fills,
            rejections: self.rejections,
            warnings: self.warnings,
            calendar_source: self.calendar.source(),
            fees_paid,
            final_equity,
        })
    }

    /// Phase 1: fill everything scheduled for `date`.
    fn execute_due(&mut self, date: NaiveDate) -> Result<(), EngineError> {
        let due = self.schedule.take(date);
        if due.is_empty() {
            return Ok(());
        }

        let report = self.simulator.simulate_execution(due, self.data);
        debug!(
            %date,
            fills = report.fills.len(),
            rejections = report.rejections.len(),
            "executed scheduled orders"
        );
        for fill in report.fills {
            self.portfolio
                .apply_fill(fill)
                .map_err(|source| EngineError::Ledger { date, source })?;
        }
        self.rejections.extend(report.rejections);
        Ok(())
    }

    /// Valuation prices for the universe and every held symbol. Missing or
    /// unusable prices are left out; a held symbol left out surfaces later as
    /// a ledger error.
    fn valuation_prices(&self, date: NaiveDate) -> PriceMap {
        let field = self.config.valuation_field;
        self.strategy
            .universe()
            .iter()
            .map(String::as_str)
            .chain(self.portfolio.positions().keys().map(String::as_str))
            .filter_map(|symbol| {
                self.data
                    .get_price(symbol, date, field)
                    .filter(|p| is_valid_price(*p))
                    .map(|p| (symbol.to_string(), p))
            })
            .collect()
    }

    /// Phase 2: consult the strategy and schedule orders for `next_day`.
    fn rebalance(
        &mut self,
        date: NaiveDate,
        next_day: Option<NaiveDate>,
        prices: &PriceMap,
    ) -> Result<(), EngineError> {
        let history = self.data.get_history(
            self.strategy.universe(),
            date,
            self.strategy.required_lookback(),
            self.config.valuation_field,
        );

        let state = self
            .portfolio
            .state(prices)
            .map_err(|source| EngineError::Ledger { date, source })?;

        if history.is_empty() {
            let warning = EngineWarning::EmptyHistory { date };
            warn!("{warning}");
            self.warnings.push(warning);
            return Ok(());
        }

        let targets = self.strategy.target_weights(date, &history, &state);
        let quantities = target_weights_to_quantities(&targets, state.positions, state.equity, prices);
        debug!(%date, equity = state.equity, orders = quantities.len(), "rebalanced");
        if quantities.is_empty() {
            return Ok(());
        }

        let Some(execute) = next_day else {
            let warning = EngineWarning::NoNextTradingDay {
                date,
                dropped_orders: quantities.len(),
            };
            warn!("{warning}");
            self.warnings.push(warning);
            return Ok(());
        };

        for (symbol, shares) in quantities {
            self.schedule.schedule(Order::market(symbol, shares, date, execute)?);
        }
        Ok(())
    }
}

/// Build an engine and run it to completion.
pub fn run_backtest(
    config: EngineConfig,
    data: &dyn DataProvider,
    strategy: &dyn Strategy,
) -> Result<RunResult, EngineError> {
    BacktestEngine::new(config, data, strategy)?.run()
}
