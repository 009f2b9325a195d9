//! Integration tests for the execution simulator.
//!
//! These exercise the pipeline order → simulator → portfolio update, and the
//! pluggable model seams: a custom fill-price model and a custom cost model
//! plugged into a full engine run.

use chrono::NaiveDate;

use portsim_core::data::{DataProvider, InMemoryProvider};
use portsim_core::domain::{Bar, Order, Portfolio, PriceField};
use portsim_core::engine::{
    BacktestEngine, CostModel, EngineConfig, ExecutionConfig, ExecutionSimulator, FillPriceModel,
    NextOpen, RebalanceSchedule,
};
use portsim_core::strategy::EqualWeight;

// ─── Helpers ──────────────────────────────────────────────────────────

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

fn bar(symbol: &str, date: NaiveDate, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar {
        date,
        symbol: symbol.into(),
        open,
        high,
        low,
        close,
        adj_close: close,
        volume: 1_000_000,
    }
}

fn data() -> InMemoryProvider {
    InMemoryProvider::from_bars(vec![
        bar("SPY", d(2), 100.0, 102.0, 99.0, 101.0),
        bar("SPY", d(3), 101.0, 104.0, 100.0, 103.0),
        bar("SPY", d(4), 103.0, 103.5, 97.0, 98.0),
        bar("QQQ", d(2), 400.0, 405.0, 398.0, 404.0),
        bar("QQQ", d(3), 404.0, 410.0, 401.0, 409.0),
    ])
}

/// Fills at the midpoint of the execution day's range.
struct Midpoint;

impl FillPriceModel for Midpoint {
    fn fill_price(&self, order: &Order, data: &dyn DataProvider) -> Option<f64> {
        let high = data.get_price(order.symbol(), order.execute(), PriceField::High)?;
        let low = data.get_price(order.symbol(), order.execute(), PriceField::Low)?;
        Some((high + low) / 2.0)
    }

    fn field(&self) -> PriceField {
        PriceField::High
    }
}

/// One dollar per fill regardless of size.
struct FlatTicket;

impl CostModel for FlatTicket {
    fn fee(&self, _shares: f64, _price: f64) -> f64 {
        1.0
    }

    fn name(&self) -> &str {
        "flat_ticket"
    }
}

// ─── Tests ────────────────────────────────────────────────────────────

#[test]
fn round_trip_through_portfolio() {
    let sim = ExecutionSimulator::from_config(&ExecutionConfig::basis_points(1.0, 10.0));
    let mut portfolio = Portfolio::new(10_000.0);

    let buy = Order::market("SPY", 10, d(2), d(3)).unwrap();
    let report = sim.simulate_execution(vec![buy], &data());
    for fill in report.fills {
        portfolio.apply_fill(fill).unwrap();
    }
    // 10 @ 101, fee = 11 bps of 1010
    let fee1 = 1010.0 * 11.0 / 10_000.0;
    assert!((portfolio.cash() - (10_000.0 - 1010.0 - fee1)).abs() < 1e-9);

    let sell = Order::market("SPY", -10, d(3), d(4)).unwrap();
    let report = sim.simulate_execution(vec![sell], &data());
    for fill in report.fills {
        portfolio.apply_fill(fill).unwrap();
    }
    let fee2 = 1030.0 * 11.0 / 10_000.0;
    assert!(portfolio.positions().is_empty());
    assert!((portfolio.cash() - (10_000.0 - 1010.0 - fee1 + 1030.0 - fee2)).abs() < 1e-9);
    assert!((portfolio.fees_paid() - (fee1 + fee2)).abs() < 1e-12);
}

#[test]
fn rejection_names_symbol_and_execution_date() {
    let sim = ExecutionSimulator::default();
    let order = Order::market("QQQ", 5, d(3), d(4)).unwrap();
    let report = sim.simulate_execution(vec![order], &data());
    assert!(report.fills.is_empty());
    assert_eq!(report.rejections.len(), 1);
    assert_eq!(
        report.rejections[0].reason,
        "missing or invalid open price for QQQ on 2024-01-04"
    );
}

#[test]
fn custom_models_plug_in() {
    let sim = ExecutionSimulator::new(Box::new(Midpoint), Box::new(FlatTicket));
    let order = Order::market("SPY", 3, d(2), d(3)).unwrap();
    let report = sim.simulate_execution(vec![order], &data());
    assert_eq!(report.fills[0].price, 102.0);
    assert_eq!(report.fills[0].fee, 1.0);
    assert_eq!(sim.cost_model_name(), "flat_ticket");
}

#[test]
fn engine_accepts_custom_simulator() {
    let provider = data();
    let strategy = EqualWeight::new(vec!["SPY".into()]);
    let cfg = EngineConfig::new(d(2), d(4), 10_000.0).with_rebalance(RebalanceSchedule::Daily);
    let result = BacktestEngine::new(cfg, &provider, &strategy)
        .unwrap()
        .with_simulator(ExecutionSimulator::new(Box::new(NextOpen), Box::new(FlatTicket)))
        .run()
        .unwrap();

    assert!(result.fills.iter().all(|f| f.fee == 1.0));
    assert_eq!(result.fees_paid, result.fills.len() as f64);
}
