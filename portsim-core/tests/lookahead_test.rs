//! Look-ahead contamination tests for the engine.
//!
//! Invariant: a decision made on day t may only use data dated t or earlier,
//! and its orders execute on the next trading day at that day's open.
//!
//! Methods:
//! - A recording strategy asserts every history window it receives ends on or
//!   before the rebalance date.
//! - A run on data truncated at day k must match the full run's snapshots up to
//!   and including day k. Any difference means future bars leaked backwards.
//! - Every fill's price equals the open of its own date.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::sync::Mutex;

use portsim_core::data::{DataProvider, InMemoryProvider, PriceHistory};
use portsim_core::domain::{Bar, PortfolioState, PriceField};
use portsim_core::engine::{run_backtest, EngineConfig, RebalanceSchedule};
use portsim_core::sizers::TargetWeights;
use portsim_core::strategy::{MeanReversion, MeanReversionParams, Strategy};

fn weekdays(n: usize) -> Vec<NaiveDate> {
    let mut out = Vec::with_capacity(n);
    let mut d = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap();
    while out.len() < n {
        if !matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
            out.push(d);
        }
        d += Duration::days(1);
    }
    out
}

/// Deterministic pseudo-random walk using a simple LCG; open and close differ
/// every day so a same-day fill would be visible.
fn make_bars(symbol: &str, seed: u64, dates: &[NaiveDate]) -> Vec<Bar> {
    let mut price = 50.0;
    dates
        .iter()
        .enumerate()
        .map(|(i, &date)| {
            let s = (i as u64 ^ seed).wrapping_mul(6364136223846793005).wrapping_add(1);
            let change = ((s >> 32) % 200) as f64 - 99.5; // never zero
            let open = price * (1.0 + change * 0.0002);
            price = (open * (1.0 + change * 0.0003)).max(1.0);
            Bar {
                date,
                symbol: symbol.to_string(),
                open,
                high: open.max(price) + 0.5,
                low: open.min(price) - 0.5,
                close: price,
                adj_close: price,
                volume: 5_000,
            }
        })
        .collect()
}

fn universe() -> Vec<String> {
    vec!["AAA".into(), "BBB".into()]
}

fn bars(n: usize) -> Vec<Bar> {
    let dates = weekdays(n);
    let mut all = make_bars("AAA", 17, &dates);
    all.extend(make_bars("BBB", 4242, &dates));
    all
}

fn config(end: NaiveDate) -> EngineConfig {
    EngineConfig::new(weekdays(1)[0], end, 50_000.0).with_rebalance(RebalanceSchedule::Daily)
}

fn strategy() -> MeanReversion {
    let mut p = MeanReversionParams::new(universe());
    p.lookback_vol = 10;
    p.lookback_short = 3;
    p.entry_z = 0.75;
    p.exit_z = 0.25;
    MeanReversion::new(p).unwrap()
}

/// Wraps a strategy and checks every window it is shown.
struct Recording<S> {
    inner: S,
    seen: Mutex<Vec<(NaiveDate, Option<NaiveDate>)>>,
}

impl<S: Strategy> Strategy for Recording<S> {
    fn name(&self) -> &str {
        "recording"
    }

    fn universe(&self) -> &[String] {
        self.inner.universe()
    }

    fn required_lookback(&self) -> usize {
        self.inner.required_lookback()
    }

    fn target_weights(
        &self,
        date: NaiveDate,
        history: &PriceHistory,
        state: &PortfolioState<'_>,
    ) -> TargetWeights {
        self.seen.lock().unwrap().push((date, history.last_date()));
        self.inner.target_weights(date, history, state)
    }
}

#[test]
fn strategy_never_sees_future_rows() {
    let n = 90;
    let data = InMemoryProvider::from_bars(bars(n));
    let recording = Recording {
        inner: strategy(),
        seen: Mutex::new(Vec::new()),
    };
    run_backtest(config(weekdays(n)[n - 1]), &data, &recording).unwrap();

    let seen = recording.seen.into_inner().unwrap();
    assert_eq!(seen.len(), n);
    for (date, last) in seen {
        assert_eq!(last, Some(date), "window for {date} ends on {last:?}");
    }
}

#[test]
fn fills_use_next_day_open() {
    let n = 90;
    let data = InMemoryProvider::from_bars(bars(n));
    let days = weekdays(n);
    let result = run_backtest(config(days[n - 1]), &data, &strategy()).unwrap();

    assert!(!result.fills.is_empty());
    for fill in &result.fills {
        let open = data.get_price(&fill.symbol, fill.date, PriceField::Open).unwrap();
        let close = data.get_price(&fill.symbol, fill.date, PriceField::AdjClose).unwrap();
        assert_eq!(fill.price, open);
        assert_ne!(fill.price, close);
        assert_ne!(fill.date, days[0], "nothing can fill on the first day");
    }
}

#[test]
fn truncated_future_does_not_change_the_past() {
    let n = 100;
    let k = 60;
    let days = weekdays(n);
    let full_bars = bars(n);
    let truncated: Vec<Bar> = full_bars.iter().filter(|b| b.date <= days[k]).cloned().collect();

    let full = run_backtest(
        config(days[n - 1]),
        &InMemoryProvider::from_bars(full_bars),
        &strategy(),
    )
    .unwrap();
    let cut = run_backtest(
        config(days[n - 1]),
        &InMemoryProvider::from_bars(truncated),
        &strategy(),
    )
    .unwrap();

    assert_eq!(cut.snapshots.len(), k + 1);
    assert_eq!(&full.snapshots[..=k], &cut.snapshots[..]);
    let early_fills: Vec<_> = full.fills.iter().filter(|f| f.date <= days[k]).cloned().collect();
    assert_eq!(early_fills, cut.fills);
}
