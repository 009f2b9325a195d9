//! Criterion benchmarks for portsim hot paths.
//!
//! Benchmarks:
//! 1. Daily event loop (full mean-reversion backtest)
//! 2. Target-weight sizer
//! 3. Execution simulator batch
//! 4. History window lookups, plain vs LRU-cached

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::{BTreeMap, HashMap};

use portsim_core::data::{CachedProvider, DataProvider, InMemoryProvider};
use portsim_core::domain::{Bar, Order, PriceField};
use portsim_core::engine::{run_backtest, EngineConfig, ExecutionConfig, ExecutionSimulator, RebalanceSchedule};
use portsim_core::sizers::{target_weights_to_quantities, TargetWeights};
use portsim_core::strategy::{MeanReversion, MeanReversionParams};

// ── Helpers ──────────────────────────────────────────────────────────

fn dates(n: usize) -> Vec<chrono::NaiveDate> {
    let base = chrono::NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
    (0..n).map(|i| base + chrono::Duration::days(i as i64)).collect()
}

fn symbols(k: usize) -> Vec<String> {
    (0..k).map(|i| format!("SYM{i}")).collect()
}

fn make_provider(n: usize, k: usize) -> InMemoryProvider {
    let dates = dates(n);
    let mut bars = Vec::with_capacity(n * k);
    for (si, sym) in symbols(k).iter().enumerate() {
        for (i, &date) in dates.iter().enumerate() {
            let close = 100.0 + si as f64 * 10.0 + (i as f64 * 0.1 + si as f64).sin() * 10.0;
            bars.push(Bar {
                date,
                symbol: sym.clone(),
                open: close - 0.3,
                high: close + 1.5,
                low: close - 1.5,
                close,
                adj_close: close,
                volume: 1_000_000,
            });
        }
    }
    InMemoryProvider::from_bars(bars)
}

// ── 1. Daily Event Loop ──────────────────────────────────────────────

fn bench_daily_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("daily_event_loop");

    for &days in &[252, 1260] {
        let provider = make_provider(days, 5);
        let strategy = MeanReversion::new(MeanReversionParams::new(symbols(5))).unwrap();
        let d = dates(days);
        let config = EngineConfig::new(d[0], d[days - 1], 1_000_000.0)
            .with_rebalance(RebalanceSchedule::Daily)
            .with_execution(ExecutionConfig::basis_points(1.0, 5.0));

        group.bench_with_input(BenchmarkId::new("mean_reversion_5sym", days), &days, |b, _| {
            b.iter(|| run_backtest(black_box(config.clone()), &provider, &strategy))
        });
    }

    group.finish();
}

// ── 2. Sizer ─────────────────────────────────────────────────────────

fn bench_sizer(c: &mut Criterion) {
    let syms = symbols(100);
    let weights: TargetWeights = syms.iter().map(|s| (s.clone(), 0.01)).collect();
    let held: BTreeMap<String, f64> = syms.iter().step_by(2).map(|s| (s.clone(), 37.0)).collect();
    let prices: HashMap<String, f64> = syms
        .iter()
        .enumerate()
        .map(|(i, s)| (s.clone(), 20.0 + i as f64))
        .collect();

    c.bench_function("sizer_100_symbols", |b| {
        b.iter(|| target_weights_to_quantities(black_box(&weights), &held, 1_000_000.0, &prices))
    });
}

// ── 3. Execution ─────────────────────────────────────────────────────

fn bench_execution(c: &mut Criterion) {
    let provider = make_provider(10, 50);
    let d = dates(10);
    let sim = ExecutionSimulator::from_config(&ExecutionConfig::basis_points(1.0, 5.0));
    let orders: Vec<Order> = symbols(50)
        .into_iter()
        .map(|s| Order::market(s, 100, d[3], d[4]).unwrap())
        .collect();

    c.bench_function("execution_batch_50", |b| {
        b.iter(|| sim.simulate_execution(black_box(orders.clone()), &provider))
    });
}

// ── 4. History Lookups ───────────────────────────────────────────────

fn bench_history(c: &mut Criterion) {
    let mut group = c.benchmark_group("history_window");
    let plain = make_provider(1260, 10);
    let cached = CachedProvider::new(make_provider(1260, 10));
    let syms = symbols(10);
    let end = dates(1260)[1000];

    group.bench_function("plain", |b| {
        b.iter(|| plain.get_history(black_box(&syms), end, 21, PriceField::AdjClose))
    });
    group.bench_function("cached", |b| {
        b.iter(|| cached.get_history(black_box(&syms), end, 21, PriceField::AdjClose))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_daily_loop,
    bench_sizer,
    bench_execution,
    bench_history,
);
criterion_main!(benches);
