//! Criterion benchmarks for the runner's per-run hot paths.
//!
//! Run with: `cargo bench -p portsim-runner`
//!
//! - Metric functions over long equity curves
//! - CSV bar parsing
//!
//! Full backtests are benchmarked in `portsim-core`.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::fmt::Write as _;
use std::path::Path;

use portsim_runner::data_loader::read_bars;
use portsim_runner::metrics::{annualized_volatility, daily_returns, downside_volatility, max_drawdown};

/// Synthetic equity curve with a slow drift and a periodic wobble.
fn equity_curve(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| 100_000.0 * (1.0 + i as f64 * 0.0002) + ((i % 37) as f64 - 18.0) * 150.0)
        .collect()
}

fn csv_text(rows: usize) -> String {
    let mut text = String::from("date,symbol,open,high,low,close,adj_close,volume\n");
    let start = chrono::NaiveDate::from_ymd_opt(2000, 1, 3).unwrap();
    for i in 0..rows {
        let date = start + chrono::Duration::days(i as i64);
        let px = 100.0 + (i % 50) as f64 * 0.25;
        writeln!(
            text,
            "{date},SPY,{px:.2},{:.2},{:.2},{px:.2},{px:.2},1000000",
            px + 1.0,
            px - 1.0
        )
        .unwrap();
    }
    text
}

fn bench_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("metrics");

    for len in [252, 2_520, 25_200] {
        let curve = equity_curve(len);
        group.bench_with_input(BenchmarkId::new("returns_and_vol", len), &curve, |b, curve| {
            b.iter(|| {
                let r = daily_returns(black_box(curve));
                (annualized_volatility(&r), downside_volatility(&r))
            });
        });
        group.bench_with_input(BenchmarkId::new("max_drawdown", len), &curve, |b, curve| {
            b.iter(|| max_drawdown(black_box(curve)));
        });
    }

    group.finish();
}

fn bench_csv_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("csv_parse");

    for rows in [1_000, 10_000] {
        let text = csv_text(rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &text, |b, text| {
            b.iter(|| read_bars(black_box(text.as_bytes()), Path::new("bench.csv")).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_metrics, bench_csv_parse);
criterion_main!(benches);
