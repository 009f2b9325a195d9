//! Performance metrics — pure functions over an equity curve.
//!
//! Conventions:
//! - Daily returns are simple returns with the first day's return set to 0.
//! - CAGR annualizes over calendar days (365.25 per year).
//! - Volatilities are sample standard deviations scaled by sqrt(252).
//! - Sharpe and Sortino divide CAGR by the matching volatility.
//!
//! Any ratio whose denominator is zero or non-finite is reported as 0.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use portsim_core::engine::RunResult;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Aggregate performance metrics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub cagr: f64,
    pub ann_volatility: f64,
    pub sharpe: f64,
    pub sortino: f64,
    /// Negative fraction, e.g. -0.15 for a 15% drawdown.
    pub max_drawdown: f64,
    pub calmar: f64,
    pub fees_paid: f64,
    pub fill_count: usize,
    pub rejection_count: usize,
    pub trading_days: usize,
    pub final_equity: f64,
}

impl PerformanceMetrics {
    pub fn compute(run: &RunResult) -> Self {
        let equity = run.equity_curve();
        let span = match (run.snapshots.first(), run.snapshots.last()) {
            (Some(first), Some(last)) => calendar_days(first.date, last.date),
            _ => 0,
        };
        let returns = daily_returns(&equity);

        let cagr = cagr(&equity, span);
        let ann_volatility = annualized_volatility(&returns);
        let downside = downside_volatility(&returns);
        let max_drawdown = max_drawdown(&equity);

        Self {
            total_return: total_return(&equity),
            cagr,
            ann_volatility,
            sharpe: ratio(cagr, ann_volatility),
            sortino: ratio(cagr, downside),
            max_drawdown,
            calmar: ratio(cagr, max_drawdown.abs()),
            fees_paid: run.fees_paid,
            fill_count: run.fills.len(),
            rejection_count: run.rejections.len(),
            trading_days: run.trading_days(),
            final_equity: run.final_equity,
        }
    }

    /// Label/value rows for display, formatted like a summary table.
    pub fn summary_rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Total Return", pct(self.total_return)),
            ("CAGR", pct(self.cagr)),
            ("Annualized Volatility", pct(self.ann_volatility)),
            ("Sharpe Ratio", format!("{:.2}", self.sharpe)),
            ("Sortino Ratio", format!("{:.2}", self.sortino)),
            ("Max Drawdown", pct(self.max_drawdown)),
            ("Calmar Ratio", format!("{:.2}", self.calmar)),
            ("Fees Paid", format!("{:.2}", self.fees_paid)),
            ("Fills", self.fill_count.to_string()),
            ("Rejections", self.rejection_count.to_string()),
            ("Trading Days", self.trading_days.to_string()),
            ("Final Equity", format!("{:.2}", self.final_equity)),
        ]
    }
}

fn pct(x: f64) -> String {
    format!("{:.2}%", x * 100.0)
}

fn calendar_days(first: NaiveDate, last: NaiveDate) -> i64 {
    (last - first).num_days()
}

/// `num / den`, or 0 when the denominator is zero or the quotient is not finite.
pub fn ratio(num: f64, den: f64) -> f64 {
    if den.abs() < 1e-15 {
        return 0.0;
    }
    let q = num / den;
    if q.is_finite() {
        q
    } else {
        0.0
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Simple daily returns, one per equity point, the first being 0.
pub fn daily_returns(equity_curve: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(equity_curve.len());
    if equity_curve.is_empty() {
        return out;
    }
    out.push(0.0);
    for w in equity_curve.windows(2) {
        let r = if w[0] > 0.0 { w[1] / w[0] - 1.0 } else { 0.0 };
        out.push(if r.is_finite() { r } else { 0.0 });
    }
    out
}

/// Total return as a fraction: final / first - 1.
pub fn total_return(equity_curve: &[f64]) -> f64 {
    match (equity_curve.first(), equity_curve.last()) {
        (Some(&first), Some(&last)) if first > 0.0 => {
            let r = last / first - 1.0;
            if r.is_finite() {
                r
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// Compound annual growth rate over `calendar_days`. A curve that ends at or
/// below zero reports -1.
pub fn cagr(equity_curve: &[f64], calendar_days: i64) -> f64 {
    if calendar_days <= 0 {
        return 0.0;
    }
    let growth = 1.0 + total_return(equity_curve);
    if growth <= 0.0 {
        return -1.0;
    }
    let c = growth.powf(DAYS_PER_YEAR / calendar_days as f64) - 1.0;
    if c.is_finite() {
        c
    } else {
        0.0
    }
}

/// Sample standard deviation (n - 1 denominator); 0 for fewer than 2 values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    var.sqrt()
}

pub fn annualized_volatility(returns: &[f64]) -> f64 {
    sample_std(returns) * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Annualized sample std of the strictly negative returns only.
pub fn downside_volatility(returns: &[f64]) -> f64 {
    let negatives: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    sample_std(&negatives) * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Drawdown from the running peak at each point, as non-positive fractions.
pub fn drawdown_curve(equity_curve: &[f64]) -> Vec<f64> {
    let mut peak = f64::MIN;
    equity_curve
        .iter()
        .map(|&eq| {
            peak = peak.max(eq);
            if peak > 0.0 {
                (eq / peak - 1.0).min(0.0)
            } else {
                0.0
            }
        })
        .collect()
}

/// Maximum drawdown as a negative fraction; 0 for a curve that never falls.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    drawdown_curve(equity_curve).into_iter().fold(0.0, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use portsim_core::domain::DailySnapshot;
    use portsim_core::engine::CalendarSource;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, m, day).unwrap()
    }

    fn run_with(points: &[(NaiveDate, f64)]) -> RunResult {
        let snapshots: Vec<DailySnapshot> = points
            .iter()
            .map(|&(date, equity)| DailySnapshot::new(date, equity, 0.0, 0.0, 0, 0.0))
            .collect();
        RunResult {
            final_equity: points.last().map(|p| p.1).unwrap_or(0.0),
            snapshots,
            fills: Vec::new(),
            rejections: Vec::new(),
            warnings: Vec::new(),
            calendar_source: CalendarSource::PriceHistory,
            fees_paid: 0.0,
        }
    }

    #[test]
    fn total_return_and_cagr() {
        assert!((total_return(&[100.0, 110.0]) - 0.10).abs() < 1e-12);
        // 365 calendar days
        let c = cagr(&[100.0, 121.0], 365);
        let expected = 1.21_f64.powf(365.25 / 365.0) - 1.0;
        assert!((c - expected).abs() < 1e-12);
        assert_eq!(cagr(&[100.0, 121.0], 0), 0.0);
        assert_eq!(cagr(&[100.0, 0.0], 30), -1.0);
    }

    #[test]
    fn returns_start_at_zero() {
        let r = daily_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(r.len(), 3);
        assert_eq!(r[0], 0.0);
        assert!((r[1] - 0.10).abs() < 1e-12);
        assert!((r[2] + 0.10).abs() < 1e-12);
        assert!(daily_returns(&[]).is_empty());
    }

    #[test]
    fn max_drawdown_is_negative_fraction() {
        let eq = [100.0, 120.0, 90.0, 130.0, 117.0];
        assert!((max_drawdown(&eq) + 0.25).abs() < 1e-12);
        let dd = drawdown_curve(&eq);
        assert_eq!(dd[0], 0.0);
        assert_eq!(dd[3], 0.0);
        assert!((dd[4] + 0.10).abs() < 1e-12);
        assert_eq!(max_drawdown(&[100.0, 101.0, 102.0]), 0.0);
    }

    #[test]
    fn sample_std_uses_n_minus_one() {
        assert!((sample_std(&[1.0, 2.0, 3.0, 4.0]) - 1.290_994_448_735_805_6).abs() < 1e-12);
        assert_eq!(sample_std(&[5.0]), 0.0);
    }

    #[test]
    fn flat_curve_degrades_ratios_to_zero() {
        let run = run_with(&[(d(1, 3), 1000.0), (d(1, 4), 1000.0), (d(1, 5), 1000.0)]);
        let m = PerformanceMetrics::compute(&run);
        assert_eq!(m.total_return, 0.0);
        assert_eq!(m.ann_volatility, 0.0);
        assert_eq!(m.sharpe, 0.0);
        assert_eq!(m.sortino, 0.0);
        assert_eq!(m.calmar, 0.0);
        assert_eq!(m.max_drawdown, 0.0);
        assert_eq!(m.trading_days, 3);
    }

    #[test]
    fn single_day_run_is_all_zero() {
        let m = PerformanceMetrics::compute(&run_with(&[(d(6, 1), 500.0)]));
        assert_eq!(m.cagr, 0.0);
        assert_eq!(m.sharpe, 0.0);
        assert_eq!(m.final_equity, 500.0);
    }

    #[test]
    fn ratios_follow_cagr() {
        let run = run_with(&[
            (d(1, 2), 100.0),
            (d(4, 3), 104.0),
            (d(7, 3), 98.0),
            (d(12, 29), 112.0),
        ]);
        let m = PerformanceMetrics::compute(&run);
        assert!(m.cagr > 0.0);
        assert!((m.sharpe - m.cagr / m.ann_volatility).abs() < 1e-12);
        assert!((m.calmar - m.cagr / m.max_drawdown.abs()).abs() < 1e-12);
        // a single negative return has no sample deviation
        assert_eq!(m.sortino, 0.0);
    }

    #[test]
    fn ratio_guards_denominators() {
        assert_eq!(ratio(1.0, 0.0), 0.0);
        assert_eq!(ratio(1.0, f64::NAN), 0.0);
        assert_eq!(ratio(f64::INFINITY, 2.0), 0.0);
        assert_eq!(ratio(3.0, 2.0), 1.5);
    }

    #[test]
    fn summary_rows_are_formatted() {
        let m = PerformanceMetrics::compute(&run_with(&[(d(1, 2), 100.0), (d(1, 3), 110.0)]));
        let rows = m.summary_rows();
        assert_eq!(rows[0], ("Total Return", "10.00%".to_string()));
        assert_eq!(rows.len(), 12);
    }
}
