//! Reporting and export — CSV, JSON, and Markdown artifacts.
//!
//! `save_artifacts` writes one directory per run:
//! - `snapshots.csv` — daily ledger with a drawdown column
//! - `fills.csv` — every executed fill
//! - `rejections.csv` — orders that could not be priced
//! - `result.json` — the full `BacktestResult`
//! - `report.md` — human-readable summary
//!
//! `result.json` carries a `schema_version`; newer versions are rejected on load.

use std::path::{Path, PathBuf};

use thiserror::Error;

use portsim_core::domain::{DailySnapshot, Fill};
use portsim_core::engine::Rejection;

use crate::metrics::drawdown_curve;
use crate::runner::{BacktestResult, SCHEMA_VERSION};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported schema version {found} (max supported: {max})")]
    UnsupportedSchema { found: u32, max: u32 },
}

/// Files written by `save_artifacts`.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub dir: PathBuf,
    pub snapshots: PathBuf,
    pub fills: PathBuf,
    pub rejections: PathBuf,
    pub result: PathBuf,
    pub report: PathBuf,
}

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_json(result: &BacktestResult) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Deserialize a `BacktestResult`, rejecting schema versions newer than this build.
pub fn import_json(json: &str) -> Result<BacktestResult, ExportError> {
    let result: BacktestResult = serde_json::from_str(json)?;
    if result.schema_version > SCHEMA_VERSION {
        return Err(ExportError::UnsupportedSchema {
            found: result.schema_version,
            max: SCHEMA_VERSION,
        });
    }
    Ok(result)
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Columns: date, equity, cash, positions_value, gross_exposure,
/// net_exposure, num_positions, daily_return, drawdown
pub fn export_snapshots_csv(snapshots: &[DailySnapshot]) -> Result<String, ExportError> {
    let equity: Vec<f64> = snapshots.iter().map(|s| s.equity).collect();
    let drawdown = drawdown_curve(&equity);

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "date",
        "equity",
        "cash",
        "positions_value",
        "gross_exposure",
        "net_exposure",
        "num_positions",
        "daily_return",
        "drawdown",
    ])?;
    for (s, dd) in snapshots.iter().zip(drawdown) {
        wtr.write_record([
            s.date.to_string(),
            format!("{:.6}", s.equity),
            format!("{:.6}", s.cash),
            format!("{:.6}", s.positions_value),
            format!("{:.6}", s.gross_exposure),
            format!("{:.6}", s.net_exposure),
            s.num_positions.to_string(),
            format!("{:.8}", s.daily_return),
            format!("{:.8}", dd),
        ])?;
    }
    finish(wtr)
}

/// Columns: date, symbol, shares, price, fee, notional
pub fn export_fills_csv(fills: &[Fill]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "symbol", "shares", "price", "fee", "notional"])?;
    for f in fills {
        wtr.write_record([
            f.date.to_string(),
            f.symbol.clone(),
            format!("{}", f.shares),
            format!("{:.6}", f.price),
            format!("{:.6}", f.fee),
            format!("{:.6}", f.notional()),
        ])?;
    }
    finish(wtr)
}

/// Columns: generated, execute, symbol, shares, reason
pub fn export_rejections_csv(rejections: &[Rejection]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["generated", "execute", "symbol", "shares", "reason"])?;
    for r in rejections {
        wtr.write_record([
            r.order.generated().to_string(),
            r.order.execute().to_string(),
            r.order.symbol().to_string(),
            r.order.shares().to_string(),
            r.reason.clone(),
        ])?;
    }
    finish(wtr)
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let data = wtr.into_inner().map_err(|e| ExportError::Csv(e.into_error().into()))?;
    // Every field written above is UTF-8
    Ok(String::from_utf8_lossy(&data).into_owned())
}

// ─── Markdown ───────────────────────────────────────────────────────

/// Markdown report for a single run.
pub fn generate_report(result: &BacktestResult) -> String {
    let bt = &result.config.backtest;
    let mut md = String::with_capacity(2048);

    md.push_str("# Backtest Report\n\n");
    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n| --- | --- |\n");
    md.push_str(&format!("| Run | `{}` |\n", result.run_id.short()));
    md.push_str(&format!("| Strategy | {} |\n", result.strategy));
    md.push_str(&format!(
        "| Universe | {} |\n",
        result.config.strategy.universe().join(", ")
    ));
    md.push_str(&format!("| Period | {} to {} |\n", bt.start_date, bt.end_date));
    md.push_str(&format!("| Initial Cash | {:.2} |\n", bt.initial_cash));
    if let Some(hash) = &result.dataset_hash {
        md.push_str(&format!("| Dataset | `{}` |\n", hash.as_str().get(..12).unwrap_or(hash.as_str())));
    }

    md.push_str("\n## Performance\n\n");
    md.push_str("| Metric | Value |\n| --- | --- |\n");
    for (label, value) in result.metrics.summary_rows() {
        md.push_str(&format!("| {label} | {value} |\n"));
    }

    if let Some(bench) = &result.benchmark {
        md.push_str(&format!(
            "\n## Benchmark\n\n{} total return: {:.2}%\n",
            bench.symbol,
            bench.total_return * 100.0
        ));
    }

    if !result.run.warnings.is_empty() {
        md.push_str("\n## Warnings\n\n");
        for w in &result.run.warnings {
            md.push_str(&format!("- {w}\n"));
        }
    }
    md
}

// ─── Artifact directory ─────────────────────────────────────────────

/// Write every artifact for `result` into `dir`, creating it if needed.
pub fn save_artifacts(dir: impl AsRef<Path>, result: &BacktestResult) -> Result<ArtifactPaths, ExportError> {
    let dir = dir.as_ref().to_path_buf();
    std::fs::create_dir_all(&dir).map_err(|source| ExportError::Io {
        path: dir.clone(),
        source,
    })?;

    let paths = ArtifactPaths {
        snapshots: dir.join("snapshots.csv"),
        fills: dir.join("fills.csv"),
        rejections: dir.join("rejections.csv"),
        result: dir.join("result.json"),
        report: dir.join("report.md"),
        dir,
    };

    write(&paths.snapshots, &export_snapshots_csv(&result.run.snapshots)?)?;
    write(&paths.fills, &export_fills_csv(&result.run.fills)?)?;
    write(&paths.rejections, &export_rejections_csv(&result.run.rejections)?)?;
    write(&paths.result, &export_json(result)?)?;
    write(&paths.report, &generate_report(result))?;
    Ok(paths)
}

/// Load a `BacktestResult` from an artifact directory's `result.json`.
pub fn load_artifacts(dir: impl AsRef<Path>) -> Result<BacktestResult, ExportError> {
    let path = dir.as_ref().join("result.json");
    let json = std::fs::read_to_string(&path).map_err(|source| ExportError::Io { path, source })?;
    import_json(&json)
}

fn write(path: &Path, contents: &str) -> Result<(), ExportError> {
    std::fs::write(path, contents).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}
