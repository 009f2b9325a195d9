//! CSV bar loading for the runner.
//!
//! Reads daily bars with the header
//! `date,symbol,open,high,low,close,adj_close,volume` from one file or from
//! every `*.csv` file in a directory, and materializes them into an
//! `InMemoryProvider`. Rows that parse but fail the bar sanity check are
//! skipped and counted; rows that do not parse are an error.
//!
//! Files are read in sorted path order, so a duplicate (symbol, date) resolves
//! the same way on every run: the last file wins.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use portsim_core::data::InMemoryProvider;
use portsim_core::domain::Bar;
use portsim_core::fingerprint::DatasetHash;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("no .csv files found in {0}")]
    NoFiles(PathBuf),
    #[error("no usable bars in {0}")]
    Empty(PathBuf),
}

/// Bars loaded from disk, with provenance.
#[derive(Debug)]
pub struct LoadedData {
    pub provider: InMemoryProvider,
    /// Files read, in read order.
    pub files: Vec<PathBuf>,
    /// Distinct (symbol, date) bars kept.
    pub bars_loaded: usize,
    /// Rows dropped by the sanity check.
    pub rows_skipped: usize,
    /// BLAKE3 over every kept bar, symbol then date order.
    pub dataset_hash: DatasetHash,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    symbol: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    adj_close: f64,
    volume: f64,
}

impl CsvRow {
    fn into_bar(self) -> Option<Bar> {
        let symbol = self.symbol.trim();
        if symbol.is_empty() || !self.volume.is_finite() || self.volume < 0.0 {
            return None;
        }
        let bar = Bar {
            date: self.date,
            symbol: symbol.to_string(),
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            adj_close: self.adj_close,
            volume: self.volume.round() as u64,
        };
        bar.is_sane().then_some(bar)
    }
}

/// Load a single CSV file or every `*.csv` file directly inside a directory.
pub fn load_csv(path: impl AsRef<Path>) -> Result<LoadedData, LoadError> {
    let path = path.as_ref();
    let files = csv_files(path)?;

    let mut provider = InMemoryProvider::new();
    let mut rows_skipped = 0;
    for file in &files {
        let handle = File::open(file).map_err(|source| LoadError::Io {
            path: file.clone(),
            source,
        })?;
        let (bars, skipped) = read_bars(handle, file)?;
        debug!(file = %file.display(), bars = bars.len(), skipped, "read bar file");
        rows_skipped += skipped;
        for bar in bars {
            provider.insert(bar);
        }
    }

    if provider.is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }
    if rows_skipped > 0 {
        warn!(rows_skipped, "skipped bars failing sanity checks");
    }

    let bars_loaded = provider.bar_count();
    let dataset_hash = DatasetHash::of_bars(provider.iter_bars());
    info!(
        files = files.len(),
        symbols = provider.symbols().count(),
        bars_loaded,
        dataset = %dataset_hash,
        "loaded bar data"
    );

    Ok(LoadedData {
        provider,
        files,
        bars_loaded,
        rows_skipped,
        dataset_hash,
    })
}

/// Parse bars from any reader. Returns the sane bars and the number of rows
/// skipped. `origin` only labels errors.
pub fn read_bars<R: Read>(reader: R, origin: &Path) -> Result<(Vec<Bar>, usize), LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars = Vec::new();
    let mut skipped = 0;
    for row in rdr.deserialize::<CsvRow>() {
        let row = row.map_err(|source| LoadError::Csv {
            path: origin.to_path_buf(),
            source,
        })?;
        match row.into_bar() {
            Some(bar) => bars.push(bar),
            None => skipped += 1,
        }
    }
    Ok((bars, skipped))
}

fn csv_files(path: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let io_err = |source: std::io::Error| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let meta = std::fs::metadata(path).map_err(io_err)?;
    if meta.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(path).map_err(io_err)? {
        let file = entry.map_err(io_err)?.path();
        let is_csv = file
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if is_csv && file.is_file() {
            files.push(file);
        }
    }
    if files.is_empty() {
        return Err(LoadError::NoFiles(path.to_path_buf()));
    }
    files.sort();
    Ok(files)
}
