//! Run fingerprinting — deterministic identification of runs and datasets.
//!
//! - `RunId`: BLAKE3 of the canonical JSON of the engine and strategy configs.
//! - `DatasetHash`: BLAKE3 over every bar a run could read.
//!
//! Two runs with equal `RunId` and `DatasetHash` produce identical results.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::Bar;
use crate::engine::EngineConfig;
use crate::strategy::StrategyConfig;

/// Hex-encoded BLAKE3 digest identifying a run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunId(String);

impl RunId {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, enough to tell runs apart in file names and logs.
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hex-encoded BLAKE3 digest of a set of bars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHash(String);

impl DatasetHash {
    /// Hash bars in the order given; callers pass a deterministic order.
    pub fn of_bars<'a>(bars: impl IntoIterator<Item = &'a Bar>) -> Self {
        let mut hasher = blake3::Hasher::new();
        for bar in bars {
            hasher.update(bar.date.to_string().as_bytes());
            hasher.update(bar.symbol.as_bytes());
            hasher.update(&[0]);
            for v in [bar.open, bar.high, bar.low, bar.close, bar.adj_close] {
                hasher.update(&v.to_le_bytes());
            }
            hasher.update(&bar.volume.to_le_bytes());
        }
        Self(hasher.finalize().to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize)]
struct CanonicalRun<'a> {
    engine: &'a EngineConfig,
    strategy: &'a StrategyConfig,
}

/// Identity of a run: every field of both configs contributes.
pub fn run_id(engine: &EngineConfig, strategy: &StrategyConfig) -> Result<RunId, serde_json::Error> {
    let json = serde_json::to_string(&CanonicalRun { engine, strategy })?;
    Ok(RunId::from_bytes(json.as_bytes()))
}
