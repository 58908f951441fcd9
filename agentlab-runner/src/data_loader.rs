//! State loading for the runner.
//!
//! Two input formats, chosen by file extension:
//! - `.json`: an array of `MarketState` objects (camelCase), used as-is
//! - `.csv`: `timestamp,close,volume` rows, passed through the feed builder
//!
//! Every load also yields a BLAKE3 dataset hash over the resulting states,
//! used in run ids and reports.

use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use agentlab_core::domain::MarketState;
use agentlab_core::feed::{build_states, FeedConfig, FeedError, PriceBar};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported data format '{0}' (expected .json or .csv)")]
    UnsupportedFormat(PathBuf),
    #[error("malformed JSON states: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed CSV bars: {0}")]
    Csv(#[from] csv::Error),
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Json,
    Csv,
}

impl DataFormat {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("json") => Ok(DataFormat::Json),
            Some("csv") => Ok(DataFormat::Csv),
            _ => Err(LoadError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Loaded states plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub states: Vec<MarketState>,
    /// BLAKE3 over every state field, hex encoded.
    pub dataset_hash: String,
    pub format: DataFormat,
}

/// Load a state sequence from `path`. `feed` applies to CSV inputs only.
pub fn load_states(path: &Path, feed: &FeedConfig) -> Result<LoadedData, LoadError> {
    let format = DataFormat::from_path(path)?;
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let states = match format {
        DataFormat::Json => read_states_json(file)?,
        DataFormat::Csv => build_states(&read_bars_csv(file)?, feed)?,
    };
    let dataset_hash = compute_dataset_hash(&states);

    info!(
        path = %path.display(),
        states = states.len(),
        dataset_hash = %dataset_hash,
        "states loaded"
    );

    Ok(LoadedData {
        states,
        dataset_hash,
        format,
    })
}

pub fn read_states_json<R: Read>(reader: R) -> Result<Vec<MarketState>, LoadError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Read `timestamp,close,volume` rows (header required).
pub fn read_bars_csv<R: Read>(reader: R) -> Result<Vec<PriceBar>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars = Vec::new();
    for row in rdr.deserialize() {
        bars.push(row?);
    }
    Ok(bars)
}

/// Deterministic BLAKE3 hash over every field of every state, in order.
pub fn compute_dataset_hash(states: &[MarketState]) -> String {
    let mut hasher = blake3::Hasher::new();
    for state in states {
        hasher.update(&state.timestamp.to_le_bytes());
        hasher.update(&(state.prices.len() as u64).to_le_bytes());
        for price in &state.prices {
            hasher.update(&price.to_le_bytes());
        }
        let ind = &state.indicators;
        hasher.update(&ind.rsi.to_le_bytes());
        hasher.update(&ind.macd.to_le_bytes());
        hasher.update(&ind.bbands.upper.to_le_bytes());
        hasher.update(&ind.bbands.middle.to_le_bytes());
        hasher.update(&ind.bbands.lower.to_le_bytes());
        hasher.update(&state.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
