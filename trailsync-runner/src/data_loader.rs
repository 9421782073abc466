//! Bar loading for replay sessions.
//!
//! Bars come from a CSV file with the header
//! `timestamp,open,high,low,close,fast,slow,volatility` and RFC 3339
//! timestamps. The indicator columns are produced upstream; this crate never
//! computes them.
//!
//! Rows must be strictly ascending in time. Rows that fail the OHLC sanity
//! check are skipped with a warning rather than aborting the load.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};
use trailsync_core::domain::{Bar, BarInput, IndicatorSnapshot};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: timestamp {timestamp} is not after the previous row")]
    OutOfOrder { row: usize, timestamp: DateTime<Utc> },

    #[error("no usable bars")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct BarRow {
    timestamp: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    fast: f64,
    slow: f64,
    volatility: f64,
}

impl From<BarRow> for BarInput {
    fn from(row: BarRow) -> Self {
        BarInput {
            bar: Bar {
                timestamp: row.timestamp,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
            },
            indicators: IndicatorSnapshot {
                fast: row.fast,
                slow: row.slow,
                volatility: row.volatility,
            },
        }
    }
}

/// Load and validate bars from a CSV file.
pub fn load_bars(path: &Path) -> Result<Vec<BarInput>, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let bars = read_bars(file)?;
    info!(path = %path.display(), bars = bars.len(), "bars loaded");
    Ok(bars)
}

/// Parse bars from any CSV reader.
pub fn read_bars<R: Read>(reader: R) -> Result<Vec<BarInput>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars: Vec<BarInput> = Vec::new();
    let mut skipped = 0usize;

    for (i, record) in rdr.deserialize::<BarRow>().enumerate() {
        let row = i + 1;
        let input = BarInput::from(record?);
        if let Some(last) = bars.last() {
            if input.bar.timestamp <= last.bar.timestamp {
                return Err(LoadError::OutOfOrder {
                    row,
                    timestamp: input.bar.timestamp,
                });
            }
        }
        if !input.bar.is_sane() {
            warn!(row, timestamp = %input.bar.timestamp, "skipping bar with inconsistent OHLC");
            skipped += 1;
            continue;
        }
        bars.push(input);
    }

    if skipped > 0 {
        warn!(skipped, "bars skipped during load");
    }
    if bars.is_empty() {
        return Err(LoadError::Empty);
    }
    Ok(bars)
}
