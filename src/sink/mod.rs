//! Spreadsheet-style sink
//!
//! Writes the two per-side datasets of each cycle as timestamped CSV files
//! (`CE_<ts>.csv`, `PE_<ts>.csv`). Cells above the alert threshold get a
//! marker column instead of conditional highlighting; the styling itself is
//! a presentation concern left to whatever opens the files.

use crate::chain::OptionSide;
use crate::delta::{DeltaRow, DeltaSnapshot};
use crate::signal::ALERT_THRESHOLD;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Sink errors
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv encoding error: {0}")]
    Csv(#[from] csv::Error),
}

/// Trait for per-cycle dataset sinks
pub trait SnapshotSink: Send + Sync {
    /// Write both sides of one cycle's delta snapshot
    fn write(&self, snapshot: &DeltaSnapshot) -> Result<(), SinkError>;
}

/// One CSV line, row data plus delta and threshold-marker columns
#[derive(Debug, Serialize)]
struct CsvRecord {
    strike_price: Decimal,
    open_interest: i64,
    change_in_open_interest: i64,
    total_traded_volume: i64,
    implied_volatility: Decimal,
    last_price: Decimal,
    total_buy_quantity: i64,
    total_sell_quantity: i64,
    buy_change: i64,
    sell_change: i64,
    buy_above_threshold: bool,
    sell_above_threshold: bool,
}

impl CsvRecord {
    fn from_delta(d: &DeltaRow, threshold: i64) -> Self {
        Self {
            strike_price: d.row.strike_price,
            open_interest: d.row.open_interest,
            change_in_open_interest: d.row.change_in_open_interest,
            total_traded_volume: d.row.total_traded_volume,
            implied_volatility: d.row.implied_volatility,
            last_price: d.row.last_price,
            total_buy_quantity: d.row.total_buy_quantity,
            total_sell_quantity: d.row.total_sell_quantity,
            buy_change: d.buy_change,
            sell_change: d.sell_change,
            buy_above_threshold: d.buy_change > threshold,
            sell_above_threshold: d.sell_change > threshold,
        }
    }
}

/// Discards datasets; used when export is disabled
pub struct NullSink;

impl SnapshotSink for NullSink {
    fn write(&self, _snapshot: &DeltaSnapshot) -> Result<(), SinkError> {
        Ok(())
    }
}

/// CSV sink writing one file per side per cycle
pub struct CsvSink {
    output_dir: PathBuf,
    threshold: i64,
}

impl CsvSink {
    /// Create a sink writing into the given directory
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            threshold: ALERT_THRESHOLD,
        }
    }

    /// Override the marker threshold
    pub fn with_threshold(mut self, threshold: i64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Output directory
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn file_path(&self, side: OptionSide, snapshot: &DeltaSnapshot) -> PathBuf {
        let ts = snapshot.fetched_at.format("%Y-%m-%d_%H-%M-%S");
        self.output_dir.join(format!("{}_{}.csv", side.label(), ts))
    }

    fn write_side(&self, snapshot: &DeltaSnapshot, side: OptionSide) -> Result<(), SinkError> {
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.file_path(side, snapshot);
        let mut writer = csv::Writer::from_path(&path)?;
        for row in snapshot.side(side) {
            writer.serialize(CsvRecord::from_delta(row, self.threshold))?;
        }
        writer.flush()?;
        tracing::debug!(path = ?path, rows = snapshot.side(side).len(), "Wrote side dataset");
        Ok(())
    }
}

impl SnapshotSink for CsvSink {
    fn write(&self, snapshot: &DeltaSnapshot) -> Result<(), SinkError> {
        self.write_side(snapshot, OptionSide::Ce)?;
        self.write_side(snapshot, OptionSide::Pe)?;
        Ok(())
    }
}
