//! Change engine
//!
//! Merges a fresh snapshot with the previous cycle's baseline, producing
//! per-strike buy/sell activity deltas. The output snapshot becomes the
//! baseline for the next cycle.

use crate::chain::{ChainSnapshot, OptionRow, OptionSide};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An [`OptionRow`] extended with period-over-period activity changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaRow {
    #[serde(flatten)]
    pub row: OptionRow,
    /// `total_buy_quantity` now minus previous cycle (0 if no prior match)
    pub buy_change: i64,
    /// `total_sell_quantity` now minus previous cycle (0 if no prior match)
    pub sell_change: i64,
}

/// A snapshot with deltas attached; the persisted baseline for the next cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeltaSnapshot {
    pub expiry: String,
    pub fetched_at: DateTime<Utc>,
    pub ce: Vec<DeltaRow>,
    pub pe: Vec<DeltaRow>,
}

impl DeltaSnapshot {
    /// Rows for the given side
    pub fn side(&self, side: OptionSide) -> &[DeltaRow] {
        match side {
            OptionSide::Ce => &self.ce,
            OptionSide::Pe => &self.pe,
        }
    }
}

/// Compute per-strike deltas between a fresh snapshot and the prior baseline.
///
/// With no baseline (first run, or the caller invalidated it after a flaky
/// poll) every delta is zero. Otherwise current rows are left-joined to the
/// baseline by strike; a strike absent from the baseline counts its full
/// quantity as the change. Pure function: same inputs, same output.
pub fn compute_deltas(current: &ChainSnapshot, previous: Option<&DeltaSnapshot>) -> DeltaSnapshot {
    DeltaSnapshot {
        expiry: current.expiry.clone(),
        fetched_at: current.fetched_at,
        ce: side_deltas(&current.ce, previous.map(|p| p.ce.as_slice())),
        pe: side_deltas(&current.pe, previous.map(|p| p.pe.as_slice())),
    }
}

fn side_deltas(current: &[OptionRow], previous: Option<&[DeltaRow]>) -> Vec<DeltaRow> {
    let baseline: HashMap<Decimal, (i64, i64)> = previous
        .unwrap_or_default()
        .iter()
        .map(|d| {
            (
                d.row.strike_price,
                (d.row.total_buy_quantity, d.row.total_sell_quantity),
            )
        })
        .collect();

    current
        .iter()
        .map(|row| {
            let (prev_buy, prev_sell) = baseline
                .get(&row.strike_price)
                .copied()
                .unwrap_or((0, 0));
            let (buy_change, sell_change) = if previous.is_some() {
                (
                    row.total_buy_quantity - prev_buy,
                    row.total_sell_quantity - prev_sell,
                )
            } else {
                (0, 0)
            };
            DeltaRow {
                row: row.clone(),
                buy_change,
                sell_change,
            }
        })
        .collect()
}
