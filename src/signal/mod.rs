//! Signal aggregation and interpretation
//!
//! Turns a delta snapshot into per-side aggregate activity sums and, when
//! thresholds are crossed, a classified market-sentiment alert.

mod interpreter;
mod types;

pub use interpreter::{interpret, Interpreter, ALERT_THRESHOLD};
pub use types::{
    AggregateSignal, Alert, AlertKind, Interpretation, Metric, Pattern, Sentiment,
};

use crate::chain::OptionSide;
use crate::delta::DeltaSnapshot;

/// Side-level sums computed from one delta snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aggregates {
    pub ce_buy: i64,
    pub ce_sell: i64,
    pub pe_buy: i64,
    pub pe_sell: i64,
    pub ce_oi: i64,
    pub pe_oi: i64,
    pub ce_rows: usize,
    pub pe_rows: usize,
}

impl Aggregates {
    /// Compute all aggregate sums for a snapshot
    pub fn from_snapshot(snapshot: &DeltaSnapshot) -> Self {
        let (ce_buy, ce_sell, ce_oi) = side_sums(&snapshot.ce);
        let (pe_buy, pe_sell, pe_oi) = side_sums(&snapshot.pe);
        Self {
            ce_buy,
            ce_sell,
            pe_buy,
            pe_sell,
            ce_oi,
            pe_oi,
            ce_rows: snapshot.ce.len(),
            pe_rows: snapshot.pe.len(),
        }
    }

    /// The quantity-change sum and paired OI-change sum for one metric
    pub fn signal(&self, metric: Metric) -> AggregateSignal {
        let qty_change = match metric {
            Metric::CeBuy => self.ce_buy,
            Metric::PeBuy => self.pe_buy,
            Metric::CeSell => self.ce_sell,
            Metric::PeSell => self.pe_sell,
        };
        let oi_change = match metric.side() {
            OptionSide::Ce => self.ce_oi,
            OptionSide::Pe => self.pe_oi,
        };
        AggregateSignal {
            metric,
            qty_change,
            oi_change,
        }
    }

    /// Whether the metric's side produced any rows this cycle
    pub fn has_data(&self, metric: Metric) -> bool {
        match metric.side() {
            OptionSide::Ce => self.ce_rows > 0,
            OptionSide::Pe => self.pe_rows > 0,
        }
    }
}

fn side_sums(rows: &[crate::delta::DeltaRow]) -> (i64, i64, i64) {
    let mut buy = 0;
    let mut sell = 0;
    let mut oi = 0;
    for d in rows {
        buy += d.buy_change;
        sell += d.sell_change;
        oi += d.row.change_in_open_interest;
    }
    (buy, sell, oi)
}
