//! Two-stage alerting policy
//!
//! Combo rules are checked first and either (or both) may fire in one
//! cycle. The single-metric rule only runs when no combo fired: the
//! strictly largest sum above the threshold wins, ties going to the
//! earlier-enumerated metric. The interpretation table maps the sign pair
//! (OI change, quantity change) of the selected metric to a sentiment.

use super::types::{
    AggregateSignal, Alert, AlertKind, Interpretation, Metric, Pattern, Sentiment,
};
use super::Aggregates;
use crate::delta::DeltaSnapshot;

/// Shared threshold for combo and single-metric rules, in quantity units
pub const ALERT_THRESHOLD: i64 = 100_000;

/// Sentiment lookup for an aggregate signal.
///
/// Sign is strict: a sum of zero lands in the negative column.
pub fn interpret(signal: &AggregateSignal) -> Interpretation {
    use Pattern::*;
    use Sentiment::*;

    let oi_pos = signal.oi_change > 0;
    let qty_pos = signal.qty_change > 0;

    let (sentiment, pattern) = match signal.metric {
        Metric::CeBuy => match (oi_pos, qty_pos) {
            (true, true) => (Bullish, FreshLongBuildUp),
            (true, false) => (Bearish, FreshShortBuildUp),
            (false, true) => (Bullish, ShortCovering),
            (false, false) => (Bearish, LongUnwinding),
        },
        Metric::CeSell => match (oi_pos, qty_pos) {
            (true, true) => (Bearish, FreshShortBuildUp),
            (true, false) => (Bullish, FreshLongBuildUp),
            (false, true) => (Bearish, LongUnwinding),
            (false, false) => (Bullish, ShortCovering),
        },
        Metric::PeBuy => match (oi_pos, qty_pos) {
            (true, true) => (Bearish, FreshLongBuildUp),
            (true, false) => (Bullish, FreshShortBuildUp),
            (false, true) => (Bullish, ShortCovering),
            (false, false) => (Bearish, LongUnwinding),
        },
        Metric::PeSell => match (oi_pos, qty_pos) {
            (true, true) => (Bullish, FreshShortBuildUp),
            (true, false) => (Bearish, FreshLongBuildUp),
            (false, true) => (Bullish, LongUnwinding),
            (false, false) => (Bearish, ShortCovering),
        },
    };

    Interpretation { sentiment, pattern }
}

/// Classifies aggregate delta patterns into at most a handful of alerts
pub struct Interpreter {
    threshold: i64,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(ALERT_THRESHOLD)
    }
}

impl Interpreter {
    /// Create an interpreter with a custom threshold
    pub fn new(threshold: i64) -> Self {
        Self { threshold }
    }

    /// Evaluate one cycle's delta snapshot against the rule table.
    ///
    /// Returns zero, one, or (both combos) two alerts.
    pub fn evaluate(&self, snapshot: &DeltaSnapshot) -> Vec<Alert> {
        let agg = Aggregates::from_snapshot(snapshot);
        let mut alerts = Vec::new();

        // Combos need data on both sides
        if agg.has_data(Metric::CeBuy) && agg.has_data(Metric::PeSell) {
            if let Some(alert) = self.combo(&agg) {
                alerts.push(alert);
            }
            if let Some(alert) = self.combo_inverse(&agg) {
                alerts.push(alert);
            }
        }

        if alerts.is_empty() {
            if let Some(alert) = self.single_metric(&agg) {
                alerts.push(alert);
            }
        }

        for alert in &alerts {
            tracing::info!(kind = ?alert.kind, message = %alert.message, "Alert triggered");
            metrics::counter!("chainpulse_alerts_total").increment(1);
        }

        alerts
    }

    /// Combo A: CE buy surge + PE sell surge, OI building on both sides
    fn combo(&self, agg: &Aggregates) -> Option<Alert> {
        if agg.ce_oi > 0 && agg.ce_buy > self.threshold && agg.pe_oi > 0 && agg.pe_sell > self.threshold
        {
            let message = format!(
                "Combo Triggered: CE Buy + PE Sell | CE Buy Qty: {}, OI: {} | PE Sell Qty: {}, OI: {}",
                group_thousands(agg.ce_buy),
                group_thousands(agg.ce_oi),
                group_thousands(agg.pe_sell),
                group_thousands(agg.pe_oi),
            );
            Some(Alert::new(AlertKind::ComboCeBuyPeSell, message))
        } else {
            None
        }
    }

    /// Combo B: PE buy surge + CE sell surge, OI building on both sides
    fn combo_inverse(&self, agg: &Aggregates) -> Option<Alert> {
        if agg.pe_oi > 0 && agg.pe_buy > self.threshold && agg.ce_oi > 0 && agg.ce_sell > self.threshold
        {
            let message = format!(
                "Combo Triggered: PE Buy + CE Sell | PE Buy Qty: {}, OI: {} | CE Sell Qty: {}, OI: {}",
                group_thousands(agg.pe_buy),
                group_thousands(agg.pe_oi),
                group_thousands(agg.ce_sell),
                group_thousands(agg.ce_oi),
            );
            Some(Alert::new(AlertKind::ComboPeBuyCeSell, message))
        } else {
            None
        }
    }

    /// Largest single metric above threshold; strictly-greater comparison
    /// keeps the earlier-enumerated metric on ties
    fn single_metric(&self, agg: &Aggregates) -> Option<Alert> {
        let mut top: Option<AggregateSignal> = None;
        for metric in Metric::ALL {
            if !agg.has_data(metric) {
                continue;
            }
            let signal = agg.signal(metric);
            if signal.qty_change <= self.threshold {
                continue;
            }
            match top {
                Some(best) if signal.qty_change <= best.qty_change => {}
                _ => top = Some(signal),
            }
        }

        let signal = top?;
        let interpretation = interpret(&signal);
        let message = format!(
            "{}: {} | Change in OI: {} | {}",
            signal.metric.name(),
            group_thousands(signal.qty_change),
            group_thousands(signal.oi_change),
            interpretation,
        );
        Some(Alert::new(AlertKind::SingleMetric(signal.metric), message))
    }
}

/// Format an i64 with comma thousands separators
fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    let offset = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - offset) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
