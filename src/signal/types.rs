//! Signal types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::chain::OptionSide;

/// The four aggregate activity metrics, in fixed enumeration order.
///
/// The order matters: when two metrics tie above the threshold, the
/// earlier-enumerated one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    /// Sum of call-side buy changes
    CeBuy,
    /// Sum of put-side buy changes
    PeBuy,
    /// Sum of call-side sell changes
    CeSell,
    /// Sum of put-side sell changes
    PeSell,
}

impl Metric {
    /// Fixed enumeration order used for tie-breaking
    pub const ALL: [Metric; 4] = [Metric::CeBuy, Metric::PeBuy, Metric::CeSell, Metric::PeSell];

    /// Chain side this metric aggregates over
    pub fn side(&self) -> OptionSide {
        match self {
            Metric::CeBuy | Metric::CeSell => OptionSide::Ce,
            Metric::PeBuy | Metric::PeSell => OptionSide::Pe,
        }
    }

    /// Display name matching the alert message format
    pub fn name(&self) -> &'static str {
        match self {
            Metric::CeBuy => "Max CE Buy",
            Metric::PeBuy => "Max PE Buy",
            Metric::CeSell => "Max CE Sell",
            Metric::PeSell => "Max PE Sell",
        }
    }
}

/// One metric's quantity-change sum paired with its side's OI-change sum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSignal {
    pub metric: Metric,
    /// Sum of buy/sell changes over all rows of the metric's side
    pub qty_change: i64,
    /// Sum of change-in-open-interest over the same side
    pub oi_change: i64,
}

/// Market direction read from a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
    Bullish,
    Bearish,
}

/// Position-building pattern behind a sentiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pattern {
    FreshLongBuildUp,
    FreshShortBuildUp,
    ShortCovering,
    LongUnwinding,
}

impl Pattern {
    fn label(&self) -> &'static str {
        match self {
            Pattern::FreshLongBuildUp => "fresh long build-up",
            Pattern::FreshShortBuildUp => "fresh short build-up",
            Pattern::ShortCovering => "short covering",
            Pattern::LongUnwinding => "long unwinding",
        }
    }
}

/// Sentiment verdict for an aggregate signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interpretation {
    pub sentiment: Sentiment,
    pub pattern: Pattern,
}

impl fmt::Display for Interpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sentiment = match self.sentiment {
            Sentiment::Bullish => "Bullish",
            Sentiment::Bearish => "Bearish",
        };
        write!(f, "{} ({})", sentiment, self.pattern.label())
    }
}

/// What triggered an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    /// CE buy and PE sell both surging with positive OI build on both sides
    ComboCeBuyPeSell,
    /// PE buy and CE sell both surging with positive OI build on both sides
    ComboPeBuyCeSell,
    /// A single metric above threshold, no combo active
    SingleMetric(Metric),
}

/// A triggered market-sentiment alert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Unique alert identifier
    pub id: Uuid,
    /// What fired
    pub kind: AlertKind,
    /// Formatted text for the notification sink
    pub message: String,
    /// When the alert was raised
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    /// Create a new alert with a fresh id
    pub fn new(kind: AlertKind, message: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            message,
            timestamp: Utc::now(),
        }
    }
}
