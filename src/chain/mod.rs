//! Option-chain data model
//!
//! One snapshot holds the call-side and put-side rows for the nearest
//! expiry, keyed by strike price within each side.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The two sides of an option chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OptionSide {
    /// Call options
    Ce,
    /// Put options
    Pe,
}

impl OptionSide {
    /// Short label used in sheet names and log fields
    pub fn label(&self) -> &'static str {
        match self {
            OptionSide::Ce => "CE",
            OptionSide::Pe => "PE",
        }
    }
}

/// One strike's market data for one side of the chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionRow {
    /// Strike price, unique within a side for one snapshot
    pub strike_price: Decimal,
    /// Total outstanding contracts
    pub open_interest: i64,
    /// Period change in open interest
    pub change_in_open_interest: i64,
    /// Contracts traded this session
    pub total_traded_volume: i64,
    /// Implied volatility
    pub implied_volatility: Decimal,
    /// Last traded premium
    pub last_price: Decimal,
    /// Pending buy quantity across all price levels
    pub total_buy_quantity: i64,
    /// Pending sell quantity across all price levels
    pub total_sell_quantity: i64,
}

/// One successful poll of the chain: both sides, nearest expiry only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainSnapshot {
    /// Expiry the rows were filtered to
    pub expiry: String,
    /// When the snapshot was fetched
    pub fetched_at: DateTime<Utc>,
    /// Call-side rows
    pub ce: Vec<OptionRow>,
    /// Put-side rows
    pub pe: Vec<OptionRow>,
}

impl ChainSnapshot {
    /// Rows for the given side
    pub fn side(&self, side: OptionSide) -> &[OptionRow] {
        match side {
            OptionSide::Ce => &self.ce,
            OptionSide::Pe => &self.pe,
        }
    }
}
