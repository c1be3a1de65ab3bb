//! NSE option-chain client
//!
//! The endpoint refuses requests without a browser-like user agent and a
//! session cookie obtained from the site root, so the client keeps a cookie
//! store and warms up against the root before fetching data.

use super::{ChainSource, SourceError};
use crate::chain::{ChainSnapshot, OptionRow};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, CONTENT_TYPE, REFERER, USER_AGENT};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

/// NSE site root, used for the session warm-up request
pub const NSE_BASE_URL: &str = "https://www.nseindia.com";

/// Configuration for the NSE client
#[derive(Debug, Clone)]
pub struct NseConfig {
    /// Site root for the warm-up request
    pub base_url: String,
    /// Index symbol to query (e.g. "BANKNIFTY")
    pub symbol: String,
    /// Per-attempt request timeout
    pub timeout: Duration,
    /// User agent presented to the source
    pub user_agent: String,
}

impl Default for NseConfig {
    fn default() -> Self {
        Self {
            base_url: NSE_BASE_URL.to_string(),
            symbol: "BANKNIFTY".to_string(),
            timeout: Duration::from_secs(10),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64)".to_string(),
        }
    }
}

/// Client for the NSE option-chain API
pub struct NseClient {
    config: NseConfig,
    client: Client,
}

impl NseClient {
    /// Create a new client with default configuration
    pub fn new() -> anyhow::Result<Self> {
        Self::with_config(NseConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: NseConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .cookie_store(true)
            .build()?;
        Ok(Self { config, client })
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(ua) = HeaderValue::from_str(&self.config.user_agent) {
            headers.insert(USER_AGENT, ua);
        }
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        if let Ok(referer) = HeaderValue::from_str(&self.config.base_url) {
            headers.insert(REFERER, referer);
        }
        headers
    }

    fn api_url(&self) -> String {
        format!(
            "{}/api/option-chain-indices?symbol={}",
            self.config.base_url, self.config.symbol
        )
    }
}

#[async_trait]
impl ChainSource for NseClient {
    async fn warm_up(&self) -> Result<(), SourceError> {
        tracing::debug!(url = %self.config.base_url, "Warming up source session");
        let response = self
            .client
            .get(&self.config.base_url)
            .headers(self.headers())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SourceError::Status(response.status()));
        }
        Ok(())
    }

    async fn fetch(&self) -> Result<ChainSnapshot, SourceError> {
        let url = self.api_url();
        tracing::debug!(url = %url, "Fetching option chain");

        let response = self.client.get(&url).headers(self.headers()).send().await?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.contains("application/json") {
            return Err(SourceError::ContentType(content_type));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(SourceError::EmptyBody);
        }

        parse_chain(&body)
    }
}

/// Raw response: a keyed hierarchy under `records`
#[derive(Debug, Deserialize)]
struct WireResponse {
    records: WireRecords,
}

#[derive(Debug, Deserialize)]
struct WireRecords {
    /// Ordered list, first entry = nearest expiry
    #[serde(rename = "expiryDates")]
    expiry_dates: Vec<String>,
    /// Per-strike entries, each optionally carrying CE/PE sub-objects
    data: Vec<WireEntry>,
}

#[derive(Debug, Deserialize)]
struct WireEntry {
    #[serde(rename = "expiryDate")]
    expiry_date: String,
    #[serde(rename = "CE")]
    ce: Option<WireRow>,
    #[serde(rename = "PE")]
    pe: Option<WireRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRow {
    strike_price: Decimal,
    #[serde(default)]
    open_interest: i64,
    // NSE spells this with a lowercase "i"
    #[serde(rename = "changeinOpenInterest", default)]
    change_in_open_interest: i64,
    #[serde(default)]
    total_traded_volume: i64,
    #[serde(default)]
    implied_volatility: Decimal,
    #[serde(default)]
    last_price: Decimal,
    #[serde(default)]
    total_buy_quantity: i64,
    #[serde(default)]
    total_sell_quantity: i64,
}

impl From<WireRow> for OptionRow {
    fn from(w: WireRow) -> Self {
        OptionRow {
            strike_price: w.strike_price,
            open_interest: w.open_interest,
            change_in_open_interest: w.change_in_open_interest,
            total_traded_volume: w.total_traded_volume,
            implied_volatility: w.implied_volatility,
            last_price: w.last_price,
            total_buy_quantity: w.total_buy_quantity,
            total_sell_quantity: w.total_sell_quantity,
        }
    }
}

/// Parse a raw response body into a snapshot filtered to the nearest expiry.
///
/// Fails with [`SourceError::Malformed`] when the expected keys are absent,
/// rather than letting missing fields surface deep in aggregation.
pub fn parse_chain(body: &str) -> Result<ChainSnapshot, SourceError> {
    let wire: WireResponse =
        serde_json::from_str(body).map_err(|e| SourceError::Malformed(e.to_string()))?;

    let expiry = wire
        .records
        .expiry_dates
        .first()
        .cloned()
        .ok_or_else(|| SourceError::Malformed("expiryDates is empty".to_string()))?;

    let mut ce = Vec::new();
    let mut pe = Vec::new();
    for entry in wire.records.data {
        if entry.expiry_date != expiry {
            continue;
        }
        if let Some(row) = entry.ce {
            ce.push(OptionRow::from(row));
        }
        if let Some(row) = entry.pe {
            pe.push(OptionRow::from(row));
        }
    }

    Ok(ChainSnapshot {
        expiry,
        fetched_at: Utc::now(),
        ce,
        pe,
    })
}
