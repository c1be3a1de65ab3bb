//! Upstream option-chain source
//!
//! An NSE-style JSON endpoint behind a session handshake, wrapped in a
//! bounded-retry poller with exponential backoff.

mod nse;
mod poller;

pub use nse::{parse_chain, NseClient, NseConfig};
pub use poller::{PollOutcome, Poller, PollerConfig};

use crate::chain::ChainSnapshot;
use async_trait::async_trait;
use thiserror::Error;

/// Errors from the upstream source
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport-level failure (DNS, TLS, timeout, connection reset)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// Non-success HTTP status
    #[error("unexpected status: {0}")]
    Status(reqwest::StatusCode),
    /// Response was not JSON
    #[error("unexpected content-type: {0}")]
    ContentType(String),
    /// 200 response with an empty body
    #[error("empty response body")]
    EmptyBody,
    /// 200 response missing the expected keyed hierarchy
    #[error("malformed response: {0}")]
    Malformed(String),
    /// All retry attempts failed
    #[error("source unavailable after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

impl SourceError {
    /// Transient failures are retried with backoff; a malformed 200 is a
    /// hard cycle failure and aborts the burst.
    pub fn is_transient(&self) -> bool {
        !matches!(self, SourceError::Malformed(_) | SourceError::Exhausted { .. })
    }
}

/// Trait for option-chain source implementations
#[async_trait]
pub trait ChainSource: Send + Sync {
    /// Establish a session context (cookie/header bootstrap) with the source
    async fn warm_up(&self) -> Result<(), SourceError>;
    /// Fetch and parse one chain snapshot
    async fn fetch(&self) -> Result<ChainSnapshot, SourceError>;
}
