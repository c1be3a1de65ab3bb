//! Bounded-retry poller with exponential backoff
//!
//! Wraps a [`ChainSource`] and tolerates an unreliable upstream: transient
//! failures are retried with `base * 2^k` backoff, and any failure during a
//! burst is surfaced to the caller so it can invalidate the delta baseline.

use super::{ChainSource, SourceError};
use crate::chain::ChainSnapshot;
use std::time::Duration;

/// Configuration for the retry loop
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Maximum attempts per burst
    pub max_attempts: u32,
    /// Backoff base; delay after failed attempt k (0-indexed) is `base * 2^k`
    pub backoff_base: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_base: Duration::from_secs(2),
        }
    }
}

/// Result of a successful polling burst
#[derive(Debug, Clone)]
pub struct PollOutcome {
    pub snapshot: ChainSnapshot,
    /// True when any attempt in the burst failed before the success. A
    /// retried fetch cannot be trusted to sit one clean cycle after the
    /// stored baseline, so downstream must drop the baseline comparison.
    pub had_failure: bool,
}

/// Polls a source with bounded retries
pub struct Poller<S: ChainSource> {
    source: S,
    config: PollerConfig,
}

impl<S: ChainSource> Poller<S> {
    /// Create a poller with default retry configuration
    pub fn new(source: S) -> Self {
        Self::with_config(source, PollerConfig::default())
    }

    /// Create a poller with custom retry configuration
    pub fn with_config(source: S, config: PollerConfig) -> Self {
        Self { source, config }
    }

    /// The wrapped source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run one polling burst: session warm-up, then fetch with retries.
    ///
    /// Returns the first successful snapshot together with the failure flag,
    /// `SourceError::Exhausted` when every attempt failed transiently, or
    /// `SourceError::Malformed` immediately on an unparseable 200.
    pub async fn poll(&self) -> Result<PollOutcome, SourceError> {
        let mut had_failure = false;
        let mut warmed = false;

        for attempt in 0..self.config.max_attempts {
            if attempt > 0 {
                let delay = self.config.backoff_base * 2u32.pow(attempt - 1);
                tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "Backing off");
                tokio::time::sleep(delay).await;
            }

            if !warmed {
                match self.source.warm_up().await {
                    Ok(()) => warmed = true,
                    Err(e) if e.is_transient() => {
                        tracing::warn!(attempt, error = %e, "Session warm-up failed, retrying");
                        metrics::counter!("chainpulse_poll_retries_total").increment(1);
                        had_failure = true;
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }

            match self.source.fetch().await {
                Ok(snapshot) => {
                    metrics::counter!("chainpulse_polls_total").increment(1);
                    return Ok(PollOutcome {
                        snapshot,
                        had_failure,
                    });
                }
                Err(e) if e.is_transient() => {
                    tracing::warn!(attempt, error = %e, "Fetch attempt failed, retrying");
                    metrics::counter!("chainpulse_poll_retries_total").increment(1);
                    had_failure = true;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Hard fetch failure, aborting burst");
                    return Err(e);
                }
            }
        }

        metrics::counter!("chainpulse_poll_exhaustions_total").increment(1);
        Err(SourceError::Exhausted {
            attempts: self.config.max_attempts,
        })
    }
}
