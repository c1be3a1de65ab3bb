//! chain-pulse: Option-chain activity monitor with sentiment alerts
//!
//! This library provides the core components for:
//! - Resilient polling of an option-chain endpoint with bounded retries
//! - Period-over-period buy/sell activity deltas keyed by strike
//! - Durable persistence of the latest snapshot as the next baseline
//! - Threshold-based signal interpretation (combo and single-metric rules)
//! - A trading-window scheduler with jittered cycle delays
//! - CSV export of per-side datasets per cycle
//! - Webhook notification of triggered alerts
//! - Full observability stack

pub mod alert;
pub mod chain;
pub mod cli;
pub mod config;
pub mod delta;
pub mod scheduler;
pub mod signal;
pub mod sink;
pub mod source;
pub mod store;
pub mod telemetry;
