//! CLI interface for chain-pulse
//!
//! Provides subcommands for:
//! - `run`: Start the trading-window scheduler loop
//! - `poll`: Run a single poll/diff/interpret cycle and exit
//! - `config`: Show the resolved configuration

mod poll;
mod run;

pub use poll::PollArgs;
pub use run::RunArgs;

use anyhow::Context;
use chrono::NaiveTime;
use clap::{Parser, Subcommand};
use std::time::Duration;

use crate::alert::{NoopNotifier, Notifier, WebhookNotifier};
use crate::config::Config;
use crate::scheduler::{Scheduler, SchedulerConfig, TradingWindow};
use crate::signal::Interpreter;
use crate::sink::{CsvSink, NullSink, SnapshotSink};
use crate::source::{NseClient, NseConfig, Poller, PollerConfig};
use crate::store::SnapshotStore;

#[derive(Parser, Debug)]
#[command(name = "chain-pulse")]
#[command(about = "Option-chain activity monitor with sentiment alerts")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the scheduler loop
    Run(RunArgs),
    /// Run a single cycle and exit
    Poll(PollArgs),
    /// Show the resolved configuration
    Config,
}

/// Wire the per-cycle collaborators together from configuration
pub fn build_scheduler(config: &Config) -> anyhow::Result<Scheduler<NseClient>> {
    let client = NseClient::with_config(NseConfig {
        base_url: config.source.base_url.clone(),
        symbol: config.source.symbol.clone(),
        timeout: Duration::from_secs(config.source.timeout_secs),
        user_agent: config.source.user_agent.clone(),
    })?;

    let poller = Poller::with_config(
        client,
        PollerConfig {
            max_attempts: config.poller.max_attempts,
            backoff_base: Duration::from_secs(config.poller.backoff_base_secs),
        },
    );

    let store = SnapshotStore::new(&config.store.path);
    let interpreter = Interpreter::new(config.signal.threshold);

    let sink: Box<dyn SnapshotSink> = if config.sink.enabled {
        Box::new(CsvSink::new(&config.sink.output_dir).with_threshold(config.signal.threshold))
    } else {
        Box::new(NullSink)
    };

    let notifier: Box<dyn Notifier> = match &config.notify.webhook_url {
        Some(url) => Box::new(WebhookNotifier::new(url)?),
        None => Box::new(NoopNotifier),
    };

    let window = TradingWindow {
        open: parse_window_time(&config.scheduler.window_open)?,
        close: parse_window_time(&config.scheduler.window_close)?,
    };

    let scheduler_config = SchedulerConfig {
        window,
        base_interval: Duration::from_secs(config.scheduler.base_interval_secs),
        jitter_max: Duration::from_secs(config.scheduler.jitter_max_secs),
        idle_check: Duration::from_secs(config.scheduler.idle_check_secs),
    };

    Ok(Scheduler::new(
        poller,
        store,
        interpreter,
        sink,
        notifier,
        scheduler_config,
    ))
}

fn parse_window_time(s: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .with_context(|| format!("invalid window time {s:?}, expected HH:MM:SS"))
}
