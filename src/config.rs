//! Configuration types for chain-pulse

use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub poller: PollerSection,
    pub store: StoreConfig,
    pub sink: SinkConfig,
    #[serde(default)]
    pub signal: SignalSection,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub scheduler: SchedulerSection,
    pub telemetry: TelemetryConfig,
}

/// Upstream source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub base_url: String,
    pub symbol: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_secs() -> u64 {
    10
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64)".to_string()
}

/// Retry loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PollerSection {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_base_secs")]
    pub backoff_base_secs: u64,
}

fn default_max_attempts() -> u32 {
    5
}
fn default_backoff_base_secs() -> u64 {
    2
}

impl Default for PollerSection {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_base_secs: 2,
        }
    }
}

/// Snapshot store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path of the baseline snapshot file
    pub path: PathBuf,
}

/// CSV sink configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SinkConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub output_dir: PathBuf,
}

fn default_true() -> bool {
    true
}

/// Signal interpreter configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SignalSection {
    /// Quantity-change threshold shared by combo and single-metric rules
    #[serde(default = "default_threshold")]
    pub threshold: i64,
}

fn default_threshold() -> i64 {
    100_000
}

impl Default for SignalSection {
    fn default() -> Self {
        Self {
            threshold: 100_000,
        }
    }
}

/// Notification channel configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct NotifyConfig {
    /// Webhook endpoint; alerts are logged only when unset
    pub webhook_url: Option<String>,
}

/// Scheduler timing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSection {
    #[serde(default = "default_window_open")]
    pub window_open: String,
    #[serde(default = "default_window_close")]
    pub window_close: String,
    #[serde(default = "default_base_interval_secs")]
    pub base_interval_secs: u64,
    #[serde(default = "default_jitter_max_secs")]
    pub jitter_max_secs: u64,
    #[serde(default = "default_idle_check_secs")]
    pub idle_check_secs: u64,
}

fn default_window_open() -> String {
    "09:15:00".to_string()
}
fn default_window_close() -> String {
    "15:30:00".to_string()
}
fn default_base_interval_secs() -> u64 {
    55
}
fn default_jitter_max_secs() -> u64 {
    10
}
fn default_idle_check_secs() -> u64 {
    10
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            window_open: default_window_open(),
            window_close: default_window_close(),
            base_interval_secs: 55,
            jitter_max_secs: 10,
            idle_check_secs: 10,
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    pub metrics_port: u16,
    pub log_level: String,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
        [source]
        base_url = "https://www.nseindia.com"
        symbol = "BANKNIFTY"
        timeout_secs = 10

        [poller]
        max_attempts = 5
        backoff_base_secs = 2

        [store]
        path = "./prev_data.json"

        [sink]
        enabled = true
        output_dir = "./sheets"

        [signal]
        threshold = 100000

        [notify]
        webhook_url = "https://hooks.example.com/T000/B000"

        [scheduler]
        window_open = "09:15:00"
        window_close = "15:30:00"
        base_interval_secs = 55
        jitter_max_secs = 10
        idle_check_secs = 10

        [telemetry]
        metrics_port = 9090
        log_level = "info"
    "#;

    #[test]
    fn test_config_deserialize() {
        let config: Config = toml::from_str(FULL).unwrap();
        assert_eq!(config.source.symbol, "BANKNIFTY");
        assert_eq!(config.poller.max_attempts, 5);
        assert_eq!(config.signal.threshold, 100_000);
        assert_eq!(
            config.notify.webhook_url.as_deref(),
            Some("https://hooks.example.com/T000/B000")
        );
    }

    #[test]
    fn test_optional_sections_default() {
        let toml = r#"
            [source]
            base_url = "https://www.nseindia.com"
            symbol = "BANKNIFTY"

            [store]
            path = "./prev_data.json"

            [sink]
            output_dir = "./sheets"

            [telemetry]
            metrics_port = 9090
            log_level = "info"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.poller.max_attempts, 5);
        assert_eq!(config.poller.backoff_base_secs, 2);
        assert_eq!(config.signal.threshold, 100_000);
        assert!(config.notify.webhook_url.is_none());
        assert_eq!(config.scheduler.window_open, "09:15:00");
        assert_eq!(config.scheduler.base_interval_secs, 55);
        assert!(config.sink.enabled);
        assert_eq!(config.source.timeout_secs, 10);
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(result.is_err());
    }
}
