//! Prometheus metrics exporter
//!
//! Counters are recorded inline by the poller, scheduler, interpreter, and
//! notifier; this module only stands up the scrape endpoint.

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on the given port
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to start metrics exporter: {}", e))?;
    tracing::info!(port, "Metrics exporter listening");
    Ok(())
}
