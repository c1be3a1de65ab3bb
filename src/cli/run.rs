//! Run command implementation

use clap::Args;
use tokio::sync::watch;

use crate::config::Config;

#[derive(Args, Debug)]
pub struct RunArgs {}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let scheduler = super::build_scheduler(config)?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received, requesting shutdown");
                let _ = shutdown_tx.send(true);
            }
        });

        tracing::info!(
            symbol = %config.source.symbol,
            window_open = %config.scheduler.window_open,
            window_close = %config.scheduler.window_close,
            "Starting scheduler"
        );
        scheduler.run(shutdown_rx).await
    }
}
