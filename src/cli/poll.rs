//! Poll command implementation

use clap::Args;

use crate::config::Config;

/// Run one poll/diff/interpret cycle regardless of the trading window
#[derive(Args, Debug)]
pub struct PollArgs {}

impl PollArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let scheduler = super::build_scheduler(config)?;
        let report = scheduler.run_cycle().await;

        if !report.polled {
            anyhow::bail!("poll failed, see logs");
        }
        println!(
            "Cycle complete (burst failures: {})",
            if report.had_failure { "yes" } else { "no" }
        );
        if report.alerts.is_empty() {
            println!("No alerts triggered");
        }
        for alert in &report.alerts {
            println!("{}", alert.message);
        }
        Ok(())
    }
}
