use chain_pulse::cli::{Cli, Commands};
use chain_pulse::config::Config;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        toml::from_str(include_str!("../config.toml.example")).expect("Invalid default config")
    });

    // Initialize telemetry
    chain_pulse::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting scheduler loop");
            args.execute(&config).await?;
        }
        Commands::Poll(args) => {
            tracing::info!("Running single cycle");
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!(
                "  Source: {} symbol={}",
                config.source.base_url, config.source.symbol
            );
            println!(
                "  Poller: {} attempts, backoff base {}s",
                config.poller.max_attempts, config.poller.backoff_base_secs
            );
            println!("  Store: {}", config.store.path.display());
            println!(
                "  Window: {}..{}",
                config.scheduler.window_open, config.scheduler.window_close
            );
            println!("  Threshold: {}", config.signal.threshold);
        }
    }

    Ok(())
}
