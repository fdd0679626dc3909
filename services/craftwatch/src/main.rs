//! Craftwatch CLI
//!
//! Command-line interface for the Minecraft server status bot.

use std::path::PathBuf;

use clap::Parser;
use craftwatch::{load_config, Config};
use tracing::Level;

#[derive(Parser)]
#[command(name = "craftwatch")]
#[command(about = "Minecraft server status bot for Discord")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Polling interval in seconds (overrides config file)
    #[arg(long)]
    interval: Option<u64>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, interval={:?}, log_level={:?}",
        args.config,
        args.interval,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    config.apply_env()?;

    if let Some(interval) = args.interval {
        config.polling_interval_seconds = interval;
    }

    config.validate()?;

    tracing::info!("Starting craftwatch");
    tracing::debug!(
        "Server: {}, status channel: {:?}, rcon: {}",
        config.server.address(),
        config.discord.status_channel_id,
        config.rcon.is_some()
    );

    craftwatch::run(config).await?;

    Ok(())
}
