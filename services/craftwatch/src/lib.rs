//! Craftwatch - Minecraft server status bot for Discord
//!
//! Polls a game server, mirrors its state into the bot presence and a status
//! channel, announces online/offline transitions and answers player queries.

pub mod config;
pub mod discord;
pub mod error;
pub mod names;
pub mod net;
pub mod probe;
pub mod query;
pub mod rcon;
pub mod reconciler;
pub mod scheduler;
pub mod slp;
pub mod surface;

pub use config::{load_config, Config};
pub use error::{CraftwatchError, Result};

use std::sync::Arc;
use std::time::Duration;

use serenity::all::Client;
use tokio_util::sync::CancellationToken;

use crate::discord::Handler;
use crate::probe::{AdminQueryProbe, Prober, StatusProbe};
use crate::rcon::RconAdminProbe;
use crate::slp::SlpStatusProbe;

/// Build the probe adapter for the configured server
pub fn build_prober(config: &Config) -> Prober {
    let timeout = Duration::from_secs(config.probe_timeout_seconds);

    let status: Arc<dyn StatusProbe> = Arc::new(SlpStatusProbe::new(
        &config.server.host,
        config.server.port,
        timeout,
    ));

    let admin = match (config.rcon_address(), &config.rcon) {
        (Some((host, port)), Some(rcon)) => {
            tracing::info!("Admin query enabled via RCON at {}:{}", host, port);
            Some(Arc::new(RconAdminProbe::new(&host, port, &rcon.password, timeout))
                as Arc<dyn AdminQueryProbe>)
        }
        _ => {
            tracing::info!("Admin query disabled, player names come from the status sample");
            None
        }
    };

    Prober::new(status, admin, timeout)
}

/// Run the bot with the given configuration until shutdown
pub async fn run(config: Config) -> Result<()> {
    let config = Arc::new(config);
    let cancel = CancellationToken::new();
    let prober = build_prober(&config);

    let handler = Handler::new(Arc::clone(&config), prober, cancel.clone());
    let mut client = Client::builder(&config.discord.token, discord::intents())
        .event_handler(handler)
        .await?;

    // Setup shutdown handler
    let shard_manager = Arc::clone(&client.shard_manager);
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        cancel_for_signal.cancel();
        shard_manager.shutdown_all().await;
    });

    tracing::info!(
        "Watching {} at {} every {}s",
        config.server.display_name,
        config.server.address(),
        config.polling_interval_seconds
    );

    // Blocks until the shards shut down
    client.start().await?;

    cancel.cancel();
    tracing::info!("Craftwatch stopped");

    Ok(())
}
