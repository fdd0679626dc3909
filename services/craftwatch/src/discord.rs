//! Discord gateway integration
//!
//! [`DiscordSurfaces`] writes the monitor state to presence, topic and
//! announcements. [`Handler`] starts the poll loop on the first `ready`
//! event and answers the player query command.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serenity::all::{
    ActivityData, ChannelId, Context, CreateEmbed, EditChannel, EditMessage, EventHandler,
    GatewayIntents, Message, OnlineStatus, Ready,
};
use serenity::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, ServerConfig};
use crate::error::{CraftwatchError, Result};
use crate::probe::Prober;
use crate::query::{self, QueryReport};
use crate::reconciler::Reconciler;
use crate::scheduler::PollScheduler;
use crate::surface::{PresenceStatus, SurfaceUpdater, Surfaces};

/// Gateway events the bot subscribes to
///
/// MESSAGE_CONTENT is privileged and must be enabled in the developer portal
/// for prefix commands to be visible.
pub fn intents() -> GatewayIntents {
    GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT
}

const PLACEHOLDER: &str = "⏳ Checking Minecraft server status...";
const COLOUR_GREEN: u32 = 0x2ecc71;
const COLOUR_RED: u32 = 0xe74c3c;
const QUERY_COMMANDS: [&str; 2] = ["online", "players"];

/// Surfaces backed by a live gateway connection
#[derive(Clone)]
pub struct DiscordSurfaces {
    ctx: Context,
    channel: Option<ChannelId>,
}

impl DiscordSurfaces {
    pub fn new(ctx: Context, channel: Option<ChannelId>) -> Self {
        Self { ctx, channel }
    }

    fn channel(&self) -> Result<ChannelId> {
        self.channel.ok_or_else(|| {
            CraftwatchError::SurfaceWriteFailed("no status channel configured".to_string())
        })
    }
}

fn write_failed(what: &str, e: serenity::Error) -> CraftwatchError {
    CraftwatchError::SurfaceWriteFailed(format!("{}: {}", what, e))
}

#[async_trait]
impl Surfaces for DiscordSurfaces {
    async fn set_presence(&self, label: &str, status: PresenceStatus) -> Result<()> {
        let status = match status {
            PresenceStatus::Available => OnlineStatus::Online,
            PresenceStatus::Busy => OnlineStatus::DoNotDisturb,
        };
        // queued on the shard runner; delivery failures are not reported back
        self.ctx
            .set_presence(Some(ActivityData::watching(label)), status);
        Ok(())
    }

    async fn set_topic(&self, topic: &str) -> Result<()> {
        self.channel()?
            .edit(&self.ctx.http, EditChannel::new().topic(topic))
            .await
            .map_err(|e| write_failed("topic update", e))?;
        Ok(())
    }

    async fn announce(&self, message: &str) -> Result<()> {
        self.channel()?
            .say(&self.ctx.http, message)
            .await
            .map_err(|e| write_failed("announcement", e))?;
        Ok(())
    }
}

/// Whether `content` invokes the player query with the given prefix
///
/// The command name must be followed by whitespace or the end of the
/// message, so `!onlineX` does not match.
pub fn is_query_command(prefix: &str, content: &str) -> bool {
    let Some(rest) = content.strip_prefix(prefix) else {
        return false;
    };
    let name = rest.split_whitespace().next().unwrap_or_default();
    !rest.starts_with(char::is_whitespace) && QUERY_COMMANDS.contains(&name)
}

/// Embed colour for a reachable server
pub fn report_colour(report: &QueryReport) -> u32 {
    match report {
        QueryReport::Online { online_count, .. } if *online_count > 0 => COLOUR_GREEN,
        _ => COLOUR_RED,
    }
}

/// Rich reply for a reachable server, `None` when a plain text reply is used
pub fn report_embed(server: &ServerConfig, report: &QueryReport) -> Option<CreateEmbed> {
    match report {
        QueryReport::Unreachable { .. } => None,
        QueryReport::Online { address, .. } => Some(
            CreateEmbed::new()
                .title(format!("🌐 {} Minecraft Status", server.display_name))
                .description(report.description())
                .color(report_colour(report))
                .field("Address", format!("`{}`", address), false),
        ),
    }
}

/// Gateway event handler
pub struct Handler {
    config: Arc<Config>,
    prober: Prober,
    cancel: CancellationToken,
    started: AtomicBool,
}

impl Handler {
    pub fn new(config: Arc<Config>, prober: Prober, cancel: CancellationToken) -> Self {
        Self {
            config,
            prober,
            cancel,
            started: AtomicBool::new(false),
        }
    }

    fn start_poll_loop(&self, ctx: Context) {
        let channel = self.config.discord.status_channel_id.map(ChannelId::new);
        let surfaces = Arc::new(DiscordSurfaces::new(ctx, channel));
        let updater = SurfaceUpdater::new(surfaces, self.config.server.clone(), channel.is_some())
            .with_write_timeout(Duration::from_secs(self.config.surface_timeout_seconds));
        let mut scheduler = PollScheduler::new(
            Reconciler::new(self.prober.clone()),
            updater,
            Duration::from_secs(self.config.polling_interval_seconds),
            self.cancel.clone(),
        );

        tokio::spawn(async move {
            scheduler.run().await;
        });
    }

    async fn answer_query(&self, ctx: &Context, msg: &Message) -> Result<()> {
        let mut reply = msg.channel_id.say(&ctx.http, PLACEHOLDER).await?;

        let report = query::query(&self.prober, &self.config.server).await;
        tracing::debug!("Query result: {:?}", report);

        let edit = match report_embed(&self.config.server, &report) {
            Some(embed) => EditMessage::new().content("").embed(embed),
            None => EditMessage::new().content(report.description()),
        };
        reply.edit(&ctx.http, edit).await?;
        Ok(())
    }
}

#[async_trait]
impl EventHandler for Handler {
    /// Called on every (re)connect; the poll loop starts only once
    async fn ready(&self, ctx: Context, ready: Ready) {
        tracing::info!("{} is connected to Discord!", ready.user.name);

        if self.started.swap(true, Ordering::SeqCst) {
            tracing::debug!("Reconnected, poll loop already running");
            return;
        }
        self.start_poll_loop(ctx);
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot || !is_query_command(&self.config.discord.command_prefix, &msg.content) {
            return;
        }

        tracing::info!(
            "Player query from {} in channel {}",
            msg.author.name,
            msg.channel_id
        );
        if let Err(e) = self.answer_query(&ctx, &msg).await {
            tracing::error!("Failed to answer player query: {}", e);
        }
    }
}
