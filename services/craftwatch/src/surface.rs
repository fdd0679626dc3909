//! Surfaces that mirror the reconciled server state
//!
//! Three sinks are updated from each tick: the bot presence (every tick),
//! the status channel topic (only when its text changes) and transition
//! announcements in the same channel. Write failures come back as values in
//! a [`SurfaceReport`] and never abort a tick.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::ServerConfig;
use crate::error::{CraftwatchError, Result};
use crate::reconciler::ReconciliationResult;

/// Coarse presence status shown next to the presence label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceStatus {
    Available,
    Busy,
}

/// External sinks for the monitor state
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait Surfaces: Send + Sync {
    /// Replace the presence label and status
    async fn set_presence(&self, label: &str, status: PresenceStatus) -> Result<()>;

    /// Replace the status channel topic
    async fn set_topic(&self, topic: &str) -> Result<()>;

    /// Post a message to the status channel
    async fn announce(&self, message: &str) -> Result<()>;
}

/// Outcome of applying one tick to the surfaces
#[derive(Debug)]
pub struct SurfaceReport {
    pub presence: Result<()>,
    /// `None` when the topic was not written this tick
    pub topic: Option<Result<()>>,
    pub announcements: Vec<Result<()>>,
}

impl SurfaceReport {
    /// All failed writes in this report
    pub fn failures(&self) -> impl Iterator<Item = &CraftwatchError> {
        std::iter::once(&self.presence)
            .chain(self.topic.iter())
            .chain(self.announcements.iter())
            .filter_map(|r| r.as_ref().err())
    }
}

/// Presence label and status for a tick
pub fn presence_for(display_name: &str, result: &ReconciliationResult) -> (String, PresenceStatus) {
    if result.online {
        (
            format!("{} player(s) on {}", result.online_count, display_name),
            PresenceStatus::Available,
        )
    } else {
        (
            format!("{} server offline", display_name),
            PresenceStatus::Busy,
        )
    }
}

/// Status channel topic for a tick
pub fn topic_for(display_name: &str, result: &ReconciliationResult) -> String {
    if result.online {
        format!(
            "🟢 {} is online: {}/{} players",
            display_name, result.online_count, result.max_count
        )
    } else {
        format!("🔴 {} is offline", display_name)
    }
}

/// Messages announcing a transition
pub fn announcements_for(server: &ServerConfig, became_online: bool) -> Vec<String> {
    if became_online {
        vec![
            format!("🟢 **{}** is back online!", server.display_name),
            format!("Connect at `{}`", server.address()),
        ]
    } else {
        vec![format!("🔴 **{}** went offline.", server.display_name)]
    }
}

/// Upper bound on a single surface write unless configured otherwise
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(15);

/// Await `write`, failing it once `limit` has elapsed
///
/// Rate limited Discord calls sleep and retry internally, so an unbounded
/// write could hold up the tick for minutes.
async fn bounded<F>(what: &str, limit: Duration, write: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    match tokio::time::timeout(limit, write).await {
        Ok(outcome) => outcome,
        Err(_) => Err(CraftwatchError::SurfaceWriteFailed(format!(
            "{} timed out after {:?}",
            what, limit
        ))),
    }
}

/// Applies reconciliation results to the surfaces
///
/// Owns the last topic successfully written, so only one task may drive it.
pub struct SurfaceUpdater {
    surfaces: Arc<dyn Surfaces>,
    server: ServerConfig,
    channel_configured: bool,
    last_topic: Option<String>,
    write_timeout: Duration,
}

impl std::fmt::Debug for SurfaceUpdater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceUpdater")
            .field("server", &self.server.display_name)
            .field("channel_configured", &self.channel_configured)
            .field("last_topic", &self.last_topic)
            .field("write_timeout", &self.write_timeout)
            .finish()
    }
}

impl SurfaceUpdater {
    pub fn new(surfaces: Arc<dyn Surfaces>, server: ServerConfig, channel_configured: bool) -> Self {
        Self {
            surfaces,
            server,
            channel_configured,
            last_topic: None,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    /// Bound every presence, topic and announcement write by `limit`
    pub fn with_write_timeout(mut self, limit: Duration) -> Self {
        self.write_timeout = limit;
        self
    }

    pub fn last_topic(&self) -> Option<&str> {
        self.last_topic.as_deref()
    }

    /// Write the result of one tick to every applicable surface
    pub async fn apply(&mut self, result: &ReconciliationResult) -> SurfaceReport {
        let (label, status) = presence_for(&self.server.display_name, result);
        tracing::debug!("Setting presence: {} ({:?})", label, status);
        let presence = bounded(
            "presence update",
            self.write_timeout,
            self.surfaces.set_presence(&label, status),
        )
        .await;

        if !self.channel_configured {
            return SurfaceReport {
                presence,
                topic: None,
                announcements: Vec::new(),
            };
        }

        let topic = self.update_topic(result).await;

        let announcements = if result.transitioned {
            let mut outcomes = Vec::new();
            for message in announcements_for(&self.server, result.became_online) {
                tracing::info!("Announcing: {}", message);
                let outcome =
                    bounded("announcement", self.write_timeout, self.surfaces.announce(&message))
                        .await;
                outcomes.push(outcome);
            }
            outcomes
        } else {
            Vec::new()
        };

        SurfaceReport {
            presence,
            topic,
            announcements,
        }
    }

    async fn update_topic(&mut self, result: &ReconciliationResult) -> Option<Result<()>> {
        let topic = topic_for(&self.server.display_name, result);
        if self.last_topic.as_deref() == Some(topic.as_str()) {
            tracing::debug!("Topic unchanged, skipping write");
            return None;
        }

        tracing::debug!("Setting topic: {}", topic);
        let outcome = bounded("topic update", self.write_timeout, self.surfaces.set_topic(&topic)).await;
        if outcome.is_ok() {
            self.last_topic = Some(topic);
        }
        Some(outcome)
    }
}
