//! Probe traits, probe result types, and the async adapter that runs the
//! blocking probes off the runtime's worker threads.
//!
//! Both probe traits are synchronous on purpose: the underlying game server
//! clients are plain blocking socket clients. [`Prober`] moves each call onto
//! tokio's blocking pool, bounds it with a timeout, and converts every failure
//! mode (error, panic, timeout) into a typed outcome.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{CraftwatchError, Result};
use crate::names;

/// Result of a single status probe
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerStatus {
    pub reachable: bool,
    pub online_count: u32,
    pub max_count: u32,
    /// Best-effort sample of online player names, possibly partial
    pub sample_names: Vec<String>,
    pub latency: Option<Duration>,
}

/// Exact list of online player names from the admin query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminQueryResult {
    pub names: Vec<String>,
}

/// Blocking status probe against the game server
#[cfg_attr(test, mockall::automock)]
pub trait StatusProbe: Send + Sync {
    /// Query the server's public status
    fn status(&self) -> Result<ServerStatus>;
}

/// Blocking privileged query returning the raw player list text
#[cfg_attr(test, mockall::automock)]
pub trait AdminQueryProbe: Send + Sync {
    /// Run the player list query and return the server's raw response
    fn list_players(&self) -> Result<String>;
}

/// Runs the blocking probes without blocking the async caller
#[derive(Clone)]
pub struct Prober {
    status: Arc<dyn StatusProbe>,
    admin: Option<Arc<dyn AdminQueryProbe>>,
    timeout: Duration,
}

impl std::fmt::Debug for Prober {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prober")
            .field("admin_enabled", &self.admin.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Prober {
    pub fn new(
        status: Arc<dyn StatusProbe>,
        admin: Option<Arc<dyn AdminQueryProbe>>,
        timeout: Duration,
    ) -> Self {
        Self {
            status,
            admin,
            timeout,
        }
    }

    pub fn admin_enabled(&self) -> bool {
        self.admin.is_some()
    }

    /// Probe the server status
    ///
    /// Every failure, including a timeout or a panicking probe, is reported
    /// as [`CraftwatchError::ProbeUnreachable`].
    pub async fn probe_status(&self) -> Result<ServerStatus> {
        let probe = Arc::clone(&self.status);
        let outcome = run_blocking(self.timeout, move || probe.status()).await;
        match outcome {
            Ok(Ok(status)) => {
                tracing::debug!(
                    "Status probe: {}/{} online, {} sampled, latency {:?}",
                    status.online_count,
                    status.max_count,
                    status.sample_names.len(),
                    status.latency
                );
                Ok(status)
            }
            Ok(Err(CraftwatchError::ProbeUnreachable(reason))) | Err(reason) => {
                tracing::debug!("Status probe failed: {}", reason);
                Err(CraftwatchError::ProbeUnreachable(reason))
            }
            Ok(Err(e)) => {
                tracing::debug!("Status probe failed: {}", e);
                Err(CraftwatchError::ProbeUnreachable(e.to_string()))
            }
        }
    }

    /// Probe the exact player list
    ///
    /// Returns `None` without any I/O when no admin query is configured, and
    /// `None` after logging when the query fails.
    pub async fn probe_admin_query(&self) -> Option<AdminQueryResult> {
        let probe = Arc::clone(self.admin.as_ref()?);
        let outcome = run_blocking(self.timeout, move || probe.list_players()).await;
        let raw = match outcome {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                tracing::warn!("Admin query failed: {}", e);
                return None;
            }
            Err(reason) => {
                tracing::warn!(
                    "Admin query failed: {}",
                    CraftwatchError::AdminQueryFailed(reason)
                );
                return None;
            }
        };

        let names = names::parse_player_list(&raw);
        tracing::debug!("Admin query returned {} names", names.len());
        Some(AdminQueryResult { names })
    }
}

/// Run `f` on the blocking pool, bounded by `timeout`
///
/// The outer `Err` carries a reason when the worker panicked or did not
/// finish in time. A timed out worker keeps running until its own socket
/// timeouts release it; its result is discarded.
async fn run_blocking<T, F>(timeout: Duration, f: F) -> std::result::Result<T, String>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::task::spawn_blocking(f);
    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(join_error)) => Err(format!("probe worker failed: {}", join_error)),
        Err(_) => Err(format!("probe timed out after {:?}", timeout)),
    }
}
