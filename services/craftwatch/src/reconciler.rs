//! Online/offline state reconciliation and transition detection

use crate::error::Result;
use crate::probe::{Prober, ServerStatus};

/// Last observed state of the monitored server
///
/// Starts out unknown, so the first observation only establishes a baseline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorState {
    pub last_known_online: Option<bool>,
    pub last_reported_counts: Option<(u32, u32)>,
}

/// Outcome of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconciliationResult {
    pub online: bool,
    pub online_count: u32,
    pub max_count: u32,
    pub transitioned: bool,
    /// Only meaningful when `transitioned` is set
    pub became_online: bool,
}

/// Fold one status probe outcome into `state`
///
/// A failed or unreachable probe counts as offline immediately; there is no
/// multi-miss debounce.
pub fn reconcile(state: &mut MonitorState, outcome: &Result<ServerStatus>) -> ReconciliationResult {
    let (online, online_count, max_count) = match outcome {
        Ok(status) if status.reachable => (true, status.online_count, status.max_count),
        _ => (false, 0, 0),
    };

    let transitioned = match state.last_known_online {
        None => false,
        Some(previous) => previous != online,
    };
    let became_online = transitioned && online;

    if state.last_reported_counts != Some((online_count, max_count)) {
        tracing::info!(
            "Player count changed: {:?} -> {}/{}",
            state.last_reported_counts,
            online_count,
            max_count
        );
    }

    state.last_known_online = Some(online);
    state.last_reported_counts = Some((online_count, max_count));

    ReconciliationResult {
        online,
        online_count,
        max_count,
        transitioned,
        became_online,
    }
}

/// Owns the monitor state and drives one probe per tick
#[derive(Debug)]
pub struct Reconciler {
    prober: Prober,
    state: MonitorState,
}

impl Reconciler {
    pub fn new(prober: Prober) -> Self {
        Self::with_state(prober, MonitorState::default())
    }

    /// Start from a known prior state
    pub fn with_state(prober: Prober, state: MonitorState) -> Self {
        Self { prober, state }
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Probe the server and reconcile the result
    pub async fn tick(&mut self) -> ReconciliationResult {
        let outcome = self.prober.probe_status().await;
        if let Err(e) = &outcome {
            tracing::debug!("Treating server as offline: {}", e);
        }

        let previous = self.state.last_known_online;
        let result = reconcile(&mut self.state, &outcome);

        if result.transitioned {
            tracing::info!(
                "Server went {}",
                if result.became_online { "online" } else { "offline" }
            );
        } else if previous.is_none() {
            tracing::info!(
                "Initial server state: {}",
                if result.online { "online" } else { "offline" }
            );
        }

        result
    }
}
