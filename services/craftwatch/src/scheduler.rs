//! Fixed-period poll loop

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::reconciler::{MonitorState, Reconciler, ReconciliationResult};
use crate::surface::SurfaceUpdater;

/// Drives one reconcile-and-apply cycle per interval until cancelled
///
/// The scheduler owns both the reconciler and the surface updater, so the
/// monitor state and cached topic have a single owner and need no locking.
#[derive(Debug)]
pub struct PollScheduler {
    reconciler: Reconciler,
    updater: SurfaceUpdater,
    interval: Duration,
    cancel: CancellationToken,
}

impl PollScheduler {
    pub fn new(
        reconciler: Reconciler,
        updater: SurfaceUpdater,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            reconciler,
            updater,
            interval,
            cancel,
        }
    }

    pub fn state(&self) -> &MonitorState {
        self.reconciler.state()
    }

    /// Run a single tick
    pub async fn tick(&mut self) -> ReconciliationResult {
        let result = self.reconciler.tick().await;
        let report = self.updater.apply(&result).await;
        for failure in report.failures() {
            tracing::warn!("Surface update failed: {}", failure);
        }
        result
    }

    /// Tick immediately, then once per interval until the token is cancelled
    ///
    /// Ticks never overlap. A tick that overruns the interval is followed by
    /// the next one as soon as it completes.
    pub async fn run(&mut self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("Poll loop started (interval {:?})", self.interval);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    tracing::debug!("Poll loop cancelled");
                    break;
                }
                _ = ticker.tick() => {}
            }
            self.tick().await;
        }

        tracing::info!("Poll loop stopped");
    }
}
