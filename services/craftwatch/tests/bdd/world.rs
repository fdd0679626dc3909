//! BDD test world for craftwatch

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cucumber::World;
use tokio_util::sync::CancellationToken;

use craftwatch::config::ServerConfig;
use craftwatch::probe::{AdminQueryProbe, Prober, ServerStatus, StatusProbe};
use craftwatch::query::QueryReport;
use craftwatch::reconciler::{MonitorState, Reconciler, ReconciliationResult};
use craftwatch::surface::{PresenceStatus, SurfaceReport, SurfaceUpdater, Surfaces};
use craftwatch::{CraftwatchError, Result};

/// Status probe replaying a script of outcomes; `None` is unreachable
#[derive(Debug, Default)]
pub struct ScriptedStatusProbe {
    script: Mutex<VecDeque<Option<ServerStatus>>>,
    hang: Mutex<Option<Duration>>,
}

impl ScriptedStatusProbe {
    pub fn push(&self, outcome: Option<ServerStatus>) {
        self.script.lock().unwrap().push_back(outcome);
    }

    pub fn hang_for(&self, duration: Duration) {
        *self.hang.lock().unwrap() = Some(duration);
    }
}

impl StatusProbe for ScriptedStatusProbe {
    fn status(&self) -> Result<ServerStatus> {
        let hang = *self.hang.lock().unwrap();
        if let Some(duration) = hang {
            std::thread::sleep(duration);
        }

        match self.script.lock().unwrap().pop_front() {
            Some(Some(status)) => Ok(status),
            Some(None) => Err(CraftwatchError::ProbeUnreachable(
                "connection refused".to_string(),
            )),
            None => Err(CraftwatchError::ProbeUnreachable(
                "script exhausted".to_string(),
            )),
        }
    }
}

/// Admin probe with a fixed reply; `None` fails every call
#[derive(Debug, Default)]
pub struct FixedAdminProbe {
    pub reply: Option<String>,
    pub calls: AtomicUsize,
}

impl AdminQueryProbe for FixedAdminProbe {
    fn list_players(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply
            .clone()
            .ok_or_else(|| CraftwatchError::AdminQueryFailed("authentication rejected".to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceWrite {
    Presence(String, PresenceStatus),
    Topic(String),
    Announcement(String),
}

/// Records every write attempt, optionally rejecting all of them
#[derive(Debug, Default)]
pub struct RecordingSurfaces {
    pub writes: Mutex<Vec<SurfaceWrite>>,
    pub reject: AtomicBool,
    /// Cancel the token once this many presence writes were attempted
    pub cancel_after: Mutex<Option<(usize, CancellationToken)>>,
}

impl RecordingSurfaces {
    fn record(&self, write: SurfaceWrite) -> Result<()> {
        self.writes.lock().unwrap().push(write);
        if self.reject.load(Ordering::SeqCst) {
            Err(CraftwatchError::SurfaceWriteFailed("missing permissions".to_string()))
        } else {
            Ok(())
        }
    }

    pub fn snapshot(&self) -> Vec<SurfaceWrite> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl Surfaces for RecordingSurfaces {
    async fn set_presence(&self, label: &str, status: PresenceStatus) -> Result<()> {
        let outcome = self.record(SurfaceWrite::Presence(label.to_string(), status));

        let presence_writes = self
            .snapshot()
            .iter()
            .filter(|w| matches!(w, SurfaceWrite::Presence(..)))
            .count();
        if let Some((limit, cancel)) = self.cancel_after.lock().unwrap().as_ref() {
            if presence_writes >= *limit {
                cancel.cancel();
            }
        }

        outcome
    }

    async fn set_topic(&self, topic: &str) -> Result<()> {
        self.record(SurfaceWrite::Topic(topic.to_string()))
    }

    async fn announce(&self, message: &str) -> Result<()> {
        self.record(SurfaceWrite::Announcement(message.to_string()))
    }
}

/// Outcome of one tick as observed by a scenario
#[derive(Debug)]
pub struct ObservedTick {
    pub result: ReconciliationResult,
    pub report: SurfaceReport,
    pub writes: Vec<SurfaceWrite>,
    pub elapsed: Duration,
}

#[derive(Debug, Default, World)]
pub struct CraftwatchWorld {
    pub server: ServerConfig,
    pub channel_configured: bool,
    pub probe_timeout: Option<Duration>,

    // Probes
    pub status_probe: Arc<ScriptedStatusProbe>,
    pub admin_probe: Option<Arc<FixedAdminProbe>>,

    // Poll loop
    pub prior_state: Option<MonitorState>,
    pub surfaces: Arc<RecordingSurfaces>,
    pub reconciler: Option<Reconciler>,
    pub updater: Option<SurfaceUpdater>,
    pub ticks: Vec<ObservedTick>,

    // Queries
    pub names: Option<Vec<String>>,
    pub query_report: Option<QueryReport>,
}

impl CraftwatchWorld {
    pub fn prober(&self) -> Prober {
        let admin = self
            .admin_probe
            .as_ref()
            .map(|probe| Arc::clone(probe) as Arc<dyn AdminQueryProbe>);
        Prober::new(
            Arc::clone(&self.status_probe) as Arc<dyn StatusProbe>,
            admin,
            self.probe_timeout.unwrap_or(Duration::from_secs(5)),
        )
    }

    pub fn take_reconciler(&mut self) -> Reconciler {
        match self.reconciler.take() {
            Some(reconciler) => reconciler,
            None => Reconciler::with_state(self.prober(), self.prior_state.clone().unwrap_or_default()),
        }
    }

    pub fn take_updater(&mut self) -> SurfaceUpdater {
        match self.updater.take() {
            Some(updater) => updater,
            None => SurfaceUpdater::new(
                Arc::clone(&self.surfaces) as Arc<dyn Surfaces>,
                self.server.clone(),
                self.channel_configured,
            ),
        }
    }

    /// Run one reconcile-and-apply cycle, keeping the loop components
    pub async fn tick(&mut self) {
        let mut reconciler = self.take_reconciler();
        let mut updater = self.take_updater();
        let before = self.surfaces.snapshot().len();

        let started = std::time::Instant::now();
        let result = reconciler.tick().await;
        let report = updater.apply(&result).await;
        let elapsed = started.elapsed();

        let writes = self.surfaces.snapshot()[before..].to_vec();
        self.ticks.push(ObservedTick {
            result,
            report,
            writes,
            elapsed,
        });
        self.reconciler = Some(reconciler);
        self.updater = Some(updater);
    }

    /// Observed tick by 1-based number
    pub fn tick_number(&self, number: usize) -> &ObservedTick {
        self.ticks
            .get(number - 1)
            .unwrap_or_else(|| panic!("tick {} was not run", number))
    }

    pub fn last_tick(&self) -> &ObservedTick {
        self.ticks.last().expect("no tick was run")
    }
}
