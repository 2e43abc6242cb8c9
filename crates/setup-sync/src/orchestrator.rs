use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::catalog::ModelCatalog;
use crate::event::{EventSink, SetupEvent, SetupProgress};
use crate::gate::{DependencyCheckResult, DependencyGate};
use crate::guard::ActiveRuns;
use crate::priority::Priority;
use crate::session::{SessionHandle, SetupConfig};
use crate::sync::{SyncExecutor, SyncOutcome, SyncStats};

/// One progress step per priority tier.
pub const TOTAL_TIERS: u32 = Priority::ALL.len() as u32;

/// Where a run currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupState {
    Idle,
    Syncing(Priority),
    GateCheck,
    Completed,
    Failed(Vec<String>),
    Cancelled,
}

impl SetupState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_) | Self::Cancelled)
    }
}

/// Reasons a run ends without a terminal event.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("no session available, setup not started")]
    NoSession,

    #[error("setup already running for account {0}")]
    AlreadyRunning(String),

    #[error("setup cancelled during {0} tier")]
    Cancelled(Priority),
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupOutcome {
    Completed,
    DependencyFailed(Vec<String>),
}

/// Aggregated results of one tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierReport {
    pub priority: Priority,
    pub stats: SyncStats,
    pub synced_models: Vec<String>,
    /// Models whose exchange failed as a whole.
    pub failed_models: Vec<String>,
    /// Models that could not be constructed.
    pub skipped_models: Vec<String>,
}

impl TierReport {
    fn new(priority: Priority) -> Self {
        Self {
            priority,
            stats: SyncStats::default(),
            synced_models: Vec::new(),
            failed_models: Vec::new(),
            skipped_models: Vec::new(),
        }
    }
}

/// Summary returned to the caller once a run reaches a terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupReport {
    pub outcome: SetupOutcome,
    pub tiers: Vec<TierReport>,
}

impl SetupReport {
    pub fn is_completed(&self) -> bool {
        self.outcome == SetupOutcome::Completed
    }

    /// Record counts summed over every tier that ran.
    pub fn totals(&self) -> SyncStats {
        let mut totals = SyncStats::default();
        for tier in &self.tiers {
            totals += &tier.stats;
        }
        totals
    }
}

/// Drives one staged setup run.
///
/// Tiers run sequentially in [`Priority::ALL`] order and models within a tier
/// in catalog order. After the high tier the dependency gate is consulted;
/// an unsatisfied gate ends the run with a `DependencyError` event.
pub struct SetupOrchestrator {
    catalog: Arc<ModelCatalog>,
    executor: Arc<dyn SyncExecutor>,
    gate: Arc<dyn DependencyGate>,
    sink: Arc<dyn EventSink>,
    cancel: CancellationToken,
    active_runs: Option<ActiveRuns>,
    state: watch::Sender<SetupState>,
    completed_tiers: u32,
}

impl SetupOrchestrator {
    pub fn new(
        catalog: Arc<ModelCatalog>,
        executor: Arc<dyn SyncExecutor>,
        gate: Arc<dyn DependencyGate>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            catalog,
            executor,
            gate,
            sink,
            cancel: CancellationToken::new(),
            active_runs: None,
            state: watch::channel(SetupState::Idle).0,
            completed_tiers: 0,
        }
    }

    /// Checked before each model; a cancelled run stops without a terminal event.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Reject a run while another one holds the same account.
    pub fn with_active_runs(mut self, runs: ActiveRuns) -> Self {
        self.active_runs = Some(runs);
        self
    }

    /// Current state.
    pub fn state(&self) -> SetupState {
        self.state.borrow().clone()
    }

    /// Follow state transitions. Subscribe before `run` or `spawn`; the
    /// receiver keeps the final state after the run ends.
    pub fn watch_state(&self) -> watch::Receiver<SetupState> {
        self.state.subscribe()
    }

    fn set_state(&self, state: SetupState) {
        self.state.send_replace(state);
    }

    /// Run on a dedicated tokio task.
    pub fn spawn(self, config: SetupConfig) -> JoinHandle<Result<SetupReport, SetupError>> {
        tokio::spawn(self.run(config))
    }

    pub async fn run(mut self, config: SetupConfig) -> Result<SetupReport, SetupError> {
        let Some(session) = config.session else {
            tracing::error!("unable to start setup: no session");
            return Err(SetupError::NoSession);
        };

        let _run_token = match &self.active_runs {
            Some(runs) => Some(
                runs.acquire(session.account())
                    .ok_or_else(|| SetupError::AlreadyRunning(session.account().to_owned()))?,
            ),
            None => None,
        };

        tracing::info!(
            account = session.account(),
            database = session.database(),
            models = self.catalog.len(),
            "setup started"
        );

        let mut tiers = Vec::with_capacity(Priority::ALL.len());
        tiers.push(self.sync_tier(Priority::High, &session).await?);

        self.set_state(SetupState::GateCheck);
        let gate_result = if config.skip_dependency_check {
            tracing::debug!("module dependency check skipped");
            DependencyCheckResult::Satisfied
        } else {
            self.gate.check(&session).await
        };

        // An empty missing list cannot fail the run.
        if let DependencyCheckResult::Unsatisfied(missing) = gate_result
            && !missing.is_empty()
        {
            tracing::error!(missing = ?missing, "module dependency check failed");
            self.set_state(SetupState::Failed(missing.clone()));
            self.sink.emit(SetupEvent::DependencyError {
                missing: missing.clone(),
            });
            return Ok(SetupReport {
                outcome: SetupOutcome::DependencyFailed(missing),
                tiers,
            });
        }

        for priority in &Priority::ALL[1..] {
            tiers.push(self.sync_tier(*priority, &session).await?);
        }

        self.set_state(SetupState::Completed);
        tracing::info!(account = session.account(), "all set, setup finished");
        self.sink.emit(SetupEvent::Completed);

        Ok(SetupReport {
            outcome: SetupOutcome::Completed,
            tiers,
        })
    }

    async fn sync_tier(
        &mut self,
        priority: Priority,
        session: &SessionHandle,
    ) -> Result<TierReport, SetupError> {
        self.set_state(SetupState::Syncing(priority));
        let descriptors = self.catalog.descriptors_for(priority);
        tracing::info!(
            tier = %priority,
            models = descriptors.len(),
            "processing {} models",
            priority.description()
        );

        let mut report = TierReport::new(priority);
        for descriptor in descriptors {
            if self.cancel.is_cancelled() {
                tracing::warn!(tier = %priority, "setup cancelled");
                self.set_state(SetupState::Cancelled);
                return Err(SetupError::Cancelled(priority));
            }

            let name = descriptor.name().to_owned();
            match self.executor.synchronize(descriptor, session).await {
                Ok(SyncOutcome::Synced(stats)) => {
                    tracing::debug!(
                        model = %name,
                        inserted = stats.inserted,
                        updated = stats.updated,
                        deleted = stats.deleted,
                        failed = stats.failed,
                        "model synced"
                    );
                    report.stats += &stats;
                    report.synced_models.push(name);
                }
                Ok(SyncOutcome::Failed { cause }) => {
                    tracing::warn!(model = %name, cause = %cause, "model sync failed");
                    report.failed_models.push(name);
                }
                Err(e) => {
                    tracing::error!(model = %name, error = %e, "model object create failed");
                    report.skipped_models.push(name);
                }
            }
        }

        self.completed_tiers += 1;
        self.sink.emit(SetupEvent::Progress(SetupProgress::new(
            self.completed_tiers,
            TOTAL_TIERS,
        )));

        Ok(report)
    }
}
