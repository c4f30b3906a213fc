//! Export session
//!
//! An [`ExportSession`] is what a caller holds: it starts runs, cancels them
//! and exposes the accumulated rows, raw text and progress. Reads and
//! `cancel()` are synchronous; runs execute as Tokio tasks.

use super::accumulator::ResultAccumulator;
use super::orchestrator::{ExportOrchestrator, ExportPhase, FailureHandler};
use super::summary::{ExportFailure, ExportOutcome};
use crate::domain::{EpiError, ExportRequest, QueryParams, Result};
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

/// Mutable state shared between a session and its runs
#[derive(Debug)]
pub(crate) struct SessionState<D> {
    /// Bumped by every trigger and cancel; runs only mutate their own epoch
    pub(crate) epoch: u64,
    pub(crate) pending: bool,
    pub(crate) total: u64,
    pub(crate) retry_budget: u32,
    pub(crate) phase: ExportPhase,
    pub(crate) accumulator: ResultAccumulator<D>,
}

impl<D> Default for SessionState<D> {
    fn default() -> Self {
        Self {
            epoch: 0,
            pending: false,
            total: 0,
            retry_budget: 0,
            phase: ExportPhase::Idle,
            accumulator: ResultAccumulator::new(),
        }
    }
}

impl<D> SessionState<D> {
    /// Reset for a new run and take ownership with a fresh epoch
    pub(crate) fn start(&mut self, total: u64) -> u64 {
        self.clear();
        self.epoch += 1;
        self.pending = true;
        self.total = total;
        self.phase = ExportPhase::Fetching { offset: 0 };
        self.epoch
    }

    /// Reset to idle, detaching any running export
    pub(crate) fn cancel(&mut self) {
        self.clear();
        self.epoch += 1;
        self.phase = ExportPhase::Idle;
    }

    /// Drop rows, text and counters without touching the epoch
    pub(crate) fn clear(&mut self) {
        self.accumulator.clear();
        self.pending = false;
        self.total = 0;
        self.retry_budget = 0;
    }
}

/// Lock session state, recovering it if a holder panicked
pub(crate) fn lock_state<D>(state: &Mutex<SessionState<D>>) -> MutexGuard<'_, SessionState<D>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Point-in-time copy of a session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot<D> {
    /// Whether a run was in progress
    pub pending: bool,
    /// Rows accumulated so far, in page order
    pub rows: Vec<D>,
    /// Raw page texts joined by commas
    pub full_text: String,
    /// Expected total of the run, 0 when idle
    pub total: u64,
    /// Retry budget shared by throttle and backoff
    pub retry_budget: u32,
    /// Phase of the run
    pub phase: ExportPhase,
}

/// Handle to a triggered run
#[derive(Debug)]
pub struct ExportHandle {
    export_id: Uuid,
    task: JoinHandle<ExportOutcome>,
}

impl ExportHandle {
    /// Identifier of the run, attached to its log events
    pub fn export_id(&self) -> Uuid {
        self.export_id
    }

    /// Wait for the run to finish
    ///
    /// # Errors
    ///
    /// Returns [`EpiError::Export`] if the run's task panicked or was aborted.
    pub async fn wait(self) -> Result<ExportOutcome> {
        self.task
            .await
            .map_err(|e| EpiError::Export(format!("Export task {} failed: {e}", self.export_id)))
    }
}

/// Paginated export session
///
/// # Example
///
/// ```no_run
/// use epiexport::adapters::backend::HttpPageFetcher;
/// use epiexport::config::BackendConfig;
/// use epiexport::core::export::{ExportOrchestrator, ExportSession};
/// use epiexport::domain::QueryParams;
/// use std::sync::Arc;
///
/// # async fn example() -> epiexport::domain::Result<()> {
/// let fetcher = Arc::new(HttpPageFetcher::new(&BackendConfig::default())?);
/// let session: ExportSession<Vec<String>> =
///     ExportSession::new(Arc::new(ExportOrchestrator::new(fetcher)))
///         .with_failure_handler(|failure| eprintln!("export failed: {}", failure.body));
///
/// let handle = session.trigger(
///     "server://export-raw-data/",
///     4000,
///     QueryParams::new().with("iso3", "NPL"),
/// );
/// let outcome = handle.wait().await?;
///
/// if outcome.is_success() {
///     println!("{} rows", session.row_count());
/// }
/// # Ok(())
/// # }
/// ```
pub struct ExportSession<D> {
    orchestrator: Arc<ExportOrchestrator>,
    state: Arc<Mutex<SessionState<D>>>,
    on_failure: Option<FailureHandler>,
}

impl<D> Clone for ExportSession<D> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
            state: Arc::clone(&self.state),
            on_failure: self.on_failure.clone(),
        }
    }
}

impl<D> ExportSession<D> {
    /// Create an idle session
    pub fn new(orchestrator: Arc<ExportOrchestrator>) -> Self {
        Self {
            orchestrator,
            state: Arc::new(Mutex::new(SessionState::default())),
            on_failure: None,
        }
    }

    /// Set the callback invoked once per failed run
    pub fn with_failure_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ExportFailure) + Send + Sync + 'static,
    {
        self.on_failure = Some(Arc::new(handler));
        self
    }

    /// Reset the session to idle
    ///
    /// Takes effect immediately. A request already on the wire is not
    /// aborted, but its result is discarded.
    pub fn cancel(&self) {
        let mut state = lock_state(&self.state);
        let was_pending = state.pending;
        state.cancel();
        if was_pending {
            tracing::info!("Export cancelled");
        }
    }

    /// Whether a run is in progress
    pub fn pending(&self) -> bool {
        lock_state(&self.state).pending
    }

    /// Expected total of the current run, 0 when idle
    pub fn total(&self) -> u64 {
        lock_state(&self.state).total
    }

    /// Rows accumulated so far
    pub fn row_count(&self) -> usize {
        lock_state(&self.state).accumulator.len()
    }

    /// Raw page texts joined by commas
    pub fn full_text(&self) -> String {
        lock_state(&self.state).accumulator.full_text().to_string()
    }

    /// Current phase of the session
    pub fn phase(&self) -> ExportPhase {
        lock_state(&self.state).phase
    }

    /// Current retry budget
    pub fn retry_budget(&self) -> u32 {
        lock_state(&self.state).retry_budget
    }

    /// Rows accumulated against the expected total, in `0.0..`
    ///
    /// Returns 0 when the total is 0. May exceed 1 if the backend returns
    /// more rows than expected.
    pub fn progress(&self) -> f64 {
        let state = lock_state(&self.state);
        if state.total == 0 {
            return 0.0;
        }
        state.accumulator.len() as f64 / state.total as f64
    }
}

impl<D: Clone> ExportSession<D> {
    /// Copy of the accumulated rows
    pub fn rows(&self) -> Vec<D> {
        lock_state(&self.state).accumulator.rows().to_vec()
    }

    /// Consistent copy of every observable field
    pub fn snapshot(&self) -> SessionSnapshot<D> {
        let state = lock_state(&self.state);
        SessionSnapshot {
            pending: state.pending,
            rows: state.accumulator.rows().to_vec(),
            full_text: state.accumulator.full_text().to_string(),
            total: state.total,
            retry_budget: state.retry_budget,
            phase: state.phase,
        }
    }
}

impl<D> ExportSession<D>
where
    D: DeserializeOwned + Send + 'static,
{
    /// Reset the session and start exporting `url`
    ///
    /// Any run already in progress is superseded. Must be called from within
    /// a Tokio runtime.
    pub fn trigger(&self, url: impl Into<String>, total: u64, params: QueryParams) -> ExportHandle {
        self.trigger_request(ExportRequest::new(url, total, params))
    }

    /// Reset the session and start exporting `request`
    pub fn trigger_request(&self, request: ExportRequest) -> ExportHandle {
        let epoch = {
            let mut state = lock_state(&self.state);
            if state.pending {
                tracing::warn!("Export triggered while another was pending, superseding it");
            }
            state.start(request.total)
        };

        let export_id = Uuid::new_v4();
        let span = tracing::info_span!("export", export_id = %export_id);
        let orchestrator = Arc::clone(&self.orchestrator);
        let state = Arc::clone(&self.state);
        let on_failure = self.on_failure.clone();

        let task = tokio::spawn(
            async move {
                orchestrator
                    .run(state, epoch, export_id, request, on_failure)
                    .await
            }
            .instrument(span),
        );

        ExportHandle { export_id, task }
    }
}
