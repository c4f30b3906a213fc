//! Export orchestration
//!
//! The [`ExportOrchestrator`] drives one export run: it requests pages at
//! increasing offsets, hands successful pages to the accumulator, waits
//! between pages and retries rate-limited pages in place.
//!
//! # Run loop
//!
//! ```text
//! Fetching(offset)
//!   2xx  -> ingest; more pages? Waiting(throttle) -> Fetching(offset + page_size)
//!                   otherwise  Succeeded
//!   429  -> Waiting(backoff) -> Fetching(offset)
//!   else -> Failed (session cleared, failure handler called once)
//! ```
//!
//! All session mutations happen through an epoch check. `trigger()` and
//! `cancel()` bump the session epoch, so a run that resumes after its session
//! moved on stops with [`ExportOutcome::Superseded`] and leaves the session
//! alone.

use super::accumulator::ResultAccumulator;
use super::pacing::PacingPolicy;
use super::session::{lock_state, SessionState};
use super::summary::{ExportFailure, ExportOutcome, ExportSummary};
use crate::adapters::backend::PageFetcher;
use crate::config::ExportConfig;
use crate::domain::{ExportRequest, PageRequest, PAGE_SIZE};
use crate::{log_export_start, log_page_progress, log_rate_limited};
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// Callback invoked once with the failure of a run
pub type FailureHandler = Arc<dyn Fn(&ExportFailure) + Send + Sync>;

/// Where a session's run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportPhase {
    /// No run, or the last run was cancelled
    #[default]
    Idle,

    /// Waiting for the page at `offset`
    Fetching { offset: u64 },

    /// Sleeping before requesting `offset` (again, after a 429)
    Waiting { offset: u64, delay: Duration },

    /// All pages ingested
    Succeeded,

    /// Terminal failure
    Failed,
}

impl ExportPhase {
    /// Whether a run is in progress
    pub fn is_active(&self) -> bool {
        matches!(self, ExportPhase::Fetching { .. } | ExportPhase::Waiting { .. })
    }
}

/// Drives paginated export runs against a [`PageFetcher`]
pub struct ExportOrchestrator {
    fetcher: Arc<dyn PageFetcher>,
    pacing: PacingPolicy,
    page_size: u64,
    stop_on_empty_page: bool,
    max_rate_limit_retries: Option<u32>,
}

impl ExportOrchestrator {
    /// Create an orchestrator with default pacing and page size
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            pacing: PacingPolicy::default(),
            page_size: PAGE_SIZE,
            stop_on_empty_page: true,
            max_rate_limit_retries: None,
        }
    }

    /// Create an orchestrator from export configuration
    pub fn from_config(fetcher: Arc<dyn PageFetcher>, config: &ExportConfig) -> Self {
        Self::new(fetcher)
            .with_pacing(PacingPolicy::from_config(config))
            .with_page_size(config.page_size)
            .with_stop_on_empty_page(config.stop_on_empty_page)
            .with_max_rate_limit_retries(config.max_rate_limit_retries)
    }

    /// Set the delay policy
    pub fn with_pacing(mut self, pacing: PacingPolicy) -> Self {
        self.pacing = pacing;
        self
    }

    /// Set the page size (at least 1)
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Whether a 2xx page without data rows ends the run
    pub fn with_stop_on_empty_page(mut self, stop: bool) -> Self {
        self.stop_on_empty_page = stop;
        self
    }

    /// Consecutive 429 responses tolerated on one page, `None` for no limit
    pub fn with_max_rate_limit_retries(mut self, max: Option<u32>) -> Self {
        self.max_rate_limit_retries = max;
        self
    }

    /// Rows requested per page
    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Run one export against the session state owned by `epoch`
    pub(crate) async fn run<D>(
        &self,
        state: Arc<Mutex<SessionState<D>>>,
        epoch: u64,
        export_id: Uuid,
        request: ExportRequest,
        on_failure: Option<FailureHandler>,
    ) -> ExportOutcome
    where
        D: DeserializeOwned + Send + 'static,
    {
        let started = Instant::now();
        let mut summary = ExportSummary::new(export_id, &request.url, request.total);
        let mut page = PageRequest::new(0, self.page_size);
        let mut consecutive_rate_limits: u32 = 0;

        log_export_start!(request.url, request.total);

        loop {
            let offset = page.offset;
            if update(&state, epoch, |s| s.phase = ExportPhase::Fetching { offset }).is_none() {
                return superseded(offset);
            }

            let params = request.page_params(&page);
            let result = match self.fetcher.fetch(&request.url, &params).await {
                Ok(result) => result,
                Err(e) => {
                    let failure = ExportFailure::transport(offset, &e);
                    return fail(&state, epoch, failure, on_failure.as_ref());
                }
            };

            if result.is_success() {
                consecutive_rate_limits = 0;

                let rows = match ResultAccumulator::<D>::parse(&result.body) {
                    Ok(rows) => rows,
                    Err(e) => {
                        let failure = ExportFailure::parse(offset, result.status, &e);
                        return fail(&state, epoch, failure, on_failure.as_ref());
                    }
                };

                let ingested = rows.len();
                let empty_stop = self.stop_on_empty_page && ingested == 0;
                let more = page.has_more(request.total) && !empty_stop;
                let pacing = self.pacing;

                let step = update(&state, epoch, |s| {
                    s.accumulator.append(rows, &result.body);
                    if more {
                        let delay = pacing.throttle_delay(s.retry_budget);
                        s.phase = ExportPhase::Waiting {
                            offset: offset + page.limit,
                            delay,
                        };
                        (s.accumulator.len(), Some(delay))
                    } else {
                        s.pending = false;
                        s.phase = ExportPhase::Succeeded;
                        (s.accumulator.len(), None)
                    }
                });
                let Some((held, next_delay)) = step else {
                    return superseded(offset);
                };

                summary.pages_fetched += 1;
                summary.rows = held;
                log_page_progress!(offset, held, request.total);

                let Some(delay) = next_delay else {
                    if empty_stop && page.has_more(request.total) {
                        tracing::info!(offset, "Empty page before the expected total, stopping");
                    }
                    let summary = summary.with_duration(started.elapsed());
                    summary.log_summary();
                    return ExportOutcome::Succeeded(summary);
                };

                tokio::time::sleep(delay).await;

                let decremented =
                    update(&state, epoch, |s| s.retry_budget = s.retry_budget.saturating_sub(1));
                if decremented.is_none() {
                    return superseded(offset);
                }
                page = page.next();
            } else if result.is_rate_limited() {
                if let Some(max) = self.max_rate_limit_retries {
                    if consecutive_rate_limits >= max {
                        let failure = ExportFailure::rate_limit_exhausted(
                            offset,
                            consecutive_rate_limits,
                            result.body,
                        );
                        return fail(&state, epoch, failure, on_failure.as_ref());
                    }
                }

                let pacing = self.pacing;
                let waiting = update(&state, epoch, |s| {
                    let delay = pacing.backoff_delay(s.retry_budget);
                    s.phase = ExportPhase::Waiting { offset, delay };
                    (s.retry_budget, delay)
                });
                let Some((budget, delay)) = waiting else {
                    return superseded(offset);
                };

                log_rate_limited!(offset, budget, delay.as_millis() as u64);
                tokio::time::sleep(delay).await;

                let incremented =
                    update(&state, epoch, |s| s.retry_budget = s.retry_budget.saturating_add(1));
                if incremented.is_none() {
                    return superseded(offset);
                }
                consecutive_rate_limits += 1;
                summary.rate_limit_retries += 1;
            } else {
                let failure = ExportFailure::http(offset, result.status, result.body);
                return fail(&state, epoch, failure, on_failure.as_ref());
            }
        }
    }
}

/// Apply `f` to the session if it still belongs to `epoch`
fn update<D, R>(
    state: &Mutex<SessionState<D>>,
    epoch: u64,
    f: impl FnOnce(&mut SessionState<D>) -> R,
) -> Option<R> {
    let mut guard = lock_state(state);
    if guard.epoch != epoch {
        return None;
    }
    Some(f(&mut guard))
}

fn fail<D>(
    state: &Mutex<SessionState<D>>,
    epoch: u64,
    failure: ExportFailure,
    on_failure: Option<&FailureHandler>,
) -> ExportOutcome {
    let cleared = update(state, epoch, |s| {
        s.clear();
        s.phase = ExportPhase::Failed;
    });
    if cleared.is_none() {
        return superseded(failure.offset);
    }

    failure.log_failure();
    if let Some(handler) = on_failure {
        handler(&failure);
    }
    ExportOutcome::Failed(failure)
}

fn superseded(offset: u64) -> ExportOutcome {
    tracing::debug!(offset, "Session moved on, discarding export run");
    ExportOutcome::Superseded
}
