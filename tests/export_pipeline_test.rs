//! Integration tests for the export pipeline
//!
//! These tests drive a full session against a scripted fetcher and verify:
//! - Offsets requested for a given total
//! - Row order across pages and per-page trailing record removal
//! - Quadratic backoff on rate limiting
//! - State after terminal failure and cancellation

use async_trait::async_trait;
use epiexport::adapters::backend::PageFetcher;
use epiexport::core::export::{
    ExportFailure, ExportOrchestrator, ExportOutcome, ExportPhase, ExportSession,
};
use epiexport::domain::{PageResult, QueryParams, QueryValue, Result};
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
struct Call {
    url: String,
    params: QueryParams,
    at: Instant,
}

impl Call {
    fn offset(&self) -> u64 {
        match self.params.get("offset") {
            Some(QueryValue::Int(n)) => *n as u64,
            other => panic!("missing offset: {other:?}"),
        }
    }
}

/// Replays responses in order and records every call
#[derive(Default)]
struct ScriptedFetcher {
    responses: Mutex<VecDeque<PageResult>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedFetcher {
    fn new(responses: Vec<PageResult>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn offsets(&self) -> Vec<u64> {
        self.calls.lock().unwrap().iter().map(Call::offset).collect()
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str, params: &QueryParams) -> Result<PageResult> {
        self.calls.lock().unwrap().push(Call {
            url: url.to_string(),
            params: params.clone(),
            at: Instant::now(),
        });
        let next = self.responses.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| PageResult::new(200, "region,cases\n")))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct CaseRow {
    region: String,
    cases: u64,
}

/// A 200 page with `rows` data rows numbered from `start`, newline-terminated
fn csv_page(start: usize, rows: usize) -> PageResult {
    let mut body = String::from("region,cases\n");
    for i in start..start + rows {
        body.push_str(&format!("r{i},{i}\n"));
    }
    PageResult::new(200, body)
}

fn session<D>(fetcher: Arc<ScriptedFetcher>) -> ExportSession<D> {
    ExportSession::new(Arc::new(ExportOrchestrator::new(fetcher)))
}

#[tokio::test(start_paused = true)]
async fn test_end_to_end_two_pages() {
    let fetcher = ScriptedFetcher::new(vec![csv_page(0, 3000), csv_page(3000, 1000)]);
    let session: ExportSession<CaseRow> = session(fetcher.clone());

    let handle = session.trigger(
        "server://export-raw-data/",
        4000,
        QueryParams::new().with("iso3", "NPL"),
    );
    let outcome = handle.wait().await.unwrap();

    let summary = outcome.summary().expect("export should succeed");
    assert_eq!(summary.rows, 4000);
    assert_eq!(summary.pages_fetched, 2);
    assert_eq!(summary.rate_limit_retries, 0);

    assert_eq!(session.row_count(), 4000);
    assert!(!session.pending());
    assert_eq!(session.phase(), ExportPhase::Succeeded);
    assert_eq!(fetcher.call_count(), 2);
    assert_eq!(fetcher.offsets(), vec![0, 3000]);

    let calls = fetcher.calls.lock().unwrap();
    for call in calls.iter() {
        assert_eq!(call.url, "server://export-raw-data/");
        let keys: Vec<&str> = call.params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["iso3", "offset", "limit"]);
        assert_eq!(call.params.get("limit"), Some(&QueryValue::Int(3000)));
    }
}

#[tokio::test(start_paused = true)]
async fn test_offsets_cover_total() {
    // floor((10000 - 1) / 3000) * 3000 = 9000
    let pages = (0..4).map(|p| csv_page(p * 3000, 3000)).collect();
    let fetcher = ScriptedFetcher::new(pages);
    let session: ExportSession<CaseRow> = session(fetcher.clone());

    session
        .trigger("server://export-raw-data/", 10000, QueryParams::new())
        .wait()
        .await
        .unwrap();

    assert_eq!(fetcher.offsets(), vec![0, 3000, 6000, 9000]);
}

#[tokio::test(start_paused = true)]
async fn test_exact_multiple_requests_one_extra_page() {
    // offset + page_size <= total keeps going at the boundary, so an exact
    // multiple costs one request past the last full page
    let fetcher = ScriptedFetcher::new(vec![csv_page(0, 3000), csv_page(3000, 3000)]);
    let orchestrator = ExportOrchestrator::new(fetcher.clone()).with_stop_on_empty_page(false);
    let session: ExportSession<CaseRow> = ExportSession::new(Arc::new(orchestrator));

    session
        .trigger("server://export-raw-data/", 6000, QueryParams::new())
        .wait()
        .await
        .unwrap();

    assert_eq!(fetcher.offsets(), vec![0, 3000, 6000]);
    assert_eq!(session.row_count(), 6000);
}

#[tokio::test(start_paused = true)]
async fn test_rows_keep_page_order() {
    let fetcher = ScriptedFetcher::new(vec![
        PageResult::new(200, "region,cases\na,1\nb,2\n"),
        PageResult::new(200, "region,cases\nc,3\nd,4\n"),
        PageResult::new(200, "region,cases\ne,5\nf,6\n"),
    ]);
    let orchestrator = ExportOrchestrator::new(fetcher).with_page_size(2);
    let session: ExportSession<CaseRow> = ExportSession::new(Arc::new(orchestrator));

    session
        .trigger("server://export-raw-data/", 5, QueryParams::new())
        .wait()
        .await
        .unwrap();

    let regions: Vec<String> = session.rows().into_iter().map(|r| r.region).collect();
    assert_eq!(regions, vec!["a", "b", "c", "d", "e", "f"]);
    assert_eq!(
        session.full_text(),
        "region,cases\na,1\nb,2\n,region,cases\nc,3\nd,4\n,region,cases\ne,5\nf,6\n"
    );
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_retries_same_offset_with_quadratic_wait() {
    let fetcher = ScriptedFetcher::new(vec![
        csv_page(0, 3000),
        PageResult::new(429, "slow down"),
        PageResult::new(429, "slow down"),
        PageResult::new(429, "slow down"),
        csv_page(3000, 500),
    ]);
    let session: ExportSession<CaseRow> = session(fetcher.clone());

    let outcome = session
        .trigger("server://export-raw-data/", 3500, QueryParams::new())
        .wait()
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(fetcher.offsets(), vec![0, 3000, 3000, 3000, 3000]);

    let calls = fetcher.calls.lock().unwrap();
    let waits: Vec<Duration> = calls.windows(2).map(|w| w[1].at - w[0].at).collect();
    assert_eq!(
        waits,
        vec![
            Duration::from_millis(0),
            Duration::from_millis(0),
            Duration::from_millis(1000),
            Duration::from_millis(4000),
        ]
    );
    assert_eq!(session.row_count(), 3500);
}

#[tokio::test(start_paused = true)]
async fn test_failure_after_two_pages_clears_session() {
    let fetcher = ScriptedFetcher::new(vec![
        csv_page(0, 3000),
        csv_page(3000, 3000),
        PageResult::new(500, "upstream database unavailable"),
    ]);
    let failures: Arc<Mutex<Vec<ExportFailure>>> = Arc::new(Mutex::new(Vec::new()));
    let recorded = failures.clone();
    let session: ExportSession<CaseRow> = session::<CaseRow>(fetcher.clone())
        .with_failure_handler(move |f| recorded.lock().unwrap().push(f.clone()));

    let outcome = session
        .trigger("server://export-raw-data/", 9000, QueryParams::new())
        .wait()
        .await
        .unwrap();

    assert!(matches!(outcome, ExportOutcome::Failed(_)));
    assert!(session.rows().is_empty());
    assert_eq!(session.full_text(), "");
    assert!(!session.pending());

    let failures = failures.lock().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].body, "upstream database unavailable");
    assert_eq!(failures[0].status, Some(500));
    assert_eq!(failures[0].offset, 6000);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_backoff() {
    let fetcher = ScriptedFetcher::new(vec![
        PageResult::new(429, ""),
        PageResult::new(429, ""),
        csv_page(0, 10),
    ]);
    let session: ExportSession<CaseRow> = session(fetcher.clone());

    let handle = session.trigger("server://export-raw-data/", 10, QueryParams::new());

    // Second 429 puts the run into a 1000ms backoff
    while fetcher.call_count() < 2 {
        tokio::task::yield_now().await;
    }
    session.cancel();

    assert!(!session.pending());
    assert!(session.rows().is_empty());
    assert_eq!(session.phase(), ExportPhase::Idle);

    let outcome = handle.wait().await.unwrap();
    assert!(matches!(outcome, ExportOutcome::Superseded));
    assert_eq!(fetcher.call_count(), 2);
    assert_eq!(session.retry_budget(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_undercounted_total_truncates() {
    let fetcher = ScriptedFetcher::new(vec![csv_page(0, 3000), csv_page(3000, 3000)]);
    let session: ExportSession<CaseRow> = session(fetcher.clone());

    let outcome = session
        .trigger("server://export-raw-data/", 100, QueryParams::new())
        .wait()
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(fetcher.call_count(), 1);
    assert_eq!(session.row_count(), 3000);
}

#[tokio::test(start_paused = true)]
async fn test_overcounted_total_stops_on_empty_page() {
    let fetcher = ScriptedFetcher::new(vec![csv_page(0, 3000), csv_page(3000, 0)]);
    let session: ExportSession<CaseRow> = session(fetcher.clone());

    let outcome = session
        .trigger("server://export-raw-data/", 1_000_000, QueryParams::new())
        .wait()
        .await
        .unwrap();

    let summary = outcome.summary().unwrap();
    assert!(!summary.is_complete());
    assert_eq!(fetcher.call_count(), 2);
    assert!((session.progress() - 0.003).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_session_can_be_reused() {
    let fetcher = ScriptedFetcher::new(vec![
        PageResult::new(404, "no such dataset"),
        csv_page(0, 5),
    ]);
    let session: ExportSession<CaseRow> = session(fetcher.clone());

    let first = session
        .trigger("server://missing/", 5, QueryParams::new())
        .wait()
        .await
        .unwrap();
    assert!(matches!(first, ExportOutcome::Failed(_)));

    let second = session
        .trigger("server://export-raw-data/", 5, QueryParams::new())
        .wait()
        .await
        .unwrap();
    assert!(second.is_success());
    assert_eq!(session.row_count(), 5);
    assert_eq!(session.total(), 5);
}
