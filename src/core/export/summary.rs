//! Export summary and reporting
//!
//! This module defines what a finished export run reports back: a summary on
//! success, a failure record otherwise.

use crate::domain::{BackendError, EpiError};
use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

/// Summary of a successful export run
#[derive(Debug, Clone)]
pub struct ExportSummary {
    /// Identifier of the run, also attached to its log events
    pub export_id: Uuid,

    /// Logical URL that was exported
    pub url: String,

    /// Expected total the run was triggered with
    pub total: u64,

    /// Rows held by the session when the run finished
    pub rows: usize,

    /// Successful page responses
    pub pages_fetched: u32,

    /// 429 responses that were retried
    pub rate_limit_retries: u32,

    /// Wall-clock start of the run
    pub started_at: DateTime<Utc>,

    /// Duration of the run, delays included
    pub duration: Duration,
}

impl ExportSummary {
    /// Create a new empty summary for a run
    pub fn new(export_id: Uuid, url: impl Into<String>, total: u64) -> Self {
        Self {
            export_id,
            url: url.into(),
            total,
            rows: 0,
            pages_fetched: 0,
            rate_limit_retries: 0,
            started_at: Utc::now(),
            duration: Duration::from_secs(0),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Whether at least `total` rows were collected
    pub fn is_complete(&self) -> bool {
        self.rows as u64 >= self.total
    }

    /// Collected rows as a percentage of the expected total
    pub fn completion_rate(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.rows as f64 / self.total as f64) * 100.0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            export_id = %self.export_id,
            url = %self.url,
            total = self.total,
            rows = self.rows,
            pages = self.pages_fetched,
            rate_limit_retries = self.rate_limit_retries,
            duration_ms = self.duration.as_millis() as u64,
            completion = format!("{:.2}%", self.completion_rate()),
            "Export completed"
        );

        if !self.is_complete() {
            tracing::warn!(
                export_id = %self.export_id,
                expected = self.total,
                received = self.rows,
                "Export returned fewer rows than expected"
            );
        }
    }
}

/// Why a run failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Non-2xx, non-429 response
    Http,
    /// 429 responses exceeded the configured retry ceiling
    RateLimitExhausted,
    /// No HTTP response (connect, DNS, timeout, body read)
    Transport,
    /// A 2xx page could not be parsed into rows
    Parse,
}

/// Terminal failure of an export run
///
/// This is what the session's failure handler receives. `body` is the
/// response body for HTTP failures and the error message otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFailure {
    /// Kind of failure
    pub kind: FailureKind,

    /// Offset of the page that failed
    pub offset: u64,

    /// HTTP status, when a response was received
    pub status: Option<u16>,

    /// Response body or error message
    pub body: String,
}

impl ExportFailure {
    /// Failure from a terminal HTTP status
    pub fn http(offset: u64, status: u16, body: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Http,
            offset,
            status: Some(status),
            body: body.into(),
        }
    }

    /// Failure after too many consecutive 429 responses
    pub fn rate_limit_exhausted(offset: u64, retries: u32, body: impl Into<String>) -> Self {
        let body = body.into();
        let body = if body.is_empty() {
            BackendError::RateLimited { retries }.to_string()
        } else {
            body
        };
        Self {
            kind: FailureKind::RateLimitExhausted,
            offset,
            status: Some(429),
            body,
        }
    }

    /// Failure without an HTTP response
    pub fn transport(offset: u64, error: &EpiError) -> Self {
        Self {
            kind: FailureKind::Transport,
            offset,
            status: None,
            body: error.to_string(),
        }
    }

    /// Failure to parse a 2xx page
    pub fn parse(offset: u64, status: u16, error: &EpiError) -> Self {
        Self {
            kind: FailureKind::Parse,
            offset,
            status: Some(status),
            body: error.to_string(),
        }
    }

    /// Convert into the crate error type
    pub fn into_error(self) -> EpiError {
        match (self.kind, self.status) {
            (FailureKind::Http, Some(status)) => {
                EpiError::Backend(BackendError::from_status(status, self.body))
            }
            (FailureKind::RateLimitExhausted, _) => EpiError::Export(format!(
                "Rate limited at offset {}: {}",
                self.offset, self.body
            )),
            (FailureKind::Parse, _) => EpiError::Parse(self.body),
            _ => EpiError::Backend(BackendError::ConnectionFailed(self.body)),
        }
    }

    /// Log the failure
    pub fn log_failure(&self) {
        tracing::error!(
            kind = ?self.kind,
            offset = self.offset,
            status = ?self.status,
            body = %self.body,
            "Export failed"
        );
    }
}

/// How an export run ended
#[derive(Debug, Clone)]
pub enum ExportOutcome {
    /// All pages fetched; rows and text stay on the session
    Succeeded(ExportSummary),

    /// Terminal failure; the session was cleared
    Failed(ExportFailure),

    /// A later trigger or a cancel took over the session
    Superseded,
}

impl ExportOutcome {
    /// Whether the run succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, ExportOutcome::Succeeded(_))
    }

    /// Summary of a successful run
    pub fn summary(&self) -> Option<&ExportSummary> {
        match self {
            ExportOutcome::Succeeded(summary) => Some(summary),
            _ => None,
        }
    }

    /// Failure of a failed run
    pub fn failure(&self) -> Option<&ExportFailure> {
        match self {
            ExportOutcome::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}
