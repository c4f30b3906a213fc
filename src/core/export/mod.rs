//! Paginated export pipeline
//!
//! This module provides the export logic for epiexport:
//! - Page parsing and row accumulation
//! - Throttle and rate-limit backoff delays
//! - Run orchestration and session lifecycle
//! - Summary and failure reporting

pub mod accumulator;
pub mod orchestrator;
pub mod pacing;
pub mod session;
pub mod summary;

pub use accumulator::{parse_page, ParsedPage, ResultAccumulator};
pub use orchestrator::{ExportOrchestrator, ExportPhase, FailureHandler};
pub use pacing::PacingPolicy;
pub use session::{ExportHandle, ExportSession, SessionSnapshot};
pub use summary::{ExportFailure, ExportOutcome, ExportSummary, FailureKind};
