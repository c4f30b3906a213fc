// epiexport - Paginated CSV export for the epidemiological dashboard backend
// Copyright (c) 2025 epiexport Contributors
// Licensed under the MIT License

//! # epiexport - paginated CSV export
//!
//! epiexport pulls a complete tabular dataset out of the epidemiological
//! dashboard backend, whose export endpoint only serves bounded pages of
//! comma-delimited text.
//!
//! ## Overview
//!
//! This library provides:
//! - **Fetching** pages of 3000 rows at increasing offsets
//! - **Accumulating** parsed rows and raw page text in arrival order
//! - **Pacing** requests with a throttle between pages and quadratic backoff on 429
//! - **Sessions** that can be triggered, observed and cancelled while a run is in flight
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Export pipeline and artifact writing
//! - [`adapters`] - Dashboard backend integration
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use epiexport::adapters::backend::HttpPageFetcher;
//! use epiexport::config::load_config;
//! use epiexport::core::export::{ExportOrchestrator, ExportOutcome, ExportSession};
//! use epiexport::domain::QueryParams;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("epiexport.toml")?;
//!
//!     let fetcher = Arc::new(HttpPageFetcher::new(&config.backend)?);
//!     let orchestrator = Arc::new(ExportOrchestrator::from_config(fetcher, &config.export));
//!     let session: ExportSession<Vec<String>> = ExportSession::new(orchestrator);
//!
//!     let params = QueryParams::new().with("iso3", "NPL").with("disease", "dengue");
//!     match session.trigger("server://export-raw-data/", 4000, params).wait().await? {
//!         ExportOutcome::Succeeded(summary) => println!("Exported {} rows", summary.rows),
//!         ExportOutcome::Failed(failure) => eprintln!("Export failed: {}", failure.body),
//!         ExportOutcome::Superseded => {}
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Pacing
//!
//! Each session carries a retry budget. A 429 response waits
//! `budget² × 1000 ms` and increments it; a successful page waits
//! `budget² × 500 ms` before the next request and decrements it. Both bases
//! are configurable.
//!
//! ## Error Handling
//!
//! Library calls return [`domain::Result`], built on [`domain::EpiError`].
//! A failed run is reported as [`core::export::ExportFailure`], both to the
//! session's failure handler and through [`core::export::ExportHandle::wait`].
//!
//! ## Logging
//!
//! epiexport uses structured logging with the `tracing` crate; every run is
//! wrapped in an `export` span carrying its `export_id`.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
