//! Core business logic for epiexport.
//!
//! # Modules
//!
//! - [`export`] - Paginated export pipeline: accumulation, pacing, orchestration, sessions
//! - [`artifact`] - Writing a finished export to disk
//!
//! # Export Workflow
//!
//! 1. **Trigger**: Reset the session and start a run for a URL, total and parameters
//! 2. **Fetch**: Request pages of 3000 rows at increasing offsets
//! 3. **Accumulate**: Parse each page and append its rows
//! 4. **Pace**: Throttle between pages; back off and retry on 429
//! 5. **Finish**: Keep the rows on success, clear the session on failure
//! 6. **Write**: Turn the rows into an artifact
//!
//! # Example
//!
//! ```rust,no_run
//! use epiexport::adapters::backend::HttpPageFetcher;
//! use epiexport::config::load_config;
//! use epiexport::core::export::{ExportOrchestrator, ExportSession};
//! use epiexport::domain::QueryParams;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("epiexport.toml")?;
//!
//! let fetcher = Arc::new(HttpPageFetcher::new(&config.backend)?);
//! let orchestrator = Arc::new(ExportOrchestrator::from_config(fetcher, &config.export));
//! let session: ExportSession<Vec<String>> = ExportSession::new(orchestrator);
//!
//! let outcome = session
//!     .trigger("server://export-raw-data/", 4000, QueryParams::new().with("iso3", "NPL"))
//!     .wait()
//!     .await?;
//!
//! println!("Succeeded: {}", outcome.is_success());
//! println!("Rows: {}", session.row_count());
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod export;
