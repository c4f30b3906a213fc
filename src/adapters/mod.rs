//! External integrations.
//!
//! - [`backend`] - The dashboard backend's paginated CSV export endpoint
//!
//! The export pipeline only depends on the [`backend::PageFetcher`] trait, so
//! other transports (or test doubles) can be plugged in:
//!
//! ```rust,no_run
//! use epiexport::adapters::backend::{HttpPageFetcher, PageFetcher};
//! use epiexport::config::BackendConfig;
//! use std::sync::Arc;
//!
//! # fn example() -> epiexport::domain::Result<()> {
//! let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpPageFetcher::new(&BackendConfig::default())?);
//! # Ok(())
//! # }
//! ```

pub mod backend;
