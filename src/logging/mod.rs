//! Logging and observability
//!
//! Structured logging with `tracing`: console output (plain or JSON),
//! optional rotated JSON log files, and a few macros for the events the
//! export pipeline emits repeatedly.
//!
//! # Example
//!
//! ```no_run
//! use epiexport::logging::init_logging;
//! use epiexport::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of an export run
///
/// # Example
///
/// ```no_run
/// use epiexport::log_export_start;
///
/// log_export_start!("server://export-raw-data/", 4000u64);
/// ```
#[macro_export]
macro_rules! log_export_start {
    ($url:expr, $total:expr) => {
        tracing::info!(url = %$url, total = $total, "Starting export");
    };
}

/// Log page progress against the expected total
///
/// # Example
///
/// ```no_run
/// use epiexport::log_page_progress;
///
/// log_page_progress!(3000u64, 3000usize, 4000u64);
/// ```
#[macro_export]
macro_rules! log_page_progress {
    ($offset:expr, $rows:expr, $total:expr) => {
        tracing::debug!(
            offset = $offset,
            rows = $rows,
            total = $total,
            progress_pct = if $total == 0 {
                100.0
            } else {
                $rows as f64 / $total as f64 * 100.0
            },
            "Page ingested"
        );
    };
}

/// Log a rate-limited retry
///
/// # Example
///
/// ```no_run
/// use epiexport::log_rate_limited;
///
/// log_rate_limited!(3000u64, 2u32, 4000u64);
/// ```
#[macro_export]
macro_rules! log_rate_limited {
    ($offset:expr, $retry_budget:expr, $delay_ms:expr) => {
        tracing::warn!(
            offset = $offset,
            retry_budget = $retry_budget,
            delay_ms = $delay_ms,
            "Rate limited, retrying page"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use epiexport::log_error_with_context;
/// use epiexport::domain::EpiError;
///
/// let error = EpiError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(error = %$error, context = $context, "Error occurred");
    };
}
