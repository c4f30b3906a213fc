//! Configuration management for epiexport.
//!
//! epiexport uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `EPIEXPORT_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use epiexport::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("epiexport.toml")?;
//!
//! println!("Backend: {}", config.backend.endpoint);
//! println!("Page size: {}", config.export.page_size);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Application settings (log level)
//! - [`BackendConfig`] - Backend endpoint, URL prefix, timeout, TLS, token
//! - [`ExportConfig`] - Paging, throttle and backoff settings
//! - [`LoggingConfig`] - Logging configuration
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [backend]
//! endpoint = "https://api.example.org/"
//! url_prefix = "server://"
//! api_token = "${EPIEXPORT_API_TOKEN}"
//!
//! [export]
//! page_size = 3000
//! throttle_base_ms = 500
//! backoff_base_ms = 1000
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{ApplicationConfig, BackendConfig, EpiExportConfig, ExportConfig, LoggingConfig};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};
