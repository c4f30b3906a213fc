//! Configuration schema types
//!
//! This module defines the configuration structure for epiexport.

use crate::config::SecretString;
use crate::domain::PAGE_SIZE;
use serde::{Deserialize, Serialize};

/// Main epiexport configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpiExportConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Dashboard backend connection
    pub backend: BackendConfig,

    /// Export pipeline settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EpiExportConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.backend.validate()?;
        self.export.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Dashboard backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Endpoint that `url_prefix` URLs are resolved against
    ///
    /// The remainder of the logical URL is appended verbatim, so this usually
    /// ends with a slash.
    pub endpoint: String,

    /// Reserved prefix marking backend-relative URLs
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// TLS certificate verification enabled
    #[serde(default = "default_true")]
    pub tls_verify: bool,

    /// Optional bearer token sent with every page request
    #[serde(default)]
    pub api_token: Option<SecretString>,
}

impl BackendConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        if self.endpoint.is_empty() {
            return Err("backend.endpoint cannot be empty".to_string());
        }

        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err("backend.endpoint must start with http:// or https://".to_string());
        }

        if url::Url::parse(&self.endpoint).is_err() {
            return Err(format!("backend.endpoint '{}' is not a valid URL", self.endpoint));
        }

        if self.url_prefix.is_empty() {
            return Err("backend.url_prefix cannot be empty".to_string());
        }

        if self.url_prefix.starts_with("http://") || self.url_prefix.starts_with("https://") {
            return Err("backend.url_prefix cannot be an http(s) scheme".to_string());
        }

        if self.timeout_seconds == 0 {
            return Err("backend.timeout_seconds must be > 0".to_string());
        }

        if let Some(token) = &self.api_token {
            if token.expose_secret().is_empty() {
                return Err("backend.api_token cannot be blank when set".to_string());
            }
        }

        Ok(())
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000/".to_string(),
            url_prefix: default_url_prefix(),
            timeout_seconds: default_timeout_seconds(),
            tls_verify: true,
            api_token: None,
        }
    }
}

/// Export pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Rows per page request
    #[serde(default = "default_page_size")]
    pub page_size: u64,

    /// Base of the delay between successful pages, multiplied by the
    /// squared retry budget
    #[serde(default = "default_throttle_base_ms")]
    pub throttle_base_ms: u64,

    /// Base of the delay before retrying a rate-limited page, multiplied by
    /// the squared retry budget
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Give up after this many consecutive 429 responses (unset = never)
    #[serde(default)]
    pub max_rate_limit_retries: Option<u32>,

    /// Stop when a successful page carries no data rows
    #[serde(default = "default_true")]
    pub stop_on_empty_page: bool,

    /// Directory the CLI writes artifacts to when no output path is given
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.page_size == 0 {
            return Err("export.page_size must be > 0".to_string());
        }

        if self.page_size > 50_000 {
            return Err(format!(
                "export.page_size must be <= 50000, got {}",
                self.page_size
            ));
        }

        if self.output_dir.is_empty() {
            return Err("export.output_dir cannot be empty".to_string());
        }

        Ok(())
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            throttle_base_ms: default_throttle_base_ms(),
            backoff_base_ms: default_backoff_base_ms(),
            max_rate_limit_retries: None,
            stop_on_empty_page: true,
            output_dir: default_output_dir(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,

    /// Emit console logs as JSON
    #[serde(default)]
    pub json_console: bool,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.is_empty() {
            return Err("logging.local_path cannot be empty when local_enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
            json_console: false,
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_url_prefix() -> String {
    "server://".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_page_size() -> u64 {
    PAGE_SIZE
}

fn default_throttle_base_ms() -> u64 {
    500
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_output_dir() -> String {
    ".".to_string()
}

fn default_local_path() -> String {
    "/var/log/epiexport".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config() -> EpiExportConfig {
        toml::from_str(
            r#"
[backend]
endpoint = "https://api.example.org/"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config = minimal_config();

        assert_eq!(config.application.log_level, "info");
        assert_eq!(config.backend.url_prefix, "server://");
        assert_eq!(config.backend.timeout_seconds, 60);
        assert!(config.backend.tls_verify);
        assert_eq!(config.export.page_size, 3000);
        assert_eq!(config.export.throttle_base_ms, 500);
        assert_eq!(config.export.backoff_base_ms, 1000);
        assert_eq!(config.export.max_rate_limit_retries, None);
        assert!(config.export.stop_on_empty_page);
        assert!(!config.logging.local_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = minimal_config();
        config.application.log_level = "verbose".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.contains("Invalid log_level"));
    }

    #[test]
    fn test_endpoint_must_be_http() {
        let mut config = minimal_config();
        config.backend.endpoint = "ftp://api.example.org/".to_string();
        assert!(config.validate().is_err());

        config.backend.endpoint = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_prefix_cannot_be_http() {
        let mut config = minimal_config();
        config.backend.url_prefix = "https://".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_api_token_rejected() {
        let mut config = minimal_config();
        config.backend.api_token = Some(crate::config::secret_string(" ".to_string()));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_page_size_bounds() {
        let mut config = minimal_config();
        config.export.page_size = 0;
        assert!(config.validate().is_err());

        config.export.page_size = 100_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_rotation() {
        let mut config = minimal_config();
        config.logging.local_rotation = "weekly".to_string();
        assert!(config.validate().is_err());
    }
}
