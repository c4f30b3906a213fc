//! Domain error types
//!
//! This module defines the error hierarchy for epiexport. Errors are
//! domain-specific and don't expose third-party types such as `reqwest::Error`
//! or `csv::Error` to callers.

use thiserror::Error;

/// Main epiexport error type
///
/// This is the primary error type used throughout the library.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum EpiError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Errors talking to the dashboard backend
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// A page payload could not be parsed into rows
    #[error("Parse error: {0}")]
    Parse(String),

    /// Export process errors
    #[error("Export error: {0}")]
    Export(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Backend-specific errors
///
/// Errors that occur when fetching export pages from the dashboard backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Failed to connect to the backend (DNS, TLS, refused, reset)
    #[error("Failed to connect to backend: {0}")]
    ConnectionFailed(String),

    /// Request timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// The request URL could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Rate limit exceeded (429) and the configured retry ceiling was reached
    #[error("Rate limit exceeded after {retries} retries")]
    RateLimited { retries: u32 },

    /// Server error (5xx)
    #[error("Server error: {status} - {body}")]
    ServerError { status: u16, body: String },

    /// Client error (4xx other than 429)
    #[error("Client error: {status} - {body}")]
    ClientError { status: u16, body: String },
}

impl BackendError {
    /// Classify a terminal (non-2xx, non-429) HTTP status with its body
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        if status >= 500 {
            BackendError::ServerError { status, body }
        } else {
            BackendError::ClientError { status, body }
        }
    }

    /// HTTP status attached to this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::ServerError { status, .. } | BackendError::ClientError { status, .. } => {
                Some(*status)
            }
            BackendError::RateLimited { .. } => Some(429),
            _ => None,
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for EpiError {
    fn from(err: std::io::Error) -> Self {
        EpiError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for EpiError {
    fn from(err: serde_json::Error) -> Self {
        EpiError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for EpiError {
    fn from(err: toml::de::Error) -> Self {
        EpiError::Configuration(format!("TOML parse error: {err}"))
    }
}

// Conversion from csv errors; reading a page is the only place csv is used
impl From<csv::Error> for EpiError {
    fn from(err: csv::Error) -> Self {
        EpiError::Parse(err.to_string())
    }
}
