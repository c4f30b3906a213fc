//! Page fetcher for the paginated CSV export endpoint
//!
//! [`PageFetcher`] is the seam between the export pipeline and the network.
//! [`HttpPageFetcher`] is the reqwest implementation; tests plug in their own.

use super::urls::{serialize_query, with_query, UrlResolver};
use crate::config::{BackendConfig, SecretString};
use crate::domain::{BackendError, EpiError, PageResult, QueryParams, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder};
use secrecy::ExposeSecret;
use std::time::Duration;

/// Request content type sent with every page request
pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Performs one GET against the export endpoint
///
/// Implementations return the status and body for every HTTP response,
/// including 4xx and 5xx; only transport failures are errors. They never
/// retry; retrying is up to the orchestrator.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch one page
    ///
    /// # Arguments
    ///
    /// * `url` - Logical or absolute URL of the export resource
    /// * `params` - Query parameters, page window included
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::ConnectionFailed`] or [`BackendError::Timeout`]
    /// when no HTTP response was received.
    async fn fetch(&self, url: &str, params: &QueryParams) -> Result<PageResult>;
}

/// reqwest-backed [`PageFetcher`]
///
/// # Example
///
/// ```no_run
/// use epiexport::adapters::backend::{HttpPageFetcher, PageFetcher};
/// use epiexport::config::BackendConfig;
/// use epiexport::domain::QueryParams;
///
/// # async fn example() -> epiexport::domain::Result<()> {
/// let fetcher = HttpPageFetcher::new(&BackendConfig::default())?;
/// let page = fetcher
///     .fetch("server://export-raw-data/", &QueryParams::new().with("iso3", "NPL"))
///     .await?;
/// println!("{} -> {} bytes", page.status, page.body.len());
/// # Ok(())
/// # }
/// ```
pub struct HttpPageFetcher {
    client: Client,
    resolver: UrlResolver,
    api_token: Option<SecretString>,
}

impl HttpPageFetcher {
    /// Create a fetcher from backend configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let mut client_builder = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30));

        if !config.tls_verify {
            tracing::warn!("TLS certificate verification is disabled for the backend");
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder
            .build()
            .map_err(|e| EpiError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            resolver: UrlResolver::new(config.endpoint.clone(), config.url_prefix.clone()),
            api_token: config.api_token.clone(),
        })
    }

    /// Full request URL for a logical URL and its parameters
    pub fn request_url(&self, url: &str, params: &QueryParams) -> String {
        with_query(&self.resolver.resolve(url), &serialize_query(params))
    }

    /// Backend endpoint this fetcher resolves against
    pub fn endpoint(&self) -> &str {
        self.resolver.endpoint()
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str, params: &QueryParams) -> Result<PageResult> {
        let request_url = self.request_url(url, params);

        tracing::debug!(url = %request_url, "Fetching export page");

        let mut request = self
            .client
            .get(&request_url)
            .header(CONTENT_TYPE, CSV_CONTENT_TYPE);

        if let Some(token) = &self.api_token {
            let value: &str = token.expose_secret().as_ref();
            request = request.header(AUTHORIZATION, format!("Bearer {value}"));
        }

        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_transport_error)?;

        tracing::debug!(status, bytes = body.len(), "Export page received");

        Ok(PageResult::new(status, body))
    }
}

fn map_transport_error(err: reqwest::Error) -> EpiError {
    let backend = if err.is_timeout() {
        BackendError::Timeout(err.to_string())
    } else if err.is_builder() {
        BackendError::InvalidUrl(err.to_string())
    } else {
        BackendError::ConnectionFailed(err.to_string())
    };
    EpiError::Backend(backend)
}
