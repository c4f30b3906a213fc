//! URL resolution and query-string construction for export requests

use crate::domain::QueryParams;

/// Resolves logical backend URLs to absolute endpoints
///
/// A URL starting with the reserved prefix is rewritten to
/// `<endpoint><remainder>`. Absolute `http://` and `https://` URLs pass
/// through. Anything else is logged and returned unchanged; the request that
/// follows fails on its own.
///
/// # Example
///
/// ```
/// use epiexport::adapters::backend::UrlResolver;
///
/// let resolver = UrlResolver::new("https://api.example.org/", "server://");
/// assert_eq!(
///     resolver.resolve("server://export-raw-data/"),
///     "https://api.example.org/export-raw-data/"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct UrlResolver {
    endpoint: String,
    prefix: String,
}

impl UrlResolver {
    /// Creates a resolver for the given endpoint and prefix
    pub fn new(endpoint: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            prefix: prefix.into(),
        }
    }

    /// Resolves a logical URL
    pub fn resolve(&self, url: &str) -> String {
        if let Some(rest) = url.strip_prefix(self.prefix.as_str()) {
            return format!("{}{}", self.endpoint, rest);
        }

        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }

        tracing::error!(
            url = %url,
            prefix = %self.prefix,
            "URL is neither backend-relative nor absolute, using it unchanged"
        );
        url.to_string()
    }

    /// Configured endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Serializes parameters into a query string
///
/// Null entries are dropped, lists are comma-joined, numbers and booleans
/// are stringified, and keys and values are percent-encoded. Output order is
/// the parameters' insertion order.
///
/// # Example
///
/// ```
/// use epiexport::adapters::backend::serialize_query;
/// use epiexport::domain::{QueryParams, QueryValue};
///
/// let params = QueryParams::new()
///     .with("a", 1)
///     .with("b", vec!["x", "y"])
///     .with("c", QueryValue::Null)
///     .with("e", true);
/// assert_eq!(serialize_query(&params), "a=1&b=x%2Cy&e=true");
/// ```
pub fn serialize_query(params: &QueryParams) -> String {
    params
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(&value.to_string())
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Appends a query string to a URL
pub fn with_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        url.to_string()
    } else if url.contains('?') {
        format!("{url}&{query}")
    } else {
        format!("{url}?{query}")
    }
}
