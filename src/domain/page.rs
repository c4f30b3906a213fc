//! Export request and page types
//!
//! An [`ExportRequest`] is what the caller triggers; the orchestrator derives
//! one [`PageRequest`] per attempt from it and gets a [`PageResult`] back from
//! the fetcher.

use super::params::QueryParams;
use serde::{Deserialize, Serialize};

/// Rows requested per page
pub const PAGE_SIZE: u64 = 3000;

/// Immutable input of one export trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRequest {
    /// Logical resource path, either `server://…` or an absolute URL
    pub url: String,

    /// Expected total row count, from a prior metadata query
    pub total: u64,

    /// Caller query parameters
    #[serde(default)]
    pub params: QueryParams,
}

impl ExportRequest {
    /// Creates a new export request
    pub fn new(url: impl Into<String>, total: u64, params: QueryParams) -> Self {
        Self {
            url: url.into(),
            total,
            params,
        }
    }

    /// Caller params merged with the page window
    ///
    /// `offset` and `limit` follow the caller's parameters. A caller-supplied
    /// `offset` or `limit` is overwritten in place.
    pub fn page_params(&self, page: &PageRequest) -> QueryParams {
        let mut params = self.params.clone();
        params.insert("offset", page.offset);
        params.insert("limit", page.limit);
        params
    }
}

/// One page window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Row offset, a multiple of `limit`
    pub offset: u64,

    /// Page size
    pub limit: u64,
}

impl PageRequest {
    /// Creates a page window
    pub fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// The window following this one
    pub fn next(&self) -> Self {
        Self {
            offset: self.offset + self.limit,
            limit: self.limit,
        }
    }

    /// Whether another page should be requested after this one
    ///
    /// Mirrors the backend contract: continue while `offset + limit <= total`.
    /// When `total` is an exact multiple of `limit` this requests one page
    /// past the last full one, which comes back empty.
    pub fn has_more(&self, total: u64) -> bool {
        self.offset + self.limit <= total
    }
}

/// Outcome of one HTTP call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    /// HTTP status code
    pub status: u16,

    /// Response body as text, captured for every status
    pub body: String,
}

impl PageResult {
    /// Creates a page result
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 2xx status
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// 429 status
    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }
}
