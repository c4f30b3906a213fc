//! Dashboard backend adapter
//!
//! URL resolution, query-string construction and the HTTP page fetcher for
//! the paginated CSV export endpoint.

pub mod fetcher;
pub mod urls;

pub use fetcher::{HttpPageFetcher, PageFetcher, CSV_CONTENT_TYPE};
pub use urls::{serialize_query, with_query, UrlResolver};
