//! Domain models and types for epiexport.
//!
//! The domain layer provides:
//! - **Request types** ([`ExportRequest`], [`PageRequest`], [`PageResult`])
//! - **Query parameters** ([`QueryParams`], [`QueryValue`])
//! - **Error types** ([`EpiError`], [`BackendError`])
//! - **Result type alias** ([`Result`])
//!
//! # Example
//!
//! ```rust
//! use epiexport::domain::{ExportRequest, QueryParams};
//!
//! let request = ExportRequest::new(
//!     "server://export-raw-data/",
//!     4000,
//!     QueryParams::new().with("iso3", "NPL"),
//! );
//! assert_eq!(request.total, 4000);
//! ```

pub mod errors;
pub mod page;
pub mod params;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{BackendError, EpiError};
pub use page::{ExportRequest, PageRequest, PageResult, PAGE_SIZE};
pub use params::{QueryParams, QueryValue};
pub use result::Result;
