//! Result type alias for epiexport

use super::errors::EpiError;

/// Result type alias for epiexport operations
///
/// # Examples
///
/// ```
/// use epiexport::domain::result::Result;
/// use epiexport::domain::errors::EpiError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(EpiError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, EpiError>;
