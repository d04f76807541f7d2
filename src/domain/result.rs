//! Result type alias for the report engine
//!
//! This module provides a convenient Result type alias that uses AssayError
//! as the error type.

use super::errors::AssayError;

/// Result type alias for report engine operations
///
/// This is a convenience type alias that uses `AssayError` as the error type.
/// Use this throughout the codebase for fallible operations.
///
/// # Examples
///
/// ```
/// use assay::domain::result::Result;
/// use assay::domain::errors::AssayError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(AssayError::TemplateNotFound("CBC".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, AssayError>;
