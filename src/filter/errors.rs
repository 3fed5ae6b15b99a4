//! Filter validation errors
//!
//! All of these are caller errors raised before any backend call.

use thiserror::Error;

/// Result type for filter operations
pub type FilterResult<T> = Result<T, FilterError>;

/// Errors raised while parsing and validating report filters
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// Filter key does not match any declared filter
    #[error("Invalid filter: {0}")]
    UnknownFilter(String),

    /// Range-typed filter key is missing its .start/.end suffix
    #[error("Range filter '{0}' requires a .start or .end suffix")]
    MissingRangeSuffix(String),

    /// Suffix supplied for a filter that does not take one
    #[error("Filter '{0}' does not accept a range suffix")]
    UnexpectedRangeSuffix(String),

    /// Filter value is empty
    #[error("Filter '{0}' has an empty value")]
    EmptyValue(String),

    /// Value is not among the filter's declared static options
    #[error("Invalid value '{value}' for filter '{field}'")]
    InvalidStaticOption { field: String, value: String },

    /// Boolean filter value is not true/false
    #[error("Invalid boolean value '{value}' for filter '{field}'")]
    InvalidBooleanValue { field: String, value: String },

    /// Date-range filter value is not an ISO date or timestamp
    #[error("Invalid date value '{value}' for filter '{field}'")]
    InvalidDateValue { field: String, value: String },

    /// Dynamic filter prefix contains characters outside the safe set
    #[error("Invalid characters in value '{value}' for filter '{field}'")]
    UnsafeDynamicValue { field: String, value: String },
}
