//! Query composition errors
//!
//! All validation errors raised before any backend call.

use thiserror::Error;

/// Result type for query composition
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors raised while composing a report query
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Sort column is not a field of the report
    #[error("Invalid sort column: {0}")]
    InvalidSortColumn(String),

    /// Sort column exists but is not declared sortable
    #[error("Column '{0}' is not sortable")]
    UnsortableColumn(String),

    /// Dynamic field is not a field of the report
    #[error("Invalid dynamic field: {0}")]
    InvalidDynamicField(String),

    /// Page numbers are 1-based
    #[error("Page must be >= 1")]
    InvalidPage,

    /// Page size must hold at least one row
    #[error("Page size must be >= 1")]
    InvalidPageSize,

    /// Prompt name is not a safe SQL identifier
    #[error("Invalid prompt name: {0}")]
    InvalidPromptName(String),
}
