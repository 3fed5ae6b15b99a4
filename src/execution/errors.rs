//! Execution errors and their client-visible categories

use thiserror::Error;

use crate::query::QueryError;

/// Result type for execution operations
pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Client-visible response category for an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller error, never retried
    BadRequest,
    /// The referenced execution or table does not exist
    NotFound,
    /// Backend concurrency limit; retryable by the caller
    RateLimited,
    /// Everything else; reported without backend internals
    Internal,
}

/// Errors raised by the execution adapters
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// Query composition rejected the request before submission
    #[error(transparent)]
    Validation(#[from] QueryError),

    /// No execution known under this id
    #[error("Unknown execution: {0}")]
    ExecutionNotFound(String),

    /// The materialized table does not exist (expired or never
    /// created); terminal and user-visible
    #[error("Table not found: {0}")]
    TableMissing(String),

    /// The statement has not reached a terminal state, so its result
    /// table cannot be read yet; the caller should keep polling
    #[error("Execution {0} has not materialized its result table yet")]
    NotYetMaterialized(String),

    /// Report declares no summary under this id
    #[error("No summary '{summary}' in report '{report}'")]
    SummaryNotFound { report: String, summary: String },

    /// Backend reported a status outside its documented vocabulary
    #[error("Unknown {backend} status '{value}'")]
    UnknownNativeStatus {
        backend: &'static str,
        value: String,
    },

    /// Backend rejected the submission because too many statements are
    /// active; the caller may retry, this layer never does
    #[error("Active statement limit exceeded: {0}")]
    ConcurrencyLimit(String),

    /// Transport-level backend failure
    #[error("Backend error: {0}")]
    Backend(String),
}

impl ExecutionError {
    /// Map to the client-visible response category
    pub fn category(&self) -> ErrorCategory {
        match self {
            ExecutionError::Validation(_) | ExecutionError::NotYetMaterialized(_) => {
                ErrorCategory::BadRequest
            }
            ExecutionError::ExecutionNotFound(_)
            | ExecutionError::TableMissing(_)
            | ExecutionError::SummaryNotFound { .. } => ErrorCategory::NotFound,
            ExecutionError::ConcurrencyLimit(_) => ErrorCategory::RateLimited,
            ExecutionError::UnknownNativeStatus { .. } | ExecutionError::Backend(_) => {
                ErrorCategory::Internal
            }
        }
    }

    /// Returns true when the caller may usefully retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExecutionError::ConcurrencyLimit(_))
    }
}
