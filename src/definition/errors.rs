//! Definition document errors
//!
//! All raised at load time, never during request handling.

use thiserror::Error;

use crate::policy::PolicyError;

/// Result type for definition operations
pub type DefinitionResult<T> = Result<T, DefinitionError>;

/// Errors raised while validating a report definition document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// Field or summary name is not a safe SQL identifier
    #[error("Report '{report}' declares unsafe identifier '{identifier}'")]
    UnsafeIdentifier { report: String, identifier: String },

    /// More than one field flagged as the default sort
    #[error("Report '{0}' declares multiple default sort fields")]
    MultipleDefaultSorts(String),

    /// Default sort field is not sortable
    #[error("Report '{report}' default sort field '{field}' is not sortable")]
    DefaultSortNotSortable { report: String, field: String },

    /// Summary query is missing its `${tableId}` substitution token
    #[error("Summary '{summary}' in report '{report}' has no ${{tableId}} token")]
    SummaryMissingTableToken { report: String, summary: String },

    /// Embedded policy document failed validation
    #[error("Report '{report}': {source}")]
    InvalidPolicy {
        report: String,
        #[source]
        source: PolicyError,
    },
}
