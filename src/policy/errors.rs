//! Policy document errors
//!
//! Malformed policy documents fail fast at load time. Evaluation
//! itself never errors for a validated document.

use thiserror::Error;

/// Result type for policy operations
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Errors raised while validating a policy document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// Condition declares neither `match` nor `exists`
    #[error("Policy '{0}' has a condition with no match or exists clause")]
    EmptyCondition(String),

    /// `exists` names an attribute outside the well-known set
    #[error("Policy '{policy}' references unknown attribute '{attribute}'")]
    UnknownAttribute { policy: String, attribute: String },

    /// `match` list too short to compare anything
    #[error("Policy '{0}' has a match list with fewer than two entries")]
    ShortMatchList(String),
}
