//! # Report Definitions
//!
//! Parsed report/dataset/policy definition documents, consumed as
//! already-loaded input (the repositories that fetch them are external
//! collaborators). Structural validation runs once at load time so a
//! malformed document can never fail at request time.

pub mod errors;
pub mod types;

pub use errors::{DefinitionError, DefinitionResult};
pub use types::{DatasetDefinition, FieldDefinition, ReportDefinition, SummaryDefinition};
