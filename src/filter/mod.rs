//! # Filter Model
//!
//! Typed predicate descriptors for report filters and their SQL
//! fragment generation.
//!
//! Raw filter input arrives as `field | field.start | field.end`
//! key/value pairs. Parsing validates every key and value against the
//! report's declared filters before any SQL is composed; a range-typed
//! key without its suffix never reaches the condition builder.

pub mod condition;
pub mod errors;
pub mod types;

pub use condition::parse_filters;
pub use errors::{FilterError, FilterResult};
pub use types::{Filter, FilterDefinition, FilterKind, FilterType};
