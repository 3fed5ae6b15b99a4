//! Filter kinds and descriptors
//!
//! A `FilterType` is what a report definition declares for a field; a
//! `FilterKind` is the per-request resolved form, where range-typed
//! declarations split into paired start/end kinds.

use serde::{Deserialize, Serialize};

/// Filter type as declared in a report definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    /// Case-insensitive equality
    Standard,
    /// Paired lower/upper bound over a textual or numeric field
    Range,
    /// Paired inclusive date bounds
    DateRange,
    /// Prefix match backing typeahead inputs
    Dynamic,
    /// Boolean equality
    Boolean,
}

/// Resolved filter kind carried by a single request filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Standard,
    RangeStart,
    RangeEnd,
    DateRangeStart,
    DateRangeEnd,
    Dynamic,
    Boolean,
}

impl FilterKind {
    /// Key suffix pairing a field's two range filters
    pub fn suffix(&self) -> &'static str {
        match self {
            FilterKind::RangeStart | FilterKind::DateRangeStart => ".start",
            FilterKind::RangeEnd | FilterKind::DateRangeEnd => ".end",
            _ => "",
        }
    }

    /// Returns true for the four range-typed kinds
    pub fn is_range(&self) -> bool {
        !self.suffix().is_empty()
    }

    /// Returns true for kinds whose textual values compare
    /// case-insensitively
    pub fn is_case_insensitive(&self) -> bool {
        matches!(
            self,
            FilterKind::Standard | FilterKind::RangeStart | FilterKind::RangeEnd
        )
    }
}

/// Declared filter for a report field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterDefinition {
    /// Declared filter type
    #[serde(rename = "type")]
    pub filter_type: FilterType,

    /// Permitted values, when the filter is backed by a fixed option
    /// list (empty = unconstrained)
    #[serde(default)]
    pub static_options: Vec<String>,

    /// Value applied when the caller supplies none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl FilterDefinition {
    /// Declare an unconstrained filter of the given type
    pub fn new(filter_type: FilterType) -> Self {
        Self {
            filter_type,
            static_options: Vec::new(),
            default_value: None,
        }
    }

    /// Restrict the filter to a fixed option list
    pub fn with_static_options(mut self, options: Vec<String>) -> Self {
        self.static_options = options;
        self
    }

    /// Returns true if the value matches a static option
    /// (case-insensitive); unconstrained filters accept everything
    pub fn accepts(&self, value: &str) -> bool {
        self.static_options.is_empty()
            || self
                .static_options
                .iter()
                .any(|o| o.eq_ignore_ascii_case(value))
    }
}

/// A single validated request filter
///
/// Immutable; constructed per request and discarded after one query
/// build. The effective SQL predicate is fully determined by
/// `(field, value, kind)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Dataset field the predicate applies to
    pub field: String,
    /// Raw validated value
    pub value: String,
    /// Resolved kind
    pub kind: FilterKind,
}

impl Filter {
    /// Create a filter
    pub fn new(field: impl Into<String>, value: impl Into<String>, kind: FilterKind) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            kind,
        }
    }

    /// Unique named-parameter key: lower-cased field plus suffix, with
    /// the dot flattened so the key stays a bare identifier
    pub fn key(&self) -> String {
        format!("{}{}", self.field, self.kind.suffix())
            .to_lowercase()
            .replace('.', "_")
    }
}
