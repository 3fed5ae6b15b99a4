//! SQL predicate generation and raw filter parsing
//!
//! Every kind maps to one fragment shape. Named-parameter mode emits
//! `:key` placeholders for the synchronous path; literal mode inlines
//! escaped literals for backend-generated async SQL. Dynamic filters
//! are always inlined (they back typeahead prefix matches), which is
//! why their values are charset-restricted at parse time.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;

use super::errors::{FilterError, FilterResult};
use super::types::{Filter, FilterDefinition, FilterKind, FilterType};

/// Safe character set for inlined dynamic prefixes: no quotes, no
/// wildcards, no statement separators
fn dynamic_value_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9 ,._-]+$").expect("valid pattern"))
}

/// Escape a string for inlining as a single-quoted SQL literal
pub fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

impl Filter {
    /// Value bound to this filter's named parameter
    ///
    /// Textual values for case-insensitive kinds are lowercased so the
    /// `lower(field)` fragments compare like-for-like. Boolean values
    /// bind as booleans; everything else binds as a string.
    pub fn bind_value(&self) -> Value {
        match self.kind {
            FilterKind::Boolean => Value::Bool(self.value.eq_ignore_ascii_case("true")),
            kind if kind.is_case_insensitive() => Value::String(self.value.to_lowercase()),
            _ => Value::String(self.value.clone()),
        }
    }

    /// Build the named-parameter SQL fragment for this filter
    ///
    /// `key_transform` lets a backend rename parameter keys, e.g. when
    /// merging filter parameters with prompt/context variables.
    pub fn build_condition(&self, key_transform: Option<&dyn Fn(&str) -> String>) -> String {
        let key = match key_transform {
            Some(transform) => transform(&self.key()),
            None => self.key(),
        };
        match self.kind {
            FilterKind::Standard => format!("lower({}) = :{}", self.field, key),
            FilterKind::RangeStart => format!("lower({}) >= :{}", self.field, key),
            FilterKind::RangeEnd => format!("lower({}) <= :{}", self.field, key),
            FilterKind::DateRangeStart => {
                format!("{} >= CAST(:{} AS timestamp)", self.field, key)
            }
            FilterKind::DateRangeEnd => {
                // End-inclusive by adding one day, avoiding
                // time-of-day truncation on the boundary date.
                format!(
                    "{} < CAST(:{} AS timestamp) + INTERVAL '1 day'",
                    self.field, key
                )
            }
            FilterKind::Dynamic => {
                format!("{} ILIKE '{}%'", self.field, escape_literal(&self.value))
            }
            FilterKind::Boolean => format!("{} = :{}", self.field, key),
        }
    }

    /// Build the fragment with the bound value inlined as a literal
    pub fn build_literal_condition(&self) -> String {
        let rendered = match self.bind_value() {
            Value::Bool(b) => b.to_string(),
            Value::String(s) => format!("'{}'", escape_literal(&s)),
            other => other.to_string(),
        };
        let fragment = self.build_condition(None);
        fragment.replace(&format!(":{}", self.key()), &rendered)
    }
}

/// Parse and validate raw `field | field.start | field.end` key/value
/// pairs against a report's declared filters
///
/// Returns validated filters in key order. Every rejection here is a
/// caller error raised before query composition.
pub fn parse_filters(
    raw: &BTreeMap<String, String>,
    declared: &BTreeMap<String, FilterDefinition>,
) -> FilterResult<Vec<Filter>> {
    let mut filters = Vec::with_capacity(raw.len());
    for (key, value) in raw {
        filters.push(parse_one(key, value, declared)?);
    }
    Ok(filters)
}

fn parse_one(
    key: &str,
    value: &str,
    declared: &BTreeMap<String, FilterDefinition>,
) -> FilterResult<Filter> {
    if value.trim().is_empty() {
        return Err(FilterError::EmptyValue(key.to_string()));
    }

    let (field, suffix) = split_suffix(key);
    let definition = lookup(declared, field).ok_or_else(|| {
        // A suffixed key for an undeclared field reports the full key
        FilterError::UnknownFilter(key.to_string())
    })?;

    let kind = resolve_kind(field, definition.filter_type, suffix)?;
    validate_value(field, value, definition, kind)?;

    Ok(Filter::new(field, value, kind))
}

/// Split a raw key into (field, suffix)
fn split_suffix(key: &str) -> (&str, Option<&str>) {
    if let Some(field) = key.strip_suffix(".start") {
        (field, Some(".start"))
    } else if let Some(field) = key.strip_suffix(".end") {
        (field, Some(".end"))
    } else {
        (key, None)
    }
}

/// Case-insensitive lookup against declared filter field names
fn lookup<'a>(
    declared: &'a BTreeMap<String, FilterDefinition>,
    field: &str,
) -> Option<&'a FilterDefinition> {
    declared
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(field))
        .map(|(_, def)| def)
}

fn resolve_kind(
    field: &str,
    declared: FilterType,
    suffix: Option<&str>,
) -> FilterResult<FilterKind> {
    match (declared, suffix) {
        (FilterType::Standard, None) => Ok(FilterKind::Standard),
        (FilterType::Dynamic, None) => Ok(FilterKind::Dynamic),
        (FilterType::Boolean, None) => Ok(FilterKind::Boolean),
        (FilterType::Range, Some(".start")) => Ok(FilterKind::RangeStart),
        (FilterType::Range, Some(".end")) => Ok(FilterKind::RangeEnd),
        (FilterType::DateRange, Some(".start")) => Ok(FilterKind::DateRangeStart),
        (FilterType::DateRange, Some(".end")) => Ok(FilterKind::DateRangeEnd),
        (FilterType::Range | FilterType::DateRange, None) => {
            Err(FilterError::MissingRangeSuffix(field.to_string()))
        }
        (_, Some(_)) => Err(FilterError::UnexpectedRangeSuffix(field.to_string())),
    }
}

fn validate_value(
    field: &str,
    value: &str,
    definition: &FilterDefinition,
    kind: FilterKind,
) -> FilterResult<()> {
    if !definition.accepts(value) {
        return Err(FilterError::InvalidStaticOption {
            field: field.to_string(),
            value: value.to_string(),
        });
    }

    match kind {
        FilterKind::Boolean => {
            if !value.eq_ignore_ascii_case("true") && !value.eq_ignore_ascii_case("false") {
                return Err(FilterError::InvalidBooleanValue {
                    field: field.to_string(),
                    value: value.to_string(),
                });
            }
        }
        FilterKind::DateRangeStart | FilterKind::DateRangeEnd => {
            let date_ok = NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
                || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").is_ok();
            if !date_ok {
                return Err(FilterError::InvalidDateValue {
                    field: field.to_string(),
                    value: value.to_string(),
                });
            }
        }
        FilterKind::Dynamic => {
            if !dynamic_value_pattern().is_match(value) {
                return Err(FilterError::UnsafeDynamicValue {
                    field: field.to_string(),
                    value: value.to_string(),
                });
            }
        }
        _ => {}
    }
    Ok(())
}
