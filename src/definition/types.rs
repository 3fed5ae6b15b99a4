//! Report definition document types

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::filter::FilterDefinition;
use crate::policy::Policy;

use super::errors::{DefinitionError, DefinitionResult};

/// Identifiers that get interpolated into SQL must stay in this set
fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid pattern"))
}

/// The base dataset query a report is built over
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetDefinition {
    pub id: String,
    /// Raw SQL producing the dataset rows; treated as an opaque
    /// subquery unless it already declares the `dataset_` CTE
    pub query: String,
}

impl DatasetDefinition {
    pub fn new(id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            query: query.into(),
        }
    }
}

/// A report column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Dataset column name
    pub name: String,

    /// Human-facing label
    #[serde(default)]
    pub display: String,

    /// Whether callers may sort by this field
    #[serde(default)]
    pub sortable: bool,

    /// Whether this field is the report's default sort
    #[serde(default)]
    pub default_sort: bool,

    /// Declared filter for this field, if filterable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterDefinition>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display: String::new(),
            sortable: false,
            default_sort: false,
            filter: None,
        }
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn default_sort(mut self) -> Self {
        self.sortable = true;
        self.default_sort = true;
        self
    }

    pub fn with_filter(mut self, filter: FilterDefinition) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// A derived summary over an already-materialized result table
///
/// The query contains a `${tableId}` token substituted with the base
/// table's identifier at materialization time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryDefinition {
    pub id: String,
    pub query: String,
}

impl SummaryDefinition {
    pub fn new(id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            query: query.into(),
        }
    }
}

/// A complete report definition document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDefinition {
    pub id: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub dataset: DatasetDefinition,

    /// Optional report-level SQL predicate applied before policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_filter: Option<String>,

    #[serde(default)]
    pub fields: Vec<FieldDefinition>,

    #[serde(default)]
    pub summaries: Vec<SummaryDefinition>,

    #[serde(default)]
    pub policies: Vec<Policy>,
}

impl ReportDefinition {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        dataset: DatasetDefinition,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            dataset,
            report_filter: None,
            fields: Vec::new(),
            summaries: Vec::new(),
            policies: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_report_filter(mut self, predicate: impl Into<String>) -> Self {
        self.report_filter = Some(predicate.into());
        self
    }

    pub fn with_summary(mut self, summary: SummaryDefinition) -> Self {
        self.summaries.push(summary);
        self
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policies.push(policy);
        self
    }

    /// Look up a field by name, case-insensitively
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Look up a summary by id
    pub fn summary(&self, id: &str) -> Option<&SummaryDefinition> {
        self.summaries.iter().find(|s| s.id == id)
    }

    /// The declared default sort field, if any
    pub fn default_sort_field(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.default_sort)
            .map(|f| f.name.as_str())
    }

    /// Declared filters keyed by field name
    pub fn declared_filters(&self) -> BTreeMap<String, FilterDefinition> {
        self.fields
            .iter()
            .filter_map(|f| {
                f.filter
                    .as_ref()
                    .map(|filter| (f.name.clone(), filter.clone()))
            })
            .collect()
    }

    /// Structural validation, run once when the document is loaded
    pub fn validate(&self) -> DefinitionResult<()> {
        for field in &self.fields {
            self.check_identifier(&field.name)?;
        }

        let default_sorts: Vec<_> = self.fields.iter().filter(|f| f.default_sort).collect();
        if default_sorts.len() > 1 {
            return Err(DefinitionError::MultipleDefaultSorts(self.id.clone()));
        }
        if let Some(field) = default_sorts.first() {
            if !field.sortable {
                return Err(DefinitionError::DefaultSortNotSortable {
                    report: self.id.clone(),
                    field: field.name.clone(),
                });
            }
        }

        for summary in &self.summaries {
            self.check_identifier(&summary.id)?;
            if !summary.query.contains("${tableId}") {
                return Err(DefinitionError::SummaryMissingTableToken {
                    report: self.id.clone(),
                    summary: summary.id.clone(),
                });
            }
        }

        for policy in &self.policies {
            policy
                .validate()
                .map_err(|source| DefinitionError::InvalidPolicy {
                    report: self.id.clone(),
                    source,
                })?;
        }

        Ok(())
    }

    fn check_identifier(&self, identifier: &str) -> DefinitionResult<()> {
        if identifier_pattern().is_match(identifier) {
            Ok(())
        } else {
            Err(DefinitionError::UnsafeIdentifier {
                report: self.id.clone(),
                identifier: identifier.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterDefinition, FilterType};
    use crate::policy::{Condition, PolicyType, Rule};

    fn sample_report() -> ReportDefinition {
        ReportDefinition::new(
            "external-movements",
            "External Movements",
            DatasetDefinition::new("movements", "SELECT * FROM movements"),
        )
        .with_field(FieldDefinition::new("prisoner_number").default_sort())
        .with_field(
            FieldDefinition::new("date")
                .sortable()
                .with_filter(FilterDefinition::new(FilterType::DateRange)),
        )
        .with_field(FieldDefinition::new("direction"))
    }

    #[test]
    fn test_valid_report() {
        assert!(sample_report().validate().is_ok());
    }

    #[test]
    fn test_field_lookup_case_insensitive() {
        let report = sample_report();
        assert!(report.field("Prisoner_Number").is_some());
        assert!(report.field("missing").is_none());
    }

    #[test]
    fn test_default_sort_field() {
        assert_eq!(
            sample_report().default_sort_field(),
            Some("prisoner_number")
        );
    }

    #[test]
    fn test_declared_filters_only_cover_filterable_fields() {
        let filters = sample_report().declared_filters();
        assert_eq!(filters.len(), 1);
        assert!(filters.contains_key("date"));
    }

    #[test]
    fn test_unsafe_field_name_rejected() {
        let report = sample_report().with_field(FieldDefinition::new("bad;drop"));
        assert!(matches!(
            report.validate().unwrap_err(),
            DefinitionError::UnsafeIdentifier { .. }
        ));
    }

    #[test]
    fn test_multiple_default_sorts_rejected() {
        let report = sample_report().with_field(FieldDefinition::new("other").default_sort());
        assert_eq!(
            report.validate().unwrap_err(),
            DefinitionError::MultipleDefaultSorts("external-movements".into())
        );
    }

    #[test]
    fn test_summary_requires_table_token() {
        let bad = sample_report()
            .with_summary(SummaryDefinition::new("totals", "SELECT COUNT(1) FROM x"));
        assert!(matches!(
            bad.validate().unwrap_err(),
            DefinitionError::SummaryMissingTableToken { .. }
        ));

        let good = sample_report().with_summary(SummaryDefinition::new(
            "totals",
            "SELECT direction, COUNT(1) AS total FROM ${tableId} GROUP BY direction",
        ));
        assert!(good.validate().is_ok());
    }

    #[test]
    fn test_embedded_policy_validated() {
        let bad_policy = Policy::new("p", PolicyType::Access)
            .with_rule(Rule::permit(vec![Condition::exists(&["${shoe_size}"])]));
        let report = sample_report().with_policy(bad_policy);
        assert!(matches!(
            report.validate().unwrap_err(),
            DefinitionError::InvalidPolicy { .. }
        ));
    }

    #[test]
    fn test_definition_round_trips_through_json() {
        let report = sample_report();
        let json = serde_json::to_string(&report).unwrap();
        let parsed: ReportDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, report.id);
        assert_eq!(parsed.fields.len(), report.fields.len());
        assert!(parsed.validate().is_ok());
    }
}
