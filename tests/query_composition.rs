//! Query Composition Tests
//!
//! End-to-end composition from raw filter input to executable SQL:
//! - Staged CTE ordering (policy before user filters)
//! - Raw filter parsing against declared filters
//! - Count/select pipeline equivalence
//! - Pagination and sorting

use std::collections::BTreeMap;

use reportdb::context::UserContext;
use reportdb::definition::{DatasetDefinition, FieldDefinition, ReportDefinition};
use reportdb::filter::{parse_filters, FilterDefinition, FilterError, FilterType};
use reportdb::query::{PageSpec, ParamStyle, QueryComposer, QueryRequest, SortDirection};

// =============================================================================
// Helper Functions
// =============================================================================

fn movements_report() -> ReportDefinition {
    ReportDefinition::new(
        "external-movements",
        "External Movements",
        DatasetDefinition::new(
            "external-movements",
            "SELECT * FROM datamart.movements_movements",
        ),
    )
    .with_field(FieldDefinition::new("prisoner_number").default_sort())
    .with_field(
        FieldDefinition::new("name")
            .sortable()
            .with_filter(FilterDefinition::new(FilterType::Standard)),
    )
    .with_field(
        FieldDefinition::new("date")
            .sortable()
            .with_filter(FilterDefinition::new(FilterType::DateRange)),
    )
    .with_field(
        FieldDefinition::new("direction").with_filter(
            FilterDefinition::new(FilterType::Standard)
                .with_static_options(vec!["IN".into(), "OUT".into()]),
        ),
    )
}

fn raw(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// =============================================================================
// Filter Parsing → Composition
// =============================================================================

/// A raw filter map flows through parsing into a complete statement.
#[test]
fn test_raw_filters_compose_into_statement() {
    let report = movements_report();
    let input = raw(&[
        ("direction", "IN"),
        ("date.start", "2023-04-25"),
        ("date.end", "2023-05-30"),
    ]);

    let filters = parse_filters(&input, &report.declared_filters()).unwrap();
    let composer = QueryComposer::new(&report, "TRUE");
    let composed = composer
        .build_select(&QueryRequest::new(filters), ParamStyle::Named)
        .unwrap();

    assert!(composed.sql.contains("lower(direction) = :direction"));
    assert!(composed.sql.contains("date >= CAST(:date_start AS timestamp)"));
    assert!(composed
        .sql
        .contains("date < CAST(:date_end AS timestamp) + INTERVAL '1 day'"));
    assert_eq!(composed.params.len(), 3);
    assert_eq!(
        composed.params.get("direction"),
        Some(&serde_json::json!("in"))
    );
}

/// Undeclared keys are rejected before any SQL exists.
#[test]
fn test_undeclared_filter_never_reaches_sql() {
    let report = movements_report();
    let input = raw(&[("cell_block", "A")]);
    assert_eq!(
        parse_filters(&input, &report.declared_filters()).unwrap_err(),
        FilterError::UnknownFilter("cell_block".into())
    );
}

// =============================================================================
// Stage Ordering
// =============================================================================

/// User filters select from the policy stage, so a denying policy
/// excludes rows no matter what the caller filters on.
#[test]
fn test_policy_stage_precedes_filter_stage() {
    let report = movements_report();
    let input = raw(&[("name", "Smith")]);
    let filters = parse_filters(&input, &report.declared_filters()).unwrap();

    let composer = QueryComposer::new(&report, "origin_code = 'LEI'");
    let composed = composer
        .build_select(&QueryRequest::new(filters), ParamStyle::Named)
        .unwrap();

    assert!(composed
        .sql
        .contains("policy_ AS (SELECT * FROM dataset_ WHERE origin_code = 'LEI')"));
    assert!(composed
        .sql
        .contains("filter_ AS (SELECT * FROM policy_ WHERE lower(name) = :name)"));
}

/// A denied policy composes to a statement that returns nothing.
#[test]
fn test_denied_policy_composes_false_predicate() {
    let report = movements_report();
    let composer = QueryComposer::new(&report, "FALSE");
    let composed = composer
        .build_select(&QueryRequest::default(), ParamStyle::Named)
        .unwrap();
    assert!(composed
        .sql
        .contains("policy_ AS (SELECT * FROM dataset_ WHERE FALSE)"));
}

// =============================================================================
// Count Equivalence
// =============================================================================

/// The count statement reuses the identical pipeline, swapping only the
/// final projection.
#[test]
fn test_count_shares_pipeline_with_select() {
    let report = movements_report();
    let input = raw(&[("direction", "OUT")]);
    let filters = parse_filters(&input, &report.declared_filters()).unwrap();

    let composer = QueryComposer::new(&report, "origin_code = 'LEI'");
    let select = composer
        .build_select(&QueryRequest::new(filters.clone()), ParamStyle::Named)
        .unwrap();
    let count = composer.build_count(&filters, ParamStyle::Named).unwrap();

    assert!(count.sql.ends_with("SELECT COUNT(1) AS total FROM filter_"));
    let shared = select.sql.rfind("SELECT").unwrap();
    assert_eq!(&count.sql[..shared], &select.sql[..shared]);
    assert_eq!(count.params, select.params);
}

// =============================================================================
// Sorting and Pagination
// =============================================================================

/// Requested sort wins over the report default; direction is honored.
#[test]
fn test_requested_sort_overrides_default() {
    let report = movements_report();
    let composer = QueryComposer::new(&report, "TRUE");

    let by_default = composer
        .build_select(&QueryRequest::default(), ParamStyle::Named)
        .unwrap();
    assert!(by_default.sql.ends_with("ORDER BY prisoner_number asc"));

    let request = QueryRequest::default().sorted_by("date", SortDirection::Desc);
    let by_request = composer.build_select(&request, ParamStyle::Named).unwrap();
    assert!(by_request.sql.ends_with("ORDER BY date desc"));
}

/// Page 3 of 20 skips 40 rows.
#[test]
fn test_pagination_window() {
    let report = movements_report();
    let composer = QueryComposer::new(&report, "TRUE");
    let request = QueryRequest::default().paged(PageSpec::new(3, 20).unwrap());
    let composed = composer.build_select(&request, ParamStyle::Named).unwrap();
    assert!(composed.sql.contains("LIMIT 20 OFFSET 40"));
}

// =============================================================================
// Literal Mode (async path)
// =============================================================================

/// Literal mode inlines every value, escaped, with the caller identity
/// CTE ahead of the dataset.
#[test]
fn test_literal_mode_full_statement() {
    let report = movements_report();
    let input = raw(&[("name", "O'Brien")]);
    let filters = parse_filters(&input, &report.declared_filters()).unwrap();

    let ctx = UserContext::new("AUSER").with_active_caseload("LEI");
    let composer = QueryComposer::new(&report, "TRUE").with_context(&ctx);
    let composed = composer
        .build_select(&QueryRequest::new(filters), ParamStyle::Literal)
        .unwrap();

    assert!(composed.params.is_empty());
    assert!(composed.sql.starts_with(
        "WITH context_ AS (SELECT 'AUSER' AS account, 'LEI' AS caseload), dataset_ AS"
    ));
    assert!(composed.sql.contains("lower(name) = 'o''brien'"));
}
