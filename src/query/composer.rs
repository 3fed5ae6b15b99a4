//! Statement composition over the CTE pipeline
//!
//! The composer owns sort/pagination validation and the two rendering
//! modes: named parameters for the synchronous path, inlined literals
//! for backend-generated async SQL.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::context::UserContext;
use crate::definition::ReportDefinition;
use crate::filter::condition::escape_literal;
use crate::filter::Filter;

use super::cte::{
    CtePipeline, CONTEXT_CTE, DATASET_CTE, FILTER_CTE, POLICY_CTE, PREFILTER_CTE, PROMPTS_CTE,
};
use super::errors::{QueryError, QueryResult};

/// Detects dataset queries that declare their own `dataset_` CTE chain
fn dataset_cte_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^\s*WITH\b[\s\S]*\bdataset_\s+AS\s*\(").expect("valid pattern")
    })
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid pattern"))
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// 1-based pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpec {
    page: u64,
    page_size: u64,
}

impl PageSpec {
    /// Create a pagination window; both values must be >= 1
    pub fn new(page: u64, page_size: u64) -> QueryResult<Self> {
        if page < 1 {
            return Err(QueryError::InvalidPage);
        }
        if page_size < 1 {
            return Err(QueryError::InvalidPageSize);
        }
        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Rows skipped before this page starts
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.page_size
    }
}

/// How filter values reach the statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamStyle {
    /// `:key` placeholders plus a bind map (synchronous execution)
    Named,
    /// Escaped literals inlined (async/backend-generated SQL)
    Literal,
}

/// One report query request: validated filters plus projection options
#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    pub filters: Vec<Filter>,
    pub sort_column: Option<String>,
    pub sort_direction: SortDirection,
    pub page: Option<PageSpec>,
    /// When set, the final stage projects `DISTINCT` values of this
    /// field (typeahead support)
    pub dynamic_field: Option<String>,
}

impl QueryRequest {
    pub fn new(filters: Vec<Filter>) -> Self {
        Self {
            filters,
            ..Default::default()
        }
    }

    pub fn sorted_by(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_column = Some(column.into());
        self.sort_direction = direction;
        self
    }

    pub fn paged(mut self, page: PageSpec) -> Self {
        self.page = Some(page);
        self
    }

    pub fn distinct_values_of(mut self, field: impl Into<String>) -> Self {
        self.dynamic_field = Some(field.into());
        self
    }
}

/// A rendered statement plus its bind map (empty in literal mode)
#[derive(Debug, Clone)]
pub struct ComposedQuery {
    pub sql: String,
    pub params: BTreeMap<String, Value>,
}

/// Builds complete statements for one report
pub struct QueryComposer<'a> {
    report: &'a ReportDefinition,
    policy_predicate: String,
    prelude: Vec<(String, String)>,
}

impl<'a> QueryComposer<'a> {
    /// Create a composer for a report with an already-evaluated policy
    /// predicate (`TRUE`, `FALSE`, or a boolean SQL condition)
    pub fn new(report: &'a ReportDefinition, policy_predicate: impl Into<String>) -> Self {
        Self {
            report,
            policy_predicate: policy_predicate.into(),
            prelude: Vec::new(),
        }
    }

    /// Inject a `context_` CTE carrying the caller's identity and
    /// active caseload, ahead of the dataset
    pub fn with_context(mut self, ctx: &UserContext) -> Self {
        let caseload = ctx.active_caseload.as_deref().unwrap_or_default();
        let body = format!(
            "SELECT '{}' AS account, '{}' AS caseload",
            escape_literal(&ctx.username),
            escape_literal(caseload)
        );
        self.prelude.push((CONTEXT_CTE.to_string(), body));
        self
    }

    /// Inject a `prompts_` CTE carrying caller-supplied named
    /// parameters, ahead of the dataset
    pub fn with_prompts(
        mut self,
        prompts: &BTreeMap<String, String>,
    ) -> QueryResult<QueryComposer<'a>> {
        if prompts.is_empty() {
            return Ok(self);
        }
        let mut columns = Vec::with_capacity(prompts.len());
        for (name, value) in prompts {
            if !identifier_pattern().is_match(name) {
                return Err(QueryError::InvalidPromptName(name.clone()));
            }
            columns.push(format!("'{}' AS {}", escape_literal(value), name));
        }
        let body = format!("SELECT {}", columns.join(", "));
        self.prelude.push((PROMPTS_CTE.to_string(), body));
        Ok(self)
    }

    /// Build the row-returning statement
    pub fn build_select(
        &self,
        request: &QueryRequest,
        style: ParamStyle,
    ) -> QueryResult<ComposedQuery> {
        let mut params = BTreeMap::new();
        let pipeline = self.pipeline(&request.filters, style, &mut params);

        let projection = match &request.dynamic_field {
            Some(field) => {
                if self.report.field(field).is_none() {
                    return Err(QueryError::InvalidDynamicField(field.clone()));
                }
                format!("SELECT DISTINCT {}", field)
            }
            None => "SELECT *".to_string(),
        };

        let mut final_stage = format!("{} FROM {}", projection, FILTER_CTE);
        if let Some(column) = self.resolve_sort_column(request)? {
            final_stage.push_str(&format!(
                " ORDER BY {} {}",
                column,
                request.sort_direction.as_str()
            ));
        }
        if let Some(page) = request.page {
            final_stage.push_str(&format!(
                " LIMIT {} OFFSET {}",
                page.page_size(),
                page.offset()
            ));
        }

        Ok(ComposedQuery {
            sql: pipeline.render(&final_stage),
            params,
        })
    }

    /// Build the counting statement over the identical pipeline
    pub fn build_count(&self, filters: &[Filter], style: ParamStyle) -> QueryResult<ComposedQuery> {
        let mut params = BTreeMap::new();
        let pipeline = self.pipeline(filters, style, &mut params);
        let final_stage = format!("SELECT COUNT(1) AS total FROM {}", FILTER_CTE);
        Ok(ComposedQuery {
            sql: pipeline.render(&final_stage),
            params,
        })
    }

    /// Assemble the staged chain; policy always precedes user filters
    fn pipeline(
        &self,
        filters: &[Filter],
        style: ParamStyle,
        params: &mut BTreeMap<String, Value>,
    ) -> CtePipeline {
        let mut pipeline = CtePipeline::new();
        for (name, body) in &self.prelude {
            pipeline = pipeline.stage(name, body);
        }

        let dataset_query = self.report.dataset.query.trim();
        if dataset_cte_pattern().is_match(dataset_query) {
            // Dataset already declares its own CTE chain ending in
            // dataset_; pass it through unmodified.
            let chain = dataset_query
                .trim_start()
                .get(4..)
                .unwrap_or_default()
                .trim_start();
            pipeline = pipeline.raw(chain);
        } else {
            pipeline = pipeline.stage(DATASET_CTE, dataset_query);
        }
        let mut previous = DATASET_CTE;

        if let Some(report_filter) = &self.report.report_filter {
            pipeline = pipeline.stage(
                PREFILTER_CTE,
                &format!("SELECT * FROM {} WHERE {}", previous, report_filter),
            );
            previous = PREFILTER_CTE;
        }

        pipeline = pipeline.stage(
            POLICY_CTE,
            &format!(
                "SELECT * FROM {} WHERE {}",
                previous, self.policy_predicate
            ),
        );

        let filter_predicate = if filters.is_empty() {
            "TRUE".to_string()
        } else {
            filters
                .iter()
                .map(|f| match style {
                    ParamStyle::Named => {
                        params.insert(f.key(), f.bind_value());
                        f.build_condition(None)
                    }
                    ParamStyle::Literal => f.build_literal_condition(),
                })
                .collect::<Vec<_>>()
                .join(" AND ")
        };
        pipeline.stage(
            FILTER_CTE,
            &format!("SELECT * FROM {} WHERE {}", POLICY_CTE, filter_predicate),
        )
    }

    /// Requested sort column, validated, or the report default
    fn resolve_sort_column(&self, request: &QueryRequest) -> QueryResult<Option<String>> {
        match &request.sort_column {
            Some(column) => {
                let field = self
                    .report
                    .field(column)
                    .ok_or_else(|| QueryError::InvalidSortColumn(column.clone()))?;
                if !field.sortable {
                    return Err(QueryError::UnsortableColumn(column.clone()));
                }
                Ok(Some(field.name.clone()))
            }
            None => Ok(self.report.default_sort_field().map(str::to_string)),
        }
    }
}
