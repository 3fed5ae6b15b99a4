//! The backend-agnostic execution contract
//!
//! Each backend implements `ExecutionAdapter` over its own transport
//! client. CTE assembly and pagination are shared here so both
//! implementations compose statements identically.

use std::collections::BTreeMap;

use crate::context::UserContext;
use crate::definition::ReportDefinition;
use crate::query::{PageSpec, ParamStyle, QueryComposer, QueryRequest};

use super::errors::{ExecutionError, ExecutionResult};
use super::status::StatementStatus;

/// One result row, keyed by column name
pub type Row = serde_json::Value;

/// Handle returned by an async submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementExecution {
    /// Generated name of the table the results materialize into
    pub table_id: String,
    /// Backend execution id used for polling and cancellation
    pub execution_id: String,
}

/// The per-backend statement lifecycle
///
/// Submission is non-blocking; status describes without blocking;
/// cancellation is best-effort and idempotent once terminal. Reads
/// against materialized tables follow the 1-based pagination contract.
/// This layer never retries: a concurrency-limit rejection surfaces as
/// `ExecutionError::ConcurrencyLimit` for the caller to act on.
pub trait ExecutionAdapter {
    /// Submit the composed report query, materializing into a freshly
    /// named table; returns immediately
    fn execute_query_async(
        &self,
        report: &ReportDefinition,
        request: &QueryRequest,
        policy_predicate: &str,
        ctx: &UserContext,
        prompts: &BTreeMap<String, String>,
    ) -> ExecutionResult<StatementExecution>;

    /// Describe the current state of a submitted statement
    fn get_statement_status(&self, execution_id: &str) -> ExecutionResult<StatementStatus>;

    /// Request cancellation; success on an already-terminal statement
    fn cancel_statement_execution(&self, execution_id: &str) -> ExecutionResult<bool>;

    /// Row count of a materialized table
    fn count(&self, table_id: &str) -> ExecutionResult<u64>;

    /// One page of a materialized table
    fn get_paginated_rows(&self, table_id: &str, page: PageSpec) -> ExecutionResult<Vec<Row>>;

    /// Materialize a report-declared summary derived from a finished
    /// base table, as a new statement execution
    fn materialize_summary(
        &self,
        report: &ReportDefinition,
        summary_id: &str,
        base_table_id: &str,
    ) -> ExecutionResult<StatementExecution>;

    /// Paginated read guarded by the execution's status
    ///
    /// A missing table while the statement is still in flight means
    /// the caller read too early; a missing table after the statement
    /// finished means the table expired. The two must never collapse
    /// into one condition.
    fn get_verified_paginated_rows(
        &self,
        execution_id: &str,
        table_id: &str,
        page: PageSpec,
    ) -> ExecutionResult<Vec<Row>> {
        match self.get_paginated_rows(table_id, page) {
            Err(ExecutionError::TableMissing(_)) => {
                Err(self.classify_missing_table(execution_id, table_id)?)
            }
            result => result,
        }
    }

    /// Row count guarded by the execution's status, same contract as
    /// `get_verified_paginated_rows`
    fn get_verified_count(&self, execution_id: &str, table_id: &str) -> ExecutionResult<u64> {
        match self.count(table_id) {
            Err(ExecutionError::TableMissing(_)) => {
                Err(self.classify_missing_table(execution_id, table_id)?)
            }
            result => result,
        }
    }

    /// Resolve a missing-table read into its true condition: still
    /// running (caller timing error) or genuinely gone (expired, or
    /// terminally unsuccessful and never created)
    fn classify_missing_table(
        &self,
        execution_id: &str,
        table_id: &str,
    ) -> ExecutionResult<ExecutionError> {
        let status = self.get_statement_status(execution_id)?;
        if status.is_terminal() {
            Ok(ExecutionError::TableMissing(table_id.to_string()))
        } else {
            Ok(ExecutionError::NotYetMaterialized(execution_id.to_string()))
        }
    }
}

/// Compose the literal-SQL select both async backends wrap in their
/// CREATE TABLE statements
pub(crate) fn compose_async_select(
    report: &ReportDefinition,
    request: &QueryRequest,
    policy_predicate: &str,
    ctx: &UserContext,
    prompts: &BTreeMap<String, String>,
) -> ExecutionResult<String> {
    let composer = QueryComposer::new(report, policy_predicate)
        .with_context(ctx)
        .with_prompts(prompts)?;
    Ok(composer.build_select(request, ParamStyle::Literal)?.sql)
}

/// Extract the `total` column from a count query's single row
pub(crate) fn total_from_rows(table_id: &str, rows: &[Row]) -> ExecutionResult<u64> {
    rows.first()
        .and_then(|row| row.get("total"))
        .and_then(|total| total.as_u64())
        .ok_or_else(|| {
            ExecutionError::Backend(format!("count of {} returned no total column", table_id))
        })
}
