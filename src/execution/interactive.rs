//! Interactive query engine adapter
//!
//! Submits against a catalog-backed interactive SQL service. Async
//! results materialize through `CREATE TABLE <database>.<table> AS`;
//! the synchronous inline path runs the parameterized statement
//! directly and returns rows.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::context::UserContext;
use crate::definition::ReportDefinition;
use crate::observability::{log_event_with_fields, Event};
use crate::query::{PageSpec, ParamStyle, QueryComposer, QueryRequest};
use crate::table::{
    count_select, generate_new_external_table_id, paginated_select, table_summary_id,
    wrap_create_table_as,
};

use super::adapter::{
    compose_async_select, total_from_rows, ExecutionAdapter, Row, StatementExecution,
};
use super::errors::{ExecutionError, ExecutionResult};
use super::status::{NativeExecutionState, StatementState, StatementStatus};

/// Query context the interactive engine requires
#[derive(Debug, Clone)]
pub struct InteractiveQueryContext {
    pub database: String,
    pub catalog: String,
    pub workgroup: String,
}

impl InteractiveQueryContext {
    pub fn new(
        database: impl Into<String>,
        catalog: impl Into<String>,
        workgroup: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            catalog: catalog.into(),
            workgroup: workgroup.into(),
        }
    }
}

/// Transport seam to the interactive engine
///
/// Implementations map the service's "too many active statements"
/// rejection to `ExecutionError::ConcurrencyLimit` and a read against
/// a nonexistent table to `ExecutionError::TableMissing`.
pub trait InteractiveClient {
    /// Submit a statement; returns the backend execution id
    fn start_query_execution(
        &self,
        sql: &str,
        context: &InteractiveQueryContext,
    ) -> ExecutionResult<String>;

    /// Describe a submitted statement
    fn get_query_execution(&self, execution_id: &str) -> ExecutionResult<NativeExecutionState>;

    /// Request cancellation
    fn stop_query_execution(&self, execution_id: &str) -> ExecutionResult<()>;

    /// Run a statement to completion and return its rows (used for the
    /// inline path and for reads against materialized tables)
    fn run_query(
        &self,
        sql: &str,
        params: &BTreeMap<String, Value>,
        context: &InteractiveQueryContext,
    ) -> ExecutionResult<Vec<Row>>;
}

/// Execution adapter over the interactive engine
pub struct InteractiveEngineAdapter<C: InteractiveClient> {
    client: C,
    context: InteractiveQueryContext,
}

impl<C: InteractiveClient> InteractiveEngineAdapter<C> {
    pub fn new(client: C, context: InteractiveQueryContext) -> Self {
        Self { client, context }
    }

    fn qualified(&self, table_id: &str) -> String {
        format!("{}.{}", self.context.database, table_id)
    }

    /// The synchronous inline path: compose with named parameters and
    /// run directly, returning rows
    pub fn execute_query(
        &self,
        report: &ReportDefinition,
        request: &QueryRequest,
        policy_predicate: &str,
    ) -> ExecutionResult<Vec<Row>> {
        let composed = QueryComposer::new(report, policy_predicate)
            .build_select(request, ParamStyle::Named)?;
        self.client
            .run_query(&composed.sql, &composed.params, &self.context)
    }

    fn submit(&self, sql: &str, table_id: &str, event: Event) -> ExecutionResult<StatementExecution> {
        let execution_id = self.client.start_query_execution(sql, &self.context)?;
        log_event_with_fields(
            event,
            &[
                ("backend", "interactive"),
                ("execution_id", &execution_id),
                ("table_id", table_id),
            ],
        );
        Ok(StatementExecution {
            table_id: table_id.to_string(),
            execution_id,
        })
    }
}

impl<C: InteractiveClient> ExecutionAdapter for InteractiveEngineAdapter<C> {
    fn execute_query_async(
        &self,
        report: &ReportDefinition,
        request: &QueryRequest,
        policy_predicate: &str,
        ctx: &UserContext,
        prompts: &BTreeMap<String, String>,
    ) -> ExecutionResult<StatementExecution> {
        let table_id = generate_new_external_table_id();
        let select = match compose_async_select(report, request, policy_predicate, ctx, prompts) {
            Ok(select) => select,
            Err(err) => {
                let reason = err.to_string();
                log_event_with_fields(
                    Event::QueryRejected,
                    &[
                        ("backend", "interactive"),
                        ("report", &report.id),
                        ("error", &reason),
                    ],
                );
                return Err(err);
            }
        };
        let sql = wrap_create_table_as(&self.qualified(&table_id), &select);
        self.submit(&sql, &table_id, Event::QuerySubmitted)
    }

    fn get_statement_status(&self, execution_id: &str) -> ExecutionResult<StatementStatus> {
        let native = self.client.get_query_execution(execution_id)?;
        let status = StatementState::from_interactive(&native.status)?;
        log_event_with_fields(
            Event::StatusPolled,
            &[
                ("backend", "interactive"),
                ("execution_id", execution_id),
                ("status", status.as_str()),
            ],
        );
        match status {
            StatementState::Finished => log_event_with_fields(
                Event::TableMaterialized,
                &[("backend", "interactive"), ("execution_id", execution_id)],
            ),
            StatementState::Failed => log_event_with_fields(
                Event::QueryFailed,
                &[
                    ("backend", "interactive"),
                    ("execution_id", execution_id),
                    ("error", native.error.as_deref().unwrap_or_default()),
                ],
            ),
            _ => {}
        }
        Ok(StatementStatus {
            status,
            duration_nanos: native.duration_nanos,
            result_rows: native.result_rows,
            result_size: native.result_size,
            error: native.error,
            error_category: native.error_category,
            state_change_reason: native.state_change_reason,
        })
    }

    fn cancel_statement_execution(&self, execution_id: &str) -> ExecutionResult<bool> {
        // Terminal executions are a no-op success
        if self.get_statement_status(execution_id)?.is_terminal() {
            return Ok(true);
        }
        self.client.stop_query_execution(execution_id)?;
        log_event_with_fields(
            Event::QueryCancelled,
            &[("backend", "interactive"), ("execution_id", execution_id)],
        );
        Ok(true)
    }

    fn count(&self, table_id: &str) -> ExecutionResult<u64> {
        let rows = self.client.run_query(
            &count_select(&self.qualified(table_id)),
            &BTreeMap::new(),
            &self.context,
        )?;
        total_from_rows(table_id, &rows)
    }

    fn get_paginated_rows(&self, table_id: &str, page: PageSpec) -> ExecutionResult<Vec<Row>> {
        self.client.run_query(
            &paginated_select(&self.qualified(table_id), page),
            &BTreeMap::new(),
            &self.context,
        )
    }

    fn materialize_summary(
        &self,
        report: &ReportDefinition,
        summary_id: &str,
        base_table_id: &str,
    ) -> ExecutionResult<StatementExecution> {
        let summary = report
            .summary(summary_id)
            .ok_or_else(|| ExecutionError::SummaryNotFound {
                report: report.id.clone(),
                summary: summary_id.to_string(),
            })?;
        let summary_table = table_summary_id(base_table_id, &summary.id);
        let select = summary
            .query
            .replace("${tableId}", &self.qualified(base_table_id));
        let sql = wrap_create_table_as(&self.qualified(&summary_table), &select);
        self.submit(&sql, &summary_table, Event::SummaryMaterialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{DatasetDefinition, FieldDefinition, SummaryDefinition};
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory stand-in for the interactive engine
    struct FakeClient {
        executions: RefCell<HashMap<String, NativeExecutionState>>,
        submitted: RefCell<Vec<String>>,
        tables: RefCell<HashMap<String, Vec<Row>>>,
        next_id: RefCell<u32>,
    }

    impl FakeClient {
        fn new() -> Self {
            Self {
                executions: RefCell::new(HashMap::new()),
                submitted: RefCell::new(Vec::new()),
                tables: RefCell::new(HashMap::new()),
                next_id: RefCell::new(0),
            }
        }

        fn set_state(&self, execution_id: &str, native: NativeExecutionState) {
            self.executions
                .borrow_mut()
                .insert(execution_id.to_string(), native);
        }

        fn register_table(&self, qualified: &str, rows: Vec<Row>) {
            self.tables
                .borrow_mut()
                .insert(qualified.to_string(), rows);
        }
    }

    impl InteractiveClient for FakeClient {
        fn start_query_execution(
            &self,
            sql: &str,
            _context: &InteractiveQueryContext,
        ) -> ExecutionResult<String> {
            let mut next = self.next_id.borrow_mut();
            *next += 1;
            let id = format!("exec-{}", next);
            self.submitted.borrow_mut().push(sql.to_string());
            self.set_state(&id, NativeExecutionState::of("QUEUED"));
            Ok(id)
        }

        fn get_query_execution(
            &self,
            execution_id: &str,
        ) -> ExecutionResult<NativeExecutionState> {
            self.executions
                .borrow()
                .get(execution_id)
                .cloned()
                .ok_or_else(|| ExecutionError::ExecutionNotFound(execution_id.to_string()))
        }

        fn stop_query_execution(&self, execution_id: &str) -> ExecutionResult<()> {
            self.set_state(execution_id, NativeExecutionState::of("CANCELLED"));
            Ok(())
        }

        fn run_query(
            &self,
            sql: &str,
            _params: &BTreeMap<String, Value>,
            _context: &InteractiveQueryContext,
        ) -> ExecutionResult<Vec<Row>> {
            let tables = self.tables.borrow();
            for (qualified, rows) in tables.iter() {
                if sql.contains(qualified.as_str()) {
                    if sql.starts_with("SELECT COUNT(1)") {
                        return Ok(vec![json!({"total": rows.len()})]);
                    }
                    return Ok(apply_window(sql, rows));
                }
            }
            Err(ExecutionError::TableMissing(sql.to_string()))
        }
    }

    /// Honor the statement's LIMIT/OFFSET clause against stored rows
    fn apply_window(sql: &str, rows: &[Row]) -> Vec<Row> {
        let number_after = |keyword: &str| -> Option<usize> {
            let at = sql.rfind(keyword)?;
            sql[at + keyword.len()..]
                .split_whitespace()
                .next()?
                .parse()
                .ok()
        };
        let offset = number_after("OFFSET").unwrap_or(0);
        match number_after("LIMIT") {
            Some(limit) => rows.iter().skip(offset).take(limit).cloned().collect(),
            None => rows.to_vec(),
        }
    }

    fn report() -> ReportDefinition {
        ReportDefinition::new(
            "movements",
            "Movements",
            DatasetDefinition::new("movements", "SELECT * FROM movements"),
        )
        .with_field(FieldDefinition::new("direction"))
        .with_summary(SummaryDefinition::new(
            "totals",
            "SELECT COUNT(1) AS n FROM ${tableId}",
        ))
    }

    fn adapter() -> InteractiveEngineAdapter<FakeClient> {
        InteractiveEngineAdapter::new(
            FakeClient::new(),
            InteractiveQueryContext::new("reports", "catalog", "primary"),
        )
    }

    #[test]
    fn test_async_submission_wraps_in_create_table() {
        let adapter = adapter();
        let ctx = UserContext::new("AUSER");
        let execution = adapter
            .execute_query_async(
                &report(),
                &QueryRequest::default(),
                "TRUE",
                &ctx,
                &BTreeMap::new(),
            )
            .unwrap();

        assert!(!execution.table_id.is_empty());
        assert_eq!(execution.execution_id, "exec-1");

        let submitted = adapter.client.submitted.borrow();
        assert!(submitted[0].starts_with(&format!(
            "CREATE TABLE reports.{} AS (WITH context_ AS",
            execution.table_id
        )));
    }

    #[test]
    fn test_status_maps_native_vocabulary() {
        let adapter = adapter();
        adapter.client.set_state("e1", NativeExecutionState::of("RUNNING"));
        let status = adapter.get_statement_status("e1").unwrap();
        assert_eq!(status.status, StatementState::Started);
        assert!(!status.is_terminal());

        adapter.client.set_state("e1", NativeExecutionState::of("SUCCEEDED"));
        assert_eq!(
            adapter.get_statement_status("e1").unwrap().status,
            StatementState::Finished
        );
    }

    #[test]
    fn test_failed_status_carries_error_fields() {
        let adapter = adapter();
        let mut native = NativeExecutionState::of("FAILED");
        native.error = Some("exceeded bytes scanned".into());
        native.state_change_reason = Some("LIMIT_EXCEEDED".into());
        adapter.client.set_state("e1", native);

        let status = adapter.get_statement_status("e1").unwrap();
        assert_eq!(status.status, StatementState::Failed);
        assert_eq!(status.error.as_deref(), Some("exceeded bytes scanned"));
        assert_eq!(status.state_change_reason.as_deref(), Some("LIMIT_EXCEEDED"));
    }

    #[test]
    fn test_cancel_running_statement() {
        let adapter = adapter();
        adapter.client.set_state("e1", NativeExecutionState::of("RUNNING"));
        assert!(adapter.cancel_statement_execution("e1").unwrap());
        assert_eq!(
            adapter.get_statement_status("e1").unwrap().status,
            StatementState::Aborted
        );
    }

    #[test]
    fn test_cancel_is_idempotent_on_terminal() {
        let adapter = adapter();
        adapter.client.set_state("e1", NativeExecutionState::of("SUCCEEDED"));
        assert!(adapter.cancel_statement_execution("e1").unwrap());
        assert!(adapter.cancel_statement_execution("e1").unwrap());
        // Terminal status unchanged by cancellation
        assert_eq!(
            adapter.get_statement_status("e1").unwrap().status,
            StatementState::Finished
        );
    }

    #[test]
    fn test_count_and_pagination_against_materialized_table() {
        let adapter = adapter();
        let rows: Vec<Row> = (0..5).map(|i| json!({"n": i})).collect();
        adapter.client.register_table("reports._t1", rows);

        assert_eq!(adapter.count("_t1").unwrap(), 5);
        let page = adapter
            .get_paginated_rows("_t1", PageSpec::new(1, 2).unwrap())
            .unwrap();
        assert_eq!(page.len(), 2);
        let last = adapter
            .get_paginated_rows("_t1", PageSpec::new(3, 2).unwrap())
            .unwrap();
        assert_eq!(last.len(), 1);
    }

    #[test]
    fn test_missing_table_read_is_distinguishable() {
        let adapter = adapter();
        assert!(matches!(
            adapter.count("_gone").unwrap_err(),
            ExecutionError::TableMissing(_)
        ));
    }

    #[test]
    fn test_verified_read_separates_running_from_expired() {
        let adapter = adapter();
        let page = PageSpec::new(1, 10).unwrap();

        adapter.client.set_state("e1", NativeExecutionState::of("RUNNING"));
        assert!(matches!(
            adapter
                .get_verified_paginated_rows("e1", "_gone", page)
                .unwrap_err(),
            ExecutionError::NotYetMaterialized(_)
        ));

        adapter.client.set_state("e1", NativeExecutionState::of("SUCCEEDED"));
        assert!(matches!(
            adapter
                .get_verified_paginated_rows("e1", "_gone", page)
                .unwrap_err(),
            ExecutionError::TableMissing(_)
        ));
    }

    #[test]
    fn test_invalid_request_rejected_before_submission() {
        let adapter = adapter();
        let request = QueryRequest::default().distinct_values_of("nope");
        let err = adapter
            .execute_query_async(
                &report(),
                &request,
                "TRUE",
                &UserContext::new("AUSER"),
                &BTreeMap::new(),
            )
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Validation(_)));
        assert!(adapter.client.submitted.borrow().is_empty());
    }

    #[test]
    fn test_summary_materialization_derives_table_id() {
        let adapter = adapter();
        let execution = adapter
            .materialize_summary(&report(), "totals", "_base")
            .unwrap();
        assert_eq!(execution.table_id, "_base_totals");

        let submitted = adapter.client.submitted.borrow();
        assert_eq!(
            submitted[0],
            "CREATE TABLE reports._base_totals AS \
             (SELECT COUNT(1) AS n FROM reports._base)"
        );
    }

    #[test]
    fn test_unknown_summary_rejected() {
        let adapter = adapter();
        assert!(matches!(
            adapter
                .materialize_summary(&report(), "nope", "_base")
                .unwrap_err(),
            ExecutionError::SummaryNotFound { .. }
        ));
    }

    #[test]
    fn test_sync_path_runs_named_parameters() {
        let adapter = adapter();
        // The fake matches on table names; the composed query reads
        // from the dataset's source table, so register under that name.
        adapter
            .client
            .register_table("movements", vec![json!({"direction": "IN"})]);
        let rows = adapter
            .execute_query(&report(), &QueryRequest::default(), "TRUE")
            .unwrap();
        assert_eq!(rows.len(), 1);
    }
}
