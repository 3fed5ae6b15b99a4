//! Batch SQL execution engine adapter
//!
//! Submits through the data-API style statement service against either
//! a provisioned cluster or a serverless workgroup. Async results
//! materialize as external parquet tables under a configured object
//! location; reads go back through the same statement service.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::context::UserContext;
use crate::definition::ReportDefinition;
use crate::observability::{log_event_with_fields, Event};
use crate::query::{PageSpec, QueryRequest};
use crate::table::{
    build_summary_query, count_select, generate_new_external_table_id, paginated_select,
    table_summary_id, wrap_create_external_table,
};

use super::adapter::{
    compose_async_select, total_from_rows, ExecutionAdapter, Row, StatementExecution,
};
use super::errors::{ExecutionError, ExecutionResult};
use super::status::{NativeExecutionState, StatementState, StatementStatus};

/// Which compute the batch engine runs on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterTarget {
    Provisioned { cluster_identifier: String },
    Serverless { workgroup: String },
}

/// Query context the batch engine requires
#[derive(Debug, Clone)]
pub struct BatchQueryContext {
    pub cluster: ClusterTarget,
    pub database: String,
    pub secret_arn: String,
    /// Object-store prefix external result tables are written under
    pub external_location: String,
}

impl BatchQueryContext {
    pub fn provisioned(
        cluster_identifier: impl Into<String>,
        database: impl Into<String>,
        secret_arn: impl Into<String>,
        external_location: impl Into<String>,
    ) -> Self {
        Self {
            cluster: ClusterTarget::Provisioned {
                cluster_identifier: cluster_identifier.into(),
            },
            database: database.into(),
            secret_arn: secret_arn.into(),
            external_location: external_location.into(),
        }
    }

    pub fn serverless(
        workgroup: impl Into<String>,
        database: impl Into<String>,
        secret_arn: impl Into<String>,
        external_location: impl Into<String>,
    ) -> Self {
        Self {
            cluster: ClusterTarget::Serverless {
                workgroup: workgroup.into(),
            },
            database: database.into(),
            secret_arn: secret_arn.into(),
            external_location: external_location.into(),
        }
    }
}

/// Transport seam to the batch statement service
///
/// Implementations map the service's active-statement rejection to
/// `ExecutionError::ConcurrencyLimit` and a read against a dropped
/// external table to `ExecutionError::TableMissing`.
pub trait BatchClient {
    /// Submit a statement; returns the service statement id
    fn execute_statement(&self, sql: &str, context: &BatchQueryContext) -> ExecutionResult<String>;

    /// Describe a submitted statement; the status string is already in
    /// the canonical vocabulary
    fn describe_statement(&self, statement_id: &str) -> ExecutionResult<NativeExecutionState>;

    /// Request cancellation; returns whether the service accepted it
    fn cancel_statement(&self, statement_id: &str) -> ExecutionResult<bool>;

    /// Run a statement to completion and return its rows
    fn run_query(
        &self,
        sql: &str,
        params: &BTreeMap<String, Value>,
        context: &BatchQueryContext,
    ) -> ExecutionResult<Vec<Row>>;
}

/// Execution adapter over the batch engine
pub struct BatchEngineAdapter<C: BatchClient> {
    client: C,
    context: BatchQueryContext,
}

impl<C: BatchClient> BatchEngineAdapter<C> {
    pub fn new(client: C, context: BatchQueryContext) -> Self {
        Self { client, context }
    }

    fn submit(&self, sql: &str, table_id: &str, event: Event) -> ExecutionResult<StatementExecution> {
        let execution_id = self.client.execute_statement(sql, &self.context)?;
        log_event_with_fields(
            event,
            &[
                ("backend", "batch"),
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

impl<C: BatchClient> ExecutionAdapter for BatchEngineAdapter<C> {
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
                        ("backend", "batch"),
                        ("report", &report.id),
                        ("error", &reason),
                    ],
                );
                return Err(err);
            }
        };
        let sql =
            wrap_create_external_table(&table_id, &self.context.external_location, &select);
        self.submit(&sql, &table_id, Event::QuerySubmitted)
    }

    fn get_statement_status(&self, execution_id: &str) -> ExecutionResult<StatementStatus> {
        let native = self.client.describe_statement(execution_id)?;
        let status = StatementState::from_batch(&native.status)?;
        log_event_with_fields(
            Event::StatusPolled,
            &[
                ("backend", "batch"),
                ("execution_id", execution_id),
                ("status", status.as_str()),
            ],
        );
        match status {
            StatementState::Finished => log_event_with_fields(
                Event::TableMaterialized,
                &[("backend", "batch"), ("execution_id", execution_id)],
            ),
            StatementState::Failed => log_event_with_fields(
                Event::QueryFailed,
                &[
                    ("backend", "batch"),
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
        let accepted = self.client.cancel_statement(execution_id)?;
        if accepted {
            log_event_with_fields(
                Event::QueryCancelled,
                &[("backend", "batch"), ("execution_id", execution_id)],
            );
        }
        Ok(accepted)
    }

    fn count(&self, table_id: &str) -> ExecutionResult<u64> {
        let rows =
            self.client
                .run_query(&count_select(table_id), &BTreeMap::new(), &self.context)?;
        total_from_rows(table_id, &rows)
    }

    fn get_paginated_rows(&self, table_id: &str, page: PageSpec) -> ExecutionResult<Vec<Row>> {
        self.client.run_query(
            &paginated_select(table_id, page),
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
        let sql = build_summary_query(summary, base_table_id);
        self.submit(
            &sql,
            &table_summary_id(base_table_id, &summary.id),
            Event::SummaryMaterialized,
        )
    }
}
