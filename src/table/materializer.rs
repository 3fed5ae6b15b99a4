//! Materialization wrapper SQL
//!
//! CREATE TABLE AS wrappers for async results and derived summaries,
//! plus the paginated/counted reads issued against materialized
//! tables. The pagination contract matches the query composer: 1-based
//! pages, `OFFSET (page-1)*page_size`.

use crate::definition::SummaryDefinition;
use crate::query::PageSpec;

use super::ident::table_summary_id;

/// Token a summary query uses to reference its base table
const TABLE_ID_TOKEN: &str = "${tableId}";

/// Wrap a statement for the interactive engine's materialization path
pub fn wrap_create_table_as(qualified_table: &str, select_sql: &str) -> String {
    format!("CREATE TABLE {} AS ({})", qualified_table, select_sql)
}

/// Wrap a statement for the batch engine's materialization path
pub fn wrap_create_external_table(table_id: &str, location: &str, select_sql: &str) -> String {
    format!(
        "CREATE EXTERNAL TABLE {} STORED AS parquet LOCATION '{}/{}/' AS ({})",
        table_id, location, table_id, select_sql
    )
}

/// Build the statement materializing a summary derived from an
/// already-materialized base table
///
/// Substitutes the `${tableId}` token, then wraps the result as a new
/// CREATE TABLE AS named by the deterministic summary id.
pub fn build_summary_query(summary: &SummaryDefinition, base_table_id: &str) -> String {
    let select_sql = summary.query.replace(TABLE_ID_TOKEN, base_table_id);
    wrap_create_table_as(&table_summary_id(base_table_id, &summary.id), &select_sql)
}

/// Paginated read against a materialized table
pub fn paginated_select(table_id: &str, page: PageSpec) -> String {
    format!(
        "SELECT * FROM {} LIMIT {} OFFSET {}",
        table_id,
        page.page_size(),
        page.offset()
    )
}

/// Row count of a materialized table
pub fn count_select(table_id: &str) -> String {
    format!("SELECT COUNT(1) AS total FROM {}", table_id)
}
