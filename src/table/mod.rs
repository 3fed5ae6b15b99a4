//! # Table Materializer
//!
//! Generates collision-resistant external table identifiers and the
//! CREATE TABLE AS wrapper SQL used to materialize async results and
//! derived summaries. The materialized tables themselves are owned by
//! the query engine's storage; this module only names and wraps.

pub mod ident;
pub mod materializer;

pub use ident::{generate_new_external_table_id, table_summary_id};
pub use materializer::{
    build_summary_query, count_select, paginated_select, wrap_create_external_table,
    wrap_create_table_as,
};
