//! # Query Composer
//!
//! Assembles the staged CTE pipeline into one executable statement:
//!
//! `dataset_` → optional `prefilter_` → `policy_` → `filter_` → final
//! projection.
//!
//! Staging as CTEs keeps policy enforcement structurally separated
//! from user filters: the `filter_` stage selects from `policy_`, so
//! no input filter can see rows a denying policy excluded. The
//! pipeline is an ordered list of named fragments joined with a fixed
//! separator, never ad hoc concatenation.

pub mod composer;
pub mod cte;
pub mod errors;

pub use composer::{
    ComposedQuery, PageSpec, ParamStyle, QueryComposer, QueryRequest, SortDirection,
};
pub use cte::CtePipeline;
pub use errors::{QueryError, QueryResult};
