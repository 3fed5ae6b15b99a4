//! reportdb - report query composition and execution core
//!
//! Composes staged CTE statements from report definitions, user
//! filters, and row-level access policies, then drives their
//! asynchronous execution and materialization across two SQL backends.

pub mod context;
pub mod definition;
pub mod execution;
pub mod filter;
pub mod observability;
pub mod policy;
pub mod query;
pub mod table;
