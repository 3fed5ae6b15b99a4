//! Typed statement lifecycle events
//!
//! Events are explicit and typed; adapters log them at the points the
//! backend is touched.

use std::fmt;

use super::Severity;

/// Observable events in the report execution core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Async statement submitted to a backend
    QuerySubmitted,
    /// Statement status described
    StatusPolled,
    /// Cancellation requested
    QueryCancelled,
    /// Async result table created
    TableMaterialized,
    /// Derived summary table created
    SummaryMaterialized,
    /// Request rejected before reaching a backend
    QueryRejected,
    /// Backend reported a terminal failure
    QueryFailed,
}

impl Event {
    /// Event name as logged
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::QuerySubmitted => "QUERY_SUBMITTED",
            Event::StatusPolled => "STATUS_POLLED",
            Event::QueryCancelled => "QUERY_CANCELLED",
            Event::TableMaterialized => "TABLE_MATERIALIZED",
            Event::SummaryMaterialized => "SUMMARY_MATERIALIZED",
            Event::QueryRejected => "QUERY_REJECTED",
            Event::QueryFailed => "QUERY_FAILED",
        }
    }

    /// Default log severity for this event
    pub fn severity(&self) -> Severity {
        match self {
            Event::QueryRejected => Severity::Warn,
            Event::QueryFailed => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
