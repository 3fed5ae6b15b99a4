//! Observability for the report execution core
//!
//! This module provides:
//! - Structured logging (JSON)
//! - Typed statement lifecycle events
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//! 3. No async or background threads
//! 4. Deterministic output

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        // Verifies no panic
        log_event(Event::QuerySubmitted);
        log_event(Event::QueryFailed);
    }

    #[test]
    fn test_log_event_with_fields() {
        log_event_with_fields(
            Event::TableMaterialized,
            &[("table_id", "_1700000000000_00000000deadbeef")],
        );
    }
}
