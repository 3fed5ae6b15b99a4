//! External table identifier generation
//!
//! Table ids are the only shared mutable resource across concurrent
//! submissions. Uniqueness comes from entropy, not locking: a
//! millisecond timestamp plus 64 random bits. Ids stay within the SQL
//! identifier charset (leading underscore, then [0-9a-z_]).

use chrono::Utc;

/// Generate a fresh, globally-unique external table id
pub fn generate_new_external_table_id() -> String {
    format!(
        "_{}_{:016x}",
        Utc::now().timestamp_millis(),
        rand::random::<u64>()
    )
}

/// Derive the deterministic table id for a summary of a base table
///
/// The summary label is sanitized into the identifier charset so a
/// definition author cannot break the generated name.
pub fn table_summary_id(table_id: &str, summary_id: &str) -> String {
    let sanitized: String = summary_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}_{}", table_id, sanitized)
}
