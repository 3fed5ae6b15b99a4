//! Canonical statement status and backend vocabulary mapping
//!
//! Callers only ever see the canonical vocabulary. The interactive
//! engine's native states translate; the batch engine reports
//! canonical terms directly by convention. Both mappings are total:
//! anything outside the documented vocabulary is an error, never a
//! silent default.

use serde::{Deserialize, Serialize};

use super::errors::{ExecutionError, ExecutionResult};

/// Row/size value meaning "unknown"
pub const UNKNOWN: i64 = -1;

/// Canonical execution state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatementState {
    Submitted,
    Picked,
    Started,
    Finished,
    Failed,
    Aborted,
}

impl StatementState {
    /// Terminal states never change again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StatementState::Finished | StatementState::Failed | StatementState::Aborted
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatementState::Submitted => "SUBMITTED",
            StatementState::Picked => "PICKED",
            StatementState::Started => "STARTED",
            StatementState::Finished => "FINISHED",
            StatementState::Failed => "FAILED",
            StatementState::Aborted => "ABORTED",
        }
    }

    /// Map an interactive-engine native state
    pub fn from_interactive(native: &str) -> ExecutionResult<Self> {
        match native {
            "QUEUED" => Ok(StatementState::Submitted),
            "RUNNING" => Ok(StatementState::Started),
            "SUCCEEDED" => Ok(StatementState::Finished),
            "FAILED" => Ok(StatementState::Failed),
            "CANCELLED" => Ok(StatementState::Aborted),
            other => Err(ExecutionError::UnknownNativeStatus {
                backend: "interactive",
                value: other.to_string(),
            }),
        }
    }

    /// Parse a batch-engine state (canonical by convention)
    pub fn from_batch(native: &str) -> ExecutionResult<Self> {
        match native {
            "SUBMITTED" => Ok(StatementState::Submitted),
            "PICKED" => Ok(StatementState::Picked),
            "STARTED" => Ok(StatementState::Started),
            "FINISHED" => Ok(StatementState::Finished),
            "FAILED" => Ok(StatementState::Failed),
            "ABORTED" => Ok(StatementState::Aborted),
            other => Err(ExecutionError::UnknownNativeStatus {
                backend: "batch",
                value: other.to_string(),
            }),
        }
    }
}

/// Snapshot of one statement execution, as reported to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementStatus {
    pub status: StatementState,
    pub duration_nanos: i64,
    /// Rows produced; -1 = unknown
    pub result_rows: i64,
    /// Result bytes; -1 = unknown
    pub result_size: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_change_reason: Option<String>,
}

impl StatementStatus {
    /// A bare status with everything else unknown
    pub fn of(status: StatementState) -> Self {
        Self {
            status,
            duration_nanos: 0,
            result_rows: UNKNOWN,
            result_size: UNKNOWN,
            error: None,
            error_category: None,
            state_change_reason: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// What a backend's describe call reports, before status mapping
///
/// The transport client traits return this; only the `status` string
/// differs in vocabulary between backends.
#[derive(Debug, Clone, Default)]
pub struct NativeExecutionState {
    pub status: String,
    pub duration_nanos: i64,
    pub result_rows: i64,
    pub result_size: i64,
    pub error: Option<String>,
    pub error_category: Option<String>,
    pub state_change_reason: Option<String>,
}

impl NativeExecutionState {
    pub fn of(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            duration_nanos: 0,
            result_rows: UNKNOWN,
            result_size: UNKNOWN,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interactive_mapping_is_total() {
        assert_eq!(
            StatementState::from_interactive("QUEUED").unwrap(),
            StatementState::Submitted
        );
        assert_eq!(
            StatementState::from_interactive("RUNNING").unwrap(),
            StatementState::Started
        );
        assert_eq!(
            StatementState::from_interactive("SUCCEEDED").unwrap(),
            StatementState::Finished
        );
        assert_eq!(
            StatementState::from_interactive("FAILED").unwrap(),
            StatementState::Failed
        );
        assert_eq!(
            StatementState::from_interactive("CANCELLED").unwrap(),
            StatementState::Aborted
        );
        assert!(matches!(
            StatementState::from_interactive("EXPLODED").unwrap_err(),
            ExecutionError::UnknownNativeStatus {
                backend: "interactive",
                ..
            }
        ));
    }

    #[test]
    fn test_batch_mapping_is_identity_over_canonical() {
        for state in [
            StatementState::Submitted,
            StatementState::Picked,
            StatementState::Started,
            StatementState::Finished,
            StatementState::Failed,
            StatementState::Aborted,
        ] {
            assert_eq!(StatementState::from_batch(state.as_str()).unwrap(), state);
        }
        assert!(StatementState::from_batch("RUNNING").is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!StatementState::Submitted.is_terminal());
        assert!(!StatementState::Picked.is_terminal());
        assert!(!StatementState::Started.is_terminal());
        assert!(StatementState::Finished.is_terminal());
        assert!(StatementState::Failed.is_terminal());
        assert!(StatementState::Aborted.is_terminal());
    }

    #[test]
    fn test_bare_status_has_unknown_counts() {
        let status = StatementStatus::of(StatementState::Started);
        assert_eq!(status.result_rows, UNKNOWN);
        assert_eq!(status.result_size, UNKNOWN);
        assert!(!status.is_terminal());
    }

    #[test]
    fn test_status_serializes_uppercase() {
        let status = StatementStatus::of(StatementState::Finished);
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"FINISHED\""));
    }
}
