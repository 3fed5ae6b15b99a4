//! Caller-driven polling
//!
//! The library never sleeps. `PollDecision::next` inspects one status
//! snapshot and tells the caller whether to stop or come back after a
//! backoff; the caller owns the clock.

use std::time::Duration;

use super::status::StatementStatus;

/// Backoff suggested between status checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Outcome of inspecting one status snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollDecision {
    /// Terminal; stop polling
    Done(StatementStatus),
    /// Still in flight; check again after `backoff`
    Again {
        status: StatementStatus,
        backoff: Duration,
    },
}

impl PollDecision {
    /// Classify a snapshot using the default backoff
    pub fn next(status: StatementStatus) -> Self {
        Self::next_after(status, DEFAULT_POLL_INTERVAL)
    }

    /// Classify a snapshot with a caller-chosen backoff
    pub fn next_after(status: StatementStatus, backoff: Duration) -> Self {
        if status.is_terminal() {
            PollDecision::Done(status)
        } else {
            PollDecision::Again { status, backoff }
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, PollDecision::Done(_))
    }

    /// The snapshot this decision was made from
    pub fn status(&self) -> &StatementStatus {
        match self {
            PollDecision::Done(status) => status,
            PollDecision::Again { status, .. } => status,
        }
    }
}
