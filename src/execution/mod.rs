//! # Execution Adapters
//!
//! The dual-backend asynchronous statement lifecycle: submit, poll,
//! cancel, paginate, summarize. One `ExecutionAdapter` trait, two
//! implementations (interactive query engine; batch SQL execution
//! engine), each over an injected transport client so the core never
//! owns a network connection.
//!
//! Both backends map their native status vocabulary onto the single
//! canonical `StatementState` set. Polling is caller-driven: the
//! library exposes a `PollDecision` state machine, never a sleep loop.

pub mod adapter;
pub mod batch;
pub mod errors;
pub mod interactive;
pub mod poll;
pub mod status;

pub use adapter::{ExecutionAdapter, Row, StatementExecution};
pub use batch::{BatchClient, BatchEngineAdapter, BatchQueryContext, ClusterTarget};
pub use errors::{ErrorCategory, ExecutionError, ExecutionResult};
pub use interactive::{InteractiveClient, InteractiveEngineAdapter, InteractiveQueryContext};
pub use poll::{PollDecision, DEFAULT_POLL_INTERVAL};
pub use status::{NativeExecutionState, StatementState, StatementStatus};
