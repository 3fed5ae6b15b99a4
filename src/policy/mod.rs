//! # Policy Evaluator
//!
//! Declarative row-level access policy: a policy document holds SQL
//! predicate templates (`actions`) gated by rules, each rule a set of
//! conditions evaluated against the caller's user context.
//!
//! Evaluation is a pure function of the policy document and the user
//! context. A denial always yields the literal predicate `FALSE`, so
//! the query composer can apply it unconditionally.

pub mod errors;
pub mod evaluator;
pub mod types;

pub use errors::{PolicyError, PolicyResult};
pub use evaluator::{context_resolver, PlaceholderResolver};
pub use types::{Condition, Effect, Policy, PolicyType, Rule};

/// Placeholder that stands for "a role the user holds" in `match`
/// condition lists
pub const ROLE_PLACEHOLDER: &str = "${role}";
