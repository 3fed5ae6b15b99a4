//! Policy evaluation against a user context
//!
//! `Policy::execute` returns `"TRUE"`, `"FALSE"`, or the AND-joined
//! resolved action predicates. Every rule must independently evaluate
//! to PERMIT for the policy to permit; anything else denies. Denial is
//! the literal predicate `FALSE`, never an error.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::context::UserContext;
use crate::filter::condition::escape_literal;

use super::types::{Condition, Effect, Policy, Rule};
use super::ROLE_PLACEHOLDER;

/// Resolves a placeholder variable name (the part inside `${...}`) to
/// a literal value from the caller's environment
pub type PlaceholderResolver<'a> = dyn Fn(&str) -> Option<String> + 'a;

/// `${name}` occurrences inside action templates and match entries
fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\$\{([a-z_]+)\}$").expect("valid pattern"))
}

/// Standard resolver over the well-known user-context attributes
pub fn context_resolver(ctx: &UserContext) -> impl Fn(&str) -> Option<String> + '_ {
    move |name| match name {
        "token" => ctx.auth_token.clone(),
        "username" => Some(ctx.username.clone()),
        "caseload" => ctx.active_caseload.clone(),
        _ => None,
    }
}

impl Policy {
    /// Evaluate this policy for the given user
    ///
    /// Fail-closed over the rule list: every rule must yield PERMIT.
    /// On permission the action templates are resolved and AND-joined;
    /// an empty action list permits everything (`TRUE`). A placeholder
    /// the resolver cannot supply denies rather than producing broken
    /// SQL.
    pub fn execute(&self, ctx: &UserContext, resolver: &PlaceholderResolver<'_>) -> String {
        for rule in &self.rules {
            if !rule_permits(rule, ctx, resolver) {
                return "FALSE".to_string();
            }
        }

        if self.actions.is_empty() {
            return "TRUE".to_string();
        }

        let mut predicates = Vec::with_capacity(self.actions.len());
        for action in &self.actions {
            match resolve_action(action, resolver) {
                Some(predicate) => predicates.push(predicate),
                None => return "FALSE".to_string(),
            }
        }
        predicates.join(" AND ")
    }
}

fn rule_permits(rule: &Rule, ctx: &UserContext, resolver: &PlaceholderResolver<'_>) -> bool {
    rule.effect == Effect::Permit
        && rule
            .conditions
            .iter()
            .all(|condition| condition_holds(condition, ctx, resolver))
}

fn condition_holds(
    condition: &Condition,
    ctx: &UserContext,
    resolver: &PlaceholderResolver<'_>,
) -> bool {
    let match_ok = match &condition.match_any {
        Some(entries) => match_holds(entries, ctx, resolver),
        None => condition.exists.is_some(),
    };
    let exists_ok = match &condition.exists {
        Some(attributes) => attributes.iter().all(|a| attribute_present(a, ctx)),
        None => condition.match_any.is_some(),
    };
    match_ok && exists_ok
}

/// Role lists use any-match semantics; all other lists must resolve to
/// a single distinct literal
fn match_holds(entries: &[String], ctx: &UserContext, resolver: &PlaceholderResolver<'_>) -> bool {
    if entries.iter().any(|e| e == ROLE_PLACEHOLDER) {
        return entries
            .iter()
            .filter(|e| e.as_str() != ROLE_PLACEHOLDER)
            .any(|role| ctx.has_role(role));
    }

    let mut distinct = BTreeSet::new();
    for entry in entries {
        match resolve_entry(entry, resolver) {
            Some(value) => {
                distinct.insert(value);
            }
            None => return false,
        }
    }
    distinct.len() == 1
}

/// A `${name}` entry resolves through the resolver; anything else is
/// the policy's declared literal
fn resolve_entry(entry: &str, resolver: &PlaceholderResolver<'_>) -> Option<String> {
    match placeholder_pattern().captures(entry) {
        Some(captures) => resolver(&captures[1]),
        None => Some(entry.to_string()),
    }
}

fn attribute_present(attribute: &str, ctx: &UserContext) -> bool {
    match attribute {
        "${token}" => ctx.auth_token.is_some(),
        "${role}" => ctx.has_any_role(),
        "${caseload}" => ctx.active_caseload.is_some(),
        "${caseloads}" => !ctx.caseloads.is_empty(),
        _ => false,
    }
}

/// Substitute every `${name}` in an action template with a quoted,
/// escaped literal
fn resolve_action(action: &str, resolver: &PlaceholderResolver<'_>) -> Option<String> {
    let mut resolved = String::with_capacity(action.len());
    let mut rest = action;
    while let Some(start) = rest.find("${") {
        let end = rest[start..].find('}')? + start;
        resolved.push_str(&rest[..start]);
        let name = &rest[start + 2..end];
        let value = resolver(name)?;
        resolved.push('\'');
        resolved.push_str(&escape_literal(&value));
        resolved.push('\'');
        rest = &rest[end + 1..];
    }
    resolved.push_str(rest);
    Some(resolved)
}
