//! Policy document types
//!
//! These deserialize straight from report definition documents. A
//! document is structurally validated once at load time via
//! `Policy::validate`; request-time evaluation assumes a valid
//! document and never errors.

use serde::{Deserialize, Serialize};

use super::errors::{PolicyError, PolicyResult};
use super::ROLE_PLACEHOLDER;

/// Well-known user-context attributes an `exists` condition may name
pub const KNOWN_ATTRIBUTES: [&str; 4] = ["${token}", "${role}", "${caseload}", "${caseloads}"];

/// Kind of access a policy governs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyType {
    /// Row-level narrowing predicate applied inside the query
    RowLevel,
    /// All-or-nothing access to the report
    Access,
}

/// Rule effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Permit,
    Deny,
}

/// A single condition inside a rule
///
/// `match` succeeds if the list names a role the user holds (when it
/// contains the role placeholder), or if every entry resolves to the
/// same literal. `exists` succeeds if every named attribute is present
/// on the user context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Condition {
    #[serde(
        rename = "match",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub match_any: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exists: Option<Vec<String>>,
}

impl Condition {
    /// Condition requiring the user to hold one of the given roles
    pub fn match_role(roles: &[&str]) -> Self {
        let mut entries = vec![ROLE_PLACEHOLDER.to_string()];
        entries.extend(roles.iter().map(|r| r.to_string()));
        Self {
            match_any: Some(entries),
            exists: None,
        }
    }

    /// Condition requiring all listed placeholders to resolve equal
    pub fn match_equal(entries: &[&str]) -> Self {
        Self {
            match_any: Some(entries.iter().map(|e| e.to_string()).collect()),
            exists: None,
        }
    }

    /// Condition requiring the named attributes to be present
    pub fn exists(attributes: &[&str]) -> Self {
        Self {
            match_any: None,
            exists: Some(attributes.iter().map(|a| a.to_string()).collect()),
        }
    }
}

/// A rule: its effect is granted only if all conditions hold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub effect: Effect,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Rule {
    pub fn permit(conditions: Vec<Condition>) -> Self {
        Self {
            effect: Effect::Permit,
            conditions,
        }
    }

    pub fn deny(conditions: Vec<Condition>) -> Self {
        Self {
            effect: Effect::Deny,
            conditions,
        }
    }
}

/// A policy document: predicate templates gated by rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    pub id: String,

    #[serde(rename = "type")]
    pub policy_type: PolicyType,

    /// SQL predicate templates, AND-joined when the policy permits.
    /// Empty means "permit all" (predicate `TRUE`).
    #[serde(default)]
    pub actions: Vec<String>,

    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl Policy {
    pub fn new(id: impl Into<String>, policy_type: PolicyType) -> Self {
        Self {
            id: id.into(),
            policy_type,
            actions: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.actions.push(action.into());
        self
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Structural validation, run once at definition load time
    pub fn validate(&self) -> PolicyResult<()> {
        for rule in &self.rules {
            for condition in &rule.conditions {
                match (&condition.match_any, &condition.exists) {
                    (None, None) => {
                        return Err(PolicyError::EmptyCondition(self.id.clone()));
                    }
                    (Some(entries), _) if entries.len() < 2 => {
                        return Err(PolicyError::ShortMatchList(self.id.clone()));
                    }
                    _ => {}
                }
                if let Some(attributes) = &condition.exists {
                    for attribute in attributes {
                        if !KNOWN_ATTRIBUTES.contains(&attribute.as_str()) {
                            return Err(PolicyError::UnknownAttribute {
                                policy: self.id.clone(),
                                attribute: attribute.clone(),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
