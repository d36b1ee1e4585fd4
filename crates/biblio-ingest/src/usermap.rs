//! User-supplied mapping configuration.
//!
//! Loaded at run time from JSON. User rules are always evaluated before
//! driver rules; within user rules, per-entry-type rules take precedence
//! over global ones. A rule is either a simple target-field string or a
//! structured object carrying a type list and `also_set` actions.

use crate::error::Result;
use serde::Deserialize;
use std::collections::HashMap;

/// The whole user mapping configuration.
#[derive(Debug, Default, Deserialize)]
pub struct UserMap {
    /// Per-entry-type field rules: raw tag → rules with type lists.
    #[serde(default)]
    pub field: HashMap<String, UserRules>,

    /// Global field rules: raw tag → rule.
    #[serde(default)]
    pub globalfield: HashMap<String, UserRules>,

    /// Entry-type rules: raw type → rule.
    #[serde(default)]
    pub entrytype: HashMap<String, UserRules>,

    /// Global overwrite policy for occupied destination fields:
    /// `true` = overwrite with a warning, `false` = skip with a warning.
    #[serde(default)]
    pub overwrite: bool,
}

/// One or more rules for a single tag, kept in declaration order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum UserRules {
    One(UserRule),
    Many(Vec<UserRule>),
}

impl UserRules {
    /// The rules in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &UserRule> {
        match self {
            UserRules::One(rule) => std::slice::from_ref(rule).iter(),
            UserRules::Many(rules) => rules.iter(),
        }
    }
}

/// A single user rule.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum UserRule {
    /// Shorthand: just the target field name (may be the `NULL` sentinel).
    Target(String),
    /// Structured rule.
    Detailed(UserRuleDetail),
}

/// The structured form of a user rule.
#[derive(Debug, Default, Deserialize)]
pub struct UserRuleDetail {
    /// Target field (may be the `NULL` sentinel). Absent means keep the
    /// driver-resolved target and only apply `also_set`.
    #[serde(default)]
    pub target: Option<String>,

    /// Entry types this rule applies to. Empty means this is not a
    /// per-type rule.
    #[serde(default)]
    pub pertype: Vec<String>,

    /// Side-effect field writes.
    #[serde(default)]
    pub also_set: Vec<AlsoSetSpec>,
}

/// One configured `also_set` action, before sentinel parsing.
#[derive(Debug, Clone, Deserialize)]
pub struct AlsoSetSpec {
    pub field: String,
    pub value: String,
}

impl UserRule {
    /// The rule's target field, if any.
    pub fn target(&self) -> Option<&str> {
        match self {
            UserRule::Target(t) => Some(t),
            UserRule::Detailed(d) => d.target.as_deref(),
        }
    }

    /// The rule's type list (empty for global rules).
    pub fn types(&self) -> &[String] {
        match self {
            UserRule::Target(_) => &[],
            UserRule::Detailed(d) => &d.pertype,
        }
    }

    /// The rule's `also_set` actions.
    pub fn also_set(&self) -> &[AlsoSetSpec] {
        match self {
            UserRule::Target(_) => &[],
            UserRule::Detailed(d) => &d.also_set,
        }
    }

    /// Whether this rule applies to `entry_type` (case-insensitive; global
    /// rules apply to every type).
    pub fn applies_to(&self, entry_type: &str) -> bool {
        let types = self.types();
        types.is_empty() || types.iter().any(|t| t.eq_ignore_ascii_case(entry_type))
    }
}

impl UserMap {
    /// Parse a user map from its JSON form. A malformed map is fatal.
    pub fn from_json(json: &str) -> Result<UserMap> {
        Ok(serde_json::from_str(json)?)
    }
}
