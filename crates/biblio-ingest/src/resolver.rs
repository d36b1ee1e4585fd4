//! The alias-resolution cascade.

use crate::driver::{AlsoSet, DriverConfig, DriverFieldRule, HandlerKind};
use crate::usermap::{UserMap, UserRule};

/// The outcome of resolving one raw field tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Map the field: write `target` via `handler`, then apply `also_set`.
    Mapped {
        target: String,
        handler: HandlerKind,
        also_set: Vec<(String, AlsoSet)>,
    },
    /// Drop the field. When `block` is set (the `NULL` sentinel as target),
    /// any later write to that field in this entry is also blocked.
    Dropped { block: Option<String> },
    /// No rule anywhere: the field is silently ignored.
    Ignored,
}

/// Decide the canonical target field, handler and side effects for one raw
/// tag, in this fixed order:
///
/// 1. a user per-entry-type rule whose type list contains `entry_type`
///    (case-insensitive),
/// 2. a user global rule,
/// 3. if a user rule table exists for the tag but nothing matched: drop with
///    no driver fallback,
/// 4. a driver rule (its type-specific alias beating its global alias),
/// 5. otherwise: ignore.
///
/// Rules within one tag are evaluated in declaration order, never hash
/// order. When a per-type rule's target conflicts with a different rule's
/// `also_set` for the same destination, resolution is last-writer-wins in
/// this declared precedence order: the winning rule's target write happens
/// first and a later `also_set` write then hits the normal
/// occupied-destination policy.
pub fn resolve(
    raw_tag: &str,
    entry_type: &str,
    user: Option<&UserMap>,
    driver: &DriverConfig,
) -> Resolution {
    let tag = raw_tag.to_lowercase();
    let driver_rule = driver.field_rule(&tag);

    if let Some(user) = user {
        // 1. Per-entry-type user rule.
        if let Some(rules) = user.field.get(&tag) {
            let matched = rules
                .iter()
                .filter(|r| !r.types().is_empty())
                .find(|r| r.applies_to(entry_type));
            if let Some(rule) = matched {
                return apply_user_rule(rule, &tag, driver_rule);
            }
        }

        // 2. Global user rule.
        if let Some(rule) = user.globalfield.get(&tag).and_then(|r| r.iter().next()) {
            return apply_user_rule(rule, &tag, driver_rule);
        }
        if let Some(rule) = user
            .field
            .get(&tag)
            .and_then(|rules| rules.iter().find(|r| r.types().is_empty()))
        {
            return apply_user_rule(rule, &tag, driver_rule);
        }

        // 3. A user table exists for this tag but nothing applied: the
        // field is dropped without falling back to the driver.
        if user.field.contains_key(&tag) || user.globalfield.contains_key(&tag) {
            return Resolution::Dropped { block: None };
        }
    }

    // 4. Driver rule, type-specific alias first.
    if let Some(rule) = driver_rule {
        let matched = rule
            .type_aliases
            .iter()
            .find(|ta| ta.types.iter().any(|t| t.eq_ignore_ascii_case(entry_type)));
        let (target, also_set) = match matched {
            Some(ta) => (ta.target.clone(), ta.also_set.clone()),
            None => (default_target(&tag, Some(rule)), Vec::new()),
        };
        return Resolution::Mapped {
            target,
            handler: rule.handler,
            also_set,
        };
    }

    // 5. Unknown fields are ignored by design.
    Resolution::Ignored
}

/// The target a tag maps to when no explicit alias applies.
fn default_target(tag: &str, driver_rule: Option<&DriverFieldRule>) -> String {
    driver_rule
        .and_then(|r| r.alias.clone())
        .unwrap_or_else(|| tag.to_string())
}

fn apply_user_rule(
    rule: &UserRule,
    tag: &str,
    driver_rule: Option<&DriverFieldRule>,
) -> Resolution {
    let also_set: Vec<(String, AlsoSet)> = rule
        .also_set()
        .iter()
        .map(|spec| (spec.field.to_lowercase(), AlsoSet::parse(&spec.value)))
        .collect();

    match rule.target() {
        // The NULL sentinel as target short-circuits: drop, and block any
        // later write to the field the tag would have produced.
        Some("NULL") => Resolution::Dropped {
            block: Some(default_target(tag, driver_rule)),
        },
        Some(target) => Resolution::Mapped {
            target: target.to_lowercase(),
            handler: driver_rule.map_or(HandlerKind::Literal, |r| r.handler),
            also_set,
        },
        None => Resolution::Mapped {
            target: default_target(tag, driver_rule),
            handler: driver_rule.map_or(HandlerKind::Literal, |r| r.handler),
            also_set,
        },
    }
}
