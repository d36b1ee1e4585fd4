//! Typed field handlers.
//!
//! Each handler maps the raw source fragments for one resolved field into a
//! canonical [`Value`]. Handlers only ever mutate the entry passed to them,
//! through [`MapCtx`], which enforces the blocked-field set and the global
//! occupied-destination policy.

use crate::names::build_name;
use biblio_model::{CanonicalEntry, DateParts, NameList, Range, Value, Warnings};
use biblio_xml::XmlElement;
use std::collections::BTreeSet;

/// Fields that outrank later literal writes: once set (by the subject
/// handler's classification code), a plain literal for the same destination
/// is skipped.
const PRIORITY_FIELDS: &[&str] = &["librarycatalog"];

/// The catalog field a classification-code subject routes to.
const CATALOG_FIELD: &str = "librarycatalog";

/// Per-entry mapping context.
pub struct MapCtx<'a> {
    pub entry: &'a mut CanonicalEntry,
    pub warnings: &'a mut Warnings,
    /// Fields `NULL`ed for this entry; writes to them are dropped.
    pub blocked: &'a mut BTreeSet<String>,
    /// Occupied-destination policy: overwrite (true) or skip (false),
    /// either way with a warning.
    pub overwrite: bool,
}

impl MapCtx<'_> {
    /// Write a field from source data. Blocked fields are dropped silently;
    /// repeated data writes take the last value.
    pub fn write_data(&mut self, field: &str, value: Value) {
        if self.blocked.contains(field) {
            return;
        }
        self.entry.set_field(field, value);
    }

    /// Write a side-effect field, honoring the occupied-destination policy.
    pub fn write_policy(&mut self, field: &str, value: Value) {
        if self.blocked.contains(field) {
            return;
        }
        if self.entry.has_field(field) {
            let key = self.entry.citekey().to_string();
            if self.overwrite {
                self.warnings.push(
                    Some(&key),
                    format!("overwriting existing field '{}' in entry '{}'", field, key),
                );
                self.entry.set_field(field, value);
            } else {
                self.warnings.push(
                    Some(&key),
                    format!(
                        "not overwriting existing field '{}' in entry '{}'",
                        field, key
                    ),
                );
            }
        } else {
            self.entry.set_field(field, value);
        }
    }
}

/// Literal: the node's text content, verbatim.
///
/// One driver-specific exception: a priority field already set by a
/// higher-ranked handler is not overwritten from a plain literal.
pub fn literal(ctx: &mut MapCtx<'_>, target: &str, nodes: &[&XmlElement]) {
    if PRIORITY_FIELDS.contains(&target) && ctx.entry.has_field(target) {
        return;
    }
    if let Some(node) = nodes.first() {
        ctx.write_data(target, Value::Literal(node.text_or_empty().trim().to_string()));
    }
}

/// Verbatim: like literal, but never macro-substituted on output.
pub fn verbatim(ctx: &mut MapCtx<'_>, target: &str, nodes: &[&XmlElement]) {
    if let Some(node) = nodes.first() {
        ctx.write_data(
            target,
            Value::Verbatim(node.text_or_empty().trim().to_string()),
        );
    }
}

/// List: all matching text values, in source order.
pub fn list(ctx: &mut MapCtx<'_>, target: &str, nodes: &[&XmlElement]) {
    let mut items = Vec::new();
    for node in nodes {
        if node.has_elements() {
            for child in node.all_children() {
                push_trimmed(&mut items, child.text_or_empty());
            }
        } else {
            push_trimmed(&mut items, node.text_or_empty());
        }
    }
    if !items.is_empty() {
        ctx.write_data(target, Value::List(items));
    }
}

/// Range: comma-split, dash-separated start/end pairs.
pub fn range(ctx: &mut MapCtx<'_>, target: &str, nodes: &[&XmlElement]) {
    if let Some(node) = nodes.first() {
        let ranges = Range::parse_list(node.text_or_empty());
        ctx.write_data(target, Value::RangeList(ranges));
    }
}

/// Date: the shared codec's decode path. A grammar mismatch warns and
/// leaves the field unset; it never fails the entry.
pub fn date(ctx: &mut MapCtx<'_>, target: &str, nodes: &[&XmlElement]) {
    let Some(node) = nodes.first() else { return };
    let raw = node.text_or_empty().trim();
    match DateParts::decode(raw) {
        Ok(parts) => ctx.write_data(target, Value::Date(parts)),
        Err(err) => {
            let key = ctx.entry.citekey().to_string();
            ctx.warnings.push(
                Some(&key),
                format!("entry '{}' field '{}': {}", key, target, err),
            );
        }
    }
}

/// Name: build a structured name per name sub-node. A sub-node reading
/// `others` marks a truncated "et al." list instead of adding a name.
pub fn name(ctx: &mut MapCtx<'_>, target: &str, nodes: &[&XmlElement]) {
    let mut list = NameList::default();
    let key = ctx.entry.citekey().to_string();

    for node in nodes {
        let person_nodes = if node.has_elements() {
            node.all_children()
        } else {
            vec![*node]
        };
        for person in person_nodes {
            if person.text_or_empty().trim() == "others" {
                list.more_names = true;
                continue;
            }
            list.names.push(build_name(person, &key, ctx.warnings));
        }
    }

    if !list.names.is_empty() || list.more_names {
        ctx.write_data(target, Value::NameList(list));
    }
}

/// Publisher container: organization name and locality go to separate list
/// fields.
pub fn publisher(ctx: &mut MapCtx<'_>, target: &str, nodes: &[&XmlElement]) {
    let mut orgs = Vec::new();
    let mut places = Vec::new();
    for node in nodes {
        if node.has_elements() {
            for child in node.all_children() {
                if child.is_named("name") || child.is_named("organization") {
                    push_trimmed(&mut orgs, child.text_or_empty());
                } else if child.is_named("address") || child.is_named("place") {
                    push_trimmed(&mut places, child.text_or_empty());
                }
            }
        } else {
            push_trimmed(&mut orgs, node.text_or_empty());
        }
    }
    if !orgs.is_empty() {
        ctx.write_data(target, Value::List(orgs));
    }
    if !places.is_empty() {
        ctx.write_data("location", Value::List(places));
    }
}

/// Event container: the titled sub-node becomes the event-title field.
pub fn event(ctx: &mut MapCtx<'_>, target: &str, nodes: &[&XmlElement]) {
    for node in nodes {
        if let Some(title) = node.child_text("title") {
            ctx.write_data(target, Value::Literal(title.trim().to_string()));
            return;
        }
    }
}

/// Subject container: a classification-code sub-node wins and routes to the
/// catalog field (overriding any previously set value); otherwise free-text
/// subjects are joined into a brace-wrapped, comma-joined keyword string.
pub fn subject(ctx: &mut MapCtx<'_>, target: &str, nodes: &[&XmlElement]) {
    for node in nodes {
        for tag in ["classCode", "code"] {
            if let Some(code) = node.child_text(tag) {
                if !ctx.blocked.contains(CATALOG_FIELD) {
                    ctx.entry
                        .set_field(CATALOG_FIELD, Value::Literal(code.trim().to_string()));
                }
                return;
            }
        }
    }

    let keywords: Vec<String> = nodes
        .iter()
        .map(|n| n.text_or_empty().trim())
        .filter(|t| !t.is_empty())
        .map(|t| format!("{{{}}}", t))
        .collect();
    if !keywords.is_empty() {
        ctx.write_data(target, Value::Literal(keywords.join(",")));
    }
}

/// Identifier container: a URI sub-node becomes a URL; otherwise the text
/// is scanned for `ISSN/ISBN/DOI <value>` tokens, each routed to its own
/// field.
pub fn identifier(ctx: &mut MapCtx<'_>, target: &str, nodes: &[&XmlElement]) {
    for node in nodes {
        if let Some(uri) = node.child_text("uri").or_else(|| node.child_text("value")) {
            ctx.write_data(target, Value::Verbatim(uri.trim().to_string()));
            continue;
        }

        let text = node.text_or_empty().trim();
        let mut routed = false;
        for (prefix, field) in [("ISSN", "issn"), ("ISBN", "isbn"), ("DOI", "doi")] {
            if let Some(rest) = strip_token(text, prefix) {
                ctx.write_data(field, Value::Verbatim(rest.to_string()));
                routed = true;
                break;
            }
        }
        if !routed && (text.starts_with("http://") || text.starts_with("https://")) {
            ctx.write_data(target, Value::Verbatim(text.to_string()));
        }
    }
}

fn strip_token<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(prefix)?;
    let rest = rest.trim_start();
    if rest.is_empty() { None } else { Some(rest) }
}

fn push_trimmed(items: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        items.push(trimmed.to_string());
    }
}
