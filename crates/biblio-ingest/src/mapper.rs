//! The source mapper: walks a document's entries and produces canonical
//! entries, driving alias resolution, the field handlers and crossref
//! synthesis.

use crate::driver::{AlsoSet, DriverConfig, HandlerKind};
use crate::handlers::{self, MapCtx};
use crate::resolver::{Resolution, resolve};
use crate::usermap::UserMap;
use biblio_model::{CanonicalEntry, EntryStore, Value, Warnings};
use biblio_xml::{XmlDocument, XmlElement};
use hashlink::LinkedHashMap;
use md5::{Digest, Md5};
use std::collections::BTreeSet;

/// Which entries to extract from a document.
#[derive(Debug, Clone, Copy)]
pub enum Wanted<'a> {
    /// Every top-level entry node, in document order.
    All,
    /// Only the requested citekeys.
    Keys(&'a [String]),
}

/// Maps source documents against one driver and an optional user map.
pub struct SourceMapper<'a> {
    driver: &'a DriverConfig,
    user: Option<&'a UserMap>,
}

impl<'a> SourceMapper<'a> {
    pub fn new(driver: &'a DriverConfig, user: Option<&'a UserMap>) -> Self {
        SourceMapper { driver, user }
    }

    /// Extract entries from a parsed document into `store`.
    ///
    /// Returns the requested keys that were not found (always empty in
    /// [`Wanted::All`] mode). Entries lacking an identity attribute and
    /// duplicate identities are skipped with a warning.
    pub fn extract(
        &self,
        doc: &XmlDocument,
        wanted: Wanted<'_>,
        store: &mut EntryStore,
        warnings: &mut Warnings,
    ) -> Vec<String> {
        match wanted {
            Wanted::All => {
                for node in doc.root.all_children() {
                    let Some(key) = identity(node) else {
                        warnings.push(
                            None,
                            format!(
                                "entry node '{}' without identity attribute, skipping",
                                node.qualified_name()
                            ),
                        );
                        continue;
                    };
                    // Duplicates are rejected before mapping: mapping has
                    // side effects (crossref synthesis inserts entries).
                    if store.contains(key) {
                        warn_duplicate(key, warnings);
                        continue;
                    }
                    let entry = self.map_node(node, key, store, warnings);
                    store.insert(entry, warnings);
                }
                Vec::new()
            }
            Wanted::Keys(keys) => {
                let mut remaining = Vec::new();
                for key in keys {
                    let folded = key.to_lowercase();
                    let matches: Vec<&XmlElement> = doc
                        .root
                        .all_children()
                        .into_iter()
                        .filter(|n| {
                            identity(n).is_some_and(|id| id.to_lowercase() == folded)
                        })
                        .collect();

                    match matches.as_slice() {
                        [] => remaining.push(key.clone()),
                        [node, rest @ ..] => {
                            if !rest.is_empty() {
                                warnings.push(
                                    Some(key),
                                    format!(
                                        "multiple source entries for key '{}', using the first",
                                        key
                                    ),
                                );
                            }
                            let id = identity(node).unwrap_or(key.as_str());
                            if store.contains(id) {
                                warn_duplicate(id, warnings);
                                continue;
                            }
                            let entry = self.map_node(node, id, store, warnings);
                            store.insert(entry, warnings);
                        }
                    }
                }
                remaining
            }
        }
    }

    /// Map one entry node into a canonical entry. Crossref synthesis may
    /// insert additional `data_only` entries into `store`.
    fn map_node(
        &self,
        node: &XmlElement,
        citekey: &str,
        store: &mut EntryStore,
        warnings: &mut Warnings,
    ) -> CanonicalEntry {
        // Explicit type attribute, falling back to the node's own tag name.
        let raw_type = node
            .get_attribute("type")
            .map_or_else(|| node.name.to_lowercase(), str::to_lowercase);

        let mut entry = CanonicalEntry::new(citekey, raw_type.clone(), raw_type.clone());
        let mut blocked: BTreeSet<String> = BTreeSet::new();
        let overwrite = self.user.is_some_and(|u| u.overwrite);

        // Group field nodes by raw tag, preserving document order.
        let mut grouped: LinkedHashMap<String, Vec<&XmlElement>> = LinkedHashMap::new();
        for field_node in node.all_children() {
            grouped
                .entry(field_node.name.to_lowercase())
                .or_insert_with(Vec::new)
                .push(field_node);
        }

        for (tag, nodes) in &grouped {
            match resolve(tag, &raw_type, self.user, self.driver) {
                Resolution::Ignored => {
                    tracing::debug!(tag, key = citekey, "no rule for field, ignoring");
                }
                Resolution::Dropped { block } => {
                    if let Some(field) = block {
                        blocked.insert(field);
                    }
                }
                Resolution::Mapped {
                    target,
                    handler,
                    also_set,
                } => {
                    if blocked.contains(&target) {
                        continue;
                    }

                    // The single dispatch site over the closed handler set.
                    match handler {
                        HandlerKind::Literal => {
                            let mut ctx = ctx(&mut entry, warnings, &mut blocked, overwrite);
                            handlers::literal(&mut ctx, &target, nodes);
                        }
                        HandlerKind::Verbatim => {
                            let mut ctx = ctx(&mut entry, warnings, &mut blocked, overwrite);
                            handlers::verbatim(&mut ctx, &target, nodes);
                        }
                        HandlerKind::List => {
                            let mut ctx = ctx(&mut entry, warnings, &mut blocked, overwrite);
                            handlers::list(&mut ctx, &target, nodes);
                        }
                        HandlerKind::Range => {
                            let mut ctx = ctx(&mut entry, warnings, &mut blocked, overwrite);
                            handlers::range(&mut ctx, &target, nodes);
                        }
                        HandlerKind::Date => {
                            let mut ctx = ctx(&mut entry, warnings, &mut blocked, overwrite);
                            handlers::date(&mut ctx, &target, nodes);
                        }
                        HandlerKind::Name => {
                            let mut ctx = ctx(&mut entry, warnings, &mut blocked, overwrite);
                            handlers::name(&mut ctx, &target, nodes);
                        }
                        HandlerKind::Publisher => {
                            let mut ctx = ctx(&mut entry, warnings, &mut blocked, overwrite);
                            handlers::publisher(&mut ctx, &target, nodes);
                        }
                        HandlerKind::Event => {
                            let mut ctx = ctx(&mut entry, warnings, &mut blocked, overwrite);
                            handlers::event(&mut ctx, &target, nodes);
                        }
                        HandlerKind::Subject => {
                            let mut ctx = ctx(&mut entry, warnings, &mut blocked, overwrite);
                            handlers::subject(&mut ctx, &target, nodes);
                        }
                        HandlerKind::Identifier => {
                            let mut ctx = ctx(&mut entry, warnings, &mut blocked, overwrite);
                            handlers::identifier(&mut ctx, &target, nodes);
                        }
                        HandlerKind::PartOf => {
                            if let Some(container) = nodes.first() {
                                self.synthesize_crossref(
                                    &mut entry,
                                    container,
                                    &raw_type,
                                    store,
                                    warnings,
                                    &mut blocked,
                                    overwrite,
                                );
                            }
                        }
                    }

                    self.apply_also_set(
                        &also_set, tag, &mut entry, warnings, &mut blocked, overwrite,
                    );
                }
            }
        }

        // Entry-type aliasing is applied last, so its side effects take
        // precedence over fields already set from data (same policy).
        self.alias_entrytype(&raw_type, &mut entry, warnings, &mut blocked, overwrite);

        entry
    }

    fn apply_also_set(
        &self,
        actions: &[(String, AlsoSet)],
        raw_tag: &str,
        entry: &mut CanonicalEntry,
        warnings: &mut Warnings,
        blocked: &mut BTreeSet<String>,
        overwrite: bool,
    ) {
        for (field, action) in actions {
            match action {
                AlsoSet::Drop => {
                    entry.delete_field(field);
                    blocked.insert(field.clone());
                }
                AlsoSet::UseOriginalField => {
                    let value = Value::Literal(raw_tag.to_string());
                    ctx(entry, warnings, blocked, overwrite).write_policy(field, value);
                }
                AlsoSet::UseOriginalType => {
                    let value = Value::Literal(entry.origin_tag().to_string());
                    ctx(entry, warnings, blocked, overwrite).write_policy(field, value);
                }
                AlsoSet::SetLiteral(text) => {
                    let value = Value::Literal(text.clone());
                    ctx(entry, warnings, blocked, overwrite).write_policy(field, value);
                }
            }
        }
    }

    fn alias_entrytype(
        &self,
        raw_type: &str,
        entry: &mut CanonicalEntry,
        warnings: &mut Warnings,
        blocked: &mut BTreeSet<String>,
        overwrite: bool,
    ) {
        // User entry-type rules win over the driver's table.
        if let Some(rule) = self
            .user
            .and_then(|u| u.entrytype.get(&raw_type.to_lowercase()))
            .and_then(|rules| rules.iter().next())
        {
            if let Some(target) = rule.target() {
                entry.set_entrytype(target.to_lowercase());
            }
            let actions: Vec<(String, AlsoSet)> = rule
                .also_set()
                .iter()
                .map(|s| (s.field.to_lowercase(), AlsoSet::parse(&s.value)))
                .collect();
            self.apply_also_set(&actions, raw_type, entry, warnings, blocked, overwrite);
            return;
        }

        if let Some(alias) = self.driver.entrytype_alias(raw_type) {
            entry.set_entrytype(alias.aliasof.clone());
            let actions = alias.also_set.clone();
            self.apply_also_set(&actions, raw_type, entry, warnings, blocked, overwrite);
        }
    }

    /// Synthesize a `data_only` crossref entry from a nested part-of
    /// container.
    fn synthesize_crossref(
        &self,
        primary: &mut CanonicalEntry,
        container: &XmlElement,
        owner_type: &str,
        store: &mut EntryStore,
        warnings: &mut Warnings,
        blocked: &mut BTreeSet<String>,
        overwrite: bool,
    ) {
        // A blocked pointer field suppresses the whole synthesis, not just
        // the pointer: an unreferenced synthetic entry must not survive.
        if blocked.contains("crossref") {
            return;
        }
        // A remote reference only (no embedded data): nothing to map.
        if !container.has_elements() {
            return;
        }
        // For some owners the container is a meaningless placeholder.
        if self
            .driver
            .crossref_skip
            .iter()
            .any(|t| t.eq_ignore_ascii_case(owner_type))
        {
            return;
        }

        let Some(child) = container.all_children().into_iter().next() else {
            return;
        };

        let primary_key = primary.citekey().to_string();
        let synth_key = synthetic_key(&primary_key);

        if !store.contains(&synth_key) {
            let mut synthetic = self.map_node(child, &synth_key, store, warnings);
            synthetic.set_data_only(true);

            // Only a still-generic container type is overwritten from the
            // inferred-type table.
            if self
                .driver
                .crossref_generic
                .iter()
                .any(|t| t == synthetic.entrytype())
            {
                if let Some(inferred) = self.driver.crossref_types.get(&owner_type.to_lowercase())
                {
                    synthetic.set_entrytype(inferred.clone());
                }
            }

            store.insert(synthetic, warnings);
        }

        ctx(primary, warnings, blocked, overwrite)
            .write_data("crossref", Value::Literal(synth_key));
    }
}

/// The deterministic key for a synthesized crossref entry.
pub fn synthetic_key(primary_key: &str) -> String {
    format!("{}_{:x}", primary_key, Md5::digest(primary_key.as_bytes()))
}

fn warn_duplicate(key: &str, warnings: &mut Warnings) {
    warnings.push(
        Some(key),
        format!("duplicate entry key '{}' (case-insensitive), skipping", key),
    );
}

fn identity<'n>(node: &'n XmlElement) -> Option<&'n str> {
    node.get_attribute("about").or_else(|| node.get_attribute("id"))
}

fn ctx<'a>(
    entry: &'a mut CanonicalEntry,
    warnings: &'a mut Warnings,
    blocked: &'a mut BTreeSet<String>,
    overwrite: bool,
) -> MapCtx<'a> {
    MapCtx {
        entry,
        warnings,
        blocked,
        overwrite,
    }
}
