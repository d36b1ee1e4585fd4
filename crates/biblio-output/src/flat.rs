//! The flat-text output encoder.
//!
//! Renders canonical entries as `@TYPE{key, field = {value}, ...}` records.
//! Rendering runs in category passes (names, lists, dates, literals, ranges,
//! verbatim, keywords) over a working copy of each entry; date and range
//! fields are consumed as they are rendered so a later pass cannot emit them
//! twice. Literal values matching a configured abbreviation are substituted
//! by the bare macro id, and every substitution is recorded so the caller
//! can emit matching `@STRING` definitions.

use std::collections::BTreeSet;

use biblio_model::{AnnotationStore, CanonicalEntry, EntryStore, Range, Value, Warnings};

use crate::error::{Error, Result};
use crate::options::{Encoding, FlatOptions};

/// One rendered entry plus the working copy it was rendered from, with the
/// consumed fields removed.
#[derive(Debug)]
pub struct RenderedEntry {
    pub text: String,
    pub remaining: CanonicalEntry,
}

#[derive(Debug)]
struct RenderedField {
    name: String,
    text: String,
    /// Emitted without braces (a macro id).
    bare: bool,
    /// `(pseudo-field-name, value)` pairs emitted right after this field.
    annotations: Vec<(String, String)>,
}

impl RenderedField {
    fn braced(name: &str, text: impl Into<String>) -> Self {
        RenderedField {
            name: name.to_string(),
            text: text.into(),
            bare: false,
            annotations: Vec::new(),
        }
    }

    fn bare(name: &str, text: impl Into<String>) -> Self {
        RenderedField {
            name: name.to_string(),
            text: text.into(),
            bare: true,
            annotations: Vec::new(),
        }
    }
}

/// Encodes entries into the flat-text form.
#[derive(Debug)]
pub struct FlatEncoder {
    opts: FlatOptions,
    used: BTreeSet<String>,
}

impl FlatEncoder {
    pub fn new(opts: FlatOptions) -> Self {
        FlatEncoder {
            opts,
            used: BTreeSet::new(),
        }
    }

    /// Encode every entry in document order. Resets the used-macro set: the
    /// set always describes the most recent full pass.
    pub fn encode(
        &mut self,
        store: &EntryStore,
        annotations: &AnnotationStore,
        warnings: &mut Warnings,
    ) -> String {
        self.used.clear();
        let mut blocks = Vec::new();
        for key in store.keys_in_order() {
            if let Some(entry) = store.get(key) {
                blocks.push(self.render_entry(entry.clone(), annotations, warnings).text);
            }
        }
        blocks.join("\n")
    }

    /// Encode one entry by key.
    pub fn encode_key(
        &mut self,
        store: &EntryStore,
        key: &str,
        annotations: &AnnotationStore,
        warnings: &mut Warnings,
    ) -> Result<RenderedEntry> {
        let entry = store
            .get(key)
            .ok_or_else(|| Error::UnknownKey(key.to_string()))?;
        Ok(self.render_entry(entry.clone(), annotations, warnings))
    }

    /// The macro ids substituted since the last full [`FlatEncoder::encode`].
    pub fn used_macros(&self) -> &BTreeSet<String> {
        &self.used
    }

    /// `@STRING` definitions for every macro substituted in the last pass.
    pub fn preamble(&self) -> String {
        let mut out = String::new();
        for id in &self.used {
            let def = self
                .opts
                .macros
                .iter()
                .find(|m| &m.id == id)
                .and_then(|m| m.values.first());
            if let Some(value) = def {
                out.push_str(&format!(
                    "@{}{{{} = {{{}}}}}\n",
                    self.opts.casing.apply("string"),
                    id,
                    value
                ));
            }
        }
        out
    }

    /// Render one entry. The caller passes a working copy; consumed fields
    /// (dates, ranges) are removed from it and the rest left in place.
    pub fn render_entry(
        &mut self,
        mut entry: CanonicalEntry,
        annotations: &AnnotationStore,
        warnings: &mut Warnings,
    ) -> RenderedEntry {
        let key = entry.citekey().to_string();
        let field_order = entry.field_names();
        let mut fields: Vec<RenderedField> = Vec::new();

        if entry.is_data_only() && !entry.has_field("options") {
            fields.push(RenderedField::braced("options", "dataonly"));
        }

        // Names.
        for name in &field_order {
            if let Some(Value::NameList(list)) = entry.field(name) {
                let mut text = list
                    .names
                    .iter()
                    .map(|n| n.namestring().to_string())
                    .collect::<Vec<_>>()
                    .join(" and ");
                if list.more_names {
                    if !text.is_empty() {
                        text.push_str(" and ");
                    }
                    text.push_str("others");
                }
                let mut field = RenderedField::braced(name, text);
                field.annotations = annotation_pairs(
                    annotations,
                    &key,
                    name,
                    list.names.len(),
                    &["family", "given"],
                );
                fields.push(field);
            }
        }

        // Lists.
        for name in &field_order {
            if let Some(Value::List(items)) = entry.field(name) {
                let mut field = RenderedField::braced(name, items.join(" and "));
                field.annotations =
                    annotation_pairs(annotations, &key, name, items.len(), &[]);
                fields.push(field);
            }
        }

        // Dates, consumed.
        for name in &field_order {
            if matches!(entry.field(name), Some(Value::Date(_)))
                && let Some(Value::Date(parts)) = entry.take_field(name)
            {
                fields.push(RenderedField::braced(name, parts.encode()));
            }
        }

        // Literals; the keywords field is held back for the final pass.
        for name in &field_order {
            if name == "keywords" {
                continue;
            }
            if let Some(Value::Literal(text)) = entry.field(name) {
                let mut field = match self.find_macro(text) {
                    Some(id) => {
                        self.used.insert(id.clone());
                        RenderedField::bare(name, id)
                    }
                    None => RenderedField::braced(name, text.clone()),
                };
                field.annotations = annotation_pairs(annotations, &key, name, 0, &[]);
                fields.push(field);
            }
        }

        // Ranges, consumed.
        for name in &field_order {
            if matches!(entry.field(name), Some(Value::RangeList(_)))
                && let Some(Value::RangeList(ranges)) = entry.take_field(name)
            {
                let mut field = RenderedField::braced(name, Range::render_list(&ranges));
                field.annotations =
                    annotation_pairs(annotations, &key, name, ranges.len(), &[]);
                fields.push(field);
            }
        }

        // Verbatim, never macro-substituted.
        for name in &field_order {
            if let Some(Value::Verbatim(text)) = entry.field(name) {
                fields.push(RenderedField::braced(name, text.clone()));
            }
        }

        // Keywords close the record.
        if let Some(Value::Literal(keywords)) = entry.field("keywords") {
            fields.push(RenderedField::braced("keywords", keywords.clone()));
        }

        let fields = self.order_fields(fields);
        let text = self.compose(&key, entry.entrytype(), fields, warnings);
        RenderedEntry {
            text,
            remaining: entry,
        }
    }

    /// Configured fields first in configured order, the rest sorted.
    fn order_fields(&self, mut fields: Vec<RenderedField>) -> Vec<RenderedField> {
        let mut ordered = Vec::with_capacity(fields.len());
        for wanted in &self.opts.field_order {
            if let Some(pos) = fields.iter().position(|f| &f.name == wanted) {
                ordered.push(fields.remove(pos));
            }
        }
        // Keywords close the record even among sorted leftovers.
        let keywords = fields
            .iter()
            .position(|f| f.name == "keywords")
            .map(|pos| fields.remove(pos));
        fields.sort_by(|a, b| a.name.cmp(&b.name));
        ordered.extend(fields);
        ordered.extend(keywords);
        ordered
    }

    fn compose(
        &self,
        key: &str,
        entrytype: &str,
        mut fields: Vec<RenderedField>,
        warnings: &mut Warnings,
    ) -> String {
        if matches!(self.opts.encoding, Encoding::Ascii) {
            for field in &mut fields {
                if field.text.is_ascii() {
                    continue;
                }
                match self.opts.escape {
                    Some(escape) => {
                        tracing::debug!(
                            key,
                            field = field.name.as_str(),
                            "re-encoding non-ASCII value for target encoding"
                        );
                        field.text = escape(&field.text);
                    }
                    None => warnings.push(
                        Some(key),
                        format!(
                            "field '{}' contains non-ASCII text and no escape table is configured",
                            field.name
                        ),
                    ),
                }
            }
        }

        let width = fields
            .iter()
            .flat_map(|f| {
                std::iter::once(self.opts.casing.apply(&f.name).chars().count()).chain(
                    f.annotations
                        .iter()
                        .map(|(n, _)| self.opts.casing.apply(n).chars().count()),
                )
            })
            .max()
            .unwrap_or(0);

        let mut out = format!("@{}{{{},\n", self.opts.casing.apply(entrytype), key);
        for field in &fields {
            let label = self.opts.casing.apply(&field.name);
            if field.bare {
                out.push_str(&format!("  {:<width$} = {},\n", label, field.text));
            } else {
                out.push_str(&format!("  {:<width$} = {{{}}},\n", label, field.text));
            }
            for (name, value) in &field.annotations {
                let label = self.opts.casing.apply(name);
                out.push_str(&format!("  {:<width$} = {{{}}},\n", label, value));
            }
        }
        out.push_str("}\n");
        out
    }

    fn find_macro(&self, text: &str) -> Option<String> {
        self.opts
            .macros
            .iter()
            .find(|m| m.values.iter().any(|v| v == text))
            .map(|m| m.id.clone())
    }
}

/// Collapse the annotations attached to one field into pseudo-field pairs.
///
/// Grouped by annotation name into `field+an:name`; each value is a `; `
/// joined list of segments: a bare value for field scope, `item=value` for
/// item scope, `item:part=value` for part scope.
fn annotation_pairs(
    store: &AnnotationStore,
    key: &str,
    field: &str,
    items: usize,
    parts: &[&str],
) -> Vec<(String, String)> {
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();

    let mut add = |grouped: &mut Vec<(String, Vec<String>)>, name: &str, segment: String| {
        match grouped.iter_mut().find(|(n, _)| n == name) {
            Some((_, segments)) => segments.push(segment),
            None => grouped.push((name.to_string(), vec![segment])),
        }
    };

    for ann in store.lookup(key, field, None, None, None, None) {
        add(&mut grouped, &ann.name, ann.value.clone());
    }
    for i in 1..=items {
        let item = i.to_string();
        for ann in store.lookup(key, field, Some(&item), None, None, None) {
            add(&mut grouped, &ann.name, format!("{}={}", item, ann.value));
        }
        for part in parts {
            for ann in store.lookup(key, field, Some(&item), Some(part), None, None) {
                add(
                    &mut grouped,
                    &ann.name,
                    format!("{}:{}={}", item, part, ann.value),
                );
            }
        }
    }

    grouped
        .into_iter()
        .map(|(name, segments)| (format!("{}+an:{}", field, name), segments.join("; ")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use biblio_model::{Annotation, DateParts, Name, NameList};
    use crate::options::Casing;

    fn basic_entry() -> CanonicalEntry {
        let mut entry = CanonicalEntry::new("Smith2020", "book", "book");
        entry.set_field(
            "author",
            Value::NameList(NameList::new(vec![Name::new(
                Some("John".into()),
                Some("Smith".into()),
            )])),
        );
        entry.set_field("title", Value::Literal("A Title".into()));
        entry
    }

    fn render(entry: CanonicalEntry) -> (String, CanonicalEntry) {
        let mut encoder = FlatEncoder::new(FlatOptions::default());
        let mut warnings = Warnings::new();
        let rendered = encoder.render_entry(entry, &AnnotationStore::new(), &mut warnings);
        (rendered.text, rendered.remaining)
    }

    #[test]
    fn test_basic_record_shape() {
        let (text, _) = render(basic_entry());
        assert_eq!(
            text,
            "@book{Smith2020,\n  author = {Smith, John},\n  title  = {A Title},\n}\n"
        );
    }

    #[test]
    fn test_dates_and_ranges_are_consumed() {
        let mut entry = basic_entry();
        entry.set_field(
            "date",
            Value::Date(DateParts::decode("2020-04").unwrap()),
        );
        entry.set_field(
            "pages",
            Value::RangeList(Range::parse_list("1-10,15")),
        );

        let (text, remaining) = render(entry);
        assert!(text.contains("date   = {2020-04},"));
        assert!(text.contains("pages  = {1-10,15},"));
        assert!(!remaining.has_field("date"));
        assert!(!remaining.has_field("pages"));
        assert!(remaining.has_field("title"));
    }

    #[test]
    fn test_more_names_renders_others() {
        let mut entry = basic_entry();
        let mut list = NameList::new(vec![Name::new(Some("John".into()), Some("Smith".into()))]);
        list.more_names = true;
        entry.set_field("author", Value::NameList(list));

        let (text, _) = render(entry);
        assert!(text.contains("author = {Smith, John and others},"));
    }

    #[test]
    fn test_macro_substitution_and_preamble() {
        let mut entry = CanonicalEntry::new("k", "book", "book");
        entry.set_field("month", Value::Literal("4".into()));

        let mut encoder = FlatEncoder::new(FlatOptions::default());
        let mut warnings = Warnings::new();
        let rendered = encoder.render_entry(entry, &AnnotationStore::new(), &mut warnings);

        assert!(rendered.text.contains("month = apr,"));
        assert!(encoder.used_macros().contains("apr"));
        assert_eq!(encoder.preamble(), "@string{apr = {4}}\n");
    }

    #[test]
    fn test_verbatim_is_never_substituted() {
        let mut entry = CanonicalEntry::new("k", "book", "book");
        entry.set_field("url", Value::Verbatim("4".into()));

        let (text, _) = render(entry);
        assert!(text.contains("url = {4},"));
    }

    #[test]
    fn test_keywords_emitted_last() {
        let mut entry = basic_entry();
        entry.set_field("keywords", Value::Literal("alpha,beta".into()));
        entry.set_field("note", Value::Literal("see also".into()));

        let (text, _) = render(entry);
        let keywords_at = text.find("keywords").unwrap();
        let note_at = text.find("note").unwrap();
        assert!(note_at < keywords_at);
    }

    #[test]
    fn test_configured_order_then_sorted_leftovers() {
        let mut entry = CanonicalEntry::new("k", "book", "book");
        entry.set_field("zzz", Value::Literal("z".into()));
        entry.set_field("note", Value::Literal("n".into()));
        entry.set_field("title", Value::Literal("t".into()));

        let (text, _) = render(entry);
        let title_at = text.find("title").unwrap();
        let note_at = text.find("note").unwrap();
        let zzz_at = text.find("zzz").unwrap();
        assert!(title_at < note_at && note_at < zzz_at);
    }

    #[test]
    fn test_upper_casing() {
        let mut opts = FlatOptions::default();
        opts.casing = Casing::Upper;
        let mut encoder = FlatEncoder::new(opts);
        let mut warnings = Warnings::new();
        let rendered =
            encoder.render_entry(basic_entry(), &AnnotationStore::new(), &mut warnings);

        assert!(rendered.text.starts_with("@BOOK{Smith2020,"));
        assert!(rendered.text.contains("AUTHOR = {Smith, John},"));
    }

    #[test]
    fn test_ascii_fallback_without_escape_warns() {
        let mut entry = CanonicalEntry::new("k", "book", "book");
        entry.set_field("title", Value::Literal("Über Titel".into()));

        let mut opts = FlatOptions::default();
        opts.encoding = Encoding::Ascii;
        let mut encoder = FlatEncoder::new(opts);
        let mut warnings = Warnings::new();
        let rendered = encoder.render_entry(entry, &AnnotationStore::new(), &mut warnings);

        assert!(rendered.text.contains("{Über Titel}"));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_ascii_fallback_with_escape() {
        fn strip_non_ascii(s: &str) -> String {
            s.chars().filter(char::is_ascii).collect()
        }

        let mut entry = CanonicalEntry::new("k", "book", "book");
        entry.set_field("title", Value::Literal("Über".into()));

        let mut opts = FlatOptions::default();
        opts.encoding = Encoding::Ascii;
        opts.escape = Some(strip_non_ascii);
        let mut encoder = FlatEncoder::new(opts);
        let mut warnings = Warnings::new();
        let rendered = encoder.render_entry(entry, &AnnotationStore::new(), &mut warnings);

        assert!(rendered.text.contains("{ber}"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_data_only_entry_gets_options_field() {
        let mut entry = CanonicalEntry::new("k", "mvbook", "book");
        entry.set_field("title", Value::Literal("Series".into()));
        entry.set_data_only(true);

        let (text, _) = render(entry);
        assert!(text.contains("options = {dataonly},"));
    }

    #[test]
    fn test_annotation_pseudo_fields() {
        let mut entry = basic_entry();
        let mut annotations = AnnotationStore::new();
        annotations.annotate(
            "Smith2020",
            "author",
            None,
            None,
            None,
            None,
            Annotation {
                name: "default".into(),
                value: "corresponding".into(),
                literal: false,
            },
        );
        annotations.annotate(
            "Smith2020",
            "author",
            Some("1"),
            Some("family"),
            None,
            None,
            Annotation {
                name: "default".into(),
                value: "student".into(),
                literal: true,
            },
        );

        let mut encoder = FlatEncoder::new(FlatOptions::default());
        let mut warnings = Warnings::new();
        let rendered = encoder.render_entry(entry.clone(), &annotations, &mut warnings);

        assert!(
            rendered
                .text
                .contains("author+an:default = {corresponding; 1:family=student},")
        );

        entry.set_field("extra", Value::Literal("x".into()));
        let rendered = encoder.render_entry(entry, &annotations, &mut warnings);
        assert!(rendered.text.contains("author+an:default"));
    }

    #[test]
    fn test_encode_key_unknown() {
        let store = EntryStore::new();
        let mut encoder = FlatEncoder::new(FlatOptions::default());
        let mut warnings = Warnings::new();
        let result = encoder.encode_key(&store, "nope", &AnnotationStore::new(), &mut warnings);
        assert!(matches!(result, Err(Error::UnknownKey(_))));
    }

    #[test]
    fn test_full_pass_joins_with_blank_line() {
        let mut store = EntryStore::new();
        let mut warnings = Warnings::new();
        store.insert(basic_entry(), &mut warnings);
        let mut second = CanonicalEntry::new("Other", "article", "article");
        second.set_field("title", Value::Literal("T".into()));
        store.insert(second, &mut warnings);

        let mut encoder = FlatEncoder::new(FlatOptions::default());
        let text = encoder.encode(&store, &AnnotationStore::new(), &mut warnings);

        assert!(text.contains("}\n\n@article{Other,"));
    }
}
