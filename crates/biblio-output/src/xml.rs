//! The XML-tree output encoder.
//!
//! Renders canonical entries as a structural XML document: names keep their
//! parts, range items keep their start/end split, dates keep per-side
//! markers. Annotations are overlaid as attributes on the element owning
//! the annotated field, item, or name part.

use std::borrow::Cow;

use biblio_model::{
    AnnotationStore, CanonicalEntry, DateParts, EntryStore, Range, Value, Warnings,
};
use quick_xml::escape::escape;

use crate::error::{Error, Result};
use crate::options::XmlOptions;

/// Fields holding a key pointer to another entry rather than data.
const REF_FIELDS: &[&str] = &["crossref", "xref"];

/// Encodes entries into the structural XML form.
#[derive(Debug, Default)]
pub struct XmlEncoder {
    opts: XmlOptions,
}

impl XmlEncoder {
    pub fn new(opts: XmlOptions) -> Self {
        XmlEncoder { opts }
    }

    /// Encode every entry in document order into a complete document.
    pub fn encode(
        &self,
        store: &EntryStore,
        annotations: &AnnotationStore,
        warnings: &mut Warnings,
    ) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<entries>\n");
        for key in store.keys_in_order() {
            if let Some(entry) = store.get(key) {
                out.push_str(&self.render_entry(entry, store, annotations, warnings, 1));
            }
        }
        out.push_str("</entries>\n");
        out
    }

    /// Encode one entry by key, as a standalone fragment.
    pub fn encode_key(
        &self,
        store: &EntryStore,
        key: &str,
        annotations: &AnnotationStore,
        warnings: &mut Warnings,
    ) -> Result<String> {
        let entry = store
            .get(key)
            .ok_or_else(|| Error::UnknownKey(key.to_string()))?;
        Ok(self.render_entry(entry, store, annotations, warnings, 0))
    }

    fn render_entry(
        &self,
        entry: &CanonicalEntry,
        store: &EntryStore,
        annotations: &AnnotationStore,
        warnings: &mut Warnings,
        depth: usize,
    ) -> String {
        let key = entry.citekey();
        let mut attrs = vec![
            ("id", key.to_string()),
            ("entrytype", entry.entrytype().to_string()),
        ];
        if entry.is_data_only() {
            attrs.push(("options", "dataonly".to_string()));
        }

        let mut out = open_line(depth, "entry", &attrs);
        for (field, value) in entry.fields() {
            out.push_str(&self.render_field(
                key,
                field,
                value,
                store,
                annotations,
                warnings,
                depth + 1,
            ));
        }
        out.push_str(&close_line(depth, "entry"));
        out
    }

    fn render_field(
        &self,
        key: &str,
        field: &str,
        value: &Value,
        store: &EntryStore,
        annotations: &AnnotationStore,
        warnings: &mut Warnings,
        depth: usize,
    ) -> String {
        match value {
            Value::Literal(text) if REF_FIELDS.contains(&field) => {
                self.render_ref(key, field, text, store, warnings, depth)
            }
            Value::Literal(text) | Value::Verbatim(text) => {
                let mut attrs = vec![("name", field.to_string())];
                attrs.extend(annotation_attrs(annotations, key, field, None, None));
                text_line(depth, "field", &attrs, text)
            }
            Value::List(items) => {
                let mut attrs = vec![("name", field.to_string())];
                attrs.extend(annotation_attrs(annotations, key, field, None, None));
                let mut out = open_line(depth, "list", &attrs);
                for (i, item) in items.iter().enumerate() {
                    let item_attrs = annotation_attrs(
                        annotations,
                        key,
                        field,
                        Some(&(i + 1).to_string()),
                        None,
                    );
                    out.push_str(&text_line(depth + 1, "item", &item_attrs, item));
                }
                out.push_str(&close_line(depth, "list"));
                out
            }
            Value::NameList(list) => {
                let mut attrs = vec![("type", field.to_string())];
                if list.more_names {
                    attrs.push(("morenames", "1".to_string()));
                }
                attrs.extend(annotation_attrs(annotations, key, field, None, None));
                let mut out = open_line(depth, "names", &attrs);
                for (i, name) in list.names.iter().enumerate() {
                    let item = (i + 1).to_string();
                    let name_attrs =
                        annotation_attrs(annotations, key, field, Some(&item), None);
                    out.push_str(&open_line(depth + 1, "name", &name_attrs));
                    if let Some(last) = &name.last {
                        out.push_str(&namepart(
                            annotations,
                            key,
                            field,
                            &item,
                            "family",
                            last,
                            name.last_initials.as_deref(),
                            depth + 2,
                        ));
                    }
                    if let Some(first) = &name.first {
                        out.push_str(&namepart(
                            annotations,
                            key,
                            field,
                            &item,
                            "given",
                            first,
                            name.first_initials.as_deref(),
                            depth + 2,
                        ));
                    }
                    out.push_str(&close_line(depth + 1, "name"));
                }
                out.push_str(&close_line(depth, "names"));
                out
            }
            Value::RangeList(ranges) => {
                let mut attrs = vec![("name", field.to_string())];
                attrs.extend(annotation_attrs(annotations, key, field, None, None));
                let mut out = open_line(depth, "range", &attrs);
                for (i, range) in ranges.iter().enumerate() {
                    let item_attrs = annotation_attrs(
                        annotations,
                        key,
                        field,
                        Some(&(i + 1).to_string()),
                        None,
                    );
                    out.push_str(&range_item(range, &item_attrs, depth + 1));
                }
                out.push_str(&close_line(depth, "range"));
                out
            }
            Value::Date(parts) => self.render_date(field, parts, depth),
        }
    }

    fn render_ref(
        &self,
        key: &str,
        field: &str,
        target: &str,
        store: &EntryStore,
        warnings: &mut Warnings,
        depth: usize,
    ) -> String {
        if self.opts.resolve_refs {
            return text_line(depth, "field", &[("name", field.to_string())], target);
        }
        if !store.contains(target) {
            warnings.push(
                Some(key),
                format!("{} target '{}' does not resolve to any entry", field, target),
            );
        }
        empty_line(
            depth,
            "field",
            &[("name", field.to_string()), ("target", target.to_string())],
        )
    }

    fn render_date(&self, field: &str, parts: &DateParts, depth: usize) -> String {
        let attrs: Vec<(&str, String)> = if field == "date" {
            Vec::new()
        } else {
            let datetype = field.strip_suffix("date").filter(|t| !t.is_empty());
            vec![("type", datetype.unwrap_or(field).to_string())]
        };

        // Compressed wildcard dates collapse to a single token, so they are
        // rendered textually even though they carry an end side.
        if parts.unspecified.is_some() || !parts.has_end() {
            return text_line(depth, "date", &attrs, &parts.clone().encode());
        }

        let mut out = open_line(depth, "date", &attrs);
        out.push_str(&text_line(
            depth + 1,
            "start",
            &[],
            &parts.start_only().encode(),
        ));
        match parts.end_only() {
            Some(end) => out.push_str(&text_line(depth + 1, "end", &[], &end.encode())),
            None => out.push_str(&empty_line(depth + 1, "end", &[])),
        }
        out.push_str(&close_line(depth, "date"));
        out
    }
}

fn namepart(
    annotations: &AnnotationStore,
    key: &str,
    field: &str,
    item: &str,
    part: &str,
    text: &str,
    initial: Option<&str>,
    depth: usize,
) -> String {
    let mut attrs = vec![("type", part.to_string())];
    if let Some(initial) = initial {
        attrs.push(("initial", initial.to_string()));
    }
    attrs.extend(annotation_attrs(annotations, key, field, Some(item), Some(part)));
    text_line(depth, "namepart", &attrs, text)
}

fn range_item(range: &Range, attrs: &[(&str, String)], depth: usize) -> String {
    match &range.end {
        None => text_line(depth, "item", attrs, &range.start),
        Some(end) => {
            let mut out = open_line(depth, "item", attrs);
            out.push_str(&text_line(depth + 1, "start", &[], &range.start));
            if end.is_empty() {
                out.push_str(&empty_line(depth + 1, "end", &[]));
            } else {
                out.push_str(&text_line(depth + 1, "end", &[], end));
            }
            out.push_str(&close_line(depth, "item"));
            out
        }
    }
}

fn annotation_attrs(
    annotations: &AnnotationStore,
    key: &str,
    field: &str,
    item: Option<&str>,
    part: Option<&str>,
) -> Vec<(&'static str, String)> {
    annotations
        .lookup(key, field, item, part, None, None)
        .iter()
        .map(|ann| {
            // Annotation names are user data, so they cannot become
            // attribute names directly; non-default names are folded into
            // the value instead.
            let value = if ann.name == "default" {
                ann.value.clone()
            } else {
                format!("{}={}", ann.name, ann.value)
            };
            ("annotation", value)
        })
        .collect()
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

fn attr_text(attrs: &[(&str, String)]) -> String {
    attrs
        .iter()
        .map(|(name, value)| format!(" {}=\"{}\"", name, esc(value)))
        .collect()
}

fn open_line(depth: usize, tag: &str, attrs: &[(&str, String)]) -> String {
    format!("{}<{}{}>\n", indent(depth), tag, attr_text(attrs))
}

fn close_line(depth: usize, tag: &str) -> String {
    format!("{}</{}>\n", indent(depth), tag)
}

fn empty_line(depth: usize, tag: &str, attrs: &[(&str, String)]) -> String {
    format!("{}<{}{}/>\n", indent(depth), tag, attr_text(attrs))
}

fn text_line(depth: usize, tag: &str, attrs: &[(&str, String)], text: &str) -> String {
    format!(
        "{}<{}{}>{}</{}>\n",
        indent(depth),
        tag,
        attr_text(attrs),
        esc(text),
        tag
    )
}

fn esc(text: &str) -> Cow<'_, str> {
    escape(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use biblio_model::{Annotation, Name, NameList};

    fn store_with(entry: CanonicalEntry) -> (EntryStore, Warnings) {
        let mut store = EntryStore::new();
        let mut warnings = Warnings::new();
        store.insert(entry, &mut warnings);
        (store, warnings)
    }

    fn encode_one(entry: CanonicalEntry) -> String {
        let key = entry.citekey().to_string();
        let (store, mut warnings) = store_with(entry);
        XmlEncoder::new(XmlOptions::default())
            .encode_key(&store, &key, &AnnotationStore::new(), &mut warnings)
            .unwrap()
    }

    #[test]
    fn test_basic_entry_shape() {
        let mut entry = CanonicalEntry::new("Smith2020", "book", "book");
        entry.set_field("title", Value::Literal("A Title".into()));

        let xml = encode_one(entry);
        assert_eq!(
            xml,
            "<entry id=\"Smith2020\" entrytype=\"book\">\n  <field name=\"title\">A Title</field>\n</entry>\n"
        );
    }

    #[test]
    fn test_text_and_attributes_escaped() {
        let mut entry = CanonicalEntry::new("k<1>", "book", "book");
        entry.set_field("title", Value::Literal("Q & A".into()));

        let xml = encode_one(entry);
        assert!(xml.contains("id=\"k&lt;1&gt;\""));
        assert!(xml.contains("<field name=\"title\">Q &amp; A</field>"));
    }

    #[test]
    fn test_names_with_parts_and_initials() {
        let mut entry = CanonicalEntry::new("k", "book", "book");
        let mut list = NameList::new(vec![Name::new(
            Some("Jean-Paul".into()),
            Some("Sartre".into()),
        )]);
        list.more_names = true;
        entry.set_field("author", Value::NameList(list));

        let xml = encode_one(entry);
        assert!(xml.contains("<names type=\"author\" morenames=\"1\">"));
        assert!(xml.contains("<namepart type=\"family\" initial=\"S\">Sartre</namepart>"));
        assert!(xml.contains("<namepart type=\"given\" initial=\"J-P\">Jean-Paul</namepart>"));
    }

    #[test]
    fn test_list_items() {
        let mut entry = CanonicalEntry::new("k", "book", "book");
        entry.set_field(
            "location",
            Value::List(vec!["Berlin".into(), "New York".into()]),
        );

        let xml = encode_one(entry);
        assert!(xml.contains("<list name=\"location\">"));
        assert!(xml.contains("<item>Berlin</item>"));
        assert!(xml.contains("<item>New York</item>"));
    }

    #[test]
    fn test_range_item_variants() {
        let mut entry = CanonicalEntry::new("k", "book", "book");
        entry.set_field(
            "pages",
            Value::RangeList(Range::parse_list("15,1-10,100-")),
        );

        let xml = encode_one(entry);
        assert!(xml.contains("<range name=\"pages\">"));
        assert!(xml.contains("<item>15</item>"));
        assert!(xml.contains("<start>1</start>"));
        assert!(xml.contains("<end>10</end>"));
        assert!(xml.contains("<start>100</start>"));
        assert!(xml.contains("<end/>"));
    }

    #[test]
    fn test_date_range_keeps_per_side_markers() {
        let mut entry = CanonicalEntry::new("k", "book", "book");
        let mut parts = DateParts::decode("2020-04/2021").unwrap();
        parts.uncertain = true;
        entry.set_field("date", Value::Date(parts));

        let xml = encode_one(entry);
        assert!(xml.contains("<date>\n"));
        assert!(xml.contains("<start>2020-04?</start>"));
        assert!(xml.contains("<end>2021</end>"));
    }

    #[test]
    fn test_open_date_range() {
        let mut entry = CanonicalEntry::new("k", "book", "book");
        entry.set_field("date", Value::Date(DateParts::decode("1999/").unwrap()));

        let xml = encode_one(entry);
        assert!(xml.contains("<start>1999</start>"));
        assert!(xml.contains("<end/>"));
    }

    #[test]
    fn test_unspecified_date_renders_single_token() {
        let mut entry = CanonicalEntry::new("k", "book", "book");
        let mut parts = DateParts::decode("1990/1999").unwrap();
        parts.unspecified = Some(biblio_model::Unspecified::YearInDecade);
        entry.set_field("date", Value::Date(parts));

        let xml = encode_one(entry);
        assert!(xml.contains("<date>199X</date>"));
    }

    #[test]
    fn test_urldate_type_attribute() {
        let mut entry = CanonicalEntry::new("k", "online", "webpage");
        entry.set_field("urldate", Value::Date(DateParts::decode("2024-01-15").unwrap()));

        let xml = encode_one(entry);
        assert!(xml.contains("<date type=\"url\">2024-01-15</date>"));
    }

    #[test]
    fn test_crossref_pointer_by_default() {
        let mut child = CanonicalEntry::new("k", "inbook", "booksection");
        child.set_field("crossref", Value::Literal("container1".into()));
        let container = CanonicalEntry::new("container1", "book", "book");

        let mut store = EntryStore::new();
        let mut warnings = Warnings::new();
        store.insert(child, &mut warnings);
        store.insert(container, &mut warnings);

        let xml = XmlEncoder::new(XmlOptions::default())
            .encode_key(&store, "k", &AnnotationStore::new(), &mut warnings)
            .unwrap();

        assert!(xml.contains("<field name=\"crossref\" target=\"container1\"/>"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_crossref_inline_when_resolved() {
        let mut entry = CanonicalEntry::new("k", "inbook", "booksection");
        entry.set_field("crossref", Value::Literal("container1".into()));
        let (store, mut warnings) = store_with(entry);

        let encoder = XmlEncoder::new(XmlOptions { resolve_refs: true });
        let xml = encoder
            .encode_key(&store, "k", &AnnotationStore::new(), &mut warnings)
            .unwrap();

        assert!(xml.contains("<field name=\"crossref\">container1</field>"));
    }

    #[test]
    fn test_unresolvable_pointer_warns() {
        let mut entry = CanonicalEntry::new("k", "inbook", "booksection");
        entry.set_field("crossref", Value::Literal("missing".into()));
        let (store, mut warnings) = store_with(entry);

        let xml = XmlEncoder::new(XmlOptions::default())
            .encode_key(&store, "k", &AnnotationStore::new(), &mut warnings)
            .unwrap();

        assert!(xml.contains("target=\"missing\""));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_annotation_attributes_overlaid() {
        let mut entry = CanonicalEntry::new("k", "book", "book");
        entry.set_field(
            "author",
            Value::NameList(NameList::new(vec![Name::new(
                Some("John".into()),
                Some("Smith".into()),
            )])),
        );

        let mut annotations = AnnotationStore::new();
        annotations.annotate(
            "k",
            "author",
            None,
            None,
            None,
            None,
            Annotation {
                name: "default".into(),
                value: "primary".into(),
                literal: false,
            },
        );
        annotations.annotate(
            "k",
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

        let (store, mut warnings) = store_with(entry);
        let xml = XmlEncoder::new(XmlOptions::default())
            .encode_key(&store, "k", &annotations, &mut warnings)
            .unwrap();

        assert!(xml.contains("<names type=\"author\" annotation=\"primary\">"));
        assert!(xml.contains(
            "<namepart type=\"family\" initial=\"S\" annotation=\"student\">Smith</namepart>"
        ));
    }

    #[test]
    fn test_full_document_wrapper() {
        let mut entry = CanonicalEntry::new("k", "book", "book");
        entry.set_field("title", Value::Literal("T".into()));
        let (store, mut warnings) = store_with(entry);

        let xml = XmlEncoder::new(XmlOptions::default()).encode(
            &store,
            &AnnotationStore::new(),
            &mut warnings,
        );

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<entries>\n"));
        assert!(xml.contains("  <entry id=\"k\" entrytype=\"book\">\n"));
        assert!(xml.ends_with("</entries>\n"));
    }

    #[test]
    fn test_data_only_marker() {
        let mut entry = CanonicalEntry::new("k", "mvbook", "book");
        entry.set_data_only(true);
        let xml = encode_one(entry);
        assert!(xml.contains("<entry id=\"k\" entrytype=\"mvbook\" options=\"dataonly\">"));
    }
}
