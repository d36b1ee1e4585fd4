//! Driver-defined mapping configuration.
//!
//! A driver describes one source format: which raw field tags it knows,
//! which handler normalizes each of them, the field and entry-type alias
//! tables, and the static tables that steer crossref synthesis. Tables use
//! insertion-ordered maps so that first-match resolution is deterministic:
//! declaration order here is the documented resolution order.

use hashlink::LinkedHashMap;
use std::collections::HashMap;

/// The closed set of field handler kinds.
///
/// The source mapper dispatches on this with one exhaustive match; adding a
/// kind is a compile-time-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Literal,
    List,
    Name,
    Range,
    Date,
    Verbatim,
    Publisher,
    Event,
    Subject,
    Identifier,
    /// A nested "part-of" container; triggers crossref synthesis.
    PartOf,
}

/// A side-effect action value.
///
/// Sentinel directives only have meaning inside `also_set` actions and are
/// parsed once, here, instead of being compared as strings at call sites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlsoSet {
    /// Drop the field and block any later write to it in this entry.
    Drop,
    /// Use the untranslated raw tag name as the value.
    UseOriginalField,
    /// Use the pre-alias entry type name as the value.
    UseOriginalType,
    /// Set a literal value.
    SetLiteral(String),
}

impl AlsoSet {
    /// Parse a configured action value, recognizing the sentinel tokens.
    pub fn parse(value: &str) -> AlsoSet {
        match value {
            "NULL" => AlsoSet::Drop,
            "ORIGFIELD" => AlsoSet::UseOriginalField,
            "ORIGENTRYTYPE" => AlsoSet::UseOriginalType,
            other => AlsoSet::SetLiteral(other.to_string()),
        }
    }
}

/// A type-specific alias for one raw tag.
#[derive(Debug, Clone)]
pub struct TypeAlias {
    /// Entry types this alias applies to (compared case-insensitively).
    pub types: Vec<String>,
    /// The canonical target field.
    pub target: String,
    /// Side-effect actions applied when this alias wins.
    pub also_set: Vec<(String, AlsoSet)>,
}

/// A driver rule for one raw field tag.
#[derive(Debug, Clone)]
pub struct DriverFieldRule {
    /// The handler that normalizes this field's raw value.
    pub handler: HandlerKind,
    /// Global alias: the canonical field to map to. Absent means the raw
    /// tag itself (case-folded) is the target.
    pub alias: Option<String>,
    /// Type-specific aliases; the first whose type list matches wins over
    /// the global alias.
    pub type_aliases: Vec<TypeAlias>,
}

/// An entry-type alias with side effects.
#[derive(Debug, Clone)]
pub struct EntryTypeAlias {
    pub aliasof: String,
    pub also_set: Vec<(String, AlsoSet)>,
}

/// One driver's static configuration, loaded once per driver identity.
#[derive(Debug)]
pub struct DriverConfig {
    /// Raw tag (case-folded) → field rule, in declaration order.
    pub fields: LinkedHashMap<String, DriverFieldRule>,
    /// Raw entry type (case-folded) → alias, in declaration order.
    pub entrytypes: LinkedHashMap<String, EntryTypeAlias>,
    /// Primary entry type → inferred type for a synthesized container.
    pub crossref_types: HashMap<String, String>,
    /// Entry types whose part-of container is a meaningless placeholder;
    /// no crossref is synthesized for them.
    pub crossref_skip: Vec<String>,
    /// Container types that are still an unresolved generic placeholder and
    /// should be overwritten from `crossref_types`.
    pub crossref_generic: Vec<String>,
}

impl DriverConfig {
    fn new() -> Self {
        DriverConfig {
            fields: LinkedHashMap::new(),
            entrytypes: LinkedHashMap::new(),
            crossref_types: HashMap::new(),
            crossref_skip: Vec::new(),
            crossref_generic: Vec::new(),
        }
    }

    fn field(&mut self, tag: &str, handler: HandlerKind, alias: Option<&str>) -> &mut Self {
        self.fields.insert(
            tag.to_lowercase(),
            DriverFieldRule {
                handler,
                alias: alias.map(str::to_string),
                type_aliases: Vec::new(),
            },
        );
        self
    }

    fn type_alias(&mut self, tag: &str, types: &[&str], target: &str) -> &mut Self {
        if let Some(rule) = self.fields.get_mut(&tag.to_lowercase()) {
            rule.type_aliases.push(TypeAlias {
                types: types.iter().map(|t| t.to_string()).collect(),
                target: target.to_string(),
                also_set: Vec::new(),
            });
        }
        self
    }

    fn entrytype(&mut self, raw: &str, aliasof: &str, also_set: &[(&str, &str)]) -> &mut Self {
        self.entrytypes.insert(
            raw.to_lowercase(),
            EntryTypeAlias {
                aliasof: aliasof.to_string(),
                also_set: also_set
                    .iter()
                    .map(|(f, v)| (f.to_string(), AlsoSet::parse(v)))
                    .collect(),
            },
        );
        self
    }

    /// Look up the field rule for a raw tag.
    pub fn field_rule(&self, raw_tag: &str) -> Option<&DriverFieldRule> {
        self.fields.get(&raw_tag.to_lowercase())
    }

    /// Look up the entry-type alias for a raw type.
    pub fn entrytype_alias(&self, raw_type: &str) -> Option<&EntryTypeAlias> {
        self.entrytypes.get(&raw_type.to_lowercase())
    }

    /// The driver for RDF-style hierarchical exports.
    pub fn rdfxml() -> Self {
        let mut d = DriverConfig::new();

        d.field("title", HandlerKind::Literal, None)
            .field("shorttitle", HandlerKind::Literal, None)
            .field("abstract", HandlerKind::Literal, Some("abstract"))
            .field("volume", HandlerKind::Literal, None)
            .field("number", HandlerKind::Literal, None)
            .field("edition", HandlerKind::Literal, None)
            .field("seriestitle", HandlerKind::Literal, Some("series"))
            .field("language", HandlerKind::Literal, Some("langid"))
            .field("librarycatalog", HandlerKind::Literal, None)
            .field("authors", HandlerKind::Name, Some("author"))
            .field("editors", HandlerKind::Name, Some("editor"))
            .field("contributors", HandlerKind::Name, Some("translator"))
            .field("date", HandlerKind::Date, None)
            .field("accessed", HandlerKind::Date, Some("urldate"))
            .field("pages", HandlerKind::Range, None)
            .field("place", HandlerKind::List, Some("location"))
            .field("publisher", HandlerKind::Publisher, Some("publisher"))
            .field("presentedat", HandlerKind::Event, Some("eventtitle"))
            .field("subject", HandlerKind::Subject, Some("keywords"))
            .field("identifier", HandlerKind::Identifier, Some("url"))
            .field("url", HandlerKind::Verbatim, None)
            .field("doi", HandlerKind::Verbatim, None)
            .field("ispartof", HandlerKind::PartOf, Some("crossref"));

        // Films credit their contributors as directors.
        d.type_alias("contributors", &["film", "video"], "director");

        d.entrytype("book", "book", &[])
            .entrytype("booksection", "inbook", &[])
            .entrytype("journalarticle", "article", &[])
            .entrytype("magazinearticle", "article", &[("entrysubtype", "magazine")])
            .entrytype("newspaperarticle", "article", &[("entrysubtype", "newspaper")])
            .entrytype("conferencepaper", "inproceedings", &[])
            .entrytype("thesis", "thesis", &[("type", "ORIGENTRYTYPE")])
            .entrytype("phdthesis", "thesis", &[("type", "ORIGENTRYTYPE")])
            .entrytype("manuscript", "unpublished", &[])
            .entrytype("webpage", "online", &[]);

        for (primary, inferred) in [
            ("book", "mvbook"),
            ("booksection", "book"),
            ("inbook", "book"),
            ("journalarticle", "periodical"),
            ("article", "periodical"),
            ("conferencepaper", "proceedings"),
        ] {
            d.crossref_types
                .insert(primary.to_string(), inferred.to_string());
        }

        d.crossref_skip.push("webpage".to_string());
        d.crossref_generic.push("series".to_string());
        d.crossref_generic.push("entry".to_string());

        d
    }
}
