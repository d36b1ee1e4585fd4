//! Encoder configuration.

/// Identifier casing applied to field names and entry types in flat output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Casing {
    #[default]
    Lower,
    Upper,
    /// First character upper, rest lower.
    Title,
}

impl Casing {
    pub fn apply(self, ident: &str) -> String {
        match self {
            Casing::Lower => ident.to_lowercase(),
            Casing::Upper => ident.to_uppercase(),
            Casing::Title => {
                let mut chars = ident.chars();
                match chars.next() {
                    Some(first) => {
                        first.to_uppercase().collect::<String>()
                            + &chars.as_str().to_lowercase()
                    }
                    None => String::new(),
                }
            }
        }
    }
}

/// Target output encoding for flat output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    /// Non-ASCII values are passed through the configured escape function.
    Ascii,
}

/// Converts non-ASCII text into an ASCII-safe form, e.g. a TeX-escape table.
/// Injected by the caller; the encoder itself knows nothing about the target
/// escape convention.
pub type EscapeFn = fn(&str) -> String;

/// One substitutable abbreviation: a literal field value matching any entry
/// in `values` is replaced by the bare `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macro {
    pub id: String,
    pub values: Vec<String>,
}

impl Macro {
    pub fn new(id: impl Into<String>, values: &[&str]) -> Self {
        Macro {
            id: id.into(),
            values: values.iter().map(|v| (*v).to_string()).collect(),
        }
    }
}

/// The stock month abbreviations: both the plain and zero-padded numeric
/// forms of each month substitute to the three-letter id.
pub fn month_macros() -> Vec<Macro> {
    const IDS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    IDS.iter()
        .enumerate()
        .map(|(i, id)| {
            let n = i + 1;
            let mut values = vec![n.to_string()];
            if n < 10 {
                values.push(format!("{:02}", n));
            }
            Macro {
                id: (*id).to_string(),
                values,
            }
        })
        .collect()
}

/// Options for the flat-text encoder.
#[derive(Debug, Clone)]
pub struct FlatOptions {
    pub casing: Casing,
    pub encoding: Encoding,
    /// Required when `encoding` is [`Encoding::Ascii`]; without it non-ASCII
    /// values are emitted unchanged with a warning.
    pub escape: Option<EscapeFn>,
    /// Fields emitted first, in this order. Everything else follows sorted.
    pub field_order: Vec<String>,
    pub macros: Vec<Macro>,
}

impl Default for FlatOptions {
    fn default() -> Self {
        FlatOptions {
            casing: Casing::default(),
            encoding: Encoding::default(),
            escape: None,
            field_order: [
                "options",
                "author",
                "editor",
                "translator",
                "director",
                "title",
                "booktitle",
                "maintitle",
                "series",
                "eventtitle",
                "publisher",
                "location",
                "date",
                "urldate",
                "volume",
                "number",
                "edition",
                "pages",
            ]
            .iter()
            .map(|f| (*f).to_string())
            .collect(),
            macros: month_macros(),
        }
    }
}

/// Options for the XML-tree encoder.
#[derive(Debug, Clone, Default)]
pub struct XmlOptions {
    /// Unresolved indirection fields (`crossref`, `xref`) are emitted as
    /// empty elements carrying a `target` attribute, validated against the
    /// store. Setting this flag marks them as resolved instead, emitting
    /// the raw key as element text.
    pub resolve_refs: bool,
}
