//! Tagged variants for canonical field values.

use crate::date::DateParts;
use crate::name::NameList;
use once_cell::sync::Lazy;
use regex::Regex;

/// A canonical field value.
///
/// Field handlers normalize heterogeneous raw source fragments into one of
/// these variants; the output encoders dispatch on them to reconstruct the
/// textual or structural representation of each field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Plain text content.
    Literal(String),

    /// An ordered list of text items. Order is source order.
    List(Vec<String>),

    /// An ordered list of structured names.
    NameList(NameList),

    /// An ordered list of ranges (e.g. page ranges).
    RangeList(Vec<Range>),

    /// A structured date, possibly a range with per-side markers.
    Date(DateParts),

    /// Text emitted exactly as stored (URLs, DOIs). Never macro-substituted.
    Verbatim(String),
}

impl Value {
    /// Get the literal text, if this is a `Literal`.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Value::Literal(s) => Some(s),
            _ => None,
        }
    }

    /// Get the verbatim text, if this is a `Verbatim`.
    pub fn as_verbatim(&self) -> Option<&str> {
        match self {
            Value::Verbatim(s) => Some(s),
            _ => None,
        }
    }

    /// Get the list items, if this is a `List`.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get the names, if this is a `NameList`.
    pub fn as_names(&self) -> Option<&NameList> {
        match self {
            Value::NameList(names) => Some(names),
            _ => None,
        }
    }

    /// Get the ranges, if this is a `RangeList`.
    pub fn as_ranges(&self) -> Option<&[Range]> {
        match self {
            Value::RangeList(ranges) => Some(ranges),
            _ => None,
        }
    }

    /// Get the date, if this is a `Date`.
    pub fn as_date(&self) -> Option<&DateParts> {
        match self {
            Value::Date(d) => Some(d),
            _ => None,
        }
    }

    /// Render any scalar-ish value as display text, for diagnostics.
    pub fn display_text(&self) -> String {
        match self {
            Value::Literal(s) | Value::Verbatim(s) => s.clone(),
            Value::List(items) => items.join(", "),
            Value::NameList(names) => names
                .names
                .iter()
                .map(|n| n.namestring().to_string())
                .collect::<Vec<_>>()
                .join(" and "),
            Value::RangeList(ranges) => Range::render_list(ranges),
            Value::Date(d) => d.clone().encode(),
        }
    }
}

/// One element of a range list.
///
/// `end` distinguishes three cases: `None` means no range separator was
/// present in the source; `Some("")` means an explicit open-ended range
/// (separator with nothing after it); `Some(text)` is a closed range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    pub start: String,
    pub end: Option<String>,
}

// Leading value, optional dash-class separator, trailing value.
static RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([^-\x{2013}\x{2014}]*?)\s*(?:[-\x{2013}\x{2014}]+\s*(.*?))?\s*$").unwrap());

impl Range {
    /// A single value with no range separator.
    pub fn single(start: impl Into<String>) -> Self {
        Range {
            start: start.into(),
            end: None,
        }
    }

    /// A closed range.
    pub fn closed(start: impl Into<String>, end: impl Into<String>) -> Self {
        Range {
            start: start.into(),
            end: Some(end.into()),
        }
    }

    /// An explicitly open-ended range (`"100-"`).
    pub fn open(start: impl Into<String>) -> Self {
        Range {
            start: start.into(),
            end: Some(String::new()),
        }
    }

    /// Split a comma-separated range field into its elements.
    ///
    /// Presence of a dash-class separator (even with an empty trailing
    /// value) sets `end = Some(trailing)`; absence sets `end = None`.
    pub fn parse_list(raw: &str) -> Vec<Range> {
        raw.split(',')
            .map(|piece| {
                let caps = RANGE_RE.captures(piece).expect("range pattern matches any input");
                let start = caps.get(1).map_or("", |m| m.as_str()).to_string();
                let end = caps.get(2).map(|m| m.as_str().to_string());
                Range { start, end }
            })
            .collect()
    }

    /// Rejoin a range list into its comma-separated textual form.
    pub fn render_list(ranges: &[Range]) -> String {
        ranges
            .iter()
            .map(|r| match &r.end {
                None => r.start.clone(),
                Some(end) => format!("{}-{}", r.start, end),
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}
