//! Structured names with cached sort strings.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// A structured personal name.
///
/// `namestring` and `nameinitstring` are derived at construction and cached;
/// they are never mutated independently of the name parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub first: Option<String>,
    pub last: Option<String>,
    pub first_initials: Option<String>,
    pub last_initials: Option<String>,
    namestring: String,
    nameinitstring: String,
}

impl Name {
    /// Build a name from its given/family parts, computing initials and the
    /// cached sort strings.
    pub fn new(first: Option<String>, last: Option<String>) -> Self {
        let first_initials = first.as_deref().map(initials);
        let last_initials = last.as_deref().map(initials);

        // "last, first", comma and space dropped when either part is absent.
        let namestring = match (&last, &first) {
            (Some(l), Some(f)) => format!("{}, {}", l, f),
            (Some(l), None) => l.clone(),
            (None, Some(f)) => f.clone(),
            (None, None) => String::new(),
        };

        // last + "_" + concatenated first initials, whitespace folded to "_".
        let mut nameinitstring = String::new();
        if let Some(l) = &last {
            nameinitstring.push_str(l);
        }
        if let Some(fi) = &first_initials {
            if !nameinitstring.is_empty() {
                nameinitstring.push('_');
            }
            nameinitstring.push_str(&fi.replace(['-', ' '], ""));
        }
        let nameinitstring = fold_whitespace(&nameinitstring);

        Name {
            first,
            last,
            first_initials,
            last_initials,
            namestring,
            nameinitstring,
        }
    }

    /// The cached `"last, first"` display/sort string.
    pub fn namestring(&self) -> &str {
        &self.namestring
    }

    /// The cached `last_initials` disambiguation string.
    pub fn nameinitstring(&self) -> &str {
        &self.nameinitstring
    }
}

/// An ordered list of names for one field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NameList {
    pub names: Vec<Name>,
    /// Marks a truncated "et al." list.
    pub more_names: bool,
    /// Per-list scope options (e.g. `useprefix`), keyed by option name.
    pub options: std::collections::BTreeMap<String, String>,
}

impl NameList {
    pub fn new(names: Vec<Name>) -> Self {
        NameList {
            names,
            more_names: false,
            options: Default::default(),
        }
    }
}

/// Compute per-part initials.
///
/// Dashed compounds keep their structure: each fragment between dash-class
/// characters is reduced independently and the results rejoined with `-`.
/// A fragment whose first character carries a diacritic (precomposed or
/// followed by a combining mark) keeps its first two characters.
pub fn initials(part: &str) -> String {
    part.split_whitespace()
        .map(word_initials)
        .collect::<Vec<_>>()
        .join(" ")
}

fn word_initials(word: &str) -> String {
    word.split(['-', '\u{2013}', '\u{2014}'])
        .map(fragment_initial)
        .collect::<Vec<_>>()
        .join("-")
}

fn fragment_initial(fragment: &str) -> String {
    let mut chars = fragment.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let diacritic_bearing = first.to_string().nfd().count() > 1
        || chars.clone().next().is_some_and(is_combining_mark);

    if diacritic_bearing {
        match chars.next() {
            Some(second) => format!("{}{}", first, second),
            None => first.to_string(),
        }
    } else {
        first.to_string()
    }
}

fn fold_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join("_")
}
