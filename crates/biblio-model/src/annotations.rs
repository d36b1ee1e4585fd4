//! Annotation lookup service.
//!
//! Annotations attach named metadata to a field, to one item of a list
//! field, or to one part of a name, optionally narrowed further by a form
//! and a language variant. The XML output encoder queries this store and
//! overlays the results on the owning element.

use std::collections::HashMap;

/// One named annotation value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub name: String,
    pub value: String,
    /// Whether the value is a literal (to be quoted/escaped as data) rather
    /// than an identifier-like token.
    pub literal: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Scope {
    key: String,
    field: String,
    item: Option<String>,
    part: Option<String>,
    form: Option<String>,
    lang: Option<String>,
}

/// Stores annotations keyed by `(citekey, field, item?, part?, form?, lang?)`.
#[derive(Debug, Default)]
pub struct AnnotationStore {
    map: HashMap<Scope, Vec<Annotation>>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn annotate(
        &mut self,
        key: &str,
        field: &str,
        item: Option<&str>,
        part: Option<&str>,
        form: Option<&str>,
        lang: Option<&str>,
        annotation: Annotation,
    ) {
        let scope = Scope {
            key: key.to_string(),
            field: field.to_string(),
            item: item.map(str::to_string),
            part: part.map(str::to_string),
            form: form.map(str::to_string),
            lang: lang.map(str::to_string),
        };
        self.map.entry(scope).or_default().push(annotation);
    }

    /// Look up annotations at exactly the given granularity.
    pub fn lookup(
        &self,
        key: &str,
        field: &str,
        item: Option<&str>,
        part: Option<&str>,
        form: Option<&str>,
        lang: Option<&str>,
    ) -> &[Annotation] {
        let scope = Scope {
            key: key.to_string(),
            field: field.to_string(),
            item: item.map(str::to_string),
            part: part.map(str::to_string),
            form: form.map(str::to_string),
            lang: lang.map(str::to_string),
        };
        self.map.get(&scope).map_or(&[], Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann(value: &str, literal: bool) -> Annotation {
        Annotation {
            name: "default".into(),
            value: value.into(),
            literal,
        }
    }

    #[test]
    fn test_field_and_item_granularity() {
        let mut store = AnnotationStore::new();
        store.annotate("k", "author", None, None, None, None, ann("corresponding", false));
        store.annotate(
            "k",
            "author",
            Some("1"),
            Some("family"),
            None,
            None,
            ann("student", true),
        );

        assert_eq!(store.lookup("k", "author", None, None, None, None).len(), 1);
        assert_eq!(
            store.lookup("k", "author", Some("1"), Some("family"), None, None)[0].value,
            "student"
        );
        assert!(store.lookup("k", "title", None, None, None, None).is_empty());
    }

    #[test]
    fn test_form_and_lang_narrow_the_scope() {
        let mut store = AnnotationStore::new();
        store.annotate("k", "title", None, None, Some("short"), None, ann("abbr", false));
        store.annotate("k", "title", None, None, None, Some("de"), ann("translated", false));

        assert!(store.lookup("k", "title", None, None, None, None).is_empty());
        assert_eq!(
            store.lookup("k", "title", None, None, Some("short"), None)[0].value,
            "abbr"
        );
        assert_eq!(
            store.lookup("k", "title", None, None, None, Some("de"))[0].value,
            "translated"
        );
    }
}
