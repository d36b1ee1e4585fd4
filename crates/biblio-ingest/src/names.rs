//! Building structured names from source name nodes.

use biblio_model::{Name, Warnings};
use biblio_xml::XmlElement;

const SURNAME_TAGS: &[&str] = &["surname", "familyName", "family"];
const GIVEN_TAGS: &[&str] = &["given", "givenName", "firstName"];

/// Turn one source name node into a structured [`Name`].
///
/// Extracts the surname and given-name sub-values; a node with neither is
/// treated as a bare name (its text becomes the family part). Names without
/// a surname are permitted but logged.
pub fn build_name(node: &XmlElement, citekey: &str, warnings: &mut Warnings) -> Name {
    let last = first_child_text(node, SURNAME_TAGS);
    let first = first_child_text(node, GIVEN_TAGS);

    let (first, last) = match (first, last) {
        (None, None) => {
            // No sub-structure at all: the node text is the whole name.
            let text = node.text_or_empty().trim().to_string();
            (None, if text.is_empty() { None } else { Some(text) })
        }
        pair => pair,
    };

    if last.is_none() {
        warnings.push(
            Some(citekey),
            format!(
                "name without surname in entry '{}'{}",
                citekey,
                first
                    .as_deref()
                    .map(|f| format!(" (given name '{}')", f))
                    .unwrap_or_default()
            ),
        );
    }

    Name::new(first, last)
}

fn first_child_text(node: &XmlElement, tags: &[&str]) -> Option<String> {
    tags.iter().find_map(|tag| {
        node.child_text(tag)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use biblio_xml::parse;

    fn name_node(xml: &str) -> biblio_xml::XmlDocument {
        parse(xml).unwrap()
    }

    #[test]
    fn test_structured_name() {
        let doc = name_node("<name><surname>Smith</surname><given>John</given></name>");
        let mut warnings = Warnings::new();
        let name = build_name(&doc.root, "k", &mut warnings);
        assert_eq!(name.namestring(), "Smith, John");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_foaf_style_tags() {
        let doc = name_node(
            "<Person><familyName>Curie</familyName><givenName>Marie</givenName></Person>",
        );
        let mut warnings = Warnings::new();
        let name = build_name(&doc.root, "k", &mut warnings);
        assert_eq!(name.namestring(), "Curie, Marie");
    }

    #[test]
    fn test_bare_text_name() {
        let doc = name_node("<name>Aristotle</name>");
        let mut warnings = Warnings::new();
        let name = build_name(&doc.root, "k", &mut warnings);
        assert_eq!(name.namestring(), "Aristotle");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_missing_surname_is_logged() {
        let doc = name_node("<name><given>Madonna</given></name>");
        let mut warnings = Warnings::new();
        let name = build_name(&doc.root, "k", &mut warnings);
        assert_eq!(name.namestring(), "Madonna");
        assert_eq!(warnings.len(), 1);
    }
}
