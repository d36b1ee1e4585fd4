//! Element-tree types for parsed source documents.

/// A parsed XML document.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    /// The root element.
    pub root: XmlElement,
}

/// An XML element.
///
/// Namespace prefixes are kept separate from local names because source
/// documents in this system are namespace-heavy (`dc:title`, `z:itemType`);
/// lookups accept either the local name or the `prefix:local` form.
#[derive(Debug, Clone)]
pub struct XmlElement {
    /// The local name of the element (without namespace prefix).
    pub name: String,

    /// Namespace prefix, if any.
    pub prefix: Option<String>,

    /// Attributes of this element.
    pub attributes: Vec<XmlAttribute>,

    /// Child content of this element.
    pub children: XmlChildren,
}

/// An XML attribute.
#[derive(Debug, Clone)]
pub struct XmlAttribute {
    /// The local name of the attribute (without namespace prefix).
    pub name: String,

    /// Namespace prefix, if any.
    pub prefix: Option<String>,

    /// The attribute value (after unescaping XML entities).
    pub value: String,
}

/// Children of an XML element.
#[derive(Debug, Clone)]
pub enum XmlChildren {
    /// Element contains only child elements.
    Elements(Vec<XmlElement>),

    /// Element contains only text content.
    Text(String),

    /// Element contains mixed content (text and elements interleaved).
    Mixed(Vec<XmlChild>),

    /// Element is empty.
    Empty,
}

/// A single child in mixed content.
#[derive(Debug, Clone)]
pub enum XmlChild {
    Element(XmlElement),
    Text(String),
}

fn matches_name(name: &str, prefix: Option<&str>, wanted: &str) -> bool {
    match wanted.split_once(':') {
        Some((wanted_prefix, wanted_local)) => {
            prefix == Some(wanted_prefix) && name == wanted_local
        }
        None => name == wanted,
    }
}

impl XmlElement {
    /// The `prefix:local` form of this element's name.
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.name),
            None => self.name.clone(),
        }
    }

    /// Whether this element's name matches `wanted` (local or qualified).
    pub fn is_named(&self, wanted: &str) -> bool {
        matches_name(&self.name, self.prefix.as_deref(), wanted)
    }

    /// Get an attribute value by local or qualified name.
    pub fn get_attribute(&self, wanted: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| matches_name(&a.name, a.prefix.as_deref(), wanted))
            .map(|a| a.value.as_str())
    }

    /// Whether this element has any child elements.
    pub fn has_elements(&self) -> bool {
        !self.all_children().is_empty()
    }

    /// Get text content, if this element contains only text.
    pub fn text(&self) -> Option<&str> {
        match &self.children {
            XmlChildren::Text(content) => Some(content),
            _ => None,
        }
    }

    /// Text content of this element, empty when it has none.
    pub fn text_or_empty(&self) -> &str {
        self.text().unwrap_or("")
    }

    /// Get child elements by local or qualified name.
    pub fn get_children(&self, wanted: &str) -> Vec<&XmlElement> {
        self.all_children()
            .into_iter()
            .filter(|e| e.is_named(wanted))
            .collect()
    }

    /// First child element with the given name.
    pub fn first_child(&self, wanted: &str) -> Option<&XmlElement> {
        self.all_children().into_iter().find(|e| e.is_named(wanted))
    }

    /// Text of the first child element with the given name.
    pub fn child_text(&self, wanted: &str) -> Option<&str> {
        self.first_child(wanted).and_then(XmlElement::text)
    }

    /// All child elements (ignoring text in mixed content).
    pub fn all_children(&self) -> Vec<&XmlElement> {
        match &self.children {
            XmlChildren::Elements(elements) => elements.iter().collect(),
            XmlChildren::Mixed(children) => children
                .iter()
                .filter_map(|c| match c {
                    XmlChild::Element(e) => Some(e),
                    _ => None,
                })
                .collect(),
            _ => vec![],
        }
    }
}
