//! XML parser that builds element trees.

use crate::error::{Error, Result};
use crate::types::{XmlAttribute, XmlChild, XmlChildren, XmlDocument, XmlElement};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Parse an XML source document from a string.
///
/// # Errors
///
/// Returns an error if the XML is malformed. Parse failures are fatal for
/// the whole mapping run; there is no partial consumption.
pub fn parse(content: &str) -> Result<XmlDocument> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text_start = false;
    reader.config_mut().trim_text_end = false;

    let mut stack: Vec<BuildNode> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let (name, prefix) = split_name(&e);
                let attributes = parse_attributes(&e)?;
                stack.push(BuildNode {
                    name,
                    prefix,
                    attributes,
                    children: Vec::new(),
                });
            }
            Ok(Event::End(e)) => {
                let end_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                let end_local = end_name.split(':').next_back().unwrap_or(&end_name);

                let node = stack.pop().ok_or_else(|| Error::UnexpectedEndTag {
                    found: end_name.clone(),
                })?;
                if node.name != end_local {
                    return Err(Error::MismatchedEndTag {
                        expected: node.name,
                        found: end_local.to_string(),
                    });
                }

                let element = node.finish();
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Empty(e)) => {
                let (name, prefix) = split_name(&e);
                let attributes = parse_attributes(&e)?;
                let element = XmlElement {
                    name,
                    prefix,
                    attributes,
                    children: XmlChildren::Empty,
                };
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|err| Error::XmlSyntax {
                    message: format!("invalid text content: {}", err),
                    position: reader.buffer_position(),
                })?;
                push_text(&mut stack, text.into_owned());
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(e.as_ref()).to_string();
                push_text(&mut stack, text);
            }
            Ok(Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_)) => {}
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlSyntax {
                    message: e.to_string(),
                    position: reader.error_position(),
                });
            }
        }
    }

    if let Some(node) = stack.last() {
        return Err(Error::UnexpectedEof {
            expected: node.name.clone(),
        });
    }

    let root = root.ok_or(Error::EmptyDocument)?;
    Ok(XmlDocument { root })
}

/// A node being constructed during parsing.
struct BuildNode {
    name: String,
    prefix: Option<String>,
    attributes: Vec<XmlAttribute>,
    children: Vec<XmlChild>,
}

impl BuildNode {
    fn finish(self) -> XmlElement {
        let has_elements = self
            .children
            .iter()
            .any(|c| matches!(c, XmlChild::Element(_)));
        let has_text = self
            .children
            .iter()
            .any(|c| matches!(c, XmlChild::Text(t) if !t.trim().is_empty()));

        let children = match (has_elements, has_text) {
            (false, false) => {
                // Only whitespace (or nothing) between tags.
                match self.children.into_iter().next() {
                    Some(XmlChild::Text(t)) => XmlChildren::Text(t),
                    _ => XmlChildren::Empty,
                }
            }
            (true, false) => XmlChildren::Elements(
                self.children
                    .into_iter()
                    .filter_map(|c| match c {
                        XmlChild::Element(e) => Some(e),
                        XmlChild::Text(_) => None,
                    })
                    .collect(),
            ),
            (false, true) => XmlChildren::Text(
                self.children
                    .into_iter()
                    .map(|c| match c {
                        XmlChild::Text(t) => t,
                        XmlChild::Element(_) => String::new(),
                    })
                    .collect(),
            ),
            (true, true) => XmlChildren::Mixed(self.children),
        };

        XmlElement {
            name: self.name,
            prefix: self.prefix,
            attributes: self.attributes,
            children,
        }
    }
}

fn attach(
    stack: &mut [BuildNode],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(XmlChild::Element(element));
            Ok(())
        }
        None => {
            if root.is_some() {
                return Err(Error::MultipleRoots);
            }
            *root = Some(element);
            Ok(())
        }
    }
}

fn push_text(stack: &mut [BuildNode], text: String) {
    if let Some(node) = stack.last_mut() {
        node.children.push(XmlChild::Text(text));
    }
}

fn split_name(e: &BytesStart<'_>) -> (String, Option<String>) {
    let full = String::from_utf8_lossy(e.name().as_ref()).to_string();
    match full.find(':') {
        Some(pos) => (full[pos + 1..].to_string(), Some(full[..pos].to_string())),
        None => (full, None),
    }
}

fn parse_attributes(e: &BytesStart<'_>) -> Result<Vec<XmlAttribute>> {
    let mut attributes = Vec::new();
    for attr_result in e.attributes() {
        let attr = attr_result?;
        let full = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let (name, prefix) = match full.find(':') {
            Some(pos) => (full[pos + 1..].to_string(), Some(full[..pos].to_string())),
            None => (full, None),
        };
        let value = attr.unescape_value().map_err(|err| Error::XmlSyntax {
            message: format!("invalid attribute value: {}", err),
            position: 0,
        })?;
        attributes.push(XmlAttribute {
            name,
            prefix,
            value: value.into_owned(),
        });
    }
    Ok(attributes)
}
