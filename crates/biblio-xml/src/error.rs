//! Error types for XML parsing.

use thiserror::Error;

/// Result type alias for biblio-xml operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing a source document.
///
/// Any of these is fatal for the whole mapping run: a source document that
/// fails to parse is never partially consumed.
#[derive(Debug, Error)]
pub enum Error {
    /// XML syntax error from quick-xml.
    #[error("XML syntax error: {message} at byte {position}")]
    XmlSyntax { message: String, position: u64 },

    /// Malformed attribute.
    #[error("malformed XML attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    /// Unexpected end of input.
    #[error("unexpected end of input, expected closing tag </{expected}>")]
    UnexpectedEof { expected: String },

    /// Mismatched end tag.
    #[error("mismatched end tag: expected </{expected}>, found </{found}>")]
    MismatchedEndTag { expected: String, found: String },

    /// Closing tag with no matching open element.
    #[error("unexpected closing tag </{found}>")]
    UnexpectedEndTag { found: String },

    /// Empty document (no root element).
    #[error("empty XML document: no root element found")]
    EmptyDocument,

    /// More than one root element.
    #[error("multiple root elements")]
    MultipleRoots,
}
