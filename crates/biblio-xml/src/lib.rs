//! Element-tree XML parsing for biblio source documents.
//!
//! Wraps [`quick-xml`] to provide a tree of [`XmlElement`]s suited to the
//! namespace-heavy documents the source mapper walks. Lookups accept either
//! local names or `prefix:local` qualified names.
//!
//! # Example
//!
//! ```rust
//! use biblio_xml::parse;
//!
//! let doc = parse(r#"<collection>
//!   <entry about="smith2020" type="book">
//!     <title>A Title</title>
//!   </entry>
//! </collection>"#).unwrap();
//!
//! let entry = doc.root.first_child("entry").unwrap();
//! assert_eq!(entry.get_attribute("about"), Some("smith2020"));
//! assert_eq!(entry.child_text("title"), Some("A Title"));
//! ```

pub mod error;
pub mod parser;
pub mod types;

pub use error::{Error, Result};
pub use parser::parse;
pub use types::{XmlAttribute, XmlChild, XmlChildren, XmlDocument, XmlElement};
