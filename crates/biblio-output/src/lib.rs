//! Output encoders for biblio.
//!
//! Two encoders turn a populated [`EntryStore`](biblio_model::EntryStore)
//! back into text:
//!
//! - [`FlatEncoder`]: the flat `@TYPE{key, field = {value}}` form, with
//!   field alignment, identifier casing, macro substitution, and an
//!   optional ASCII re-encoding step
//! - [`XmlEncoder`]: the structural XML form, preserving name parts, range
//!   splits, per-side date markers, and annotation overlays
//!
//! # Example
//!
//! ```rust
//! use biblio_model::{AnnotationStore, CanonicalEntry, EntryStore, Value, Warnings};
//! use biblio_output::{FlatEncoder, FlatOptions};
//!
//! let mut store = EntryStore::new();
//! let mut warnings = Warnings::new();
//! let mut entry = CanonicalEntry::new("Smith2020", "book", "book");
//! entry.set_field("title", Value::Literal("A Title".into()));
//! store.insert(entry, &mut warnings);
//!
//! let mut encoder = FlatEncoder::new(FlatOptions::default());
//! let text = encoder.encode(&store, &AnnotationStore::new(), &mut warnings);
//! assert!(text.starts_with("@book{Smith2020,"));
//! ```

pub mod error;
pub mod flat;
pub mod options;
pub mod xml;

pub use error::{Error, Result};
pub use flat::{FlatEncoder, RenderedEntry};
pub use options::{Casing, Encoding, EscapeFn, FlatOptions, Macro, XmlOptions, month_macros};
pub use xml::XmlEncoder;
