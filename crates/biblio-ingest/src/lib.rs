//! Source mapping for biblio.
//!
//! This crate sits between raw source documents and canonical entries. It
//! provides:
//!
//! - [`DriverConfig`]: a source format's static field/entry-type tables
//! - [`UserMap`]: run-time user overrides, evaluated before driver rules
//! - [`resolve`]: the alias-resolution cascade
//! - the typed field handlers in [`handlers`]
//! - [`SourceMapper`]: walks a document, dispatches handlers, synthesizes
//!   crossref entries for nested part-of containers
//!
//! # Example
//!
//! ```rust
//! use biblio_ingest::{DriverConfig, SourceMapper, Wanted};
//! use biblio_model::{EntryStore, Warnings};
//!
//! let doc = biblio_xml::parse(r#"<collection>
//!   <entry about="smith2020" type="book">
//!     <title>A Title</title>
//!   </entry>
//! </collection>"#).unwrap();
//!
//! let driver = DriverConfig::rdfxml();
//! let mapper = SourceMapper::new(&driver, None);
//! let mut store = EntryStore::new();
//! let mut warnings = Warnings::new();
//! mapper.extract(&doc, Wanted::All, &mut store, &mut warnings);
//!
//! assert_eq!(store.len(), 1);
//! ```

pub mod driver;
pub mod error;
pub mod handlers;
pub mod mapper;
pub mod names;
pub mod resolver;
pub mod usermap;

pub use driver::{AlsoSet, DriverConfig, DriverFieldRule, EntryTypeAlias, HandlerKind, TypeAlias};
pub use error::{Error, Result};
pub use mapper::{SourceMapper, Wanted, synthetic_key};
pub use names::build_name;
pub use resolver::{Resolution, resolve};
pub use usermap::{AlsoSetSpec, UserMap, UserRule, UserRuleDetail, UserRules};
