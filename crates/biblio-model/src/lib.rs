//! Canonical bibliographic entry model.
//!
//! This crate defines the format-agnostic representation shared by the
//! ingest and output sides of biblio:
//!
//! - [`Value`]: tagged variants for canonical field values
//! - [`Name`] / [`NameList`]: structured names with cached sort strings
//! - [`DateParts`] and the reversible date/range codec in [`date`]
//! - [`CanonicalEntry`]: one bibliographic record, keyed by citekey
//! - [`EntryStore`]: the key → entry table with case-folded uniqueness
//! - [`Warnings`]: the append-only warnings channel
//! - [`AnnotationStore`]: the annotation lookup service
//!
//! Entries are created once per successful source-node mapping, mutated by
//! field handlers during mapping, and later consumed field-by-field by the
//! output encoders (date fields are destructive reads, see
//! [`CanonicalEntry::take_field`]).

pub mod annotations;
pub mod date;
pub mod entry;
pub mod name;
pub mod store;
pub mod value;
pub mod warnings;

pub use annotations::{Annotation, AnnotationStore};
pub use date::{DateError, DateParts, Season, Unspecified};
pub use entry::CanonicalEntry;
pub use name::{Name, NameList};
pub use store::EntryStore;
pub use value::{Range, Value};
pub use warnings::{Warning, Warnings};
