//! The canonical entry: one format-agnostic bibliographic record.

use crate::value::Value;
use hashlink::LinkedHashMap;

/// One bibliographic record.
///
/// The citekey is case-preserved for display; identity comparisons use the
/// case-folded form (see [`CanonicalEntry::key_folded`]). Fields keep their
/// insertion order so output passes are deterministic.
#[derive(Debug, Clone)]
pub struct CanonicalEntry {
    citekey: String,
    key_folded: String,
    entrytype: String,
    /// The pre-alias source tag this entry was mapped from.
    origin_tag: String,
    fields: LinkedHashMap<String, Value>,
    data_only: bool,
}

impl CanonicalEntry {
    pub fn new(
        citekey: impl Into<String>,
        entrytype: impl Into<String>,
        origin_tag: impl Into<String>,
    ) -> Self {
        let citekey = citekey.into();
        let key_folded = citekey.to_lowercase();
        CanonicalEntry {
            citekey,
            key_folded,
            entrytype: entrytype.into(),
            origin_tag: origin_tag.into(),
            fields: LinkedHashMap::new(),
            data_only: false,
        }
    }

    /// The case-preserved citekey.
    pub fn citekey(&self) -> &str {
        &self.citekey
    }

    /// The case-folded identity key.
    pub fn key_folded(&self) -> &str {
        &self.key_folded
    }

    pub fn entrytype(&self) -> &str {
        &self.entrytype
    }

    pub fn set_entrytype(&mut self, entrytype: impl Into<String>) {
        self.entrytype = entrytype.into();
    }

    /// The untranslated source tag this entry's type was derived from.
    pub fn origin_tag(&self) -> &str {
        &self.origin_tag
    }

    /// Whether this entry exists only to be cross-referenced and is excluded
    /// from standalone labeling/listing.
    pub fn is_data_only(&self) -> bool {
        self.data_only
    }

    pub fn set_data_only(&mut self, data_only: bool) {
        self.data_only = data_only;
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    pub fn delete_field(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Remove and return a field. This is the explicit form of the
    /// destructive read the output encoders perform on date and range
    /// fields: a consumed field must not be emitted twice.
    pub fn take_field(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Iterate fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Field names in insertion order.
    pub fn field_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }
}
