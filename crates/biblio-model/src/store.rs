//! The key → entry table with case-folded uniqueness.

use crate::entry::CanonicalEntry;
use crate::warnings::Warnings;
use hashlink::LinkedHashMap;

/// Stores canonical entries for one processing scope.
///
/// At most one entry may exist per case-folded key. Insertion is
/// check-then-insert: a second entry with a colliding folded key is rejected
/// with a warning, never merged. The original per-document key order is
/// retained separately so a caller needing file-order semantics can
/// reconstruct it.
#[derive(Debug, Default)]
pub struct EntryStore {
    entries: LinkedHashMap<String, CanonicalEntry>,
    key_order: Vec<String>,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, enforcing case-folded key uniqueness.
    ///
    /// Returns `true` on success; on a duplicate, pushes a warning and
    /// returns `false`, leaving the existing entry untouched.
    pub fn insert(&mut self, entry: CanonicalEntry, warnings: &mut Warnings) -> bool {
        let folded = entry.key_folded().to_string();
        if self.entries.contains_key(&folded) {
            warnings.push(
                Some(entry.citekey()),
                format!(
                    "duplicate entry key '{}' (case-insensitive), skipping",
                    entry.citekey()
                ),
            );
            return false;
        }
        self.key_order.push(entry.citekey().to_string());
        self.entries.insert(folded, entry);
        true
    }

    pub fn get(&self, key: &str) -> Option<&CanonicalEntry> {
        self.entries.get(&key.to_lowercase())
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut CanonicalEntry> {
        self.entries.get_mut(&key.to_lowercase())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(&key.to_lowercase())
    }

    pub fn remove(&mut self, key: &str) -> Option<CanonicalEntry> {
        let folded = key.to_lowercase();
        self.key_order.retain(|k| k.to_lowercase() != folded);
        self.entries.remove(&folded)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &CanonicalEntry> {
        self.entries.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut CanonicalEntry> {
        self.entries.values_mut()
    }

    /// Display-form citekeys in original document order.
    pub fn keys_in_order(&self) -> &[String] {
        &self.key_order
    }
}
