use std::collections::HashMap;

use bytes::Bytes;

/// Append-only ordered collection.
///
/// Insertion order is the AMF3 reference index, so entries are never
/// reordered, removed or deduplicated. Entries may carry a string key; key
/// lookups resolve to the first entry pushed with that key.
#[derive(Debug, Clone)]
pub struct ReferenceTable<T> {
    entries: Vec<(Option<Bytes>, T)>,
    index: HashMap<Bytes, usize>,
}

impl<T> Default for ReferenceTable<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> ReferenceTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an unkeyed entry and returns its index.
    pub fn push(&mut self, item: T) -> usize {
        let idx = self.entries.len();
        self.entries.push((None, item));
        idx
    }

    /// Appends an entry tagged with `key` and returns its index.
    pub fn push_keyed(&mut self, key: impl Into<Bytes>, item: T) -> usize {
        let key = key.into();
        let idx = self.entries.len();
        self.index.entry(key.clone()).or_insert(idx);
        self.entries.push((Some(key), item));
        idx
    }

    pub fn get(&self, idx: usize) -> Option<&T> {
        self.entries.get(idx).map(|(_, item)| item)
    }

    pub fn get_by_key(&self, key: impl AsRef<[u8]>) -> Option<&T> {
        let idx = *self.index.get(key.as_ref())?;
        self.get(idx)
    }

    pub fn index_of_key(&self, key: impl AsRef<[u8]>) -> Option<usize> {
        self.index.get(key.as_ref()).copied()
    }

    pub fn contains_key(&self, key: impl AsRef<[u8]>) -> bool {
        self.index.contains_key(key.as_ref())
    }

    /// Index of the first entry matching `predicate`.
    pub fn position<F>(&self, mut predicate: F) -> Option<usize>
    where
        F: FnMut(&T) -> bool,
    {
        self.entries.iter().position(|(_, item)| predicate(item))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, item)| item)
    }

    /// Entries with their keys, in insertion order.
    pub fn keyed_iter(&self) -> impl Iterator<Item = (Option<&Bytes>, &T)> {
        self.entries.iter().map(|(key, item)| (key.as_ref(), item))
    }
}

impl<T: PartialEq> PartialEq for ReferenceTable<T> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}
