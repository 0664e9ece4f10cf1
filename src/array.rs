use bytes::Bytes;

use crate::{Amf3Value, ReferenceTable};

/// AMF3 array: a dense, index-keyed part and an associative, name-keyed part.
///
/// Both parts may be populated at once. On the wire the associative part is
/// written before the dense part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Amf3Array {
    dense: Vec<Amf3Value>,
    associative: ReferenceTable<Amf3Value>,
}

impl Amf3Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_dense(dense: Vec<Amf3Value>) -> Self {
        Self {
            dense,
            associative: ReferenceTable::new(),
        }
    }

    /// Appends to the dense part.
    pub fn push(&mut self, value: impl Into<Amf3Value>) {
        self.dense.push(value.into());
    }

    /// Appends a named member to the associative part.
    pub fn insert(&mut self, key: impl Into<Bytes>, value: impl Into<Amf3Value>) {
        self.associative.push_keyed(key, value.into());
    }

    pub fn get(&self, idx: usize) -> Option<&Amf3Value> {
        self.dense.get(idx)
    }

    pub fn get_by_key(&self, key: impl AsRef<[u8]>) -> Option<&Amf3Value> {
        self.associative.get_by_key(key)
    }

    pub fn dense(&self) -> &[Amf3Value] {
        &self.dense
    }

    pub fn associative(&self) -> &ReferenceTable<Amf3Value> {
        &self.associative
    }

    /// Associative members in insertion order.
    pub fn associative_members(&self) -> impl Iterator<Item = (&Bytes, &Amf3Value)> {
        self.associative
            .keyed_iter()
            .filter_map(|(key, value)| Some((key?, value)))
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty() && self.associative.is_empty()
    }

    pub fn is_dense_only(&self) -> bool {
        self.associative.is_empty()
    }

    pub fn is_associative_only(&self) -> bool {
        self.dense.is_empty() && !self.associative.is_empty()
    }
}

impl FromIterator<Amf3Value> for Amf3Array {
    fn from_iter<I: IntoIterator<Item = Amf3Value>>(iter: I) -> Self {
        Self::from_dense(iter.into_iter().collect())
    }
}
