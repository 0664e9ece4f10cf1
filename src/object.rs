use bytes::Bytes;

use crate::{Amf3Value, ClassTrait, ReferenceTable};

/// Instance of an AMF3 class.
///
/// Members are stored in insertion order. Values for sealed members are
/// found by name, so they may be inserted in any order; the codec always
/// writes and reads them in the order listed by the trait. Members whose
/// names are not sealed are dynamic and keep their relative order.
#[derive(Debug, Clone)]
pub struct Amf3Object {
    class_trait: ClassTrait,
    members: ReferenceTable<Amf3Value>,
}

impl Amf3Object {
    pub fn new(class_trait: ClassTrait) -> Self {
        Self {
            class_trait,
            members: ReferenceTable::new(),
        }
    }

    /// Object of an anonymous dynamic class, the AMF3 counterpart of a plain
    /// key-value map.
    pub fn anonymous() -> Self {
        Self::new(ClassTrait::anonymous())
    }

    pub fn class_trait(&self) -> &ClassTrait {
        &self.class_trait
    }

    pub fn has_anonymous_trait(&self) -> bool {
        self.class_trait.is_anonymous()
    }

    pub fn insert(&mut self, name: impl Into<Bytes>, value: impl Into<Amf3Value>) {
        self.members.push_keyed(name, value.into());
    }

    pub fn get(&self, name: impl AsRef<[u8]>) -> Option<&Amf3Value> {
        self.members.get_by_key(name)
    }

    pub fn contains_key(&self, name: impl AsRef<[u8]>) -> bool {
        self.members.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> impl Iterator<Item = (&Bytes, &Amf3Value)> {
        self.members
            .keyed_iter()
            .filter_map(|(key, value)| Some((key?, value)))
    }

    /// Values of sealed members in trait order, `None` where a member is
    /// missing.
    pub fn sealed_values(&self) -> impl Iterator<Item = (&Bytes, Option<&Amf3Value>)> {
        self.class_trait
            .sealed_members()
            .iter()
            .map(|name| (name, self.members.get_by_key(name)))
    }

    /// Members not listed by the trait, in insertion order.
    pub fn dynamic_members(&self) -> impl Iterator<Item = (&Bytes, &Amf3Value)> {
        self.members()
            .filter(|(name, _)| !self.class_trait.is_sealed_member(name))
    }
}

impl PartialEq for Amf3Object {
    fn eq(&self, other: &Self) -> bool {
        self.class_trait == other.class_trait
            && self.members.len() == other.members.len()
            && self.sealed_values().eq(other.sealed_values())
            && self.dynamic_members().eq(other.dynamic_members())
    }
}
