use bytes::Bytes;

/// Shape of an AMF3 object: class name, flags and sealed member names.
///
/// Two traits are equal when name, both flags and the ordered member names
/// all match. An empty name marks an anonymous class.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassTrait {
    name: Bytes,
    dynamic: bool,
    externalizable: bool,
    sealed_members: Vec<Bytes>,
}

impl ClassTrait {
    pub fn new<N, I, M>(name: N, sealed_members: I, dynamic: bool, externalizable: bool) -> Self
    where
        N: Into<Bytes>,
        I: IntoIterator<Item = M>,
        M: Into<Bytes>,
    {
        Self {
            name: name.into(),
            dynamic,
            externalizable,
            sealed_members: sealed_members.into_iter().map(Into::into).collect(),
        }
    }

    /// Nameless trait without sealed members that accepts any member.
    pub fn anonymous() -> Self {
        Self {
            name: Bytes::new(),
            dynamic: true,
            externalizable: false,
            sealed_members: vec![],
        }
    }

    pub fn name(&self) -> &Bytes {
        &self.name
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    pub fn is_externalizable(&self) -> bool {
        self.externalizable
    }

    pub fn sealed_members(&self) -> &[Bytes] {
        &self.sealed_members
    }

    pub fn is_sealed_member(&self, name: &[u8]) -> bool {
        self.sealed_members.iter().any(|m| m.as_ref() == name)
    }

    /// First sealed member name listed more than once, if any.
    pub(crate) fn duplicate_sealed_member(&self) -> Option<&Bytes> {
        self.sealed_members
            .iter()
            .enumerate()
            .find(|(i, m)| self.sealed_members[..*i].contains(*m))
            .map(|(_, m)| m)
    }

    pub(crate) fn lossy_name(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }
}
