use std::collections::HashSet;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{trace, warn};

use crate::{
    Amf3Array, Amf3Config, Amf3Date, Amf3Object, Amf3TypeCode, Amf3Value, ClassTrait,
    EncodingError, ReferenceTable,
    error::{MAX_SEALED_COUNT, U28_MAX},
    value::{I29_MAX, I29_MIN},
};

const U29_MAX: usize = (1 << 29) - 1;

pub fn encode(amf_value: &Amf3Value) -> Result<Bytes, EncodingError> {
    encode_with_config(amf_value, &Amf3Config::default())
}

pub fn encode_with_config(
    amf_value: &Amf3Value,
    config: &Amf3Config,
) -> Result<Bytes, EncodingError> {
    let mut encoder = Amf3Encoder::with_config(BytesMut::new(), config.clone());
    encoder.encode_value(amf_value)?;
    Ok(encoder.finish())
}

/// One encode session.
///
/// Reference tables are filled in the same order a decoder fills them while
/// reading the output, so back-references written here resolve to the same
/// entries on the other side. After an error the bytes already written are
/// incomplete and must be discarded.
pub struct Amf3Encoder<'a, T> {
    buf: T,
    config: Amf3Config,
    strings: ReferenceTable<Bytes>,
    objects: ReferenceTable<&'a Amf3Value>,
    traits: ReferenceTable<&'a ClassTrait>,
    depth: usize,
}

impl<'a, T> Amf3Encoder<'a, T>
where
    T: BufMut,
{
    pub fn new(buf: T) -> Self {
        Self::with_config(buf, Amf3Config::default())
    }

    pub fn with_config(buf: T, config: Amf3Config) -> Self {
        Self {
            buf,
            config,
            strings: ReferenceTable::new(),
            objects: ReferenceTable::new(),
            traits: ReferenceTable::new(),
            depth: 0,
        }
    }

    pub fn into_inner(self) -> T {
        self.buf
    }

    pub fn encode_values(&mut self, amf_values: &'a [Amf3Value]) -> Result<(), EncodingError> {
        for amf_value in amf_values {
            self.encode_value(amf_value)?;
        }
        Ok(())
    }

    pub fn encode_value(&mut self, amf_value: &'a Amf3Value) -> Result<(), EncodingError> {
        match amf_value {
            Amf3Value::Undefined => self.put_marker(Amf3TypeCode::Undefined),
            Amf3Value::Null => self.put_marker(Amf3TypeCode::Null),
            Amf3Value::Boolean(b) => self.put_boolean(*b),
            Amf3Value::Integer(i) => self.put_integer(*i)?,
            Amf3Value::Double(d) => self.put_double(*d),
            Amf3Value::String(s) => self.put_string(s)?,
            Amf3Value::Date(d) => self.put_date(amf_value, d)?,
            Amf3Value::Array(a) => self.nested(|encoder| encoder.put_array(amf_value, a))?,
            Amf3Value::Object(o) => self.nested(|encoder| encoder.put_object(amf_value, o))?,
        }
        Ok(())
    }

    fn put_marker(&mut self, marker: Amf3TypeCode) {
        self.buf.put_u8(marker.into_raw());
    }

    fn put_boolean(&mut self, b: bool) {
        match b {
            false => self.put_marker(Amf3TypeCode::False),
            true => self.put_marker(Amf3TypeCode::True),
        }
    }

    fn put_integer(&mut self, i29: i32) -> Result<(), EncodingError> {
        if !(I29_MIN..=I29_MAX).contains(&i29) {
            return Err(EncodingError::IntegerOutOfRange(i29));
        }

        self.put_marker(Amf3TypeCode::Integer);
        // Two's complement truncated to 29 bits.
        let u29 = (i29 as u32) & 0x1F_FF_FF_FF;
        self.put_u29(u29 as usize)
    }

    fn put_double(&mut self, d: f64) {
        self.put_marker(Amf3TypeCode::Number);
        self.buf.put_f64(d);
    }

    fn put_string(&mut self, s: &Bytes) -> Result<(), EncodingError> {
        self.put_marker(Amf3TypeCode::String);
        self.put_string_raw(s)
    }

    fn put_string_raw(&mut self, s: &Bytes) -> Result<(), EncodingError> {
        // The empty string is always inline and never enters the table.
        if s.is_empty() {
            return self.put_u29(0b1);
        }

        if let Some(idx) = self.strings.index_of_key(s) {
            return self.put_u29(idx << 1);
        }

        if s.len() > U28_MAX as usize {
            return Err(EncodingError::StringTooLong(s.len()));
        }
        if self.config.validate_utf8 && std::str::from_utf8(s).is_err() {
            return Err(EncodingError::Utf8PolicyViolation(
                String::from_utf8_lossy(s).into_owned(),
            ));
        }

        self.put_u29((s.len() << 1) | 0b1)?;
        self.buf.put_slice(s);
        self.strings.push_keyed(s.clone(), s.clone());
        Ok(())
    }

    fn put_date(
        &mut self,
        amf_value: &'a Amf3Value,
        date: &Amf3Date,
    ) -> Result<(), EncodingError> {
        self.put_marker(Amf3TypeCode::Date);
        if self.put_object_reference(amf_value)? {
            return Ok(());
        }

        if let Some(text) = &date.text {
            warn!(?text, "Date text form has no AMF3 representation, dropping it.");
        }

        // For date the only necessary information is if it is a value (`U29D` set to 1). Remaining
        // bits are insignificant, they are set to 0 so the whole value is encoded in 1 byte
        // only.
        self.put_u29(0b1)?;
        self.buf.put_f64(date.millis);
        Ok(())
    }

    fn put_array(
        &mut self,
        amf_value: &'a Amf3Value,
        array: &'a Amf3Array,
    ) -> Result<(), EncodingError> {
        let dense = array.dense();
        if dense.len() > U28_MAX as usize {
            return Err(EncodingError::ArrayTooLong(dense.len()));
        }

        self.put_marker(Amf3TypeCode::Array);
        if self.put_object_reference(amf_value)? {
            return Ok(());
        }

        self.put_u29((dense.len() << 1) | 0b1)?;
        for (key, value) in array.associative_members() {
            self.put_member(key, value)?;
        }
        self.put_string_raw(&Bytes::new())?;

        for value in dense {
            self.encode_value(value)?;
        }
        Ok(())
    }

    fn put_object(
        &mut self,
        amf_value: &'a Amf3Value,
        object: &'a Amf3Object,
    ) -> Result<(), EncodingError> {
        let class_trait = object.class_trait();
        Self::validate_object(object)?;

        self.put_marker(Amf3TypeCode::Object);
        if self.put_object_reference(amf_value)? {
            return Ok(());
        }

        match self.traits.position(|seen| *seen == class_trait) {
            Some(idx) => {
                // Inline object, trait reference.
                self.put_u29((idx << 2) | 0b01)?;
            }
            None => {
                let sealed_members = class_trait.sealed_members();
                let mut u29o = (sealed_members.len() << 4) | 0b0011;
                if class_trait.is_dynamic() {
                    u29o |= 0b1000;
                }

                self.put_u29(u29o)?;
                self.put_string_raw(class_trait.name())?;
                for name in sealed_members {
                    self.put_string_raw(name)?;
                }

                trace!(
                    class_name = %class_trait.lossy_name(),
                    idx = self.traits.len(),
                    "Registered inline trait"
                );
                self.traits.push(class_trait);
            }
        }

        for (_, value) in object.sealed_values() {
            // Presence is checked by `validate_object`.
            if let Some(value) = value {
                self.encode_value(value)?;
            }
        }

        if class_trait.is_dynamic() {
            for (name, value) in object.dynamic_members() {
                self.put_member(name, value)?;
            }
            self.put_string_raw(&Bytes::new())?;
        }

        Ok(())
    }

    /// Checks everything that would make the object body unreadable, before
    /// any byte of it is written.
    fn validate_object(object: &Amf3Object) -> Result<(), EncodingError> {
        let class_trait = object.class_trait();
        let class_name = || class_trait.lossy_name();

        if class_trait.is_externalizable() {
            return Err(EncodingError::ExternalizableTrait(class_name()));
        }

        let sealed_count = class_trait.sealed_members().len();
        if sealed_count > MAX_SEALED_COUNT as usize {
            return Err(EncodingError::SealedMembersCountTooLarge(sealed_count));
        }

        if let Some(member) = class_trait.duplicate_sealed_member() {
            return Err(EncodingError::DuplicateSealedMember {
                class_name: class_name(),
                member: String::from_utf8_lossy(member).into_owned(),
            });
        }

        if let Some((member, _)) = object.sealed_values().find(|(_, value)| value.is_none()) {
            return Err(EncodingError::MissingSealedMember {
                class_name: class_name(),
                member: String::from_utf8_lossy(member).into_owned(),
            });
        }

        let mut sealed_seen = HashSet::new();
        let mut sealed_members = object
            .members()
            .filter(|(name, _)| class_trait.is_sealed_member(name));
        if let Some((member, _)) = sealed_members.find(|(name, _)| !sealed_seen.insert(*name)) {
            return Err(EncodingError::DuplicateMember {
                class_name: class_name(),
                member: String::from_utf8_lossy(member).into_owned(),
            });
        }

        let unexpected = object
            .dynamic_members()
            .next()
            .filter(|_| !class_trait.is_dynamic());
        if let Some((member, _)) = unexpected {
            return Err(EncodingError::UnexpectedDynamicMember {
                class_name: class_name(),
                member: String::from_utf8_lossy(member).into_owned(),
            });
        }

        Ok(())
    }

    fn put_member(&mut self, name: &Bytes, value: &'a Amf3Value) -> Result<(), EncodingError> {
        // An empty name is the end-of-members marker.
        if name.is_empty() {
            return Err(EncodingError::EmptyMemberName);
        }
        self.put_string_raw(name)?;
        self.encode_value(value)
    }

    /// Registers `amf_value` in the object table, or writes a back-reference
    /// to an equal value already written when reuse is enabled. Returns `true`
    /// if a reference was written.
    fn put_object_reference(&mut self, amf_value: &'a Amf3Value) -> Result<bool, EncodingError> {
        if self.config.reuse_object_references {
            // Values still being written are ancestors of `amf_value` and can
            // never compare equal to it.
            if let Some(idx) = self.objects.position(|seen| same_wire_value(seen, amf_value)) {
                trace!(idx, "Writing object reference");
                self.put_u29(idx << 1)?;
                return Ok(true);
            }
        }

        self.objects.push(amf_value);
        Ok(false)
    }

    fn nested<F>(&mut self, encode: F) -> Result<(), EncodingError>
    where
        F: FnOnce(&mut Self) -> Result<(), EncodingError>,
    {
        if self.depth >= self.config.max_nesting_depth {
            return Err(EncodingError::NestingTooDeep(self.config.max_nesting_depth));
        }

        self.depth += 1;
        let result = encode(self);
        self.depth -= 1;
        result
    }

    // https://github.com/q191201771/doc/blob/master/spec-amf-file-format-spec.pdf
    // Check amf3 spec sections 1.3.1 and 3.6 to learn more about how this serialization works
    fn put_u29(&mut self, u29: usize) -> Result<(), EncodingError> {
        const ONE_BYTE_MAX: usize = (1 << 7) - 1;
        const TWO_BYTE_MAX: usize = (1 << 14) - 1;
        const THREE_BYTE_MAX: usize = (1 << 21) - 1;

        match u29 {
            n if n <= ONE_BYTE_MAX => {
                self.buf.put_u8(n as u8);
            }
            n if n <= TWO_BYTE_MAX => {
                self.buf.put_u8(0x80 | (n >> 7) as u8);
                self.buf.put_u8((n & 0x7F) as u8);
            }
            n if n <= THREE_BYTE_MAX => {
                self.buf.put_u8(0x80 | ((n >> 14) & 0x7F) as u8);
                self.buf.put_u8(0x80 | ((n >> 7) & 0x7F) as u8);
                self.buf.put_u8((n & 0x7F) as u8);
            }
            n if n <= U29_MAX => {
                self.buf.put_u8(0x80 | ((n >> 22) & 0x7F) as u8);
                self.buf.put_u8(0x80 | ((n >> 15) & 0x7F) as u8);
                self.buf.put_u8(0x80 | ((n >> 8) & 0x7F) as u8);
                self.buf.put_u8((n & 0xFF) as u8);
            }
            n => return Err(EncodingError::U29OutOfRange(n)),
        }
        Ok(())
    }
}

/// Equality strict enough to substitute one value for the other on the wire.
/// Doubles compare by bits so `-0.0` is not replaced by `0.0`, and members
/// compare in insertion order.
fn same_wire_value(a: &Amf3Value, b: &Amf3Value) -> bool {
    match (a, b) {
        (Amf3Value::Double(a), Amf3Value::Double(b)) => a.to_bits() == b.to_bits(),
        (Amf3Value::Date(a), Amf3Value::Date(b)) => a.millis.to_bits() == b.millis.to_bits(),
        (Amf3Value::Array(a), Amf3Value::Array(b)) => {
            let (a_dense, b_dense) = (a.dense(), b.dense());
            a_dense.len() == b_dense.len()
                && a.associative().len() == b.associative().len()
                && a_dense.iter().zip(b_dense).all(|(a, b)| same_wire_value(a, b))
                && same_members(a.associative_members(), b.associative_members())
        }
        (Amf3Value::Object(a), Amf3Value::Object(b)) => {
            a.class_trait() == b.class_trait()
                && a.len() == b.len()
                && same_members(a.members(), b.members())
        }
        (a, b) => a == b,
    }
}

// Callers check that both sides have the same number of members.
fn same_members<'a, 'b>(
    a: impl Iterator<Item = (&'a Bytes, &'a Amf3Value)>,
    b: impl Iterator<Item = (&'b Bytes, &'b Amf3Value)>,
) -> bool {
    a.zip(b)
        .all(|((a_name, a), (b_name, b))| a_name == b_name && same_wire_value(a, b))
}

impl Amf3Encoder<'_, BytesMut> {
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}
