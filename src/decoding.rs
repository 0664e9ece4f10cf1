use std::cell::OnceCell;

use bytes::{Buf, Bytes};
use tracing::{debug, trace};

use crate::{
    Amf3Array, Amf3Config, Amf3Date, Amf3Object, Amf3TypeCode, Amf3Value, ClassTrait,
    DecodingError, ReferenceTable,
};

/// Decode exactly one AMF3 value starting at the first byte of `amf_bytes`.
///
/// Bytes following the value are ignored, framing several values is up to the
/// caller (see [`Amf3Decoder::decode_all`]).
pub fn decode(amf_bytes: impl Into<Bytes>) -> Result<Amf3Value, DecodingError> {
    decode_with_config(amf_bytes, &Amf3Config::default())
}

pub fn decode_with_config(
    amf_bytes: impl Into<Bytes>,
    config: &Amf3Config,
) -> Result<Amf3Value, DecodingError> {
    let mut decoder = Amf3Decoder::with_config(amf_bytes.into(), config.clone());
    let value = decoder.decode_value()?;
    if decoder.remaining() > 0 {
        debug!(
            trailing = decoder.remaining(),
            "Trailing bytes after AMF3 value"
        );
    }
    Ok(value)
}

/// One decode session.
///
/// Holds the cursor and the string, object and trait reference tables. Values
/// decoded by the same session may back-reference each other.
pub struct Amf3Decoder<T> {
    buf: T,
    initial_len: usize,
    config: Amf3Config,
    strings: ReferenceTable<Bytes>,
    // Slots are reserved before an array/object body is read and filled once
    // it is complete, an empty slot is a reference into a value in progress.
    // Each value is stored with the number of values in its tree.
    objects: ReferenceTable<OnceCell<(Amf3Value, usize)>>,
    traits: ReferenceTable<ClassTrait>,
    depth: usize,
    decoded_values: usize,
}

impl<T> Amf3Decoder<T>
where
    T: Buf,
{
    pub fn new(amf_buf: T) -> Self {
        Self::with_config(amf_buf, Amf3Config::default())
    }

    pub fn with_config(amf_buf: T, config: Amf3Config) -> Self {
        Self {
            initial_len: amf_buf.remaining(),
            buf: amf_buf,
            config,
            strings: ReferenceTable::new(),
            objects: ReferenceTable::new(),
            traits: ReferenceTable::new(),
            depth: 0,
            decoded_values: 0,
        }
    }

    /// Offset of the cursor from the start of the buffer.
    pub fn position(&self) -> usize {
        self.initial_len - self.buf.remaining()
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// Decode values until the buffer is exhausted.
    pub fn decode_all(mut self) -> Result<Vec<Amf3Value>, DecodingError> {
        let mut amf_values = vec![];
        while self.buf.has_remaining() {
            amf_values.push(self.decode_value()?);
        }
        Ok(amf_values)
    }

    pub fn decode_value(&mut self) -> Result<Amf3Value, DecodingError> {
        let marker = self.read_u8()?;
        self.charge(1)?;

        match Amf3TypeCode::try_from_raw(marker)? {
            Amf3TypeCode::Undefined => Ok(Amf3Value::Undefined),
            Amf3TypeCode::Null => Ok(Amf3Value::Null),
            Amf3TypeCode::False => Ok(Amf3Value::Boolean(false)),
            Amf3TypeCode::True => Ok(Amf3Value::Boolean(true)),
            Amf3TypeCode::Integer => Ok(Amf3Value::Integer(self.decode_i29()?)),
            Amf3TypeCode::Number => Ok(Amf3Value::Double(self.decode_f64()?)),
            Amf3TypeCode::String => Ok(Amf3Value::String(self.decode_string_raw()?)),
            Amf3TypeCode::Date => self.decode_date(),
            Amf3TypeCode::Array => self.nested(Self::decode_array),
            Amf3TypeCode::Object => self.nested(Self::decode_object),
            Amf3TypeCode::LegacyXmlDocument | Amf3TypeCode::Xml | Amf3TypeCode::ByteArray => {
                Err(DecodingError::UnsupportedTypeCode(marker))
            }
        }
    }

    fn decode_date(&mut self) -> Result<Amf3Value, DecodingError> {
        // Only the inline flag of the date header is significant.
        let decode = |decoder: &mut Self, _: usize| {
            let millis = decoder.decode_f64()?;
            Ok(Amf3Value::Date(Amf3Date::new(millis)))
        };

        self.decode_complex(decode)
    }

    fn decode_array(&mut self) -> Result<Amf3Value, DecodingError> {
        let decode = |decoder: &mut Self, dense_count: usize| {
            let mut array = Amf3Array::new();
            for (key, value) in decoder.decode_pairs()? {
                array.insert(key, value);
            }

            // Every value takes at least one byte, reject absurd counts before
            // looping over them.
            decoder.ensure_remaining(dense_count)?;
            for _ in 0..dense_count {
                array.push(decoder.decode_value()?);
            }

            Ok(Amf3Value::Array(array))
        };

        self.decode_complex(decode)
    }

    fn decode_object(&mut self) -> Result<Amf3Value, DecodingError> {
        let decode = |decoder: &mut Self, u28: usize| {
            let amf_trait = decoder.decode_object_trait(u28)?;
            let sealed_members = amf_trait.sealed_members().to_vec();
            let dynamic = amf_trait.is_dynamic();

            let mut object = Amf3Object::new(amf_trait);
            for name in sealed_members {
                let value = decoder.decode_value()?;
                object.insert(name, value);
            }

            if dynamic {
                for (name, value) in decoder.decode_pairs()? {
                    object.insert(name, value);
                }
            }

            Ok(Amf3Value::Object(object))
        };

        self.decode_complex(decode)
    }

    /// Reads the reference-or-inline header shared by dates, arrays and
    /// objects. Inline values get an object table slot before `decode` runs.
    fn decode_complex<F>(&mut self, decode: F) -> Result<Amf3Value, DecodingError>
    where
        F: FnOnce(&mut Self, usize) -> Result<Amf3Value, DecodingError>,
    {
        let u29 = self.decode_u29()?;
        let has_value = (u29 & 0b1) == 1;
        let u28 = (u29 >> 1) as usize;

        if !has_value {
            return self.object_reference(u28);
        }

        let slot = self.objects.push(OnceCell::new());
        let decoded_before = self.decoded_values;
        let amf_value = decode(self, u28)?;
        // The value itself was charged before `decoded_before` was taken.
        let size = self.decoded_values - decoded_before + 1;
        if let Some(cell) = self.objects.get(slot) {
            let _ = cell.set((amf_value.clone(), size));
        }
        Ok(amf_value)
    }

    fn object_reference(&mut self, idx: usize) -> Result<Amf3Value, DecodingError> {
        let (amf_value, size) = self
            .objects
            .get(idx)
            .and_then(OnceCell::get)
            .ok_or(DecodingError::InvalidObjectReference {
                index: idx,
                table_size: self.objects.len(),
            })?;

        // The reference marker is already charged, the copy counts for the
        // rest of the referenced tree.
        let decoded_values = self.decoded_values + size.saturating_sub(1);
        if decoded_values > self.config.max_decoded_values {
            return Err(DecodingError::ValueBudgetExceeded(
                self.config.max_decoded_values,
            ));
        }

        trace!(idx, size = *size, "Resolved object reference");
        let amf_value = amf_value.clone();
        self.decoded_values = decoded_values;
        Ok(amf_value)
    }

    fn decode_object_trait(&mut self, u28: usize) -> Result<ClassTrait, DecodingError> {
        // https://github.com/q191201771/doc/blob/master/spec-amf-file-format-spec.pdf
        // Flags explained in section 3.12

        const TRAIT_HAS_VALUE_FLAG: usize = 0b1;
        const EXTERNALIZABLE_FLAG: usize = 0b1;
        const DYNAMIC_MEMBERS_FLAG: usize = 0b10;

        if (u28 & TRAIT_HAS_VALUE_FLAG) == 0 {
            let trait_idx = u28 >> 1;
            return self
                .traits
                .get(trait_idx)
                .cloned()
                .ok_or(DecodingError::InvalidTraitReference {
                    index: trait_idx,
                    table_size: self.traits.len(),
                });
        }

        let trait_marker = u28 >> 1;
        let externalizable = (trait_marker & EXTERNALIZABLE_FLAG) != 0;
        let dynamic = (trait_marker & DYNAMIC_MEMBERS_FLAG) != 0;
        let sealed_count = trait_marker >> 2;

        let class_name = self.decode_string_raw()?;
        if externalizable {
            return Err(DecodingError::ExternalizableTrait(
                String::from_utf8_lossy(&class_name).into_owned(),
            ));
        }

        // Each name takes at least one byte.
        self.ensure_remaining(sealed_count)?;
        let field_names = (0..sealed_count)
            .map(|_| self.decode_string_raw())
            .collect::<Result<Vec<_>, _>>()?;

        let amf_trait = ClassTrait::new(class_name, field_names, dynamic, false);
        trace!(
            class_name = %amf_trait.lossy_name(),
            sealed_count,
            dynamic,
            "Registered inline trait"
        );
        self.traits.push(amf_trait.clone());
        Ok(amf_trait)
    }

    /// Reads (name, value) pairs until the empty name terminator.
    fn decode_pairs(&mut self) -> Result<Vec<(Bytes, Amf3Value)>, DecodingError> {
        let mut pairs = vec![];
        loop {
            let key = self.decode_string_raw()?;
            if key.is_empty() {
                return Ok(pairs);
            }

            let value = self.decode_value()?;
            pairs.push((key, value));
        }
    }

    fn decode_string_raw(&mut self) -> Result<Bytes, DecodingError> {
        let u29 = self.decode_u29()?;
        let has_value = (u29 & 0b1) == 1;
        let u28 = (u29 >> 1) as usize;

        if !has_value {
            return self
                .strings
                .get(u28)
                .cloned()
                .ok_or(DecodingError::InvalidStringReference {
                    index: u28,
                    table_size: self.strings.len(),
                });
        }

        // Empty strings are never added to the reference table.
        if u28 == 0 {
            return Ok(Bytes::new());
        }

        self.ensure_remaining(u28)?;
        let position = self.position();
        let string = self.buf.copy_to_bytes(u28);
        if self.config.validate_utf8 && std::str::from_utf8(&string).is_err() {
            return Err(DecodingError::Utf8PolicyViolation(position));
        }

        self.strings.push(string.clone());
        Ok(string)
    }

    fn decode_f64(&mut self) -> Result<f64, DecodingError> {
        self.ensure_remaining(8)?;
        Ok(self.buf.get_f64())
    }

    // https://github.com/q191201771/doc/blob/master/spec-amf-file-format-spec.pdf
    // Check amf3 spec sections 1.3.1 and 3.6 to learn more about how this serialization works
    fn decode_u29(&mut self) -> Result<u32, DecodingError> {
        let mut result: u32 = 0;

        for _ in 0..3 {
            let byte = self.read_u8()?;
            result = (result << 7) | u32::from(byte & 0x7F);
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }

        let byte = self.read_u8()?;
        Ok((result << 8) | u32::from(byte))
    }

    fn decode_i29(&mut self) -> Result<i32, DecodingError> {
        let u29 = self.decode_u29()?;
        if u29 & (1 << 28) != 0 {
            Ok((u29 as i32) - (1 << 29))
        } else {
            Ok(u29 as i32)
        }
    }

    fn read_u8(&mut self) -> Result<u8, DecodingError> {
        self.ensure_remaining(1)?;
        Ok(self.buf.get_u8())
    }

    fn ensure_remaining(&self, needed: usize) -> Result<(), DecodingError> {
        let remaining = self.buf.remaining();
        if remaining < needed {
            return Err(DecodingError::TruncatedInput {
                position: self.position(),
                needed: needed - remaining,
            });
        }
        Ok(())
    }

    fn charge(&mut self, count: usize) -> Result<(), DecodingError> {
        self.decoded_values += count;
        if self.decoded_values > self.config.max_decoded_values {
            return Err(DecodingError::ValueBudgetExceeded(
                self.config.max_decoded_values,
            ));
        }
        Ok(())
    }

    fn nested<F>(&mut self, decode: F) -> Result<Amf3Value, DecodingError>
    where
        F: FnOnce(&mut Self) -> Result<Amf3Value, DecodingError>,
    {
        if self.depth >= self.config.max_nesting_depth {
            return Err(DecodingError::NestingTooDeep(self.config.max_nesting_depth));
        }

        self.depth += 1;
        let result = decode(self);
        self.depth -= 1;
        result
    }
}
