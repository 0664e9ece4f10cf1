use bytes::Bytes;

use crate::{Amf3Array, Amf3Object, Amf3TypeCode, ConversionError};

pub const I29_MAX: i32 = (1 << 28) - 1;
pub const I29_MIN: i32 = -(1 << 28);

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Amf3Value {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    /// 29-bit signed integer, see [`I29_MIN`] and [`I29_MAX`].
    Integer(i32),
    Double(f64),
    /// UTF-8 octets. Not validated unless the session asks for it.
    String(Bytes),
    Date(Amf3Date),
    Array(Amf3Array),
    Object(Amf3Object),
}

/// Milliseconds since the Unix epoch.
///
/// `text` is an optional human-readable form kept for the caller. It is not
/// part of the wire format and is ignored by equality.
#[derive(Debug, Clone, Default)]
pub struct Amf3Date {
    pub millis: f64,
    pub text: Option<String>,
}

impl Amf3Date {
    pub fn new(millis: f64) -> Self {
        Self { millis, text: None }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

impl PartialEq for Amf3Date {
    fn eq(&self, other: &Self) -> bool {
        self.millis == other.millis
    }
}

impl Amf3Value {
    /// Integer when `value` fits in 29 bits, double otherwise.
    pub fn from_i64(value: i64) -> Self {
        if (i64::from(I29_MIN)..=i64::from(I29_MAX)).contains(&value) {
            Amf3Value::Integer(value as i32)
        } else {
            Amf3Value::Double(value as f64)
        }
    }

    pub fn type_code(&self) -> Amf3TypeCode {
        match self {
            Amf3Value::Undefined => Amf3TypeCode::Undefined,
            Amf3Value::Null => Amf3TypeCode::Null,
            Amf3Value::Boolean(false) => Amf3TypeCode::False,
            Amf3Value::Boolean(true) => Amf3TypeCode::True,
            Amf3Value::Integer(_) => Amf3TypeCode::Integer,
            Amf3Value::Double(_) => Amf3TypeCode::Number,
            Amf3Value::String(_) => Amf3TypeCode::String,
            Amf3Value::Date(_) => Amf3TypeCode::Date,
            Amf3Value::Array(_) => Amf3TypeCode::Array,
            Amf3Value::Object(_) => Amf3TypeCode::Object,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Amf3Value::Undefined => "undefined",
            Amf3Value::Null => "null",
            Amf3Value::Boolean(_) => "boolean",
            Amf3Value::Integer(_) => "integer",
            Amf3Value::Double(_) => "double",
            Amf3Value::String(_) => "string",
            Amf3Value::Date(_) => "date",
            Amf3Value::Array(_) => "array",
            Amf3Value::Object(_) => "object",
        }
    }

    pub fn is_null_or_undefined(&self) -> bool {
        matches!(self, Amf3Value::Null | Amf3Value::Undefined)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Amf3Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Amf3Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value, integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Amf3Value::Integer(i) => Some(f64::from(*i)),
            Amf3Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Amf3Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// String contents, `None` for other types or octets that are not UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(self.as_bytes()?).ok()
    }

    pub fn as_date(&self) -> Option<&Amf3Date> {
        match self {
            Amf3Value::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Amf3Array> {
        match self {
            Amf3Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Amf3Object> {
        match self {
            Amf3Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Member of an object or associative member of an array.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<&Amf3Value> {
        match self {
            Amf3Value::Object(o) => o.get(key),
            Amf3Value::Array(a) => a.get_by_key(key),
            _ => None,
        }
    }
}

impl From<bool> for Amf3Value {
    fn from(v: bool) -> Self {
        Amf3Value::Boolean(v)
    }
}

macro_rules! impl_from_small_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Amf3Value {
                fn from(v: $t) -> Self {
                    Amf3Value::Integer(i32::from(v))
                }
            }
        )*
    };
}

impl_from_small_int!(i8, i16, u8, u16);

macro_rules! impl_try_from_wide_int {
    ($($t:ty),*) => {
        $(
            impl TryFrom<$t> for Amf3Value {
                type Error = ConversionError;

                fn try_from(v: $t) -> Result<Self, Self::Error> {
                    let wide = i128::from(v);
                    if (i128::from(I29_MIN)..=i128::from(I29_MAX)).contains(&wide) {
                        Ok(Amf3Value::Integer(wide as i32))
                    } else {
                        Err(ConversionError::IntegerOutOfRange(wide))
                    }
                }
            }
        )*
    };
}

impl_try_from_wide_int!(i32, i64, u32, u64);

impl From<f64> for Amf3Value {
    fn from(v: f64) -> Self {
        Amf3Value::Double(v)
    }
}

impl From<f32> for Amf3Value {
    fn from(v: f32) -> Self {
        Amf3Value::Double(f64::from(v))
    }
}

impl From<&str> for Amf3Value {
    fn from(v: &str) -> Self {
        Amf3Value::String(Bytes::copy_from_slice(v.as_bytes()))
    }
}

impl From<String> for Amf3Value {
    fn from(v: String) -> Self {
        Amf3Value::String(Bytes::from(v))
    }
}

impl From<Bytes> for Amf3Value {
    fn from(v: Bytes) -> Self {
        Amf3Value::String(v)
    }
}

impl From<Amf3Date> for Amf3Value {
    fn from(v: Amf3Date) -> Self {
        Amf3Value::Date(v)
    }
}

impl From<Amf3Array> for Amf3Value {
    fn from(v: Amf3Array) -> Self {
        Amf3Value::Array(v)
    }
}

impl From<Amf3Object> for Amf3Value {
    fn from(v: Amf3Object) -> Self {
        Amf3Value::Object(v)
    }
}

impl TryFrom<&Amf3Value> for bool {
    type Error = ConversionError;

    fn try_from(value: &Amf3Value) -> Result<Self, Self::Error> {
        value.as_bool().ok_or(ConversionError::TypeMismatch {
            expected: "boolean",
            found: value.type_name(),
        })
    }
}

impl TryFrom<&Amf3Value> for f64 {
    type Error = ConversionError;

    fn try_from(value: &Amf3Value) -> Result<Self, Self::Error> {
        value.as_f64().ok_or(ConversionError::TypeMismatch {
            expected: "number",
            found: value.type_name(),
        })
    }
}

impl TryFrom<&Amf3Value> for String {
    type Error = ConversionError;

    fn try_from(value: &Amf3Value) -> Result<Self, Self::Error> {
        let bytes = value.as_bytes().ok_or(ConversionError::TypeMismatch {
            expected: "string",
            found: value.type_name(),
        })?;
        String::from_utf8(bytes.to_vec()).map_err(|_| ConversionError::InvalidUtf8)
    }
}

// Doubles are truncated toward zero (saturating), integers must fit.
macro_rules! impl_int_from_value {
    ($($t:ty),*) => {
        $(
            impl TryFrom<&Amf3Value> for $t {
                type Error = ConversionError;

                fn try_from(value: &Amf3Value) -> Result<Self, Self::Error> {
                    match value {
                        Amf3Value::Integer(i) => <$t>::try_from(*i)
                            .map_err(|_| ConversionError::IntegerOutOfRange(i128::from(*i))),
                        Amf3Value::Double(d) => Ok(*d as $t),
                        other => Err(ConversionError::TypeMismatch {
                            expected: "number",
                            found: other.type_name(),
                        }),
                    }
                }
            }
        )*
    };
}

impl_int_from_value!(i8, i16, i32, i64, u8, u16, u32, u64);
