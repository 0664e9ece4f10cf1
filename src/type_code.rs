use crate::DecodingError;

/// Leading marker byte of every AMF3 value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Amf3TypeCode {
    Undefined,         // 0
    Null,              // 1
    False,             // 2
    True,              // 3
    Integer,           // 4
    Number,            // 5
    String,            // 6
    LegacyXmlDocument, // 7
    Date,              // 8
    Array,             // 9
    Object,            // 10 (0x0A)
    Xml,               // 11 (0x0B)
    ByteArray,         // 12 (0x0C)
}

impl Amf3TypeCode {
    pub fn try_from_raw(value: u8) -> Result<Self, DecodingError> {
        match value {
            0 => Ok(Amf3TypeCode::Undefined),
            1 => Ok(Amf3TypeCode::Null),
            2 => Ok(Amf3TypeCode::False),
            3 => Ok(Amf3TypeCode::True),
            4 => Ok(Amf3TypeCode::Integer),
            5 => Ok(Amf3TypeCode::Number),
            6 => Ok(Amf3TypeCode::String),
            7 => Ok(Amf3TypeCode::LegacyXmlDocument),
            8 => Ok(Amf3TypeCode::Date),
            9 => Ok(Amf3TypeCode::Array),
            10 => Ok(Amf3TypeCode::Object),
            11 => Ok(Amf3TypeCode::Xml),
            12 => Ok(Amf3TypeCode::ByteArray),
            _ => Err(DecodingError::UnknownTypeCode(value)),
        }
    }

    pub fn into_raw(self) -> u8 {
        match self {
            Amf3TypeCode::Undefined => 0,
            Amf3TypeCode::Null => 1,
            Amf3TypeCode::False => 2,
            Amf3TypeCode::True => 3,
            Amf3TypeCode::Integer => 4,
            Amf3TypeCode::Number => 5,
            Amf3TypeCode::String => 6,
            Amf3TypeCode::LegacyXmlDocument => 7,
            Amf3TypeCode::Date => 8,
            Amf3TypeCode::Array => 9,
            Amf3TypeCode::Object => 10,
            Amf3TypeCode::Xml => 11,
            Amf3TypeCode::ByteArray => 12,
        }
    }
}
