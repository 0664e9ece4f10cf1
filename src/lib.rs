//! AMF3 (Action Message Format 3) values and codec.
//!
//! ```
//! use amf3::{Amf3Array, Amf3Value, decode, encode};
//!
//! let mut array = Amf3Array::new();
//! array.insert("answer", Amf3Value::Integer(42));
//! array.push("kremówki");
//!
//! let value = Amf3Value::Array(array);
//! let bytes = encode(&value).unwrap();
//! assert_eq!(decode(bytes).unwrap(), value);
//! ```

mod array;
mod class_trait;
mod config;
mod decoding;
mod encoding;
mod error;
mod object;
mod reference_table;
mod type_code;
mod value;

#[cfg(test)]
mod amf3_tests;

pub use array::Amf3Array;
pub use class_trait::ClassTrait;
pub use config::Amf3Config;
pub use decoding::{Amf3Decoder, decode, decode_with_config};
pub use encoding::{Amf3Encoder, encode, encode_with_config};
pub use error::{ConversionError, DecodingError, EncodingError};
pub use object::Amf3Object;
pub use reference_table::ReferenceTable;
pub use type_code::Amf3TypeCode;
pub use value::{Amf3Date, Amf3Value, I29_MAX, I29_MIN};
