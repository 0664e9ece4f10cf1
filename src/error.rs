use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodingError {
    #[error("Insufficient data: needed {needed} more bytes at offset {position}")]
    TruncatedInput { position: usize, needed: usize },

    #[error("Unknown data type: {0}")]
    UnknownTypeCode(u8),

    #[error("Data type {0} is recognized but not supported")]
    UnsupportedTypeCode(u8),

    #[error("String reference {index} out of bounds (table size {table_size})")]
    InvalidStringReference { index: usize, table_size: usize },

    #[error("Object reference {index} out of bounds (table size {table_size})")]
    InvalidObjectReference { index: usize, table_size: usize },

    #[error("Trait reference {index} out of bounds (table size {table_size})")]
    InvalidTraitReference { index: usize, table_size: usize },

    #[error("Values nested deeper than {0} levels")]
    NestingTooDeep(usize),

    #[error("Decoded value tree exceeds {0} values")]
    ValueBudgetExceeded(usize),

    #[error("Handling of externalizable object traits is not implemented (class {0:?}).")]
    ExternalizableTrait(String),

    #[error("Invalid UTF-8 string at offset {0}")]
    Utf8PolicyViolation(usize),
}

impl DecodingError {
    /// Returns `true` if more input could make the decode succeed.
    ///
    /// Every other variant is structural corruption and retrying with the
    /// same bytes is pointless.
    pub fn is_truncation(&self) -> bool {
        matches!(self, DecodingError::TruncatedInput { .. })
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodingError {
    #[error("Integer {0} does not fit in 29 bits, encode it as a double")]
    IntegerOutOfRange(i32),

    #[error("String too long: {0} bytes (max {})", U28_MAX)]
    StringTooLong(usize),

    #[error("Array too long: {0} elements (max {})", U28_MAX)]
    ArrayTooLong(usize),

    #[error("Too many sealed members: {0} (max {})", MAX_SEALED_COUNT)]
    SealedMembersCountTooLarge(usize),

    #[error("Object of class {class_name:?} has no value for sealed member {member:?}")]
    MissingSealedMember { class_name: String, member: String },

    #[error("Object of non-dynamic class {class_name:?} has extra member {member:?}")]
    UnexpectedDynamicMember { class_name: String, member: String },

    #[error("Class {class_name:?} lists sealed member {member:?} more than once")]
    DuplicateSealedMember { class_name: String, member: String },

    #[error("Object of class {class_name:?} has several values for sealed member {member:?}")]
    DuplicateMember { class_name: String, member: String },

    #[error("Encoding of externalizable object traits is not implemented (class {0:?}).")]
    ExternalizableTrait(String),

    #[error("Member names must not be empty")]
    EmptyMemberName,

    #[error("Value {0} does not fit in a U29")]
    U29OutOfRange(usize),

    #[error("Values nested deeper than {0} levels")]
    NestingTooDeep(usize),

    #[error("String is not valid UTF-8: {0:?}")]
    Utf8PolicyViolation(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("Integer {0} does not fit in the target range")]
    IntegerOutOfRange(i128),

    #[error("Invalid UTF-8 string")]
    InvalidUtf8,

    #[error("Expected {expected} value, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

pub(crate) const U28_MAX: u32 = (1 << 28) - 1;
pub(crate) const MAX_SEALED_COUNT: u32 = (1 << 25) - 1;
