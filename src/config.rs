/// Options shared by a decode or encode session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amf3Config {
    /// Maximum number of nested arrays/objects before the session fails with
    /// `NestingTooDeep`. Bounds recursion on hostile input.
    pub max_nesting_depth: usize,
    /// Reject strings (values, member names, class names) that are not valid
    /// UTF-8. Off by default, strings are carried as opaque octets.
    pub validate_utf8: bool,
    /// Let the encoder emit object-table back-references for arrays, objects
    /// and dates structurally equal to one already written in the session.
    /// Off by default, every such value is written inline.
    pub reuse_object_references: bool,
    /// Maximum number of values a decode session may produce, counting every
    /// value reachable through back-references. A few bytes of nested
    /// references can expand into an exponentially large tree.
    pub max_decoded_values: usize,
}

impl Default for Amf3Config {
    fn default() -> Self {
        Self {
            max_nesting_depth: 128,
            validate_utf8: false,
            reuse_object_references: false,
            max_decoded_values: 1 << 20,
        }
    }
}

impl Amf3Config {
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    pub fn with_utf8_validation(mut self, enabled: bool) -> Self {
        self.validate_utf8 = enabled;
        self
    }

    pub fn with_object_references(mut self, enabled: bool) -> Self {
        self.reuse_object_references = enabled;
        self
    }

    pub fn with_max_decoded_values(mut self, limit: usize) -> Self {
        self.max_decoded_values = limit;
        self
    }
}
