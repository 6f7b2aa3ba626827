//! Tag byte model for lite3 values.
//!
//! Every value starts with a one-byte tag. Composite kinds (objects and
//! arrays) are followed by the rest of a fixed-size node header, scalar
//! kinds by an inline payload.

use core::fmt;

use crate::error::{Error, Result};

/// Tag byte that opens every object entry, placed right before the key.
pub const KEY_TAG: u8 = 0x4B;

/// The closed set of value kinds with their stable wire discriminants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ValueKind {
    /// No payload.
    Null = 0x01,
    /// One payload byte, `0x00` or `0x01`.
    Bool = 0x02,
    /// Eight little-endian bytes.
    I64 = 0x03,
    /// Eight little-endian bytes of the IEEE 754 bit pattern.
    F64 = 0x04,
    /// 32-bit length followed by raw bytes.
    Bytes = 0x05,
    /// 32-bit length, UTF-8 bytes, then a NUL terminator.
    String = 0x06,
    /// Composite node holding keyed entries.
    Object = 0x07,
    /// Composite node holding positional elements.
    Array = 0x08,
}

impl ValueKind {
    /// Decode a tag byte.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNode`] for bytes outside the known set.
    #[inline]
    pub fn from_tag(tag: u8, offset: usize) -> Result<Self> {
        Ok(match tag {
            0x01 => ValueKind::Null,
            0x02 => ValueKind::Bool,
            0x03 => ValueKind::I64,
            0x04 => ValueKind::F64,
            0x05 => ValueKind::Bytes,
            0x06 => ValueKind::String,
            0x07 => ValueKind::Object,
            0x08 => ValueKind::Array,
            _ => return Err(Error::InvalidNode { offset, tag }),
        })
    }

    /// The raw tag byte.
    #[inline]
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Whether values of this kind carry a node header and nested entries.
    #[inline]
    #[must_use]
    pub const fn is_composite(self) -> bool {
        matches!(self, ValueKind::Object | ValueKind::Array)
    }

    /// Lowercase name, used in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::I64 => "i64",
            ValueKind::F64 => "f64",
            ValueKind::Bytes => "bytes",
            ValueKind::String => "string",
            ValueKind::Object => "object",
            ValueKind::Array => "array",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
