use thiserror::Error;

use crate::kind::ValueKind;

/// Result type alias for lite3 operations.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors produced by the mutation engine and the read-only document view.
///
/// Every mutating operation performs all of its checks before writing the
/// first byte, so an `Err` always leaves the buffer bytes and its logical
/// length exactly as they were.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The append does not fit in the remaining capacity.
    #[error("buffer full: {needed} bytes needed, {available} available")]
    BufferFull {
        /// Bytes the rejected operation would have written.
        needed: usize,
        /// Bytes left between the logical length and the capacity.
        available: usize,
    },
    /// The byte at `offset` is not a known value tag.
    #[error("invalid node at offset {offset}: unknown tag {tag:#04x}")]
    InvalidNode {
        /// Offset of the offending tag byte.
        offset: usize,
        /// The raw tag byte found there.
        tag: u8,
    },
    /// The value at `offset` has a different kind than the operation needs.
    #[error("expected {expected} at offset {offset}, found {found}")]
    UnexpectedKind {
        /// Offset of the value.
        offset: usize,
        /// Kind the operation required.
        expected: ValueKind,
        /// Kind actually stored.
        found: ValueKind,
    },
    /// A node operation was pointed at a scalar value.
    #[error("expected an object or array at offset {offset}, found {found}")]
    NotComposite {
        /// Offset of the value.
        offset: usize,
        /// Kind actually stored.
        found: ValueKind,
    },
    /// No live entry carries the requested key.
    #[error("key not found")]
    KeyNotFound,
    /// Array index past the last element.
    #[error("index {index} out of bounds (len={len})")]
    IndexOutOfBounds {
        /// Requested index.
        index: usize,
        /// Number of elements in the array.
        len: usize,
    },
    /// Keys are stored null-terminated and cannot contain NUL bytes.
    #[error("key contains an interior NUL byte")]
    InvalidKey,
    /// A string or byte payload longer than its 32-bit length field allows.
    #[error("value of {len} bytes exceeds the 32-bit length field")]
    ValueTooLarge {
        /// Payload length in bytes.
        len: usize,
    },
    /// A read ran past the meaningful part of the buffer.
    #[error("offset {offset} out of bounds (len={len})")]
    OutOfBounds {
        /// First offset that could not be read.
        offset: usize,
        /// Logical length of the buffer.
        len: usize,
    },
    /// A composite node offset that is not a multiple of the node alignment.
    #[error("node offset {offset} is not aligned")]
    Misaligned {
        /// The misaligned offset.
        offset: usize,
    },
    /// The node no longer ends at the buffer tail and cannot grow.
    #[error("node at offset {offset} is sealed: later data follows its entries")]
    NodeSealed {
        /// Offset of the sealed node.
        offset: usize,
    },
    /// A stored key or string is not valid UTF-8.
    #[error("invalid UTF-8 at offset {offset}")]
    InvalidUtf8 {
        /// Offset of the first byte of the text.
        offset: usize,
    },
}
