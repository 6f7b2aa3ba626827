//! Decoded views of stored values.
//!
//! [`ValueRef`] borrows scalars straight out of the buffer and refers to
//! nested nodes by offset. [`Value`] is a fully owned tree, convenient for
//! tests and inspection but never needed for mutation.

use alloc::{collections::BTreeMap, string::String, vec::Vec};
use core::fmt;

use bstr::{BStr, BString};

use crate::{
    error::{Error, Result},
    header::{NODE_SIZE, NodeHeader},
    kind::ValueKind,
    offset::Offset,
};

/// Size of the length prefix of string and byte payloads.
pub(crate) const LEN_SIZE: usize = 4;

/// A value read in place from a document.
#[derive(Clone, Copy, PartialEq)]
pub enum ValueRef<'a> {
    /// `null`.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed 64-bit integer.
    I64(i64),
    /// A 64-bit float.
    F64(f64),
    /// Raw bytes.
    Bytes(&'a [u8]),
    /// UTF-8 text.
    Str(&'a str),
    /// Offset of a nested object node.
    Object(Offset),
    /// Offset of a nested array node.
    Array(Offset),
}

impl ValueRef<'_> {
    /// Kind of the stored value.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            ValueRef::Null => ValueKind::Null,
            ValueRef::Bool(_) => ValueKind::Bool,
            ValueRef::I64(_) => ValueKind::I64,
            ValueRef::F64(_) => ValueKind::F64,
            ValueRef::Bytes(_) => ValueKind::Bytes,
            ValueRef::Str(_) => ValueKind::String,
            ValueRef::Object(_) => ValueKind::Object,
            ValueRef::Array(_) => ValueKind::Array,
        }
    }
}

impl fmt::Debug for ValueRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueRef::Null => f.write_str("Null"),
            ValueRef::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            ValueRef::I64(n) => f.debug_tuple("I64").field(n).finish(),
            ValueRef::F64(n) => f.debug_tuple("F64").field(n).finish(),
            ValueRef::Bytes(b) => f.debug_tuple("Bytes").field(&BStr::new(b)).finish(),
            ValueRef::Str(s) => f.debug_tuple("Str").field(s).finish(),
            ValueRef::Object(ofs) => f.debug_tuple("Object").field(ofs).finish(),
            ValueRef::Array(ofs) => f.debug_tuple("Array").field(ofs).finish(),
        }
    }
}

/// Map type of [`Value::Object`]; keys hold the live value of each key.
pub type Map = BTreeMap<String, Value>;

/// A fully decoded, owned value tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// `null`.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed 64-bit integer.
    I64(i64),
    /// A 64-bit float.
    F64(f64),
    /// Raw bytes.
    Bytes(BString),
    /// UTF-8 text.
    String(String),
    /// Live entries of an object; shadowed entries are not part of the tree.
    Object(Map),
    /// Array elements in insertion order.
    Array(Vec<Value>),
}

/// Decode the value whose tag sits at `at`, returning it with the number of
/// bytes it spans. Composite values span their header plus entry region.
pub(crate) fn decode(doc: &[u8], at: usize) -> Result<(ValueRef<'_>, usize)> {
    let tag = *doc.get(at).ok_or(Error::OutOfBounds {
        offset: at,
        len: doc.len(),
    })?;
    let kind = ValueKind::from_tag(tag, at)?;
    let body = at + 1;

    let decoded = match kind {
        ValueKind::Null => (ValueRef::Null, 1),
        ValueKind::Bool => (ValueRef::Bool(fixed::<1>(doc, body)?[0] != 0), 2),
        ValueKind::I64 => (ValueRef::I64(i64::from_le_bytes(fixed(doc, body)?)), 9),
        ValueKind::F64 => (ValueRef::F64(f64::from_le_bytes(fixed(doc, body)?)), 9),
        ValueKind::Bytes => {
            let len = u32::from_le_bytes(fixed(doc, body)?) as usize;
            let start = body + LEN_SIZE;
            let bytes = slice(doc, start, len)?;
            (ValueRef::Bytes(bytes), 1 + LEN_SIZE + len)
        }
        ValueKind::String => {
            let len = u32::from_le_bytes(fixed(doc, body)?) as usize;
            let start = body + LEN_SIZE;
            // Include the terminator so truncated strings are caught here.
            let with_nul = slice(doc, start, len + 1)?;
            let text = core::str::from_utf8(&with_nul[..len])
                .map_err(|_| Error::InvalidUtf8 { offset: start })?;
            (ValueRef::Str(text), 1 + LEN_SIZE + len + 1)
        }
        ValueKind::Object | ValueKind::Array => {
            let header = NodeHeader::read(doc, at)?;
            let ofs = Offset::new(at);
            let value = if kind == ValueKind::Object {
                ValueRef::Object(ofs)
            } else {
                ValueRef::Array(ofs)
            };
            debug_assert!(header.end >= at + NODE_SIZE);
            (value, header.end - at)
        }
    };
    Ok(decoded)
}

fn slice(doc: &[u8], start: usize, len: usize) -> Result<&[u8]> {
    start
        .checked_add(len)
        .and_then(|end| doc.get(start..end))
        .ok_or(Error::OutOfBounds {
            offset: start,
            len: doc.len(),
        })
}

fn fixed<const N: usize>(doc: &[u8], start: usize) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    out.copy_from_slice(slice(doc, start, N)?);
    Ok(out)
}
