//! Appending entries at the buffer tail.
//!
//! Inserts and updates share one write path: the new entry always goes to
//! the end of the buffer, and an older entry for the same key is left in
//! place, shadowed. Only a node whose region reaches the tail (an *open*
//! node) can grow; every check runs before the first byte is written.

use crate::{
    align::{padding_needed, required_alignment},
    buffer::Buffer,
    diag::{debug, trace},
    error::{Error, Result},
    header::{NODE_SIZE, NodeHeader},
    kind::{KEY_TAG, ValueKind},
    offset::Offset,
    value::LEN_SIZE,
};

/// Outcome of a successful keyed write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Written {
    /// Offset of the new value's tag byte; for objects and arrays, the
    /// offset of the new node.
    pub offset: Offset,
    /// Value offset of the entry that was authoritative for the key before
    /// this write, if any. Its bytes stay in the buffer.
    pub shadowed: Option<Offset>,
}

/// A value about to be encoded.
#[derive(Debug, Clone, Copy)]
enum Payload<'v> {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    Bytes(&'v [u8]),
    Str(&'v str),
    Node(ValueKind),
}

fn length_field(len: usize) -> Result<[u8; LEN_SIZE]> {
    u32::try_from(len)
        .map(u32::to_le_bytes)
        .map_err(|_| Error::ValueTooLarge { len })
}

impl Payload<'_> {
    fn kind(self) -> ValueKind {
        match self {
            Payload::Null => ValueKind::Null,
            Payload::Bool(_) => ValueKind::Bool,
            Payload::I64(_) => ValueKind::I64,
            Payload::F64(_) => ValueKind::F64,
            Payload::Bytes(_) => ValueKind::Bytes,
            Payload::Str(_) => ValueKind::String,
            Payload::Node(kind) => kind,
        }
    }

    /// Encoded size, tag included.
    fn encoded_len(self) -> Result<usize> {
        Ok(match self {
            Payload::Null => 1,
            Payload::Bool(_) => 2,
            Payload::I64(_) | Payload::F64(_) => 9,
            Payload::Bytes(b) => {
                length_field(b.len())?;
                1 + LEN_SIZE + b.len()
            }
            Payload::Str(s) => {
                length_field(s.len())?;
                1 + LEN_SIZE + s.len() + 1
            }
            Payload::Node(_) => NODE_SIZE,
        })
    }

    /// Encode into `dst`, which is exactly `encoded_len` bytes long and
    /// starts at offset `at` of the buffer.
    #[allow(clippy::cast_possible_truncation)]
    fn write(self, dst: &mut [u8], at: usize, parent: Offset) {
        if let Payload::Node(kind) = self {
            NodeHeader::empty(kind, at, Some(parent)).write(dst);
            return;
        }
        dst[0] = self.kind().tag();
        let body = &mut dst[1..];
        match self {
            Payload::Null | Payload::Node(_) => {}
            Payload::Bool(b) => body[0] = u8::from(b),
            Payload::I64(n) => body.copy_from_slice(&n.to_le_bytes()),
            Payload::F64(n) => body.copy_from_slice(&n.to_le_bytes()),
            Payload::Bytes(b) => {
                // Length was validated by `encoded_len`.
                body[..LEN_SIZE].copy_from_slice(&(b.len() as u32).to_le_bytes());
                body[LEN_SIZE..].copy_from_slice(b);
            }
            Payload::Str(s) => {
                body[..LEN_SIZE].copy_from_slice(&(s.len() as u32).to_le_bytes());
                let (text, nul) = body[LEN_SIZE..].split_at_mut(s.len());
                text.copy_from_slice(s.as_bytes());
                nul[0] = 0;
            }
        }
    }
}

impl Buffer<'_> {
    /// Append one entry to the node at `parent`: keyed for objects, bare for
    /// arrays.
    fn append(&mut self, parent: Offset, key: Option<&str>, payload: Payload<'_>) -> Result<Written> {
        let node_kind = if key.is_some() {
            ValueKind::Object
        } else {
            ValueKind::Array
        };
        let tail = self.len();

        let doc = self.doc();
        let header = doc.node(parent, node_kind)?;
        if header.end != tail {
            debug!(node = parent.get(), end = header.end, tail, "append rejected: node sealed");
            return Err(Error::NodeSealed {
                offset: parent.get(),
            });
        }
        // The regions of all ancestors of an open node reach the tail too.
        let mut ancestor = header.parent;
        while let Some(at) = ancestor {
            let up = NodeHeader::read(doc.as_bytes(), at.get())?;
            if up.end != tail {
                return Err(Error::InvalidNode {
                    offset: at.get(),
                    tag: up.kind.tag(),
                });
            }
            ancestor = up.parent;
        }
        let shadowed = match key {
            Some(key) if key.as_bytes().contains(&0) => return Err(Error::InvalidKey),
            Some(key) => doc.resolve(parent, key)?,
            None => None,
        };

        let key_span = key.map_or(0, |k| 1 + k.len() + 1);
        let value_len = payload.encoded_len()?;
        let pad = padding_needed(tail + key_span, required_alignment(payload.kind()));
        let total = (pad + key_span)
            .checked_add(value_len)
            .ok_or(Error::ValueTooLarge { len: value_len })?;
        self.reserve(total)?;

        let value_at = tail + pad + key_span;
        let new_len = tail + total;
        let padding = self.options().padding.byte();
        let bytes = self.bytes_mut();

        let entry = &mut bytes[tail..new_len];
        entry[..pad].fill(padding);
        if let Some(key) = key {
            let key_end = pad + 1 + key.len();
            entry[pad] = KEY_TAG;
            entry[pad + 1..key_end].copy_from_slice(key.as_bytes());
            entry[key_end] = 0;
        }
        payload.write(&mut entry[pad + key_span..], value_at, parent);

        NodeHeader {
            end: new_len,
            entry_count: header.entry_count + 1,
            live_count: header.live_count + u32::from(shadowed.is_none()),
            ..header
        }
        .write_fields(&mut bytes[parent.get()..]);
        let mut ancestor = header.parent;
        while let Some(at) = ancestor {
            let node = &mut bytes[at.get()..];
            NodeHeader::patch_end(node, new_len);
            ancestor = NodeHeader::raw_parent(node);
        }
        self.set_len(new_len);

        trace!(
            node = parent.get(),
            offset = value_at,
            pad,
            span = total,
            shadowed = ?shadowed,
            "appended entry"
        );
        Ok(Written {
            offset: Offset::new(value_at),
            shadowed,
        })
    }

    fn push(&mut self, arr: Offset, payload: Payload<'_>) -> Result<Offset> {
        self.append(arr, None, payload).map(|w| w.offset)
    }

    /// Map `key` to `null` in the object at `obj`.
    ///
    /// # Errors
    ///
    /// [`Error::BufferFull`], [`Error::NodeSealed`], [`Error::InvalidKey`], or
    /// a decode error if `obj` is not an object node.
    pub fn set_null(&mut self, obj: Offset, key: &str) -> Result<Written> {
        self.append(obj, Some(key), Payload::Null)
    }

    /// Map `key` to a boolean.
    ///
    /// # Errors
    ///
    /// See [`Buffer::set_null`].
    pub fn set_bool(&mut self, obj: Offset, key: &str, value: bool) -> Result<Written> {
        self.append(obj, Some(key), Payload::Bool(value))
    }

    /// Map `key` to an integer.
    ///
    /// # Errors
    ///
    /// See [`Buffer::set_null`].
    pub fn set_i64(&mut self, obj: Offset, key: &str, value: i64) -> Result<Written> {
        self.append(obj, Some(key), Payload::I64(value))
    }

    /// Map `key` to a float.
    ///
    /// # Errors
    ///
    /// See [`Buffer::set_null`].
    pub fn set_f64(&mut self, obj: Offset, key: &str, value: f64) -> Result<Written> {
        self.append(obj, Some(key), Payload::F64(value))
    }

    /// Map `key` to raw bytes.
    ///
    /// # Errors
    ///
    /// [`Error::ValueTooLarge`] past `u32::MAX` bytes, otherwise see
    /// [`Buffer::set_null`].
    pub fn set_bytes(&mut self, obj: Offset, key: &str, value: &[u8]) -> Result<Written> {
        self.append(obj, Some(key), Payload::Bytes(value))
    }

    /// Map `key` to a string.
    ///
    /// # Errors
    ///
    /// [`Error::ValueTooLarge`] past `u32::MAX` bytes, otherwise see
    /// [`Buffer::set_null`].
    pub fn set_str(&mut self, obj: Offset, key: &str, value: &str) -> Result<Written> {
        self.append(obj, Some(key), Payload::Str(value))
    }

    /// Map `key` to a new empty object; [`Written::offset`] is the new node.
    ///
    /// The new object is open until something is appended to one of its
    /// ancestors.
    ///
    /// # Errors
    ///
    /// See [`Buffer::set_null`].
    pub fn set_obj(&mut self, obj: Offset, key: &str) -> Result<Written> {
        self.append(obj, Some(key), Payload::Node(ValueKind::Object))
    }

    /// Map `key` to a new empty array; [`Written::offset`] is the new node.
    ///
    /// # Errors
    ///
    /// See [`Buffer::set_null`].
    pub fn set_arr(&mut self, obj: Offset, key: &str) -> Result<Written> {
        self.append(obj, Some(key), Payload::Node(ValueKind::Array))
    }

    /// Append `null` to the array at `arr`, returning the element offset.
    ///
    /// # Errors
    ///
    /// [`Error::BufferFull`], [`Error::NodeSealed`], or a decode error if
    /// `arr` is not an array node.
    pub fn push_null(&mut self, arr: Offset) -> Result<Offset> {
        self.push(arr, Payload::Null)
    }

    /// Append a boolean.
    ///
    /// # Errors
    ///
    /// See [`Buffer::push_null`].
    pub fn push_bool(&mut self, arr: Offset, value: bool) -> Result<Offset> {
        self.push(arr, Payload::Bool(value))
    }

    /// Append an integer.
    ///
    /// # Errors
    ///
    /// See [`Buffer::push_null`].
    pub fn push_i64(&mut self, arr: Offset, value: i64) -> Result<Offset> {
        self.push(arr, Payload::I64(value))
    }

    /// Append a float.
    ///
    /// # Errors
    ///
    /// See [`Buffer::push_null`].
    pub fn push_f64(&mut self, arr: Offset, value: f64) -> Result<Offset> {
        self.push(arr, Payload::F64(value))
    }

    /// Append raw bytes.
    ///
    /// # Errors
    ///
    /// See [`Buffer::push_null`].
    pub fn push_bytes(&mut self, arr: Offset, value: &[u8]) -> Result<Offset> {
        self.push(arr, Payload::Bytes(value))
    }

    /// Append a string.
    ///
    /// # Errors
    ///
    /// See [`Buffer::push_null`].
    pub fn push_str(&mut self, arr: Offset, value: &str) -> Result<Offset> {
        self.push(arr, Payload::Str(value))
    }

    /// Append a new empty object, returning its offset.
    ///
    /// # Errors
    ///
    /// See [`Buffer::push_null`].
    pub fn push_obj(&mut self, arr: Offset) -> Result<Offset> {
        self.push(arr, Payload::Node(ValueKind::Object))
    }

    /// Append a new empty array, returning its offset.
    ///
    /// # Errors
    ///
    /// See [`Buffer::push_null`].
    pub fn push_arr(&mut self, arr: Offset) -> Result<Offset> {
        self.push(arr, Payload::Node(ValueKind::Array))
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::{
        align::Padding,
        options::BufferOptions,
        value::{Value, ValueRef},
    };

    fn zero_padded(bytes: &mut [u8]) -> Buffer<'_> {
        Buffer::with_options(
            bytes,
            BufferOptions {
                padding: Padding::Zero,
            },
        )
    }

    #[test]
    fn scalar_entries_are_unpadded() {
        let mut bytes = [0xEEu8; 512];
        let mut buf = zero_padded(&mut bytes);
        let root = buf.init_obj().unwrap();

        let w = buf.set_i64(root, "n", -1).unwrap();
        // key tag + "n\0" directly after the header
        assert_eq!(w.offset.get(), NODE_SIZE + 3);
        assert_eq!(buf.len(), NODE_SIZE + 3 + 9);

        let w = buf.set_null(root, "z").unwrap();
        assert_eq!(w.offset.get(), NODE_SIZE + 12 + 3);
        assert_eq!(buf.as_bytes()[w.offset.get()], ValueKind::Null.tag());
    }

    #[test]
    fn every_kind_reads_back() {
        let mut bytes = [0u8; 1024];
        let mut buf = zero_padded(&mut bytes);
        let root = buf.init_obj().unwrap();
        buf.set_null(root, "null").unwrap();
        buf.set_bool(root, "bool", true).unwrap();
        buf.set_i64(root, "i64", i64::MIN).unwrap();
        buf.set_f64(root, "f64", 1.5).unwrap();
        buf.set_bytes(root, "bytes", &[0, 1, 2]).unwrap();
        buf.set_str(root, "str", "héllo").unwrap();
        let obj = buf.set_obj(root, "obj").unwrap().offset;
        let arr = buf.set_arr(root, "arr").unwrap().offset;

        let doc = buf.doc();
        assert!(doc.is_null(root, "null").unwrap());
        assert_eq!(doc.get_bool(root, "bool"), Ok(true));
        assert_eq!(doc.get_i64(root, "i64"), Ok(i64::MIN));
        assert_eq!(doc.get_f64(root, "f64"), Ok(1.5));
        assert_eq!(doc.get_bytes(root, "bytes"), Ok(&[0u8, 1, 2][..]));
        assert_eq!(doc.get_str(root, "str"), Ok("héllo"));
        assert_eq!(doc.get_obj(root, "obj"), Ok(obj));
        assert_eq!(doc.get_arr(root, "arr"), Ok(arr));
        assert_eq!(doc.count(root), Ok(8));
        assert_eq!(doc.count(obj), Ok(0));
        assert_eq!(obj.get() % 4, 0);
        assert_eq!(arr.get() % 4, 0);
    }

    #[test]
    fn update_shadows_previous_entry() {
        let mut bytes = [0u8; 512];
        let mut buf = zero_padded(&mut bytes);
        let root = buf.init_obj().unwrap();

        let first = buf.set_i64(root, "k", 1).unwrap();
        assert_eq!(first.shadowed, None);
        let second = buf.set_i64(root, "k", 2).unwrap();
        assert_eq!(second.shadowed, Some(first.offset));
        assert!(second.offset > first.offset);

        let doc = buf.doc();
        assert_eq!(doc.get_i64(root, "k"), Ok(2));
        assert_eq!(doc.value(first.offset), Ok(ValueRef::I64(1)));
        assert_eq!(doc.count(root), Ok(1));
        assert_eq!(doc.entries(root).unwrap().count(), 2);
        assert_eq!(doc.iter(root).unwrap().count(), 1);
    }

    #[test]
    fn nested_appends_extend_ancestors() {
        let mut bytes = [0u8; 1024];
        let mut buf = zero_padded(&mut bytes);
        let root = buf.init_obj().unwrap();
        let a = buf.set_obj(root, "a").unwrap().offset;
        let b = buf.set_obj(a, "b").unwrap().offset;
        buf.set_str(b, "leaf", "x").unwrap();

        let doc = buf.doc();
        for node in [root, a, b] {
            assert_eq!(NodeHeader::read(doc.as_bytes(), node.get()).unwrap().end, buf.len());
        }
        // The root region still holds exactly one entry: "a".
        assert_eq!(doc.entries(root).unwrap().count(), 1);
        assert_eq!(doc.get_str(doc.get_obj(a, "b").unwrap(), "leaf"), Ok("x"));

        // Appending to the root seals both children.
        buf.set_bool(root, "after", false).unwrap();
        let before = buf.as_bytes().to_vec();
        assert_eq!(
            buf.set_i64(a, "late", 1),
            Err(Error::NodeSealed { offset: a.get() })
        );
        assert_eq!(
            buf.set_i64(b, "late", 1),
            Err(Error::NodeSealed { offset: b.get() })
        );
        assert_eq!(buf.as_bytes(), &before[..]);
    }

    #[test]
    fn arrays_keep_insertion_order() {
        let mut bytes = [0u8; 1024];
        let mut buf = zero_padded(&mut bytes);
        let root = buf.init_arr().unwrap();
        buf.push_i64(root, 7).unwrap();
        buf.push_str(root, "two").unwrap();
        let inner = buf.push_obj(root).unwrap();
        buf.set_bool(inner, "deep", true).unwrap();
        buf.push_null(root).unwrap();

        let doc = buf.doc();
        assert_eq!(doc.count(root), Ok(4));
        assert_eq!(doc.arr_get(root, 0), Ok(ValueRef::I64(7)));
        assert_eq!(doc.arr_get(root, 1), Ok(ValueRef::Str("two")));
        assert_eq!(doc.arr_get(root, 2), Ok(ValueRef::Object(inner)));
        assert_eq!(doc.arr_get(root, 3), Ok(ValueRef::Null));
        assert_eq!(
            doc.arr_get(root, 4),
            Err(Error::IndexOutOfBounds { index: 4, len: 4 })
        );
        assert_eq!(inner.get() % 4, 0);

        let mut deep = crate::value::Map::new();
        deep.insert("deep".into(), Value::Bool(true));
        assert_eq!(
            doc.to_value(root),
            Ok(Value::Array(vec![
                Value::I64(7),
                Value::String("two".into()),
                Value::Object(deep),
                Value::Null,
            ]))
        );
    }

    #[test]
    fn wrong_node_kinds_are_rejected() {
        let mut bytes = [0u8; 512];
        let mut buf = zero_padded(&mut bytes);
        let root = buf.init_obj().unwrap();
        let s = buf.set_str(root, "s", "v").unwrap().offset;

        assert!(matches!(
            buf.push_i64(root, 1),
            Err(Error::UnexpectedKind {
                expected: ValueKind::Array,
                found: ValueKind::Object,
                ..
            })
        ));
        assert!(matches!(
            buf.set_i64(s, "k", 1),
            Err(Error::UnexpectedKind {
                found: ValueKind::String,
                ..
            })
        ));
        assert_eq!(buf.set_i64(root, "a\0b", 1), Err(Error::InvalidKey));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn length_fields_are_32_bit() {
        let max = u32::MAX as usize;
        assert_eq!(length_field(max), Ok(u32::MAX.to_le_bytes()));
        assert_eq!(
            length_field(max + 1),
            Err(Error::ValueTooLarge { len: max + 1 })
        );
    }

    #[test]
    fn full_buffer_is_left_untouched() {
        let mut bytes = [0u8; NODE_SIZE + 12];
        let mut buf = zero_padded(&mut bytes);
        let root = buf.init_obj().unwrap();
        buf.set_i64(root, "", 0).unwrap();
        assert_eq!(buf.free(), 1);

        let before = buf.as_bytes().to_vec();
        assert_eq!(
            buf.set_null(root, "x"),
            Err(Error::BufferFull {
                needed: 4,
                available: 1
            })
        );
        assert_eq!(buf.as_bytes(), &before[..]);
        assert_eq!(buf.doc().count(root), Ok(1));
    }
}
