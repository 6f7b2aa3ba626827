//! Read-only view over the meaningful bytes of a lite3 buffer.

use alloc::vec::Vec;

use crate::{
    error::{Error, Result},
    header::{NODE_SIZE, NodeHeader},
    kind::ValueKind,
    locator::{Elements, Entries, Iter, RawEntry},
    offset::Offset,
    value::{self, Map, Value, ValueRef},
};

/// Space accounting for one composite node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    /// Physical entries in the node's region, shadowed ones included.
    pub entries: usize,
    /// Entries that are still authoritative.
    pub live: usize,
    /// Bytes held by shadowed entries, padding and nested nodes included.
    /// Only a rebuild of the document can reclaim them.
    pub orphaned_bytes: usize,
}

/// A read-only document: the bytes `[0, length)` of a buffer.
///
/// A `Document` can be built over bytes that were copied, persisted or
/// mapped from a [`Buffer`](crate::Buffer); offsets stay valid because the
/// format contains no pointers. Reads check every bound, but a document is
/// trusted input: corrupt bytes produce errors, never a full validation
/// report.
#[derive(Debug, Clone, Copy)]
pub struct Document<'a> {
    bytes: &'a [u8],
}

impl<'a> Document<'a> {
    /// View `bytes` as a document; `bytes.len()` is its logical length.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// The underlying bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Logical length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the document holds no bytes (not even a root).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Turn a raw index into an [`Offset`].
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] if `raw` is not below the logical length.
    pub fn offset(&self, raw: usize) -> Result<Offset> {
        if raw < self.bytes.len() {
            Ok(Offset::new(raw))
        } else {
            Err(Error::OutOfBounds {
                offset: raw,
                len: self.bytes.len(),
            })
        }
    }

    /// Kind of the value whose tag byte is at `at`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidNode`] for an unknown tag, [`Error::OutOfBounds`] past
    /// the logical length.
    pub fn kind_at(&self, at: Offset) -> Result<ValueKind> {
        let tag = *self.bytes.get(at.get()).ok_or(Error::OutOfBounds {
            offset: at.get(),
            len: self.bytes.len(),
        })?;
        ValueKind::from_tag(tag, at.get())
    }

    /// Decode the value at `at`.
    ///
    /// # Errors
    ///
    /// Any decode error for the bytes at `at`.
    pub fn value(&self, at: Offset) -> Result<ValueRef<'a>> {
        value::decode(self.bytes, at.get()).map(|(value, _)| value)
    }

    /// Decode the root node.
    ///
    /// # Errors
    ///
    /// Any decode error for the root header.
    pub fn root(&self) -> Result<ValueRef<'a>> {
        self.value(Offset::ROOT)
    }

    pub(crate) fn node(&self, at: Offset, kind: ValueKind) -> Result<NodeHeader> {
        let found = self.kind_at(at)?;
        if found != kind {
            return Err(Error::UnexpectedKind {
                offset: at.get(),
                expected: kind,
                found,
            });
        }
        NodeHeader::read(self.bytes, at.get())
    }

    fn region(&self, header: &NodeHeader) -> &'a [u8] {
        &self.bytes[..header.end]
    }

    /// Every physical entry of the object at `obj`, shadowed ones included.
    ///
    /// # Errors
    ///
    /// Fails if `obj` is not a readable object node.
    pub fn entries(&self, obj: Offset) -> Result<Entries<'a>> {
        let header = self.node(obj, ValueKind::Object)?;
        Ok(Entries::new(self.region(&header), obj.get() + NODE_SIZE))
    }

    /// The live entries of the object at `obj`.
    ///
    /// # Errors
    ///
    /// Fails if `obj` is not a readable object node.
    pub fn iter(&self, obj: Offset) -> Result<Iter<'a>> {
        self.entries(obj).map(Iter::new)
    }

    /// Locate the authoritative entry for `key`: the last one written.
    ///
    /// # Errors
    ///
    /// Fails if `obj` is not a readable object node or an entry before the
    /// end of the region cannot be decoded.
    pub fn find_entry(&self, obj: Offset, key: &str) -> Result<Option<RawEntry<'a>>> {
        let mut found = None;
        for entry in self.entries(obj)? {
            let entry = entry?;
            if entry.key == key {
                found = Some(entry);
            }
        }
        Ok(found)
    }

    /// Offset of the live value for `key`.
    ///
    /// # Errors
    ///
    /// See [`Document::find_entry`].
    pub fn resolve(&self, obj: Offset, key: &str) -> Result<Option<Offset>> {
        Ok(self.find_entry(obj, key)?.map(|e| e.value_offset))
    }

    /// Whether `key` has a live entry.
    ///
    /// # Errors
    ///
    /// See [`Document::find_entry`].
    pub fn contains_key(&self, obj: Offset, key: &str) -> Result<bool> {
        Ok(self.find_entry(obj, key)?.is_some())
    }

    /// The live value for `key`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if the key has no entry, otherwise see
    /// [`Document::find_entry`].
    pub fn get(&self, obj: Offset, key: &str) -> Result<ValueRef<'a>> {
        self.find_entry(obj, key)?
            .map(|e| e.value)
            .ok_or(Error::KeyNotFound)
    }

    fn get_as<T>(
        &self,
        obj: Offset,
        key: &str,
        expected: ValueKind,
        cast: impl FnOnce(ValueRef<'a>) -> Option<T>,
    ) -> Result<T> {
        let entry = self.find_entry(obj, key)?.ok_or(Error::KeyNotFound)?;
        let found = entry.value.kind();
        cast(entry.value).ok_or(Error::UnexpectedKind {
            offset: entry.value_offset.get(),
            expected,
            found,
        })
    }

    /// Whether the live value for `key` is `null`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if the key has no entry.
    pub fn is_null(&self, obj: Offset, key: &str) -> Result<bool> {
        Ok(matches!(self.get(obj, key)?, ValueRef::Null))
    }

    /// The live boolean for `key`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`], or [`Error::UnexpectedKind`] for other kinds.
    pub fn get_bool(&self, obj: Offset, key: &str) -> Result<bool> {
        self.get_as(obj, key, ValueKind::Bool, |v| match v {
            ValueRef::Bool(b) => Some(b),
            _ => None,
        })
    }

    /// The live integer for `key`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`], or [`Error::UnexpectedKind`] for other kinds.
    pub fn get_i64(&self, obj: Offset, key: &str) -> Result<i64> {
        self.get_as(obj, key, ValueKind::I64, |v| match v {
            ValueRef::I64(n) => Some(n),
            _ => None,
        })
    }

    /// The live float for `key`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`], or [`Error::UnexpectedKind`] for other kinds.
    pub fn get_f64(&self, obj: Offset, key: &str) -> Result<f64> {
        self.get_as(obj, key, ValueKind::F64, |v| match v {
            ValueRef::F64(n) => Some(n),
            _ => None,
        })
    }

    /// The live byte string for `key`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`], or [`Error::UnexpectedKind`] for other kinds.
    pub fn get_bytes(&self, obj: Offset, key: &str) -> Result<&'a [u8]> {
        self.get_as(obj, key, ValueKind::Bytes, |v| match v {
            ValueRef::Bytes(b) => Some(b),
            _ => None,
        })
    }

    /// The live string for `key`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`], or [`Error::UnexpectedKind`] for other kinds.
    pub fn get_str(&self, obj: Offset, key: &str) -> Result<&'a str> {
        self.get_as(obj, key, ValueKind::String, |v| match v {
            ValueRef::Str(s) => Some(s),
            _ => None,
        })
    }

    /// Offset of the live nested object for `key`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`], or [`Error::UnexpectedKind`] for other kinds.
    pub fn get_obj(&self, obj: Offset, key: &str) -> Result<Offset> {
        self.get_as(obj, key, ValueKind::Object, |v| match v {
            ValueRef::Object(ofs) => Some(ofs),
            _ => None,
        })
    }

    /// Offset of the live nested array for `key`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`], or [`Error::UnexpectedKind`] for other kinds.
    pub fn get_arr(&self, obj: Offset, key: &str) -> Result<Offset> {
        self.get_as(obj, key, ValueKind::Array, |v| match v {
            ValueRef::Array(ofs) => Some(ofs),
            _ => None,
        })
    }

    /// Number of live keys of an object, or elements of an array.
    ///
    /// # Errors
    ///
    /// Fails if `node` is not a composite node.
    pub fn count(&self, node: Offset) -> Result<usize> {
        Ok(NodeHeader::read(self.bytes, node.get())?.live_count as usize)
    }

    /// The elements of the array at `arr`.
    ///
    /// # Errors
    ///
    /// Fails if `arr` is not a readable array node.
    pub fn elements(&self, arr: Offset) -> Result<Elements<'a>> {
        let header = self.node(arr, ValueKind::Array)?;
        Ok(Elements::new(self.region(&header), arr.get() + NODE_SIZE))
    }

    /// Element `index` of the array at `arr`.
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfBounds`] past the last element.
    pub fn arr_get(&self, arr: Offset, index: usize) -> Result<ValueRef<'a>> {
        let header = self.node(arr, ValueKind::Array)?;
        let len = header.live_count as usize;
        if index >= len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        let mut elements = Elements::new(self.region(&header), arr.get() + NODE_SIZE);
        match elements.nth(index) {
            Some(element) => element.map(|(_, value)| value),
            None => Err(Error::IndexOutOfBounds { index, len }),
        }
    }

    /// Entry and space accounting for a composite node.
    ///
    /// # Errors
    ///
    /// Fails if `node` is not composite or its region cannot be decoded.
    pub fn stats(&self, node: Offset) -> Result<Stats> {
        match self.kind_at(node)? {
            ValueKind::Object => {}
            ValueKind::Array => {
                let live = self.count(node)?;
                return Ok(Stats {
                    entries: live,
                    live,
                    orphaned_bytes: 0,
                });
            }
            found => {
                return Err(Error::NotComposite {
                    offset: node.get(),
                    found,
                });
            }
        }

        let entries = self.entries(node)?.collect::<Result<Vec<_>>>()?;
        let mut stats = Stats {
            entries: entries.len(),
            ..Stats::default()
        };
        for (i, entry) in entries.iter().enumerate() {
            if entries[i + 1..].iter().any(|later| later.key == entry.key) {
                stats.orphaned_bytes += entry.span;
            } else {
                stats.live += 1;
            }
        }
        Ok(stats)
    }

    /// Decode the value at `at` into an owned tree, dropping shadowed
    /// entries.
    ///
    /// # Errors
    ///
    /// Any decode error within the subtree.
    pub fn to_value(&self, at: Offset) -> Result<Value> {
        Ok(match self.value(at)? {
            ValueRef::Null => Value::Null,
            ValueRef::Bool(b) => Value::Bool(b),
            ValueRef::I64(n) => Value::I64(n),
            ValueRef::F64(n) => Value::F64(n),
            ValueRef::Bytes(b) => Value::Bytes(b.into()),
            ValueRef::Str(s) => Value::String(s.into()),
            ValueRef::Object(obj) => {
                // Later entries overwrite earlier ones, matching resolution.
                let mut map = Map::new();
                for entry in self.entries(obj)? {
                    let entry = entry?;
                    map.insert(entry.key.into(), self.to_value(entry.value_offset)?);
                }
                Value::Object(map)
            }
            ValueRef::Array(arr) => Value::Array(
                self.elements(arr)?
                    .map(|element| element.and_then(|(ofs, _)| self.to_value(ofs)))
                    .collect::<Result<_>>()?,
            ),
        })
    }
}
