//! Walking the entry region of a composite node.
//!
//! An object region is a chain of `[pad][KEY_TAG][key\0][value]` entries, an
//! array region a chain of `[pad][value]` elements, both running from the
//! end of the node header to the header's `end` field. Nested nodes are
//! skipped as one block using their own `end`, so a walk never descends.
//!
//! Updates append a fresh entry instead of rewriting the old one. When a key
//! occurs more than once the last entry wins; [`Entries`] yields every
//! physical entry while [`Iter`] yields only the live ones.

use crate::{
    align::{NODE_ALIGNMENT, Padding},
    error::{Error, Result},
    kind::KEY_TAG,
    offset::Offset,
    value::{self, ValueRef},
};

/// One physical entry of an object, live or shadowed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawEntry<'a> {
    /// Offset of the key tag. Alignment padding, if any, precedes it.
    pub entry: Offset,
    /// The key.
    pub key: &'a str,
    /// Offset of the value's tag byte.
    pub value_offset: Offset,
    /// The decoded value.
    pub value: ValueRef<'a>,
    /// Bytes the entry occupies, leading padding included.
    pub span: usize,
}

/// Skip the padding that may open an entry. Padding never exceeds
/// `NODE_ALIGNMENT - 1` bytes and no tag byte looks like padding.
fn skip_padding(doc: &[u8], mut pos: usize, end: usize) -> usize {
    let limit = (pos + NODE_ALIGNMENT - 1).min(end);
    while pos < limit && Padding::is_padding(doc[pos]) {
        pos += 1;
    }
    pos
}

fn truncated(at: usize, doc: &[u8]) -> Error {
    match doc.get(at) {
        Some(&tag) => Error::InvalidNode { offset: at, tag },
        None => Error::OutOfBounds {
            offset: at,
            len: doc.len(),
        },
    }
}

/// Decode the object entry starting at `pos`; `region` ends at the owning
/// node's `end`. Returns the entry and the offset right after it.
fn read_entry(region: &[u8], pos: usize) -> Result<RawEntry<'_>> {
    let at = skip_padding(region, pos, region.len());
    if region.get(at) != Some(&KEY_TAG) {
        return Err(truncated(at, region));
    }

    let key_start = at + 1;
    let nul = region[key_start..]
        .iter()
        .position(|&b| b == 0)
        .ok_or(Error::OutOfBounds {
            offset: key_start,
            len: region.len(),
        })?;
    let key = core::str::from_utf8(&region[key_start..key_start + nul])
        .map_err(|_| Error::InvalidUtf8 { offset: key_start })?;

    let value_at = key_start + nul + 1;
    let (value, value_span) = value::decode(region, value_at)?;
    Ok(RawEntry {
        entry: Offset::new(at),
        key,
        value_offset: Offset::new(value_at),
        value,
        span: value_at + value_span - pos,
    })
}

/// Iterator over every physical entry of an object, in write order.
///
/// Stops after the first error.
#[derive(Debug, Clone)]
pub struct Entries<'a> {
    region: &'a [u8],
    pos: usize,
}

impl<'a> Entries<'a> {
    /// `region` must already be cut at the node's `end`.
    pub(crate) fn new(region: &'a [u8], start: usize) -> Self {
        Self { region, pos: start }
    }
}

impl<'a> Iterator for Entries<'a> {
    type Item = Result<RawEntry<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.region.len() {
            return None;
        }
        match read_entry(self.region, self.pos) {
            Ok(entry) => {
                self.pos += entry.span;
                Some(Ok(entry))
            }
            Err(e) => {
                self.pos = self.region.len();
                Some(Err(e))
            }
        }
    }
}

/// Iterator over the live `(key, value)` pairs of an object, in the order
/// their authoritative entries were written.
///
/// Deciding liveness scans the rest of the region, so a full iteration is
/// quadratic in the number of physical entries.
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    raw: Entries<'a>,
}

impl<'a> Iter<'a> {
    pub(crate) fn new(raw: Entries<'a>) -> Self {
        Self { raw }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = Result<(&'a str, ValueRef<'a>)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.raw.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e)),
            };
            let shadowed = self
                .raw
                .clone()
                .any(|later| matches!(later, Ok(later) if later.key == entry.key));
            if !shadowed {
                return Some(Ok((entry.key, entry.value)));
            }
        }
    }
}

/// Iterator over the elements of an array, with their offsets.
#[derive(Debug, Clone)]
pub struct Elements<'a> {
    region: &'a [u8],
    pos: usize,
}

impl<'a> Elements<'a> {
    pub(crate) fn new(region: &'a [u8], start: usize) -> Self {
        Self { region, pos: start }
    }
}

impl<'a> Iterator for Elements<'a> {
    type Item = Result<(Offset, ValueRef<'a>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.region.len() {
            return None;
        }
        let at = skip_padding(self.region, self.pos, self.region.len());
        match value::decode(self.region, at) {
            Ok((value, span)) => {
                self.pos = at + span;
                Some(Ok((Offset::new(at), value)))
            }
            Err(e) => {
                self.pos = self.region.len();
                Some(Err(e))
            }
        }
    }
}
