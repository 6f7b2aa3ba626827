//! Fixed-size preamble of composite nodes.
//!
//! ```text
//!  0       1        4       8          12            16           20        96
//!  ┌───────┬────────┬───────┬──────────┬─────────────┬────────────┬─────────┐
//!  │ tag   │ (zero) │ end   │ parent   │ entry_count │ live_count │ (zero)  │
//!  └───────┴────────┴───────┴──────────┴─────────────┴────────────┴─────────┘
//! ```
//!
//! All fields are little-endian `u32`. `end` is one past the last byte of the
//! node's entry region, nested nodes included. `parent` is `0xFFFF_FFFF` for
//! a root node.

use crate::{
    error::{Error, Result},
    kind::ValueKind,
    offset::Offset,
};

/// Size of every composite node header.
pub const NODE_SIZE: usize = 96;

const END: usize = 4;
const PARENT: usize = 8;
const ENTRY_COUNT: usize = 12;
const LIVE_COUNT: usize = 16;
/// Bytes of the header that carry fields; the rest stays zero.
const FIELDS_LEN: usize = 20;
const NO_PARENT: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeHeader {
    pub(crate) kind: ValueKind,
    pub(crate) end: usize,
    pub(crate) parent: Option<Offset>,
    pub(crate) entry_count: u32,
    pub(crate) live_count: u32,
}

impl NodeHeader {
    /// Header of an empty node about to be written at `at`.
    pub(crate) fn empty(kind: ValueKind, at: usize, parent: Option<Offset>) -> Self {
        debug_assert!(kind.is_composite());
        Self {
            kind,
            end: at + NODE_SIZE,
            parent,
            entry_count: 0,
            live_count: 0,
        }
    }

    /// Write the complete header at the start of `dst`, reserved bytes
    /// zeroed.
    pub(crate) fn write(&self, dst: &mut [u8]) {
        dst[..NODE_SIZE].fill(0);
        self.write_fields(dst);
    }

    /// Rewrite only the bookkeeping fields of an existing header.
    pub(crate) fn write_fields(&self, dst: &mut [u8]) {
        let dst = &mut dst[..FIELDS_LEN];
        dst[0] = self.kind.tag();
        put_u32(dst, END, to_u32(self.end));
        put_u32(dst, PARENT, self.parent.map_or(NO_PARENT, |p| to_u32(p.get())));
        put_u32(dst, ENTRY_COUNT, self.entry_count);
        put_u32(dst, LIVE_COUNT, self.live_count);
    }

    /// Move the `end` field of the header at the start of `node` without
    /// decoding the rest.
    pub(crate) fn patch_end(node: &mut [u8], end: usize) {
        put_u32(node, END, to_u32(end));
    }

    /// Read the `parent` field of the header at the start of `node`.
    pub(crate) fn raw_parent(node: &[u8]) -> Option<Offset> {
        match get_u32(node, PARENT) {
            NO_PARENT => None,
            p => Some(Offset::new(p as usize)),
        }
    }

    /// Decode the header of the node at `at`, where `doc` is the meaningful
    /// part of the buffer.
    pub(crate) fn read(doc: &[u8], at: usize) -> Result<Self> {
        let out_of_bounds = Error::OutOfBounds {
            offset: at,
            len: doc.len(),
        };
        let kind = ValueKind::from_tag(*doc.get(at).ok_or(out_of_bounds.clone())?, at)?;
        if !kind.is_composite() {
            return Err(Error::NotComposite {
                offset: at,
                found: kind,
            });
        }
        let bytes = doc.get(at..at + NODE_SIZE).ok_or(out_of_bounds)?;
        if at % crate::align::NODE_ALIGNMENT != 0 {
            return Err(Error::Misaligned { offset: at });
        }

        let end = get_u32(bytes, END) as usize;
        let parent = match get_u32(bytes, PARENT) {
            NO_PARENT => None,
            p => Some(p as usize),
        };
        // A well-formed node lies inside the document and its parent precedes
        // it; anything else would send traversal out of bounds or in circles.
        if end < at + NODE_SIZE || end > doc.len() || parent.is_some_and(|p| p >= at) {
            return Err(Error::InvalidNode {
                offset: at,
                tag: bytes[0],
            });
        }

        Ok(Self {
            kind,
            end,
            parent: parent.map(Offset::new),
            entry_count: get_u32(bytes, ENTRY_COUNT),
            live_count: get_u32(bytes, LIVE_COUNT),
        })
    }
}

#[allow(clippy::cast_possible_truncation)]
fn to_u32(v: usize) -> u32 {
    debug_assert!(u32::try_from(v).is_ok());
    v as u32
}

fn put_u32(dst: &mut [u8], at: usize, v: u32) {
    dst[at..at + 4].copy_from_slice(&v.to_le_bytes());
}

fn get_u32(src: &[u8], at: usize) -> u32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&src[at..at + 4]);
    u32::from_le_bytes(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_root_layout() {
        let mut buf = [0xEEu8; NODE_SIZE];
        NodeHeader::empty(ValueKind::Object, 0, None).write(&mut buf);

        assert_eq!(buf[0], ValueKind::Object.tag());
        assert_eq!(&buf[1..4], &[0, 0, 0]);
        assert_eq!(&buf[4..8], &96u32.to_le_bytes());
        assert_eq!(&buf[8..12], &[0xFF; 4]);
        assert_eq!(&buf[12..20], &[0; 8]);
        assert!(buf[20..].iter().all(|&b| b == 0));
    }

    #[test]
    fn read_back() {
        let mut doc = [0u8; 2 * NODE_SIZE];
        let root = NodeHeader {
            end: 2 * NODE_SIZE,
            ..NodeHeader::empty(ValueKind::Object, 0, None)
        };
        let child = NodeHeader {
            entry_count: 0,
            ..NodeHeader::empty(ValueKind::Array, NODE_SIZE, Some(Offset::ROOT))
        };
        root.write(&mut doc[..NODE_SIZE]);
        child.write(&mut doc[NODE_SIZE..]);

        assert_eq!(NodeHeader::read(&doc, 0), Ok(root));
        assert_eq!(NodeHeader::read(&doc, NODE_SIZE), Ok(child));
    }

    #[test]
    fn rejects_scalars_and_truncation() {
        let mut doc = [0u8; NODE_SIZE];
        NodeHeader::empty(ValueKind::Object, 0, None).write(&mut doc);

        assert_eq!(
            NodeHeader::read(&doc[..50], 0),
            Err(Error::OutOfBounds { offset: 0, len: 50 })
        );

        doc[0] = ValueKind::String.tag();
        assert!(matches!(
            NodeHeader::read(&doc, 0),
            Err(Error::NotComposite { offset: 0, found: ValueKind::String })
        ));
    }

    #[test]
    fn rejects_end_past_document() {
        let mut doc = [0u8; NODE_SIZE];
        NodeHeader {
            end: NODE_SIZE + 4,
            ..NodeHeader::empty(ValueKind::Object, 0, None)
        }
        .write(&mut doc);
        assert!(matches!(
            NodeHeader::read(&doc, 0),
            Err(Error::InvalidNode { offset: 0, .. })
        ));
    }

    #[test]
    fn rejects_misaligned_nodes() {
        let mut doc = [0u8; NODE_SIZE + 2];
        NodeHeader::empty(ValueKind::Array, 2, None).write(&mut doc[2..]);
        assert_eq!(
            NodeHeader::read(&doc, 2),
            Err(Error::Misaligned { offset: 2 })
        );
    }
}
