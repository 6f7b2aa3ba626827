//! A binary tree-document format that lives in one caller-owned byte buffer.
//!
//! Objects, arrays and scalars are encoded back to back and refer to each
//! other by byte offset, so a buffer can be copied, persisted or mapped and
//! read again without any fix-up. Documents are mutable in place: keys are
//! inserted or updated by appending entries at the tail, as long as the
//! buffer has spare capacity.
//!
//! # Layout
//!
//! ```text
//! root object header (96 bytes)
//! [pad][KEY_TAG]["key\0"][value] [pad][KEY_TAG]["key\0"][value] ...
//! ```
//!
//! Composite values (objects and arrays) are a 96-byte node header followed
//! by their own entries and start on a 4-byte boundary; the padding that
//! achieves this is written in front of the key. Updating a key appends a
//! new entry and leaves the old one in place: the last entry for a key wins
//! and the space of earlier ones is only reclaimed by rebuilding the
//! document.
//!
//! # Example
//!
//! ```rust
//! use lite3::{Buffer, Offset, ValueRef};
//!
//! let mut bytes = vec![0u8; 1024];
//! let mut buf = Buffer::new(&mut bytes);
//! let root = buf.init_obj()?;
//! buf.set_str(root, "status", "draft")?;
//! let tags = buf.set_arr(root, "tags")?.offset;
//! buf.push_str(tags, "binary")?;
//!
//! let update = buf.set_str(root, "status", "final")?;
//! assert!(update.shadowed.is_some());
//!
//! let len = buf.into_len();
//! let doc = lite3::Document::new(&bytes[..len]);
//! assert_eq!(doc.get_str(Offset::ROOT, "status")?, "final");
//! assert_eq!(doc.arr_get(doc.get_arr(Offset::ROOT, "tags")?, 0)?, ValueRef::Str("binary"));
//! # Ok::<(), lite3::Error>(())
//! ```

#![no_std]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod align;
mod buffer;
mod diag;
mod document;
mod error;
mod header;
mod kind;
mod locator;
mod offset;
mod options;
mod value;
mod writer;

#[cfg(test)]
mod tests;

pub use align::{NODE_ALIGNMENT, PADDING_SENTINEL, Padding, padding_needed, required_alignment};
pub use buffer::{BUF_SIZE_MAX, Buffer};
pub use document::{Document, Stats};
pub use error::{Error, Result};
pub use header::NODE_SIZE;
pub use kind::{KEY_TAG, ValueKind};
pub use locator::{Elements, Entries, Iter, RawEntry};
pub use offset::Offset;
pub use options::BufferOptions;
pub use value::{Map, Value, ValueRef};
pub use writer::Written;
