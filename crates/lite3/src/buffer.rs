//! The caller-owned byte buffer and its capacity gate.

use crate::{
    diag::debug,
    document::Document,
    error::{Error, Result},
    header::{NODE_SIZE, NodeHeader},
    kind::ValueKind,
    offset::Offset,
    options::BufferOptions,
};

/// Largest capacity the engine addresses; offsets are stored as `u32`.
pub const BUF_SIZE_MAX: usize = u32::MAX as usize;

/// A lite3 document under construction inside a caller-owned byte slice.
///
/// The buffer tracks three quantities: the slice start, its capacity and the
/// logical length. Bytes at or past the length are never interpreted. The
/// engine never allocates: an append that does not fit fails with
/// [`Error::BufferFull`] and leaves everything untouched, and growing the
/// storage is up to the caller.
///
/// # Examples
///
/// ```rust
/// use lite3::{Buffer, Offset};
///
/// let mut bytes = [0u8; 1024];
/// let mut buf = Buffer::new(&mut bytes);
/// let root = buf.init_obj()?;
/// buf.set_str(root, "name", "lite3")?;
/// let child = buf.set_obj(root, "meta")?.offset;
/// buf.set_i64(child, "version", 3)?;
///
/// let doc = buf.doc();
/// assert_eq!(doc.get_str(Offset::ROOT, "name")?, "lite3");
/// assert_eq!(doc.get_i64(doc.get_obj(root, "meta")?, "version")?, 3);
/// # Ok::<(), lite3::Error>(())
/// ```
#[derive(Debug)]
pub struct Buffer<'a> {
    bytes: &'a mut [u8],
    len: usize,
    options: BufferOptions,
}

impl<'a> Buffer<'a> {
    /// Wrap an empty buffer with default options.
    pub fn new(bytes: &'a mut [u8]) -> Self {
        Self::with_options(bytes, BufferOptions::default())
    }

    /// Wrap an empty buffer. Bytes past [`BUF_SIZE_MAX`] are never touched.
    pub fn with_options(bytes: &'a mut [u8], options: BufferOptions) -> Self {
        let capacity = bytes.len().min(BUF_SIZE_MAX);
        Self {
            bytes: &mut bytes[..capacity],
            len: 0,
            options,
        }
    }

    /// Resume a buffer whose first `len` bytes hold a document, for example
    /// one handed back by [`Buffer::into_len`] or loaded from storage.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] if `len` exceeds the capacity.
    pub fn from_parts(bytes: &'a mut [u8], len: usize, options: BufferOptions) -> Result<Self> {
        let buf = Self::with_options(bytes, options);
        if len > buf.capacity() {
            return Err(Error::OutOfBounds {
                offset: len,
                len: buf.capacity(),
            });
        }
        Ok(Self { len, ..buf })
    }

    /// Bytes currently meaningful.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no root has been initialized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total usable bytes; fixed for the lifetime of the buffer.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Bytes left for appends.
    #[must_use]
    pub fn free(&self) -> usize {
        self.capacity() - self.len
    }

    /// The options in effect.
    #[must_use]
    pub fn options(&self) -> BufferOptions {
        self.options
    }

    /// The meaningful bytes `[0, len)`.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Read-only view of the current document.
    #[must_use]
    pub fn doc(&self) -> Document<'_> {
        Document::new(self.as_bytes())
    }

    /// Release the slice, returning the logical length to store alongside it.
    #[must_use]
    pub fn into_len(self) -> usize {
        self.len
    }

    /// Check that `extra` more bytes fit. Writes nothing.
    ///
    /// # Errors
    ///
    /// [`Error::BufferFull`] when `len + extra` exceeds the capacity.
    pub fn reserve(&self, extra: usize) -> Result<()> {
        let available = self.free();
        if extra > available {
            debug!(needed = extra, available, "append rejected: buffer full");
            return Err(Error::BufferFull {
                needed: extra,
                available,
            });
        }
        Ok(())
    }

    /// Start a new document whose root is an empty object.
    ///
    /// Any previous content is abandoned: the length restarts at the size of
    /// the root header.
    ///
    /// # Errors
    ///
    /// [`Error::BufferFull`] if the capacity cannot hold a node header.
    pub fn init_obj(&mut self) -> Result<Offset> {
        self.init(ValueKind::Object)
    }

    /// Start a new document whose root is an empty array.
    ///
    /// # Errors
    ///
    /// [`Error::BufferFull`] if the capacity cannot hold a node header.
    pub fn init_arr(&mut self) -> Result<Offset> {
        self.init(ValueKind::Array)
    }

    fn init(&mut self, kind: ValueKind) -> Result<Offset> {
        if self.capacity() < NODE_SIZE {
            return Err(Error::BufferFull {
                needed: NODE_SIZE,
                available: self.capacity(),
            });
        }
        NodeHeader::empty(kind, 0, None).write(self.bytes);
        self.len = NODE_SIZE;
        Ok(Offset::ROOT)
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        &mut *self.bytes
    }

    pub(crate) fn set_len(&mut self, len: usize) {
        debug_assert!(len >= self.len && len <= self.capacity());
        self.len = len;
    }
}
