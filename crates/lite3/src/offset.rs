use core::fmt;

/// Byte offset of a value inside a lite3 buffer.
///
/// Offsets are only handed out by the engine or checked against the logical
/// length by [`Document::offset`](crate::Document::offset), so a fresh
/// `Offset` always points inside the meaningful part of the buffer it came
/// from. Capacity never exceeds [`BUF_SIZE_MAX`](crate::BUF_SIZE_MAX), so
/// every offset fits in 32 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Offset(u32);

impl Offset {
    /// The root node, always at the start of the buffer.
    pub const ROOT: Offset = Offset(0);

    #[inline]
    pub(crate) fn new(raw: usize) -> Self {
        debug_assert!(u32::try_from(raw).is_ok(), "offset {raw} exceeds u32");
        #[allow(clippy::cast_possible_truncation)]
        Offset(raw as u32)
    }

    /// The offset as an index into the buffer.
    #[inline]
    #[must_use]
    pub const fn get(self) -> usize {
        self.0 as usize
    }
}

impl From<Offset> for usize {
    fn from(ofs: Offset) -> usize {
        ofs.get()
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
