//! Alignment rule for entry values.
//!
//! Composite nodes start on a [`NODE_ALIGNMENT`] boundary so their headers
//! can be reinterpreted in place; scalars are byte-aligned. The padding an
//! entry needs is computed for the offset of its value but emitted in front
//! of its key, which keeps `[key tag][key][value]` contiguous.

use crate::kind::ValueKind;

/// Alignment of every composite node header, relative to the buffer start.
pub const NODE_ALIGNMENT: usize = 4;

/// Padding byte written by debug builds so stray padding is easy to spot in
/// a hex dump.
pub const PADDING_SENTINEL: u8 = 0x5F;

/// Required start alignment for a value of `kind`.
#[inline]
#[must_use]
pub const fn required_alignment(kind: ValueKind) -> usize {
    if kind.is_composite() {
        NODE_ALIGNMENT
    } else {
        1
    }
}

/// Number of bytes to add to `unaligned_offset` to reach a multiple of
/// `alignment`.
#[inline]
#[must_use]
pub const fn padding_needed(unaligned_offset: usize, alignment: usize) -> usize {
    (alignment - (unaligned_offset % alignment)) % alignment
}

/// Value written into alignment padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Padding {
    /// All-zero padding.
    Zero,
    /// [`PADDING_SENTINEL`] padding.
    Sentinel,
}

impl Padding {
    /// The byte this mode writes.
    #[inline]
    #[must_use]
    pub const fn byte(self) -> u8 {
        match self {
            Padding::Zero => 0x00,
            Padding::Sentinel => PADDING_SENTINEL,
        }
    }

    /// Whether `b` is padding written under any mode.
    #[inline]
    pub(crate) const fn is_padding(b: u8) -> bool {
        b == 0x00 || b == PADDING_SENTINEL
    }
}

impl Default for Padding {
    /// `Sentinel` in debug builds (or with the `debug-padding` feature),
    /// `Zero` otherwise.
    fn default() -> Self {
        if cfg!(any(debug_assertions, feature = "debug-padding")) {
            Padding::Sentinel
        } else {
            Padding::Zero
        }
    }
}
