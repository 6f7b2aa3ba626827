use crate::align::Padding;

/// Configuration for a [`Buffer`](crate::Buffer).
///
/// # Examples
///
/// ```rust
/// use lite3::{Buffer, BufferOptions, Padding};
///
/// let mut bytes = [0u8; 256];
/// let buf = Buffer::with_options(
///     &mut bytes,
///     BufferOptions {
///         padding: Padding::Zero,
///     },
/// );
/// assert_eq!(buf.len(), 0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferOptions {
    /// Byte written into alignment padding in front of entries whose value
    /// is a composite node.
    ///
    /// Padding is never interpreted, so the choice only affects what a hex
    /// dump of the buffer shows. Readers accept buffers written under either
    /// mode.
    ///
    /// # Default
    ///
    /// [`Padding::Sentinel`] in debug builds or with the `debug-padding`
    /// feature, [`Padding::Zero`] otherwise.
    pub padding: Padding,
}
