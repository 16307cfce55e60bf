//! Frame Type and Wire Constants
//!
//! A frame is the unit of data on the wire: between 1 and [`MAX_FRAME_LEN`]
//! bytes, the last of which is a terminator (CR or LF).
//!
//! ## Wire Grammar
//!
//! ```text
//! frame      := byte{0,126} terminator
//! terminator := 0x0D | 0x0A
//! ```
//!
//! Frames are opaque byte sequences. Nothing in this module interprets the
//! payload; route matching happens in the `commands` module.

use bytes::Bytes;
use std::fmt;

/// Maximum length of a frame, terminator included.
pub const MAX_FRAME_LEN: usize = 127;

/// Carriage return terminator.
const CR: u8 = b'\r';

/// Line feed terminator.
const LF: u8 = b'\n';

/// Returns true if `byte` ends a frame.
#[inline]
pub fn is_terminator(byte: u8) -> bool {
    byte == CR || byte == LF
}

/// A complete, validated frame.
///
/// Constructed only by the decoder, so the length and terminator
/// invariants always hold.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    data: Bytes,
}

impl Frame {
    pub(crate) fn new(data: Bytes) -> Self {
        debug_assert!(!data.is_empty() && data.len() <= MAX_FRAME_LEN);
        debug_assert!(data.last().copied().is_some_and(is_terminator));
        Self { data }
    }

    /// Total length including the terminator.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false; a frame holds at least its terminator.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The raw frame bytes, terminator included.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("len", &self.data.len())
            .field("data", &String::from_utf8_lossy(&self.data))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminators() {
        assert!(is_terminator(b'\r'));
        assert!(is_terminator(b'\n'));
        assert!(!is_terminator(0x1D));
        assert!(!is_terminator(0x00));
    }

    #[test]
    fn test_frame_accessors() {
        let frame = Frame::new(Bytes::from_static(b"hello\n"));
        assert_eq!(frame.len(), 6);
        assert!(!frame.is_empty());
        assert_eq!(frame.as_bytes(), b"hello\n");
        assert_eq!(frame.as_bytes().last(), Some(&LF));
    }

    #[test]
    fn test_lone_terminator_frame() {
        let frame = Frame::new(Bytes::from_static(b"\r"));
        assert_eq!(frame.len(), 1);
        assert!(!frame.is_empty());
        assert_eq!(frame.as_bytes(), &[CR]);
    }
}
