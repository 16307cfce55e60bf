//! Incremental Frame Decoder
//!
//! Turns the raw byte stream of one connection into a sequence of frames.
//!
//! ## How the Decoder Works
//!
//! The connection appends incoming network data to a `BytesMut` buffer and
//! calls [`FrameDecoder::decode`] until it returns `Ok(None)`:
//!
//! - `Ok(Some(frame))` - a terminator was found; the frame is split off the
//!   front of the buffer
//! - `Ok(None)` - no terminator yet, read more data
//! - `Err(FrameError::TooLong)` - `MAX_FRAME_LEN` bytes are buffered without a
//!   terminator; the connection must be dropped
//!
//! The decoder remembers how far it has already scanned, so a frame that
//! arrives one byte at a time is not rescanned from the start on every read.
//! One decoder per connection; it is not meant to be shared.

use crate::protocol::frame::{is_terminator, Frame, MAX_FRAME_LEN};
use bytes::BytesMut;
use thiserror::Error;

/// Errors that can occur while decoding frames.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The buffered bytes reached the frame limit without a terminator.
    #[error("frame too long: {len} bytes buffered without terminator (max: {max})")]
    TooLong { len: usize, max: usize },
}

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, FrameError>;

/// Stateful, per-connection frame decoder.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Number of leading buffer bytes already known to hold no terminator
    scanned: usize,
}

impl FrameDecoder {
    /// Creates a new decoder.
    pub fn new() -> Self {
        Self { scanned: 0 }
    }

    /// Attempts to split one complete frame off the front of `buf`.
    ///
    /// Only the first `MAX_FRAME_LEN` bytes are ever inspected: a terminator
    /// beyond that point could only close an oversized frame.
    pub fn decode(&mut self, buf: &mut BytesMut) -> DecodeResult<Option<Frame>> {
        let window = buf.len().min(MAX_FRAME_LEN);
        let start = self.scanned.min(window);

        if let Some(pos) = buf[start..window].iter().position(|&b| is_terminator(b)) {
            let end = start + pos + 1;
            self.scanned = 0;
            let data = buf.split_to(end).freeze();
            return Ok(Some(Frame::new(data)));
        }

        self.scanned = window;

        if window == MAX_FRAME_LEN {
            return Err(FrameError::TooLong {
                len: buf.len(),
                max: MAX_FRAME_LEN,
            });
        }

        Ok(None)
    }

    /// Handles end of stream.
    ///
    /// Any unterminated bytes left in `buf` are dropped. Returns how many
    /// bytes were discarded, or `None` if the buffer was already empty.
    pub fn decode_eof(&mut self, buf: &mut BytesMut) -> Option<usize> {
        self.scanned = 0;
        if buf.is_empty() {
            return None;
        }
        let discarded = buf.len();
        buf.clear();
        Some(discarded)
    }
}

/// Decodes every complete frame in `input`.
///
/// Convenience helper for tests and benchmarks; the connection handler
/// drives a [`FrameDecoder`] directly.
pub fn decode_all(input: &[u8]) -> DecodeResult<Vec<Frame>> {
    let mut decoder = FrameDecoder::new();
    let mut buf = BytesMut::from(input);
    let mut frames = Vec::new();
    while let Some(frame) = decoder.decode(&mut buf)? {
        frames.push(frame);
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_lf_frame() {
        let mut decoder = FrameDecoder::new();
        let mut buf = BytesMut::from(&b"hello\n"[..]);

        let frame = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.as_bytes(), b"hello\n");
        assert!(buf.is_empty());
        assert!(decoder.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_decode_cr_frame() {
        let frames = decode_all(b"/clients/cnt\r").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_bytes(), b"/clients/cnt\r");
    }

    #[test]
    fn test_incomplete_frame() {
        let mut decoder = FrameDecoder::new();
        let mut buf = BytesMut::from(&b"partial"[..]);

        assert!(decoder.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 7);
    }

    #[test]
    fn test_pipelined_frames() {
        // CRLF is two frames: "a\r" followed by a lone "\n"
        let frames = decode_all(b"one\ntwo\ra\r\n").unwrap();
        let raw: Vec<&[u8]> = frames.iter().map(|f| f.as_bytes()).collect();
        assert_eq!(raw, vec![&b"one\n"[..], b"two\r", b"a\r", b"\n"]);
    }

    #[test]
    fn test_lone_terminator_is_a_frame() {
        let frames = decode_all(b"\n").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), 1);
    }

    #[test]
    fn test_incremental_feed() {
        let mut decoder = FrameDecoder::new();
        let mut buf = BytesMut::new();

        for &byte in b"abc" {
            buf.extend_from_slice(&[byte]);
            assert!(decoder.decode(&mut buf).unwrap().is_none());
        }

        buf.extend_from_slice(b"d\nef");
        let frame = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.as_bytes(), b"abcd\n");
        assert_eq!(&buf[..], b"ef");
        assert!(decoder.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_max_length_frame_is_valid() {
        let mut input = vec![0u8; MAX_FRAME_LEN - 1];
        input.push(b'\r');

        let frames = decode_all(&input).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), MAX_FRAME_LEN);
    }

    #[test]
    fn test_frame_too_long() {
        let mut input = vec![0u8; MAX_FRAME_LEN - 1];
        input.push(0x1D);

        let result = decode_all(&input);
        assert_eq!(
            result,
            Err(FrameError::TooLong {
                len: MAX_FRAME_LEN,
                max: MAX_FRAME_LEN
            })
        );
    }

    #[test]
    fn test_terminator_past_limit_is_too_long() {
        let mut input = vec![b'x'; MAX_FRAME_LEN];
        input.push(b'\n');

        assert!(matches!(decode_all(&input), Err(FrameError::TooLong { .. })));
    }

    #[test]
    fn test_too_long_detected_incrementally() {
        let mut decoder = FrameDecoder::new();
        let mut buf = BytesMut::from(&[b'x'; MAX_FRAME_LEN - 1][..]);
        assert!(decoder.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"y");
        assert!(decoder.decode(&mut buf).is_err());
    }

    #[test]
    fn test_valid_frame_followed_by_long_garbage() {
        let mut input = b"ok\n".to_vec();
        input.extend_from_slice(&[b'z'; MAX_FRAME_LEN]);

        let mut decoder = FrameDecoder::new();
        let mut buf = BytesMut::from(&input[..]);
        assert_eq!(
            decoder.decode(&mut buf).unwrap().unwrap().as_bytes(),
            b"ok\n"
        );
        assert!(decoder.decode(&mut buf).is_err());
    }

    #[test]
    fn test_decode_eof_discards_partial() {
        let mut decoder = FrameDecoder::new();
        let mut buf = BytesMut::from(&b"no terminator"[..]);

        assert!(decoder.decode(&mut buf).unwrap().is_none());
        assert_eq!(decoder.decode_eof(&mut buf), Some(13));
        assert!(buf.is_empty());
        assert_eq!(decoder.decode_eof(&mut buf), None);
    }
}
