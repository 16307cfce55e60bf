//! Framing Protocol Implementation
//!
//! This module implements the delimited framing used on the wire.
//!
//! ## Overview
//!
//! A frame is up to 127 bytes long and ends with CR (`0x0D`) or LF (`0x0A`).
//! Frames are opaque byte sequences: they are echoed back verbatim unless
//! they exactly match one of the reserved command routes.
//!
//! ## Modules
//!
//! - `frame`: The `Frame` type and wire constants
//! - `decoder`: Incremental decoder that enforces the length limit
//!
//! ## Example
//!
//! ```
//! use echostat::protocol::{FrameDecoder, MAX_FRAME_LEN};
//! use bytes::BytesMut;
//!
//! let mut decoder = FrameDecoder::new();
//! let mut buffer = BytesMut::from(&b"hello\nwor"[..]);
//!
//! let frame = decoder.decode(&mut buffer).unwrap().unwrap();
//! assert_eq!(frame.as_bytes(), b"hello\n");
//! assert!(decoder.decode(&mut buffer).unwrap().is_none());
//! assert!(frame.len() <= MAX_FRAME_LEN);
//! ```

pub mod decoder;
pub mod frame;

// Re-export commonly used types for convenience
pub use decoder::{decode_all, DecodeResult, FrameDecoder, FrameError};
pub use frame::{is_terminator, Frame, MAX_FRAME_LEN};
