//! Connection Handler Module
//!
//! This module handles individual client connections. Each client gets its
//! own handler task that runs in a loop, decoding frames and writing back
//! either the frame itself or a command response.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! 1. Listener accepts socket, handler registers with StatsRegistry
//!        │
//!        ▼
//! 2. ┌──────────────────────────────────────────┐
//!    │ Open                                     │
//!    │   decode next frame                      │
//!    │     ├── reserved route ──> Responding ───┤── write reply
//!    │     ├── data ───────────> Echoing ──────┤── write frame, record
//!    │     ├── too long ───────> Closed         │   (nothing written)
//!    │     └── need bytes ─────> read socket    │
//!    └──────────────────────────────────────────┘
//!        │
//!        ▼
//! 3. EOF / write error / violation: unregister, task ends
//! ```
//!
//! ## Buffer Management
//!
//! A BytesMut buffer accumulates incoming data. TCP is a stream protocol, so
//! a read may hold part of a frame or several frames at once. Frames are
//! handled strictly in arrival order before the next read.

use crate::commands::{CommandRouter, Response, Route};
use crate::protocol::{Frame, FrameDecoder, FrameError, MAX_FRAME_LEN};
use crate::stats::{ConnectionId, StatsRegistry};
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, info, trace, warn};

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 256;

/// Handles a single client connection.
///
/// Generic over the transport so tests can drive it with in-memory mocks;
/// the server uses `TcpStream`.
pub struct ConnectionHandler<S> {
    /// The transport for this connection
    stream: BufWriter<S>,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// Registry handle for this connection
    id: ConnectionId,

    /// Buffer for incoming data
    buffer: BytesMut,

    /// Frame decoder (one per connection)
    decoder: FrameDecoder,

    /// Command router (reads the registry)
    router: CommandRouter,

    /// Connection statistics (shared)
    registry: Arc<StatsRegistry>,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new connection handler and registers it.
    ///
    /// # Arguments
    ///
    /// * `stream` - The transport for this connection
    /// * `addr` - The client's socket address
    /// * `registry` - Shared statistics registry
    pub fn new(stream: S, addr: SocketAddr, registry: Arc<StatsRegistry>) -> Self {
        let id = registry.register();

        Self {
            stream: BufWriter::new(stream),
            addr,
            id,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            decoder: FrameDecoder::new(),
            router: CommandRouter::new(Arc::clone(&registry)),
            registry,
        }
    }

    /// The registry id assigned to this connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Runs the connection until the peer goes away or breaks the protocol.
    ///
    /// The connection is unregistered exactly once, whatever the outcome.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.addr, conn = %self.id, "Client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(()) => info!(client = %self.addr, conn = %self.id, "Client disconnected"),
            Err(e) => match e {
                ConnectionError::ClientDisconnected => {
                    info!(client = %self.addr, conn = %self.id, "Client disconnected")
                }
                ConnectionError::PartialFrameDiscarded { len } => {
                    debug!(
                        client = %self.addr,
                        conn = %self.id,
                        discarded = *len,
                        "Client disconnected mid-frame"
                    )
                }
                ConnectionError::Io(io_err) if is_peer_gone(io_err) => {
                    debug!(client = %self.addr, conn = %self.id, "Connection reset by client")
                }
                ConnectionError::Frame(_) => {
                    warn!(client = %self.addr, conn = %self.id, error = %e, "Protocol violation, closing")
                }
                _ => warn!(client = %self.addr, conn = %self.id, error = %e, "Connection error"),
            },
        }

        self.registry.unregister(self.id);
        result
    }

    /// The main read-decode-respond loop.
    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            while let Some(frame) = self.try_decode_frame().await? {
                self.handle_frame(frame).await?;
            }

            self.read_more_data().await?;
        }
    }

    /// Attempts to decode a frame from the buffer.
    ///
    /// On an oversized frame the write half is shut down without sending
    /// anything, so the peer sees a plain close.
    async fn try_decode_frame(&mut self) -> Result<Option<Frame>, ConnectionError> {
        match self.decoder.decode(&mut self.buffer) {
            Ok(Some(frame)) => {
                trace!(
                    conn = %self.id,
                    len = frame.len(),
                    remaining = self.buffer.len(),
                    "Decoded frame"
                );
                Ok(Some(frame))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                self.registry.record_violation();
                let _ = self.stream.shutdown().await;
                Err(ConnectionError::Frame(e))
            }
        }
    }

    /// Echoes a data frame or answers a command route.
    async fn handle_frame(&mut self, frame: Frame) -> Result<(), ConnectionError> {
        let route = Route::classify(frame.as_bytes());

        match self.router.dispatch(route) {
            Response::Reply(reply) => {
                debug!(conn = %self.id, route = route.name(), response = %String::from_utf8_lossy(&reply), "Command");
                self.send(&reply).await?;
            }
            Response::Echo => {
                self.send(frame.as_bytes()).await?;
                self.registry.record_message(self.id, frame.len());
            }
        }

        Ok(())
    }

    /// Reads more data from the socket into the buffer.
    async fn read_more_data(&mut self) -> Result<(), ConnectionError> {
        // A full frame must always fit without reallocating mid-read
        if self.buffer.capacity() - self.buffer.len() < MAX_FRAME_LEN {
            self.buffer.reserve(INITIAL_BUFFER_SIZE);
        }

        let n = self.stream.get_mut().read_buf(&mut self.buffer).await?;

        if n == 0 {
            // Connection closed by client
            return match self.decoder.decode_eof(&mut self.buffer) {
                None => Err(ConnectionError::ClientDisconnected),
                Some(len) => Err(ConnectionError::PartialFrameDiscarded { len }),
            };
        }

        trace!(conn = %self.id, bytes = n, buffered = self.buffer.len(), "Read data");
        Ok(())
    }

    /// Writes bytes to the client and flushes.
    async fn send(&mut self, bytes: &[u8]) -> Result<(), ConnectionError> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await?;
        trace!(conn = %self.id, bytes = bytes.len(), "Sent response");
        Ok(())
    }
}

/// Errors that end a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue, peer gone mid-write)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Framing violation
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    /// Client disconnected normally
    #[error("Client disconnected")]
    ClientDisconnected,

    /// Client disconnected with an unterminated frame buffered
    #[error("Client disconnected with {len} unterminated bytes discarded")]
    PartialFrameDiscarded { len: usize },
}

impl ConnectionError {
    /// Returns true for outcomes that are ordinary teardown rather than faults.
    pub fn is_disconnect(&self) -> bool {
        match self {
            ConnectionError::ClientDisconnected | ConnectionError::PartialFrameDiscarded { .. } => {
                true
            }
            ConnectionError::Io(io_err) => is_peer_gone(io_err),
            ConnectionError::Frame(_) => false,
        }
    }
}

fn is_peer_gone(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::UnexpectedEof
    )
}

/// Runs a connection handler to completion.
///
/// Ordinary disconnects are swallowed; anything else has already been
/// logged by [`ConnectionHandler::run`].
pub async fn handle_connection<S>(handler: ConnectionHandler<S>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let conn = handler.id();
    if let Err(e) = handler.run().await {
        if !e.is_disconnect() {
            debug!(conn = %conn, error = %e, "Connection ended with error");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    #[tokio::test]
    async fn test_echo() {
        let registry = Arc::new(StatsRegistry::new());
        let mock = Builder::new().read(b"hello\n").write(b"hello\n").build();

        let handler = ConnectionHandler::new(mock, test_addr(), Arc::clone(&registry));
        assert_eq!(registry.len(), 1);

        let result = handler.run().await;
        assert!(matches!(result, Err(ConnectionError::ClientDisconnected)));
        assert!(registry.is_empty());
        assert_eq!(registry.totals().messages_echoed, 1);
    }

    #[tokio::test]
    async fn test_pipelined_frames_echo_in_order() {
        let registry = Arc::new(StatsRegistry::new());
        let mock = Builder::new()
            .read(b"one\rtwo\n")
            .write(b"one\r")
            .write(b"two\n")
            .build();

        let _ = ConnectionHandler::new(mock, test_addr(), Arc::clone(&registry))
            .run()
            .await;
        assert_eq!(registry.totals().messages_echoed, 2);
    }

    #[tokio::test]
    async fn test_frame_split_across_reads() {
        let registry = Arc::new(StatsRegistry::new());
        let mock = Builder::new()
            .read(b"hel")
            .read(b"lo")
            .read(b"\r")
            .write(b"hello\r")
            .build();

        let _ = ConnectionHandler::new(mock, test_addr(), registry).run().await;
    }

    #[tokio::test]
    async fn test_command_reply_is_not_recorded() {
        let registry = Arc::new(StatsRegistry::new());
        let other = registry.register();
        registry.record_message(other, 6);
        registry.record_message(other, 6);

        let mock = Builder::new()
            .read(b"/clients/cnt\r")
            .write(b"2")
            .read(b"/messages_cnts\r")
            .write(b"2,0")
            .read(b"/messages_sizes\r")
            .write(b"12,0")
            .build();

        let _ = ConnectionHandler::new(mock, test_addr(), Arc::clone(&registry))
            .run()
            .await;

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.totals().messages_echoed, 2);
    }

    #[tokio::test]
    async fn test_command_with_lf_is_echoed() {
        let registry = Arc::new(StatsRegistry::new());
        let mock = Builder::new()
            .read(b"/clients/cnt\n")
            .write(b"/clients/cnt\n")
            .build();

        let _ = ConnectionHandler::new(mock, test_addr(), Arc::clone(&registry))
            .run()
            .await;
        assert_eq!(registry.totals().messages_echoed, 1);
    }

    #[tokio::test]
    async fn test_max_length_frame_echoed() {
        let mut payload = vec![0u8];
        payload.extend(std::iter::repeat(0x41).take(MAX_FRAME_LEN - 2));
        payload.push(b'\r');
        assert_eq!(payload.len(), MAX_FRAME_LEN);

        let registry = Arc::new(StatsRegistry::new());
        let mock = Builder::new().read(&payload).write(&payload).build();

        let _ = ConnectionHandler::new(mock, test_addr(), registry).run().await;
    }

    #[tokio::test]
    async fn test_frame_too_long_writes_nothing() {
        let mut payload = vec![0u8];
        payload.extend(std::iter::repeat(0x41).take(MAX_FRAME_LEN - 2));
        payload.push(0x1D);

        let registry = Arc::new(StatsRegistry::new());
        // Any write would make the mock panic
        let mock = Builder::new().read(&payload).build();

        let result = ConnectionHandler::new(mock, test_addr(), Arc::clone(&registry))
            .run()
            .await;

        assert!(matches!(
            result,
            Err(ConnectionError::Frame(FrameError::TooLong { .. }))
        ));
        assert!(registry.is_empty());
        assert_eq!(registry.totals().protocol_violations, 1);
        assert_eq!(registry.totals().messages_echoed, 0);
    }

    #[tokio::test]
    async fn test_violation_after_valid_frames() {
        let registry = Arc::new(StatsRegistry::new());
        let mock = Builder::new()
            .read(b"ok\n")
            .write(b"ok\n")
            .read(&[b'z'; MAX_FRAME_LEN])
            .build();

        let result = ConnectionHandler::new(mock, test_addr(), Arc::clone(&registry))
            .run()
            .await;

        assert!(matches!(result, Err(ConnectionError::Frame(_))));
        assert_eq!(registry.totals().messages_echoed, 1);
    }

    #[tokio::test]
    async fn test_partial_frame_discarded_on_eof() {
        let registry = Arc::new(StatsRegistry::new());
        let mock = Builder::new().read(b"no terminator").build();

        let result = ConnectionHandler::new(mock, test_addr(), Arc::clone(&registry))
            .run()
            .await;

        match result {
            Err(e @ ConnectionError::PartialFrameDiscarded { len: 13 }) => {
                assert!(e.is_disconnect())
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(registry.totals().messages_echoed, 0);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_closes_without_recording() {
        let registry = Arc::new(StatsRegistry::new());
        let mock = Builder::new()
            .read(b"hello\n")
            .write_error(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "peer gone",
            ))
            .build();

        let result = ConnectionHandler::new(mock, test_addr(), Arc::clone(&registry))
            .run()
            .await;

        match result {
            Err(e @ ConnectionError::Io(_)) => assert!(e.is_disconnect()),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(registry.is_empty());
        assert_eq!(registry.totals().messages_echoed, 0);
    }

    #[tokio::test]
    async fn test_handle_connection_unregisters_on_eof() {
        let registry = Arc::new(StatsRegistry::new());
        let handler =
            ConnectionHandler::new(Builder::new().build(), test_addr(), Arc::clone(&registry));
        let id = handler.id();
        assert!(registry.get(id).is_some());

        handle_connection(handler).await;
        assert!(registry.get(id).is_none());
        assert_eq!(registry.totals().connections_accepted, 1);
    }
}
