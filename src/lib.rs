//! # echostat - TCP Echo Server with In-Band Statistics
//!
//! echostat is a concurrent TCP echo server. Clients send short delimited
//! frames and get them back byte-for-byte; a handful of reserved frames
//! instead return live usage statistics for every connected client.
//!
//! ## Features
//!
//! - **Delimited framing**: frames end in CR or LF and are at most 127 bytes
//! - **Silent rejection**: an oversized frame closes the connection with no reply
//! - **Per-connection accounting**: message counts and sizes for every client
//! - **In-band commands**: statistics are queried over the same socket
//! - **Async I/O**: Built on Tokio, one task per connection
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              echostat                                   │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ TCP Server  │───>│ Connection  │───>│  Command    │                  │
//! │  │ (Listener)  │    │  Handler    │    │  Router     │                  │
//! │  └─────────────┘    └──────┬──────┘    └──────┬──────┘                  │
//! │                            │                  │ snapshot                │
//! │                            │ record           ▼                         │
//! │  ┌─────────────┐           │         ┌──────────────────┐               │
//! │  │   Frame     │           └────────>│  StatsRegistry   │               │
//! │  │   Decoder   │                     │  (one RwLock)    │               │
//! │  └─────────────┘                     └──────────────────┘               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use echostat::server::Server;
//! use echostat::stats::StatsRegistry;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = Arc::new(StatsRegistry::new());
//!     let listener = TcpListener::bind("127.0.0.1:11122").await.unwrap();
//!
//!     Server::from_listener(listener, registry, None).run().await;
//! }
//! ```
//!
//! ## Wire Protocol
//!
//! | Request             | Response                                        |
//! |---------------------|-------------------------------------------------|
//! | any frame           | the same bytes, terminator included             |
//! | `/clients/cnt\r`    | number of open connections                      |
//! | `/messages_cnts\r`  | echoed message count per connection, `,`-joined |
//! | `/messages_sizes\r` | echoed byte total per connection, `,`-joined    |
//!
//! ## Module Overview
//!
//! - [`protocol`]: Frame type and incremental decoder
//! - [`stats`]: Shared per-connection statistics registry
//! - [`commands`]: Reserved route matching and responses
//! - [`connection`]: Per-client connection handling
//! - [`server`]: Accept loop
//! - [`config`]: Command-line and environment configuration

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod server;
pub mod stats;

// Re-export commonly used types for convenience
pub use commands::{CommandRouter, Route};
pub use connection::{handle_connection, ConnectionError, ConnectionHandler};
pub use protocol::{Frame, FrameDecoder, FrameError, MAX_FRAME_LEN};
pub use server::Server;
pub use stats::{ConnectionId, StatsRegistry};

/// The default port echostat listens on
pub const DEFAULT_PORT: u16 = 11122;

/// The default host echostat binds to
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Version of echostat
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
