//! Connection Handler Module
//!
//! This module manages individual client connections. Each client connection
//! is handled by its own async task, so one slow or misbehaving client never
//! holds up another.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     TCP Listener                            │
//! │                    (server.rs)                              │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │
//!                        │ accept() + register
//!                        ▼
//!           ┌────────────────────────┐
//!           │   For each client...   │
//!           └────────────┬───────────┘
//!                        │
//!                        │ spawn task
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 ConnectionHandler                           │
//! │                                                             │
//! │  ┌─────────────┐    ┌──────────────┐    ┌─────────────┐     │
//! │  │ Read bytes  │───>│ Decode frame │───>│ Route frame │     │
//! │  └─────────────┘    └──────────────┘    └──────┬──────┘     │
//! │                                                │            │
//! │                                     ┌──────────┴─────────┐  │
//! │                                     ▼                    ▼  │
//! │                              ┌─────────────┐   ┌──────────┐ │
//! │                              │ Echo+record │   │ Reply    │ │
//! │                              └─────────────┘   └──────────┘ │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Async I/O**: Uses Tokio for non-blocking network operations
//! - **Buffer Management**: BytesMut buffer for incoming data
//! - **Pipelining**: Several frames in a single TCP packet are handled in order
//! - **Silent rejection**: oversized frames close the socket with no reply

pub mod handler;

// Re-export commonly used types
pub use handler::{handle_connection, ConnectionError, ConnectionHandler};
