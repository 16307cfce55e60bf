//! Command Routing Module
//!
//! This module implements the in-band control channel. Control requests share
//! the socket with ordinary echo traffic and are told apart by exact byte
//! comparison against a fixed set of routes.
//!
//! ## Architecture
//!
//! ```text
//! Decoded Frame
//!       │
//!       ▼
//! ┌─────────────────┐
//! │ Route::classify │  exact match, terminator included
//! └────────┬────────┘
//!          │
//!    ┌─────┴──────────────┐
//!    ▼                    ▼
//!  Echo            ClientsCount / MessageCounts / MessageSizes
//!    │                    │
//!    ▼                    ▼
//! write frame,     ┌───────────────┐
//! record stats     │ StatsRegistry │  read-only snapshot
//!                  └───────────────┘
//! ```
//!
//! ## Supported Routes
//!
//! - `/clients/cnt\r`
//! - `/messages_cnts\r`
//! - `/messages_sizes\r`

pub mod router;

// Re-export the router types
pub use router::{CommandRouter, Response, Route};
