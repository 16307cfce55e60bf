//! Statistics Module
//!
//! This module provides the shared per-connection usage table that backs the
//! in-band command routes.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  register / unregister   ┌─────────────────┐
//! │   Listener   │─────────────────────────>│                 │
//! └──────────────┘                          │                 │
//! ┌──────────────┐  record_message          │  StatsRegistry  │
//! │ Echo path    │─────────────────────────>│  (one RwLock)   │
//! └──────────────┘                          │                 │
//! ┌──────────────┐  snapshot / len          │                 │
//! │ Command path │<─────────────────────────│                 │
//! └──────────────┘                          └─────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Single exclusion domain**: one `RwLock` serializes all reads and writes
//! - **Ordered snapshots**: connections are listed in registration order
//! - **Lifetime totals**: accepted connections, echoed messages, violations

pub mod registry;

// Re-export commonly used types
pub use registry::{ConnectionId, ConnectionSnapshot, RegistryTotals, StatsRegistry};
