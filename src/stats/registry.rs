//! Connection Statistics Registry
//!
//! This module implements the process-wide table that maps every open
//! connection to its usage counters.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StatsRegistry                           │
//! │                                                             │
//! │   RwLock<BTreeMap<ConnectionId, Entry>>                     │
//! │     ├── conn 1 -> count, sizes                              │
//! │     ├── conn 2 -> count, sizes                              │
//! │     └── ...                                                 │
//! │                                                             │
//! │   AtomicU64 counters (lifetime totals)                      │
//! └─────────────────────────────────────────────────────────────┘
//!        ▲ write: register / unregister / record_message
//!        │ read:  snapshot / len
//!   Connection handlers (one task per client)
//! ```
//!
//! One lock guards the table. Critical sections only touch the map and never
//! await, so holding the lock cannot stall on network I/O.
//!
//! Ids come from a monotonically increasing counter, so iterating the
//! `BTreeMap` yields connections in the order they were registered.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use tracing::warn;

/// Process-unique connection identity. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Usage counters for one connection.
///
/// `message_sizes` keeps one entry per echoed message and is only released
/// when the connection unregisters, so a long-lived connection holds its
/// whole history (8 bytes per message). The sum and maximum are kept as
/// running values so snapshots never walk that history under the lock.
#[derive(Debug, Clone, Default)]
struct Entry {
    /// Number of echoed messages
    message_count: u64,
    /// Size of every echoed message, in arrival order
    message_sizes: Vec<usize>,
    /// Running sum of `message_sizes`
    total_bytes: u64,
    /// Running maximum of `message_sizes`, 0 if none
    max_message_size: usize,
}

impl Entry {
    fn record(&mut self, size: usize) {
        self.message_count += 1;
        self.message_sizes.push(size);
        self.total_bytes += size as u64;
        self.max_message_size = self.max_message_size.max(size);
        debug_assert_eq!(self.message_sizes.len() as u64, self.message_count);
    }

    fn snapshot(&self, id: ConnectionId) -> ConnectionSnapshot {
        ConnectionSnapshot {
            id,
            message_count: self.message_count,
            total_bytes: self.total_bytes,
            max_message_size: self.max_message_size,
        }
    }
}

/// Point-in-time view of one connection's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSnapshot {
    pub id: ConnectionId,
    pub message_count: u64,
    /// Sum of all echoed message sizes
    pub total_bytes: u64,
    /// Largest single echoed message, 0 if none
    pub max_message_size: usize,
}

/// Lifetime totals, independent of which connections are still open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistryTotals {
    pub connections_accepted: u64,
    pub messages_echoed: u64,
    pub protocol_violations: u64,
}

/// The shared statistics table.
///
/// Wrap in an `Arc` and hand a clone to the listener and every connection
/// handler. All methods take `&self`.
///
/// # Example
///
/// ```
/// use echostat::stats::StatsRegistry;
///
/// let registry = StatsRegistry::new();
/// let id = registry.register();
/// registry.record_message(id, 6);
/// registry.record_message(id, 6);
///
/// let snapshot = registry.snapshot();
/// assert_eq!(snapshot[0].message_count, 2);
/// assert_eq!(snapshot[0].total_bytes, 12);
///
/// registry.unregister(id);
/// assert!(registry.is_empty());
/// ```
pub struct StatsRegistry {
    /// Per-connection counters, keyed by registration order
    entries: RwLock<BTreeMap<ConnectionId, Entry>>,

    /// Next id to hand out
    next_id: AtomicU64,

    /// Statistics: total connections ever registered
    connections_accepted: AtomicU64,

    /// Statistics: total echoed messages across all connections
    messages_echoed: AtomicU64,

    /// Statistics: connections dropped for oversized frames
    protocol_violations: AtomicU64,
}

impl fmt::Debug for StatsRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatsRegistry")
            .field("open", &self.len())
            .field("totals", &self.totals())
            .finish()
    }
}

impl Default for StatsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            connections_accepted: AtomicU64::new(0),
            messages_echoed: AtomicU64::new(0),
            protocol_violations: AtomicU64::new(0),
        }
    }

    /// Adds a new connection with zero messages and returns its id.
    ///
    /// Call exactly once per accepted connection.
    pub fn register(&self) -> ConnectionId {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let previous = self.entries.write().unwrap().insert(id, Entry::default());
        debug_assert!(previous.is_none(), "connection {id} registered twice");

        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        id
    }

    /// Removes a connection.
    ///
    /// Call exactly once, at teardown. Unregistering an unknown id is a bug:
    /// it panics in debug builds and is logged and ignored otherwise.
    pub fn unregister(&self, id: ConnectionId) {
        let removed = self.entries.write().unwrap().remove(&id);
        if removed.is_none() {
            debug_assert!(false, "connection {id} unregistered twice");
            warn!(conn = %id, "Unregister for unknown connection ignored");
        }
    }

    /// Records one echoed message of `size` bytes for `id`.
    pub fn record_message(&self, id: ConnectionId, size: usize) {
        let mut entries = self.entries.write().unwrap();
        match entries.get_mut(&id) {
            Some(entry) => {
                entry.record(size);
                self.messages_echoed.fetch_add(1, Ordering::Relaxed);
            }
            None => {
                debug_assert!(false, "message recorded for unknown connection {id}");
                warn!(conn = %id, size, "Message for unknown connection ignored");
            }
        }
    }

    /// Counts a connection dropped for a protocol violation.
    pub fn record_violation(&self) {
        self.protocol_violations.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the counters of every open connection, in registration order.
    ///
    /// The read lock is held for the whole copy, so all entries reflect the
    /// same instant.
    pub fn snapshot(&self) -> Vec<ConnectionSnapshot> {
        let entries = self.entries.read().unwrap();
        entries
            .iter()
            .map(|(&id, entry)| entry.snapshot(id))
            .collect()
    }

    /// Returns the counters of a single connection, if it is still open.
    pub fn get(&self, id: ConnectionId) -> Option<ConnectionSnapshot> {
        let entries = self.entries.read().unwrap();
        entries.get(&id).map(|entry| entry.snapshot(id))
    }

    /// Number of currently open connections.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    /// Returns true if no connection is open.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns lifetime totals.
    pub fn totals(&self) -> RegistryTotals {
        RegistryTotals {
            connections_accepted: self.connections_accepted.load(Ordering::Relaxed),
            messages_echoed: self.messages_echoed.load(Ordering::Relaxed),
            protocol_violations: self.protocol_violations.load(Ordering::Relaxed),
        }
    }
}
