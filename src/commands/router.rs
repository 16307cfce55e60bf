//! Command Router
//!
//! Decides whether a frame is one of the reserved control routes or ordinary
//! echo data, and answers control routes from the statistics registry.
//!
//! ## Supported Routes
//!
//! | Request             | Response                                          |
//! |---------------------|---------------------------------------------------|
//! | `/clients/cnt\r`    | number of open connections                        |
//! | `/messages_cnts\r`  | comma-separated echoed message count per client   |
//! | `/messages_sizes\r` | comma-separated echoed byte total per client      |
//!
//! Responses are ASCII decimal with no trailing terminator. Lists follow
//! registration order, oldest connection first.
//!
//! Matching is byte-exact, terminator included: `/clients/cnt\n` is not a
//! command and gets echoed like any other frame.

use crate::protocol::Frame;
use crate::stats::StatsRegistry;
use bytes::Bytes;
use std::sync::Arc;

/// The fixed set of routes a frame can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `/clients/cnt\r`
    ClientsCount,
    /// `/messages_cnts\r`
    MessageCounts,
    /// `/messages_sizes\r`
    MessageSizes,
    /// Anything else
    Echo,
}

impl Route {
    pub const CLIENTS_COUNT: &'static [u8] = b"/clients/cnt\r";
    pub const MESSAGE_COUNTS: &'static [u8] = b"/messages_cnts\r";
    pub const MESSAGE_SIZES: &'static [u8] = b"/messages_sizes\r";

    /// Classifies a complete frame by exact byte comparison.
    pub fn classify(frame: &[u8]) -> Route {
        match frame {
            Self::CLIENTS_COUNT => Route::ClientsCount,
            Self::MESSAGE_COUNTS => Route::MessageCounts,
            Self::MESSAGE_SIZES => Route::MessageSizes,
            _ => Route::Echo,
        }
    }

    /// Human-readable route name, for logging.
    pub fn name(self) -> &'static str {
        match self {
            Route::ClientsCount => "/clients/cnt",
            Route::MessageCounts => "/messages_cnts",
            Route::MessageSizes => "/messages_sizes",
            Route::Echo => "echo",
        }
    }
}

/// What the connection should write back for a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Ordinary data: write the frame back and record it.
    Echo,
    /// Control route: write these bytes, record nothing.
    Reply(Bytes),
}

/// Answers control routes from the shared registry.
///
/// Cheap to clone; every connection handler holds its own.
#[derive(Debug, Clone)]
pub struct CommandRouter {
    registry: Arc<StatsRegistry>,
}

impl CommandRouter {
    /// Creates a router reading from `registry`.
    pub fn new(registry: Arc<StatsRegistry>) -> Self {
        Self { registry }
    }

    /// Routes a frame. Never mutates the registry.
    pub fn route(&self, frame: &Frame) -> Response {
        self.dispatch(Route::classify(frame.as_bytes()))
    }

    /// Computes the response for an already classified route.
    pub fn dispatch(&self, route: Route) -> Response {
        match route {
            Route::ClientsCount => Response::Reply(self.cmd_clients_count()),
            Route::MessageCounts => Response::Reply(self.cmd_message_counts()),
            Route::MessageSizes => Response::Reply(self.cmd_message_sizes()),
            Route::Echo => Response::Echo,
        }
    }

    fn cmd_clients_count(&self) -> Bytes {
        Bytes::from(self.registry.len().to_string())
    }

    fn cmd_message_counts(&self) -> Bytes {
        let snapshot = self.registry.snapshot();
        join_decimal(snapshot.iter().map(|s| s.message_count))
    }

    /// Sizes are summed per connection: two 6-byte messages report 12.
    fn cmd_message_sizes(&self) -> Bytes {
        let snapshot = self.registry.snapshot();
        join_decimal(snapshot.iter().map(|s| s.total_bytes))
    }
}

/// Formats values as `1,2,3`.
fn join_decimal(values: impl Iterator<Item = u64>) -> Bytes {
    let parts: Vec<String> = values.map(|value| value.to_string()).collect();
    Bytes::from(parts.join(","))
}
