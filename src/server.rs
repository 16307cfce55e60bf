//! TCP Listener
//!
//! Accepts client connections and spawns one handler task per connection.
//!
//! ## Accept Loop
//!
//! ```text
//! loop {
//!     [acquire client slot]      only when max_clients is set
//!     accept()                   extra clients wait in the kernel backlog
//!     register in StatsRegistry  before spawning, so registration follows
//!                                accept order
//!     spawn(handler.run())       slot released when the task ends
//! }
//! ```
//!
//! Accept errors are logged and the loop keeps going; a failure on one
//! connection never stops the listener.

use crate::config::Config;
use crate::connection::{handle_connection, ConnectionHandler};
use crate::stats::StatsRegistry;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

/// The listening side of the server.
pub struct Server {
    listener: TcpListener,
    registry: Arc<StatsRegistry>,
    limit: Option<Arc<Semaphore>>,
}

impl Server {
    /// Binds a listener using `config`.
    pub async fn bind(config: &Config, registry: Arc<StatsRegistry>) -> io::Result<Self> {
        let listener = TcpListener::bind(config.bind_address()).await?;
        Ok(Self::from_listener(listener, registry, config.max_clients))
    }

    /// Wraps an already bound listener.
    pub fn from_listener(
        listener: TcpListener,
        registry: Arc<StatsRegistry>,
        max_clients: Option<usize>,
    ) -> Self {
        Self {
            listener,
            registry,
            limit: max_clients.map(|n| Arc::new(Semaphore::new(n))),
        }
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop forever.
    pub async fn run(self) {
        info!(
            addr = ?self.listener.local_addr().ok(),
            max_clients = ?self.limit.as_ref().map(|s| s.available_permits()),
            "Accepting connections"
        );

        loop {
            // Hold a slot before accepting so excess clients stay queued
            let permit = match &self.limit {
                Some(limit) => match Arc::clone(limit).acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(_) => return,
                },
                None => None,
            };

            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        debug!(client = %addr, error = %e, "Failed to set TCP_NODELAY");
                    }

                    let handler = ConnectionHandler::new(stream, addr, Arc::clone(&self.registry));

                    // Spawn a task to handle this connection
                    tokio::spawn(async move {
                        handle_connection(handler).await;
                        drop(permit);
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }

    /// Runs the accept loop until `shutdown` completes.
    ///
    /// Connections already spawned are left to finish on their own.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            _ = self.run() => {}
            _ = shutdown => {}
        }
    }
}
