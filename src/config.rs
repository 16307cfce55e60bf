//! Server configuration.
//!
//! Every option can be given on the command line or through an
//! `ECHOSTAT_*` environment variable. Command-line flags win.

use clap::Parser;
use std::num::NonZeroUsize;

/// Command-line arguments for the server
#[derive(Parser, Debug)]
#[command(name = "echostat")]
#[command(version)]
#[command(about = "TCP echo server with in-band connection statistics", long_about = None)]
pub struct CliArgs {
    /// Host to bind to
    #[arg(short = 'H', long, env = "ECHOSTAT_HOST", default_value = crate::DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "ECHOSTAT_PORT", default_value_t = crate::DEFAULT_PORT)]
    pub port: u16,

    /// Maximum number of concurrently served clients (unbounded if unset)
    #[arg(short, long, env = "ECHOSTAT_MAX_CLIENTS")]
    pub max_clients: Option<NonZeroUsize>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides it
    #[arg(long, env = "ECHOSTAT_LOG", default_value = "info")]
    pub log_level: String,
}

/// Final resolved configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Cap on concurrently served clients
    pub max_clients: Option<usize>,
    /// Default log filter
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: crate::DEFAULT_HOST.to_string(),
            port: crate::DEFAULT_PORT,
            max_clients: None,
            log_level: "info".to_string(),
        }
    }
}

impl From<CliArgs> for Config {
    fn from(cli: CliArgs) -> Self {
        Self {
            host: cli.host,
            port: cli.port,
            max_clients: cli.max_clients.map(NonZeroUsize::get),
            log_level: cli.log_level,
        }
    }
}

impl Config {
    /// Parses configuration from the process arguments and environment.
    ///
    /// Exits the process with a usage message on invalid input.
    pub fn from_args() -> Self {
        CliArgs::parse().into()
    }

    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
