//! Crate-wide error taxonomy.
//!
//! Startup failures (bad configuration, failed bind, failed thread spawn)
//! are fatal and abort the process with a diagnostic. Runtime overload is
//! handled entirely by the configured admission policy and never surfaces
//! as an `Err` here; `Service::serve` errors are logged by the service
//! layer and otherwise ignored by the dispatcher core.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving configuration from CLI args and
/// an optional TOML file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("usage: {program} <port> <threads> <queue_size> <schedalg> [--config <path>]")]
    Usage { program: String },

    #[error("invalid port {0:?}: must be a positive integer")]
    InvalidPort(String),

    #[error("invalid thread count {0:?}: must be at least 1")]
    InvalidThreads(String),

    #[error("invalid queue size {0:?}: must be at least 1")]
    InvalidQueueSize(String),

    #[error(transparent)]
    UnknownSchedalg(#[from] crate::dispatcher::schedalg::UnknownSchedalg),

    #[error("failed to read config file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    TomlParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Fatal startup errors: the process cannot meaningfully continue.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind listening socket on port {port}: {source}")]
    Listen {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn worker thread {thread_id}: {source}")]
    ThreadSpawn {
        thread_id: usize,
        #[source]
        source: std::io::Error,
    },
}
