//! Wires the dispatcher, worker pool, and accept loop together and runs
//! them for the life of the process.

use crate::config::Config;
use crate::connection::Connection;
use crate::dispatcher::Dispatcher;
use crate::error::StartupError;
use crate::net;
use crate::service::{Service, StaticFileService};
use crate::worker::WorkerPool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Top-level server instance: owns the shared dispatcher and service, and
/// drives the accept loop once `run` binds the listening socket.
pub struct Server {
    config: Config,
    dispatcher: Arc<Dispatcher>,
    service: Arc<dyn Service>,
}

impl Server {
    /// Build the dispatcher and service from configuration. Does not bind
    /// the listening socket yet; that happens in `run`.
    pub fn new(config: Config) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(
            config.threads + config.queue_size,
            config.schedalg,
        ));
        let service = Arc::new(StaticFileService::new(
            config.doc_root.clone(),
            Duration::from_secs(config.read_timeout_secs),
        ));

        Server {
            config,
            dispatcher,
            service,
        }
    }

    /// Bind the listening socket, start the worker pool, and run the
    /// accept loop. Never returns on success; workers are detached for
    /// the life of the process (see the Non-goal of graceful shutdown).
    pub fn run(&self) -> Result<(), StartupError> {
        let listener = net::listen(self.config.port).map_err(|source| StartupError::Listen {
            port: self.config.port,
            source,
        })?;
        info!(
            port = self.config.port,
            threads = self.config.threads,
            queue_size = self.config.queue_size,
            schedalg = ?self.config.schedalg,
            doc_root = %self.config.doc_root.display(),
            "dispatchd listening"
        );

        let _workers = WorkerPool::spawn(
            self.config.threads,
            Arc::clone(&self.dispatcher),
            Arc::clone(&self.service),
        )?;

        loop {
            match net::accept(&listener) {
                Ok((stream, peer)) => {
                    let arrival_time = Instant::now();
                    debug!(peer = %peer, "accepted connection");
                    self.dispatcher.add_request(Connection::new(stream, arrival_time));
                }
                Err(e) => {
                    warn!(error = %e, "failed to accept connection");
                }
            }
        }
    }
}
