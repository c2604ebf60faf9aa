//! dispatchd: a concurrent HTTP request dispatcher with admission control.
//!
//! Accepts connections on a listening socket, queues them in a bounded ring
//! buffer, and dispatches them to a fixed pool of worker threads. When the
//! queue saturates, the configured overload policy decides what happens:
//! block the accept loop, drop the arriving connection, evict the oldest
//! waiting one, or evict roughly half of the waiting set at random.

mod config;
mod connection;
mod dispatcher;
mod error;
mod net;
mod server;
mod service;
mod stats;
mod worker;

use config::Config;
use server::Server;
use tracing_subscriber::EnvFilter;

fn main() {
    let config = Config::load();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let server = Server::new(config);
    if let Err(e) = server.run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
