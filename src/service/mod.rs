//! The service layer: the concrete stand-in for the dispatcher core's
//! opaque `serve(connection, stats)` collaborator.
//!
//! The dispatcher core only ever calls through the `Service` trait; it
//! knows nothing about HTTP, static files, or anything else a particular
//! implementation does with the socket it's handed.

mod static_file;

pub use static_file::StaticFileService;

use crate::stats::RequestStats;
use std::net::TcpStream;

/// Something that can read a request off a freshly dispatched connection
/// and write a response to it.
///
/// Implementations must not close `stream` themselves — the worker that
/// calls `serve` owns that responsibility (see the worker pool design) —
/// and must not block indefinitely; a well-behaved implementation bounds
/// its own reads with a timeout.
pub trait Service: Send + Sync {
    fn serve(&self, stream: &TcpStream, stats: &RequestStats);
}
