//! The connection record handed from the accept loop to the dispatcher and
//! on to a worker.

use std::net::TcpStream;
use std::time::Instant;

/// One accepted TCP connection awaiting or undergoing service.
///
/// Ownership of `stream` is exactly one of: the accept loop (pre-submit),
/// the dispatcher's ring buffer (waiting), or a worker (running). Dropping
/// a `Connection` closes its socket; there is no manual close path.
pub struct Connection {
    pub stream: TcpStream,
    pub arrival_time: Instant,
}

impl Connection {
    pub fn new(stream: TcpStream, arrival_time: Instant) -> Self {
        Self {
            stream,
            arrival_time,
        }
    }
}
