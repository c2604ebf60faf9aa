//! Per-request timing instrumentation passed into `Service::serve`.

use std::time::{Duration, Instant};

/// Timing and identity data for a single dispatched request.
#[derive(Debug, Clone, Copy)]
pub struct RequestStats {
    /// Index of the worker serving this request.
    pub thread_id: usize,
    /// When the connection's `accept` returned.
    pub arrival_time: Instant,
    /// Time the connection spent queued before a worker picked it up.
    pub dispatch_time: Duration,
}
