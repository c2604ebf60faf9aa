//! The consumer side: a fixed pool of OS threads, each pulling one
//! connection at a time from the dispatcher and handing it to the
//! configured service.

use crate::dispatcher::Dispatcher;
use crate::error::StartupError;
use crate::service::Service;
use crate::stats::RequestStats;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, trace};

/// A pool of worker threads, each running the same loop: block for a
/// connection, serve it, report completion.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `thread_count` workers sharing `dispatcher` and `service`.
    pub fn spawn(
        thread_count: usize,
        dispatcher: Arc<Dispatcher>,
        service: Arc<dyn Service>,
    ) -> Result<Self, StartupError> {
        let mut handles = Vec::with_capacity(thread_count);
        for thread_id in 0..thread_count {
            let dispatcher = Arc::clone(&dispatcher);
            let service = Arc::clone(&service);
            let handle = thread::Builder::new()
                .name(format!("dispatchd-worker-{thread_id}"))
                .spawn(move || worker_loop(thread_id, dispatcher, service))
                .map_err(|source| StartupError::ThreadSpawn { thread_id, source })?;
            handles.push(handle);
        }
        Ok(Self { handles })
    }

    /// Block until every worker thread has exited. Workers never return on
    /// their own, so this only completes if a worker panics or the process
    /// is otherwise torn down; callers mainly use this to propagate panics.
    pub fn join(self) {
        for handle in self.handles {
            let _ = handle.join();
        }
    }
}

fn worker_loop(thread_id: usize, dispatcher: Arc<Dispatcher>, service: Arc<dyn Service>) {
    loop {
        let connection = dispatcher.get_request();
        let dispatch_time = connection.arrival_time.elapsed();
        trace!(thread_id, ?dispatch_time, "dispatched");

        let stats = RequestStats {
            thread_id,
            arrival_time: connection.arrival_time,
            dispatch_time,
        };

        let started = Instant::now();
        service.serve(&connection.stream, &stats);
        debug!(thread_id, service_time = ?started.elapsed(), "request complete");

        drop(connection);
        dispatcher.notify_done();
    }
}
