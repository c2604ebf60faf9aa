//! The coordinator: shared mutable state synchronizing the single accept
//! loop producer with the N worker consumers, plus the admission policy
//! that decides what happens under saturation.
//!
//! A single mutex protects the ring buffer, the waiting/running counters,
//! and the admission RNG. Two condition variables are signaled on the two
//! events the other side waits for: `consume_cv` on every successful
//! enqueue, `produce_cv` on every completion.

mod ring_buffer;
pub mod schedalg;

use crate::connection::Connection;
use ring_buffer::{End, RingBuffer};
use schedalg::Schedalg;
use std::sync::{Condvar, Mutex};
use tracing::{debug, trace};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

struct State {
    schedalg: Schedalg,
    max_accepted_count: usize,
    waiting_count: usize,
    running_count: usize,
    queue: RingBuffer<Connection>,
    rng: StdRng,
}

impl State {
    fn saturated(&self) -> bool {
        self.waiting_count + self.running_count == self.max_accepted_count
    }

    /// Evict one waiting connection from `end`, returning it for the caller
    /// to drop once the lock is no longer needed.
    fn evict(&mut self, end: End) -> Connection {
        let evicted = self
            .queue
            .dequeue(end)
            .expect("caller verified waiting_count > 0");
        self.waiting_count -= 1;
        evicted
    }

    /// `random_drop_half`: evict `waiting/2` connections (or exactly 1 if
    /// `waiting == 1`), each from a fair-coin-chosen end.
    fn random_drop_half(&mut self, evicted: &mut Vec<Connection>) {
        if self.waiting_count == 1 {
            evicted.push(self.evict(End::Head));
            return;
        }
        let drops = self.waiting_count / 2;
        for _ in 0..drops {
            let end = if self.rng.gen_bool(0.5) {
                End::Head
            } else {
                End::Tail
            };
            evicted.push(self.evict(end));
        }
    }
}

/// Shared dispatcher state. Cloned (via `Arc`) into the accept loop and
/// every worker.
pub struct Dispatcher {
    state: Mutex<State>,
    produce_cv: Condvar,
    consume_cv: Condvar,
}

impl Dispatcher {
    pub fn new(max_accepted_count: usize, schedalg: Schedalg) -> Self {
        Self {
            state: Mutex::new(State {
                schedalg,
                max_accepted_count,
                waiting_count: 0,
                running_count: 0,
                queue: RingBuffer::new(max_accepted_count),
                rng: StdRng::from_entropy(),
            }),
            produce_cv: Condvar::new(),
            consume_cv: Condvar::new(),
        }
    }

    /// Admit a newly accepted connection, applying the configured overload
    /// policy if the server is saturated. Connections evicted to make room
    /// are dropped only after the mutex is released.
    pub fn add_request(&self, connection: Connection) {
        let mut evicted = Vec::new();
        let mut guard = self.state.lock().unwrap();
        let mut incoming = Some(connection);

        while guard.saturated() {
            match guard.schedalg {
                Schedalg::Block => {
                    guard = self.produce_cv.wait(guard).unwrap();
                }
                Schedalg::DropTail => {
                    evicted.push(incoming.take().expect("loop body runs at most once more"));
                    break;
                }
                Schedalg::DropHead => {
                    if guard.waiting_count == 0 {
                        // Every slot is a running worker; there is nothing
                        // to evict. Fall back to blocking rather than
                        // spinning (see the DROP_HEAD precondition).
                        guard = self.produce_cv.wait(guard).unwrap();
                    } else {
                        let head = guard.evict(End::Head);
                        evicted.push(head);
                    }
                }
                Schedalg::DropRandom => {
                    if guard.waiting_count == 0 {
                        evicted.push(incoming.take().expect("loop body runs at most once more"));
                        break;
                    }
                    guard.random_drop_half(&mut evicted);
                }
            }
        }

        if let Some(connection) = incoming {
            guard
                .queue
                .enqueue(connection)
                .expect("saturation loop guarantees room for exactly one more");
            guard.waiting_count += 1;
            self.consume_cv.notify_one();
            trace!(waiting = guard.waiting_count, running = guard.running_count, "admitted");
        }

        drop(guard);
        drop(evicted); // closes evicted/rejected sockets outside the lock
    }

    /// Block until a connection is waiting, then move it from waiting to
    /// running. Does not signal the producer: total capacity in use is
    /// unchanged by dispatch.
    pub fn get_request(&self) -> Connection {
        let mut guard = self.state.lock().unwrap();
        while guard.waiting_count == 0 {
            guard = self.consume_cv.wait(guard).unwrap();
        }
        let connection = guard
            .queue
            .dequeue(End::Head)
            .expect("waiting_count > 0 implies a non-empty queue");
        guard.waiting_count -= 1;
        guard.running_count += 1;
        connection
    }

    /// Called by a worker after `serve` returns and the connection has been
    /// dropped. Wakes at most one blocked producer.
    pub fn notify_done(&self) {
        let mut guard = self.state.lock().unwrap();
        guard.running_count -= 1;
        debug!(waiting = guard.waiting_count, running = guard.running_count, "request finished");
        drop(guard);
        self.produce_cv.notify_one();
    }

    #[cfg(test)]
    pub fn waiting_count(&self) -> usize {
        self.state.lock().unwrap().waiting_count
    }

    #[cfg(test)]
    pub fn running_count(&self) -> usize {
        self.state.lock().unwrap().running_count
    }
}
