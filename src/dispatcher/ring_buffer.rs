//! Fixed-capacity circular queue supporting removal at either end.
//!
//! Callers are expected to hold an external lock (the dispatcher mutex) for
//! the duration of any operation here; this type has no synchronization of
//! its own.

use thiserror::Error;

/// Which end of the buffer to remove an element from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum End {
    Head,
    Tail,
}

/// Errors returned by ring buffer operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RingBufferError {
    #[error("ring buffer is full")]
    Full,
    #[error("ring buffer is empty")]
    Empty,
}

/// A fixed-size circular buffer of `T`, with insertion at the tail and
/// removal from either the head or the tail.
pub struct RingBuffer<T> {
    slots: Vec<Option<T>>,
    head: Option<usize>,
    tail: usize,
    len: usize,
}

impl<T> RingBuffer<T> {
    /// Create a buffer with the given fixed capacity.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be positive");
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            head: None,
            tail: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Insert `value` at the tail.
    pub fn enqueue(&mut self, value: T) -> Result<(), RingBufferError> {
        if self.is_full() {
            return Err(RingBufferError::Full);
        }
        let size = self.capacity();
        match self.head {
            None => {
                self.head = Some(0);
                self.tail = 0;
            }
            Some(_) => {
                self.tail = (self.tail + 1) % size;
            }
        }
        self.slots[self.tail] = Some(value);
        self.len += 1;
        Ok(())
    }

    /// Remove and return one element from `end`.
    pub fn dequeue(&mut self, end: End) -> Result<T, RingBufferError> {
        let head = self.head.ok_or(RingBufferError::Empty)?;
        let size = self.capacity();

        let idx = match end {
            End::Head => head,
            End::Tail => self.tail,
        };
        let value = self.slots[idx].take().expect("occupied slot must hold a value");

        if head == self.tail {
            // last element
            self.head = None;
            self.tail = 0;
        } else if end == End::Head {
            self.head = Some((head + 1) % size);
        } else {
            self.tail = if self.tail == 0 { size - 1 } else { self.tail - 1 };
        }

        self.len -= 1;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_dequeue_head_is_fifo() {
        let mut rb = RingBuffer::new(4);
        rb.enqueue(1).unwrap();
        rb.enqueue(2).unwrap();
        rb.enqueue(3).unwrap();

        assert_eq!(rb.dequeue(End::Head).unwrap(), 1);
        assert_eq!(rb.dequeue(End::Head).unwrap(), 2);
        assert_eq!(rb.dequeue(End::Head).unwrap(), 3);
    }

    #[test]
    fn single_round_trip_on_empty_buffer() {
        let mut rb: RingBuffer<&str> = RingBuffer::new(1);
        rb.enqueue("a").unwrap();
        assert_eq!(rb.dequeue(End::Head).unwrap(), "a");
        assert!(rb.is_empty());
    }

    #[test]
    fn tail_then_head_removal() {
        let mut rb = RingBuffer::new(4);
        rb.enqueue("a").unwrap();
        rb.enqueue("b").unwrap();

        assert_eq!(rb.dequeue(End::Tail).unwrap(), "b");
        assert_eq!(rb.dequeue(End::Head).unwrap(), "a");
        assert!(rb.is_empty());
    }

    #[test]
    fn full_buffer_rejects_enqueue() {
        let mut rb = RingBuffer::new(2);
        rb.enqueue(1).unwrap();
        rb.enqueue(2).unwrap();
        assert_eq!(rb.enqueue(3), Err(RingBufferError::Full));
    }

    #[test]
    fn empty_buffer_rejects_dequeue() {
        let mut rb: RingBuffer<i32> = RingBuffer::new(2);
        assert_eq!(rb.dequeue(End::Head), Err(RingBufferError::Empty));
        assert_eq!(rb.dequeue(End::Tail), Err(RingBufferError::Empty));
    }

    #[test]
    fn wraps_around_after_partial_drain() {
        let mut rb = RingBuffer::new(3);
        rb.enqueue(1).unwrap();
        rb.enqueue(2).unwrap();
        rb.dequeue(End::Head).unwrap(); // drains slot 0, head -> 1
        rb.enqueue(3).unwrap();
        rb.enqueue(4).unwrap(); // wraps tail back to slot 0

        assert!(rb.is_full());
        assert_eq!(rb.dequeue(End::Head).unwrap(), 2);
        assert_eq!(rb.dequeue(End::Head).unwrap(), 3);
        assert_eq!(rb.dequeue(End::Head).unwrap(), 4);
        assert!(rb.is_empty());
    }

    #[test]
    fn resets_to_empty_after_draining_last_element() {
        let mut rb = RingBuffer::new(2);
        rb.enqueue(1).unwrap();
        rb.dequeue(End::Head).unwrap();
        assert!(rb.is_empty());
        // Buffer must be fully usable again, not stuck.
        rb.enqueue(2).unwrap();
        rb.enqueue(3).unwrap();
        assert!(rb.is_full());
    }
}
