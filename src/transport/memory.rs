//! Bounded in-memory message queue.
//!
//! The test and fallback backend for [`MessageQueue`]. It mirrors the
//! kernel queue's semantics (fixed capacity, per-message size limit, typed
//! timeout failures) so the publish path behaves identically on platforms
//! without POSIX message queues, and gives tests an inspectable sink.

use crate::error::{TransportError, TransportResult};
use crate::transport::{MessageQueue, QueueConfig};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Instant;

#[derive(Debug)]
struct State {
    buf: VecDeque<Vec<u8>>,
    closed: bool,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<State>,
    readable: Condvar,
    writable: Condvar,
    capacity: usize,
    max_message_size: usize,
}

/// A fixed-capacity in-memory queue.
///
/// Clones share the same buffer, so a test can hand one clone to a
/// [`Tracer`] and drain published payloads through another.
///
/// [`Tracer`]: crate::trace::Tracer
#[derive(Clone, Debug)]
pub struct InMemoryQueue {
    shared: Arc<Shared>,
}

impl InMemoryQueue {
    /// Create a queue holding at most `capacity` messages of at most
    /// `max_message_size` bytes each.
    pub fn new(capacity: usize, max_message_size: usize) -> Self {
        InMemoryQueue {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    buf: VecDeque::with_capacity(capacity),
                    closed: false,
                }),
                readable: Condvar::new(),
                writable: Condvar::new(),
                capacity,
                max_message_size,
            }),
        }
    }

    /// Create a queue from a [`QueueConfig`]. The logical name is unused;
    /// in-memory queues are never shared between processes.
    pub fn with_config(config: &QueueConfig) -> Self {
        InMemoryQueue::new(config.max_queue_size, config.max_message_size)
    }

    /// Number of messages currently buffered.
    pub fn len(&self) -> usize {
        self.shared
            .state
            .lock()
            .map(|state| state.buf.len())
            .unwrap_or(0)
    }

    /// Whether the buffer is currently empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MessageQueue for InMemoryQueue {
    fn send(&self, payload: &[u8], deadline: Option<Instant>) -> TransportResult<()> {
        if payload.len() > self.shared.max_message_size {
            // Rejected before touching the buffer, matching EMSGSIZE from
            // the kernel backend.
            return Err(TransportError::MessageTooLarge {
                size: payload.len(),
                max: self.shared.max_message_size,
            });
        }

        let mut state = self.shared.state.lock().map_err(lock_poisoned)?;
        loop {
            if state.closed {
                return Err(TransportError::Closed);
            }
            if state.buf.len() < self.shared.capacity {
                state.buf.push_back(payload.to_vec());
                self.shared.readable.notify_one();
                return Ok(());
            }
            // Full. Without an unexpired deadline this was our one
            // non-blocking attempt.
            let remaining = match deadline {
                Some(d) => match d.checked_duration_since(Instant::now()) {
                    Some(remaining) => remaining,
                    None => return Err(queue_full()),
                },
                None => return Err(queue_full()),
            };
            let (guard, timeout) = self
                .shared
                .writable
                .wait_timeout(state, remaining)
                .map_err(lock_poisoned)?;
            state = guard;
            if timeout.timed_out() && state.buf.len() >= self.shared.capacity {
                return Err(queue_full());
            }
        }
    }

    fn receive(&self, deadline: Option<Instant>) -> TransportResult<Vec<u8>> {
        let mut state = self.shared.state.lock().map_err(lock_poisoned)?;
        loop {
            if let Some(message) = state.buf.pop_front() {
                self.shared.writable.notify_one();
                return Ok(message);
            }
            // A blocked receive must observe closure rather than hang.
            if state.closed {
                return Err(TransportError::Closed);
            }
            let remaining = match deadline {
                Some(d) => match d.checked_duration_since(Instant::now()) {
                    Some(remaining) => remaining,
                    None => return Err(queue_empty()),
                },
                None => return Err(queue_empty()),
            };
            let (guard, timeout) = self
                .shared
                .readable
                .wait_timeout(state, remaining)
                .map_err(lock_poisoned)?;
            state = guard;
            if timeout.timed_out() && state.buf.is_empty() && !state.closed {
                return Err(queue_empty());
            }
        }
    }

    fn close(&self) -> TransportResult<()> {
        let mut state = self.shared.state.lock().map_err(lock_poisoned)?;
        state.closed = true;
        // Wake every blocked sender and receiver so they observe closure.
        self.shared.readable.notify_all();
        self.shared.writable.notify_all();
        Ok(())
    }
}

fn queue_full() -> TransportError {
    TransportError::TimedOut(io::Error::new(io::ErrorKind::WouldBlock, "queue is full"))
}

fn queue_empty() -> TransportError {
    TransportError::TimedOut(io::Error::new(io::ErrorKind::WouldBlock, "queue is empty"))
}

fn lock_poisoned<T>(_: std::sync::PoisonError<T>) -> TransportError {
    TransportError::Os(io::Error::other("queue lock poisoned"))
}
