//! # Message Transport
//!
//! A two-operation (send/receive), bounded-capacity queue used to hand
//! serialized spans to the local collector process.
//!
//! Two backends implement [`MessageQueue`]:
//!
//! - [`posix`]: a POSIX message queue client talking directly to the kernel.
//!   This is the production backend on 64-bit Linux.
//! - [`memory`]: a bounded in-memory queue used on unsupported platforms and
//!   in tests, where it doubles as an inspectable sink for published spans.
//!
//! [`open`] selects the backend at build time; kernel-specific types never
//! leak above the [`MessageQueue`] boundary.
//!
//! Every blocking call takes an explicit deadline and returns
//! [`TransportError::TimedOut`] promptly on expiry. There is no
//! retry-until-success policy anywhere: a message that cannot be enqueued
//! within its deadline is dropped by the caller.
//!
//! [`TransportError::TimedOut`]: crate::error::TransportError::TimedOut

use crate::error::TransportResult;
use std::fmt;
use std::time::Instant;

pub mod memory;
#[cfg(all(target_os = "linux", target_pointer_width = "64"))]
pub mod posix;

pub use memory::InMemoryQueue;
#[cfg(all(target_os = "linux", target_pointer_width = "64"))]
pub use posix::PosixMessageQueue;

/// Hard upper bound on the queue depth a caller may request.
pub const MAX_QUEUE_SIZE: usize = 10_000;

/// Configuration for opening a message queue.
#[derive(Clone, Debug)]
pub struct QueueConfig {
    /// Logical queue name. The POSIX backend prefixes this with a fixed
    /// namespace so unrelated queues cannot collide.
    pub name: String,
    /// Maximum number of outstanding messages. Clamped to
    /// [`MAX_QUEUE_SIZE`] by the POSIX backend.
    pub max_queue_size: usize,
    /// Maximum size of a single message in bytes.
    pub max_message_size: usize,
}

impl QueueConfig {
    /// Create a config with the given logical name and the bounds the
    /// collector sidecar is provisioned for.
    pub fn new(name: impl Into<String>, max_queue_size: usize, max_message_size: usize) -> Self {
        QueueConfig {
            name: name.into(),
            max_queue_size,
            max_message_size,
        }
    }
}

/// A bounded-capacity, bounded-latency message queue.
///
/// Implementations must be safe under concurrent [`send`] calls; the handle
/// is shared by every publisher in the process.
///
/// [`send`]: MessageQueue::send
pub trait MessageQueue: Send + Sync + fmt::Debug {
    /// Enqueue `payload`, blocking until room is available or `deadline`
    /// expires. `None` (or an already-elapsed deadline) means a single
    /// non-blocking attempt.
    fn send(&self, payload: &[u8], deadline: Option<Instant>) -> TransportResult<()>;

    /// Dequeue the oldest message, blocking until one is available, the
    /// queue is closed, or `deadline` expires. Only the in-memory backend
    /// supports this; the POSIX backend is opened write-only.
    fn receive(&self, deadline: Option<Instant>) -> TransportResult<Vec<u8>>;

    /// Close the queue. Every subsequent `send` fails; safe to call more
    /// than once.
    fn close(&self) -> TransportResult<()>;
}

/// Open the platform message queue for this build target.
///
/// On 64-bit Linux this is the POSIX message queue client; everywhere else
/// the bounded in-memory queue stands in so the rest of the pipeline behaves
/// identically.
pub fn open(config: &QueueConfig) -> TransportResult<Box<dyn MessageQueue>> {
    #[cfg(all(target_os = "linux", target_pointer_width = "64"))]
    {
        Ok(Box::new(PosixMessageQueue::open(config)?))
    }
    #[cfg(not(all(target_os = "linux", target_pointer_width = "64")))]
    {
        Ok(Box::new(InMemoryQueue::with_config(config)))
    }
}
