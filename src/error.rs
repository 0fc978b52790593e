//! Error types shared across the crate.
use std::io;
use thiserror::Error;

/// A specialized `Result` type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors returned by the message transport and the publish path.
///
/// None of these are fatal to the traced request: callers are expected to
/// log, optionally count, and move on. A dropped span is an accepted outcome.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TransportError {
    /// The queue was full for the whole deadline, or the deadline had already
    /// elapsed before the message could be handed to the kernel.
    #[error("message queue operation timed out")]
    TimedOut(#[source] io::Error),

    /// The serialized payload exceeds the queue's maximum message size.
    #[error("message of {size} bytes exceeds the queue maximum of {max} bytes")]
    MessageTooLarge {
        /// Size of the rejected payload in bytes.
        size: usize,
        /// Maximum message size the queue was opened with.
        max: usize,
    },

    /// The queue has been closed; no further sends will succeed.
    #[error("message queue is closed")]
    Closed,

    /// Any other OS or encoding failure, surfaced verbatim.
    #[error(transparent)]
    Os(#[from] io::Error),
}

impl TransportError {
    /// Build a [`TransportError::TimedOut`] for a deadline that elapsed
    /// before the operation was attempted, distinct from a kernel timeout.
    pub(crate) fn deadline_elapsed() -> Self {
        TransportError::TimedOut(io::Error::new(
            io::ErrorKind::TimedOut,
            "deadline elapsed before the operation was attempted",
        ))
    }
}

/// Error type produced by span lifecycle hooks.
///
/// Hook errors are captured and logged at the dispatch boundary, never
/// propagated to the code driving the span.
pub type HookError = Box<dyn std::error::Error + Send + Sync + 'static>;
