//! Producer-side span tracing with a bounded local message queue transport.
//!
//! `spanq` lets request-handling code create, annotate and stop lightweight
//! trace spans, and reliably hands the finished records to an out-of-process
//! collector without ever blocking the request path beyond a bounded time.
//!
//! The pipeline has four parts:
//!
//! - [`trace`]: the span/trace data model and the [`Tracer`] that creates,
//!   samples and publishes spans, with [`SpanHook`]s as the extension seam;
//! - [`transport`]: a bounded-capacity message queue with a POSIX kernel
//!   queue backend for production and an in-memory backend for tests and
//!   unsupported platforms;
//! - [`model`]: the JSON wire encoding consumed by the collector;
//! - [`propagation`]: header helpers carrying trace identity across wire
//!   calls.
//!
//! Telemetry is best-effort by design: under backpressure spans are dropped
//! with a logged, typed error, never a hang and never a failed request.
//!
//! # Example
//!
//! ```
//! use spanq::trace::{Sampler, SpanType, Tracer};
//! use spanq::transport::InMemoryQueue;
//!
//! let queue = InMemoryQueue::new(100, 64 * 1024);
//! let tracer = Tracer::builder()
//!     .with_sampler(Sampler::RateBased(1.0))
//!     .with_queue(Box::new(queue.clone()))
//!     .build();
//!
//! let mut span = tracer
//!     .span_builder("handle-request")
//!     .with_span_type(SpanType::Server)
//!     .start(&tracer);
//! span.set_tag("http.method", "GET");
//!
//! let mut child = span.start_child("query-db", SpanType::Client);
//! child.add_counter("rows", 42.0);
//! child.stop(None).unwrap();
//!
//! span.stop(None).unwrap();
//! assert_eq!(queue.len(), 2);
//! ```
//!
//! [`Tracer`]: trace::Tracer
//! [`SpanHook`]: trace::SpanHook

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod common;
pub mod error;
pub mod global;
pub mod model;
pub mod propagation;
pub mod trace;
pub mod transport;

mod internal_logging;

pub use common::Value;
pub use error::{HookError, TransportError, TransportResult};

#[cfg(feature = "internal-logs")]
#[doc(hidden)]
pub mod _private {
    pub use tracing::{debug, error, warn};
}
