//! # Span and trace lifecycle
//!
//! The span/trace data model and its orchestration:
//!
//! - [`Span`]: one unit of traced work: identity, timing, tags, counters
//!   and lifecycle hooks.
//! - [`Tracer`]: creates spans (root or child), makes the root sampling
//!   decision, and publishes finished spans through the message transport.
//! - [`SpanHook`] / [`CreateServerSpanHook`]: the extension seam other
//!   subsystems observe lifecycles through.
//!
//! A trace is the implicit set of spans sharing one [`TraceId`]; it is
//! never materialized as an object.

pub mod config;
pub mod hook;
pub mod id_generator;
pub mod sampler;
pub mod span;
pub mod span_context;
pub mod tracer;

pub use config::Config;
pub use hook::{CreateServerSpanHook, SpanHook};
pub use id_generator::{IdGenerator, RandomIdGenerator};
pub use sampler::{Sampler, ShouldSample};
pub use span::{FinishedSpan, Span, SpanType};
pub use span_context::{SpanContext, SpanId, TraceFlags, TraceId};
pub use tracer::{SpanBuilder, Tracer, TracerBuilder};
