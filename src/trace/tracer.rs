//! # Tracer
//!
//! The `Tracer` orchestrates span creation (root or child), the root
//! sampling decision, wire encoding, and publishing through the message
//! transport under a bounded deadline.
//!
//! Tracing is best-effort instrumentation layered on top of real request
//! handling: every failure on the publish path is demoted to a logged,
//! non-fatal outcome. The error is still returned so callers can react
//! (bump a drop counter, say), but nothing here ever escalates into a
//! failed request.

use crate::error::{TransportError, TransportResult};
use crate::model::{self, Endpoint};
use crate::trace::config::Config;
use crate::trace::hook::{CreateServerSpanHook, HookRegistry};
use crate::trace::id_generator::{IdGenerator, RandomIdGenerator};
use crate::trace::sampler::ShouldSample;
use crate::trace::span::{FinishedSpan, Span, SpanData, SpanType};
use crate::trace::span_context::{SpanContext, TraceFlags};
use crate::transport::{InMemoryQueue, MessageQueue, QueueConfig};
use crate::{common::Value, spanq_warn};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

/// `Tracer` implementation to create and publish spans.
///
/// Cheap to clone; clones share the same configuration, hook registry and
/// transport handle.
#[derive(Clone)]
pub struct Tracer {
    inner: Arc<TracerInner>,
}

struct TracerInner {
    config: Config,
    queue: Box<dyn MessageQueue>,
    id_generator: Box<dyn IdGenerator>,
    server_span_hooks: HookRegistry,
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer")
            .field("endpoint", &self.inner.config.endpoint)
            .field("record_timeout", &self.inner.config.record_timeout)
            .finish()
    }
}

impl Tracer {
    /// Start building a tracer.
    pub fn builder() -> TracerBuilder {
        TracerBuilder::default()
    }

    /// Create a builder for a span with the given operation name.
    pub fn span_builder(&self, name: impl Into<Cow<'static, str>>) -> SpanBuilder {
        SpanBuilder::from_name(name)
    }

    /// Start a local span with defaults, the shorthand for
    /// `tracer.span_builder(name).start(&tracer)`.
    pub fn start(&self, name: impl Into<Cow<'static, str>>) -> Span {
        self.span_builder(name).start(self)
    }

    /// Build a span from a builder, firing the creation hooks.
    ///
    /// Server spans additionally pass through the tracer's
    /// create-server-span registry before their post-start hooks run.
    pub fn build(&self, builder: SpanBuilder) -> Span {
        let is_server = builder.span_type == SpanType::Server;
        let mut span = self.build_raw(builder);
        if is_server {
            self.inner.server_span_hooks.on_create_server_span(&mut span);
        }
        span.fire_post_start();
        span
    }

    /// Build the span itself without firing any hooks. Used by
    /// [`Span::start_child`], which runs the parent's creation hooks
    /// instead of the server registry.
    pub(crate) fn build_raw(&self, builder: SpanBuilder) -> Span {
        let span_id = self.inner.id_generator.new_span_id();
        let context = match builder.parent {
            // A child copies trace id, sampling decision and flags
            // verbatim; only its span id is fresh.
            Some(parent) => SpanContext::new(
                parent.trace_id(),
                span_id,
                parent.is_sampled(),
                parent.trace_flags().with_debug(
                    parent.trace_flags().is_debug() || builder.debug,
                ),
            ),
            // A root draws a fresh trace id and the once-per-trace
            // sampling decision.
            None => SpanContext::new(
                self.inner.id_generator.new_trace_id(),
                span_id,
                self.inner.config.sampler.should_sample(&builder.name),
                TraceFlags::NONE.with_debug(builder.debug),
            ),
        };

        let mut tags = builder.tags.unwrap_or_default();
        if context.is_debug() {
            tags.insert("debug".to_string(), Value::from(true));
        }

        let data = SpanData {
            parent_id: builder.parent.map(|p| p.span_id()),
            span_type: builder.span_type,
            name: builder.name,
            start: builder.start.unwrap_or_else(SystemTime::now),
            tags,
            counters: HashMap::new(),
        };
        Span::new(context, data, self.clone())
    }

    /// Publish a finished span.
    ///
    /// A no-op unless the trace is sampled or debug-flagged. Otherwise the
    /// span is encoded and sent with a deadline of
    /// `min(now + record_timeout, caller deadline)`; an expired or absent
    /// caller deadline falls back to a fresh `record_timeout` budget so an
    /// unrelated cancellation does not starve telemetry of its chance to
    /// flush.
    ///
    /// Transport failures are logged with an actionable message and
    /// returned; they are never fatal.
    pub fn record(&self, deadline: Option<Instant>, span: &FinishedSpan) -> TransportResult<()> {
        if !span.context.is_sampled() && !span.context.is_debug() {
            return Ok(());
        }

        let wire = model::wire_span(span, &self.inner.config.endpoint);
        let payload = serde_json::to_vec(&wire)
            .map_err(|e| TransportError::Os(io::Error::new(io::ErrorKind::InvalidData, e)))?;

        let now = Instant::now();
        let budget = now + self.inner.config.record_timeout;
        let send_deadline = match deadline {
            Some(d) if d > now => d.min(budget),
            _ => budget,
        };

        match self.inner.queue.send(&payload, Some(send_deadline)) {
            Ok(()) => Ok(()),
            Err(err @ TransportError::MessageTooLarge { .. }) => {
                spanq_warn!(
                    name: "record.message_too_large",
                    message = "span exceeds max message size, likely excess tags",
                    span = span.name(),
                    size = payload.len()
                );
                Err(err)
            }
            Err(err @ TransportError::TimedOut(_)) => {
                spanq_warn!(
                    name: "record.queue_full",
                    message = "trace queue full, is the collector healthy?",
                    span = span.name()
                );
                Err(err)
            }
            Err(err) => {
                spanq_warn!(
                    name: "record.transport_failure",
                    span = span.name(),
                    error = format!("{err}")
                );
                Err(err)
            }
        }
    }

    /// Close the underlying transport. Spans stopped afterwards are
    /// dropped with a logged error.
    pub fn close(&self) -> TransportResult<()> {
        self.inner.queue.close()
    }
}

/// Builder for [`Tracer`] instances.
pub struct TracerBuilder {
    config: Config,
    queue: Option<Box<dyn MessageQueue>>,
    id_generator: Box<dyn IdGenerator>,
    server_span_hooks: HookRegistry,
}

impl Default for TracerBuilder {
    fn default() -> Self {
        TracerBuilder {
            config: Config::default(),
            queue: None,
            id_generator: Box::new(RandomIdGenerator::default()),
            server_span_hooks: HookRegistry::default(),
        }
    }
}

impl fmt::Debug for TracerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracerBuilder")
            .field("config", &self.config)
            .field("server_span_hooks", &self.server_span_hooks)
            .finish()
    }
}

impl TracerBuilder {
    /// The sampler consulted once per root span.
    pub fn with_sampler<S: ShouldSample + 'static>(mut self, sampler: S) -> Self {
        self.config.sampler = Box::new(sampler);
        self
    }

    /// Cap on how long one publish may block the calling flow.
    pub fn with_record_timeout(mut self, timeout: Duration) -> Self {
        self.config.record_timeout = timeout;
        self
    }

    /// The local service endpoint stamped on published annotations.
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.config.endpoint = endpoint;
        self
    }

    /// Use an already-open message queue as the transport.
    pub fn with_queue(mut self, queue: Box<dyn MessageQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Open the platform message queue described by `config` and use it as
    /// the transport.
    pub fn with_queue_config(self, config: &QueueConfig) -> TransportResult<Self> {
        let queue = crate::transport::open(config)?;
        Ok(self.with_queue(queue))
    }

    /// Register a hook fired for every new server span. Registration is
    /// append-only and must finish before spans are created.
    pub fn with_create_server_span_hook(mut self, hook: Arc<dyn CreateServerSpanHook>) -> Self {
        self.server_span_hooks.register(hook);
        self
    }

    #[cfg(test)]
    pub(crate) fn with_id_generator<G: IdGenerator + 'static>(mut self, generator: G) -> Self {
        self.id_generator = Box::new(generator);
        self
    }

    /// Build the tracer. Without an explicit queue a small in-memory queue
    /// stands in, which publishes nowhere but keeps the pipeline exercised.
    pub fn build(self) -> Tracer {
        let queue = self
            .queue
            .unwrap_or_else(|| Box::new(InMemoryQueue::new(128, 64 * 1024)));
        Tracer {
            inner: Arc::new(TracerInner {
                config: self.config,
                queue,
                id_generator: self.id_generator,
                server_span_hooks: self.server_span_hooks,
            }),
        }
    }
}

/// Options for starting a new [`Span`].
#[derive(Clone, Debug, Default)]
pub struct SpanBuilder {
    /// Operation name.
    pub name: Cow<'static, str>,
    /// Role of the span in its trace.
    pub span_type: SpanType,
    /// Explicit start time; defaults to now.
    pub start: Option<SystemTime>,
    /// Tags present from the beginning. Creation tags fire no hooks.
    pub tags: Option<HashMap<String, Value>>,
    /// Parent identity, local or propagated. `None` makes this a root.
    pub parent: Option<SpanContext>,
    /// Set the debug flag, forcing the trace to publish.
    pub debug: bool,
}

impl SpanBuilder {
    /// Create a builder with the given operation name.
    pub fn from_name(name: impl Into<Cow<'static, str>>) -> Self {
        SpanBuilder {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the span type.
    pub fn with_span_type(mut self, span_type: SpanType) -> Self {
        self.span_type = span_type;
        self
    }

    /// Set an explicit start time.
    pub fn with_start_time(mut self, start: SystemTime) -> Self {
        self.start = Some(start);
        self
    }

    /// Add a tag present from creation.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.tags
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Make the span a child of the given context (a local span's context
    /// or one extracted from propagated headers).
    pub fn child_of(mut self, parent: SpanContext) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Set the debug flag.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Build and start the span.
    pub fn start(self, tracer: &Tracer) -> Span {
        tracer.build(self)
    }
}
