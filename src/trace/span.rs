//! # Span
//!
//! A `Span` records one unit of traced work: identity, timing, tags and
//! counters, plus the hooks observing its lifecycle. Spans nest to form a
//! trace tree; each trace has a root span and the root's sampling decision
//! is inherited by every descendant.
//!
//! A span's mutable state is exclusively owned by whichever flow created it.
//! Passing a span across threads moves ownership; concurrent mutation of the
//! same span from two flows is unsupported and is the caller's
//! responsibility to avoid.
//!
//! Stopping a span is what publishes it: [`Span::stop`] fires the pre-stop
//! hooks, stamps the stop time exactly once, and hands the serialized record
//! to the tracer's transport under a bounded deadline. Mutations after stop
//! have no effect on the published data, and a second stop is a no-op.

use crate::common::Value;
use crate::error::TransportResult;
use crate::trace::hook::{report_hook_error, SpanHook};
use crate::trace::span_context::{SpanContext, SpanId};
use crate::trace::tracer::{SpanBuilder, Tracer};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Instant, SystemTime};

/// The role a span plays in its trace.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SpanType {
    /// The handling of an inbound request.
    Server,
    /// An outbound call to another service.
    Client,
    /// In-process work with no wire call on either side.
    #[default]
    Local,
}

/// Mutable state of a live span. Taken (and never restored) on stop, which
/// is what makes stop idempotent and post-stop mutation a no-op.
#[derive(Clone, Debug)]
pub(crate) struct SpanData {
    pub(crate) parent_id: Option<SpanId>,
    pub(crate) span_type: SpanType,
    pub(crate) name: Cow<'static, str>,
    pub(crate) start: SystemTime,
    pub(crate) tags: HashMap<String, Value>,
    pub(crate) counters: HashMap<String, f64>,
}

/// Single unit of traced work.
#[derive(Debug)]
pub struct Span {
    context: SpanContext,
    data: Option<SpanData>,
    hooks: Vec<Arc<dyn SpanHook>>,
    tracer: Tracer,
}

/// An immutable snapshot of a stopped span, ready for encoding.
#[derive(Clone, Debug)]
pub struct FinishedSpan {
    pub(crate) context: SpanContext,
    pub(crate) data: SpanData,
    pub(crate) stop: SystemTime,
}

impl FinishedSpan {
    /// The identity of the finished span.
    pub fn context(&self) -> &SpanContext {
        &self.context
    }

    /// The operation name.
    pub fn name(&self) -> &str {
        &self.data.name
    }
}

impl Span {
    pub(crate) fn new(context: SpanContext, data: SpanData, tracer: Tracer) -> Self {
        Span {
            context,
            data: Some(data),
            hooks: Vec::new(),
            tracer,
        }
    }

    /// The identity of this span, suitable for propagation and child
    /// creation.
    pub fn context(&self) -> &SpanContext {
        &self.context
    }

    /// The operation name, or empty once the span has stopped.
    pub fn name(&self) -> &str {
        self.data.as_ref().map(|d| d.name.as_ref()).unwrap_or("")
    }

    /// The role of this span in its trace.
    pub fn span_type(&self) -> SpanType {
        self.data
            .as_ref()
            .map(|d| d.span_type)
            .unwrap_or_default()
    }

    /// Whether the span is still live, i.e. has not been stopped.
    pub fn is_recording(&self) -> bool {
        self.data.is_some()
    }

    /// Attach a lifecycle hook. Hooks run in attachment order; the list is
    /// never reordered or truncated afterwards.
    pub fn add_hook(&mut self, hook: Arc<dyn SpanHook>) {
        self.hooks.push(hook);
    }

    /// Set a tag, last write wins. Fires `on_set_tag` on every hook. After
    /// stop this is a no-op.
    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let (key, value) = (key.into(), value.into());
        let Some(data) = self.data.as_mut() else {
            return;
        };
        data.tags.insert(key.clone(), value.clone());
        for hook in &self.hooks {
            if let Err(err) = hook.on_set_tag(&self.context, &key, &value) {
                report_hook_error("on_set_tag", &err);
            }
        }
    }

    /// Add `delta` to a counter, accumulating rather than overwriting.
    /// Fires `on_add_counter` on every hook. After stop this is a no-op.
    pub fn add_counter(&mut self, key: impl Into<String>, delta: f64) {
        let key = key.into();
        let Some(data) = self.data.as_mut() else {
            return;
        };
        *data.counters.entry(key.clone()).or_insert(0.0) += delta;
        for hook in &self.hooks {
            if let Err(err) = hook.on_add_counter(&self.context, &key, delta) {
                report_hook_error("on_add_counter", &err);
            }
        }
    }

    /// Set or clear the debug flag. While set, the span (and any children
    /// created afterwards) is published regardless of the sampling decision,
    /// and the flag is recorded as a `debug` tag.
    pub fn set_debug(&mut self, debug: bool) {
        let flags = self.context.trace_flags().with_debug(debug);
        self.context = SpanContext::new(
            self.context.trace_id(),
            self.context.span_id(),
            self.context.is_sampled(),
            flags,
        );
        if debug {
            self.set_tag("debug", true);
        }
    }

    /// Start a child span of this one.
    ///
    /// The child copies the trace id, sampling decision and flags verbatim;
    /// its span id, start time, tags, counters and hooks are fresh. This
    /// span's hooks observe the creation through `on_create_child` and may
    /// attach hooks to the child before its post-start hooks fire.
    pub fn start_child(
        &self,
        name: impl Into<Cow<'static, str>>,
        span_type: SpanType,
    ) -> Span {
        let builder = SpanBuilder::from_name(name)
            .with_span_type(span_type)
            .child_of(self.context);
        let mut child = self.tracer.build_raw(builder);
        for hook in &self.hooks {
            if let Err(err) = hook.on_create_child(&self.context, &mut child) {
                report_hook_error("on_create_child", &err);
            }
        }
        child.fire_post_start();
        child
    }

    /// Stop the span and publish it.
    ///
    /// Fires the pre-stop hooks, stamps the stop time, and hands the record
    /// to the transport bounded by `deadline` (capped by the tracer's
    /// configured record timeout). Publishing only happens if the trace is
    /// sampled or debug-flagged; otherwise this returns `Ok` without
    /// touching the transport.
    ///
    /// A second call is a no-op: the span is never re-published.
    pub fn stop(&mut self, deadline: Option<Instant>) -> TransportResult<()> {
        self.stop_with_timestamp(SystemTime::now(), deadline)
    }

    /// [`Span::stop`] with an explicit stop timestamp.
    pub fn stop_with_timestamp(
        &mut self,
        timestamp: SystemTime,
        deadline: Option<Instant>,
    ) -> TransportResult<()> {
        if self.data.is_none() {
            return Ok(());
        }
        let hooks = self.hooks.clone();
        for hook in &hooks {
            if let Err(err) = hook.on_pre_stop(self) {
                report_hook_error("on_pre_stop", &err);
            }
        }
        // Taking the data is the once-only gate: a concurrent-free second
        // stop finds nothing to publish.
        let Some(data) = self.data.take() else {
            return Ok(());
        };
        let finished = FinishedSpan {
            context: self.context,
            data,
            stop: timestamp,
        };
        let tracer = self.tracer.clone();
        tracer.record(deadline, &finished)
    }

    /// Run the post-start hooks. Called exactly once by whichever path
    /// created the span, after all creation hooks have attached.
    pub(crate) fn fire_post_start(&mut self) {
        let hooks = self.hooks.clone();
        for hook in &hooks {
            if let Err(err) = hook.on_post_start(self) {
                report_hook_error("on_post_start", &err);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn data(&self) -> Option<&SpanData> {
        self.data.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HookError;
    use crate::trace::{Sampler, Tracer};
    use crate::transport::{InMemoryQueue, MessageQueue};

    fn test_tracer() -> (Tracer, InMemoryQueue) {
        let queue = InMemoryQueue::new(16, 16 * 1024);
        let tracer = Tracer::builder()
            .with_sampler(Sampler::AlwaysOn)
            .with_queue(Box::new(queue.clone()))
            .build();
        (tracer, queue)
    }

    #[test]
    fn tags_are_last_write_wins() {
        let (tracer, _queue) = test_tracer();
        let mut span = tracer.span_builder("test").start(&tracer);
        span.set_tag("key", "first");
        span.set_tag("key", "second");
        assert_eq!(
            span.data().unwrap().tags.get("key"),
            Some(&Value::from("second"))
        );
    }

    #[test]
    fn counters_accumulate() {
        let (tracer, _queue) = test_tracer();
        let mut span = tracer.span_builder("test").start(&tracer);
        span.add_counter("retries", 1.0);
        span.add_counter("retries", 2.5);
        assert_eq!(span.data().unwrap().counters.get("retries"), Some(&3.5));
    }

    #[test]
    fn child_inherits_identity_but_not_state() {
        let (tracer, _queue) = test_tracer();
        let mut parent = tracer.span_builder("parent").start(&tracer);
        parent.set_tag("parent-only", true);
        parent.add_counter("parent-count", 1.0);

        let child = parent.start_child("child", SpanType::Client);
        assert_eq!(child.context().trace_id(), parent.context().trace_id());
        assert_eq!(child.context().is_sampled(), parent.context().is_sampled());
        assert_eq!(
            child.context().trace_flags(),
            parent.context().trace_flags()
        );
        assert_ne!(child.context().span_id(), parent.context().span_id());
        assert_eq!(
            child.data().unwrap().parent_id,
            Some(parent.context().span_id())
        );
        assert!(child.data().unwrap().tags.is_empty());
        assert!(child.data().unwrap().counters.is_empty());
    }

    #[test]
    fn debug_flag_inherited_by_later_children() {
        let (tracer, _queue) = test_tracer();
        let mut parent = tracer.span_builder("parent").start(&tracer);
        parent.set_debug(true);
        assert_eq!(
            parent.data().unwrap().tags.get("debug"),
            Some(&Value::from(true))
        );
        let child = parent.start_child("child", SpanType::Local);
        assert!(child.context().is_debug());
    }

    #[test]
    fn mutation_after_stop_is_a_no_op() {
        let (tracer, queue) = test_tracer();
        let mut span = tracer.span_builder("test").start(&tracer);
        span.stop(None).unwrap();
        assert!(!span.is_recording());

        span.set_tag("late", true);
        span.add_counter("late", 1.0);

        let payload = queue.receive(None).unwrap();
        let text = String::from_utf8(payload).unwrap();
        assert!(!text.contains("late"));
    }

    #[test]
    fn second_stop_does_not_republish() {
        let (tracer, queue) = test_tracer();
        let mut span = tracer.span_builder("test").start(&tracer);
        span.stop(None).unwrap();
        span.stop(None).unwrap();
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn pre_stop_hook_error_does_not_prevent_publish() {
        #[derive(Debug)]
        struct FailingPreStop;
        impl SpanHook for FailingPreStop {
            fn on_pre_stop(&self, _: &mut Span) -> Result<(), HookError> {
                Err("pre-stop exploded".into())
            }
        }

        let (tracer, queue) = test_tracer();
        let mut span = tracer.span_builder("test").start(&tracer);
        span.add_hook(Arc::new(FailingPreStop));
        span.stop(None).unwrap();
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn pre_stop_hook_mutations_are_published() {
        #[derive(Debug)]
        struct StampOnStop;
        impl SpanHook for StampOnStop {
            fn on_pre_stop(&self, span: &mut Span) -> Result<(), HookError> {
                span.set_tag("stopped-by-hook", true);
                Ok(())
            }
        }

        let (tracer, queue) = test_tracer();
        let mut span = tracer.span_builder("test").start(&tracer);
        span.add_hook(Arc::new(StampOnStop));
        span.stop(None).unwrap();

        let text = String::from_utf8(queue.receive(None).unwrap()).unwrap();
        assert!(text.contains("stopped-by-hook"));
    }

    #[test]
    fn hooks_fire_in_attachment_order() {
        #[derive(Debug)]
        struct Ordered {
            id: usize,
            log: Arc<std::sync::Mutex<Vec<usize>>>,
        }
        impl SpanHook for Ordered {
            fn on_post_start(&self, _: &Span) -> Result<(), HookError> {
                self.log.lock().unwrap().push(self.id);
                Ok(())
            }
        }

        let (tracer, _queue) = test_tracer();
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut span = tracer.span_builder("test").start(&tracer);
        for id in 0..3 {
            span.add_hook(Arc::new(Ordered {
                id,
                log: log.clone(),
            }));
        }
        span.fire_post_start();
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn unsampled_span_is_not_published() {
        let queue = InMemoryQueue::new(16, 16 * 1024);
        let tracer = Tracer::builder()
            .with_sampler(Sampler::AlwaysOff)
            .with_queue(Box::new(queue.clone()))
            .build();
        let mut span = tracer.span_builder("test").start(&tracer);
        span.stop(None).unwrap();
        assert!(queue.is_empty());
    }

    #[test]
    fn debug_flag_forces_publish_of_unsampled_span() {
        let queue = InMemoryQueue::new(16, 16 * 1024);
        let tracer = Tracer::builder()
            .with_sampler(Sampler::AlwaysOff)
            .with_queue(Box::new(queue.clone()))
            .build();
        let mut span = tracer.span_builder("test").with_debug(true).start(&tracer);
        span.stop(None).unwrap();
        assert_eq!(queue.len(), 1);
    }
}
