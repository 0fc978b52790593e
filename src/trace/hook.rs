//! Span lifecycle hooks.
//!
//! Hooks are the extension seam of the pipeline: metrics and error-reporting
//! subsystems observe span lifecycles without this core knowing about them.
//! A hook implements whichever subset of the lifecycle callbacks it cares
//! about; the rest default to no-ops, so dispatch needs no runtime type
//! inspection.
//!
//! Hook errors are captured and logged at the dispatch boundary, never
//! propagated: one failing hook cannot break span lifecycle for the process,
//! and never blocks the hooks after it.

use crate::common::Value;
use crate::error::HookError;
use crate::spanq_warn;
use crate::trace::span::Span;
use crate::trace::SpanContext;
use std::fmt;
use std::sync::Arc;

/// Per-span lifecycle hook.
///
/// Attached to a span at creation; invocation order equals attachment order
/// and the list is never mutated after attach. Every method has a no-op
/// default so implementors override only the points they observe.
pub trait SpanHook: Send + Sync + fmt::Debug {
    /// Called when a child span is created from the span carrying this hook,
    /// after the child's fields are populated but before its post-start
    /// hooks run. The hook may attach hooks to the child.
    fn on_create_child(&self, _parent: &SpanContext, _child: &mut Span) -> Result<(), HookError> {
        Ok(())
    }

    /// Called after a tag is set on the span.
    fn on_set_tag(&self, _span: &SpanContext, _key: &str, _value: &Value) -> Result<(), HookError> {
        Ok(())
    }

    /// Called after a counter is incremented on the span.
    fn on_add_counter(&self, _span: &SpanContext, _key: &str, _delta: f64) -> Result<(), HookError> {
        Ok(())
    }

    /// Called once after the span has started and its creation hooks have
    /// all been attached.
    fn on_post_start(&self, _span: &Span) -> Result<(), HookError> {
        Ok(())
    }

    /// Called when the span is stopped, before its stop time is stamped and
    /// the span is handed to the transport. The hook may still mutate tags
    /// and counters.
    fn on_pre_stop(&self, _span: &mut Span) -> Result<(), HookError> {
        Ok(())
    }
}

/// Hook fired for every new server span.
///
/// Server spans are where request handling enters the process, so this is
/// the point where process-wide subsystems attach their [`SpanHook`]s. The
/// registry holding these is owned by the [`Tracer`] and is append-only
/// after startup.
///
/// [`Tracer`]: crate::trace::Tracer
pub trait CreateServerSpanHook: Send + Sync + fmt::Debug {
    /// Called for each new server span before its post-start hooks run.
    /// Typically attaches one or more [`SpanHook`]s to the span.
    fn on_create_server_span(&self, span: &mut Span) -> Result<(), HookError>;
}

/// Append-only list of [`CreateServerSpanHook`]s.
///
/// Registration is expected to happen at startup, before spans are created;
/// races between registration and concurrent reads are not supported.
#[derive(Clone, Debug, Default)]
pub(crate) struct HookRegistry {
    hooks: Vec<Arc<dyn CreateServerSpanHook>>,
}

impl HookRegistry {
    pub(crate) fn register(&mut self, hook: Arc<dyn CreateServerSpanHook>) {
        self.hooks.push(hook);
    }

    /// Run every registered hook against a freshly created server span,
    /// logging failures without interrupting the rest.
    pub(crate) fn on_create_server_span(&self, span: &mut Span) {
        for hook in &self.hooks {
            if let Err(err) = hook.on_create_server_span(span) {
                report_hook_error("on_create_server_span", &err);
            }
        }
    }
}

/// Log a hook failure; the error stops here.
pub(crate) fn report_hook_error(lifecycle_point: &str, err: &HookError) {
    spanq_warn!(
        name: "hook.error",
        lifecycle_point = lifecycle_point,
        error = format!("{err}")
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::Tracer;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingHook {
        tags: AtomicUsize,
        counters: AtomicUsize,
    }

    impl SpanHook for CountingHook {
        fn on_set_tag(&self, _: &SpanContext, _: &str, _: &Value) -> Result<(), HookError> {
            self.tags.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn on_add_counter(&self, _: &SpanContext, _: &str, _: f64) -> Result<(), HookError> {
            self.counters.fetch_add(1, Ordering::SeqCst);
            Err("counter hook failed".into())
        }
    }

    #[test]
    fn default_methods_are_no_ops() {
        #[derive(Debug)]
        struct Empty;
        impl SpanHook for Empty {}

        let tracer = Tracer::builder().build();
        let mut span = tracer.span_builder("test").start(&tracer);
        let hook = Arc::new(Empty);
        assert!(hook.on_post_start(&span).is_ok());
        assert!(hook
            .on_set_tag(&span.context().clone(), "k", &Value::from(1i64))
            .is_ok());
        assert!(hook.on_pre_stop(&mut span).is_ok());
    }

    #[test]
    fn failing_hook_does_not_block_mutation_or_later_hooks() {
        let tracer = Tracer::builder().build();
        let mut span = tracer.span_builder("test").start(&tracer);
        let first = Arc::new(CountingHook::default());
        let second = Arc::new(CountingHook::default());
        span.add_hook(first.clone());
        span.add_hook(second.clone());

        // First hook errors on counters; both hooks still observe the call
        // and the counter itself is recorded.
        span.add_counter("retries", 1.0);
        assert_eq!(first.counters.load(Ordering::SeqCst), 1);
        assert_eq!(second.counters.load(Ordering::SeqCst), 1);

        span.set_tag("key", "value");
        assert_eq!(first.tags.load(Ordering::SeqCst), 1);
        assert_eq!(second.tags.load(Ordering::SeqCst), 1);
    }
}
