//! Trace context propagation across wire calls.
//!
//! RPC and HTTP interceptors at call boundaries carry trace identity in
//! string-keyed headers: [`inject`] writes an outbound span's context into a
//! header map, [`extract`] reads an inbound one back out. A present but
//! malformed field is treated as absent with a log line, never a rejected
//! request; a bad header must not break real request handling.

use crate::spanq_debug;
use crate::trace::{SpanContext, SpanId, TraceFlags, TraceId};
use std::collections::HashMap;

/// Header carrying the trace id, decimal-encoded.
pub const TRACE_ID_HEADER: &str = "x-trace-id";
/// Header carrying the sending span's id, decimal-encoded.
pub const SPAN_ID_HEADER: &str = "x-span-id";
/// Header carrying the sampling decision, `1` or `0`.
pub const SAMPLED_HEADER: &str = "x-sampled";
/// Header carrying the trace flag bits, decimal-encoded.
pub const FLAGS_HEADER: &str = "x-flags";

/// Sink for outbound propagation headers.
pub trait Injector {
    /// Set a header value, replacing any previous one.
    fn set(&mut self, key: &str, value: String);
}

/// Source of inbound propagation headers.
pub trait Extractor {
    /// Get the value of a header, if present.
    fn get(&self, key: &str) -> Option<&str>;
}

impl Injector for HashMap<String, String> {
    fn set(&mut self, key: &str, value: String) {
        self.insert(key.to_lowercase(), value);
    }
}

impl Extractor for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<&str> {
        self.get(&key.to_lowercase()).map(|v| v.as_str())
    }
}

/// Write a span context into outbound headers.
pub fn inject(context: &SpanContext, injector: &mut dyn Injector) {
    if !context.is_valid() {
        return;
    }
    injector.set(TRACE_ID_HEADER, context.trace_id().to_string());
    injector.set(SPAN_ID_HEADER, context.span_id().to_string());
    injector.set(
        SAMPLED_HEADER,
        if context.is_sampled() { "1" } else { "0" }.to_string(),
    );
    injector.set(FLAGS_HEADER, context.trace_flags().to_string());
}

/// Read a span context out of inbound headers.
///
/// Returns `None` when no usable trace identity is present. Malformed
/// fields are ignored per-field: a bad sampled or flags value degrades to
/// the default, a bad id means no context at all.
pub fn extract(extractor: &dyn Extractor) -> Option<SpanContext> {
    let trace_id = parse_field(extractor, TRACE_ID_HEADER, TraceId::from_decimal_str)?;
    let span_id = parse_field(extractor, SPAN_ID_HEADER, SpanId::from_decimal_str)?;

    let sampled = match extractor.get(SAMPLED_HEADER) {
        Some("1") | Some("true") => true,
        Some("0") | Some("false") | None => false,
        Some(other) => {
            spanq_debug!(
                name: "propagation.malformed_header",
                header = SAMPLED_HEADER,
                value = other.to_string()
            );
            false
        }
    };

    let flags = match extractor.get(FLAGS_HEADER) {
        Some(raw) => match raw.parse::<u64>() {
            Ok(bits) => TraceFlags::new(bits),
            Err(_) => {
                spanq_debug!(
                    name: "propagation.malformed_header",
                    header = FLAGS_HEADER,
                    value = raw.to_string()
                );
                TraceFlags::NONE
            }
        },
        None => TraceFlags::NONE,
    };

    let context = SpanContext::new(trace_id, span_id, sampled, flags);
    context.is_valid().then_some(context)
}

fn parse_field<T, E>(
    extractor: &dyn Extractor,
    header: &str,
    parse: impl Fn(&str) -> Result<T, E>,
) -> Option<T> {
    let raw = extractor.get(header)?;
    match parse(raw) {
        Ok(value) => Some(value),
        Err(_) => {
            spanq_debug!(
                name: "propagation.malformed_header",
                header = header,
                value = raw.to_string()
            );
            None
        }
    }
}
