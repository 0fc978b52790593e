//! Wire encoding of finished spans.
//!
//! Each published span becomes one JSON payload carrying identity, timing,
//! lifecycle annotations and the tag/counter set, stamped with the local
//! service endpoint. The collector on the other side of the queue consumes
//! this format directly.

mod annotation;
mod endpoint;
mod span;

pub use annotation::{Annotation, BinaryAnnotation};
pub use endpoint::Endpoint;
pub use span::Span;

use crate::common::Value;
use crate::trace::span::FinishedSpan;
use crate::trace::SpanType;
use std::time::{SystemTime, UNIX_EPOCH};

/// Counter keys get this prefix so they cannot collide with tag keys in the
/// flattened annotation list.
pub const COUNTER_KEY_PREFIX: &str = "counter.";

/// Build the wire payload for a finished span.
///
/// Annotation lists are sorted by key so the encoding is deterministic
/// regardless of mutation order.
pub(crate) fn wire_span(span: &FinishedSpan, local_endpoint: &Endpoint) -> Span {
    let timestamp = epoch_micros(span.data.start);
    let stop = epoch_micros(span.stop);

    let mut binary_annotations: Vec<BinaryAnnotation> = Vec::with_capacity(
        span.data.tags.len() + span.data.counters.len(),
    );
    let mut tags: Vec<_> = span.data.tags.iter().collect();
    tags.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in tags {
        binary_annotations.push(BinaryAnnotation {
            endpoint: local_endpoint.clone(),
            key: key.clone(),
            value: value.clone(),
        });
    }
    let mut counters: Vec<_> = span.data.counters.iter().collect();
    counters.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in counters {
        binary_annotations.push(BinaryAnnotation {
            endpoint: local_endpoint.clone(),
            key: format!("{COUNTER_KEY_PREFIX}{key}"),
            value: Value::F64(*value),
        });
    }

    // Server spans mark receive/send, client spans send/receive; local
    // spans carry no timing annotations.
    let annotations = match span.data.span_type {
        SpanType::Server => timing_annotations(local_endpoint, timestamp, "sr", stop, "ss"),
        SpanType::Client => timing_annotations(local_endpoint, timestamp, "cs", stop, "cr"),
        SpanType::Local => Vec::new(),
    };

    Span {
        trace_id: span.context.trace_id().to_u64(),
        name: span.data.name.clone().into_owned(),
        id: span.context.span_id().to_u64(),
        timestamp,
        duration: stop.saturating_sub(timestamp),
        parent_id: span.data.parent_id.map(|id| id.to_u64()),
        annotations,
        binary_annotations,
    }
}

fn timing_annotations(
    endpoint: &Endpoint,
    start: i64,
    start_key: &str,
    stop: i64,
    stop_key: &str,
) -> Vec<Annotation> {
    vec![
        Annotation {
            endpoint: endpoint.clone(),
            timestamp: start,
            value: start_key.into(),
        },
        Annotation {
            endpoint: endpoint.clone(),
            timestamp: stop,
            value: stop_key.into(),
        },
    ]
}

fn epoch_micros(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::span::SpanData;
    use crate::trace::{SpanContext, SpanId, TraceFlags, TraceId};
    use std::collections::HashMap;
    use std::time::Duration;

    fn finished(span_type: SpanType) -> FinishedSpan {
        let start = UNIX_EPOCH + Duration::from_micros(1_700_000_000_000_000);
        let mut tags = HashMap::new();
        tags.insert("http.method".to_string(), Value::from("GET"));
        tags.insert("error".to_string(), Value::from(false));
        let mut counters = HashMap::new();
        counters.insert("retries".to_string(), 2.0);
        FinishedSpan {
            context: SpanContext::new(
                TraceId::from_u64(7),
                SpanId::from_u64(8),
                true,
                TraceFlags::NONE,
            ),
            data: SpanData {
                parent_id: Some(SpanId::from_u64(3)),
                span_type,
                name: "get.user".into(),
                start,
                tags,
                counters,
            },
            stop: start + Duration::from_micros(250),
        }
    }

    #[test]
    fn encodes_identity_and_timing() {
        let wire = wire_span(&finished(SpanType::Local), &Endpoint::new("web"));
        assert_eq!(wire.trace_id, 7);
        assert_eq!(wire.id, 8);
        assert_eq!(wire.parent_id, Some(3));
        assert_eq!(wire.timestamp, 1_700_000_000_000_000);
        assert_eq!(wire.duration, 250);
        assert_eq!(wire.name, "get.user");
    }

    #[test]
    fn tags_then_counters_sorted_by_key() {
        let wire = wire_span(&finished(SpanType::Local), &Endpoint::new("web"));
        let keys: Vec<_> = wire
            .binary_annotations
            .iter()
            .map(|a| a.key.as_str())
            .collect();
        assert_eq!(keys, vec!["error", "http.method", "counter.retries"]);
        assert_eq!(
            wire.binary_annotations[2].value,
            Value::F64(2.0),
            "counters carry numeric values"
        );
    }

    #[test]
    fn timing_annotations_match_span_type() {
        let server = wire_span(&finished(SpanType::Server), &Endpoint::new("web"));
        let values: Vec<_> = server.annotations.iter().map(|a| a.value.as_str()).collect();
        assert_eq!(values, vec!["sr", "ss"]);

        let client = wire_span(&finished(SpanType::Client), &Endpoint::new("web"));
        let values: Vec<_> = client.annotations.iter().map(|a| a.value.as_str()).collect();
        assert_eq!(values, vec!["cs", "cr"]);

        let local = wire_span(&finished(SpanType::Local), &Endpoint::new("web"));
        assert!(local.annotations.is_empty());
    }

    #[test]
    fn encode_decode_round_trip() {
        let wire = wire_span(&finished(SpanType::Server), &Endpoint::new("web"));
        let bytes = serde_json::to_vec(&wire).unwrap();
        let decoded: Span = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, wire);
    }
}
