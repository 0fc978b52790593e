use crate::model::annotation::{Annotation, BinaryAnnotation};
use serde::{Deserialize, Serialize};

/// The per-span wire payload, sent as one complete transport message.
///
/// Ids are raw 64-bit values, timestamps are epoch microseconds and the
/// duration is in microseconds. `parentId` is omitted entirely for roots.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    /// Trace id shared by every span in the call tree.
    pub trace_id: u64,
    /// Operation name.
    pub name: String,
    /// This span's id.
    pub id: u64,
    /// Start time in epoch microseconds.
    pub timestamp: i64,
    /// Elapsed time in microseconds.
    pub duration: i64,
    /// Creator's span id; absent for roots.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent_id: Option<u64>,
    /// Timestamped lifecycle events.
    pub annotations: Vec<Annotation>,
    /// Tags and counters, flattened into one list.
    pub binary_annotations: Vec<BinaryAnnotation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Value;
    use crate::model::endpoint::Endpoint;

    fn sample_span() -> Span {
        let endpoint = Endpoint::new("web");
        Span {
            trace_id: 0x4e44_1824_ec2b_6a44,
            name: "get.user".into(),
            id: 0xffdc_9bb9_a645_3df3,
            timestamp: 1_502_787_600_000_000,
            duration: 150_000,
            parent_id: Some(0xefdc_9cd9_a184_9df3),
            annotations: vec![Annotation {
                endpoint: endpoint.clone(),
                timestamp: 1_502_787_600_000_000,
                value: "sr".into(),
            }],
            binary_annotations: vec![
                BinaryAnnotation {
                    endpoint: endpoint.clone(),
                    key: "http.method".into(),
                    value: Value::from("GET"),
                },
                BinaryAnnotation {
                    endpoint,
                    key: "counter.retries".into(),
                    value: Value::from(2.0),
                },
            ],
        }
    }

    #[test]
    fn round_trip_preserves_ids_timestamps_and_annotations() {
        let span = sample_span();
        let bytes = serde_json::to_vec(&span).unwrap();
        let decoded: Span = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, span);
    }

    #[test]
    fn parent_id_omitted_for_roots() {
        let mut span = sample_span();
        span.parent_id = None;
        let text = serde_json::to_string(&span).unwrap();
        assert!(!text.contains("parentId"));

        let decoded: Span = serde_json::from_str(&text).unwrap();
        assert_eq!(decoded.parent_id, None);
    }

    #[test]
    fn field_names_are_camel_case() {
        let text = serde_json::to_string(&sample_span()).unwrap();
        for field in [
            "\"traceId\"",
            "\"name\"",
            "\"id\"",
            "\"timestamp\"",
            "\"duration\"",
            "\"parentId\"",
            "\"annotations\"",
            "\"binaryAnnotations\"",
        ] {
            assert!(text.contains(field), "missing {field} in {text}");
        }
    }
}
