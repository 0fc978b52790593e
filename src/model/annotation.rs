use crate::common::Value;
use crate::model::endpoint::Endpoint;
use serde::{Deserialize, Serialize};

/// A timestamped lifecycle event on the wire: the value is the event key
/// (`sr`/`ss` for server receive/send, `cs`/`cr` for client send/receive).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    /// Endpoint that produced the event.
    pub endpoint: Endpoint,
    /// Event time in epoch microseconds.
    pub timestamp: i64,
    /// Event key.
    pub value: String,
}

/// A key/value annotation on the wire. Tags map through directly; counters
/// are disambiguated with a `counter.` key prefix and a numeric value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryAnnotation {
    /// Endpoint that produced the annotation.
    pub endpoint: Endpoint,
    /// Annotation key.
    pub key: String,
    /// Annotation value.
    pub value: Value,
}
