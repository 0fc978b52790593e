//! Common value types shared by span annotations and the wire model.
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// The value half of a span tag.
///
/// Tags are last-write-wins string keyed annotations; the value side is one
/// of a small set of primitive types so it can be serialized losslessly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A boolean value.
    Bool(bool),
    /// A signed 64-bit integer value.
    I64(i64),
    /// A 64-bit float value.
    F64(f64),
    /// A string value.
    String(String),
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::I64(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::F64(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Cow<'_, str>> for Value {
    fn from(s: Cow<'_, str>) -> Self {
        Value::String(s.into_owned())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => b.fmt(f),
            Value::I64(i) => i.fmt(f),
            Value::F64(v) => v.fmt(f),
            Value::String(s) => s.fmt(f),
        }
    }
}
