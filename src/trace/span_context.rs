//! Span identity types.
//!
//! A [`SpanContext`] is the immutable, copyable identity of a span: the
//! trace and span ids, the sampling decision, and the trace flags. It is
//! everything a child span or an outbound wire call needs to know about its
//! parent, with no access to the parent's mutable state.

use std::fmt;
use std::num::ParseIntError;

/// A 64-bit trace identifier, stable across every span in one call tree.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TraceId(u64);

impl TraceId {
    /// An invalid, all-zero trace id.
    pub const INVALID: TraceId = TraceId(0);

    /// Construct from a raw `u64`.
    pub const fn from_u64(id: u64) -> Self {
        TraceId(id)
    }

    /// The raw `u64` value.
    pub const fn to_u64(self) -> u64 {
        self.0
    }

    /// Parse from the decimal string form used in propagation headers.
    pub fn from_decimal_str(s: &str) -> Result<Self, ParseIntError> {
        s.parse().map(TraceId)
    }
}

impl fmt::Debug for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TraceId({})", self.0)
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A 64-bit span identifier, unique per span within a process's stream.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpanId(u64);

impl SpanId {
    /// An invalid, all-zero span id.
    pub const INVALID: SpanId = SpanId(0);

    /// Construct from a raw `u64`.
    pub const fn from_u64(id: u64) -> Self {
        SpanId(id)
    }

    /// The raw `u64` value.
    pub const fn to_u64(self) -> u64 {
        self.0
    }

    /// Parse from the decimal string form used in propagation headers.
    pub fn from_decimal_str(s: &str) -> Result<Self, ParseIntError> {
        s.parse().map(SpanId)
    }
}

impl fmt::Debug for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpanId({})", self.0)
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Per-trace flag bits, carried verbatim from parent to child and across
/// wire calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TraceFlags(u64);

impl TraceFlags {
    /// No flags set.
    pub const NONE: TraceFlags = TraceFlags(0);
    /// Debug flag: forces the trace to be published regardless of the
    /// sampling decision.
    pub const DEBUG: TraceFlags = TraceFlags(1);

    /// Construct from raw bits.
    pub const fn new(bits: u64) -> Self {
        TraceFlags(bits)
    }

    /// The raw bits.
    pub const fn to_u64(self) -> u64 {
        self.0
    }

    /// Whether the debug bit is set.
    pub const fn is_debug(self) -> bool {
        self.0 & TraceFlags::DEBUG.0 != 0
    }

    /// A copy of these flags with the debug bit set or cleared.
    pub const fn with_debug(self, debug: bool) -> Self {
        if debug {
            TraceFlags(self.0 | TraceFlags::DEBUG.0)
        } else {
            TraceFlags(self.0 & !TraceFlags::DEBUG.0)
        }
    }
}

impl fmt::Display for TraceFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The immutable identity of a span.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpanContext {
    trace_id: TraceId,
    span_id: SpanId,
    sampled: bool,
    flags: TraceFlags,
}

impl SpanContext {
    /// Construct a span context from its parts.
    pub const fn new(trace_id: TraceId, span_id: SpanId, sampled: bool, flags: TraceFlags) -> Self {
        SpanContext {
            trace_id,
            span_id,
            sampled,
            flags,
        }
    }

    /// The trace id shared by every span in the tree.
    pub const fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    /// This span's own id.
    pub const fn span_id(&self) -> SpanId {
        self.span_id
    }

    /// Whether the root sampling decision retained this trace.
    pub const fn is_sampled(&self) -> bool {
        self.sampled
    }

    /// The trace flag bits.
    pub const fn trace_flags(&self) -> TraceFlags {
        self.flags
    }

    /// Whether the debug flag forces publishing for this trace.
    pub const fn is_debug(&self) -> bool {
        self.flags.is_debug()
    }

    /// Whether both ids are non-zero.
    pub const fn is_valid(&self) -> bool {
        self.trace_id.to_u64() != 0 && self.span_id.to_u64() != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_round_trip() {
        let flags = TraceFlags::NONE.with_debug(true);
        assert!(flags.is_debug());
        assert!(!flags.with_debug(false).is_debug());
        assert_eq!(TraceFlags::new(flags.to_u64()), flags);
    }

    #[test]
    fn validity_requires_both_ids() {
        let valid = SpanContext::new(
            TraceId::from_u64(1),
            SpanId::from_u64(2),
            true,
            TraceFlags::NONE,
        );
        assert!(valid.is_valid());

        let no_trace =
            SpanContext::new(TraceId::INVALID, SpanId::from_u64(2), true, TraceFlags::NONE);
        assert!(!no_trace.is_valid());

        let no_span =
            SpanContext::new(TraceId::from_u64(1), SpanId::INVALID, true, TraceFlags::NONE);
        assert!(!no_span.is_valid());
    }

    #[test]
    fn decimal_parse() {
        assert_eq!(
            TraceId::from_decimal_str("42").unwrap(),
            TraceId::from_u64(42)
        );
        assert!(SpanId::from_decimal_str("not a number").is_err());
    }
}
