//! Random id generation for traces and spans.
use crate::trace::{SpanId, TraceId};
use rand::{rngs, Rng, SeedableRng};
use std::cell::RefCell;
use std::fmt;

/// Interface for generating trace and span ids.
pub trait IdGenerator: Send + Sync + fmt::Debug {
    /// Generate a new `TraceId`.
    fn new_trace_id(&self) -> TraceId;

    /// Generate a new `SpanId`.
    fn new_span_id(&self) -> SpanId;
}

/// Default [`IdGenerator`] implementation.
///
/// Draws fresh, non-zero random 64-bit values from a per-thread generator,
/// giving overwhelming uniqueness for a process's trace stream.
#[derive(Clone, Debug, Default)]
pub struct RandomIdGenerator {
    _private: (),
}

impl IdGenerator for RandomIdGenerator {
    fn new_trace_id(&self) -> TraceId {
        TraceId::from_u64(CURRENT_RNG.with(|rng| non_zero_u64(&mut rng.borrow_mut())))
    }

    fn new_span_id(&self) -> SpanId {
        SpanId::from_u64(CURRENT_RNG.with(|rng| non_zero_u64(&mut rng.borrow_mut())))
    }
}

/// Zero is reserved as the invalid id, so redraw until non-zero.
fn non_zero_u64(rng: &mut rngs::SmallRng) -> u64 {
    loop {
        let id = rng.gen::<u64>();
        if id != 0 {
            return id;
        }
    }
}

thread_local! {
    /// Store random number generator for each thread
    static CURRENT_RNG: RefCell<rngs::SmallRng> = RefCell::new(rngs::SmallRng::from_entropy());
}
