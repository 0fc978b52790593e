//! Process-wide default tracer.
//!
//! The tracer is an explicit, injectable dependency: pass it down through
//! constructors or request context wherever practical. This module is the
//! thin default slot for the outermost composition root, so deeply nested
//! code that cannot thread a handle through every call can still start
//! spans.

use crate::trace::Tracer;
use std::sync::RwLock;

static GLOBAL_TRACER: RwLock<Option<Tracer>> = RwLock::new(None);

/// Install the process-wide default tracer. Expected to be called once at
/// startup by the composition root; later calls replace the default.
pub fn set_tracer(tracer: Tracer) {
    match GLOBAL_TRACER.write() {
        Ok(mut slot) => *slot = Some(tracer),
        Err(poisoned) => *poisoned.into_inner() = Some(tracer),
    }
}

/// The process-wide default tracer, if one has been installed.
pub fn tracer() -> Option<Tracer> {
    match GLOBAL_TRACER.read() {
        Ok(slot) => slot.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::Sampler;

    #[test]
    fn default_slot_round_trips() {
        let installed = Tracer::builder().with_sampler(Sampler::AlwaysOn).build();
        set_tracer(installed);
        let fetched = tracer().expect("tracer was just installed");
        assert!(fetched.start("test").context().is_sampled());
    }
}
