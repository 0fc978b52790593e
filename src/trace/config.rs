//! Tracer configuration.
use crate::model::Endpoint;
use crate::trace::sampler::{Sampler, ShouldSample};
use std::time::Duration;

/// Default cap on how long a single publish may occupy the request path.
pub const DEFAULT_RECORD_TIMEOUT: Duration = Duration::from_millis(300);

/// Tunable parts of a [`Tracer`].
///
/// [`Tracer`]: crate::trace::Tracer
#[derive(Debug)]
pub struct Config {
    /// The sampler consulted once per root span.
    pub sampler: Box<dyn ShouldSample>,
    /// Maximum time a single `record` may spend in the transport. The
    /// effective send deadline is the minimum of this and the caller's own
    /// deadline; an expired caller deadline falls back to this budget so
    /// telemetry still gets a chance to flush.
    pub record_timeout: Duration,
    /// The local service endpoint stamped on published annotations.
    pub endpoint: Endpoint,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sampler: Box::new(Sampler::AlwaysOff),
            record_timeout: DEFAULT_RECORD_TIMEOUT,
            endpoint: Endpoint::default(),
        }
    }
}
