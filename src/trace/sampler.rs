//! Sampling decisions for root spans.
//!
//! Sampling is the primary cost-control mechanism: a trace that is not
//! sampled (and not debug-flagged) costs one random draw at root creation
//! and nothing at publish time. The decision is made exactly once, at the
//! root, and inherited verbatim by every child so a trace is sampled as a
//! whole.

use rand::{rngs, Rng, SeedableRng};
use std::cell::RefCell;

/// The [`ShouldSample`] interface lets implementations decide whether a new
/// root span's trace is retained for publishing.
///
/// Only root spans consult the sampler; children copy their parent's
/// decision without re-sampling.
pub trait ShouldSample: Send + Sync + std::fmt::Debug {
    /// Returns `true` if the trace rooted at a span with this name should
    /// be published.
    fn should_sample(&self, name: &str) -> bool;
}

/// Built-in sampling options.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum Sampler {
    /// Always sample the trace.
    AlwaysOn,
    /// Never sample the trace (debug-flagged spans are still published).
    AlwaysOff,
    /// Sample the given fraction of traces by drawing one uniform value in
    /// `[0, 1)` per root and comparing it to the rate. Rates `<= 0` never
    /// sample, rates `>= 1` always sample.
    RateBased(f64),
}

impl ShouldSample for Sampler {
    fn should_sample(&self, _name: &str) -> bool {
        match self {
            Sampler::AlwaysOn => true,
            Sampler::AlwaysOff => false,
            Sampler::RateBased(rate) => {
                if *rate <= 0.0 {
                    false
                } else if *rate >= 1.0 {
                    true
                } else {
                    CURRENT_RNG.with(|rng| rng.borrow_mut().gen::<f64>()) < *rate
                }
            }
        }
    }
}

thread_local! {
    /// Store random number generator for each thread
    static CURRENT_RNG: RefCell<rngs::SmallRng> = RefCell::new(rngs::SmallRng::from_entropy());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_at_or_below_zero_never_samples() {
        for rate in [0.0, -0.5, -1.0] {
            let sampler = Sampler::RateBased(rate);
            for _ in 0..1_000 {
                assert!(!sampler.should_sample("test"));
            }
        }
    }

    #[test]
    fn rate_at_or_above_one_always_samples() {
        for rate in [1.0, 1.5, 2.0] {
            let sampler = Sampler::RateBased(rate);
            for _ in 0..1_000 {
                assert!(sampler.should_sample("test"));
            }
        }
    }

    #[test]
    fn fractional_rate_samples_roughly_the_configured_share() {
        let total = 10_000;
        for rate in [0.25, 0.5, 0.75] {
            let sampler = Sampler::RateBased(rate);
            let sampled = (0..total)
                .filter(|_| sampler.should_sample("test"))
                .count();
            let got = sampled as f64 / total as f64;
            // See https://en.wikipedia.org/wiki/Binomial_proportion_confidence_interval
            let z = 4.75342; // This should succeed 99.9999% of the time
            let tolerance = z * (got * (1.0 - got) / total as f64).sqrt();
            assert!(
                (got - rate).abs() <= tolerance,
                "rate {rate} got {got} (tolerance {tolerance})"
            );
        }
    }

    #[test]
    fn fixed_samplers() {
        assert!(Sampler::AlwaysOn.should_sample("test"));
        assert!(!Sampler::AlwaysOff.should_sample("test"));
    }
}
