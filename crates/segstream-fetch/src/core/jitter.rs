use std::time::Duration;

use rand::Rng;

/// Uniform sleep in `[0, interval_ms)` milliseconds.
///
/// A zero interval means no sleep at all rather than an empty range.
pub fn jitter_delay<R: Rng + ?Sized>(interval_ms: u64, rng: &mut R) -> Duration {
    if interval_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rng.gen_range(0..interval_ms))
}
