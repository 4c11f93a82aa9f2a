//! Test fixture generators
//!
//! Provides functions to generate random timestamps and durations.
//!
//! For deterministic tests, use the `*_seeded` variants with a fixed seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::time::Duration;

// 2001-09-09 .. 2033-05-18, a window that keeps f64 timestamps microsecond-exact.
const TIMESTAMP_RANGE: std::ops::Range<f64> = 1_000_000_000.0..2_000_000_000.0;

/// A deterministic RNG for reproducible tests
///
/// # Examples
///
/// ```
/// use rand::Rng;
/// use tickwork_common::testing::fixtures::seeded_rng;
///
/// let a: u64 = seeded_rng(7).gen();
/// let b: u64 = seeded_rng(7).gen();
/// assert_eq!(a, b);
/// ```
#[must_use]
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Generate a random Unix timestamp in fractional seconds
///
/// **Note:** This uses a non-deterministic RNG. For deterministic tests,
/// use [`random_timestamp_seeded`] instead.
#[must_use]
pub fn random_timestamp() -> f64 {
    rand::thread_rng().gen_range(TIMESTAMP_RANGE)
}

/// Generate a random Unix timestamp with a seed (deterministic)
///
/// # Examples
///
/// ```
/// use tickwork_common::testing::fixtures::random_timestamp_seeded;
///
/// let t1 = random_timestamp_seeded(42);
/// let t2 = random_timestamp_seeded(42);
/// assert_eq!(t1, t2);
/// assert!(t1 >= 1_000_000_000.0);
/// ```
#[must_use]
pub fn random_timestamp_seeded(seed: u64) -> f64 {
    seeded_rng(seed).gen_range(TIMESTAMP_RANGE)
}

/// Generate a random non-negative duration no longer than `max`
///
/// Returns [`Duration::ZERO`] when `max` is not positive.
#[must_use]
pub fn random_duration_seeded(max: Duration, seed: u64) -> Duration {
    if !max.greater_than(Duration::ZERO) {
        return Duration::ZERO;
    }
    Duration::from_nanos(seeded_rng(seed).gen_range(0..=max.as_nanos()))
}
