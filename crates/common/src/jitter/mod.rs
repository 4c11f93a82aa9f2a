//! Jitter for spreading out scheduled work
//!
//! Randomizing a delay or interval by a bounded factor keeps many callers
//! from firing at exactly the same instant. Two flavours are provided:
//!
//! - **Random**: a fresh value on every call ([`random`], [`random_with`],
//!   [`jitter_duration`])
//! - **Stable**: a value derived from a key, so the same key always gets
//!   the same offset ([`stable`], [`range_stable`])
//!
//! ## Usage
//!
//! ```rust
//! use tickwork_common::jitter;
//!
//! // Somewhere in [900, 1100]
//! let delay_ms = jitter::random(1000, 0.1).unwrap();
//! assert!((900..=1100).contains(&delay_ms));
//!
//! // Same key, same answer
//! let a = jitter::stable(1000, "worker-7", 0.1).unwrap();
//! let b = jitter::stable(1000, "worker-7", 0.1).unwrap();
//! assert_eq!(a, b);
//! ```

use rand::Rng;
use thiserror::Error;

use crate::error::{CommonError, ErrorClassification, ErrorSeverity};
use crate::time::Duration;

/// Result alias for jitter operations
pub type JitterResult<T> = Result<T, JitterError>;

/// Error type for invalid jitter parameters
#[derive(Debug, Error, Clone, PartialEq)]
pub enum JitterError {
    #[error("factor must be a value in the range [0,1], `{factor}` given")]
    FactorOutOfRange { factor: f64 },

    #[error("min (`{min}`) must be less than or equal max (`{max}`)")]
    InvalidRange { min: i64, max: i64 },
}

impl ErrorClassification for JitterError {
    fn is_retryable(&self) -> bool {
        false
    }

    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Error
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<std::time::Duration> {
        None
    }
}

impl From<JitterError> for CommonError {
    fn from(err: JitterError) -> Self {
        match &err {
            JitterError::FactorOutOfRange { factor } => {
                Self::validation_with_value("factor", err.to_string(), factor.to_string())
            }
            JitterError::InvalidRange { .. } => Self::validation("range", err.to_string()),
        }
    }
}

fn check_factor(factor: f64) -> JitterResult<()> {
    if (0.0..=1.0).contains(&factor) {
        Ok(())
    } else {
        Err(JitterError::FactorOutOfRange { factor })
    }
}

// Float-to-int casts saturate, so extreme values clamp to the i64 range.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn scale(value: i64, factor: f64, unit: f64) -> i64 {
    let multiplier = 1.0 - factor + unit * factor * 2.0;
    (value as f64 * multiplier).floor() as i64
}

// Maps a key onto [0, 1] using the low 32 bits of its hash.
fn unit_from_key(key: &str) -> f64 {
    let hash = blake3::hash(key.as_bytes());
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&hash.as_bytes()[..4]);
    f64::from(u32::from_le_bytes(bytes)) / f64::from(u32::MAX)
}

/// Randomize `value` by up to `value * factor` in either direction
///
/// Returns a number in `[value * (1 - factor), value * (1 + factor)]`,
/// rounded down.
///
/// # Errors
///
/// Returns [`JitterError::FactorOutOfRange`] unless `factor` is in `[0, 1]`.
pub fn random(value: i64, factor: f64) -> JitterResult<i64> {
    random_with(&mut rand::thread_rng(), value, factor)
}

/// Same as [`random`] with a caller-supplied RNG
///
/// # Examples
///
/// ```
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
/// use tickwork_common::jitter::random_with;
///
/// let a = random_with(&mut StdRng::seed_from_u64(3), 500, 0.5).unwrap();
/// let b = random_with(&mut StdRng::seed_from_u64(3), 500, 0.5).unwrap();
/// assert_eq!(a, b);
/// ```
///
/// # Errors
///
/// Returns [`JitterError::FactorOutOfRange`] unless `factor` is in `[0, 1]`.
pub fn random_with<R: Rng + ?Sized>(rng: &mut R, value: i64, factor: f64) -> JitterResult<i64> {
    check_factor(factor)?;
    Ok(scale(value, factor, rng.gen_range(0.0..=1.0)))
}

/// Deterministic jitter derived from `key`
///
/// Jitter computed this way does not average out over repeated calls, so a
/// given key keeps its place in the schedule.
///
/// # Errors
///
/// Returns [`JitterError::FactorOutOfRange`] unless `factor` is in `[0, 1]`.
pub fn stable(value: i64, key: &str, factor: f64) -> JitterResult<i64> {
    check_factor(factor)?;
    Ok(scale(value, factor, unit_from_key(key)))
}

/// Deterministic value in `[min, max]` derived from `key`
///
/// # Examples
///
/// ```
/// use tickwork_common::jitter::range_stable;
///
/// let slot = range_stable(0, 59, "nightly-report").unwrap();
/// assert!((0..=59).contains(&slot));
/// assert_eq!(slot, range_stable(0, 59, "nightly-report").unwrap());
/// ```
///
/// # Errors
///
/// Returns [`JitterError::InvalidRange`] if `min > max`.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn range_stable(min: i64, max: i64, key: &str) -> JitterResult<i64> {
    if min > max {
        return Err(JitterError::InvalidRange { min, max });
    }
    let span = max as f64 - min as f64;
    let value = (min as f64 + span * unit_from_key(key)).round() as i64;
    Ok(value.clamp(min, max))
}

/// Randomize a [`Duration`] by up to `duration * factor` in either direction
///
/// # Errors
///
/// Returns [`JitterError::FactorOutOfRange`] unless `factor` is in `[0, 1]`.
pub fn jitter_duration(duration: Duration, factor: f64) -> JitterResult<Duration> {
    random(duration.as_nanos(), factor).map(Duration::from_nanos)
}

#[cfg(test)]
mod tests {
    //! Unit tests for jitter.
    use super::*;
    use crate::testing::fixtures::seeded_rng;

    #[test]
    fn test_random_stays_in_bounds() {
        let mut rng = seeded_rng(11);
        for _ in 0..1_000 {
            let value = random_with(&mut rng, 1_000, 0.25).unwrap();
            assert!((750..=1_250).contains(&value), "out of bounds: {value}");
        }
    }

    #[test]
    fn test_zero_factor_is_identity() {
        assert_eq!(random(1_234, 0.0).unwrap(), 1_234);
        assert_eq!(stable(-77, "any", 0.0).unwrap(), -77);
    }

    /// Validates factor bounds.
    ///
    /// Assertions:
    /// - Factors outside `[0, 1]` and NaN are rejected with the factor in
    ///   the message.
    #[test]
    fn test_factor_out_of_range() {
        for factor in [-0.1, 1.5, f64::NAN] {
            let err = random(10, factor).unwrap_err();
            assert!(matches!(err, JitterError::FactorOutOfRange { .. }));
        }
        assert_eq!(
            stable(10, "k", 2.0).unwrap_err().to_string(),
            "factor must be a value in the range [0,1], `2` given"
        );
    }

    #[test]
    fn test_stable_is_deterministic_per_key() {
        let first = stable(60_000, "queue-a", 0.5).unwrap();
        assert_eq!(first, stable(60_000, "queue-a", 0.5).unwrap());
        assert!((30_000..=90_000).contains(&first));

        // Distinct keys spread out
        let distinct: std::collections::HashSet<i64> =
            (0..32).map(|i| stable(60_000, &format!("queue-{i}"), 0.5).unwrap()).collect();
        assert!(distinct.len() > 16);
    }

    #[test]
    fn test_range_stable() {
        assert_eq!(range_stable(5, 5, "k").unwrap(), 5);
        assert_eq!(range_stable(i64::MIN, i64::MIN, "k").unwrap(), i64::MIN);
        assert!(range_stable(i64::MIN, i64::MAX, "k").is_ok());
        assert_eq!(
            range_stable(3, 1, "k"),
            Err(JitterError::InvalidRange { min: 3, max: 1 })
        );
    }

    #[test]
    fn test_jitter_duration_bounds() {
        for _ in 0..100 {
            let jittered = jitter_duration(Duration::seconds(10), 0.1).unwrap();
            assert!(jittered >= Duration::seconds(9) && jittered <= Duration::seconds(11));
        }
    }

    #[test]
    fn test_into_common_error() {
        let err: CommonError = JitterError::FactorOutOfRange { factor: 3.0 }.into();
        assert!(matches!(err, CommonError::Validation { ref field, .. } if field == "factor"));
    }

    #[test]
    fn test_error_classification() {
        let errors =
            [JitterError::FactorOutOfRange { factor: -1.0 }, JitterError::InvalidRange { min: 2, max: 1 }];
        for err in errors {
            assert!(!err.is_retryable());
            assert!(!err.is_critical());
            assert_eq!(err.severity(), ErrorSeverity::Error);
            assert_eq!(err.retry_after(), None);
        }
    }
}
