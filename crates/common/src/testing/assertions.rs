//! Custom assertions for testing
//!
//! Provides assertion macros and functions for clock and duration tests.

// Allow missing panics docs for test utilities - these assertions are designed to panic
// on failure which is their core purpose in test contexts
#![allow(clippy::missing_panics_doc)]

use crate::time::Duration;

/// Assert that an error contains a specific substring
///
/// # Examples
///
/// ```
/// use tickwork_common::time::Duration;
///
/// let result = Duration::MAX.add(Duration::seconds(1));
/// tickwork_common::assert_error_contains!(result, "overflow");
/// ```
#[macro_export]
macro_rules! assert_error_contains {
    ($result:expr, $substring:expr) => {
        match &$result {
            Ok(_) => panic!("Expected error but got Ok"),
            Err(e) => {
                let error_msg = format!("{}", e);
                assert!(
                    error_msg.contains($substring),
                    "Error message '{}' does not contain '{}'",
                    error_msg,
                    $substring
                );
            }
        }
    };
}

/// Assert that two values are approximately equal (for floats)
///
/// # Examples
///
/// ```
/// use tickwork_common::testing::assertions::assert_approx_eq;
///
/// assert_approx_eq(1.000_001, 1.0, 1e-5);
/// ```
pub fn assert_approx_eq(actual: f64, expected: f64, epsilon: f64) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= epsilon,
        "Values not approximately equal: {} vs {} (diff: {})",
        actual,
        expected,
        diff
    );
}

/// Assert that a duration is within `tolerance` of `expected`
///
/// # Examples
///
/// ```
/// use tickwork_common::testing::assertions::assert_duration_in_range;
/// use tickwork_common::time::Duration;
///
/// let actual = Duration::milliseconds(105);
/// assert_duration_in_range(actual, Duration::milliseconds(100), Duration::milliseconds(10));
/// ```
pub fn assert_duration_in_range(actual: Duration, expected: Duration, tolerance: Duration) {
    let min = expected.saturating_sub(tolerance);
    let max = expected.saturating_add(tolerance);

    assert!(
        actual >= min && actual <= max,
        "Duration {} not in range [{}, {}]",
        actual,
        min,
        max
    );
}

/// Assert that a microtime string has the `"0.<6 digits> <secs>"` layout
///
/// # Examples
///
/// ```
/// use tickwork_common::testing::assertions::assert_microtime_layout;
///
/// assert_microtime_layout("0.250000 60");
/// ```
pub fn assert_microtime_layout(microtime: &str) {
    let (fraction, secs) = microtime
        .split_once(' ')
        .unwrap_or_else(|| panic!("Microtime '{}' has no space separator", microtime));

    let digits = fraction
        .strip_prefix("0.")
        .unwrap_or_else(|| panic!("Microtime fraction '{}' does not start with '0.'", fraction));
    assert!(
        digits.len() == 6 && digits.bytes().all(|b| b.is_ascii_digit()),
        "Microtime fraction '{}' is not six digits",
        digits
    );
    assert!(secs.parse::<i64>().is_ok(), "Microtime seconds '{}' is not an integer", secs);
}
