//! Process-wide clock
//!
//! Free functions over a single [`MockableClock`] shared by the whole
//! process. Code that cannot have a [`Clock`] injected reads the time here,
//! and tests flip it into mocked mode with [`enable_mocking`].
//!
//! ```
//! use tickwork_common::time::global;
//!
//! global::enable_mocking(Some(0.0));
//! global::sleep_secs(60).unwrap();
//! assert_eq!(global::now_secs(), 60);
//! global::disable_mocking();
//! ```

use once_cell::sync::Lazy;

use super::clock::{Clock, HrTime, MockClock, MockableClock};
use super::duration::Duration;
use super::error::TimeResult;

static PROCESS_CLOCK: Lazy<MockableClock> = Lazy::new(MockableClock::new);

/// The process-wide clock, for injection into code that takes a [`Clock`]
pub fn clock() -> &'static MockableClock {
    &PROCESS_CLOCK
}

/// Switch the process clock to virtual time
///
/// `seed` is the starting Unix timestamp in seconds; `None` starts from the
/// current real time. Calling it while already mocked resets the timestamp.
///
/// # Panics
///
/// Panics if `seed` is not finite or lies outside the `i64` second range.
#[track_caller]
pub fn enable_mocking(seed: Option<f64>) -> MockClock {
    PROCESS_CLOCK.enable_mocking(seed)
}

/// Switch the process clock back to real time
pub fn disable_mocking() {
    PROCESS_CLOCK.disable_mocking();
}

/// Whether the process clock currently serves virtual time
pub fn is_mocked() -> bool {
    PROCESS_CLOCK.is_mocked()
}

/// Current Unix timestamp in fractional seconds
pub fn now_secs_f64() -> f64 {
    PROCESS_CLOCK.now_secs_f64()
}

/// Current Unix timestamp in whole seconds
pub fn now_secs() -> i64 {
    PROCESS_CLOCK.now_secs()
}

/// Current time as a span since the Unix epoch
pub fn now() -> Duration {
    PROCESS_CLOCK.now()
}

/// Current time as `"0.<micros> <secs>"`
pub fn microtime_string() -> String {
    PROCESS_CLOCK.microtime_string()
}

/// Block for `duration`, or advance the virtual clock by it
///
/// # Errors
///
/// Returns [`super::TimeError::InterruptedWait`] if a real sleep is woken
/// early.
pub fn sleep(duration: Duration) -> TimeResult<()> {
    PROCESS_CLOCK.sleep(duration)
}

/// Sleep whole seconds; returns `0` on completion
///
/// # Errors
///
/// See [`sleep`].
pub fn sleep_secs(secs: u64) -> TimeResult<u64> {
    PROCESS_CLOCK.sleep_secs(secs)
}

/// Sleep whole microseconds
///
/// # Errors
///
/// See [`sleep`].
pub fn sleep_micros(micros: u64) -> TimeResult<()> {
    PROCESS_CLOCK.sleep_micros(micros)
}

/// High-resolution reading split into seconds and nanoseconds
pub fn hrtime() -> HrTime {
    PROCESS_CLOCK.hrtime()
}

/// High-resolution reading in integer nanoseconds
///
/// # Errors
///
/// Returns [`super::TimeError::UnsupportedPlatform`] on hosts whose native
/// integer is narrower than 64 bits, or
/// [`super::TimeError::ArithmeticOverflow`] if a virtual reading does not
/// fit.
pub fn hrtime_nanos() -> TimeResult<i64> {
    PROCESS_CLOCK.hrtime_nanos()
}

/// High-resolution reading in fractional nanoseconds
pub fn hrtime_nanos_f64() -> f64 {
    PROCESS_CLOCK.hrtime_nanos_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::time::GlobalClockGuard;

    #[test]
    fn test_global_sleep_advances_mocked_time() {
        let _guard = GlobalClockGuard::mocked_at(0.0);
        assert!(is_mocked());
        assert_eq!(sleep_secs(60).unwrap(), 0);
        assert_eq!(now_secs(), 60);
        assert_eq!(microtime_string(), "0.000000 60");
    }

    #[test]
    fn test_global_hours_and_minutes() {
        let _guard = GlobalClockGuard::mocked_at(0.0);
        sleep(Duration::hours(2).add(Duration::minutes(10)).unwrap()).unwrap();
        assert_eq!(now(), Duration::minutes(130));
        assert_eq!(hrtime_nanos().unwrap(), 7_800_000_000_000);
    }

    #[test]
    fn test_enable_twice_resets_shared_handle() {
        let _guard = GlobalClockGuard::mocked_at(10.0);
        let first = clock().mock().unwrap();
        let second = enable_mocking(Some(500.0));
        assert_eq!(first.timestamp(), 500.0);
        second.advance(Duration::seconds(1));
        assert_eq!(now_secs(), 501);
    }

    #[test]
    fn test_disable_returns_to_real_time() {
        let guard = GlobalClockGuard::mocked_at(0.0);
        disable_mocking();
        assert!(!is_mocked());
        assert!(now_secs() > 1_600_000_000);
        drop(guard);
        // Disabling while real is a no-op
        disable_mocking();
        assert!(!is_mocked());
    }

    #[test]
    fn test_sleep_micros_mocked() {
        let _guard = GlobalClockGuard::mocked_at(1.0);
        sleep_micros(25).unwrap();
        let HrTime { secs, nanos } = hrtime();
        assert_eq!(secs, 1);
        assert_eq!(nanos, 25_000);
    }
}
