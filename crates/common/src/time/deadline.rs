//! Deadlines computed from a clock reading plus a duration

use super::clock::Clock;
use super::duration::Duration;
use super::error::TimeResult;

/// A point in time, expressed as a span since the Unix epoch
///
/// # Examples
///
/// ```
/// use tickwork_common::time::{Clock, Deadline, Duration, MockClock};
///
/// let clock = MockClock::at(100.0);
/// let deadline = Deadline::after(&clock, Duration::seconds(30)).unwrap();
/// assert_eq!(deadline.remaining(&clock), Duration::seconds(30));
///
/// clock.sleep_secs(45).unwrap();
/// assert!(deadline.is_expired(&clock));
/// assert_eq!(deadline.remaining(&clock), Duration::ZERO);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Deadline {
    at: Duration,
}

impl Deadline {
    /// `timeout` from the clock's current reading
    ///
    /// # Errors
    ///
    /// Returns [`super::TimeError::ArithmeticOverflow`] if the deadline does
    /// not fit.
    pub fn after<C: Clock + ?Sized>(clock: &C, timeout: Duration) -> TimeResult<Self> {
        clock.now().add(timeout).map(Self::at)
    }

    /// A deadline at a fixed span since the epoch
    pub const fn at(since_epoch: Duration) -> Self {
        Self { at: since_epoch }
    }

    /// The deadline as a span since the epoch
    pub const fn since_epoch(&self) -> Duration {
        self.at
    }

    /// Time left before the deadline, never negative
    pub fn remaining<C: Clock + ?Sized>(&self, clock: &C) -> Duration {
        self.at.saturating_sub(clock.now()).max(Duration::ZERO)
    }

    /// Whether the deadline has been reached
    pub fn is_expired<C: Clock + ?Sized>(&self, clock: &C) -> bool {
        self.remaining(clock).is_zero()
    }

    /// Sleep on `clock` until the deadline
    ///
    /// # Errors
    ///
    /// Propagates [`super::TimeError::InterruptedWait`] from a real clock.
    pub fn sleep_until<C: Clock + ?Sized>(&self, clock: &C) -> TimeResult<()> {
        clock.sleep(self.remaining(clock))
    }
}
