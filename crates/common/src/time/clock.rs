//! Mockable time sources
//!
//! Every time-dependent component reads the time through the [`Clock`]
//! trait, so production code can be wired with a [`SystemClock`] while tests
//! substitute a [`MockClock`] whose virtual timestamp only moves when told to.
//!
//! [`MockableClock`] combines both behind a two-state machine (`Real` or
//! `Mocked`) for code that needs to be switched at runtime; the process-wide
//! instance lives in [`crate::time::global`].
//!
//! # Examples
//!
//! ```
//! use tickwork_common::time::{Clock, Duration, MockClock};
//!
//! let clock = MockClock::at(0.0);
//! clock.sleep_secs(60).unwrap();
//! assert_eq!(clock.now_secs(), 60);
//!
//! clock.sleep(Duration::milliseconds(250)).unwrap();
//! assert_eq!(clock.microtime_string(), "0.250000 60");
//! ```

use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;
use parking_lot::{Condvar, Mutex, RwLock};
use tracing::{debug, trace, warn};

use super::duration::{Duration, TimeUnit};
use super::error::{TimeError, TimeResult};
use super::platform::require_native_i64_nanos;

// 2^63: virtual timestamps must stay strictly below this in magnitude so
// they can always be truncated to an i64 second count.
pub(crate) const I64_BOUND_F64: f64 = 9_223_372_036_854_775_808.0;

// Mean Gregorian year.
const SECS_PER_YEAR: i64 = 31_556_952;

/// Last calendar year a virtual timestamp can reach
pub const MAX_MOCKED_YEAR: i64 = 1970 + i64::MAX / SECS_PER_YEAR;

static MONOTONIC_ANCHOR: Lazy<Instant> = Lazy::new(Instant::now);

/// A high-resolution reading split into whole seconds and nanoseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HrTime {
    /// Whole seconds
    pub secs: i64,
    /// Remaining nanoseconds, always below one second
    pub nanos: u32,
}

impl HrTime {
    /// The reading as a single [`Duration`]
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::ArithmeticOverflow`] past `i64` nanoseconds.
    pub fn as_duration(self) -> TimeResult<Duration> {
        Duration::of(self.secs, TimeUnit::Second)?
            .add(Duration::nanoseconds(i64::from(self.nanos)))
    }
}

/// Source of wall-clock and monotonic time
///
/// Implementations must be cheap to call and safe to share across threads.
pub trait Clock: Send + Sync {
    /// Seconds since 1970-01-01T00:00:00Z with sub-second precision
    fn now_secs_f64(&self) -> f64;

    /// Block (or, for virtual clocks, advance) for `duration`
    ///
    /// Zero and negative durations return immediately.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::InterruptedWait`] if a real wait is woken early.
    fn sleep(&self, duration: Duration) -> TimeResult<()>;

    /// Monotonic reading split into seconds and nanoseconds
    fn hrtime(&self) -> HrTime;

    /// Monotonic reading as an integer nanosecond count
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::UnsupportedPlatform`] on hosts without a 64-bit
    /// native integer.
    fn hrtime_nanos(&self) -> TimeResult<i64>;

    /// Monotonic reading as a float nanosecond count
    ///
    /// Available on every host; precision drops for very large values.
    fn hrtime_nanos_f64(&self) -> f64;

    /// Whole seconds since the epoch, truncated toward zero
    #[allow(clippy::cast_possible_truncation)]
    fn now_secs(&self) -> i64 {
        self.now_secs_f64().trunc() as i64
    }

    /// Time since the epoch as a [`Duration`], saturating past year 2262
    fn now(&self) -> Duration {
        saturating_duration_from_secs(self.now_secs_f64())
    }

    /// Current time as `"0.<micros> <secs>"`, e.g. `"0.250000 1668868618"`
    ///
    /// The fraction always has six digits; date parsing relies on this
    /// layout byte for byte. The seconds token is floored so the fraction
    /// stays non-negative, which means it differs from [`Clock::now_secs`]
    /// before 1970: -0.25 renders as `"0.750000 -1"` while `now_secs`
    /// reads 0.
    fn microtime_string(&self) -> String {
        let (secs, micros) = split_microtime(self.now_secs_f64());
        format_microtime(secs, micros)
    }

    /// Sleep for whole seconds, returning the seconds left unslept (0)
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::InterruptedWait`] if a real wait is woken early,
    /// or [`TimeError::ArithmeticOverflow`] if a real wait does not fit a
    /// [`Duration`]. Mocked clocks advance by any amount.
    fn sleep_secs(&self, secs: u64) -> TimeResult<u64> {
        let secs = i64::try_from(secs).map_err(|_| TimeError::overflow("construction"))?;
        self.sleep(Duration::of(secs, TimeUnit::Second)?)?;
        Ok(0)
    }

    /// Sleep for whole microseconds
    ///
    /// # Errors
    ///
    /// Same as [`Clock::sleep_secs`].
    fn sleep_micros(&self, micros: u64) -> TimeResult<()> {
        let micros = i64::try_from(micros).map_err(|_| TimeError::overflow("construction"))?;
        self.sleep(Duration::of(micros, TimeUnit::Microsecond)?)
    }
}

/// Render a microtime string from its parts
pub fn format_microtime(secs: i64, micros: u32) -> String {
    format!("0.{micros:06} {secs}")
}

// Floor split so that `secs + micros / 1e6` reconstructs the timestamp,
// also before 1970.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn split_microtime(timestamp: f64) -> (i64, u32) {
    let mut secs = timestamp.floor();
    let mut micros = ((timestamp - secs) * 1e6).round();
    if micros >= 1e6 {
        secs += 1.0;
        micros = 0.0;
    }
    (secs as i64, micros as u32)
}

fn saturating_duration_from_secs(secs: f64) -> Duration {
    Duration::from_secs_f64(secs).unwrap_or(if secs < 0.0 { Duration::MIN } else { Duration::MAX })
}

/// Panic unless `timestamp` can later be truncated to an `i64`
///
/// Crossing this bound is a caller bug: every integer reading of the clock
/// depends on it.
#[track_caller]
fn assert_travel_bound(timestamp: f64) {
    assert!(
        timestamp.is_finite() && (-I64_BOUND_F64..I64_BOUND_F64).contains(&timestamp),
        "cannot travel to {timestamp} seconds since the epoch: mocked time must stay within \
         the i64 range (before year {MAX_MOCKED_YEAR})"
    );
}

// ---------------------------------------------------------------------------
// Real clock
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct SleepSignal {
    generation: Mutex<u64>,
    wake: Condvar,
}

/// Wakes every thread currently sleeping on a [`SystemClock`]
///
/// Interrupted sleepers return [`TimeError::InterruptedWait`] with the time
/// they still had left.
#[derive(Debug, Clone)]
pub struct SleepInterrupter {
    signal: Arc<SleepSignal>,
}

impl SleepInterrupter {
    /// Interrupt all in-progress sleeps; later sleeps are unaffected
    pub fn interrupt(&self) {
        let mut generation = self.signal.generation.lock();
        *generation = generation.wrapping_add(1);
        self.signal.wake.notify_all();
    }
}

/// Real system clock implementation
///
/// Wall-clock reads use `SystemTime`; high-resolution reads are measured
/// from a process-wide monotonic anchor taken on first use. Clones share the
/// same interrupt signal.
#[derive(Debug, Clone, Default)]
pub struct SystemClock {
    signal: Arc<SleepSignal>,
}

impl SystemClock {
    /// Create a new system clock
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that can wake this clock's sleepers early
    pub fn interrupter(&self) -> SleepInterrupter {
        SleepInterrupter { signal: Arc::clone(&self.signal) }
    }

    fn since_epoch() -> (bool, std::time::Duration) {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => (false, elapsed),
            Err(err) => (true, err.duration()),
        }
    }

    fn monotonic() -> std::time::Duration {
        MONOTONIC_ANCHOR.elapsed()
    }
}

impl Clock for SystemClock {
    fn now_secs_f64(&self) -> f64 {
        match Self::since_epoch() {
            (false, elapsed) => elapsed.as_secs_f64(),
            (true, before) => -before.as_secs_f64(),
        }
    }

    #[allow(clippy::cast_possible_wrap)]
    fn now_secs(&self) -> i64 {
        match Self::since_epoch() {
            (false, elapsed) => elapsed.as_secs() as i64,
            (true, before) => -(before.as_secs() as i64),
        }
    }

    fn now(&self) -> Duration {
        let (negative, magnitude) = Self::since_epoch();
        let nanos = i64::try_from(magnitude.as_nanos()).unwrap_or(i64::MAX);
        Duration::from_nanos(if negative { -nanos } else { nanos })
    }

    #[allow(clippy::cast_possible_truncation)]
    fn microtime_string(&self) -> String {
        let nanos = self.now().as_nanos();
        let micros = nanos.div_euclid(1_000);
        format_microtime(micros.div_euclid(1_000_000), micros.rem_euclid(1_000_000) as u32)
    }

    fn sleep(&self, duration: Duration) -> TimeResult<()> {
        let Some(wait) = duration.to_std().filter(|wait| !wait.is_zero()) else {
            return Ok(());
        };
        let Some(deadline) = Instant::now().checked_add(wait) else {
            return Err(TimeError::overflow("sleep"));
        };

        let mut generation = self.signal.generation.lock();
        let started = *generation;
        loop {
            if self.signal.wake.wait_until(&mut generation, deadline).timed_out() {
                return Ok(());
            }
            if *generation != started {
                let remaining = deadline.saturating_duration_since(Instant::now());
                warn!(remaining_ms = remaining.as_millis() as u64, "sleep interrupted");
                return Err(TimeError::InterruptedWait { remaining });
            }
        }
    }

    #[allow(clippy::cast_possible_wrap)]
    fn hrtime(&self) -> HrTime {
        let elapsed = Self::monotonic();
        HrTime { secs: elapsed.as_secs() as i64, nanos: elapsed.subsec_nanos() }
    }

    fn hrtime_nanos(&self) -> TimeResult<i64> {
        require_native_i64_nanos()?;
        i64::try_from(Self::monotonic().as_nanos()).map_err(|_| TimeError::overflow("hrtime"))
    }

    #[allow(clippy::cast_precision_loss)]
    fn hrtime_nanos_f64(&self) -> f64 {
        Self::monotonic().as_nanos() as f64
    }
}

// ---------------------------------------------------------------------------
// Virtual clock
// ---------------------------------------------------------------------------

/// Mock clock for deterministic testing
///
/// Holds a virtual timestamp in seconds since the epoch. Reads derive purely
/// from it, sleeps advance it without blocking. Cloned clocks share the same
/// timestamp.
///
/// # Panics
///
/// Every constructor and mutator panics if the timestamp would leave the
/// `i64` range or stop being finite.
///
/// # Examples
///
/// ```
/// use tickwork_common::time::{Clock, HrTime, MockClock};
///
/// let clock = MockClock::at(0.0);
/// clock.sleep_micros(1_005_000).unwrap();
/// assert_eq!(clock.hrtime(), HrTime { secs: 1, nanos: 5_000_000 });
/// ```
#[derive(Debug, Clone)]
pub struct MockClock {
    now: Arc<Mutex<f64>>,
}

impl MockClock {
    /// Create a mock clock frozen at the current real time
    pub fn new() -> Self {
        Self::at(SystemClock::new().now_secs_f64())
    }

    /// Create a mock clock frozen at `timestamp` seconds since the epoch
    #[track_caller]
    pub fn at(timestamp: f64) -> Self {
        assert_travel_bound(timestamp);
        Self { now: Arc::new(Mutex::new(timestamp)) }
    }

    /// Current virtual timestamp
    #[must_use]
    pub fn timestamp(&self) -> f64 {
        *self.now.lock()
    }

    /// Jump to an absolute timestamp
    #[track_caller]
    pub fn set(&self, timestamp: f64) {
        assert_travel_bound(timestamp);
        *self.now.lock() = timestamp;
    }

    /// Move the virtual time by `duration`, which may be negative
    #[track_caller]
    pub fn advance(&self, duration: Duration) {
        self.advance_secs_f64(duration.as_secs_f64());
    }

    /// Move the virtual time by fractional seconds
    #[track_caller]
    pub fn advance_secs_f64(&self, secs: f64) {
        let mut now = self.now.lock();
        let next = *now + secs;
        assert_travel_bound(next);
        trace!(from = *now, to = next, "advancing mocked clock");
        *now = next;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now_secs_f64(&self) -> f64 {
        self.timestamp()
    }

    fn sleep(&self, duration: Duration) -> TimeResult<()> {
        if duration.greater_than(Duration::ZERO) {
            self.advance(duration);
        }
        Ok(())
    }

    // Virtual time is bounded in seconds, not nanoseconds, so integer
    // sleeps skip the `Duration` conversion.
    #[allow(clippy::cast_precision_loss)]
    fn sleep_secs(&self, secs: u64) -> TimeResult<u64> {
        self.advance_secs_f64(secs as f64);
        Ok(0)
    }

    #[allow(clippy::cast_precision_loss)]
    fn sleep_micros(&self, micros: u64) -> TimeResult<()> {
        self.advance_secs_f64(micros as f64 / 1e6);
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn hrtime(&self) -> HrTime {
        let timestamp = self.timestamp();
        let mut secs = timestamp.floor();
        let mut nanos = ((timestamp - secs) * 1e9).round();
        if nanos >= 1e9 {
            secs += 1.0;
            nanos = 0.0;
        }
        HrTime { secs: secs as i64, nanos: nanos as u32 }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn hrtime_nanos(&self) -> TimeResult<i64> {
        require_native_i64_nanos()?;
        let nanos = (self.timestamp() * 1e9).round();
        if (-I64_BOUND_F64..I64_BOUND_F64).contains(&nanos) {
            Ok(nanos as i64)
        } else {
            Err(TimeError::overflow("hrtime"))
        }
    }

    fn hrtime_nanos_f64(&self) -> f64 {
        self.timestamp() * 1e9
    }
}

// ---------------------------------------------------------------------------
// Switchable clock
// ---------------------------------------------------------------------------

/// State of a [`MockableClock`]
#[derive(Debug, Clone, Default)]
pub enum ClockMode {
    /// Delegate to the operating system
    #[default]
    Real,
    /// Serve reads from a virtual timestamp
    Mocked(MockClock),
}

/// A clock that can be switched between real and virtual time
///
/// Starts in [`ClockMode::Real`]. [`MockableClock::enable_mocking`] moves to
/// `Mocked` from any state, [`MockableClock::disable_mocking`] moves back to
/// `Real` from any state. Sleeps in mocked mode advance the virtual
/// timestamp.
#[derive(Debug, Default)]
pub struct MockableClock {
    real: SystemClock,
    mode: RwLock<ClockMode>,
}

impl MockableClock {
    /// Create a clock in real mode
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock in real mode backed by `real`
    pub fn with_system_clock(real: SystemClock) -> Self {
        Self { real, mode: RwLock::new(ClockMode::Real) }
    }

    /// Enter mocked mode at `seed` seconds, or at the real current time
    ///
    /// Calling it again while mocked resets the virtual timestamp in place;
    /// handles returned earlier keep observing the same clock.
    ///
    /// # Panics
    ///
    /// Panics if `seed` is outside the `i64` range or not finite.
    #[track_caller]
    pub fn enable_mocking(&self, seed: Option<f64>) -> MockClock {
        let timestamp = seed.unwrap_or_else(|| self.real.now_secs_f64());
        let mut mode = self.mode.write();
        let mock = match &*mode {
            ClockMode::Mocked(existing) => {
                existing.set(timestamp);
                existing.clone()
            }
            ClockMode::Real => MockClock::at(timestamp),
        };
        *mode = ClockMode::Mocked(mock.clone());
        debug!(timestamp, "clock mocking enabled");
        mock
    }

    /// Return to real mode; a no-op when already real
    pub fn disable_mocking(&self) {
        let previous = std::mem::take(&mut *self.mode.write());
        if let ClockMode::Mocked(mock) = previous {
            debug!(timestamp = mock.timestamp(), "clock mocking disabled");
        }
    }

    /// Whether reads currently come from a virtual timestamp
    pub fn is_mocked(&self) -> bool {
        matches!(*self.mode.read(), ClockMode::Mocked(_))
    }

    /// Handle to the active mock, if any
    pub fn mock(&self) -> Option<MockClock> {
        match &*self.mode.read() {
            ClockMode::Mocked(mock) => Some(mock.clone()),
            ClockMode::Real => None,
        }
    }

    /// Snapshot of the current mode
    pub fn mode(&self) -> ClockMode {
        self.mode.read().clone()
    }

    /// Handle that wakes real-mode sleepers early
    pub fn interrupter(&self) -> SleepInterrupter {
        self.real.interrupter()
    }

    // The lock is released before delegating so a long real sleep never
    // blocks a concurrent mode switch.
    fn with_active<R>(&self, f: impl FnOnce(&dyn Clock) -> R) -> R {
        match self.mode() {
            ClockMode::Real => f(&self.real),
            ClockMode::Mocked(mock) => f(&mock),
        }
    }
}

impl Clock for MockableClock {
    fn now_secs_f64(&self) -> f64 {
        self.with_active(|clock| clock.now_secs_f64())
    }

    fn sleep(&self, duration: Duration) -> TimeResult<()> {
        self.with_active(|clock| clock.sleep(duration))
    }

    fn hrtime(&self) -> HrTime {
        self.with_active(|clock| clock.hrtime())
    }

    fn hrtime_nanos(&self) -> TimeResult<i64> {
        self.with_active(|clock| clock.hrtime_nanos())
    }

    fn hrtime_nanos_f64(&self) -> f64 {
        self.with_active(|clock| clock.hrtime_nanos_f64())
    }

    fn now_secs(&self) -> i64 {
        self.with_active(|clock| clock.now_secs())
    }

    fn now(&self) -> Duration {
        self.with_active(|clock| clock.now())
    }

    fn microtime_string(&self) -> String {
        self.with_active(|clock| clock.microtime_string())
    }

    fn sleep_secs(&self, secs: u64) -> TimeResult<u64> {
        self.with_active(|clock| clock.sleep_secs(secs))
    }

    fn sleep_micros(&self, micros: u64) -> TimeResult<()> {
        self.with_active(|clock| clock.sleep_micros(micros))
    }
}

// Shared handles delegate to the clock they point at.
macro_rules! forward_clock {
    ($($handle:ty),+ $(,)?) => {$(
        impl<C: Clock + ?Sized> Clock for $handle {
            fn now_secs_f64(&self) -> f64 {
                (**self).now_secs_f64()
            }

            fn sleep(&self, duration: Duration) -> TimeResult<()> {
                (**self).sleep(duration)
            }

            fn hrtime(&self) -> HrTime {
                (**self).hrtime()
            }

            fn hrtime_nanos(&self) -> TimeResult<i64> {
                (**self).hrtime_nanos()
            }

            fn hrtime_nanos_f64(&self) -> f64 {
                (**self).hrtime_nanos_f64()
            }

            fn now_secs(&self) -> i64 {
                (**self).now_secs()
            }

            fn now(&self) -> Duration {
                (**self).now()
            }

            fn microtime_string(&self) -> String {
                (**self).microtime_string()
            }

            fn sleep_secs(&self, secs: u64) -> TimeResult<u64> {
                (**self).sleep_secs(secs)
            }

            fn sleep_micros(&self, micros: u64) -> TimeResult<()> {
                (**self).sleep_micros(micros)
            }
        }
    )+};
}

forward_clock!(&C, Arc<C>, Box<C>);
