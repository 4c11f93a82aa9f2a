//! Helpers for tests that touch the process-wide clock
//!
//! The clock in [`crate::time::global`] is shared by every test in the
//! binary, and the default harness runs tests on parallel threads. A
//! [`GlobalClockGuard`] serializes those tests and puts the clock back into
//! real mode when it is dropped, even if the test panics.
//!
//! # Examples
//!
//! ```
//! use tickwork_common::testing::time::GlobalClockGuard;
//! use tickwork_common::time::global;
//!
//! {
//!     let guard = GlobalClockGuard::mocked_at(0.0);
//!     global::sleep_secs(5).unwrap();
//!     assert_eq!(guard.mock().timestamp(), 5.0);
//! }
//! assert!(!global::is_mocked());
//! ```

use parking_lot::{const_mutex, Mutex, MutexGuard};

use crate::time::{global, MockClock};

static GLOBAL_CLOCK_LOCK: Mutex<()> = const_mutex(());

/// Exclusive, mocked access to the process-wide clock
#[must_use = "the clock returns to real mode as soon as the guard is dropped"]
pub struct GlobalClockGuard {
    mock: MockClock,
    _lock: MutexGuard<'static, ()>,
}

impl GlobalClockGuard {
    /// Lock the process clock and mock it at `timestamp` seconds
    #[track_caller]
    pub fn mocked_at(timestamp: f64) -> Self {
        Self::acquire(Some(timestamp))
    }

    /// Lock the process clock and mock it at the current real time
    pub fn mocked_now() -> Self {
        Self::acquire(None)
    }

    /// Handle to the virtual clock
    pub fn mock(&self) -> &MockClock {
        &self.mock
    }

    #[track_caller]
    fn acquire(seed: Option<f64>) -> Self {
        let lock = GLOBAL_CLOCK_LOCK.lock();
        let mock = global::enable_mocking(seed);
        Self { mock, _lock: lock }
    }
}

impl Drop for GlobalClockGuard {
    fn drop(&mut self) {
        global::disable_mocking();
    }
}

impl std::fmt::Debug for GlobalClockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalClockGuard").field("mock", &self.mock).finish_non_exhaustive()
    }
}
