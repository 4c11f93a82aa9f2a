//! Testing utilities and helpers
//!
//! This module provides:
//! - **[`assertions`]**: Assertions for floats, durations and microtime
//!   strings
//! - **[`fixtures`]**: Random timestamp and duration generators (with
//!   deterministic seeded variants)
//! - **[`time`]**: Serialized, self-restoring access to the process-wide
//!   clock
//!
//! ## Usage
//!
//! ```rust
//! use tickwork_common::testing::GlobalClockGuard;
//! use tickwork_common::time::{global, Duration};
//!
//! fn test_with_mock_time() {
//!     let guard = GlobalClockGuard::mocked_at(0.0);
//!     global::sleep(Duration::seconds(5)).unwrap();
//!     assert_eq!(guard.mock().timestamp(), 5.0);
//! }
//! # test_with_mock_time();
//! ```

pub mod assertions;
pub mod fixtures;
#[cfg(feature = "runtime")]
pub mod time;

// Re-export assertion functions (not macros)
// Note: Macros exported with #[macro_export] are available at crate root
pub use assertions::{assert_approx_eq, assert_duration_in_range, assert_microtime_layout};
pub use fixtures::{random_duration_seeded, random_timestamp, random_timestamp_seeded, seeded_rng};
#[cfg(feature = "runtime")]
pub use time::GlobalClockGuard;
