//! Time utilities and abstractions
//!
//! This module provides:
//! - **[`duration`]**: A signed, nanosecond-precision [`Duration`] with
//!   checked arithmetic
//! - **[`format`]** and **[`parse`]**: Human-readable duration strings
//! - **Clock abstractions**: Real and mock time behind the [`Clock`] trait
//! - **[`global`]**: The process-wide switchable clock
//! - **[`deadline`]**: Deadlines measured against any clock
//!
//! ## Usage
//!
//! ```rust
//! # #[cfg(feature = "runtime")]
//! # {
//! use tickwork_common::time::{format_duration, parse_duration, Clock, Duration, MockClock};
//!
//! // Format durations
//! let formatted = format_duration(Duration::seconds(3665));
//! assert_eq!(formatted, "1h 1m 5s");
//!
//! // Parse durations
//! let duration = parse_duration("2h 30m").unwrap();
//! assert_eq!(duration, Duration::seconds(9000));
//!
//! // Mock time for testing
//! let clock = MockClock::at(0.0);
//! clock.sleep(duration).unwrap();
//! assert_eq!(clock.now_secs(), 9000);
//! # }
//! ```

pub mod duration;
pub mod error;
pub mod format;
pub mod parse;

#[cfg(feature = "runtime")]
pub mod clock;
#[cfg(feature = "runtime")]
pub mod deadline;
#[cfg(feature = "runtime")]
pub mod global;
#[cfg(feature = "runtime")]
pub mod platform;

// Re-export commonly used items
pub use duration::{Duration, TimeUnit};
pub use error::{TimeError, TimeResult};
pub use format::{format_duration, format_duration_compact, format_duration_verbose};
pub use parse::{parse_duration, DurationParseError};

#[cfg(feature = "runtime")]
pub use clock::{
    format_microtime, Clock, ClockMode, HrTime, MockClock, MockableClock, SleepInterrupter,
    SystemClock, MAX_MOCKED_YEAR,
};
#[cfg(feature = "runtime")]
pub use deadline::Deadline;
#[cfg(feature = "runtime")]
pub use platform::{native_int_bits, supports_native_i64_nanos};
