//! Mockable clocks and checked nanosecond durations for tickwork crates.
//!
//! # Safety and Quality
//!
//! Duration arithmetic never wraps: every operation that can leave the
//! signed 64-bit nanosecond range reports an error instead.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: errors, [`time::Duration`] with formatting and parsing,
//!   jitter, utilities
//! - `runtime` (default): clocks, the process-wide clock, dates,
//!   configuration
//! - `observability`: tracing of clock state transitions (implied by
//!   `runtime`)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;
#[cfg(feature = "foundation")]
pub mod jitter;
#[cfg(feature = "foundation")]
pub mod time;
#[cfg(feature = "foundation")]
pub mod utils;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod config;
#[cfg(feature = "runtime")]
pub mod date;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "runtime", feature = "test-utils", test))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "runtime")]
pub use config::{TimeConfig, TimeConfigBuilder};
#[cfg(feature = "runtime")]
pub use date::{DateError, DateUtils};
#[cfg(feature = "foundation")]
pub use error::{CommonError, CommonResult, ErrorClassification, ErrorSeverity};
#[cfg(feature = "foundation")]
pub use jitter::JitterError;
#[cfg(feature = "runtime")]
pub use time::{Clock, Deadline, MockClock, MockableClock, SystemClock};
#[cfg(feature = "foundation")]
pub use time::{Duration, TimeError, TimeResult, TimeUnit};
#[cfg(feature = "foundation")]
pub use utils::serde::{duration_human, duration_millis};
