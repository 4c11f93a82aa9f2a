//! Common utility functions
//!
//! This module provides reusable utilities including:
//! - **[`log`]**: Truncation of long strings for log output
//! - **[`serde`]**: Serialization helpers for [`crate::time::Duration`]

pub mod log;
pub mod serde;

// Re-export commonly used items for convenience
pub use self::log::truncate;
pub use self::serde::{duration_human, duration_millis};
