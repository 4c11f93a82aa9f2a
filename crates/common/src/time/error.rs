//! Errors raised by the clock and duration types

use std::time::Duration as StdDuration;

use thiserror::Error;

use crate::error::{CommonError, ErrorClassification, ErrorSeverity};

/// Result alias for time operations
pub type TimeResult<T> = Result<T, TimeError>;

/// Error type for clock reads, sleeps and duration arithmetic
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TimeError {
    /// The mathematical result does not fit in a signed 64-bit nanosecond
    /// count.
    #[error("Arithmetic overflow in duration {operation}")]
    ArithmeticOverflow { operation: &'static str },

    /// A duration was divided by zero.
    #[error("Division of a duration by zero")]
    DivisionByZero,

    /// The host cannot represent a nanosecond reading as a native integer.
    #[error("Operation requires a {required_bits}-bit native integer, host has {actual_bits} bits")]
    UnsupportedPlatform { required_bits: u32, actual_bits: u32 },

    /// A real sleep was woken before it completed.
    #[error("Wait interrupted with {remaining:?} remaining")]
    InterruptedWait { remaining: StdDuration },

    /// A duration string could not be parsed.
    #[error(transparent)]
    InvalidDuration(#[from] super::parse::DurationParseError),
}

impl TimeError {
    pub(crate) const fn overflow(operation: &'static str) -> Self {
        Self::ArithmeticOverflow { operation }
    }
}

impl ErrorClassification for TimeError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::InterruptedWait { .. })
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InterruptedWait { .. } => ErrorSeverity::Info,
            Self::UnsupportedPlatform { .. } => ErrorSeverity::Warning,
            Self::ArithmeticOverflow { .. } | Self::DivisionByZero | Self::InvalidDuration(_) => {
                ErrorSeverity::Error
            }
        }
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<StdDuration> {
        match self {
            Self::InterruptedWait { remaining } => Some(*remaining),
            _ => None,
        }
    }
}

impl From<TimeError> for CommonError {
    fn from(err: TimeError) -> Self {
        match err {
            TimeError::InvalidDuration(inner) => {
                Self::validation("duration", inner.to_string())
            }
            TimeError::InterruptedWait { remaining } => Self::timeout("sleep", remaining),
            other => Self::internal_with_context(other.to_string(), "time"),
        }
    }
}
