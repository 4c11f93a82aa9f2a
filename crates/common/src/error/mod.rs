//! Common error types and utilities shared by every tickwork module
//!
//! # Error Handling Architecture
//!
//! 1. **`CommonError`**: the small set of error patterns that appear across
//!    modules (configuration, serialization, validation, timeouts, internal).
//!
//! 2. **`ErrorClassification` trait**: a standard interface for classifying
//!    errors by their characteristics (retryability, severity, criticality).
//!
//! 3. **`ErrorSeverity` enum**: a unified severity level for monitoring and
//!    alerting across all error types.
//!
//! Module-specific errors such as [`crate::time::TimeError`] carry the
//! domain detail and implement `ErrorClassification` themselves; they can be
//! folded into `CommonError` with `From` when a caller wants a single type.
//!
//! ## ErrorSeverity Levels
//!
//! | Level | Use Case | Examples |
//! |-------|----------|----------|
//! | **Info** | Informational, expected conditions | Interrupted sleep |
//! | **Warning** | Degraded but operational | Timeouts |
//! | **Error** | Failure requiring attention | Overflow, invalid input, config errors |
//! | **Critical** | System integrity at risk | Internal errors |
//!
//! ## Example
//!
//! ```rust,ignore
//! use crate::error::{CommonError, CommonResult};
//!
//! fn load_config(data: &str) -> CommonResult<TimeConfig> {
//!     toml::from_str(data)
//!         .map_err(|e| CommonError::serialization_format("TOML", e.to_string()))
//! }
//! ```

use std::fmt;
use std::time::Duration;

/// Standard result type using CommonError
pub type CommonResult<T> = Result<T, CommonError>;

/// Common error variants that appear across multiple modules
#[derive(Debug, Clone, PartialEq)]
pub enum CommonError {
    /// Configuration-related errors
    Config { message: String, field: Option<String> },

    /// Serialization or deserialization errors
    Serialization { message: String, format: Option<String> },

    /// Validation errors
    Validation { field: String, message: String, value: Option<String> },

    /// Timeout errors
    Timeout { operation: String, duration: Duration },

    /// Internal errors that shouldn't normally occur
    Internal { message: String, context: Option<String> },
}

impl fmt::Display for CommonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { message, field } => {
                if let Some(field) = field {
                    write!(f, "Configuration error in field '{}': {}", field, message)
                } else {
                    write!(f, "Configuration error: {}", message)
                }
            }
            Self::Serialization { message, format } => {
                if let Some(format) = format {
                    write!(f, "Serialization error ({}): {}", format, message)
                } else {
                    write!(f, "Serialization error: {}", message)
                }
            }
            Self::Validation { field, message, value } => {
                if let Some(value) = value {
                    write!(
                        f,
                        "Validation error for field '{}' (value: '{}'): {}",
                        field, value, message
                    )
                } else {
                    write!(f, "Validation error for field '{}': {}", field, message)
                }
            }
            Self::Timeout { operation, duration } => {
                write!(f, "Operation '{}' timed out after {:?}", operation, duration)
            }
            Self::Internal { message, context } => {
                if let Some(ctx) = context {
                    write!(f, "Internal error in '{}': {}", ctx, message)
                } else {
                    write!(f, "Internal error: {}", message)
                }
            }
        }
    }
}

impl std::error::Error for CommonError {}

impl ErrorClassification for CommonError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Config { .. } => ErrorSeverity::Error,
            Self::Serialization { .. } => ErrorSeverity::Error,
            Self::Validation { .. } => ErrorSeverity::Error,
            Self::Timeout { .. } => ErrorSeverity::Warning,
            Self::Internal { .. } => ErrorSeverity::Critical,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl CommonError {
    /// Create a simple configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), field: None }
    }

    /// Create a configuration error for a specific field
    pub fn config_field<S: Into<String>, F: Into<String>>(field: F, message: S) -> Self {
        Self::Config { message: message.into(), field: Some(field.into()) }
    }

    /// Create a simple serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        Self::Serialization { message: message.into(), format: None }
    }

    /// Create a serialization error with format information
    pub fn serialization_format<S: Into<String>, F: Into<String>>(format: F, message: S) -> Self {
        Self::Serialization { message: message.into(), format: Some(format.into()) }
    }

    /// Create a validation error
    pub fn validation<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::Validation { field: field.into(), message: message.into(), value: None }
    }

    /// Create a validation error with the invalid value
    pub fn validation_with_value<F: Into<String>, M: Into<String>, V: Into<String>>(
        field: F,
        message: M,
        value: V,
    ) -> Self {
        Self::Validation { field: field.into(), message: message.into(), value: Some(value.into()) }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(operation: S, duration: Duration) -> Self {
        Self::Timeout { operation: operation.into(), duration }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into(), context: None }
    }

    /// Create an internal error with context
    pub fn internal_with_context<S: Into<String>, C: Into<String>>(message: S, context: C) -> Self {
        Self::Internal { message: message.into(), context: Some(context.into()) }
    }

    /// Convert error to structured logging fields
    ///
    /// Returns key-value pairs suitable for `tracing` fields.
    pub fn as_tracing_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("error_type", self.error_type_name().to_string())];

        match self {
            Self::Config { message, field } => {
                fields.push(("message", message.clone()));
                if let Some(field) = field {
                    fields.push(("field", field.clone()));
                }
            }
            Self::Serialization { message, format } => {
                fields.push(("message", message.clone()));
                if let Some(format) = format {
                    fields.push(("format", format.clone()));
                }
            }
            Self::Validation { field, message, value } => {
                fields.push(("field", field.clone()));
                fields.push(("message", message.clone()));
                if let Some(value) = value {
                    fields.push(("value", value.clone()));
                }
            }
            Self::Timeout { operation, duration } => {
                fields.push(("operation", operation.clone()));
                fields.push(("duration_ms", duration.as_millis().to_string()));
            }
            Self::Internal { message, context } => {
                fields.push(("message", message.clone()));
                if let Some(ctx) = context {
                    fields.push(("context", ctx.clone()));
                }
            }
        }

        fields
    }

    fn error_type_name(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Serialization { .. } => "serialization",
            Self::Validation { .. } => "validation",
            Self::Timeout { .. } => "timeout",
            Self::Internal { .. } => "internal",
        }
    }
}

/// Error classification trait for consistent error handling across modules
///
/// Lets callers decide whether to retry, how loudly to log, and whether to
/// page someone, without matching on every module's concrete error enum.
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors are transient: an interrupted wait can simply be
    /// resumed, a timeout can be attempted again.
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool;

    /// Get the suggested retry delay if applicable
    fn retry_after(&self) -> Option<Duration>;
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl From<serde_json::Error> for CommonError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization_format("JSON", err.to_string())
    }
}

impl From<toml::de::Error> for CommonError {
    fn from(err: toml::de::Error) -> Self {
        Self::serialization_format("TOML", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for error.
    use super::*;

    #[test]
    fn test_display_includes_field() {
        let err = CommonError::config_field("mock_start_secs", "must be finite");
        assert_eq!(
            err.to_string(),
            "Configuration error in field 'mock_start_secs': must be finite"
        );

        let err = CommonError::config("bad");
        assert_eq!(err.to_string(), "Configuration error: bad");
    }

    #[test]
    fn test_classification() {
        let timeout = CommonError::timeout("sleep", Duration::from_secs(1));
        assert!(timeout.is_retryable());
        assert_eq!(timeout.severity(), ErrorSeverity::Warning);
        assert!(!timeout.is_critical());

        let internal = CommonError::internal("clock state lost");
        assert!(!internal.is_retryable());
        assert!(internal.is_critical());
        assert_eq!(internal.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_tracing_fields() {
        let err = CommonError::validation_with_value("timezone", "unknown zone", "Mars/Base");
        let fields = err.as_tracing_fields();
        assert_eq!(fields[0], ("error_type", "validation".to_string()));
        assert!(fields.contains(&("value", "Mars/Base".to_string())));
    }

    #[test]
    fn test_toml_conversion() {
        let err: CommonError = toml::from_str::<toml::Value>("= broken").unwrap_err().into();
        assert!(matches!(err, CommonError::Serialization { format: Some(ref f), .. } if f == "TOML"));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(ErrorSeverity::Critical > ErrorSeverity::Error);
        assert!(ErrorSeverity::Warning > ErrorSeverity::Info);
        assert_eq!(ErrorSeverity::Warning.to_string(), "WARN");
    }
}
