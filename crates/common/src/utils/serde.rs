//! Serialization utilities for durations
//!
//! [`Duration`] serializes as raw nanoseconds by default. These modules offer
//! friendlier encodings for configuration files and JSON payloads.

use serde::{Deserialize, Deserializer, Serializer};

use crate::time::{format_duration, parse_duration, Duration};

/// Serde serialization result type
type SerializeResult<S> = Result<<S as Serializer>::Ok, <S as Serializer>::Error>;

/// Custom serialization module for Duration as milliseconds
///
/// Sub-millisecond precision is dropped on serialization (truncating toward
/// zero); deserialization rejects values that overflow.
///
/// # Usage
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use tickwork_common::duration_millis;
/// use tickwork_common::time::Duration;
///
/// #[derive(Serialize, Deserialize)]
/// struct Example {
///     #[serde(with = "duration_millis")]
///     timeout: Duration,
/// }
/// ```
pub mod duration_millis {
    use super::{Deserialize, Deserializer, Duration, SerializeResult, Serializer};
    use crate::time::TimeUnit;

    /// Serialize a Duration as whole milliseconds (i64)
    pub fn serialize<S>(duration: &Duration, serializer: S) -> SerializeResult<S>
    where
        S: Serializer,
    {
        serializer.serialize_i64(duration.as_millis())
    }

    /// Deserialize milliseconds (i64) into a Duration
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = i64::deserialize(deserializer)?;
        Duration::of(millis, TimeUnit::Millisecond).map_err(serde::de::Error::custom)
    }
}

/// Custom serialization module for Duration as a human-readable string
///
/// Writes `"1h 30m"`-style strings and reads anything
/// [`parse_duration`] accepts.
///
/// # Usage
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use tickwork_common::duration_human;
/// use tickwork_common::time::Duration;
///
/// #[derive(Serialize, Deserialize)]
/// struct Example {
///     #[serde(with = "duration_human")]
///     interval: Duration,
/// }
///
/// let parsed: Example = serde_json::from_str(r#"{"interval":"1h 30m"}"#).unwrap();
/// assert_eq!(parsed.interval, Duration::minutes(90));
/// ```
pub mod duration_human {
    use super::{
        format_duration, parse_duration, Deserialize, Deserializer, Duration, SerializeResult,
        Serializer,
    };

    /// Serialize a Duration as a human-readable string
    pub fn serialize<S>(duration: &Duration, serializer: S) -> SerializeResult<S>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_duration(*duration))
    }

    /// Deserialize a human-readable string into a Duration
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        parse_duration(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for serialization utilities
    //!
    //! Tests cover both duration encodings, negative values and overflow
    //! rejection.

    use serde::{Deserialize, Serialize};

    use super::{duration_human, duration_millis};
    use crate::time::Duration;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct TestStruct {
        #[serde(with = "duration_millis")]
        timeout: Duration,
        #[serde(with = "duration_human")]
        interval: Duration,
    }

    /// Tests that both encodings appear in the JSON output
    #[test]
    fn test_serialize_encodings() {
        let data = TestStruct {
            timeout: Duration::milliseconds(1500),
            interval: Duration::minutes(90),
        };

        let json = serde_json::to_string(&data).unwrap();
        assert_eq!(json, r#"{"timeout":1500,"interval":"1h 30m 0s"}"#);
    }

    #[test]
    fn test_deserialize_negative_values() {
        let json = r#"{"timeout":-250,"interval":"-2d"}"#;
        let data: TestStruct = serde_json::from_str(json).unwrap();

        assert_eq!(data.timeout, Duration::milliseconds(-250));
        assert_eq!(data.interval, Duration::days(-2));
    }

    /// Validates that sub-millisecond precision is truncated.
    ///
    /// Assertions:
    /// - `1999us` serializes as `1`.
    #[test]
    fn test_millis_truncates() {
        let data = TestStruct {
            timeout: Duration::microseconds(1999),
            interval: Duration::ZERO,
        };
        let json = serde_json::to_string(&data).unwrap();
        assert!(json.contains("\"timeout\":1,"));
    }

    #[test]
    fn test_deserialize_rejects_overflow() {
        let json = format!(r#"{{"timeout":{},"interval":"1s"}}"#, i64::MAX);
        let err = serde_json::from_str::<TestStruct>(&json).unwrap_err();
        assert!(err.to_string().contains("overflow"), "unexpected error: {err}");
    }

    #[test]
    fn test_deserialize_rejects_bad_string() {
        let err =
            serde_json::from_str::<TestStruct>(r#"{"timeout":0,"interval":"soon"}"#).unwrap_err();
        assert!(err.to_string().contains("Invalid duration format"), "unexpected error: {err}");
    }
}
