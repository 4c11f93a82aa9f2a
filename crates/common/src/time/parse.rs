//! Duration parsing from strings
//!
//! Parses `"1h 30m"`-style strings into a [`Duration`]. Recognized units:
//! `ns`, `us`, `ms`, `s`, `m`, `h`, `d`, `w`. A single leading `-` negates
//! the whole value.

use thiserror::Error;

use super::duration::{Duration, TimeUnit};

/// Error type for duration parsing
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DurationParseError {
    #[error("Invalid duration format: {0}")]
    InvalidFormat(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    #[error("Duration out of range: {0}")]
    OutOfRange(String),

    #[error("Empty duration string")]
    EmptyString,
}

fn unit_for(symbol: &str) -> Option<TimeUnit> {
    TimeUnit::ALL.into_iter().find(|unit| unit.symbol() == symbol)
}

fn component(number: &str, unit: TimeUnit) -> Result<Duration, DurationParseError> {
    let out_of_range = || DurationParseError::OutOfRange(format!("{number}{}", unit.symbol()));

    if let Ok(whole) = number.parse::<i64>() {
        return Duration::of(whole, unit).map_err(|_| out_of_range());
    }

    let value: f64 =
        number.parse().map_err(|_| DurationParseError::InvalidNumber(number.to_string()))?;
    Duration::from_nanos(unit.nanos()).mul_f64(value).map_err(|_| out_of_range())
}

/// Parse a duration string into a Duration
///
/// # Examples
///
/// ```
/// use tickwork_common::time::parse::parse_duration;
/// use tickwork_common::time::Duration;
///
/// assert_eq!(parse_duration("5s").unwrap(), Duration::seconds(5));
/// assert_eq!(parse_duration("1h 30m").unwrap(), Duration::minutes(90));
/// assert_eq!(parse_duration("1s 500ms").unwrap(), Duration::milliseconds(1500));
/// assert_eq!(parse_duration("-2d").unwrap(), Duration::days(-2));
/// ```
///
/// # Errors
///
/// Returns a [`DurationParseError`] describing the first problem found.
pub fn parse_duration(s: &str) -> Result<Duration, DurationParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(DurationParseError::EmptyString);
    }

    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, s),
    };

    let mut total = Duration::ZERO;
    let mut current_number = String::new();
    let mut chars = body.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch.is_ascii_digit() || ch == '.' {
            current_number.push(ch);
            continue;
        }
        if ch.is_whitespace() {
            continue;
        }

        // Two-character units
        let mut symbol = ch.to_string();
        if matches!(ch, 'm' | 'u' | 'n') && chars.peek() == Some(&'s') {
            chars.next();
            symbol.push('s');
        }

        if current_number.is_empty() {
            return Err(DurationParseError::InvalidFormat(
                "Expected number before unit".to_string(),
            ));
        }

        let unit = unit_for(&symbol).ok_or(DurationParseError::UnknownUnit(symbol))?;
        let part = component(&current_number, unit)?;
        total = total
            .add(part)
            .map_err(|_| DurationParseError::OutOfRange(body.to_string()))?;
        current_number.clear();
    }

    if !current_number.is_empty() {
        return Err(DurationParseError::InvalidFormat("Missing unit after number".to_string()));
    }

    if negative {
        total = Duration::ZERO
            .sub(total)
            .map_err(|_| DurationParseError::OutOfRange(s.to_string()))?;
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    //! Unit tests for time::parse.
    use super::*;

    #[test]
    fn test_parse_single_units() {
        assert_eq!(parse_duration("5s").unwrap(), Duration::seconds(5));
        assert_eq!(parse_duration("0s").unwrap(), Duration::ZERO);
        assert_eq!(parse_duration("10m").unwrap(), Duration::minutes(10));
        assert_eq!(parse_duration("2h").unwrap(), Duration::hours(2));
        assert_eq!(parse_duration("1d").unwrap(), Duration::days(1));
        assert_eq!(parse_duration("1w").unwrap(), Duration::weeks(1));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::milliseconds(500));
        assert_eq!(parse_duration("1000us").unwrap(), Duration::microseconds(1000));
        assert_eq!(parse_duration("7ns").unwrap(), Duration::nanoseconds(7));
    }

    /// Validates compound strings.
    ///
    /// Assertions:
    /// - Components are summed regardless of whitespace.
    #[test]
    fn test_parse_compound() {
        assert_eq!(parse_duration("1h 30m").unwrap(), Duration::seconds(5400));
        assert_eq!(parse_duration("2h 15m 30s").unwrap(), Duration::seconds(8130));
        assert_eq!(parse_duration("1d 2h 30m").unwrap(), Duration::seconds(95_400));
        assert_eq!(parse_duration("  1h  30m ").unwrap(), Duration::seconds(5400));
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::seconds(90));
    }

    #[test]
    fn test_parse_decimals() {
        assert_eq!(parse_duration("1.5h").unwrap(), Duration::minutes(90));
        assert_eq!(parse_duration("0.5s").unwrap(), Duration::milliseconds(500));
    }

    #[test]
    fn test_parse_negative() {
        assert_eq!(parse_duration("-1h 30m").unwrap(), Duration::minutes(-90));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_duration(""), Err(DurationParseError::EmptyString));
        assert!(matches!(parse_duration("5"), Err(DurationParseError::InvalidFormat(_))));
        assert!(matches!(parse_duration("x"), Err(DurationParseError::InvalidFormat(_))));
        assert_eq!(parse_duration("5x"), Err(DurationParseError::UnknownUnit("x".to_string())));
        assert!(matches!(parse_duration("1.2.3s"), Err(DurationParseError::InvalidNumber(_))));
        assert!(matches!(parse_duration("99999999999w"), Err(DurationParseError::OutOfRange(_))));
    }
}
