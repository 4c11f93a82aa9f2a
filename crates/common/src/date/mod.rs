//! Calendar dates read through a [`Clock`]
//!
//! [`DateUtils`] turns clock readings and strings into `chrono` date-times.
//! Because every "now" goes through the clock, date logic stays testable
//! with a [`crate::time::MockClock`].
//!
//! ## Usage
//!
//! ```rust
//! use chrono::{Datelike, Timelike};
//! use tickwork_common::date::DateUtils;
//! use tickwork_common::time::MockClock;
//!
//! // 2021-01-01T00:00:00.5Z
//! let dates = DateUtils::new(MockClock::at(1_609_459_200.5));
//! let now = dates.now().unwrap();
//! assert_eq!(now.year(), 2021);
//! assert_eq!(now.nanosecond(), 500_000_000);
//!
//! // Relative strings are resolved against the clock
//! let later = dates.parse("+1h 30m").unwrap();
//! assert_eq!(later.hour(), 1);
//! assert_eq!(later.minute(), 30);
//! ```

use chrono::{
    DateTime, Duration as ChronoDuration, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc,
};
use chrono_tz::Tz;
use thiserror::Error;

use crate::error::CommonError;
use crate::time::{global, parse_duration, Clock, Duration, MockableClock};

/// Result alias for date operations
pub type DateResult<T> = Result<T, DateError>;

/// Error type for date construction and parsing
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("Parameter micros is out of range [0, 999999]: {0}")]
    OutOfRange(i64),

    #[error("Can not parse date `{input}`: {reason}")]
    Parse { input: String, reason: String },

    #[error("Can not represent timestamp/micros: `{secs}`/`{micros}`")]
    InvalidTimestamp { secs: i64, micros: i64 },

    #[error("Unknown timezone: `{0}`")]
    UnknownTimezone(String),
}

impl DateError {
    fn parse<I: Into<String>, R: Into<String>>(input: I, reason: R) -> Self {
        Self::Parse { input: input.into(), reason: reason.into() }
    }
}

impl From<DateError> for CommonError {
    fn from(err: DateError) -> Self {
        match &err {
            DateError::Parse { input, .. } => {
                Self::validation_with_value("date", err.to_string(), input.clone())
            }
            DateError::UnknownTimezone(name) => {
                Self::validation_with_value("timezone", err.to_string(), name.clone())
            }
            DateError::OutOfRange(_) | DateError::InvalidTimestamp { .. } => {
                Self::validation("timestamp", err.to_string())
            }
        }
    }
}

/// Look up an IANA timezone by name
///
/// # Errors
///
/// Returns [`DateError::UnknownTimezone`] for names missing from the tz
/// database.
pub fn parse_timezone(name: &str) -> DateResult<Tz> {
    name.parse::<Tz>().map_err(|_| DateError::UnknownTimezone(name.to_string()))
}

// Naive layouts tried in order when a string carries no offset.
const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
const NAIVE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Date helpers bound to a clock
#[derive(Debug, Clone)]
pub struct DateUtils<C: Clock> {
    clock: C,
    timezone: Tz,
}

impl DateUtils<&'static MockableClock> {
    /// Date helpers over the process-wide clock, in UTC
    pub fn global() -> Self {
        Self::new(global::clock())
    }
}

impl<C: Clock> DateUtils<C> {
    /// Date helpers reading `clock`, interpreting naive strings as UTC
    pub fn new(clock: C) -> Self {
        Self::with_timezone(clock, Tz::UTC)
    }

    /// Date helpers reading `clock`, interpreting naive strings in `timezone`
    pub fn with_timezone(clock: C, timezone: Tz) -> Self {
        Self { clock, timezone }
    }

    /// The clock backing this instance
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Zone used for strings without an explicit offset
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Current time with microsecond precision
    ///
    /// # Errors
    ///
    /// Returns [`DateError::InvalidTimestamp`] if the clock reads a time
    /// outside the calendar range.
    pub fn now(&self) -> DateResult<DateTime<Utc>> {
        let microtime = self.clock.microtime_string();
        let (secs, micros) = split_microtime(&microtime)?;
        self.from_timestamp(secs, micros)
    }

    /// Current time in `tz`
    ///
    /// # Errors
    ///
    /// See [`DateUtils::now`].
    pub fn now_tz(&self, tz: Tz) -> DateResult<DateTime<Tz>> {
        Ok(self.now()?.with_timezone(&tz))
    }

    /// Date-time for a Unix timestamp plus microseconds
    ///
    /// # Errors
    ///
    /// Returns [`DateError::OutOfRange`] unless `micros` is in
    /// `0..=999_999`, and [`DateError::InvalidTimestamp`] outside the
    /// calendar range.
    pub fn from_timestamp(&self, secs: i64, micros: i64) -> DateResult<DateTime<Utc>> {
        let sub_micros = u32::try_from(micros)
            .ok()
            .filter(|m| *m <= 999_999)
            .ok_or(DateError::OutOfRange(micros))?;
        DateTime::from_timestamp(secs, sub_micros * 1_000)
            .ok_or(DateError::InvalidTimestamp { secs, micros })
    }

    /// Date-time for a Unix timestamp in milliseconds
    ///
    /// Negative timestamps round toward the past, so `-1` is one millisecond
    /// before the epoch.
    ///
    /// # Errors
    ///
    /// Returns [`DateError::InvalidTimestamp`] outside the calendar range.
    pub fn from_timestamp_ms(&self, millis: i64) -> DateResult<DateTime<Utc>> {
        self.from_timestamp(millis.div_euclid(1_000), millis.rem_euclid(1_000) * 1_000)
    }

    /// Parse a date string
    ///
    /// Accepts RFC 3339 (the offset is kept), `YYYY-MM-DD HH:MM:SS[.f]` and
    /// `YYYY-MM-DD` (read in this instance's timezone), `now`, and offsets
    /// from now such as `+1h 30m` or `-2d`.
    ///
    /// # Errors
    ///
    /// Returns [`DateError::Parse`] if no layout matches.
    pub fn parse(&self, input: &str) -> DateResult<DateTime<FixedOffset>> {
        let trimmed = input.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(parsed);
        }
        self.parse_in(trimmed, self.timezone).map(|dt| dt.fixed_offset())
    }

    /// Parse a date string and express it in `tz`
    ///
    /// Strings without an offset are read as local time in `tz`.
    ///
    /// # Errors
    ///
    /// Returns [`DateError::Parse`] if no layout matches.
    pub fn parse_tz(&self, input: &str, tz: Tz) -> DateResult<DateTime<Tz>> {
        let trimmed = input.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(parsed.with_timezone(&tz));
        }
        self.parse_in(trimmed, tz)
    }

    /// Parse a date string with an explicit `chrono` format
    ///
    /// If `format` carries an offset (`%z`, `%:z`) the result is converted
    /// to `tz`; otherwise the string is read as local time in `tz`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono_tz::Tz;
    /// use tickwork_common::date::DateUtils;
    /// use tickwork_common::time::MockClock;
    ///
    /// let dates = DateUtils::new(MockClock::at(0.0));
    /// let parsed = dates.parse_with_format("17/05/2024 08:00", "%d/%m/%Y %H:%M", Tz::Europe__Paris).unwrap();
    /// assert_eq!(parsed.to_rfc3339(), "2024-05-17T08:00:00+02:00");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`DateError::Parse`] naming the format and timezone.
    pub fn parse_with_format(&self, input: &str, format: &str, tz: Tz) -> DateResult<DateTime<Tz>> {
        if let Ok(parsed) = DateTime::parse_from_str(input, format) {
            return Ok(parsed.with_timezone(&tz));
        }
        let fail = || {
            DateError::parse(
                input,
                format!("does not match format `{format}` in timezone `{}`", tz.name()),
            )
        };
        let naive = NaiveDateTime::parse_from_str(input, format)
            .ok()
            .or_else(|| NaiveDate::parse_from_str(input, format).ok().and_then(start_of_day))
            .ok_or_else(fail)?;
        localize(input, naive, tz)
    }

    fn parse_in(&self, input: &str, tz: Tz) -> DateResult<DateTime<Tz>> {
        if input.eq_ignore_ascii_case("now") {
            return self.now_tz(tz);
        }
        if input.starts_with(['+', '-']) {
            return self.relative(input, tz);
        }

        let naive = NAIVE_DATETIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
            .or_else(|| NaiveDate::parse_from_str(input, NAIVE_DATE_FORMAT).ok().and_then(start_of_day))
            .ok_or_else(|| DateError::parse(input, "unrecognized date layout"))?;
        localize(input, naive, tz)
    }

    // `+1h 30m` / `-2d`: an offset from the clock's current reading.
    fn relative(&self, input: &str, tz: Tz) -> DateResult<DateTime<Tz>> {
        let body = input.strip_prefix('+').unwrap_or(input);
        let offset: Duration =
            parse_duration(body).map_err(|err| DateError::parse(input, err.to_string()))?;
        self.now_tz(tz)?
            .checked_add_signed(ChronoDuration::nanoseconds(offset.as_nanos()))
            .ok_or_else(|| DateError::parse(input, "offset leaves the calendar range"))
    }
}

fn split_microtime(microtime: &str) -> DateResult<(i64, i64)> {
    let malformed = || DateError::parse(microtime, "malformed microtime reading");
    let (fraction, secs) = microtime.split_once(' ').ok_or_else(malformed)?;
    let micros = fraction
        .strip_prefix("0.")
        .and_then(|digits| digits.parse::<i64>().ok())
        .ok_or_else(malformed)?;
    let secs = secs.parse::<i64>().map_err(|_| malformed())?;
    Ok((secs, micros))
}

fn start_of_day(date: NaiveDate) -> Option<NaiveDateTime> {
    date.and_hms_opt(0, 0, 0)
}

// Ambiguous local times (DST fall-back) resolve to the earlier instant.
fn localize(input: &str, naive: NaiveDateTime, tz: Tz) -> DateResult<DateTime<Tz>> {
    tz.from_local_datetime(&naive).earliest().ok_or_else(|| {
        DateError::parse(input, format!("local time does not exist in `{}`", tz.name()))
    })
}
