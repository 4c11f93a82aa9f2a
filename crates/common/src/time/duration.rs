//! Signed nanosecond durations with checked arithmetic
//!
//! [`Duration`] stores a single `i64` nanosecond count. Every supported unit
//! is an exact multiple of a nanosecond, so values can be added, scaled and
//! compared without accumulating rounding error until the final conversion.
//!
//! Unlike `std::time::Duration` the value is signed: subtracting a later
//! reading from an earlier one yields a negative span instead of a panic.
//!
//! # Examples
//!
//! ```
//! use tickwork_common::time::Duration;
//!
//! let remaining = Duration::hours(3).sub(Duration::minutes(30)).unwrap();
//! assert_eq!(remaining.as_minutes(), 150);
//!
//! // Integer conversions truncate toward zero
//! assert_eq!(Duration::milliseconds(1500).as_secs(), 1);
//! assert!((Duration::milliseconds(1500).as_secs_f64() - 1.5).abs() < f64::EPSILON);
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use serde::{Deserialize, Serialize};

use super::error::{TimeError, TimeResult};
use super::format::format_duration;
use super::parse::{parse_duration, DurationParseError};

/// Nanoseconds in a nanosecond
pub const NANOS_PER_NANOSECOND: i64 = 1;
/// Nanoseconds in a microsecond
pub const NANOS_PER_MICROSECOND: i64 = NANOS_PER_NANOSECOND * 1_000;
/// Nanoseconds in a millisecond
pub const NANOS_PER_MILLISECOND: i64 = NANOS_PER_MICROSECOND * 1_000;
/// Nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = NANOS_PER_MILLISECOND * 1_000;
/// Nanoseconds in a minute
pub const NANOS_PER_MINUTE: i64 = NANOS_PER_SECOND * 60;
/// Nanoseconds in an hour
pub const NANOS_PER_HOUR: i64 = NANOS_PER_MINUTE * 60;
/// Nanoseconds in a day
pub const NANOS_PER_DAY: i64 = NANOS_PER_HOUR * 24;
/// Nanoseconds in a week
pub const NANOS_PER_WEEK: i64 = NANOS_PER_DAY * 7;

// 2^63: the first f64 value that no longer fits in an i64.
const I64_BOUND_F64: f64 = 9_223_372_036_854_775_808.0;

/// A named magnitude of time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeUnit {
    /// 1 ns
    Nanosecond,
    /// 1,000 ns
    Microsecond,
    /// 1,000 µs
    Millisecond,
    /// 1,000 ms
    Second,
    /// 60 s
    Minute,
    /// 60 min
    Hour,
    /// 24 h
    Day,
    /// 7 days
    Week,
}

impl TimeUnit {
    /// Every unit, smallest first
    pub const ALL: [Self; 8] = [
        Self::Nanosecond,
        Self::Microsecond,
        Self::Millisecond,
        Self::Second,
        Self::Minute,
        Self::Hour,
        Self::Day,
        Self::Week,
    ];

    /// Length of one unit in nanoseconds
    pub const fn nanos(self) -> i64 {
        match self {
            Self::Nanosecond => NANOS_PER_NANOSECOND,
            Self::Microsecond => NANOS_PER_MICROSECOND,
            Self::Millisecond => NANOS_PER_MILLISECOND,
            Self::Second => NANOS_PER_SECOND,
            Self::Minute => NANOS_PER_MINUTE,
            Self::Hour => NANOS_PER_HOUR,
            Self::Day => NANOS_PER_DAY,
            Self::Week => NANOS_PER_WEEK,
        }
    }

    /// Short suffix used when formatting and parsing
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Nanosecond => "ns",
            Self::Microsecond => "us",
            Self::Millisecond => "ms",
            Self::Second => "s",
            Self::Minute => "m",
            Self::Hour => "h",
            Self::Day => "d",
            Self::Week => "w",
        }
    }
}

/// An immutable, signed span of time stored as whole nanoseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Duration {
    nanos: i64,
}

impl Duration {
    /// The empty duration
    pub const ZERO: Self = Self { nanos: 0 };

    /// The largest representable duration (about 292 years)
    pub const MAX: Self = Self { nanos: i64::MAX };

    /// The most negative representable duration
    pub const MIN: Self = Self { nanos: i64::MIN };

    /// Build a duration from a raw nanosecond count
    pub const fn from_nanos(nanos: i64) -> Self {
        Self { nanos }
    }

    /// Checked construction of `quantity` units
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::ArithmeticOverflow`] when the nanosecond count
    /// does not fit in an `i64`.
    pub const fn of(quantity: i64, unit: TimeUnit) -> TimeResult<Self> {
        match quantity.checked_mul(unit.nanos()) {
            Some(nanos) => Ok(Self { nanos }),
            None => Err(TimeError::overflow("construction")),
        }
    }

    /// Fractional seconds rounded to the nearest nanosecond
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::ArithmeticOverflow`] when the value is not finite
    /// or does not fit.
    pub fn from_secs_f64(secs: f64) -> TimeResult<Self> {
        Self::from_f64_nanos((secs * 1e9).round()).ok_or(TimeError::overflow("construction"))
    }

    // Quantity constructors panic on overflow, like `std::time::Duration::new`.
    // Use `Duration::of` for untrusted magnitudes.
    #[allow(clippy::panic)]
    const fn scaled(quantity: i64, unit: TimeUnit) -> Self {
        match quantity.checked_mul(unit.nanos()) {
            Some(nanos) => Self { nanos },
            None => panic!("overflow when constructing Duration"),
        }
    }

    /// Exactly one nanosecond
    pub const fn nanosecond() -> Self {
        Self::from_nanos(NANOS_PER_NANOSECOND)
    }

    /// `quantity` nanoseconds
    pub const fn nanoseconds(quantity: i64) -> Self {
        Self::from_nanos(quantity)
    }

    /// Exactly one microsecond
    pub const fn microsecond() -> Self {
        Self::from_nanos(NANOS_PER_MICROSECOND)
    }

    /// `quantity` microseconds
    ///
    /// # Panics
    ///
    /// Panics if the nanosecond count overflows `i64`.
    pub const fn microseconds(quantity: i64) -> Self {
        Self::scaled(quantity, TimeUnit::Microsecond)
    }

    /// Exactly one millisecond
    pub const fn millisecond() -> Self {
        Self::from_nanos(NANOS_PER_MILLISECOND)
    }

    /// `quantity` milliseconds
    ///
    /// # Panics
    ///
    /// Panics if the nanosecond count overflows `i64`.
    pub const fn milliseconds(quantity: i64) -> Self {
        Self::scaled(quantity, TimeUnit::Millisecond)
    }

    /// Exactly one second
    pub const fn second() -> Self {
        Self::from_nanos(NANOS_PER_SECOND)
    }

    /// `quantity` seconds
    ///
    /// # Panics
    ///
    /// Panics if the nanosecond count overflows `i64`.
    pub const fn seconds(quantity: i64) -> Self {
        Self::scaled(quantity, TimeUnit::Second)
    }

    /// Exactly one minute
    pub const fn minute() -> Self {
        Self::from_nanos(NANOS_PER_MINUTE)
    }

    /// `quantity` minutes
    ///
    /// # Panics
    ///
    /// Panics if the nanosecond count overflows `i64`.
    pub const fn minutes(quantity: i64) -> Self {
        Self::scaled(quantity, TimeUnit::Minute)
    }

    /// Exactly one hour
    pub const fn hour() -> Self {
        Self::from_nanos(NANOS_PER_HOUR)
    }

    /// `quantity` hours
    ///
    /// # Panics
    ///
    /// Panics if the nanosecond count overflows `i64`.
    pub const fn hours(quantity: i64) -> Self {
        Self::scaled(quantity, TimeUnit::Hour)
    }

    /// Exactly one day
    pub const fn day() -> Self {
        Self::from_nanos(NANOS_PER_DAY)
    }

    /// `quantity` days
    ///
    /// # Panics
    ///
    /// Panics if the nanosecond count overflows `i64`.
    pub const fn days(quantity: i64) -> Self {
        Self::scaled(quantity, TimeUnit::Day)
    }

    /// Exactly one week
    pub const fn week() -> Self {
        Self::from_nanos(NANOS_PER_WEEK)
    }

    /// `quantity` weeks
    ///
    /// # Panics
    ///
    /// Panics if the nanosecond count overflows `i64`.
    pub const fn weeks(quantity: i64) -> Self {
        Self::scaled(quantity, TimeUnit::Week)
    }

    /// Whole units contained in this duration, truncated toward zero
    pub const fn as_unit(self, unit: TimeUnit) -> i64 {
        self.nanos / unit.nanos()
    }

    /// Fractional number of units in this duration
    #[allow(clippy::cast_precision_loss)]
    pub fn as_unit_f64(self, unit: TimeUnit) -> f64 {
        self.nanos as f64 / unit.nanos() as f64
    }

    /// Raw nanosecond count
    pub const fn as_nanos(self) -> i64 {
        self.nanos
    }

    /// Nanoseconds as a float
    pub fn as_nanos_f64(self) -> f64 {
        self.as_unit_f64(TimeUnit::Nanosecond)
    }

    /// Whole microseconds, truncated toward zero
    pub const fn as_micros(self) -> i64 {
        self.as_unit(TimeUnit::Microsecond)
    }

    /// Fractional microseconds
    pub fn as_micros_f64(self) -> f64 {
        self.as_unit_f64(TimeUnit::Microsecond)
    }

    /// Whole milliseconds, truncated toward zero
    pub const fn as_millis(self) -> i64 {
        self.as_unit(TimeUnit::Millisecond)
    }

    /// Fractional milliseconds
    pub fn as_millis_f64(self) -> f64 {
        self.as_unit_f64(TimeUnit::Millisecond)
    }

    /// Whole seconds, truncated toward zero
    pub const fn as_secs(self) -> i64 {
        self.as_unit(TimeUnit::Second)
    }

    /// Fractional seconds
    pub fn as_secs_f64(self) -> f64 {
        self.as_unit_f64(TimeUnit::Second)
    }

    /// Whole minutes, truncated toward zero
    pub const fn as_minutes(self) -> i64 {
        self.as_unit(TimeUnit::Minute)
    }

    /// Fractional minutes
    pub fn as_minutes_f64(self) -> f64 {
        self.as_unit_f64(TimeUnit::Minute)
    }

    /// Whole hours, truncated toward zero
    pub const fn as_hours(self) -> i64 {
        self.as_unit(TimeUnit::Hour)
    }

    /// Fractional hours
    pub fn as_hours_f64(self) -> f64 {
        self.as_unit_f64(TimeUnit::Hour)
    }

    /// Whole days, truncated toward zero
    pub const fn as_days(self) -> i64 {
        self.as_unit(TimeUnit::Day)
    }

    /// Fractional days
    pub fn as_days_f64(self) -> f64 {
        self.as_unit_f64(TimeUnit::Day)
    }

    /// Whole weeks, truncated toward zero
    pub const fn as_weeks(self) -> i64 {
        self.as_unit(TimeUnit::Week)
    }

    /// Fractional weeks
    pub fn as_weeks_f64(self) -> f64 {
        self.as_unit_f64(TimeUnit::Week)
    }

    /// Sum of two durations
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::ArithmeticOverflow`] if the sum leaves the `i64`
    /// range.
    #[allow(clippy::should_implement_trait)]
    pub fn add(self, other: Self) -> TimeResult<Self> {
        self.nanos.checked_add(other.nanos).map(Self::from_nanos).ok_or(TimeError::overflow("add"))
    }

    /// Difference of two durations
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::ArithmeticOverflow`] if the difference leaves the
    /// `i64` range.
    #[allow(clippy::should_implement_trait)]
    pub fn sub(self, other: Self) -> TimeResult<Self> {
        self.nanos.checked_sub(other.nanos).map(Self::from_nanos).ok_or(TimeError::overflow("sub"))
    }

    /// Sum clamped to [`Duration::MIN`]..=[`Duration::MAX`]
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self::from_nanos(self.nanos.saturating_add(other.nanos))
    }

    /// Difference clamped to [`Duration::MIN`]..=[`Duration::MAX`]
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self::from_nanos(self.nanos.saturating_sub(other.nanos))
    }

    /// Scale by an integer factor
    ///
    /// The product is checked for every sign combination, including the
    /// asymmetric `i64::MIN` bound: `MIN * 1` succeeds, `MIN * -1` fails.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::ArithmeticOverflow`] if the product does not fit.
    #[allow(clippy::should_implement_trait)]
    pub fn mul(self, factor: i64) -> TimeResult<Self> {
        self.nanos.checked_mul(factor).map(Self::from_nanos).ok_or(TimeError::overflow("mul"))
    }

    /// Scale by a floating-point factor, truncating toward zero
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::ArithmeticOverflow`] if the product falls outside
    /// the `i64` range or is not a number.
    ///
    /// Integral factors take the exact integer path, so `MAX * 1.0` is
    /// `MAX`. Products too large for `f64` to hold every integer are
    /// computed exactly.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::float_cmp)]
    pub fn mul_f64(self, factor: f64) -> TimeResult<Self> {
        if factor.fract() == 0.0 && (-I64_BOUND_F64..I64_BOUND_F64).contains(&factor) {
            return self.mul(factor as i64);
        }
        let product = self.nanos as f64 * factor;
        if product.abs() < F64_EXACT_INT_BOUND {
            return Self::from_f64_nanos(product).ok_or(TimeError::overflow("mul"));
        }
        exact_mul(self.nanos, factor).map(Self::from_nanos).ok_or(TimeError::overflow("mul"))
    }

    /// Divide by an integer, truncating toward zero
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::DivisionByZero`] for a zero divisor and
    /// [`TimeError::ArithmeticOverflow`] for `MIN / -1`.
    #[allow(clippy::should_implement_trait)]
    pub fn div(self, divisor: i64) -> TimeResult<Self> {
        if divisor == 0 {
            return Err(TimeError::DivisionByZero);
        }
        self.nanos.checked_div(divisor).map(Self::from_nanos).ok_or(TimeError::overflow("div"))
    }

    /// Divide by a float, truncating toward zero
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::DivisionByZero`] for a zero divisor and
    /// [`TimeError::ArithmeticOverflow`] if the quotient does not fit.
    #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
    pub fn div_f64(self, divisor: f64) -> TimeResult<Self> {
        if divisor == 0.0 {
            return Err(TimeError::DivisionByZero);
        }
        let quotient = self.nanos as f64 / divisor;
        Self::from_f64_nanos(quotient).ok_or(TimeError::overflow("div"))
    }

    /// Absolute value
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::ArithmeticOverflow`] for [`Duration::MIN`].
    pub fn abs(self) -> TimeResult<Self> {
        self.nanos.checked_abs().map(Self::from_nanos).ok_or(TimeError::overflow("abs"))
    }

    /// `true` for spans shorter than zero
    pub const fn is_negative(self) -> bool {
        self.nanos < 0
    }

    /// `true` for the empty span
    pub const fn is_zero(self) -> bool {
        self.nanos == 0
    }

    /// Same nanosecond count
    pub const fn equals(self, other: Self) -> bool {
        self.nanos == other.nanos
    }

    /// Strictly longer than `other`
    pub const fn greater_than(self, other: Self) -> bool {
        self.nanos > other.nanos
    }

    /// Strictly shorter than `other`
    pub const fn less_than(self, other: Self) -> bool {
        self.nanos < other.nanos
    }

    /// The longer of the two; ties return `self`
    #[must_use]
    pub const fn max(self, other: Self) -> Self {
        if self.nanos >= other.nanos {
            self
        } else {
            other
        }
    }

    /// The shorter of the two; ties return `self`
    #[must_use]
    pub const fn min(self, other: Self) -> Self {
        if self.nanos <= other.nanos {
            self
        } else {
            other
        }
    }

    /// Convert to `std::time::Duration`, `None` when negative
    #[allow(clippy::cast_sign_loss)]
    pub fn to_std(self) -> Option<StdDuration> {
        if self.nanos < 0 {
            return None;
        }
        Some(StdDuration::from_nanos(self.nanos as u64))
    }

    /// Convert to `std::time::Duration`, clamping negative spans to zero
    pub fn to_std_saturating(self) -> StdDuration {
        self.to_std().unwrap_or(StdDuration::ZERO)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_f64_nanos(nanos: f64) -> Option<Self> {
        // Written so that NaN fails the range check.
        if nanos >= -I64_BOUND_F64 && nanos < I64_BOUND_F64 {
            Some(Self::from_nanos(nanos.trunc() as i64))
        } else {
            None
        }
    }
}

// 2^53: past this an f64 product no longer lands on every integer.
const F64_EXACT_INT_BOUND: f64 = 9_007_199_254_740_992.0;

/// `nanos * factor` truncated toward zero, without intermediate rounding
///
/// The factor is split into its integer mantissa and binary exponent; the
/// mantissa product needs at most 117 bits.
#[allow(clippy::cast_possible_truncation)]
fn exact_mul(nanos: i64, factor: f64) -> Option<i64> {
    if !factor.is_finite() {
        return None;
    }
    let bits = factor.to_bits();
    let biased_exp = ((bits >> 52) & 0x7ff) as i32;
    let fraction = i128::from(bits & ((1_u64 << 52) - 1));
    let (mantissa, exp) = if biased_exp == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1_i128 << 52), biased_exp - 1075)
    };
    let mantissa = if bits >> 63 == 1 { -mantissa } else { mantissa };

    let product = i128::from(nanos) * mantissa;
    let scaled = if product == 0 {
        0
    } else if exp >= 0 {
        if exp >= 64 {
            return None;
        }
        product.checked_mul(1_i128 << exp)?
    } else if exp <= -127 {
        0
    } else {
        product / (1_i128 << -exp)
    };
    i64::try_from(scaled).ok()
}

impl TryFrom<StdDuration> for Duration {
    type Error = TimeError;

    fn try_from(value: StdDuration) -> Result<Self, Self::Error> {
        i64::try_from(value.as_nanos())
            .map(Self::from_nanos)
            .map_err(|_| TimeError::overflow("conversion"))
    }
}

// Negative spans have no unsigned counterpart.
impl TryFrom<Duration> for StdDuration {
    type Error = TimeError;

    fn try_from(value: Duration) -> Result<Self, Self::Error> {
        value.to_std().ok_or(TimeError::overflow("conversion to std"))
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_duration(*self))
    }
}

impl FromStr for Duration {
    type Err = DurationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_duration(s)
    }
}
