//! Human-readable duration formatting
//!
//! Renders [`Duration`] values as short strings for logs and diagnostics.
//! Negative spans are prefixed with `-`.

use super::duration::{Duration, NANOS_PER_MICROSECOND, NANOS_PER_MILLISECOND, NANOS_PER_SECOND};

const SECS_PER_DAY: u64 = 86_400;

// Magnitude split into whole seconds and the sub-second remainder.
#[allow(clippy::cast_sign_loss)]
fn split(duration: Duration) -> (&'static str, u64, u64) {
    let sign = if duration.is_negative() { "-" } else { "" };
    let magnitude = duration.as_nanos().unsigned_abs();
    let per_sec = NANOS_PER_SECOND as u64;
    (sign, magnitude / per_sec, magnitude % per_sec)
}

fn sub_second(nanos: u64) -> (u64, &'static str) {
    let per_milli = NANOS_PER_MILLISECOND as u64;
    let per_micro = NANOS_PER_MICROSECOND as u64;
    if nanos >= per_milli {
        (nanos / per_milli, "ms")
    } else if nanos >= per_micro {
        (nanos / per_micro, "us")
    } else {
        (nanos, "ns")
    }
}

/// Format a duration into a human-readable string
///
/// Spans under a second are shown in the largest whole sub-second unit;
/// longer spans are broken into days, hours, minutes and seconds starting
/// at the first non-zero component.
///
/// # Examples
///
/// ```
/// use tickwork_common::time::format::format_duration;
/// use tickwork_common::time::Duration;
///
/// assert_eq!(format_duration(Duration::seconds(5)), "5s");
/// assert_eq!(format_duration(Duration::seconds(65)), "1m 5s");
/// assert_eq!(format_duration(Duration::seconds(3665)), "1h 1m 5s");
/// assert_eq!(format_duration(Duration::milliseconds(-250)), "-250ms");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let (sign, total_secs, nanos) = split(duration);

    if total_secs == 0 {
        let (value, suffix) = sub_second(nanos);
        return format!("{sign}{value}{suffix}");
    }

    let days = total_secs / SECS_PER_DAY;
    let hours = (total_secs % SECS_PER_DAY) / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    let components = [(days, "d"), (hours, "h"), (minutes, "m"), (seconds, "s")];
    let start_index =
        components.iter().position(|(value, _)| *value > 0).unwrap_or(components.len() - 1);

    let body = components[start_index..]
        .iter()
        .map(|(value, suffix)| format!("{value}{suffix}"))
        .collect::<Vec<_>>()
        .join(" ");

    format!("{sign}{body}")
}

/// Format a duration as a compact string (e.g., "1h30m0s")
///
/// # Examples
///
/// ```
/// use tickwork_common::time::format::format_duration_compact;
/// use tickwork_common::time::Duration;
///
/// assert_eq!(format_duration_compact(Duration::seconds(5400)), "1h30m0s");
/// ```
pub fn format_duration_compact(duration: Duration) -> String {
    format_duration(duration).replace(' ', "")
}

/// Format a duration in a verbose, human-friendly way
///
/// # Examples
///
/// ```
/// use tickwork_common::time::format::format_duration_verbose;
/// use tickwork_common::time::Duration;
///
/// assert_eq!(format_duration_verbose(Duration::seconds(65)), "1 minute 5 seconds");
/// assert_eq!(format_duration_verbose(Duration::millisecond()), "1 millisecond");
/// ```
pub fn format_duration_verbose(duration: Duration) -> String {
    let (sign, total_secs, nanos) = split(duration);
    let plural = |n: u64| if n == 1 { "" } else { "s" };

    if total_secs == 0 {
        let (value, suffix) = sub_second(nanos);
        let name = match suffix {
            "ms" => "millisecond",
            "us" => "microsecond",
            _ => "nanosecond",
        };
        return format!("{sign}{value} {name}{}", plural(value));
    }

    let days = total_secs / SECS_PER_DAY;
    let hours = (total_secs % SECS_PER_DAY) / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    let mut parts = Vec::new();

    if days > 0 {
        parts.push(format!("{} day{}", days, plural(days)));
    }
    if hours > 0 {
        parts.push(format!("{} hour{}", hours, plural(hours)));
    }
    if minutes > 0 {
        parts.push(format!("{} minute{}", minutes, plural(minutes)));
    }
    if seconds > 0 || parts.is_empty() {
        parts.push(format!("{} second{}", seconds, plural(seconds)));
    }

    format!("{sign}{}", parts.join(" "))
}
