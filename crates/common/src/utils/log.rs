//! Helpers for keeping log lines readable

use std::borrow::Cow;

/// Environment variable that disables [`truncate`] when set to a non-empty,
/// non-`"0"` value
pub const NO_TRUNCATE_ENV: &str = "NO_TRUNCATE_LOG";

/// Default cut-off used by callers that do not configure one
pub const DEFAULT_TRUNCATE_LEN: usize = 255;

/// Shorten `s` to at most `max_len` bytes for logging
///
/// The cut never splits a UTF-8 character, and the result records the
/// original byte length. Strings that already fit are borrowed unchanged.
///
/// # Examples
///
/// ```
/// use tickwork_common::utils::log::truncate;
///
/// assert_eq!(truncate("short", 10), "short");
/// assert_eq!(
///     truncate("abcdef", 3),
///     "abc ... (truncated: 6 bytes total. Set NO_TRUNCATE_LOG=1 to disable.)"
/// );
/// ```
pub fn truncate(s: &str, max_len: usize) -> Cow<'_, str> {
    if s.len() <= max_len || truncation_disabled() {
        return Cow::Borrowed(s);
    }
    Cow::Owned(truncate_unchecked(s, max_len))
}

fn truncation_disabled() -> bool {
    std::env::var(NO_TRUNCATE_ENV).is_ok_and(|value| !value.is_empty() && value != "0")
}

fn truncate_unchecked(s: &str, max_len: usize) -> String {
    let mut cut = max_len;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!(
        "{} ... (truncated: {} bytes total. Set {}=1 to disable.)",
        &s[..cut],
        s.len(),
        NO_TRUNCATE_ENV
    )
}
