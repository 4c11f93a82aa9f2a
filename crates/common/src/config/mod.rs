//! Clock configuration
//!
//! [`TimeConfig`] decides how a process starts its clock (real or mocked,
//! and from which timestamp) along with the defaults used by date parsing
//! and log output.
//!
//! ## Sources
//! - Defaults: real time, UTC, 255-byte log truncation
//! - TOML: [`TimeConfig::from_toml_str`]
//! - Environment: [`TimeConfig::from_env`]
//! - Code: [`TimeConfig::builder`]
//!
//! ## Environment Variables
//! - `TICKWORK_MOCK_TIME`: start mocked at this Unix timestamp, or at the
//!   current time when set to `now`
//! - `TICKWORK_LOG_TRUNCATE_LEN`: byte limit for truncated log values
//! - `TICKWORK_TIMEZONE`: IANA zone for strings without an offset

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::date::{parse_timezone, DateUtils};
use crate::error::{CommonError, CommonResult};
use crate::time::clock::I64_BOUND_F64;
use crate::time::{global, Clock, MockableClock};
use crate::utils::log::{truncate, DEFAULT_TRUNCATE_LEN};

pub const ENV_MOCK_TIME: &str = "TICKWORK_MOCK_TIME";
pub const ENV_LOG_TRUNCATE_LEN: &str = "TICKWORK_LOG_TRUNCATE_LEN";
pub const ENV_TIMEZONE: &str = "TICKWORK_TIMEZONE";

/// Clock configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeConfig {
    /// Virtual start timestamp in seconds; `None` starts from real time
    pub mock_start_secs: Option<f64>,

    /// Start the clock in mocked mode (default: false)
    pub start_mocked: bool,

    /// Byte limit for values passed through log truncation (default: 255)
    pub log_truncate_len: usize,

    /// IANA zone for date strings without an offset (default: "UTC")
    pub default_timezone: String,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            mock_start_secs: None,
            start_mocked: false,
            log_truncate_len: DEFAULT_TRUNCATE_LEN,
            default_timezone: "UTC".to_string(),
        }
    }
}

impl TimeConfig {
    /// Create a builder for the configuration
    pub fn builder() -> TimeConfigBuilder {
        TimeConfigBuilder::default()
    }

    /// Parse and validate a TOML document
    ///
    /// ```
    /// use tickwork_common::config::TimeConfig;
    ///
    /// let config = TimeConfig::from_toml_str(
    ///     r#"
    ///     start_mocked = true
    ///     mock_start_secs = 0.0
    ///     default_timezone = "Europe/Paris"
    ///     "#,
    /// )
    /// .unwrap();
    /// assert!(config.start_mocked);
    /// assert_eq!(config.log_truncate_len, 255);
    /// ```
    ///
    /// # Errors
    /// Returns `CommonError::Serialization` for malformed TOML and
    /// `CommonError::Config` for invalid values.
    pub fn from_toml_str(document: &str) -> CommonResult<Self> {
        let config: Self = toml::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from process environment variables
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    /// Returns `CommonError::Config` if a variable holds an invalid value.
    pub fn from_env() -> CommonResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup
    ///
    /// # Errors
    /// Returns `CommonError::Config` if a variable holds an invalid value.
    pub fn from_lookup<F>(lookup: F) -> CommonResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_MOCK_TIME) {
            config.start_mocked = true;
            config.mock_start_secs = if raw.trim().eq_ignore_ascii_case("now") {
                None
            } else {
                Some(raw.trim().parse::<f64>().map_err(|e| {
                    CommonError::config_field(ENV_MOCK_TIME, format!("Invalid timestamp: {e}"))
                })?)
            };
        }

        if let Some(raw) = lookup(ENV_LOG_TRUNCATE_LEN) {
            config.log_truncate_len = raw.trim().parse::<usize>().map_err(|e| {
                CommonError::config_field(ENV_LOG_TRUNCATE_LEN, format!("Invalid length: {e}"))
            })?;
        }

        if let Some(raw) = lookup(ENV_TIMEZONE) {
            config.default_timezone = raw.trim().to_string();
        }

        config.validate()?;
        debug!(start_mocked = config.start_mocked, "time configuration loaded from environment");
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns `CommonError::Config` naming the offending field.
    pub fn validate(&self) -> CommonResult<()> {
        if let Some(secs) = self.mock_start_secs {
            if !secs.is_finite() || !(-I64_BOUND_F64..I64_BOUND_F64).contains(&secs) {
                return Err(CommonError::config_field(
                    "mock_start_secs",
                    format!("{secs} is outside the representable range of a mocked clock"),
                ));
            }
        }

        if self.log_truncate_len == 0 {
            return Err(CommonError::config_field(
                "log_truncate_len",
                "log_truncate_len must be greater than 0",
            ));
        }

        self.timezone()?;
        Ok(())
    }

    /// The configured default timezone
    ///
    /// # Errors
    /// Returns `CommonError::Config` for names missing from the tz database.
    pub fn timezone(&self) -> CommonResult<Tz> {
        parse_timezone(&self.default_timezone)
            .map_err(|e| CommonError::config_field("default_timezone", e.to_string()))
    }

    /// Truncate `value` to the configured log length
    pub fn truncate_for_log<'a>(&self, value: &'a str) -> std::borrow::Cow<'a, str> {
        truncate(value, self.log_truncate_len)
    }

    /// Build a standalone switchable clock in the configured mode
    ///
    /// # Errors
    /// Returns `CommonError::Config` if the configuration is invalid.
    pub fn build_clock(&self) -> CommonResult<MockableClock> {
        self.validate()?;
        let clock = MockableClock::new();
        if self.start_mocked {
            clock.enable_mocking(self.mock_start_secs);
        }
        Ok(clock)
    }

    /// Put the process-wide clock into the configured mode
    ///
    /// # Errors
    /// Returns `CommonError::Config` if the configuration is invalid; the
    /// process clock is left untouched in that case.
    pub fn apply_global(&self) -> CommonResult<()> {
        self.validate()?;
        if self.start_mocked {
            global::enable_mocking(self.mock_start_secs);
        } else {
            global::disable_mocking();
        }
        info!(
            mocked = self.start_mocked,
            timezone = %self.default_timezone,
            "process clock configured"
        );
        Ok(())
    }

    /// Date helpers over `clock` using the configured timezone
    ///
    /// # Errors
    /// Returns `CommonError::Config` for an unknown timezone.
    pub fn date_utils<C: Clock>(&self, clock: C) -> CommonResult<DateUtils<C>> {
        Ok(DateUtils::with_timezone(clock, self.timezone()?))
    }
}

/// Builder for TimeConfig with validation
#[derive(Debug, Default)]
pub struct TimeConfigBuilder {
    config: TimeConfig,
}

impl TimeConfigBuilder {
    /// Start mocked at `timestamp` seconds
    pub fn mocked_at(mut self, timestamp: f64) -> Self {
        self.config.start_mocked = true;
        self.config.mock_start_secs = Some(timestamp);
        self
    }

    /// Start mocked at the real current time
    pub fn mocked_now(mut self) -> Self {
        self.config.start_mocked = true;
        self.config.mock_start_secs = None;
        self
    }

    /// Set the log truncation length
    pub fn log_truncate_len(mut self, len: usize) -> Self {
        self.config.log_truncate_len = len;
        self
    }

    /// Set the default timezone
    pub fn default_timezone<S: Into<String>>(mut self, name: S) -> Self {
        self.config.default_timezone = name.into();
        self
    }

    /// Build and validate the configuration
    ///
    /// # Errors
    /// Returns `CommonError::Config` naming the offending field.
    pub fn build(self) -> CommonResult<TimeConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for config.
    use std::collections::HashMap;

    use super::*;
    use crate::testing::time::GlobalClockGuard;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = TimeConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.start_mocked);
        assert_eq!(config.timezone().unwrap(), Tz::UTC);
    }

    #[test]
    fn test_builder() {
        let config = TimeConfig::builder()
            .mocked_at(100.0)
            .log_truncate_len(16)
            .default_timezone("Asia/Tokyo")
            .build()
            .unwrap();
        assert_eq!(config.mock_start_secs, Some(100.0));
        assert_eq!(config.timezone().unwrap(), Tz::Asia__Tokyo);
        assert!(config.truncate_for_log(&"x".repeat(40)).contains("40 bytes total"));
    }

    /// Validates field-level rejection.
    ///
    /// Assertions:
    /// - Out-of-range timestamps, zero lengths and unknown zones each name
    ///   their field.
    #[test]
    fn test_validate_rejects_bad_values() {
        let cases = [
            (TimeConfig::builder().mocked_at(f64::NAN), "mock_start_secs"),
            (TimeConfig::builder().mocked_at(1e19), "mock_start_secs"),
            (TimeConfig::builder().log_truncate_len(0), "log_truncate_len"),
            (TimeConfig::builder().default_timezone("Nowhere/Land"), "default_timezone"),
        ];
        for (builder, expected_field) in cases {
            match builder.build() {
                Err(CommonError::Config { field: Some(field), .. }) => {
                    assert_eq!(field, expected_field);
                }
                other => panic!("expected config error for {expected_field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_from_toml() {
        let config = TimeConfig::from_toml_str(
            r#"
            start_mocked = true
            mock_start_secs = 1700000000.5
            log_truncate_len = 64
            "#,
        )
        .unwrap();
        assert_eq!(config.mock_start_secs, Some(1_700_000_000.5));
        assert_eq!(config.log_truncate_len, 64);
        assert_eq!(config.default_timezone, "UTC");
    }

    #[test]
    fn test_from_toml_errors() {
        let err = TimeConfig::from_toml_str("start_mocked = \"yes\"").unwrap_err();
        assert!(matches!(err, CommonError::Serialization { .. }));

        let err = TimeConfig::from_toml_str("unknown_key = 1").unwrap_err();
        assert!(matches!(err, CommonError::Serialization { .. }));

        let err = TimeConfig::from_toml_str("default_timezone = \"Mars/Base\"").unwrap_err();
        assert!(matches!(err, CommonError::Config { .. }));
    }

    #[test]
    fn test_from_lookup() {
        let config = TimeConfig::from_lookup(lookup_from(&[
            (ENV_MOCK_TIME, "42.5"),
            (ENV_LOG_TRUNCATE_LEN, "32"),
            (ENV_TIMEZONE, "Europe/Berlin"),
        ]))
        .unwrap();
        assert!(config.start_mocked);
        assert_eq!(config.mock_start_secs, Some(42.5));
        assert_eq!(config.log_truncate_len, 32);
        assert_eq!(config.timezone().unwrap(), Tz::Europe__Berlin);

        let now = TimeConfig::from_lookup(lookup_from(&[(ENV_MOCK_TIME, "now")])).unwrap();
        assert!(now.start_mocked);
        assert_eq!(now.mock_start_secs, None);

        let empty = TimeConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(empty, TimeConfig::default());
    }

    #[test]
    fn test_from_lookup_invalid_values() {
        let err = TimeConfig::from_lookup(lookup_from(&[(ENV_MOCK_TIME, "yesterday")])).unwrap_err();
        assert!(err.to_string().contains(ENV_MOCK_TIME));

        let err =
            TimeConfig::from_lookup(lookup_from(&[(ENV_LOG_TRUNCATE_LEN, "-1")])).unwrap_err();
        assert!(err.to_string().contains(ENV_LOG_TRUNCATE_LEN));
    }

    #[test]
    fn test_build_clock() {
        let real = TimeConfig::default().build_clock().unwrap();
        assert!(!real.is_mocked());

        let mocked = TimeConfig::builder().mocked_at(0.0).build().unwrap().build_clock().unwrap();
        mocked.sleep_secs(60).unwrap();
        assert_eq!(mocked.now_secs(), 60);
    }

    #[test]
    fn test_apply_global() {
        let _guard = GlobalClockGuard::mocked_at(5.0);

        TimeConfig::default().apply_global().unwrap();
        assert!(!global::is_mocked());

        TimeConfig::builder().mocked_at(7.0).build().unwrap().apply_global().unwrap();
        assert_eq!(global::now_secs(), 7);

        // Invalid configuration leaves the clock alone
        let invalid = TimeConfig { log_truncate_len: 0, ..TimeConfig::default() };
        assert!(invalid.apply_global().is_err());
        assert_eq!(global::now_secs(), 7);
    }

    #[test]
    fn test_date_utils_uses_timezone() {
        use chrono::Timelike;

        let config = TimeConfig::builder().default_timezone("Asia/Tokyo").build().unwrap();
        let dates = config.date_utils(crate::time::MockClock::at(0.0)).unwrap();
        let parsed = dates.parse("1970-01-01 09:00:00").unwrap();
        assert_eq!(parsed.timestamp(), 0);
        assert_eq!(parsed.hour(), 9);
    }
}
