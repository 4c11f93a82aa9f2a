//! Integration tests for the `time` module.
//!
//! These tests drive the public clock and duration APIs the way downstream
//! crates do: the process-wide clock toggled between real and virtual time,
//! clocks injected behind `Arc<dyn Clock>`, checked duration arithmetic, and
//! duration strings flowing through parsing and formatting.

#![cfg(feature = "runtime")]

use std::sync::{Arc, Once};
use std::thread;
use std::time::Duration as StdDuration;

use tickwork_common::testing::assertions::{assert_approx_eq, assert_microtime_layout};
use tickwork_common::testing::GlobalClockGuard;
use tickwork_common::time::{
    format_duration, format_duration_compact, format_duration_verbose, global, parse_duration,
    Clock, Deadline, Duration, DurationParseError, HrTime, MockClock, MockableClock, SystemClock,
    TimeError, TimeUnit,
};
use tickwork_common::{assert_error_contains, ErrorClassification};

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Sleeping a minute on the mocked process clock moves it by exactly one
/// minute and returns the "no time left" value.
#[test]
fn test_global_mocked_minute() {
    init_tracing();
    let _guard = GlobalClockGuard::mocked_at(0.0);

    assert_eq!(global::sleep_secs(60).unwrap(), 0);
    assert_eq!(global::now_secs(), 60);
    assert_eq!(global::now(), Duration::minutes(1));
    assert_eq!(global::microtime_string(), "0.000000 60");
}

/// Hours and minutes compose through checked arithmetic and the sum can be
/// slept on the process clock.
#[test]
fn test_hours_minus_minutes_on_global_clock() {
    let _guard = GlobalClockGuard::mocked_at(0.0);

    let span = Duration::hours(3).sub(Duration::minutes(30)).unwrap();
    assert_eq!(span, Duration::minutes(150));
    assert_eq!(span.as_hours(), 2);
    assert_approx_eq(span.as_hours_f64(), 2.5, 0.0);

    global::sleep(span).unwrap();
    assert_eq!(global::now_secs(), 9_000);
    assert_eq!(global::hrtime(), HrTime { secs: 9_000, nanos: 0 });
}

/// Microsecond sleeps land on exact high-resolution readings.
#[test]
fn test_sleep_micros_high_resolution() {
    let _guard = GlobalClockGuard::mocked_at(0.0);

    global::sleep_micros(1_005_000).unwrap();
    assert_eq!(global::hrtime(), HrTime { secs: 1, nanos: 5_000_000 });
    assert_eq!(global::hrtime_nanos().unwrap(), 1_005_000_000);
    assert_approx_eq(global::hrtime_nanos_f64(), 1_005_000_000.0, 1e-3);
    assert_eq!(global::microtime_string(), "0.005000 1");
}

/// Enabling twice resets the virtual time in place; disabling is
/// unconditional and returns the process clock to wall time.
#[test]
fn test_global_state_machine() {
    let guard = GlobalClockGuard::mocked_at(1_000.0);
    let handle = guard.mock().clone();

    global::enable_mocking(Some(2_000.0));
    assert_eq!(handle.timestamp(), 2_000.0);
    assert!(global::is_mocked());

    global::disable_mocking();
    global::disable_mocking();
    assert!(!global::is_mocked());
    assert!(global::now_secs() > 1_600_000_000);
    assert_microtime_layout(&global::microtime_string());

    // The detached handle still works but no longer drives the process clock
    handle.advance(Duration::days(1));
    assert_eq!(handle.timestamp(), 88_400.0);
    assert!(global::now_secs() > 1_600_000_000);
}

/// Code written against `Arc<dyn Clock>` runs unchanged on real and mocked
/// clocks.
#[test]
fn test_injected_clocks() {
    fn elapsed_after_sleep(clock: &Arc<dyn Clock>, span: Duration) -> Duration {
        let start = clock.now();
        clock.sleep(span).unwrap();
        clock.now().sub(start).unwrap()
    }

    let mocked: Arc<dyn Clock> = Arc::new(MockClock::at(10.0));
    assert_eq!(elapsed_after_sleep(&mocked, Duration::hours(5)), Duration::hours(5));

    let real: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let elapsed = elapsed_after_sleep(&real, Duration::milliseconds(20));
    assert!(elapsed >= Duration::milliseconds(19), "slept only {elapsed}");
}

/// A switchable clock owned by a component follows its own mode,
/// independently of the process clock.
#[test]
fn test_standalone_mockable_clock() {
    let clock = Arc::new(MockableClock::new());
    assert!(!clock.is_mocked());

    let mock = clock.enable_mocking(Some(-0.25));
    assert_eq!(clock.microtime_string(), "0.750000 -1");
    assert_eq!(clock.now_secs(), 0);

    let worker = {
        let clock = Arc::clone(&clock);
        thread::spawn(move || clock.sleep_secs(30).unwrap())
    };
    assert_eq!(worker.join().unwrap(), 0);
    assert_approx_eq(mock.timestamp(), 29.75, 1e-9);

    clock.disable_mocking();
    assert!(clock.now_secs() > 1_600_000_000);
}

/// Interrupting a real sleep is reported with the time left, and the error
/// tells callers when to retry.
#[test]
fn test_interrupted_real_sleep() {
    init_tracing();
    let clock = SystemClock::new();
    let interrupter = clock.interrupter();

    let waker = thread::spawn(move || {
        thread::sleep(StdDuration::from_millis(50));
        interrupter.interrupt();
    });

    let err = clock.sleep(Duration::seconds(30)).unwrap_err();
    waker.join().unwrap();

    match &err {
        TimeError::InterruptedWait { remaining } => {
            assert!(*remaining > StdDuration::from_secs(20));
            assert!(err.is_retryable());
            assert_eq!(err.retry_after(), Some(*remaining));
        }
        other => panic!("expected an interrupted wait, got {other:?}"),
    }
}

/// Deadlines measured on a mocked clock expire exactly when the virtual
/// time passes them.
#[test]
fn test_deadline_on_global_clock() {
    let _guard = GlobalClockGuard::mocked_at(100.0);
    let clock = global::clock();

    let deadline = Deadline::after(clock, Duration::seconds(90)).unwrap();
    global::sleep_secs(60).unwrap();
    assert_eq!(deadline.remaining(clock), Duration::seconds(30));

    deadline.sleep_until(clock).unwrap();
    assert!(deadline.is_expired(clock));
    assert_eq!(global::now_secs(), 190);
}

/// Unit conversions truncate toward zero and scale exactly.
#[test]
fn test_unit_conversions() {
    assert_eq!(Duration::milliseconds(1_500).as_secs(), 1);
    assert_eq!(Duration::milliseconds(-1_500).as_secs(), -1);

    for n in [-86_400, -1, 0, 1, 59, 3_600, 1_000_000] {
        assert_eq!(Duration::seconds(n).as_millis(), n * 1_000);
        assert_eq!(Duration::seconds(n).as_unit(TimeUnit::Microsecond), n * 1_000_000);
    }

    assert_eq!(Duration::weeks(2).as_days(), 14);
    assert_eq!(Duration::of(36, TimeUnit::Hour).unwrap().as_days(), 1);
    assert_approx_eq(Duration::minutes(90).as_hours_f64(), 1.5, 0.0);
}

/// Multiplication detects overflow in both directions, including the
/// asymmetric `MIN`.
#[test]
fn test_multiplication_overflow_table() {
    let cases: [(Duration, i64, bool); 8] = [
        (Duration::MAX, 1, true),
        (Duration::MIN, 1, true),
        (Duration::MAX, -1, true),
        (Duration::MIN, -1, false),
        (Duration::MAX, 2, false),
        (Duration::MIN, 2, false),
        (Duration::seconds(3), -4, true),
        (Duration::days(53_375), 2, true),
    ];

    for (duration, factor, fits) in cases {
        let product = duration.mul(factor);
        assert_eq!(product.is_ok(), fits, "{duration:?} * {factor}");
        if !fits {
            assert_error_contains!(product, "overflow");
        }
    }

    assert!(Duration::second().mul_f64(f64::NAN).is_err());
    assert!(Duration::weeks(1).mul_f64(1e12).is_err());
    assert_eq!(Duration::seconds(10).div(0), Err(TimeError::DivisionByZero));
    assert_eq!(Duration::seconds(10).div_f64(4.0).unwrap(), Duration::milliseconds(2_500));
}

/// Durations round-trip through text in every layout the crate produces.
#[test]
fn test_duration_parsing_and_formatting() {
    let cases = [
        ("45s", Duration::seconds(45), "45s", "45s", "45 seconds"),
        ("2h 30m", Duration::seconds(9_000), "2h 30m 0s", "2h30m0s", "2 hours 30 minutes"),
        (
            "1d 1h 1m 1s",
            Duration::seconds(90_061),
            "1d 1h 1m 1s",
            "1d1h1m1s",
            "1 day 1 hour 1 minute 1 second",
        ),
        ("0.5s", Duration::milliseconds(500), "500ms", "500ms", "500 milliseconds"),
        ("-1.5h", Duration::minutes(-90), "-1h 30m 0s", "-1h30m0s", "-1 hour 30 minutes"),
    ];

    for (input, expected_duration, expected_format, expected_compact, expected_verbose) in cases {
        let parsed = parse_duration(input).unwrap();
        assert_eq!(parsed, expected_duration, "parsed duration mismatch for input {input}");
        assert_eq!(format_duration(parsed), expected_format, "format mismatch for {input}");
        assert_eq!(format_duration_compact(parsed), expected_compact, "compact mismatch");
        assert_eq!(format_duration_verbose(parsed), expected_verbose, "verbose mismatch");
        assert_eq!(parsed.to_string(), expected_format);
        assert_eq!(expected_format.parse::<Duration>().unwrap(), parsed);
    }

    assert_eq!(
        parse_duration("15"),
        Err(DurationParseError::InvalidFormat("Missing unit after number".to_string()))
    );
    let err: TimeError = parse_duration("3 fortnights").unwrap_err().into();
    assert!(matches!(err, TimeError::InvalidDuration(DurationParseError::UnknownUnit(_))));
}
