//! Host capability checks, evaluated once per process

use once_cell::sync::OnceCell;
use tracing::trace;

use super::error::{TimeError, TimeResult};

const REQUIRED_BITS: u32 = 64;

static NATIVE_I64_NANOS: OnceCell<bool> = OnceCell::new();

/// Width of the host's native integer in bits
pub const fn native_int_bits() -> u32 {
    usize::BITS
}

/// Whether a nanosecond timer reading fits the host's native integer
///
/// The answer is computed on first use and memoized.
pub fn supports_native_i64_nanos() -> bool {
    *NATIVE_I64_NANOS.get_or_init(|| {
        let supported = native_int_bits() >= REQUIRED_BITS;
        trace!(native_bits = native_int_bits(), supported, "probed integer nanosecond timer support");
        supported
    })
}

/// Fail with [`TimeError::UnsupportedPlatform`] on narrow-integer hosts
pub(crate) fn require_native_i64_nanos() -> TimeResult<()> {
    if supports_native_i64_nanos() {
        Ok(())
    } else {
        Err(TimeError::UnsupportedPlatform {
            required_bits: REQUIRED_BITS,
            actual_bits: native_int_bits(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_matches_pointer_width() {
        assert_eq!(supports_native_i64_nanos(), cfg!(target_pointer_width = "64"));
        // Memoized answer is stable
        assert_eq!(supports_native_i64_nanos(), supports_native_i64_nanos());
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_require_passes_on_wide_hosts() {
        assert!(require_native_i64_nanos().is_ok());
    }
}
