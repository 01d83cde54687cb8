//! Expiry helpers
//!
//! Time units for TTL queries and the sentinel values returned for keys
//! without a TTL or without a value.

use std::fmt;
use std::time::Duration;

/// Remaining-TTL sentinel for a key that does not exist.
pub const TTL_KEY_MISSING: i64 = -2;

/// Remaining-TTL sentinel for a key that exists but never expires.
pub const TTL_PERSISTENT: i64 = -1;

/// Granularity in which a remaining TTL is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    fn millis_per_unit(self) -> i64 {
        match self {
            TimeUnit::Milliseconds => 1,
            TimeUnit::Seconds => 1_000,
            TimeUnit::Minutes => 60_000,
            TimeUnit::Hours => 3_600_000,
            TimeUnit::Days => 86_400_000,
        }
    }

    /// Converts a millisecond TTL into this unit, truncating.
    ///
    /// Negative values are the store's sentinels (-1, -2) and pass through
    /// unchanged.
    pub fn from_millis(self, ttl_ms: i64) -> i64 {
        if ttl_ms < 0 {
            ttl_ms
        } else {
            ttl_ms / self.millis_per_unit()
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Seconds => "s",
            TimeUnit::Minutes => "min",
            TimeUnit::Hours => "h",
            TimeUnit::Days => "d",
        };
        f.write_str(name)
    }
}

/// Milliseconds in a duration, clamped to `i64`.
pub(crate) fn duration_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_millis_truncates() {
        assert_eq!(TimeUnit::Seconds.from_millis(9_999), 9);
        assert_eq!(TimeUnit::Minutes.from_millis(119_000), 1);
        assert_eq!(TimeUnit::Milliseconds.from_millis(42), 42);
    }

    #[test]
    fn test_sentinels_pass_through() {
        assert_eq!(TimeUnit::Hours.from_millis(TTL_KEY_MISSING), TTL_KEY_MISSING);
        assert_eq!(TimeUnit::Days.from_millis(TTL_PERSISTENT), TTL_PERSISTENT);
    }

    #[test]
    fn test_unit_display() {
        assert_eq!(format!("{}{}", 30, TimeUnit::Seconds), "30s");
        assert_eq!(TimeUnit::Milliseconds.to_string(), "ms");
    }

    #[test]
    fn test_duration_ms_clamps() {
        assert_eq!(duration_ms(Duration::from_secs(2)), 2_000);
        assert_eq!(duration_ms(Duration::MAX), i64::MAX);
    }
}
