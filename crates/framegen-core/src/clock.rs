//! Process-wide monotonic clock for frame timestamps.
//!
//! Timestamps are nanoseconds since the first call to [`now_ns`] in the
//! process, so capture and presentation can compare them directly.

use std::sync::OnceLock;
use std::time::{Duration, Instant};

static EPOCH: OnceLock<Instant> = OnceLock::new();

fn epoch() -> Instant {
    *EPOCH.get_or_init(Instant::now)
}

/// Monotonic nanoseconds since the process epoch.
#[must_use]
pub fn now_ns() -> u64 {
    u64::try_from(epoch().elapsed().as_nanos()).unwrap_or(u64::MAX)
}

/// Age of a timestamp relative to now; zero for timestamps in the future.
#[must_use]
pub fn age_of(timestamp_ns: u64) -> Duration {
    Duration::from_nanos(now_ns().saturating_sub(timestamp_ns))
}

/// Convert a duration to fractional milliseconds.
#[inline]
#[must_use]
pub fn as_ms(duration: Duration) -> f32 {
    duration.as_secs_f32() * 1000.0
}
