//! Time sources.
//!
//! Learning deadlines live on a monotonic clock so wall-clock adjustments
//! cannot stretch or cut a session. Sighting log timestamps are Unix millis.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Milliseconds on a clock that never goes backwards.
    fn monotonic_millis(&self) -> u64;

    /// Milliseconds since the Unix epoch.
    fn unix_millis(&self) -> i64;
}

/// The real clocks.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn monotonic_millis(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn unix_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

/// Clock driven by hand, for tests and simulations.
///
/// Both clocks advance together.
#[derive(Debug, Default)]
pub struct ManualClock {
    monotonic: AtomicU64,
    unix: AtomicI64,
}

impl ManualClock {
    /// Start at monotonic zero and the given Unix time.
    pub fn new(unix_millis: i64) -> Self {
        Self {
            monotonic: AtomicU64::new(0),
            unix: AtomicI64::new(unix_millis),
        }
    }

    /// Move both clocks forward.
    pub fn advance(&self, by: Duration) {
        let ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.monotonic.fetch_add(ms, Ordering::SeqCst);
        self.unix
            .fetch_add(i64::try_from(ms).unwrap_or(i64::MAX), Ordering::SeqCst);
    }

    /// Jump the wall clock without touching the monotonic one.
    pub fn set_unix_millis(&self, unix_millis: i64) {
        self.unix.store(unix_millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn monotonic_millis(&self) -> u64 {
        self.monotonic.load(Ordering::SeqCst)
    }

    fn unix_millis(&self) -> i64 {
        self.unix.load(Ordering::SeqCst)
    }
}

/// Convert a duration to whole milliseconds, saturating.
pub(crate) fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances_both() {
        let clock = ManualClock::new(1_000);
        clock.advance(Duration::from_secs(2));
        assert_eq!(clock.monotonic_millis(), 2_000);
        assert_eq!(clock.unix_millis(), 3_000);
    }

    #[test]
    fn test_wall_clock_jump_leaves_monotonic() {
        let clock = ManualClock::new(1_000);
        clock.set_unix_millis(0);
        assert_eq!(clock.monotonic_millis(), 0);
        assert_eq!(clock.unix_millis(), 0);
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.monotonic_millis();
        let b = clock.monotonic_millis();
        assert!(b >= a);
        assert!(clock.unix_millis() > 0);
    }
}
