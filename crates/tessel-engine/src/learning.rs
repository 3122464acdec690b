//! Learning sessions.
//!
//! While a session is active every sighted cell is assigned to the session's
//! target area, overwriting whatever it was mapped to. Expiry is lazy: nothing
//! fires at the deadline, each lookup compares the current time against it.

use serde::Serialize;

use tessel_types::AreaId;

/// Snapshot of a learning session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LearningSession {
    pub target_area_id: AreaId,
    /// Deadline on the monotonic clock, inclusive.
    pub until_ms: u64,
}

impl LearningSession {
    pub fn is_active(&self, now_ms: u64) -> bool {
        now_ms <= self.until_ms
    }

    /// Time left before expiry, zero once expired.
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.until_ms.saturating_sub(now_ms)
    }
}
