//! A monotonic timestamp decoupled from the wall clock.
//!
//! Frames and Events are stamped against an arbitrary epoch (process start,
//! in production) rather than `SystemTime`, so temporal-gating math
//! (`event.timestamp - track.last_event.timestamp > 2s`) never has to
//! account for clock adjustments, and tests can construct exact offsets
//! without sleeping.

use std::ops::{Add, Sub};
use std::time::Duration;

/// A point in time measured as an offset from process start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonotonicTime(Duration);

impl MonotonicTime {
    pub const ZERO: MonotonicTime = MonotonicTime(Duration::ZERO);

    pub fn from_secs_f64(secs: f64) -> Self {
        Self(Duration::from_secs_f64(secs.max(0.0)))
    }

    pub fn from_millis(ms: u64) -> Self {
        Self(Duration::from_millis(ms))
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0.as_secs_f64()
    }

    /// Capture the current instant relative to `epoch`.
    pub fn since(epoch: std::time::Instant) -> Self {
        Self(epoch.elapsed())
    }
}

impl Sub for MonotonicTime {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

impl Add<Duration> for MonotonicTime {
    type Output = MonotonicTime;

    fn add(self, rhs: Duration) -> MonotonicTime {
        MonotonicTime(self.0 + rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtraction_yields_elapsed_duration() {
        let a = MonotonicTime::from_secs_f64(5.0);
        let b = MonotonicTime::from_secs_f64(2.0);
        assert_eq!(a - b, Duration::from_secs(3));
    }

    #[test]
    fn ordering_is_chronological() {
        let a = MonotonicTime::from_secs_f64(1.0);
        let b = MonotonicTime::from_secs_f64(2.0);
        assert!(a < b);
    }
}
