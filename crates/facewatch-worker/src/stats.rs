//! Drop-count aggregation: on any dropped item, a periodic summary (every
//! 30 s) emits counts by category.

use std::time::Duration;

use facewatch_queue::{EventQueue, FindfaceQueue, FrameQueue};
use tracing::info;

pub const SUMMARY_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropStats {
    pub frames_dropped: u64,
    pub events_dropped: u64,
    pub findface_dropped: u64,
}

impl DropStats {
    pub fn snapshot(frame_queue: &FrameQueue, event_queue: &EventQueue, findface_queue: &FindfaceQueue) -> Self {
        Self {
            frames_dropped: frame_queue.dropped(),
            events_dropped: event_queue.dropped(),
            findface_dropped: findface_queue.dropped(),
        }
    }

    /// Delta against a previous snapshot, for "did anything change since
    /// the last summary" logging.
    pub fn delta_since(&self, previous: &DropStats) -> DropStats {
        DropStats {
            frames_dropped: self.frames_dropped.saturating_sub(previous.frames_dropped),
            events_dropped: self.events_dropped.saturating_sub(previous.events_dropped),
            findface_dropped: self.findface_dropped.saturating_sub(previous.findface_dropped),
        }
    }

    pub fn has_drops(&self) -> bool {
        self.frames_dropped > 0 || self.events_dropped > 0 || self.findface_dropped > 0
    }

    pub fn log_summary(&self) {
        info!(
            frames_dropped = self.frames_dropped,
            events_dropped = self.events_dropped,
            findface_dropped = self.findface_dropped,
            "drop summary"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_is_monotonic_non_negative() {
        let previous = DropStats {
            frames_dropped: 10,
            events_dropped: 2,
            findface_dropped: 0,
        };
        let current = DropStats {
            frames_dropped: 15,
            events_dropped: 2,
            findface_dropped: 1,
        };
        let delta = current.delta_since(&previous);
        assert_eq!(delta.frames_dropped, 5);
        assert_eq!(delta.events_dropped, 0);
        assert_eq!(delta.findface_dropped, 1);
        assert!(delta.has_drops());
    }
}
