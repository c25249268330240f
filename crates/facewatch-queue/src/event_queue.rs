//! EventQueue: Detector → TrackManager, block-with-timeout-then-drop.

use std::time::Duration;

use facewatch_models::{CameraId, Event};

use crate::bounded::BoundedQueue;

/// Default capacity (`event_queue_max_size` in config).
pub const DEFAULT_CAPACITY: usize = 1000;

/// Default producer timeout before a blocked Event push is dropped.
pub const DEFAULT_PUSH_TIMEOUT: Duration = Duration::from_millis(500);

/// A detected face, or the boundary marker closing out one camera's frame.
///
/// TrackManager needs to know when it has seen every Event a given frame
/// produced so its per-frame sweep (missed-detection bookkeeping, best-event
/// promotion to FindfaceQueue) runs once per frame rather than once per
/// Event. The Detector emits one of these after each frame's Events.
#[derive(Debug, Clone)]
pub enum EventItem {
    Detected(Event),
    FrameComplete { camera_id: CameraId },
}

pub struct EventQueue {
    inner: BoundedQueue<EventItem>,
    push_timeout: Duration,
}

impl EventQueue {
    pub fn new(capacity: usize, push_timeout: Duration) -> Self {
        Self {
            inner: BoundedQueue::new(capacity),
            push_timeout,
        }
    }

    /// Push with the block-with-timeout-then-drop policy. Returns whether
    /// the item was enqueued (the caller aggregates drop counts itself,
    /// logging one warning per 100 drops rather than per drop).
    pub fn push(&self, item: EventItem) -> bool {
        self.inner.push_block_then_drop(item, self.push_timeout)
    }

    pub fn pop_blocking(&self) -> Option<EventItem> {
        self.inner.pop_blocking()
    }

    pub fn close(&self) {
        self.inner.close();
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn dropped(&self) -> u64 {
        self.inner.dropped()
    }
}
