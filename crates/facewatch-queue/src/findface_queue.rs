//! FindfaceQueue: TrackManager → Forwarder, non-blocking try-put.

use facewatch_models::Event;

use crate::bounded::BoundedQueue;

/// Default capacity (`findface_queue_max_size` in config).
pub const DEFAULT_CAPACITY: usize = 100;

pub struct FindfaceQueue {
    inner: BoundedQueue<Event>,
}

impl FindfaceQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: BoundedQueue::new(capacity),
        }
    }

    /// Non-blocking try-put: on failure the caller logs and discards, per
    /// the best-event promotion step's documented fire-and-forget policy.
    pub fn push(&self, event: Event) -> bool {
        self.inner.push_try_non_blocking(event)
    }

    pub fn pop_blocking(&self) -> Option<Event> {
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
