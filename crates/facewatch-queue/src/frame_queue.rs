//! FrameQueue: StreamIngestor → Detector, drop-oldest backpressure.

use std::sync::Arc;

use facewatch_models::Frame;

use crate::bounded::BoundedQueue;
use crate::error::QueueResult;

/// Default capacity (`frame_queue_max_size` in config).
pub const DEFAULT_CAPACITY: usize = 100;

/// Holds decoded frames awaiting detection. Full queue evicts the oldest
/// pending frame for the *incoming frame's own camera* first (so one noisy
/// camera can't starve another's backlog), falling back to the global
/// oldest frame if this camera has none queued.
pub struct FrameQueue {
    inner: BoundedQueue<Arc<Frame>>,
}

impl FrameQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: BoundedQueue::new(capacity),
        }
    }

    pub fn push(&self, frame: Arc<Frame>) -> QueueResult<()> {
        let camera_id = frame.camera_id();
        self.inner
            .push_drop_oldest(frame, move |queued| queued.camera_id() == camera_id)
    }

    pub fn pop_blocking(&self) -> Option<Arc<Frame>> {
        self.inner.pop_blocking()
    }

    pub fn try_drain_batch(&self, max: usize) -> Vec<Arc<Frame>> {
        self.inner.try_drain_batch(max)
    }

    pub fn close(&self) {
        self.inner.close();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn dropped(&self) -> u64 {
        self.inner.dropped()
    }
}
