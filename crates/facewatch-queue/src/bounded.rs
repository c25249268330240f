//! A hand-rolled bounded queue with per-stage overflow policies.
//!
//! `crossbeam_channel::bounded` covers the plain block-or-drop cases, but
//! FrameQueue needs to evict a *specific* pending element (the oldest frame
//! for the incoming frame's own camera) rather than whatever sits at the
//! head of the channel, which no channel crate exposes. Built on
//! `parking_lot::Mutex` + `Condvar` instead so every stage's overflow policy
//! (drop-oldest, block-with-timeout, non-blocking try-put) is implemented
//! once against the same primitive.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::error::{QueueError, QueueResult};

struct Inner<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// A bounded FIFO shared between one or more producers and consumers.
///
/// Not generic over an overflow policy: callers pick the push method that
/// matches the policy they need (`push_drop_oldest`, `push_block_then_drop`,
/// `push_try_non_blocking`), since each pipeline stage uses a different one.
pub struct BoundedQueue<T> {
    capacity: usize,
    state: Mutex<Inner<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    dropped: AtomicU64,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be positive");
        Self {
            capacity,
            state: Mutex::new(Inner {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Running count of items this queue has dropped under any policy.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stop accepting new pushes and wake every blocked pusher/popper.
    /// Items already queued remain poppable until drained.
    pub fn close(&self) {
        let mut guard = self.state.lock();
        guard.closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Drop-oldest policy: if full, evict the first item matching
    /// `same_key` (the oldest pending item for this producer's key); if no
    /// such item exists, evict the global oldest instead. Returns `Err` only
    /// if the queue has been closed.
    pub fn push_drop_oldest(
        &self,
        item: T,
        same_key: impl Fn(&T) -> bool,
    ) -> QueueResult<()> {
        let mut guard = self.state.lock();
        if guard.closed {
            return Err(QueueError::Closed);
        }
        if guard.items.len() >= self.capacity {
            let evict_at = guard.items.iter().position(&same_key).unwrap_or(0);
            guard.items.remove(evict_at);
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        guard.items.push_back(item);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Block-with-timeout-then-drop policy: wait up to `timeout` for room;
    /// push if room appears, otherwise drop the item. Returns `true` if the
    /// item was enqueued, `false` if it was dropped.
    pub fn push_block_then_drop(&self, item: T, timeout: Duration) -> bool {
        let mut guard = self.state.lock();
        if guard.closed {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        let deadline = std::time::Instant::now() + timeout;
        while guard.items.len() >= self.capacity && !guard.closed {
            let now = std::time::Instant::now();
            if now >= deadline {
                break;
            }
            let wait_result = self
                .not_full
                .wait_for(&mut guard, deadline - now);
            if wait_result.timed_out() {
                break;
            }
        }
        if guard.items.len() >= self.capacity || guard.closed {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        guard.items.push_back(item);
        self.not_empty.notify_one();
        true
    }

    /// Non-blocking try-put: push if there is room right now, otherwise
    /// drop immediately. Returns `true` if the item was enqueued.
    pub fn push_try_non_blocking(&self, item: T) -> bool {
        let mut guard = self.state.lock();
        if guard.closed || guard.items.len() >= self.capacity {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        guard.items.push_back(item);
        self.not_empty.notify_one();
        true
    }

    /// Block until an item is available or the queue is closed and drained,
    /// whichever comes first.
    pub fn pop_blocking(&self) -> Option<T> {
        let mut guard = self.state.lock();
        loop {
            if let Some(item) = guard.items.pop_front() {
                self.not_full.notify_one();
                return Some(item);
            }
            if guard.closed {
                return None;
            }
            self.not_empty.wait(&mut guard);
        }
    }

    /// Drain up to `max` items without blocking. Used by stages that batch
    /// their consumption (the Detector's GPU batches).
    pub fn try_drain_batch(&self, max: usize) -> Vec<T> {
        let mut guard = self.state.lock();
        let n = max.min(guard.items.len());
        let batch: Vec<T> = guard.items.drain(..n).collect();
        if !batch.is_empty() {
            self.not_full.notify_all();
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_oldest_evicts_matching_key_before_global_oldest() {
        let q: BoundedQueue<(u32, u32)> = BoundedQueue::new(2);
        q.push_drop_oldest((1, 0), |i| i.0 == 1).unwrap();
        q.push_drop_oldest((2, 0), |i| i.0 == 2).unwrap();
        // full: pushing another camera-1 frame should evict the camera-1 entry, not camera-2's.
        q.push_drop_oldest((1, 1), |i| i.0 == 1).unwrap();

        let remaining: Vec<_> = q.try_drain_batch(10);
        assert_eq!(remaining, vec![(2, 0), (1, 1)]);
        assert_eq!(q.dropped(), 1);
    }

    #[test]
    fn block_then_drop_drops_when_never_drained() {
        let q: BoundedQueue<u32> = BoundedQueue::new(1);
        q.push_try_non_blocking(1);
        let accepted = q.push_block_then_drop(2, Duration::from_millis(20));
        assert!(!accepted);
        assert_eq!(q.dropped(), 1);
    }

    #[test]
    fn try_non_blocking_drops_immediately_when_full() {
        let q: BoundedQueue<u32> = BoundedQueue::new(1);
        assert!(q.push_try_non_blocking(1));
        assert!(!q.push_try_non_blocking(2));
        assert_eq!(q.dropped(), 1);
    }

    #[test]
    fn pop_blocking_drains_remaining_items_after_close() {
        let q: BoundedQueue<u32> = BoundedQueue::new(4);
        q.push_try_non_blocking(1);
        q.push_try_non_blocking(2);
        q.close();
        assert_eq!(q.pop_blocking(), Some(1));
        assert_eq!(q.pop_blocking(), Some(2));
        assert_eq!(q.pop_blocking(), None);
    }
}
