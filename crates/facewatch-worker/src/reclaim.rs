//! Background reclamation: periodically releases memory the hot path
//! accumulates but never frees itself on its own (GPU tensor caches kept
//! warm by the detection model). Runs off a dedicated low-priority thread;
//! never called from the ingest/detect/track/forward loops. Finalized-track
//! bookkeeping has its own GC cadence inside `TrackManager` and is not
//! duplicated here.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

/// Hook for releasing device-side (GPU) caches the detector model keeps
/// warm. A no-op `NullTensorCacheReleaser` is used when no such cache
/// exists (CPU-only inference).
pub trait TensorCacheReleaser: Send + Sync {
    /// Returns the number of objects released, for the reclaim statistics.
    fn release(&self) -> u64;
}

pub struct NullTensorCacheReleaser;

impl TensorCacheReleaser for NullTensorCacheReleaser {
    fn release(&self) -> u64 {
        0
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ReclaimStats {
    pub reclaim_count: u64,
    pub objects_reclaimed: u64,
}

struct Counters {
    reclaim_count: AtomicU64,
    objects_reclaimed: AtomicU64,
}

/// Wakes up every `interval` and asks the tensor cache releaser (if any)
/// to free what it can.
pub struct BackgroundReclaimer {
    counters: Arc<Counters>,
    stop: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl BackgroundReclaimer {
    pub fn start(interval: Duration, releaser: Arc<dyn TensorCacheReleaser>) -> Self {
        let counters = Arc::new(Counters {
            reclaim_count: AtomicU64::new(0),
            objects_reclaimed: AtomicU64::new(0),
        });
        let stop = Arc::new(AtomicBool::new(false));

        let thread_counters = Arc::clone(&counters);
        let thread_stop = Arc::clone(&stop);
        let handle = std::thread::spawn(move || {
            const POLL: Duration = Duration::from_millis(100);
            while !thread_stop.load(Ordering::Relaxed) {
                let mut waited = Duration::ZERO;
                while waited < interval {
                    if thread_stop.load(Ordering::Relaxed) {
                        return;
                    }
                    let step = POLL.min(interval - waited);
                    std::thread::sleep(step);
                    waited += step;
                }
                let released = releaser.release();

                thread_counters.reclaim_count.fetch_add(1, Ordering::Relaxed);
                thread_counters
                    .objects_reclaimed
                    .fetch_add(released, Ordering::Relaxed);

                debug!(released, "reclamation pass");
            }
        });

        Self {
            counters,
            stop,
            handle: Some(handle),
        }
    }

    pub fn stats(&self) -> ReclaimStats {
        ReclaimStats {
            reclaim_count: self.counters.reclaim_count.load(Ordering::Relaxed),
            objects_reclaimed: self.counters.objects_reclaimed.load(Ordering::Relaxed),
        }
    }

    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingReleaser;

    impl TensorCacheReleaser for CountingReleaser {
        fn release(&self) -> u64 {
            3
        }
    }

    #[test]
    fn accumulates_released_objects_across_passes() {
        let reclaimer = BackgroundReclaimer::start(Duration::from_millis(20), Arc::new(CountingReleaser));
        std::thread::sleep(Duration::from_millis(90));
        let stats = reclaimer.stats();
        reclaimer.stop();
        assert!(stats.reclaim_count >= 1);
        assert_eq!(stats.objects_reclaimed, stats.reclaim_count * 3);
    }

    #[test]
    fn null_releaser_releases_nothing() {
        assert_eq!(NullTensorCacheReleaser.release(), 0);
    }
}
