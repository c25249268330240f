//! TrackManager: the single worker that drains EventQueue, runs the
//! association algorithm, and decides Track lifecycle.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use facewatch_models::{CameraId, MonotonicTime, TrackId};
use facewatch_queue::{EventItem, EventQueue, FindfaceQueue};
use tracing::{debug, info, warn};

use crate::association::{associate, has_moved_enough};
use crate::config::TrackingConfig;
use crate::registry::TrackRegistry;

/// Supplies the current time to the TrackManager. Abstracted so tests can
/// drive temporal-gate and finalization scenarios deterministically instead
/// of sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> MonotonicTime;
}

/// Wall-clock implementation: offsets from the instant the clock was built.
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> MonotonicTime {
        MonotonicTime::since(self.epoch)
    }
}

const GC_INTERVAL: Duration = Duration::from_secs(1);

pub struct TrackManager<C: Clock = SystemClock> {
    registry: TrackRegistry,
    config: TrackingConfig,
    clock: C,
    active_sets: HashMap<CameraId, HashSet<TrackId>>,
    last_gc: MonotonicTime,
}

impl<C: Clock> TrackManager<C> {
    pub fn new(config: TrackingConfig, clock: C) -> Self {
        let now = clock.now();
        Self {
            registry: TrackRegistry::new(),
            config,
            clock,
            active_sets: HashMap::new(),
            last_gc: now,
        }
    }

    pub fn registry(&self) -> &TrackRegistry {
        &self.registry
    }

    /// Run the association algorithm for a single incoming Event.
    pub fn handle_event(&mut self, event: facewatch_models::Event) {
        let camera_id = event.frame().camera_id();
        let frame_width = event.frame().width();
        let frame_height = event.frame().height();

        // Step 1: snapshot under lock, release lock before matching math.
        let candidates = self.registry.snapshot_candidates(camera_id);

        // Step 2: pure matching math, no lock held.
        let matched = associate(
            &candidates,
            event.bbox(),
            event.timestamp(),
            frame_width,
            frame_height,
            self.config.distance_ratio_of_diagonal,
        );

        // Step 3: reacquire the lock only to mutate.
        let track_id = match matched {
            Some(track_id) => {
                if self.registry.try_associate(camera_id, track_id, event.clone()) {
                    track_id
                } else {
                    // Chosen Track was finalized between snapshot and
                    // reacquire; fall through to a new Track.
                    self.registry.insert_new(camera_id, event)
                }
            }
            None => self.registry.insert_new(camera_id, event),
        };

        self.active_sets.entry(camera_id).or_default().insert(track_id);
    }

    /// Per-frame sweep, finalization, and best-event submission for one
    /// camera's completed frame.
    pub fn handle_frame_complete(&mut self, camera_id: CameraId, findface_queue: &FindfaceQueue) {
        let associated = self.active_sets.remove(&camera_id).unwrap_or_default();
        let now = self.clock.now();

        let finalized = self.registry.sweep_and_finalize(
            camera_id,
            &associated,
            self.config.max_age,
            self.config.max_frames,
            self.config.min_hits,
            now,
        );

        for (track, met_min_hits) in finalized {
            if !met_min_hits {
                debug!(track_id = %track.track_id(), "track finalized below min_hits, not submitted");
                continue;
            }
            let first = track.state().first_event();
            let last = track.state().last_event();
            let frame_diagonal = ((first.frame().width() as f64).powi(2)
                + (first.frame().height() as f64).powi(2))
            .sqrt();
            let displacement = first.bbox().center_distance(&last.bbox());
            if !has_moved_enough(
                displacement,
                frame_diagonal,
                self.config.min_movement_pixels,
                self.config.min_movement_percentage,
            ) {
                debug!(track_id = %track.track_id(), "track finalized without sufficient movement, not submitted");
                continue;
            }

            let copy = track.state().best_event().into_owned_copy();
            if !findface_queue.push(copy) {
                warn!(track_id = %track.track_id(), "FindfaceQueue full, best event discarded");
            }
        }

        if now - self.last_gc >= GC_INTERVAL {
            let removed = self.registry.gc_finalized(now, self.config.tracks_ttl_seconds);
            if removed > 0 {
                debug!(removed, "garbage-collected finalized tracks");
            }
            self.last_gc = now;
        }
    }

    /// Drain `event_queue` until it is closed and drained, or `stop` flips.
    pub fn run(
        &mut self,
        event_queue: &EventQueue,
        findface_queue: &FindfaceQueue,
        stop: &Arc<AtomicBool>,
    ) {
        info!("track manager started");
        loop {
            if stop.load(Ordering::Relaxed) && event_queue.len() == 0 {
                break;
            }
            match event_queue.pop_blocking() {
                Some(EventItem::Detected(event)) => self.handle_event(event),
                Some(EventItem::FrameComplete { camera_id }) => {
                    self.handle_frame_complete(camera_id, findface_queue)
                }
                None => break,
            }
        }
        info!("track manager stopped");
    }
}

#[cfg(test)]
pub struct ManualClock {
    now: parking_lot::Mutex<MonotonicTime>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: parking_lot::Mutex::new(MonotonicTime::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock();
        *guard = *guard + by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> MonotonicTime {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facewatch_models::{BoundingBox, Event, Frame};
    use std::sync::Arc as StdArc;

    fn frame(camera_id: u32, w: u32, h: u32, captured_at: MonotonicTime) -> StdArc<Frame> {
        StdArc::new(Frame::new(
            CameraId(camera_id),
            w,
            h,
            std::sync::Arc::from(vec![0u8; w as usize * h as usize * 3]),
            captured_at,
        ))
    }

    fn event(f: &StdArc<Frame>, bbox: BoundingBox, confidence: f64, quality: f64) -> Event {
        Event::new(StdArc::clone(f), bbox, confidence, quality)
    }

    fn manager_with(config: TrackingConfig) -> TrackManager<ManualClock> {
        TrackManager::new(config, ManualClock::new())
    }

    #[test]
    fn scenario_a_single_face_single_camera_finalizes_after_max_age() {
        let config = TrackingConfig {
            max_age: 30,
            min_movement_pixels: 0.0,
            min_hits: 1,
            ..Default::default()
        };
        let mut manager = manager_with(config);
        let findface = FindfaceQueue::new(10);

        // 10 frames with a face, then 31 empty frames (no Events -> just
        // frame-complete sweeps).
        for i in 0..10 {
            let f = frame(1, 1280, 720, MonotonicTime::from_millis(i * 33));
            manager.handle_event(event(&f, BoundingBox::new(100.0, 100.0, 200.0, 200.0), 0.9, 0.9));
            manager.handle_frame_complete(CameraId(1), &findface);
        }
        assert_eq!(manager.registry.total_tracks(), 1);

        for _ in 10..41 {
            manager.handle_frame_complete(CameraId(1), &findface);
        }

        // min_movement_pixels = 0 -> the track is eligible for submission
        // even with zero displacement.
        assert_eq!(findface.len(), 1);
    }

    #[test]
    fn scenario_b_iou_match_updates_existing_tracks() {
        let mut manager = manager_with(TrackingConfig::default());
        let findface = FindfaceQueue::new(10);

        let f1 = frame(1, 1280, 720, MonotonicTime::from_millis(0));
        manager.handle_event(event(&f1, BoundingBox::new(100.0, 100.0, 200.0, 200.0), 0.9, 0.9));
        manager.handle_event(event(&f1, BoundingBox::new(500.0, 100.0, 600.0, 200.0), 0.9, 0.9));
        manager.handle_frame_complete(CameraId(1), &findface);
        assert_eq!(manager.registry.total_tracks(), 2);

        let f2 = frame(1, 1280, 720, MonotonicTime::from_millis(33));
        manager.handle_event(event(&f2, BoundingBox::new(110.0, 100.0, 210.0, 200.0), 0.9, 0.9));
        manager.handle_event(event(&f2, BoundingBox::new(510.0, 100.0, 610.0, 200.0), 0.9, 0.9));
        manager.handle_frame_complete(CameraId(1), &findface);

        // Still exactly two tracks: both frame-2 events matched existing
        // tracks by overlap instead of creating new ones.
        assert_eq!(manager.registry.total_tracks(), 2);
        for track in manager.registry.tracks_for_camera(CameraId(1)) {
            assert_eq!(track.state().as_active().unwrap().frame_count(), 2);
        }
    }

    #[test]
    fn scenario_c_falls_back_to_distance_when_no_overlap() {
        let mut manager = manager_with(TrackingConfig::default());
        let findface = FindfaceQueue::new(10);

        let f1 = frame(1, 1920, 1440, MonotonicTime::from_millis(0));
        manager.handle_event(event(&f1, BoundingBox::new(100.0, 100.0, 200.0, 200.0), 0.9, 0.9));
        manager.handle_frame_complete(CameraId(1), &findface);

        let f2 = frame(1, 1920, 1440, MonotonicTime::from_millis(33));
        manager.handle_event(event(&f2, BoundingBox::new(210.0, 100.0, 310.0, 200.0), 0.9, 0.9));
        manager.handle_frame_complete(CameraId(1), &findface);

        assert_eq!(manager.registry.total_tracks(), 1);
    }

    #[test]
    fn scenario_d_temporal_gate_creates_distinct_tracks() {
        let mut manager = manager_with(TrackingConfig::default());
        let findface = FindfaceQueue::new(10);

        let f1 = frame(1, 1280, 720, MonotonicTime::from_millis(0));
        manager.handle_event(event(&f1, BoundingBox::new(100.0, 100.0, 200.0, 200.0), 0.9, 0.9));
        manager.handle_frame_complete(CameraId(1), &findface);

        let f2 = frame(1, 1280, 720, MonotonicTime::from_millis(3_000));
        manager.handle_event(event(&f2, BoundingBox::new(100.0, 100.0, 200.0, 200.0), 0.9, 0.9));
        manager.handle_frame_complete(CameraId(1), &findface);

        assert_eq!(manager.registry.total_tracks(), 2);
    }

    #[test]
    fn scenario_e_best_event_tracks_global_maximum_under_many_updates() {
        let config = TrackingConfig {
            min_hits: 1,
            min_movement_pixels: 0.0,
            ..Default::default()
        };
        let mut manager = manager_with(config);
        let findface = FindfaceQueue::new(10);

        let f = frame(1, 1280, 720, MonotonicTime::from_millis(0));
        manager.handle_event(event(&f, BoundingBox::new(100.0, 100.0, 200.0, 200.0), 0.9, 0.0));
        manager.handle_frame_complete(CameraId(1), &findface);

        for i in 1..1000u32 {
            let ff = frame(1, 1280, 720, MonotonicTime::from_millis(i as u64));
            manager.handle_event(event(
                &ff,
                BoundingBox::new(100.0, 100.0, 200.0, 200.0),
                0.9,
                i as f64,
            ));
            manager.handle_frame_complete(CameraId(1), &findface);
        }

        let tracks = manager.registry.tracks_for_camera(CameraId(1));
        assert_eq!(tracks.len(), 1);
        assert_eq!(
            tracks[0].state().as_active().unwrap().best_event().quality_score(),
            999.0
        );
    }

    #[test]
    fn single_event_track_below_movement_threshold_is_discarded() {
        let config = TrackingConfig {
            max_age: 1,
            min_hits: 1,
            min_movement_pixels: 50.0,
            min_movement_percentage: 0.1,
            ..Default::default()
        };
        let mut manager = manager_with(config);
        let findface = FindfaceQueue::new(10);

        let f = frame(1, 1280, 720, MonotonicTime::from_millis(0));
        manager.handle_event(event(&f, BoundingBox::new(100.0, 100.0, 200.0, 200.0), 0.9, 0.9));
        manager.handle_frame_complete(CameraId(1), &findface);
        manager.handle_frame_complete(CameraId(1), &findface); // missed once -> finalize (max_age=1)

        assert_eq!(findface.len(), 0);
    }
}
