//! TrackRegistry: `camera_id -> ordered tracks`, the sole place Tracks are
//! mutated, guarded by one mutex per the double-lock association pattern.

use std::collections::HashMap;

use parking_lot::Mutex;

use facewatch_models::{BoundingBox, CameraId, Event, MonotonicTime, Track, TrackId, TrackIdAllocator};

/// A read-only snapshot of one Track's matchable state, taken while holding
/// the registry lock and used for the lock-free matching math. Cheap to
/// clone: no pixel data, just the fields the association algorithm reads.
#[derive(Debug, Clone)]
pub struct TrackCandidate {
    pub track_id: TrackId,
    pub last_bbox: BoundingBox,
    pub last_timestamp: MonotonicTime,
}

struct Inner {
    tracks: HashMap<CameraId, Vec<Track>>,
}

pub struct TrackRegistry {
    inner: Mutex<Inner>,
    id_allocator: TrackIdAllocator,
}

impl TrackRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                tracks: HashMap::new(),
            }),
            id_allocator: TrackIdAllocator::new(),
        }
    }

    /// Step 1 of the association algorithm: copy out matchable state for
    /// every non-finalized Track of this camera, then release the lock.
    pub fn snapshot_candidates(&self, camera_id: CameraId) -> Vec<TrackCandidate> {
        let guard = self.inner.lock();
        guard
            .tracks
            .get(&camera_id)
            .into_iter()
            .flatten()
            .filter(|t| !t.is_finalized())
            .map(|t| TrackCandidate {
                track_id: t.track_id(),
                last_bbox: t.state().last_event().bbox(),
                last_timestamp: t.state().last_event().timestamp(),
            })
            .collect()
    }

    /// Step 3a: reacquire the lock and apply `event` to `track_id` if it
    /// still exists and is still non-finalized (it may have been finalized
    /// by a GC pass between snapshot and reacquire). Returns `false` if the
    /// chosen Track is no longer a valid target, in which case the caller
    /// falls through to inserting a new Track.
    pub fn try_associate(&self, camera_id: CameraId, track_id: TrackId, event: Event) -> bool {
        let mut guard = self.inner.lock();
        let Some(tracks) = guard.tracks.get_mut(&camera_id) else {
            return false;
        };
        let Some(track) = tracks.iter_mut().find(|t| t.track_id() == track_id) else {
            return false;
        };
        match track.state_mut().as_active_mut() {
            Some(active) => {
                active.add_event(event);
                true
            }
            None => false,
        }
    }

    /// Step 3b: no candidate won the match; seed a brand-new Track.
    pub fn insert_new(&self, camera_id: CameraId, event: Event) -> TrackId {
        let track_id = self.id_allocator.next();
        let track = Track::new(track_id, camera_id, event);
        let mut guard = self.inner.lock();
        guard.tracks.entry(camera_id).or_default().push(track);
        track_id
    }

    /// Per-frame sweep: mark every non-finalized Track of `camera_id` not in
    /// `associated` as having missed a detection, then finalize any Track
    /// that has crossed `max_age` or `max_frames`. Returns, for each Track
    /// finalized during this call, the finalized clone plus whether it had
    /// reached `min_hits` associations before finalizing — `frame_count` is
    /// no longer available once a Track is read-only, so this has to be
    /// captured at the moment of transition.
    pub fn sweep_and_finalize(
        &self,
        camera_id: CameraId,
        associated: &std::collections::HashSet<TrackId>,
        max_age: u32,
        max_frames: u32,
        min_hits: u32,
        now: MonotonicTime,
    ) -> Vec<(Track, bool)> {
        let mut guard = self.inner.lock();
        let Some(tracks) = guard.tracks.get_mut(&camera_id) else {
            return Vec::new();
        };

        let mut newly_finalized = Vec::new();
        for track in tracks.iter_mut() {
            if track.is_finalized() {
                continue;
            }
            if !associated.contains(&track.track_id()) {
                if let Some(active) = track.state_mut().as_active_mut() {
                    active.mark_missed();
                }
            }
            let active = track.state().as_active();
            let should_finalize = active
                .map(|a| a.frames_without_detection() >= max_age || a.frame_count() >= max_frames)
                .unwrap_or(false);
            if should_finalize {
                let met_min_hits = active.map(|a| a.frame_count() >= min_hits).unwrap_or(false);
                track.finalize(now);
                newly_finalized.push((track.clone(), met_min_hits));
            }
        }
        newly_finalized
    }

    /// Drop finalized Tracks whose `finalized_at` age exceeds `ttl_seconds`,
    /// across every camera. Returns the number removed.
    pub fn gc_finalized(&self, now: MonotonicTime, ttl_seconds: f64) -> usize {
        let mut guard = self.inner.lock();
        let mut removed = 0;
        for tracks in guard.tracks.values_mut() {
            let before = tracks.len();
            tracks.retain(|t| match t.state() {
                facewatch_models::TrackState::Finalized(f) => {
                    (now - f.finalized_at()).as_secs_f64() <= ttl_seconds
                }
                facewatch_models::TrackState::Active(_) => true,
            });
            removed += before - tracks.len();
        }
        removed
    }

    /// Total Tracks currently held (active + finalized, pre-GC), for tests
    /// and metrics.
    pub fn total_tracks(&self) -> usize {
        self.inner.lock().tracks.values().map(Vec::len).sum()
    }

    pub fn tracks_for_camera(&self, camera_id: CameraId) -> Vec<Track> {
        self.inner
            .lock()
            .tracks
            .get(&camera_id)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for TrackRegistry {
    fn default() -> Self {
        Self::new()
    }
}
