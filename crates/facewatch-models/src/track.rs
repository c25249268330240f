//! Tracks: a temporal sequence of Events believed to belong to one face.
//!
//! The source system this was distilled from repeatedly nulled out
//! `best_event`/`frame` mid-lifecycle and regretted it (races at copy time).
//! Here that state is unrepresentable: an active track's three Event slots
//! are always populated, and finalizing a track is a one-way move into a
//! distinct variant rather than a flag flip on the same struct.

use crate::event::Event;
use crate::ids::{CameraId, TrackId};
use crate::time::MonotonicTime;

/// The event slots every non-finalized Track carries. Never partially
/// populated: constructing one requires a first detection.
#[derive(Debug, Clone)]
pub struct ActiveTrack {
    first_event: Event,
    best_event: Event,
    last_event: Event,
    frames_without_detection: u32,
    frame_count: u32,
}

impl ActiveTrack {
    fn new(seed: Event) -> Self {
        Self {
            first_event: seed.clone(),
            best_event: seed.clone(),
            last_event: seed,
            frames_without_detection: 0,
            frame_count: 1,
        }
    }

    pub fn first_event(&self) -> &Event {
        &self.first_event
    }

    pub fn best_event(&self) -> &Event {
        &self.best_event
    }

    pub fn last_event(&self) -> &Event {
        &self.last_event
    }

    pub fn frames_without_detection(&self) -> u32 {
        self.frames_without_detection
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Associate a new Event with this track: bumps `frame_count`, replaces
    /// `last_event` unconditionally, and replaces `best_event` only on a
    /// strictly higher `quality_score`. Idempotent w.r.t. `best_event` when
    /// the incoming score is `<=` the current best.
    pub fn add_event(&mut self, event: Event) {
        self.frame_count += 1;
        self.frames_without_detection = 0;
        if event.quality_score() > self.best_event.quality_score() {
            self.best_event = event.clone();
        }
        self.last_event = event;
    }

    /// Called once per frame sweep for every track that did not receive an
    /// Event this frame.
    pub fn mark_missed(&mut self) {
        self.frames_without_detection += 1;
    }

    /// One-way transition into a read-only [`FinalizedTrack`].
    pub fn finalize(self, finalized_at: MonotonicTime) -> FinalizedTrack {
        FinalizedTrack {
            first_event: self.first_event,
            best_event: self.best_event,
            last_event: self.last_event,
            finalized_at,
        }
    }
}

/// A Track past finalization: read-only, scheduled for removal once the
/// registry's GC pass sees it age past the configured TTL.
#[derive(Debug, Clone)]
pub struct FinalizedTrack {
    first_event: Event,
    best_event: Event,
    last_event: Event,
    finalized_at: MonotonicTime,
}

impl FinalizedTrack {
    pub fn first_event(&self) -> &Event {
        &self.first_event
    }

    pub fn best_event(&self) -> &Event {
        &self.best_event
    }

    pub fn last_event(&self) -> &Event {
        &self.last_event
    }

    pub fn finalized_at(&self) -> MonotonicTime {
        self.finalized_at
    }
}

/// Lifecycle state of a Track: unrepresentable-when-wrong by construction
/// (an active track can never have a missing Event slot; a finalized one
/// can never be mutated).
#[derive(Debug, Clone)]
pub enum TrackState {
    Active(ActiveTrack),
    Finalized(FinalizedTrack),
}

impl TrackState {
    pub fn is_finalized(&self) -> bool {
        matches!(self, TrackState::Finalized(_))
    }

    pub fn as_active(&self) -> Option<&ActiveTrack> {
        match self {
            TrackState::Active(t) => Some(t),
            TrackState::Finalized(_) => None,
        }
    }

    pub fn as_active_mut(&mut self) -> Option<&mut ActiveTrack> {
        match self {
            TrackState::Active(t) => Some(t),
            TrackState::Finalized(_) => None,
        }
    }

    pub fn last_event(&self) -> &Event {
        match self {
            TrackState::Active(t) => t.last_event(),
            TrackState::Finalized(t) => t.last_event(),
        }
    }

    pub fn best_event(&self) -> &Event {
        match self {
            TrackState::Active(t) => t.best_event(),
            TrackState::Finalized(t) => t.best_event(),
        }
    }

    pub fn first_event(&self) -> &Event {
        match self {
            TrackState::Active(t) => t.first_event(),
            TrackState::Finalized(t) => t.first_event(),
        }
    }
}

/// A temporal sequence of Events believed to belong to the same face.
#[derive(Debug, Clone)]
pub struct Track {
    track_id: TrackId,
    camera_id: CameraId,
    state: TrackState,
}

impl Track {
    /// Seed a brand-new, active Track from its first associated Event.
    pub fn new(track_id: TrackId, camera_id: CameraId, seed: Event) -> Self {
        Self {
            track_id,
            camera_id,
            state: TrackState::Active(ActiveTrack::new(seed)),
        }
    }

    pub fn track_id(&self) -> TrackId {
        self.track_id
    }

    pub fn camera_id(&self) -> CameraId {
        self.camera_id
    }

    pub fn state(&self) -> &TrackState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut TrackState {
        &mut self.state
    }

    pub fn is_finalized(&self) -> bool {
        self.state.is_finalized()
    }

    /// Finalize this track in place. No-op if already finalized.
    pub fn finalize(&mut self, finalized_at: MonotonicTime) {
        if let TrackState::Active(active) = self.state.clone() {
            self.state = TrackState::Finalized(active.finalize(finalized_at));
        }
    }

    /// Total displacement of the bbox center between the first and last
    /// associated Event.
    pub fn displacement(&self) -> f64 {
        self.state
            .first_event()
            .bbox()
            .center_distance(&self.state.last_event().bbox())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BoundingBox;
    use crate::frame::Frame;
    use std::sync::Arc;

    fn event_at(x: f64, quality: f64) -> Event {
        let frame = Arc::new(Frame::new(
            CameraId(1),
            640,
            480,
            Arc::from(vec![0u8; 640 * 480 * 3]),
            MonotonicTime::ZERO,
        ));
        Event::new(frame, BoundingBox::new(x, 0.0, x + 10.0, 10.0), 0.9, quality)
    }

    #[test]
    fn best_event_only_replaced_on_strictly_higher_quality() {
        let mut active = ActiveTrack::new(event_at(0.0, 0.5));
        active.add_event(event_at(1.0, 0.5)); // equal quality: no replace
        assert_eq!(active.best_event().bbox().x1(), 0.0);

        active.add_event(event_at(2.0, 0.9)); // strictly higher: replace
        assert_eq!(active.best_event().bbox().x1(), 2.0);
        assert_eq!(active.frame_count(), 3);
    }

    #[test]
    fn finalize_preserves_all_event_slots() {
        let mut track = Track::new(TrackId(0), CameraId(1), event_at(0.0, 0.5));
        track.state_mut().as_active_mut().unwrap().add_event(event_at(5.0, 0.8));
        track.finalize(MonotonicTime::from_secs_f64(10.0));

        assert!(track.is_finalized());
        assert_eq!(track.state().first_event().bbox().x1(), 0.0);
        assert_eq!(track.state().best_event().bbox().x1(), 5.0);
        assert_eq!(track.state().last_event().bbox().x1(), 5.0);
    }

    #[test]
    fn displacement_is_distance_between_first_and_last_centers() {
        let mut track = Track::new(TrackId(0), CameraId(1), event_at(0.0, 0.5));
        track.state_mut().as_active_mut().unwrap().add_event(event_at(100.0, 0.5));
        assert!((track.displacement() - 100.0).abs() < 1e-9);
    }
}
