//! The out-of-lock matching math: given a snapshot of candidate Tracks and
//! an incoming Event, decide which Track (if any) it belongs to.
//!
//! Everything here is a pure function over owned data — no registry lock is
//! held while it runs, which is the whole point of the two-phase
//! association algorithm (see [`crate::manager`]).

use facewatch_models::{BoundingBox, Event, TrackId};

use crate::config::TEMPORAL_GATE_SECS;
use crate::registry::TrackCandidate;

/// Width-adaptive overlap threshold. Deliberately not the flat
/// `tracking.iou_threshold` config value: looser thresholds at lower
/// resolutions compensate for coarser bbox localization.
pub fn adaptive_iou_threshold(frame_width: u32) -> f64 {
    if frame_width <= 640 {
        0.20
    } else if frame_width <= 1280 {
        0.15
    } else if frame_width <= 1920 {
        0.12
    } else {
        0.10
    }
}

/// Center-distance fallback threshold: a fraction of the frame diagonal.
pub fn distance_threshold(frame_width: u32, frame_height: u32, ratio_of_diagonal: f64) -> f64 {
    let diagonal = ((frame_width as f64).powi(2) + (frame_height as f64).powi(2)).sqrt();
    diagonal * ratio_of_diagonal
}

/// Result of scoring one candidate Track against the incoming Event.
struct Scored {
    track_id: TrackId,
    overlap: f64,
    distance: f64,
}

/// Choose the best matching Track for `event` among `candidates`, or `None`
/// if no candidate passes either the overlap or distance gate.
///
/// Preference order: greatest overlap `>= iou_threshold`; if no candidate
/// clears that bar, the smallest `center_distance <= distance_threshold`.
/// Ties in either case are broken by the lower `TrackId` (earlier track
/// wins).
pub fn associate(
    candidates: &[TrackCandidate],
    event_bbox: BoundingBox,
    event_timestamp: facewatch_models::MonotonicTime,
    frame_width: u32,
    frame_height: u32,
    ratio_of_diagonal: f64,
) -> Option<TrackId> {
    let iou_threshold = adaptive_iou_threshold(frame_width);
    let dist_threshold = distance_threshold(frame_width, frame_height, ratio_of_diagonal);

    let scored: Vec<Scored> = candidates
        .iter()
        .filter(|c| (event_timestamp - c.last_timestamp).as_secs_f64() <= TEMPORAL_GATE_SECS)
        .map(|c| Scored {
            track_id: c.track_id,
            overlap: c.last_bbox.overlap(&event_bbox),
            distance: c.last_bbox.center_distance(&event_bbox),
        })
        .collect();

    let by_overlap = scored
        .iter()
        .filter(|s| s.overlap >= iou_threshold)
        .max_by(|a, b| {
            a.overlap
                .partial_cmp(&b.overlap)
                .unwrap()
                .then_with(|| b.track_id.cmp(&a.track_id))
        });
    if let Some(winner) = by_overlap {
        return Some(winner.track_id);
    }

    scored
        .iter()
        .filter(|s| s.distance <= dist_threshold)
        .min_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap()
                .then_with(|| a.track_id.cmp(&b.track_id))
        })
        .map(|s| s.track_id)
}

/// Total displacement of the bbox center between a Track's first and last
/// associated Event, used by the finalization movement test.
pub fn has_moved_enough(
    displacement: f64,
    frame_diagonal: f64,
    min_movement_pixels: f64,
    min_movement_percentage: f64,
) -> bool {
    displacement >= min_movement_pixels.max(min_movement_percentage * frame_diagonal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use facewatch_models::MonotonicTime;

    fn candidate(id: u64, bbox: BoundingBox, t: f64) -> TrackCandidate {
        TrackCandidate {
            track_id: TrackId(id),
            last_bbox: bbox,
            last_timestamp: MonotonicTime::from_secs_f64(t),
        }
    }

    #[test]
    fn prefers_overlap_match_over_distance() {
        let candidates = vec![candidate(1, BoundingBox::new(100.0, 100.0, 200.0, 200.0), 0.0)];
        let event_bbox = BoundingBox::new(110.0, 100.0, 210.0, 200.0);
        let matched = associate(
            &candidates,
            event_bbox,
            MonotonicTime::from_secs_f64(0.1),
            1280,
            720,
            0.07,
        );
        assert_eq!(matched, Some(TrackId(1)));
    }

    #[test]
    fn falls_back_to_distance_when_no_overlap() {
        let candidates = vec![candidate(1, BoundingBox::new(100.0, 100.0, 200.0, 200.0), 0.0)];
        let event_bbox = BoundingBox::new(210.0, 100.0, 310.0, 200.0);
        // 1920x1440 -> diagonal = 2400, threshold = 168; center distance = 110.
        let matched = associate(
            &candidates,
            event_bbox,
            MonotonicTime::from_secs_f64(0.1),
            1920,
            1440,
            0.07,
        );
        assert_eq!(matched, Some(TrackId(1)));
    }

    #[test]
    fn temporal_gate_excludes_stale_candidates() {
        let candidates = vec![candidate(1, BoundingBox::new(100.0, 100.0, 200.0, 200.0), 0.0)];
        let event_bbox = BoundingBox::new(100.0, 100.0, 200.0, 200.0);
        let matched = associate(
            &candidates,
            event_bbox,
            MonotonicTime::from_secs_f64(3.0),
            1280,
            720,
            0.07,
        );
        assert_eq!(matched, None);
    }

    #[test]
    fn ties_broken_by_earlier_track_id() {
        let candidates = vec![
            candidate(5, BoundingBox::new(100.0, 100.0, 200.0, 200.0), 0.0),
            candidate(2, BoundingBox::new(100.0, 100.0, 200.0, 200.0), 0.0),
        ];
        let event_bbox = BoundingBox::new(100.0, 100.0, 200.0, 200.0);
        let matched = associate(
            &candidates,
            event_bbox,
            MonotonicTime::from_secs_f64(0.1),
            1280,
            720,
            0.07,
        );
        assert_eq!(matched, Some(TrackId(2)));
    }
}
