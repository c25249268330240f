//! Face quality scoring: pure, side-effect-free arbitration of "best" among
//! candidate Events for the same Track.

use facewatch_models::BoundingBox;

/// Scores a detected face given its bbox geometry and detector confidence.
/// Must be pure — no I/O, no shared mutable state — since it runs on the
/// Detector's hot path once per detection.
pub trait FaceQualityService: Send + Sync {
    fn score(&self, bbox: &BoundingBox, confidence: f64, frame_width: u32, frame_height: u32) -> f64;
}

/// Reference quality heuristic: confidence weighted by how large the face
/// is relative to the frame (bigger, more frontal-looking faces tend to be
/// better recognition material) and a mild centering bonus.
pub struct HeuristicQualityService;

impl FaceQualityService for HeuristicQualityService {
    fn score(&self, bbox: &BoundingBox, confidence: f64, frame_width: u32, frame_height: u32) -> f64 {
        let frame_area = (frame_width as f64 * frame_height as f64).max(1.0);
        let size_ratio = (bbox.area() / frame_area).clamp(0.0, 1.0);

        let (cx, cy) = bbox.center();
        let frame_cx = frame_width as f64 / 2.0;
        let frame_cy = frame_height as f64 / 2.0;
        let frame_diagonal = ((frame_width as f64).powi(2) + (frame_height as f64).powi(2)).sqrt();
        let center_offset = if frame_diagonal > 0.0 {
            (((cx - frame_cx).powi(2) + (cy - frame_cy).powi(2)).sqrt()) / (frame_diagonal / 2.0)
        } else {
            0.0
        };
        let centering_bonus = (1.0 - center_offset.min(1.0)) * 0.1;

        (confidence * (0.7 + 0.3 * size_ratio.sqrt())) + centering_bonus
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn larger_faces_score_higher_at_equal_confidence() {
        let svc = HeuristicQualityService;
        let small = BoundingBox::new(300.0, 300.0, 330.0, 330.0);
        let large = BoundingBox::new(200.0, 200.0, 400.0, 400.0);
        assert!(svc.score(&large, 0.9, 640, 640) > svc.score(&small, 0.9, 640, 640));
    }

    #[test]
    fn higher_confidence_scores_higher_at_equal_geometry() {
        let svc = HeuristicQualityService;
        let bbox = BoundingBox::new(100.0, 100.0, 200.0, 200.0);
        assert!(svc.score(&bbox, 0.9, 640, 640) > svc.score(&bbox, 0.5, 640, 640));
    }
}
