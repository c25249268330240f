//! The face detector contract: a pure, GPU-resident, thread-confined batch
//! detection model. This trait is the seam a real model binding plugs into.

use std::sync::Arc;

use facewatch_models::{BoundingBox, Frame};

/// One raw detection from the model, before the Detector's own filters run.
#[derive(Debug, Clone, Copy)]
pub struct DetectedBox {
    pub bbox: BoundingBox,
    pub confidence: f64,
}

/// `detect(images) -> per-frame detection lists`. Implementations must be
/// side-effect free and safe to call from a single thread pinned to one
/// GPU device.
pub trait FaceDetector: Send + Sync {
    fn detect(&self, frames: &[Arc<Frame>]) -> Vec<Vec<DetectedBox>>;
}

/// Placeholder detector for deployments that haven't wired a real model
/// binding yet. Always returns no detections; logs a warning once so the
/// silence doesn't go unnoticed.
pub struct UnconfiguredDetector {
    warned: std::sync::Once,
}

impl Default for UnconfiguredDetector {
    fn default() -> Self {
        Self {
            warned: std::sync::Once::new(),
        }
    }
}

impl FaceDetector for UnconfiguredDetector {
    fn detect(&self, frames: &[Arc<Frame>]) -> Vec<Vec<DetectedBox>> {
        self.warned.call_once(|| {
            tracing::warn!("no FaceDetector binding configured; all frames will detect zero faces");
        });
        frames.iter().map(|_| Vec::new()).collect()
    }
}

/// A detector double for tests: returns a fixed set of boxes for every
/// frame it sees, regardless of pixel content.
#[cfg(test)]
pub struct FixedFaceDetector {
    pub boxes: Vec<DetectedBox>,
}

#[cfg(test)]
impl FaceDetector for FixedFaceDetector {
    fn detect(&self, frames: &[Arc<Frame>]) -> Vec<Vec<DetectedBox>> {
        frames.iter().map(|_| self.boxes.clone()).collect()
    }
}
