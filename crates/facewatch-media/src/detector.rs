//! Detector: drains FrameQueue in batches, runs the detection model, emits
//! Events onto EventQueue.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use facewatch_models::{CameraId, Event, Frame};
use facewatch_queue::{EventItem, EventQueue, FrameQueue};
use tracing::warn;

use crate::config::DetectorConfig;
use crate::model::FaceDetector;
use crate::quality::FaceQualityService;

pub struct Detector {
    model: Arc<dyn FaceDetector>,
    quality: Arc<dyn FaceQualityService>,
    config: DetectorConfig,
    frame_counters: HashMap<CameraId, u32>,
    last_dropped_logged: u64,
}

impl Detector {
    pub fn new(
        model: Arc<dyn FaceDetector>,
        quality: Arc<dyn FaceQualityService>,
        config: DetectorConfig,
    ) -> Self {
        Self {
            model,
            quality,
            config,
            frame_counters: HashMap::new(),
            last_dropped_logged: 0,
        }
    }

    /// `true` if this frame should be kept for detection under
    /// `detection_skip_frames` (every Nth frame per camera is kept).
    fn should_keep(&mut self, camera_id: CameraId) -> bool {
        if self.config.detection_skip_frames == 0 {
            return true;
        }
        let counter = self.frame_counters.entry(camera_id).or_insert(0);
        let keep = *counter % self.config.detection_skip_frames == 0;
        *counter = counter.wrapping_add(1);
        keep
    }

    /// Pull up to `gpu_batch_size` frames, applying the skip-frame filter,
    /// blocking for the first frame and draining the rest non-blocking.
    fn next_batch(&mut self, frame_queue: &FrameQueue) -> Vec<Arc<Frame>> {
        let mut batch = Vec::new();
        let Some(first) = frame_queue.pop_blocking() else {
            return batch;
        };
        if self.should_keep(first.camera_id()) {
            batch.push(first);
        }
        if self.config.gpu_batch_size > 1 {
            let rest = frame_queue.try_drain_batch(self.config.gpu_batch_size as usize - 1);
            for frame in rest {
                if self.should_keep(frame.camera_id()) {
                    batch.push(frame);
                }
            }
        }
        batch
    }

    /// Run detection on one batch and push resulting Events (plus a
    /// FrameComplete marker per processed frame) onto `event_queue`.
    fn process_batch(&mut self, batch: Vec<Arc<Frame>>, event_queue: &EventQueue) {
        if batch.is_empty() {
            return;
        }
        let detections = self.model.detect(&batch);

        for (frame, boxes) in batch.into_iter().zip(detections) {
            for detected in boxes {
                if detected.bbox.width() < self.config.min_bbox_width {
                    continue;
                }
                if detected.confidence < self.config.min_confidence {
                    continue;
                }
                let quality_score = self.quality.score(
                    &detected.bbox,
                    detected.confidence,
                    frame.width(),
                    frame.height(),
                );
                let event = Event::new(Arc::clone(&frame), detected.bbox, detected.confidence, quality_score);
                if !event_queue.push(EventItem::Detected(event)) {
                    self.log_drop(event_queue);
                }
            }
            if !event_queue.push(EventItem::FrameComplete {
                camera_id: frame.camera_id(),
            }) {
                self.log_drop(event_queue);
            }
        }
    }

    fn log_drop(&mut self, event_queue: &EventQueue) {
        let dropped = event_queue.dropped();
        if dropped / 100 > self.last_dropped_logged / 100 {
            warn!(dropped, "EventQueue drops crossed another 100-item boundary");
        }
        self.last_dropped_logged = dropped;
    }

    pub fn run(&mut self, frame_queue: &FrameQueue, event_queue: &EventQueue, stop: &Arc<AtomicBool>) {
        loop {
            if stop.load(Ordering::Relaxed) && frame_queue.len() == 0 {
                break;
            }
            let batch = self.next_batch(frame_queue);
            if batch.is_empty() && frame_queue.is_closed() {
                break;
            }
            self.process_batch(batch, event_queue);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facewatch_models::{BoundingBox, MonotonicTime};
    use facewatch_queue::EventItem;

    use crate::model::{DetectedBox, FixedFaceDetector};
    use crate::quality::HeuristicQualityService;

    fn frame(camera: u32) -> Arc<Frame> {
        Arc::new(Frame::new(
            CameraId(camera),
            640,
            480,
            Arc::from(vec![0u8; 640 * 480 * 3]),
            MonotonicTime::ZERO,
        ))
    }

    #[test]
    fn filters_boxes_below_confidence_and_width_thresholds() {
        let model = Arc::new(FixedFaceDetector {
            boxes: vec![
                DetectedBox {
                    bbox: BoundingBox::new(0.0, 0.0, 100.0, 100.0),
                    confidence: 0.9,
                },
                DetectedBox {
                    bbox: BoundingBox::new(0.0, 0.0, 5.0, 5.0), // too narrow
                    confidence: 0.9,
                },
                DetectedBox {
                    bbox: BoundingBox::new(0.0, 0.0, 100.0, 100.0),
                    confidence: 0.1, // too low confidence
                },
            ],
        });
        let mut detector = Detector::new(
            model,
            Arc::new(HeuristicQualityService),
            DetectorConfig {
                detection_skip_frames: 0,
                gpu_batch_size: 1,
                min_bbox_width: 30.0,
                min_confidence: 0.5,
                ..Default::default()
            },
        );
        let event_queue = EventQueue::new(10, std::time::Duration::from_millis(500));
        detector.process_batch(vec![frame(1)], &event_queue);

        assert_eq!(event_queue.len(), 2);
        let first = event_queue.pop_blocking().unwrap();
        let second = event_queue.pop_blocking().unwrap();
        assert!(matches!(first, EventItem::Detected(_)));
        assert!(matches!(second, EventItem::FrameComplete { camera_id } if camera_id == CameraId(1)));
    }

    #[test]
    fn skip_frames_keeps_only_every_nth_frame_per_camera() {
        let model = Arc::new(FixedFaceDetector { boxes: vec![] });
        let mut detector = Detector::new(
            model,
            Arc::new(HeuristicQualityService),
            DetectorConfig {
                detection_skip_frames: 2,
                ..Default::default()
            },
        );
        let kept: Vec<bool> = (0..4).map(|_| detector.should_keep(CameraId(1))).collect();
        assert_eq!(kept, vec![true, false, true, false]);
    }
}
