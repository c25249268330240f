//! `processing.*` / `performance.*` / `yolo.*` / `filter.*` configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub cpu_batch_size: u32,
    pub gpu_batch_size: u32,
    pub gpu_devices: Vec<u32>,
    pub detection_skip_frames: u32,
    pub inference_size: u32,
    pub confidence_threshold: f64,
    pub iou_threshold: f64,
    pub min_bbox_width: f64,
    pub min_confidence: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            cpu_batch_size: 1,
            gpu_batch_size: 32,
            gpu_devices: vec![0],
            detection_skip_frames: 2,
            inference_size: 640,
            confidence_threshold: 0.5,
            iou_threshold: 0.45,
            min_bbox_width: 30.0,
            min_confidence: 0.5,
        }
    }
}
