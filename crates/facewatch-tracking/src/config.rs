//! Association and lifecycle thresholds for the track manager.

use serde::{Deserialize, Serialize};

/// `tracking.*` / `track.*` configuration sections.
///
/// `iou_threshold` is accepted for configuration-file compatibility but is
/// not consulted by the association algorithm: matching uses the
/// width-adaptive thresholds in [`crate::association::adaptive_iou_threshold`]
/// instead, per the resolved "overlap metric" design question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub iou_threshold: f64,
    pub max_age: u32,
    pub min_hits: u32,
    pub max_frames: u32,
    pub min_movement_percentage: f64,
    pub min_movement_pixels: f64,
    /// Fraction of the frame diagonal used as the center-distance fallback
    /// threshold.
    pub distance_ratio_of_diagonal: f64,
    pub tracks_ttl_seconds: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            iou_threshold: 0.3,
            max_age: 30,
            min_hits: 3,
            max_frames: 500,
            min_movement_percentage: 0.1,
            min_movement_pixels: 50.0,
            distance_ratio_of_diagonal: 0.07,
            tracks_ttl_seconds: 30.0,
        }
    }
}

/// How long an Event may lag a Track's `last_event` and still be eligible
/// to match it.
pub const TEMPORAL_GATE_SECS: f64 = 2.0;
