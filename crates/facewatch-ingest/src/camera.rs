//! Camera repository: a read-only enumeration invoked once at startup.

use serde::{Deserialize, Serialize};

use crate::error::IngestorResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub camera_id: u32,
    pub rtsp_url: String,
    pub width: u32,
    pub height: u32,
}

/// Enumerates configured cameras. Implementations back this with whatever
/// registry/service holds camera metadata.
pub trait CameraRepository: Send + Sync {
    fn list_cameras(&self) -> IngestorResult<Vec<CameraConfig>>;
}

/// A `CameraRepository` backed by a fixed, in-memory list — the camera
/// section of the loaded config file, rather than a live registry service.
pub struct StaticCameraRepository {
    cameras: Vec<CameraConfig>,
}

impl StaticCameraRepository {
    pub fn new(cameras: Vec<CameraConfig>) -> Self {
        Self { cameras }
    }
}

impl CameraRepository for StaticCameraRepository {
    fn list_cameras(&self) -> IngestorResult<Vec<CameraConfig>> {
        Ok(self.cameras.clone())
    }
}

/// Keep only cameras whose `rtsp_url` starts with `prefix`; an empty prefix
/// matches everything.
pub fn filter_by_prefix(cameras: Vec<CameraConfig>, prefix: &str) -> Vec<CameraConfig> {
    if prefix.is_empty() {
        return cameras;
    }
    cameras
        .into_iter()
        .filter(|c| c.rtsp_url.starts_with(prefix))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_prefix_keeps_all_cameras() {
        let cams = vec![CameraConfig {
            camera_id: 1,
            rtsp_url: "rtsp://a".into(),
            width: 640,
            height: 480,
        }];
        assert_eq!(filter_by_prefix(cams.clone(), "").len(), 1);
    }

    #[test]
    fn non_matching_prefix_filters_out_camera() {
        let cams = vec![CameraConfig {
            camera_id: 1,
            rtsp_url: "rtsp://lobby/1".into(),
            width: 640,
            height: 480,
        }];
        assert!(filter_by_prefix(cams, "rtsp://entrance").is_empty());
    }
}
