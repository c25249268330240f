//! AppConfig: the on-disk YAML document plus the `FINDFACE_*` environment
//! overlay, and adapters into each component crate's own config type.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use facewatch_ingest::{CameraConfig, IngestorConfig};
use facewatch_media::DetectorConfig;
use facewatch_tracking::TrackingConfig;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingSection {
    pub cpu_batch_size: u32,
    pub gpu_batch_size: u32,
    pub gpu_devices: Vec<u32>,
}

impl Default for ProcessingSection {
    fn default() -> Self {
        Self {
            cpu_batch_size: 1,
            gpu_batch_size: 32,
            gpu_devices: vec![0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceSection {
    pub detection_skip_frames: u32,
    pub inference_size: u32,
}

impl Default for PerformanceSection {
    fn default() -> Self {
        Self {
            detection_skip_frames: 2,
            inference_size: 640,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YoloSection {
    pub confidence_threshold: f64,
    pub iou_threshold: f64,
}

impl Default for YoloSection {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            iou_threshold: 0.45,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSection {
    pub min_bbox_width: f64,
    pub min_confidence: f64,
}

impl Default for FilterSection {
    fn default() -> Self {
        Self {
            min_bbox_width: 30.0,
            min_confidence: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackSection {
    pub min_movement_percentage: f64,
    pub min_movement_pixels: f64,
}

impl Default for TrackSection {
    fn default() -> Self {
        Self {
            min_movement_percentage: 0.1,
            min_movement_pixels: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueuesSection {
    pub frame_queue_max_size: usize,
    pub event_queue_max_size: usize,
    pub findface_queue_max_size: usize,
}

impl Default for QueuesSection {
    fn default() -> Self {
        Self {
            frame_queue_max_size: 100,
            event_queue_max_size: 1000,
            findface_queue_max_size: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSection {
    pub prefix: String,
    pub rtsp_reconnect_delay: u64,
    pub rtsp_max_retries: u32,
}

impl Default for CameraSection {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            rtsp_reconnect_delay: 5,
            rtsp_max_retries: 3,
        }
    }
}

/// AsyncLogger tuning: `level`/`directory` are the ambient-stack fields a
/// real deployment needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    pub directory: String,
    pub file_prefix: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: "logs".to_string(),
            file_prefix: "application.log".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingSection {
    pub iou_threshold: f64,
    pub max_age: u32,
    pub min_hits: u32,
    pub max_frames: u32,
}

impl Default for TrackingSection {
    fn default() -> Self {
        Self {
            iou_threshold: 0.3,
            max_age: 30,
            min_hits: 3,
            max_frames: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub processing: ProcessingSection,
    pub performance: PerformanceSection,
    pub yolo: YoloSection,
    pub tracking: TrackingSection,
    pub filter: FilterSection,
    pub track: TrackSection,
    pub queues: QueuesSection,
    pub logging: LoggingSection,
    pub camera: CameraSection,
    /// The camera fleet itself — out of scope as a live registry service,
    /// so it's read directly out of the config document.
    pub cameras: Vec<CameraConfig>,
    pub gc_interval_seconds: f64,
    pub tracks_ttl_seconds: f64,
    pub findface_workers: usize,
    pub drain_timeout_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            processing: ProcessingSection::default(),
            performance: PerformanceSection::default(),
            yolo: YoloSection::default(),
            tracking: TrackingSection::default(),
            filter: FilterSection::default(),
            track: TrackSection::default(),
            queues: QueuesSection::default(),
            logging: LoggingSection::default(),
            camera: CameraSection::default(),
            cameras: Vec::new(),
            gc_interval_seconds: 5.0,
            tracks_ttl_seconds: 30.0,
            findface_workers: 2,
            drain_timeout_seconds: 10,
        }
    }
}

/// Face-recognition service credentials, overlaid from the environment
/// (never stored in the config file).
#[derive(Debug, Clone)]
pub struct FindfaceCredentials {
    pub url: String,
    pub user: String,
    pub password: String,
    pub uuid: String,
}

impl FindfaceCredentials {
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            url: std::env::var("FINDFACE_URL")
                .map_err(|_| AppError::Config("FINDFACE_URL not set".to_string()))?,
            user: std::env::var("FINDFACE_USER")
                .map_err(|_| AppError::Config("FINDFACE_USER not set".to_string()))?,
            password: std::env::var("FINDFACE_PASSWORD")
                .map_err(|_| AppError::Config("FINDFACE_PASSWORD not set".to_string()))?,
            uuid: std::env::var("FINDFACE_UUID")
                .map_err(|_| AppError::Config("FINDFACE_UUID not set".to_string()))?,
        })
    }
}

impl AppConfig {
    /// Load the YAML config file at `path`. `dotenvy::dotenv()` should be
    /// called by the binary before this, so `FindfaceCredentials::from_env`
    /// sees values from a `.env` file too.
    pub fn load(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("reading {}: {e}", path.display())))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| AppError::Config(format!("parsing {}: {e}", path.display())))
    }

    pub fn tracking_config(&self) -> TrackingConfig {
        TrackingConfig {
            iou_threshold: self.tracking.iou_threshold,
            max_age: self.tracking.max_age,
            min_hits: self.tracking.min_hits,
            max_frames: self.tracking.max_frames,
            min_movement_percentage: self.track.min_movement_percentage,
            min_movement_pixels: self.track.min_movement_pixels,
            distance_ratio_of_diagonal: 0.07,
            tracks_ttl_seconds: self.tracks_ttl_seconds,
        }
    }

    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            cpu_batch_size: self.processing.cpu_batch_size,
            gpu_batch_size: self.processing.gpu_batch_size,
            gpu_devices: self.processing.gpu_devices.clone(),
            detection_skip_frames: self.performance.detection_skip_frames,
            inference_size: self.performance.inference_size,
            confidence_threshold: self.yolo.confidence_threshold,
            iou_threshold: self.yolo.iou_threshold,
            min_bbox_width: self.filter.min_bbox_width,
            min_confidence: self.filter.min_confidence,
        }
    }

    pub fn ingestor_config(&self) -> IngestorConfig {
        IngestorConfig {
            rtsp_reconnect_delay: Duration::from_secs(self.camera.rtsp_reconnect_delay),
            rtsp_max_retries: self.camera.rtsp_max_retries,
        }
    }

    pub fn gc_interval(&self) -> Duration {
        Duration::from_secs_f64(self.gc_interval_seconds)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.queues.frame_queue_max_size, 100);
        assert_eq!(config.queues.event_queue_max_size, 1000);
        assert_eq!(config.tracking.max_age, 30);
        assert_eq!(config.findface_workers, 2);
    }

    #[test]
    fn load_parses_partial_yaml_with_defaults_for_missing_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "tracking:\n  max_age: 45\n").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.tracking.max_age, 45);
        assert_eq!(config.tracking.min_hits, 3); // default, not overridden
    }

    #[test]
    fn load_missing_file_is_a_config_error() {
        let err = AppConfig::load(Path::new("/nonexistent/config.yaml")).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }
}
