//! Detection stage: batches frames through an external detection model,
//! filters results, and scores face quality.

pub mod config;
pub mod detector;
pub mod model;
pub mod quality;

pub use config::DetectorConfig;
pub use detector::Detector;
pub use model::{DetectedBox, FaceDetector, UnconfiguredDetector};
pub use quality::{FaceQualityService, HeuristicQualityService};
