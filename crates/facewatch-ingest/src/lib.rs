//! StreamIngestor: pulls decoded frames from RTSP sources onto FrameQueue.

pub mod camera;
pub mod error;
pub mod ingestor;
pub mod source;

pub use camera::{filter_by_prefix, CameraConfig, CameraRepository, StaticCameraRepository};
pub use error::IngestorError;
pub use ingestor::{IngestorConfig, StreamIngestor};
pub use source::{RawDecodedFrame, RtspSource, UnconfiguredSource};
