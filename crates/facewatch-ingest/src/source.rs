//! The RTSP demuxer/decoder contract: this trait is the seam a real
//! decoder binding plugs into.

use crate::error::IngestorError;

/// One decoded image, prior to pipeline stamping.
pub struct RawDecodedFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Pulls decoded frames from one camera's RTSP stream. Errors are always
/// [`IngestorError::TransientDecodeError`] — enumeration/startup failures
/// are reported separately via `CameraRepository`.
pub trait RtspSource: Send {
    fn next_frame(&mut self) -> Result<RawDecodedFrame, IngestorError>;
}

/// Placeholder source for deployments that haven't wired a real decoder
/// binding yet. Fails fatally on first use rather than spinning the
/// retry loop against a stream that will never produce frames.
pub struct UnconfiguredSource {
    pub camera_id: u32,
}

impl RtspSource for UnconfiguredSource {
    fn next_frame(&mut self) -> Result<RawDecodedFrame, IngestorError> {
        Err(IngestorError::IngestorFatal {
            camera_id: self.camera_id,
            message: "no RtspSource binding configured for this camera".to_string(),
        })
    }
}
