//! Ingestor error types.

use thiserror::Error;

pub type IngestorResult<T> = Result<T, IngestorError>;

#[derive(Debug, Error)]
pub enum IngestorError {
    /// Camera/model enumeration failure at startup — not retried.
    #[error("ingestor fatal for camera {camera_id}: {message}")]
    IngestorFatal { camera_id: u32, message: String },

    /// Recoverable read/socket error — retried internally by the ingestor.
    #[error("transient decode error: {0}")]
    TransientDecodeError(String),
}
