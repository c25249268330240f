//! Top-level application error, covering the startup and fatal paths.
//! Per-item errors (dropped Events, retried submissions) never surface
//! here — only `ConfigError` and startup failures abort the process.

use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("camera enumeration failed: {0}")]
    CameraEnumeration(String),

    #[error("face-recognition login failed: {0}")]
    Login(#[from] facewatch_forward::ForwardError),

    #[error("ingestor error: {0}")]
    Ingestor(#[from] facewatch_ingest::IngestorError),
}

impl AppError {
    /// Process exit code returned by the binary's CLI surface.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) => 1,
            AppError::CameraEnumeration(_) | AppError::Login(_) | AppError::Ingestor(_) => 2,
        }
    }
}
