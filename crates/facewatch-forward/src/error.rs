//! Forwarder error types, classified into transient (retried) and
//! permanent (logged and dropped).

use thiserror::Error;

pub type ForwardResult<T> = Result<T, ForwardError>;

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("login failed: {0}")]
    LoginFailed(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("image encoding failed: {0}")]
    Encoding(#[from] image::ImageError),

    #[error("upstream rejected submission ({status}): {body}")]
    PermanentUpstream { status: u16, body: String },

    #[error("upstream transient failure ({status}): {body}")]
    TransientUpstream { status: u16, body: String },
}

impl ForwardError {
    /// Transient failures (network error, 5xx) are retried with backoff;
    /// everything else is logged once and the Event is dropped.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ForwardError::Network(_) | ForwardError::TransientUpstream { .. }
        )
    }
}
