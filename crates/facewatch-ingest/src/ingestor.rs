//! StreamIngestor: one per camera, decode loop with drop-oldest push and
//! bounded reconnect backoff.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use facewatch_models::{CameraId, Frame, MonotonicTime};
use facewatch_queue::FrameQueue;
use tracing::{error, warn};

use crate::error::IngestorError;
use crate::source::RtspSource;

#[derive(Debug, Clone, Copy)]
pub struct IngestorConfig {
    pub rtsp_reconnect_delay: Duration,
    pub rtsp_max_retries: u32,
}

impl Default for IngestorConfig {
    fn default() -> Self {
        Self {
            rtsp_reconnect_delay: Duration::from_secs(5),
            rtsp_max_retries: 3,
        }
    }
}

pub struct StreamIngestor<S: RtspSource> {
    camera_id: CameraId,
    source: S,
    config: IngestorConfig,
    epoch: Instant,
    consecutive_errors: u32,
}

impl<S: RtspSource> StreamIngestor<S> {
    pub fn new(camera_id: CameraId, source: S, config: IngestorConfig) -> Self {
        Self {
            camera_id,
            source,
            config,
            epoch: Instant::now(),
            consecutive_errors: 0,
        }
    }

    /// Decode, stamp, and push one frame. Returns `Ok(true)` on success,
    /// `Ok(false)` if the retry budget for this disconnect was exhausted
    /// (the caller should exit this ingestor; other cameras continue), and
    /// `Err` is never returned here — decode errors are retried internally.
    fn pump_one(&mut self, frame_queue: &FrameQueue) -> bool {
        match self.source.next_frame() {
            Ok(raw) => {
                self.consecutive_errors = 0;
                let frame = Arc::new(Frame::new(
                    self.camera_id,
                    raw.width,
                    raw.height,
                    Arc::from(raw.pixels),
                    MonotonicTime::since(self.epoch),
                ));
                if frame_queue.push(frame).is_err() {
                    // Queue closed: shutdown in progress.
                    return false;
                }
                true
            }
            Err(IngestorError::TransientDecodeError(msg)) => {
                self.consecutive_errors += 1;
                warn!(
                    camera_id = %self.camera_id,
                    attempt = self.consecutive_errors,
                    error = %msg,
                    "transient decode error, backing off"
                );
                if self.consecutive_errors > self.config.rtsp_max_retries {
                    error!(camera_id = %self.camera_id, "exceeded rtsp_max_retries, exiting ingestor for this camera");
                    return false;
                }
                std::thread::sleep(self.config.rtsp_reconnect_delay);
                true
            }
            Err(IngestorError::IngestorFatal { camera_id, message }) => {
                error!(camera_id, %message, "ingestor fatal");
                false
            }
        }
    }

    pub fn run(&mut self, frame_queue: &FrameQueue, stop: &Arc<AtomicBool>) {
        while !stop.load(Ordering::Relaxed) {
            if !self.pump_one(frame_queue) {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlakySource {
        failures_then_success: u32,
    }

    impl RtspSource for FlakySource {
        fn next_frame(&mut self) -> Result<crate::source::RawDecodedFrame, IngestorError> {
            if self.failures_then_success > 0 {
                self.failures_then_success -= 1;
                return Err(IngestorError::TransientDecodeError("socket reset".into()));
            }
            Ok(crate::source::RawDecodedFrame {
                width: 4,
                height: 4,
                pixels: vec![0u8; 4 * 4 * 3],
            })
        }
    }

    #[test]
    fn recovers_after_transient_errors_within_retry_budget() {
        let source = FlakySource {
            failures_then_success: 2,
        };
        let mut ingestor = StreamIngestor::new(
            CameraId(1),
            source,
            IngestorConfig {
                rtsp_reconnect_delay: Duration::from_millis(1),
                rtsp_max_retries: 3,
            },
        );
        let queue = FrameQueue::new(4);
        assert!(ingestor.pump_one(&queue)); // fail 1
        assert!(ingestor.pump_one(&queue)); // fail 2
        assert!(ingestor.pump_one(&queue)); // success
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn exceeding_retry_budget_stops_the_ingestor() {
        let source = FlakySource {
            failures_then_success: 10,
        };
        let mut ingestor = StreamIngestor::new(
            CameraId(1),
            source,
            IngestorConfig {
                rtsp_reconnect_delay: Duration::from_millis(1),
                rtsp_max_retries: 2,
            },
        );
        let queue = FrameQueue::new(4);
        assert!(ingestor.pump_one(&queue));
        assert!(ingestor.pump_one(&queue));
        assert!(!ingestor.pump_one(&queue)); // retry budget exceeded
    }
}
