//! FindfaceClient: the wire protocol to the external face-recognition
//! service — login once at startup, then pooled multipart submissions.

use std::io::Cursor;
use std::time::Duration;

use chrono::{DateTime, Utc};
use facewatch_models::Event;
use image::{ImageBuffer, Rgb};
use reqwest::blocking::{multipart, Client};
use serde::Deserialize;

use crate::error::{ForwardError, ForwardResult};

#[derive(Debug, Clone)]
pub struct FindfaceClientConfig {
    pub base_url: String,
    pub user: String,
    pub password: String,
    pub uuid: String,
    pub max_connections: usize,
    pub request_timeout: Duration,
    /// Wall-clock instant corresponding to `MonotonicTime::ZERO`, so Event
    /// timestamps (monotonic, process-relative) can be rendered as the
    /// ISO-8601 wall-clock timestamps the wire protocol requires.
    pub process_started_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

/// Pooled HTTP client holding the bearer token obtained at orchestrator
/// startup. `reqwest::blocking::Client` rather than the async client: the
/// pipeline is OS-thread based, so Forwarder workers call this from plain
/// threads with no executor to drive futures on.
pub struct FindfaceClient {
    http: Client,
    base_url: String,
    token: String,
    process_started_at: DateTime<Utc>,
}

impl FindfaceClient {
    /// `POST /login` with `{user, password, uuid}` → `{token}`. Called once
    /// at orchestrator startup; a failure here is a startup failure
    /// (process exit code 2), not a per-submission retry.
    pub fn login(config: &FindfaceClientConfig) -> ForwardResult<Self> {
        let http = Client::builder()
            .pool_max_idle_per_host(config.max_connections)
            .timeout(config.request_timeout)
            .build()
            .map_err(ForwardError::Network)?;

        let response = http
            .post(format!("{}/login", config.base_url))
            .json(&serde_json::json!({
                "user": config.user,
                "password": config.password,
                "uuid": config.uuid,
            }))
            .send()
            .map_err(ForwardError::Network)?;

        if !response.status().is_success() {
            return Err(ForwardError::LoginFailed(format!(
                "status {}",
                response.status()
            )));
        }

        let body: LoginResponse = response
            .json()
            .map_err(|e| ForwardError::LoginFailed(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            token: body.token,
            process_started_at: config.process_started_at,
        })
    }

    /// Submit one Event's cropped face image. Caller is responsible for
    /// passing an already-owned-copy Event (see `Event::into_owned_copy`).
    pub fn submit(&self, event: &Event) -> ForwardResult<()> {
        let jpeg_bytes = encode_jpeg(event)?;
        let timestamp = self.process_started_at
            + chrono::Duration::milliseconds((event.timestamp().as_secs_f64() * 1000.0) as i64);
        let bbox = event.bbox();

        let form = multipart::Form::new()
            .text("event_id", event.event_id().to_string())
            .text("camera_id", event.frame().camera_id().to_string())
            .text("timestamp", timestamp.to_rfc3339())
            .text(
                "bbox",
                format!(
                    "{},{},{},{}",
                    bbox.x1() as i64,
                    bbox.y1() as i64,
                    bbox.x2() as i64,
                    bbox.y2() as i64
                ),
            )
            .part(
                "image",
                multipart::Part::bytes(jpeg_bytes)
                    .file_name("face.jpg")
                    .mime_str("image/jpeg")
                    .map_err(ForwardError::Network)?,
            );

        let response = self
            .http
            .post(format!("{}/submit", self.base_url))
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .map_err(ForwardError::Network)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().unwrap_or_default();
        if status.is_client_error() {
            Err(ForwardError::PermanentUpstream {
                status: status.as_u16(),
                body,
            })
        } else {
            Err(ForwardError::TransientUpstream {
                status: status.as_u16(),
                body,
            })
        }
    }
}

fn encode_jpeg(event: &Event) -> ForwardResult<Vec<u8>> {
    let frame = event.frame();
    let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_raw(frame.width(), frame.height(), frame.pixels().to_vec())
            .ok_or_else(|| {
                ForwardError::Encoding(image::ImageError::Parameter(
                    image::error::ParameterError::from_kind(
                        image::error::ParameterErrorKind::DimensionMismatch,
                    ),
                ))
            })?;

    let mut out = Vec::new();
    buffer
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Jpeg)
        .map_err(ForwardError::Encoding)?;
    Ok(out)
}
