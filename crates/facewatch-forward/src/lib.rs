//! Forwarder stage: submits selected Events to the external
//! face-recognition service.

pub mod client;
pub mod error;
pub mod forwarder;

pub use client::{FindfaceClient, FindfaceClientConfig};
pub use error::ForwardError;
pub use forwarder::run_forwarder_worker;
