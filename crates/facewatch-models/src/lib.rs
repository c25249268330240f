//! Shared data model for the facewatch pipeline: frames, detections, tracks,
//! and the identifiers that tie them together.

pub mod bbox;
pub mod event;
pub mod frame;
pub mod ids;
pub mod time;
pub mod track;

pub use bbox::BoundingBox;
pub use event::Event;
pub use frame::Frame;
pub use ids::{CameraId, EventId, TrackId, TrackIdAllocator};
pub use time::MonotonicTime;
pub use track::{ActiveTrack, FinalizedTrack, Track, TrackState};
