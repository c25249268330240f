//! Bounded queues connecting the four pipeline stages, each with the
//! overflow policy its stage requires.

pub mod bounded;
pub mod error;
pub mod event_queue;
pub mod findface_queue;
pub mod frame_queue;

pub use bounded::BoundedQueue;
pub use error::{QueueError, QueueResult};
pub use event_queue::{EventItem, EventQueue};
pub use findface_queue::FindfaceQueue;
pub use frame_queue::FrameQueue;
