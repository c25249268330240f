//! A single face detection tied to one [`Frame`].

use std::sync::Arc;

use crate::bbox::BoundingBox;
use crate::frame::Frame;
use crate::ids::EventId;
use crate::time::MonotonicTime;

/// A face detected in one Frame.
///
/// **Immutability invariant**: no attribute may be mutated after
/// construction, and `frame` is never cleared while the Event is reachable.
#[derive(Debug, Clone)]
pub struct Event {
    event_id: EventId,
    frame: Arc<Frame>,
    bbox: BoundingBox,
    confidence: f64,
    quality_score: f64,
    timestamp: MonotonicTime,
}

impl Event {
    pub fn new(
        frame: Arc<Frame>,
        bbox: BoundingBox,
        confidence: f64,
        quality_score: f64,
    ) -> Self {
        let timestamp = frame.captured_at();
        Self {
            event_id: EventId::new(),
            frame,
            bbox,
            confidence,
            quality_score,
            timestamp,
        }
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    pub fn frame(&self) -> &Arc<Frame> {
        &self.frame
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn quality_score(&self) -> f64 {
        self.quality_score
    }

    pub fn timestamp(&self) -> MonotonicTime {
        self.timestamp
    }

    /// Produce a new Event whose Frame is an independently-owned pixel crop
    /// of this Event's bbox, suitable for crossing into the Forwarder stage
    /// after the originating Frame (and any other Events derived from it)
    /// has been released.
    pub fn into_owned_copy(&self) -> Event {
        let cropped = self.frame.crop(
            self.bbox.x1().max(0.0) as u32,
            self.bbox.y1().max(0.0) as u32,
            self.bbox.x2().max(0.0) as u32,
            self.bbox.y2().max(0.0) as u32,
        );
        Event {
            event_id: self.event_id,
            frame: Arc::new(cropped),
            bbox: self.bbox,
            confidence: self.confidence,
            quality_score: self.quality_score,
            timestamp: self.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::CameraId;

    fn make_frame(value: u8) -> Arc<Frame> {
        Arc::new(Frame::new(
            CameraId(1),
            100,
            100,
            Arc::from(vec![value; 100 * 100 * 3]),
            MonotonicTime::from_secs_f64(1.0),
        ))
    }

    #[test]
    fn copy_is_independent_of_source_frame() {
        let frame = make_frame(10);
        let event = Event::new(
            Arc::clone(&frame),
            BoundingBox::new(10.0, 10.0, 20.0, 20.0),
            0.9,
            0.5,
        );

        let copy = event.into_owned_copy();

        // Mutating a *new* frame with the same region does not affect the
        // already-taken copy, because the copy owns its own bytes.
        let mutated_frame = Frame::new(
            CameraId(1),
            100,
            100,
            Arc::from(vec![255u8; 100 * 100 * 3]),
            MonotonicTime::from_secs_f64(1.0),
        );
        assert_ne!(mutated_frame.pixels()[0], copy.frame().pixels()[0]);
        assert_eq!(copy.frame().pixels()[0], 10);
    }

    #[test]
    fn timestamp_is_inherited_from_frame() {
        let frame = make_frame(1);
        let event = Event::new(frame, BoundingBox::new(0.0, 0.0, 1.0, 1.0), 0.5, 0.5);
        assert_eq!(event.timestamp(), MonotonicTime::from_secs_f64(1.0));
    }
}
