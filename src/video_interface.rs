//! Seams to the external collaborators: video decoding, court-line mask
//! detection, line segment extraction and multi-object tracking.

use serde::{Deserialize, Serialize};

use crate::{Point2D, error::CollaboratorError, lines::LineSegment};

/// Something that can be (re)opened as a fresh, sequential stream of frames.
/// Calibration reads the first frame from one stream; trajectory mapping
/// opens a second one from the start.
pub trait VideoSource {
    type Frame;
    type Reader: FrameReader<Frame = Self::Frame>;

    fn open(&self) -> Result<Self::Reader, CollaboratorError>;

    /// File name of the video; names the output artifact
    fn name(&self) -> String;
}

pub trait FrameReader {
    type Frame;

    /// Blocks until the next frame is decoded; Ok(None) at end of stream
    fn read_frame(&mut self) -> Result<Option<Self::Frame>, CollaboratorError>;
}

/// Returns a mask of court-line pixels, same size as the frame
pub trait CourtMaskDetector<F> {
    type Mask;

    fn detect_court_mask(&mut self, frame: &F) -> Result<Self::Mask, CollaboratorError>;
}

/// Edge detection followed by line segment detection on a court mask
pub trait LineExtractor<M> {
    fn extract_lines(&mut self, mask: &M) -> Result<Vec<LineSegment>, CollaboratorError>;
}

/// Stateful detector + tracker, called exactly once per frame, in order.
/// Identity continuity across frames is entirely its responsibility.
pub trait Tracker<F> {
    fn track(&mut self, frame: &F) -> Result<Vec<Detection>, CollaboratorError>;
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        BoundingBox { x1, y1, x2, y2 }
    }

    pub fn center(&self) -> Point2D {
        ((self.x1 + self.x2) / 2., (self.y1 + self.y2) / 2.)
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from(b: [f64; 4]) -> Self {
        BoundingBox::new(b[0], b[1], b[2], b[3])
    }
}

/// One tracked entity in one frame. The track id is an opaque key owned
/// by the tracker.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    #[serde(with = "bbox_as_array")]
    pub bbox: BoundingBox,
    pub track_id: u64,
}

impl Detection {
    pub fn new(bbox: BoundingBox, track_id: u64) -> Self {
        Detection { bbox, track_id }
    }
}

/// Boxes travel as `[x1, y1, x2, y2]`, the shape trackers usually emit
mod bbox_as_array {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::BoundingBox;

    pub fn serialize<S: Serializer>(b: &BoundingBox, s: S) -> Result<S::Ok, S::Error> {
        [b.x1, b.y1, b.x2, b.y2].serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BoundingBox, D::Error> {
        <[f64; 4]>::deserialize(d).map(BoundingBox::from)
    }
}
