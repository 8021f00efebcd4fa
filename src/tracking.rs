use serde::{Deserialize, Serialize};

/// One output row: where a tracked entity stood on the court in one frame
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryRecord {
    /// 1-based frame index
    pub frame: u64,
    pub track_id: u64,
    pub x_meters: f64,
    pub y_meters: f64,
}

impl TrajectoryRecord {
    pub fn new(frame: u64, track_id: u64, position: (f64, f64)) -> Self {
        TrajectoryRecord {
            frame,
            track_id,
            x_meters: position.0,
            y_meters: position.1,
        }
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x_meters, self.y_meters)
    }
}
