use std::{fs, path::Path};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    error::CollaboratorError,
    video_interface::{Detection, Tracker},
};

/// One entry of a recorded tracker run
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RecordedFrame {
    pub frame: u64,
    #[serde(default)]
    pub detections: Vec<Detection>,
}

/// A tracker that plays back detections recorded by an external
/// detector/tracker, one call per frame starting at frame 1.
/// Frames missing from the recording yield no detections.
#[derive(Debug, Clone, Default)]
pub struct ReplayTracker {
    frames: IndexMap<u64, Vec<Detection>>,
    next_frame: u64,
}

impl ReplayTracker {
    pub fn new(recorded: Vec<RecordedFrame>) -> Self {
        let mut frames: IndexMap<u64, Vec<Detection>> = IndexMap::new();
        for f in recorded {
            frames.entry(f.frame).or_default().extend(f.detections);
        }
        ReplayTracker {
            frames,
            next_frame: 1,
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read detections file {:?}", path))?;
        let recorded: Vec<RecordedFrame> = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse detections file {:?}", path))?;
        info!(
            "Loaded {} recorded frames of detections from {:?}",
            recorded.len(),
            path
        );
        Ok(ReplayTracker::new(recorded))
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl<F> Tracker<F> for ReplayTracker {
    fn track(&mut self, _frame: &F) -> Result<Vec<Detection>, CollaboratorError> {
        let frame_index = self.next_frame;
        self.next_frame += 1;
        let detections = self.frames.get(&frame_index).cloned().unwrap_or_default();
        debug!("Replaying {} detections for frame {}", detections.len(), frame_index);
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video_interface::BoundingBox;

    #[test]
    fn test_replay_in_frame_order_with_gaps() {
        let json = r#"[
            {"frame": 1, "detections": [{"bbox": [0, 0, 10, 10], "trackId": 3}]},
            {"frame": 3, "detections": [{"bbox": [5, 5, 15, 15], "trackId": 3},
                                        {"bbox": [50, 50, 60, 60], "trackId": 8}]},
            {"frame": 1, "detections": [{"bbox": [20, 20, 30, 30], "trackId": 9}]}
        ]"#;
        let recorded: Vec<RecordedFrame> = serde_json::from_str(json).unwrap();
        let mut tracker = ReplayTracker::new(recorded);
        assert_eq!(tracker.frame_count(), 2);

        let first = tracker.track(&()).unwrap();
        assert_eq!(
            first,
            vec![
                Detection::new(BoundingBox::new(0., 0., 10., 10.), 3),
                Detection::new(BoundingBox::new(20., 20., 30., 30.), 9),
            ]
        );
        assert!(tracker.track(&()).unwrap().is_empty());
        let third: Vec<u64> = tracker.track(&()).unwrap().iter().map(|d| d.track_id).collect();
        assert_eq!(third, vec![3, 8]);
        assert!(tracker.track(&()).unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(ReplayTracker::load_from_file(Path::new("/nonexistent/detections.json")).is_err());
    }
}
