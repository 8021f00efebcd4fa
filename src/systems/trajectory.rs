use log::{debug, info, warn};

use crate::{
    error::{PipelineError, Stage},
    systems::position_remapping::PositionRemapping,
    tracking::TrajectoryRecord,
    video_interface::{Detection, FrameReader, Tracker},
};

/// Applies a fixed court mapping to every detection of every frame, in
/// order, accumulating one record per mapped detection. No smoothing,
/// gap-filling or identity reconciliation happens here.
pub struct TrajectoryMapper {
    remapping: PositionRemapping,
    records: Vec<TrajectoryRecord>,
    frames_processed: u64,
    dropped: usize,
}

impl TrajectoryMapper {
    pub fn new(remapping: PositionRemapping) -> Self {
        TrajectoryMapper {
            remapping,
            records: Vec::new(),
            frames_processed: 0,
            dropped: 0,
        }
    }

    /// Map one frame's detections, preserving the tracker's order
    pub fn map_frame(&mut self, frame_index: u64, detections: &[Detection]) {
        for detection in detections {
            let center = detection.bbox.center();
            match self.remapping.remap(&center) {
                Some(position) => self.records.push(TrajectoryRecord::new(
                    frame_index,
                    detection.track_id,
                    position,
                )),
                None => {
                    self.dropped += 1;
                    warn!(
                        "Frame {}: track {} at pixel {:?} has no court position; skipped",
                        frame_index, detection.track_id, center
                    );
                }
            }
        }
        self.frames_processed = frame_index;
    }

    /// Read frames until the stream ends, numbering them from 1
    pub fn run<R, T>(&mut self, reader: &mut R, tracker: &mut T) -> Result<(), PipelineError>
    where
        R: FrameReader,
        T: Tracker<R::Frame>,
    {
        let mut frame_index = self.frames_processed;
        while let Some(frame) = reader
            .read_frame()
            .map_err(|e| PipelineError::collaborator(Stage::VideoRead, e))?
        {
            frame_index += 1;
            let detections = tracker
                .track(&frame)
                .map_err(|e| PipelineError::collaborator(Stage::Tracking, e))?;
            debug!("Frame {}: {} detections", frame_index, detections.len());
            self.map_frame(frame_index, &detections);
        }
        info!(
            "Mapped {} frames: {} trajectory records, {} detections skipped",
            self.frames_processed,
            self.records.len(),
            self.dropped
        );
        Ok(())
    }

    pub fn records(&self) -> &[TrajectoryRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<TrajectoryRecord> {
        self.records
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::CollaboratorError,
        homography::Homography,
        systems::position_remapping::{OriginLocation, reference_corners},
        court::CourtCorners,
        video_interface::BoundingBox,
    };

    struct CountingReader {
        remaining: usize,
    }

    impl FrameReader for CountingReader {
        type Frame = usize;

        fn read_frame(&mut self) -> Result<Option<usize>, CollaboratorError> {
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            Ok(Some(self.remaining))
        }
    }

    /// Two players walking right by 10 px per frame
    struct WalkingTracker {
        calls: u64,
    }

    impl Tracker<usize> for WalkingTracker {
        fn track(&mut self, _frame: &usize) -> Result<Vec<Detection>, CollaboratorError> {
            self.calls += 1;
            let dx = self.calls as f64 * 10.;
            Ok(vec![
                Detection::new(BoundingBox::new(100. + dx, 150., 120. + dx, 250.), 2),
                Detection::new(BoundingBox::new(300. + dx, 150., 320. + dx, 250.), 1),
            ])
        }
    }

    struct FailingTracker;

    impl Tracker<usize> for FailingTracker {
        fn track(&mut self, _frame: &usize) -> Result<Vec<Detection>, CollaboratorError> {
            Err("model crashed".into())
        }
    }

    fn remapping() -> PositionRemapping {
        let pixels = CourtCorners {
            top_left: (100., 100.),
            top_right: (500., 100.),
            bottom_right: (500., 300.),
            bottom_left: (100., 300.),
        };
        let reference = reference_corners(13.4, 6.1, OriginLocation::Corner);
        PositionRemapping::new(Homography::fit(&pixels, &reference).unwrap(), reference, None)
    }

    #[test]
    fn test_frames_numbered_from_one_in_tracker_order() {
        let mut mapper = TrajectoryMapper::new(remapping());
        mapper
            .run(&mut CountingReader { remaining: 3 }, &mut WalkingTracker { calls: 0 })
            .unwrap();
        assert_eq!(mapper.frames_processed(), 3);
        let keys: Vec<(u64, u64)> = mapper.records().iter().map(|r| (r.frame, r.track_id)).collect();
        assert_eq!(keys, vec![(1, 2), (1, 1), (2, 2), (2, 1), (3, 2), (3, 1)]);
    }

    #[test]
    fn test_rerun_is_identical() {
        let run = || {
            let mut mapper = TrajectoryMapper::new(remapping());
            mapper
                .run(&mut CountingReader { remaining: 5 }, &mut WalkingTracker { calls: 0 })
                .unwrap();
            mapper.into_records()
        };
        let a = run();
        let b = run();
        assert_eq!(a.len(), 10);
        for (ra, rb) in a.iter().zip(b.iter()) {
            assert_eq!(ra.frame, rb.frame);
            assert_eq!(ra.track_id, rb.track_id);
            assert_eq!(ra.x_meters.to_bits(), rb.x_meters.to_bits());
            assert_eq!(ra.y_meters.to_bits(), rb.y_meters.to_bits());
        }
    }

    #[test]
    fn test_empty_stream_and_empty_frames() {
        let mut mapper = TrajectoryMapper::new(remapping());
        mapper
            .run(&mut CountingReader { remaining: 0 }, &mut FailingTracker)
            .unwrap();
        assert_eq!(mapper.frames_processed(), 0);

        mapper.map_frame(1, &[]);
        assert!(mapper.records().is_empty());
        assert_eq!(mapper.frames_processed(), 1);
    }

    #[test]
    fn test_tracker_failure_propagates() {
        let mut mapper = TrajectoryMapper::new(remapping());
        let result = mapper.run(&mut CountingReader { remaining: 2 }, &mut FailingTracker);
        assert!(matches!(
            result,
            Err(PipelineError::Collaborator {
                stage: Stage::Tracking,
                ..
            })
        ));
    }
}
