//! End-to-end processing of one video: calibrate on the first frame, then
//! map every frame's detections onto the court and persist the result.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::{
    backend_config::PipelineConfig,
    court::CourtCorners,
    error::{PipelineError, Stage},
    homography::Homography,
    result_writer::{output_path_for, write_records},
    systems::{
        calibration::CalibrationSystem, position_remapping::PositionRemapping,
        trajectory::TrajectoryMapper,
    },
    video_interface::{CourtMaskDetector, FrameReader, LineExtractor, Tracker, VideoSource},
};

/// The per-video external collaborators. Each pipeline run owns its own
/// set, so concurrent runs never share tracker state.
pub struct Collaborators<D, E, T> {
    pub mask_detector: D,
    pub line_extractor: E,
    pub tracker: T,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub artifact_path: PathBuf,
    pub frames_processed: u64,
    pub records_written: usize,
    pub detections_skipped: usize,
    pub corners: CourtCorners,
    pub homography: Homography,
}

pub fn process_video<V, D, E, T>(
    video: &V,
    output_dir: &Path,
    config: &PipelineConfig,
    collaborators: &mut Collaborators<D, E, T>,
) -> Result<PipelineOutput, PipelineError>
where
    V: VideoSource,
    D: CourtMaskDetector<V::Frame>,
    E: LineExtractor<D::Mask>,
    T: Tracker<V::Frame>,
{
    let video_name = video.name();
    info!("Processing video {}", video_name);

    let unreadable = |reason: String| PipelineError::UnreadableVideo {
        path: PathBuf::from(&video_name),
        reason,
    };

    // Calibration, on the first frame only
    let first_frame = {
        let mut reader = video.open().map_err(|e| unreadable(e.to_string()))?;
        reader
            .read_frame()
            .map_err(|e| unreadable(e.to_string()))?
            .ok_or_else(|| unreadable(String::from("stream yields no first frame")))?
    };

    let calibration_system = CalibrationSystem::new(config);
    let calibration = calibration_system.calibrate(
        &first_frame,
        &mut collaborators.mask_detector,
        &mut collaborators.line_extractor,
    )?;
    drop(first_frame);

    // Mapping, from the start of a fresh stream
    let remapping = PositionRemapping::new(
        calibration.homography,
        *calibration_system.reference(),
        config.outside_margin(),
    );
    let mut mapper = TrajectoryMapper::new(remapping);
    let mut reader = video
        .open()
        .map_err(|e| PipelineError::collaborator(Stage::VideoRead, e))?;
    mapper.run(&mut reader, &mut collaborators.tracker)?;

    let frames_processed = mapper.frames_processed();
    let detections_skipped = mapper.dropped();
    let records = mapper.into_records();
    if records.is_empty() {
        warn!(
            "No trajectory records for {} across {} frames",
            video_name, frames_processed
        );
    }

    let artifact_path = output_path_for(&video_name, output_dir, &config.output_suffix);
    write_records(&artifact_path, &records)?;

    Ok(PipelineOutput {
        artifact_path,
        frames_processed,
        records_written: records.len(),
        detections_skipped,
        corners: calibration.corners,
        homography: calibration.homography,
    })
}
