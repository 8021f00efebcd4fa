use log::info;

use crate::{
    backend_config::PipelineConfig,
    court::{CourtCorners, estimate_corners},
    error::{PipelineError, Stage},
    homography::Homography,
    lines::{ClassifySettings, LineSegment, classify_lines},
    video_interface::{CourtMaskDetector, LineExtractor},
};

/// Result of first-frame calibration. Only the homography is carried into
/// trajectory mapping; the corners are kept for reporting.
#[derive(Debug, Clone, Copy)]
pub struct Calibration {
    pub corners: CourtCorners,
    pub homography: Homography,
}

pub struct CalibrationSystem {
    classify_settings: ClassifySettings,
    parallel_tolerance: f64,
    reference: CourtCorners,
}

impl CalibrationSystem {
    pub fn new(config: &PipelineConfig) -> Self {
        CalibrationSystem {
            classify_settings: config.classify_settings(),
            parallel_tolerance: config.parallel_tolerance,
            reference: config.reference_corners(),
        }
    }

    pub fn reference(&self) -> &CourtCorners {
        &self.reference
    }

    /// Mask the frame, extract raw segments, then fit from those segments
    pub fn calibrate<F, D, E>(
        &self,
        frame: &F,
        mask_detector: &mut D,
        line_extractor: &mut E,
    ) -> Result<Calibration, PipelineError>
    where
        D: CourtMaskDetector<F>,
        E: LineExtractor<D::Mask>,
    {
        let mask = mask_detector
            .detect_court_mask(frame)
            .map_err(|e| PipelineError::collaborator(Stage::CourtMask, e))?;
        let segments = line_extractor
            .extract_lines(&mask)
            .map_err(|e| PipelineError::collaborator(Stage::LineExtraction, e))?;
        info!("Extracted {} raw line segments from court mask", segments.len());
        self.calibrate_from_segments(&segments)
    }

    pub fn calibrate_from_segments(
        &self,
        segments: &[LineSegment],
    ) -> Result<Calibration, PipelineError> {
        let groups = classify_lines(segments, &self.classify_settings)?;
        let corners = estimate_corners(&groups, self.parallel_tolerance)?;
        let homography = Homography::fit(&corners, &self.reference)?;
        info!("Calibration complete");
        Ok(Calibration {
            corners,
            homography,
        })
    }
}
