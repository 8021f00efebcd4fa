//! OpenCV-backed collaborators: video decoding, a brightness-threshold
//! court mask, and Canny + probabilistic Hough line extraction.

use std::path::{Path, PathBuf};

use log::{debug, info};
use opencv::{
    core::{Mat, Vec4i, Vector},
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};

use crate::{
    backend_config::PipelineConfig,
    error::CollaboratorError,
    lines::LineSegment,
    video_interface::{CourtMaskDetector, FrameReader, LineExtractor, VideoSource},
};

pub struct VideoFile {
    path: PathBuf,
}

impl VideoFile {
    pub fn new(path: &Path) -> Self {
        VideoFile {
            path: path.to_path_buf(),
        }
    }
}

impl VideoSource for VideoFile {
    type Frame = Mat;
    type Reader = VideoFileReader;

    fn open(&self) -> Result<VideoFileReader, CollaboratorError> {
        let path = self
            .path
            .to_str()
            .ok_or_else(|| format!("video path {:?} is not valid UTF-8", self.path))?;
        info!("Opening video: {}", path);

        let cap = VideoCapture::from_file(path, videoio::CAP_ANY)?;
        if !cap.is_opened()? {
            return Err(format!("failed to open video file {path}").into());
        }

        let width = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_WIDTH)?;
        let height = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_HEIGHT)?;
        let fps = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FPS)?;
        debug!("Video properties: {}x{} @ {:.1} FPS", width, height, fps);

        Ok(VideoFileReader { cap })
    }

    fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

pub struct VideoFileReader {
    cap: VideoCapture,
}

impl FrameReader for VideoFileReader {
    type Frame = Mat;

    fn read_frame(&mut self) -> Result<Option<Mat>, CollaboratorError> {
        let mut frame = Mat::default();
        if self.cap.read(&mut frame)? && !frame.empty() {
            Ok(Some(frame))
        } else {
            Ok(None)
        }
    }
}

/// Court lines are painted white: threshold the grey level
pub struct BrightnessMaskDetector {
    threshold: f64,
}

impl BrightnessMaskDetector {
    pub fn new(config: &PipelineConfig) -> Self {
        BrightnessMaskDetector {
            threshold: config.mask_threshold,
        }
    }
}

impl CourtMaskDetector<Mat> for BrightnessMaskDetector {
    type Mask = Mat;

    fn detect_court_mask(&mut self, frame: &Mat) -> Result<Mat, CollaboratorError> {
        let mut gray = Mat::default();
        imgproc::cvt_color(frame, &mut gray, imgproc::COLOR_BGR2GRAY, 0)?;
        let mut mask = Mat::default();
        imgproc::threshold(&gray, &mut mask, self.threshold, 255.0, imgproc::THRESH_BINARY)?;
        Ok(mask)
    }
}

pub struct HoughLineExtractor {
    canny_low: f64,
    canny_high: f64,
    threshold: i32,
    min_line_length: f64,
    max_line_gap: f64,
}

impl HoughLineExtractor {
    pub fn new(config: &PipelineConfig) -> Self {
        HoughLineExtractor {
            canny_low: config.canny_low_threshold,
            canny_high: config.canny_high_threshold,
            threshold: config.hough_threshold,
            min_line_length: config.hough_min_line_length,
            max_line_gap: config.hough_max_line_gap,
        }
    }
}

impl LineExtractor<Mat> for HoughLineExtractor {
    fn extract_lines(&mut self, mask: &Mat) -> Result<Vec<LineSegment>, CollaboratorError> {
        let mut edges = Mat::default();
        imgproc::canny(mask, &mut edges, self.canny_low, self.canny_high, 3, false)?;

        let mut lines = Vector::<Vec4i>::new();
        imgproc::hough_lines_p(
            &edges,
            &mut lines,
            1.0,
            std::f64::consts::PI / 180.0,
            self.threshold,
            self.min_line_length,
            self.max_line_gap,
        )?;

        Ok(lines
            .iter()
            .map(|l| {
                let [x1, y1, x2, y2] = l.0;
                LineSegment::new(x1 as f64, y1 as f64, x2 as f64, y2 as f64)
            })
            .collect())
    }
}
