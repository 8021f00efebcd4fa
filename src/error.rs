use std::path::PathBuf;

use thiserror::Error;

use crate::court::Corner;

/// Errors raised by the external collaborators (video decoding, court mask
/// detection, line extraction, tracking) are carried as-is
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Which external collaborator failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    VideoRead,
    CourtMask,
    LineExtraction,
    Tracking,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::VideoRead => "video read",
            Stage::CourtMask => "court mask detection",
            Stage::LineExtraction => "line extraction",
            Stage::Tracking => "tracking",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("video {path:?} is unreadable: {reason}")]
    UnreadableVideo { path: PathBuf, reason: String },

    #[error(
        "insufficient court lines: {total} segments found, {horizontal} horizontal and {vertical} vertical after classification"
    )]
    InsufficientLines {
        total: usize,
        horizontal: usize,
        vertical: usize,
    },

    #[error("court calibration failed: {0}")]
    Calibration(#[from] CalibrationError),

    #[error("{stage} failed")]
    Collaborator {
        stage: Stage,
        #[source]
        source: CollaboratorError,
    },

    #[error("failed to write trajectory output to {path:?}")]
    Output {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl PipelineError {
    pub fn collaborator(stage: Stage, source: CollaboratorError) -> Self {
        PipelineError::Collaborator { stage, source }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CalibrationError {
    #[error("no lines available to select a court boundary from")]
    EmptyLineGroup,

    #[error("boundary lines for the {0} corner are parallel")]
    ParallelBoundaries(Corner),

    #[error("court corners do not form a convex quadrilateral")]
    NotConvex,

    #[error("court corners are wound opposite to the reference court (mirrored mapping)")]
    WindingMismatch,

    #[error("homography system is singular")]
    SingularHomography,
}
