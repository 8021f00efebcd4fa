pub mod backend_config;
pub mod court;
pub mod error;
pub mod geometry_utils;
pub mod homography;
pub mod jobs;
pub mod lines;
#[cfg(feature = "opencv")]
pub mod opencv_support;
pub mod pipeline;
pub mod replay;
pub mod result_writer;
pub mod systems;
pub mod tracking;
pub mod video_interface;

pub type Point2D = (f64, f64);
