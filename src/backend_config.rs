use log::{debug, info, warn};
use std::fs;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::{
    court::CourtCorners,
    lines::ClassifySettings,
    systems::position_remapping::{OriginLocation, reference_corners},
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    // -------- LINE EXTRACTION SETTINGS
    /// Lower hysteresis threshold for Canny edge detection on the court mask
    pub canny_low_threshold: f64,

    /// Upper hysteresis threshold for Canny edge detection
    pub canny_high_threshold: f64,

    /// Min accumulator votes for a probabilistic Hough line
    pub hough_threshold: i32,

    /// Shortest line segment (px) the Hough transform will report
    pub hough_min_line_length: f64,

    /// Largest gap (px) bridged between collinear points of one segment
    pub hough_max_line_gap: f64,

    /// Grey level (0-255) above which a pixel counts as court-line paint,
    /// for the built-in brightness mask detector
    pub mask_threshold: f64,

    // -------- CLASSIFICATION SETTINGS
    /// Max deviation (degrees) from horizontal for a segment to count as horizontal
    pub horizontal_tolerance_deg: f64,

    /// Max deviation (degrees) from vertical for a segment to count as vertical
    pub vertical_tolerance_deg: f64,

    /// Fewer raw segments than this is a calibration failure
    pub min_segments: usize,

    /// Each orientation group needs at least this many segments
    pub min_per_group: usize,

    /// Line pairs whose determinant is below this are treated as parallel
    pub parallel_tolerance: f64,

    // -------- COURT GEOMETRY
    /// Court dimension (m) along the image x axis
    pub court_length: f64,

    /// Court dimension (m) along the image y axis
    pub court_width: f64,

    pub origin_location: OriginLocation,

    // -------- POSITION REMAPPING
    /// By default every detection produces a record, wherever it lands;
    /// disable this to drop positions beyond `ignoreOutsideMargin` of the court
    pub include_outside: bool,

    /// **Unless includeOutside is enabled**, drop positions further than this (m)
    /// outside the court outline
    pub ignore_outside_margin: f64,

    // -------- OUTPUT
    /// Appended to the video file name to name the CSV artifact
    pub output_suffix: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            canny_low_threshold: 50.,
            canny_high_threshold: 150.,
            hough_threshold: 80,
            hough_min_line_length: 100.,
            hough_max_line_gap: 5.,
            mask_threshold: 200.,
            horizontal_tolerance_deg: 20.,
            vertical_tolerance_deg: 20.,
            min_segments: 4,
            min_per_group: 2,
            parallel_tolerance: 1e-6,
            court_length: 13.4,
            court_width: 6.1,
            origin_location: OriginLocation::Corner,
            include_outside: true,
            ignore_outside_margin: 0.5,
            output_suffix: String::from("_tracks.csv"),
        }
    }
}

impl PipelineConfig {
    pub fn classify_settings(&self) -> ClassifySettings {
        ClassifySettings {
            horizontal_tolerance_deg: self.horizontal_tolerance_deg,
            vertical_tolerance_deg: self.vertical_tolerance_deg,
            min_segments: self.min_segments,
            min_per_group: self.min_per_group,
        }
    }

    pub fn reference_corners(&self) -> CourtCorners {
        reference_corners(self.court_length, self.court_width, self.origin_location)
    }

    pub fn outside_margin(&self) -> Option<f64> {
        if self.include_outside {
            None
        } else {
            Some(self.ignore_outside_margin)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.court_length > 0. && self.court_width > 0.) {
            return Err(anyhow!(
                "Court dimensions must be positive, got {} x {}",
                self.court_length,
                self.court_width
            ));
        }
        if self.min_per_group < 2 {
            return Err(anyhow!(
                "minPerGroup must be at least 2 to find both boundaries, got {}",
                self.min_per_group
            ));
        }
        if self.output_suffix.is_empty() {
            return Err(anyhow!("outputSuffix must not be empty"));
        }
        Ok(())
    }

    pub fn write_config_to_file(&self, config_file_path: &str) -> Result<()> {
        info!("Current state of config: {:?}", self);
        let text = serde_json::to_string_pretty(self)?;
        fs::write(config_file_path, text)
            .with_context(|| format!("Error writing config to file {config_file_path}"))?;
        info!("Wrote config to file: {:?}", config_file_path);
        Ok(())
    }
}

pub fn load_config_from_file(config_file_path: &str) -> Result<PipelineConfig> {
    let config = PipelineConfig::default();
    debug!("Created init config object {:?}", config);

    match std::fs::read_to_string(config_file_path) {
        Err(e) => {
            if e.kind() == std::io::ErrorKind::NotFound {
                warn!(
                    "Pipeline config file not found at {}, using defaults",
                    &config_file_path
                );
                Ok(config)
            } else {
                Err(anyhow!(
                    "Failed to load pipeline config from disk; error: {:?}",
                    e
                ))
            }
        }
        Ok(s) => {
            info!("Loaded pipeline config OK from \"{}\"", config_file_path);
            match serde_json::from_str::<PipelineConfig>(&s) {
                Ok(loaded_config) => {
                    debug!("Config parsed data from file: {:?}", &loaded_config);
                    loaded_config.validate()?;
                    Ok(loaded_config)
                }
                Err(e) => Err(anyhow!("Failed to parse config data: {}", e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        let config = load_config_from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("court.json");
        fs::write(&path, r#"{"courtLength": 23.77, "courtWidth": 10.97, "originLocation": "Centre"}"#)
            .unwrap();
        let config = load_config_from_file(path.to_str().unwrap()).unwrap();
        assert!((config.court_length - 23.77).abs() < 1e-12);
        assert_eq!(config.origin_location, OriginLocation::Centre);
        assert_eq!(config.hough_threshold, 80);
        assert_eq!(config.output_suffix, "_tracks.csv");
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("written.json");
        let path = path.to_str().unwrap();
        let config = PipelineConfig {
            include_outside: false,
            ..Default::default()
        };
        config.write_config_to_file(path).unwrap();
        let loaded = load_config_from_file(path).unwrap();
        assert!(!loaded.include_outside);
        assert_eq!(loaded.origin_location, config.origin_location);
        assert!((loaded.court_width - config.court_width).abs() < 1e-12);
        assert_eq!(loaded.outside_margin(), Some(0.5));
    }

    #[test]
    fn test_malformed_and_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(load_config_from_file(path.to_str().unwrap()).is_err());

        fs::write(&path, r#"{"courtWidth": -1.0}"#).unwrap();
        assert!(load_config_from_file(path.to_str().unwrap()).is_err());
    }
}
