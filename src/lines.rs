use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    Point2D,
    error::PipelineError,
    geometry_utils::{line_angle, midpoint},
};

/// A raw line segment in pixel coordinates, as produced by line extraction
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub start: Point2D,
    pub end: Point2D,
}

impl LineSegment {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        LineSegment {
            start: (x1, y1),
            end: (x2, y2),
        }
    }

    /// Degrees from the horizontal axis, in [0,180)
    pub fn angle(&self) -> f64 {
        line_angle(&self.start, &self.end)
    }

    pub fn midpoint(&self) -> Point2D {
        midpoint(&self.start, &self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy)]
pub struct ClassifySettings {
    /// Max deviation (degrees) from 0°/180° to count as horizontal
    pub horizontal_tolerance_deg: f64,
    /// Max deviation (degrees) from 90° to count as vertical
    pub vertical_tolerance_deg: f64,
    pub min_segments: usize,
    pub min_per_group: usize,
}

impl Default for ClassifySettings {
    fn default() -> Self {
        ClassifySettings {
            horizontal_tolerance_deg: 20.,
            vertical_tolerance_deg: 20.,
            min_segments: 4,
            min_per_group: 2,
        }
    }
}

impl ClassifySettings {
    /// Diagonal (ambiguous) segments return None
    pub fn orientation_of(&self, segment: &LineSegment) -> Option<Orientation> {
        let angle = segment.angle();
        if angle < self.horizontal_tolerance_deg || angle > 180. - self.horizontal_tolerance_deg {
            Some(Orientation::Horizontal)
        } else if (angle - 90.).abs() < self.vertical_tolerance_deg {
            Some(Orientation::Vertical)
        } else {
            None
        }
    }
}

/// Two disjoint groups of segments, each with at least `min_per_group` members
#[derive(Debug, Clone)]
pub struct LineGroups {
    pub horizontal: Vec<LineSegment>,
    pub vertical: Vec<LineSegment>,
}

pub fn classify_lines(
    segments: &[LineSegment],
    settings: &ClassifySettings,
) -> Result<LineGroups, PipelineError> {
    let mut horizontal = Vec::new();
    let mut vertical = Vec::new();

    for segment in segments {
        match settings.orientation_of(segment) {
            Some(Orientation::Horizontal) => horizontal.push(*segment),
            Some(Orientation::Vertical) => vertical.push(*segment),
            None => {}
        }
    }

    debug!(
        "Classified {} segments: {} horizontal, {} vertical, {} discarded",
        segments.len(),
        horizontal.len(),
        vertical.len(),
        segments.len() - horizontal.len() - vertical.len()
    );

    if segments.len() < settings.min_segments
        || horizontal.len() < settings.min_per_group
        || vertical.len() < settings.min_per_group
    {
        return Err(PipelineError::InsufficientLines {
            total: segments.len(),
            horizontal: horizontal.len(),
            vertical: vertical.len(),
        });
    }

    Ok(LineGroups {
        horizontal,
        vertical,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_of_basic_angles() {
        let settings = ClassifySettings::default();
        assert_eq!(
            settings.orientation_of(&LineSegment::new(0., 0., 100., 0.)),
            Some(Orientation::Horizontal)
        );
        assert_eq!(
            settings.orientation_of(&LineSegment::new(0., 0., 0., 100.)),
            Some(Orientation::Vertical)
        );
        assert_eq!(
            settings.orientation_of(&LineSegment::new(0., 0., 100., 100.)),
            None
        );
    }

    #[test]
    fn test_orientation_near_boundaries() {
        let settings = ClassifySettings::default();
        // ~170° (slight downward slope drawn right-to-left) is still horizontal
        assert_eq!(
            settings.orientation_of(&LineSegment::new(100., 0., 0., 17.6)),
            Some(Orientation::Horizontal)
        );
        // ~25° is neither
        assert_eq!(
            settings.orientation_of(&LineSegment::new(0., 0., 100., 46.6)),
            None
        );
        // ~100° is vertical
        assert_eq!(
            settings.orientation_of(&LineSegment::new(0., 0., -17.6, 100.)),
            Some(Orientation::Vertical)
        );
    }

    #[test]
    fn test_classify_rectangle_outline() {
        let segments = [
            LineSegment::new(100., 100., 500., 100.),
            LineSegment::new(100., 300., 500., 300.),
            LineSegment::new(100., 100., 100., 300.),
            LineSegment::new(500., 100., 500., 300.),
            LineSegment::new(0., 0., 300., 300.),
        ];
        let groups = classify_lines(&segments, &ClassifySettings::default()).unwrap();
        assert_eq!(groups.horizontal.len(), 2);
        assert_eq!(groups.vertical.len(), 2);
    }

    #[test]
    fn test_too_few_segments() {
        let segments = [
            LineSegment::new(100., 100., 500., 100.),
            LineSegment::new(100., 300., 500., 300.),
            LineSegment::new(100., 100., 100., 300.),
        ];
        match classify_lines(&segments, &ClassifySettings::default()) {
            Err(PipelineError::InsufficientLines {
                total,
                horizontal,
                vertical,
            }) => {
                assert_eq!(total, 3);
                assert_eq!(horizontal, 2);
                assert_eq!(vertical, 1);
            }
            other => panic!("expected InsufficientLines, got {:?}", other),
        }
    }

    #[test]
    fn test_one_orientation_only() {
        let segments: Vec<LineSegment> = (0..6)
            .map(|i| LineSegment::new(0., i as f64 * 10., 200., i as f64 * 10.))
            .collect();
        assert!(matches!(
            classify_lines(&segments, &ClassifySettings::default()),
            Err(PipelineError::InsufficientLines { vertical: 0, .. })
        ));
    }
}
