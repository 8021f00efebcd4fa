use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    Point2D,
    error::CalibrationError,
    geometry_utils::{is_strictly_convex, line_intersection, signed_area},
    lines::{LineGroups, LineSegment},
};

/// The four court corners, in the fixed order used everywhere a corner set
/// is flattened: top-left, top-right, bottom-right, bottom-left.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];
}

impl std::fmt::Display for Corner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Corner::TopLeft => "top-left",
            Corner::TopRight => "top-right",
            Corner::BottomRight => "bottom-right",
            Corner::BottomLeft => "bottom-left",
        };
        write!(f, "{name}")
    }
}

/// A named quadrilateral; used both for pixel corners and for the
/// reference court outline in meters
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CourtCorners {
    pub top_left: Point2D,
    pub top_right: Point2D,
    pub bottom_right: Point2D,
    pub bottom_left: Point2D,
}

impl CourtCorners {
    pub fn get(&self, corner: Corner) -> Point2D {
        match corner {
            Corner::TopLeft => self.top_left,
            Corner::TopRight => self.top_right,
            Corner::BottomRight => self.bottom_right,
            Corner::BottomLeft => self.bottom_left,
        }
    }

    pub fn to_array(&self) -> [Point2D; 4] {
        Corner::ALL.map(|c| self.get(c))
    }

    /// Checks that the quad is convex and wound the same way as `reference`;
    /// a mismatch would otherwise yield a silently mirrored mapping
    pub fn check_orientation(&self, reference: &CourtCorners) -> Result<(), CalibrationError> {
        let quad = self.to_array();
        if !is_strictly_convex(&quad) {
            return Err(CalibrationError::NotConvex);
        }
        let own = signed_area(&quad);
        let expected = signed_area(&reference.to_array());
        if own.signum() != expected.signum() {
            return Err(CalibrationError::WindingMismatch);
        }
        Ok(())
    }
}

/// The outermost line of each orientation, taken as the court boundary
#[derive(Debug, Clone, Copy)]
pub struct BoundaryLines {
    pub top: LineSegment,
    pub bottom: LineSegment,
    pub left: LineSegment,
    pub right: LineSegment,
}

/// Horizontal lines are ranked by midpoint y, vertical lines by midpoint x.
/// Noise lines between the boundaries are tolerated; noise lines outside
/// them will be picked instead of the real boundary.
pub fn select_boundary_lines(groups: &LineGroups) -> Option<BoundaryLines> {
    let by_y = |a: &&LineSegment, b: &&LineSegment| a.midpoint().1.total_cmp(&b.midpoint().1);
    let by_x = |a: &&LineSegment, b: &&LineSegment| a.midpoint().0.total_cmp(&b.midpoint().0);

    Some(BoundaryLines {
        top: *groups.horizontal.iter().min_by(by_y)?,
        bottom: *groups.horizontal.iter().max_by(by_y)?,
        left: *groups.vertical.iter().min_by(by_x)?,
        right: *groups.vertical.iter().max_by(by_x)?,
    })
}

pub fn estimate_corners(
    groups: &LineGroups,
    parallel_tolerance: f64,
) -> Result<CourtCorners, CalibrationError> {
    let lines = select_boundary_lines(groups).ok_or(CalibrationError::EmptyLineGroup)?;
    debug!("Boundary lines selected: {:?}", lines);

    let intersect = |corner: Corner, a: &LineSegment, b: &LineSegment| {
        line_intersection(&a.start, &a.end, &b.start, &b.end, parallel_tolerance)
            .ok_or(CalibrationError::ParallelBoundaries(corner))
    };

    let corners = CourtCorners {
        top_left: intersect(Corner::TopLeft, &lines.top, &lines.left)?,
        top_right: intersect(Corner::TopRight, &lines.top, &lines.right)?,
        bottom_right: intersect(Corner::BottomRight, &lines.bottom, &lines.right)?,
        bottom_left: intersect(Corner::BottomLeft, &lines.bottom, &lines.left)?,
    };
    info!("Estimated court corners (px): {:?}", corners);
    Ok(corners)
}
