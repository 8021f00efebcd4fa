use crate::Point2D;

/// Determinants smaller than this (in squared pixels) are treated as parallel lines
pub const DEFAULT_PARALLEL_TOLERANCE: f64 = 1e-6;

pub fn midpoint(a: &Point2D, b: &Point2D) -> Point2D {
    ((a.0 + b.0) / 2., (a.1 + b.1) / 2.)
}

/// Angle (in degrees) of the line through `a` and `b`, relative to the
/// positive x-axis, normalised to the range [0,180).
///
/// Direction does not matter: (a,b) and (b,a) give the same angle.
pub fn line_angle(a: &Point2D, b: &Point2D) -> f64 {
    let angle_deg = (b.1 - a.1).atan2(b.0 - a.0).to_degrees();
    let normalised = angle_deg.rem_euclid(180.0);
    // rem_euclid can round up to exactly 180 for tiny negative inputs
    if normalised >= 180.0 { 0.0 } else { normalised }
}

/// Intersection of the two infinite lines through (a1,a2) and (b1,b2).
///
/// Each line is written as `A·x + B·y = C` and the system is solved with
/// Cramer's rule. Returns None if the determinant is within `tolerance`
/// of zero, i.e. the lines are parallel or nearly so.
pub fn line_intersection(
    a1: &Point2D,
    a2: &Point2D,
    b1: &Point2D,
    b2: &Point2D,
    tolerance: f64,
) -> Option<Point2D> {
    let (a_a, b_a, c_a) = standard_form(a1, a2);
    let (a_b, b_b, c_b) = standard_form(b1, b2);

    let det = a_a * b_b - a_b * b_a;
    if !det.is_finite() || det.abs() < tolerance {
        return None;
    }

    let x = (c_a * b_b - c_b * b_a) / det;
    let y = (a_a * c_b - a_b * c_a) / det;
    Some((x, y))
}

fn standard_form(p1: &Point2D, p2: &Point2D) -> (f64, f64, f64) {
    let a = p2.1 - p1.1;
    let b = p1.0 - p2.0;
    let c = a * p1.0 + b * p1.1;
    (a, b, c)
}

/// Shoelace signed area of a polygon. Positive when the vertices run
/// clockwise in image coordinates (y pointing down).
pub fn signed_area(points: &[Point2D]) -> f64 {
    let n = points.len();
    let twice_area: f64 = (0..n)
        .map(|i| {
            let (x1, y1) = points[i];
            let (x2, y2) = points[(i + 1) % n];
            x1 * y2 - x2 * y1
        })
        .sum();
    twice_area / 2.
}

/// True if every turn along the closed polygon goes the same way, with
/// no collinear (zero) turns.
pub fn is_strictly_convex(points: &[Point2D]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let turns: Vec<f64> = (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            let c = points[(i + 2) % n];
            (b.0 - a.0) * (c.1 - b.1) - (b.1 - a.1) * (c.0 - b.0)
        })
        .collect();
    turns.iter().all(|t| *t > 0.) || turns.iter().all(|t| *t < 0.)
}
