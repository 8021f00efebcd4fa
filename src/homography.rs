//! Four-point planar homography between the image and the court plane.

use log::debug;
use nalgebra::{Matrix3, SMatrix, SVector, Vector3};

use crate::{
    Point2D,
    court::CourtCorners,
    error::CalibrationError,
};

const EPS: f64 = 1e-12;

/// A 3×3 projective transform from pixel coordinates to court coordinates
/// (meters). Fitted once per video and never modified afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography {
    matrix: Matrix3<f64>,
}

impl Homography {
    /// Exact solve of the eight-unknown system given by the four named
    /// corner correspondences (h33 fixed to 1). Both quads are checked for
    /// matching winding first, since a corner mix-up cannot be detected
    /// from the solution itself.
    pub fn fit(src: &CourtCorners, dst: &CourtCorners) -> Result<Self, CalibrationError> {
        src.check_orientation(dst)?;

        let (t_src, src_n) = normalize_points(&src.to_array());
        let (t_dst, dst_n) = normalize_points(&dst.to_array());

        let mut a = SMatrix::<f64, 8, 8>::zeros();
        let mut b = SVector::<f64, 8>::zeros();
        for (i, (&(x, y), &(u, v))) in src_n.iter().zip(dst_n.iter()).enumerate() {
            let r = 2 * i;
            a[(r, 0)] = x;
            a[(r, 1)] = y;
            a[(r, 2)] = 1.;
            a[(r, 6)] = -u * x;
            a[(r, 7)] = -u * y;
            b[r] = u;

            a[(r + 1, 3)] = x;
            a[(r + 1, 4)] = y;
            a[(r + 1, 5)] = 1.;
            a[(r + 1, 6)] = -v * x;
            a[(r + 1, 7)] = -v * y;
            b[r + 1] = v;
        }

        let h = a.lu().solve(&b).ok_or(CalibrationError::SingularHomography)?;
        let h_norm = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.);

        let t_dst_inv = t_dst
            .try_inverse()
            .ok_or(CalibrationError::SingularHomography)?;
        let mut matrix = t_dst_inv * h_norm * t_src;

        let scale = matrix[(2, 2)];
        if !scale.is_finite() || scale.abs() < EPS {
            return Err(CalibrationError::SingularHomography);
        }
        matrix /= scale;
        if matrix.iter().any(|v| !v.is_finite()) {
            return Err(CalibrationError::SingularHomography);
        }

        debug!("Fitted homography: {}", matrix);
        Ok(Homography { matrix })
    }

    pub fn from_matrix(matrix: Matrix3<f64>) -> Self {
        Homography { matrix }
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    /// Projective point transform. None for points on the vanishing line,
    /// which have no finite image on the court plane.
    pub fn transform(&self, p: &Point2D) -> Option<Point2D> {
        let v = self.matrix * Vector3::new(p.0, p.1, 1.0);
        let w = v[2];
        if !w.is_finite() || w.abs() <= EPS {
            return None;
        }
        let (x, y) = (v[0] / w, v[1] / w);
        if x.is_finite() && y.is_finite() {
            Some((x, y))
        } else {
            None
        }
    }
}

/// Translate the centroid to the origin and scale to a mean distance of
/// sqrt(2), to keep the linear system well conditioned for pixel inputs
fn normalize_points(pts: &[Point2D; 4]) -> (Matrix3<f64>, [Point2D; 4]) {
    let n = pts.len() as f64;
    let cx = pts.iter().map(|p| p.0).sum::<f64>() / n;
    let cy = pts.iter().map(|p| p.1).sum::<f64>() / n;

    let mean_dist = pts
        .iter()
        .map(|p| ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;

    let s = if mean_dist > EPS {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let normalized = pts.map(|p| (s * (p.0 - cx), s * (p.1 - cy)));
    (t, normalized)
}
