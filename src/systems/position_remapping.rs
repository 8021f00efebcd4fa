use log::debug;
use serde::{Deserialize, Serialize};

use crate::{Point2D, court::CourtCorners, homography::Homography};

/// Which part of the reference court to use as the origin [0,0].
/// All trajectory positions will be relative to this.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OriginLocation {
    /// The top-left corner as seen in the video
    #[default]
    Corner,
    /// Middle of the top edge as seen in the video
    CloseCentre,
    Centre,
}

/// The known court outline in meters, ordered like the pixel corners.
/// `length` runs along the x axis (left to right in the image), `width`
/// along the y axis.
pub fn reference_corners(length: f64, width: f64, origin_location: OriginLocation) -> CourtCorners {
    let (l, w) = (length, width);
    let [top_left, top_right, bottom_right, bottom_left] = match origin_location {
        OriginLocation::Corner => [(0., 0.), (l, 0.), (l, w), (0., w)],
        OriginLocation::CloseCentre => [(-l / 2., 0.), (l / 2., 0.), (l / 2., w), (-l / 2., w)],
        OriginLocation::Centre => [
            (-l / 2., -w / 2.),
            (l / 2., -w / 2.),
            (l / 2., w / 2.),
            (-l / 2., w / 2.),
        ],
    };
    CourtCorners {
        top_left,
        top_right,
        bottom_right,
        bottom_left,
    }
}

/// Maps pixel positions onto the court plane with a fixed homography,
/// optionally dropping positions too far outside the court outline
pub struct PositionRemapping {
    homography: Homography,
    reference: CourtCorners,
    ignore_outside_margin: Option<f64>,
}

impl PositionRemapping {
    pub fn new(
        homography: Homography,
        reference: CourtCorners,
        ignore_outside_margin: Option<f64>,
    ) -> Self {
        PositionRemapping {
            homography,
            reference,
            ignore_outside_margin,
        }
    }

    pub fn homography(&self) -> &Homography {
        &self.homography
    }

    /// None if the point has no finite court position, or if it lies
    /// outside the court (plus margin) while filtering is enabled
    pub fn remap(&self, p: &Point2D) -> Option<Point2D> {
        let world = self.homography.transform(p)?;
        match self.ignore_outside_margin {
            Some(margin) if !self.point_is_inside_court(&world, margin) => {
                debug!("Dropping position {:?} outside court", world);
                None
            }
            _ => Some(world),
        }
    }

    pub fn point_is_inside_court(&self, p: &Point2D, margin: f64) -> bool {
        let corners = self.reference.to_array();
        let (min_x, max_x, min_y, max_y) = corners.iter().fold(
            (f64::MAX, f64::MIN, f64::MAX, f64::MIN),
            |(min_x, max_x, min_y, max_y), (x, y)| {
                (min_x.min(*x), max_x.max(*x), min_y.min(*y), max_y.max(*y))
            },
        );
        p.0 >= min_x - margin && p.0 <= max_x + margin && p.1 >= min_y - margin && p.1 <= max_y + margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel_court() -> CourtCorners {
        CourtCorners {
            top_left: (100., 100.),
            top_right: (500., 100.),
            bottom_right: (500., 300.),
            bottom_left: (100., 300.),
        }
    }

    #[test]
    fn test_reference_corners_by_origin() {
        let c = reference_corners(13.4, 6.1, OriginLocation::Corner);
        assert_eq!(c.bottom_right, (13.4, 6.1));
        let c = reference_corners(13.4, 6.1, OriginLocation::CloseCentre);
        assert_eq!(c.top_left, (-6.7, 0.));
        let c = reference_corners(13.4, 6.1, OriginLocation::Centre);
        assert_eq!(c.top_left, (-6.7, -3.05));
        assert_eq!(c.bottom_right, (6.7, 3.05));
    }

    #[test]
    fn test_centre_origin_maps_court_centre_to_zero() {
        let reference = reference_corners(13.4, 6.1, OriginLocation::Centre);
        let h = Homography::fit(&pixel_court(), &reference).unwrap();
        let remapping = PositionRemapping::new(h, reference, None);
        let (x, y) = remapping.remap(&(300., 200.)).unwrap();
        assert!(x.abs() < 1e-6 && y.abs() < 1e-6);
    }

    #[test]
    fn test_outside_filter() {
        let reference = reference_corners(13.4, 6.1, OriginLocation::Corner);
        let h = Homography::fit(&pixel_court(), &reference).unwrap();

        // 1 px = 13.4/400 m horizontally, so x=40 px is ~2 m left of the court
        let unfiltered = PositionRemapping::new(h, reference, None);
        assert!(unfiltered.remap(&(40., 200.)).is_some());

        let filtered = PositionRemapping::new(h, reference, Some(0.5));
        assert!(filtered.remap(&(40., 200.)).is_none());
        // ~0.34 m outside, within margin
        assert!(filtered.remap(&(90., 200.)).is_some());
        assert!(filtered.remap(&(300., 200.)).is_some());
    }
}
