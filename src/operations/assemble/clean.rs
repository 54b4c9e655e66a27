use geo::Simplify;

use crate::geometry::{Polygon, Ring};
use crate::math::polygon_2d::dedup_vertices;
use crate::math::Point2;

/// Ring cleanup applied to contourer output and supplied water geometry.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RingCleaner {
    /// Consecutive points closer than this are merged.
    pub dedup_tolerance: f64,
    /// Douglas-Peucker tolerance; `0` disables simplification.
    pub simplify_tolerance: f64,
}

impl RingCleaner {
    /// Cleans raw points into a valid ring, or `None` if nothing usable remains.
    pub fn clean(&self, points: &[Point2]) -> Option<Ring> {
        let finite: Vec<Point2> = points
            .iter()
            .copied()
            .filter(|p| p.x.is_finite() && p.y.is_finite())
            .collect();
        let mut ring = Ring::from_vertices(dedup_vertices(&finite, self.dedup_tolerance));

        if self.simplify_tolerance > 0.0 && ring.is_valid() {
            let simplified = ring.to_line_string().simplify(&self.simplify_tolerance);
            ring = Ring::from_vertices(dedup_vertices(
                Ring::from_line_string(&simplified).vertices(),
                self.dedup_tolerance,
            ));
        }

        ring.is_valid().then_some(ring)
    }

    /// Cleans a polygon: exterior made counter-clockwise, holes clockwise,
    /// invalid holes dropped. `None` if the exterior does not survive.
    pub fn clean_polygon(&self, polygon: &Polygon) -> Option<Polygon> {
        let exterior = self.clean(polygon.exterior.points())?.to_ccw();
        let holes = polygon
            .holes
            .iter()
            .filter_map(|h| self.clean(h.points()))
            .map(|h| h.to_cw())
            .collect();
        Some(Polygon::new(exterior, holes))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cleaner() -> RingCleaner {
        RingCleaner {
            dedup_tolerance: 1e-6,
            simplify_tolerance: 0.0,
        }
    }

    fn pts(coords: &[(f64, f64)]) -> Vec<Point2> {
        coords.iter().map(|&(x, y)| Point2::new(x, y)).collect()
    }

    #[test]
    fn drops_non_finite_and_duplicate_points() {
        let ring = cleaner()
            .clean(&pts(&[
                (0.0, 0.0),
                (0.0, 0.0),
                (4.0, 0.0),
                (f64::NAN, 1.0),
                (4.0, 4.0),
                (0.0, 4.0),
                (0.0, 0.0),
            ]))
            .unwrap();
        assert_eq!(ring.vertex_count(), 4);
        assert!((ring.area() - 16.0).abs() < 1e-9);
    }

    #[test]
    fn near_coincident_wraparound_is_merged() {
        let ring = cleaner()
            .clean(&pts(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (1e-8, 1e-8)]))
            .unwrap();
        assert_eq!(ring.vertex_count(), 3);
    }

    #[test]
    fn degenerate_input_is_rejected() {
        assert!(cleaner().clean(&pts(&[(0.0, 0.0), (1.0, 0.0), (0.0, 0.0)])).is_none());
        assert!(cleaner().clean(&pts(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)])).is_none());
        assert!(cleaner().clean(&[]).is_none());
    }

    #[test]
    fn simplification_removes_small_wiggles() {
        let cleaner = RingCleaner {
            dedup_tolerance: 1e-6,
            simplify_tolerance: 0.1,
        };
        let ring = cleaner
            .clean(&pts(&[
                (0.0, 0.0),
                (5.0, 0.01),
                (10.0, 0.0),
                (10.0, 10.0),
                (0.0, 10.0),
            ]))
            .unwrap();
        assert_eq!(ring.vertex_count(), 4);
    }

    #[test]
    fn polygon_cleanup_orients_rings() {
        let exterior = Ring::from_xy(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)]);
        let hole = Ring::from_xy(&[(2.0, 2.0), (4.0, 2.0), (4.0, 4.0), (2.0, 4.0)]);
        let sliver = Ring::from_xy(&[(5.0, 5.0), (6.0, 5.0), (7.0, 5.0)]);
        let cleaned = cleaner()
            .clean_polygon(&Polygon::new(exterior, vec![hole, sliver]))
            .unwrap();
        assert!(cleaned.exterior.signed_area() > 0.0);
        assert_eq!(cleaned.holes.len(), 1);
        assert!(cleaned.holes[0].signed_area() < 0.0);
    }
}
