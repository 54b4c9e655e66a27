use geo::{Coord, LineString};

use crate::math::polygon_2d::{bounds_2d, point_in_polygon_2d, signed_area_2d};
use crate::math::{Point2, AREA_EPSILON};

/// A closed polyline in projected ground units.
///
/// Stored closed: the last point repeats the first. A valid ring has at least
/// three distinct vertices (four stored points) and non-zero area.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    points: Vec<Point2>,
}

impl Ring {
    /// Creates a ring from its vertices, appending the closing point if it is missing.
    #[must_use]
    pub fn from_vertices(mut vertices: Vec<Point2>) -> Self {
        if let Some(&first) = vertices.first() {
            if vertices.len() == 1 || vertices.last() != Some(&first) {
                vertices.push(first);
            }
        }
        Self { points: vertices }
    }

    /// Creates a ring from `(x, y)` pairs.
    #[must_use]
    pub fn from_xy(coords: &[(f64, f64)]) -> Self {
        Self::from_vertices(coords.iter().map(|&(x, y)| Point2::new(x, y)).collect())
    }

    /// All stored points, including the closing point.
    #[must_use]
    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    /// The vertices without the repeated closing point.
    #[must_use]
    pub fn vertices(&self) -> &[Point2] {
        match self.points.len() {
            0 => &[],
            n => &self.points[..n - 1],
        }
    }

    /// Number of distinct vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices().len()
    }

    /// Signed shoelace area. Positive for counter-clockwise rings.
    #[must_use]
    pub fn signed_area(&self) -> f64 {
        signed_area_2d(self.vertices())
    }

    /// Unsigned enclosed area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Whether the ring has at least 3 vertices and encloses non-zero area.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.points.len() >= 4 && self.vertex_count() >= 3 && self.area() >= AREA_EPSILON
    }

    /// Whether `point` lies strictly inside the ring.
    #[must_use]
    pub fn contains(&self, point: &Point2) -> bool {
        point_in_polygon_2d(point, self.vertices())
    }

    /// Whether every vertex of `other` lies inside this ring.
    ///
    /// Sufficient for contourer output, where rings never cross.
    #[must_use]
    pub fn contains_ring(&self, other: &Ring) -> bool {
        let (Some((a_min, a_max)), Some((b_min, b_max))) = (self.bounds(), other.bounds()) else {
            return false;
        };
        if b_min.x < a_min.x || b_min.y < a_min.y || b_max.x > a_max.x || b_max.y > a_max.y {
            return false;
        }
        other.vertices().first().is_some_and(|p| self.contains(p))
    }

    /// Axis-aligned bounds `(min, max)`.
    #[must_use]
    pub fn bounds(&self) -> Option<(Point2, Point2)> {
        bounds_2d(self.vertices())
    }

    /// Returns the ring with counter-clockwise orientation.
    #[must_use]
    pub fn to_ccw(&self) -> Ring {
        if self.signed_area() < 0.0 {
            let mut points = self.points.clone();
            points.reverse();
            Ring { points }
        } else {
            self.clone()
        }
    }

    /// Returns the ring with clockwise orientation.
    #[must_use]
    pub fn to_cw(&self) -> Ring {
        let mut ring = self.to_ccw();
        ring.points.reverse();
        ring
    }

    /// Converts to a closed `geo` line string.
    #[must_use]
    pub fn to_line_string(&self) -> LineString<f64> {
        LineString::new(
            self.points
                .iter()
                .map(|p| Coord { x: p.x, y: p.y })
                .collect(),
        )
    }

    /// Builds a ring from a `geo` line string.
    #[must_use]
    pub fn from_line_string(line: &LineString<f64>) -> Self {
        Self::from_vertices(line.coords().map(|c| Point2::new(c.x, c.y)).collect())
    }
}
