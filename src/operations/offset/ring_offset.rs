use cavalier_contours::polyline::{PlineSource, PlineSourceMut, PlineVertex, Polyline};

use crate::error::GeometryError;
use crate::geometry::Ring;
use crate::math::arc_2d::bulge_interior_points;
use crate::math::polygon_2d::{dedup_vertices, signed_area_2d};
use crate::math::{Point2, AREA_EPSILON, TOLERANCE};

/// Chord tolerance for tessellating arc joins, as a fraction of the distance.
const ARC_TOLERANCE_RATIO: f64 = 1e-3;

/// Shrinks a closed ring inward by a fixed distance.
///
/// # Algorithm
///
/// 1. Orient the ring counter-clockwise so a left offset points inward.
/// 2. Offset it with `cavalier_contours`, which joins reflex corners with
///    arcs and drops the loops left by collapsed features.
/// 3. Tessellate the arcs and return every loop that survives.
///
/// A shape pinched by a neck narrower than twice the distance comes back as
/// several loops. A ring with no interior left is reported as collapsed.
#[derive(Debug)]
pub struct RingOffset<'a> {
    ring: &'a Ring,
    distance: f64,
}

impl<'a> RingOffset<'a> {
    /// Creates a new inward offset of `ring` by `distance` ground units.
    #[must_use]
    pub fn new(ring: &'a Ring, distance: f64) -> Self {
        Self { ring, distance }
    }

    /// Executes the offset, returning the surviving counter-clockwise loops.
    ///
    /// # Errors
    ///
    /// - `GeometryError::Degenerate` if the ring has fewer than 3 distinct
    ///   vertices or the distance is negative or not finite
    /// - `GeometryError::OffsetCollapsed` if nothing of the ring survives
    pub fn execute(&self) -> Result<Vec<Ring>, GeometryError> {
        if !(self.distance.is_finite() && self.distance >= 0.0) {
            return Err(GeometryError::Degenerate(format!(
                "inset distance must be finite and non-negative, got {}",
                self.distance
            )));
        }

        let ccw = self.ring.to_ccw();
        let points = dedup_vertices(ccw.vertices(), TOLERANCE);
        if points.len() < 3 {
            return Err(GeometryError::Degenerate(format!(
                "ring has {} distinct vertices",
                points.len()
            )));
        }

        if self.distance < TOLERANCE {
            return Ok(vec![Ring::from_vertices(points)]);
        }

        let mut polyline = Polyline::new();
        for p in &points {
            polyline.add_vertex(PlineVertex::new(p.x, p.y, 0.0));
        }
        polyline.set_is_closed(true);

        // An inward offset never grows the ring or flips its winding.
        let original_area = signed_area_2d(&points);
        let tolerance = self.distance * ARC_TOLERANCE_RATIO;
        let loops: Vec<Ring> = polyline
            .parallel_offset(self.distance)
            .iter()
            .filter(|pl| pl.is_closed())
            .map(|pl| clean_ring(&tessellate(pl, tolerance)))
            .filter(|pts| {
                let area = signed_area_2d(pts);
                pts.len() >= 3 && area > AREA_EPSILON && area <= original_area
            })
            .map(Ring::from_vertices)
            .filter(Ring::is_valid)
            .collect();

        if loops.is_empty() {
            return Err(GeometryError::OffsetCollapsed(format!(
                "no interior left after insetting by {}",
                self.distance
            )));
        }
        Ok(loops)
    }
}

/// Flattens a closed polyline, replacing each arc segment with chords.
fn tessellate(polyline: &Polyline<f64>, tolerance: f64) -> Vec<Point2> {
    let vertices = &polyline.vertex_data;
    let n = vertices.len();
    let mut out = Vec::with_capacity(n);
    for (i, v) in vertices.iter().enumerate() {
        let start = Point2::new(v.x, v.y);
        out.push(start);
        let next = &vertices[(i + 1) % n];
        out.extend(bulge_interior_points(
            &start,
            &Point2::new(next.x, next.y),
            v.bulge,
            tolerance,
        ));
    }
    out
}

/// Drops consecutive duplicates (including the wrap-around pair) and
/// collinear vertices, never going below three vertices.
fn clean_ring(points: &[Point2]) -> Vec<Point2> {
    let deduped = dedup_vertices(points, TOLERANCE * 10.0);
    if deduped.len() < 3 {
        return deduped;
    }

    let n = deduped.len();
    let cleaned: Vec<Point2> = (0..n)
        .filter(|&i| {
            let prev = deduped[(i + n - 1) % n];
            let next = deduped[(i + 1) % n];
            let turn = (deduped[i] - prev).perp(&(next - deduped[i]));
            turn.abs() >= TOLERANCE
        })
        .map(|i| deduped[i])
        .collect();

    if cleaned.len() < 3 {
        deduped
    } else {
        cleaned
    }
}
