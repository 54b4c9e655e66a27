use super::{Point2, Vector2, TOLERANCE};

/// Computes the signed area of a polygon (shoelace formula).
///
/// `points` holds the vertices without a repeated closing point; a trailing
/// copy of the first point contributes nothing and is harmless.
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Merges consecutive vertices closer than `tolerance`, including the
/// wrap-around pair (last vs. first).
///
/// Input and output carry no repeated closing point.
#[must_use]
pub fn dedup_vertices(points: &[Point2], tolerance: f64) -> Vec<Point2> {
    let tol_sq = tolerance * tolerance;
    let mut deduped: Vec<Point2> = Vec::with_capacity(points.len());
    for &pt in points {
        if let Some(&last) = deduped.last() {
            if (pt - last).norm_squared() <= tol_sq {
                continue;
            }
        }
        deduped.push(pt);
    }
    while deduped.len() > 1 {
        let first = deduped[0];
        let last = deduped[deduped.len() - 1];
        if (last - first).norm_squared() <= tol_sq {
            deduped.pop();
        } else {
            break;
        }
    }
    deduped
}

/// Winding number of `point` with respect to the closed polygon `verts`.
///
/// Non-zero => inside, zero => outside.
#[must_use]
pub fn winding_number_2d(point: &Point2, verts: &[Point2]) -> i32 {
    let n = verts.len();
    let mut winding = 0i32;
    for i in 0..n {
        let a = verts[i];
        let b = verts[(i + 1) % n];

        if a.y <= point.y {
            if b.y > point.y && cross_2d(&(b - a), &(*point - a)) > 0.0 {
                winding += 1;
            }
        } else if b.y <= point.y && cross_2d(&(b - a), &(*point - a)) < 0.0 {
            winding -= 1;
        }
    }
    winding
}

/// Returns `true` if `point` lies inside the closed polygon `verts`.
#[must_use]
pub fn point_in_polygon_2d(point: &Point2, verts: &[Point2]) -> bool {
    verts.len() >= 3 && winding_number_2d(point, verts) != 0
}

/// 2D cross product `a.x * b.y - a.y * b.x`.
#[inline]
#[must_use]
pub fn cross_2d(a: &Vector2, b: &Vector2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Axis-aligned bounds `(min, max)` of a point set, or `None` when empty.
#[must_use]
pub fn bounds_2d(points: &[Point2]) -> Option<(Point2, Point2)> {
    let first = points.first()?;
    let mut min = *first;
    let mut max = *first;
    for p in &points[1..] {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    Some((min, max))
}

/// Rotates a closed polygon so it starts at the leftmost vertex (smallest x),
/// breaking ties by smallest y. Ensures deterministic output for tests.
#[must_use]
pub fn rotate_to_canonical_start(points: &[Point2]) -> Vec<Point2> {
    if points.len() < 2 {
        return points.to_vec();
    }
    let mut best = 0;
    for (i, pt) in points.iter().enumerate().skip(1) {
        let b = &points[best];
        if pt.x < b.x - TOLERANCE || (pt.x - b.x).abs() < TOLERANCE && pt.y < b.y {
            best = i;
        }
    }
    let mut rotated = Vec::with_capacity(points.len());
    rotated.extend_from_slice(&points[best..]);
    rotated.extend_from_slice(&points[..best]);
    rotated
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn square(size: f64) -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(size, 0.0),
            Point2::new(size, size),
            Point2::new(0.0, size),
        ]
    }

    #[test]
    fn signed_area_ccw_square() {
        assert!((signed_area_2d(&square(1.0)) - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_cw_square() {
        let mut pts = square(1.0);
        pts.reverse();
        assert!((signed_area_2d(&pts) + 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_ignores_closing_point() {
        let mut pts = square(2.0);
        pts.push(pts[0]);
        assert!((signed_area_2d(&pts) - 4.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_degenerate() {
        assert!(signed_area_2d(&[Point2::new(0.0, 0.0)]).abs() < TOLERANCE);
        assert!(signed_area_2d(&[]).abs() < TOLERANCE);
    }

    #[test]
    fn dedup_merges_near_duplicates_and_wraparound() {
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 1e-9),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(1e-9, 0.0),
        ];
        let deduped = dedup_vertices(&pts, 1e-6);
        assert_eq!(deduped.len(), 3);
    }

    #[test]
    fn dedup_keeps_distinct_points() {
        let deduped = dedup_vertices(&square(1.0), 1e-6);
        assert_eq!(deduped.len(), 4);
    }

    #[test]
    fn point_in_polygon_inside_and_outside() {
        let sq = square(10.0);
        assert!(point_in_polygon_2d(&Point2::new(5.0, 5.0), &sq));
        assert!(!point_in_polygon_2d(&Point2::new(15.0, 5.0), &sq));
        let mut cw = sq.clone();
        cw.reverse();
        assert!(point_in_polygon_2d(&Point2::new(5.0, 5.0), &cw));
    }

    #[test]
    fn bounds_of_square() {
        let (min, max) = bounds_2d(&square(3.0)).unwrap();
        assert!((min.x).abs() < TOLERANCE && (min.y).abs() < TOLERANCE);
        assert!((max.x - 3.0).abs() < TOLERANCE && (max.y - 3.0).abs() < TOLERANCE);
        assert!(bounds_2d(&[]).is_none());
    }

    #[test]
    fn canonical_start_rotation() {
        let pts = vec![
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
            Point2::new(0.0, 0.0),
        ];
        let rotated = rotate_to_canonical_start(&pts);
        assert!(rotated[0].x.abs() < TOLERANCE);
        assert!(rotated[0].y.abs() < TOLERANCE);
    }
}
