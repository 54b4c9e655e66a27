use super::{Point2, Vector2, TOLERANCE};

/// A circular arc reconstructed from a bulge segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BulgeArc {
    pub center: Point2,
    pub radius: f64,
    pub start_angle: f64,
    /// Signed sweep in radians; positive is counter-clockwise.
    pub sweep: f64,
}

impl BulgeArc {
    /// Recovers the arc from `start` to `end` with the given bulge
    /// (`tan(sweep / 4)`). Returns `None` for a straight or zero-length segment.
    #[must_use]
    pub fn from_bulge(start: &Point2, end: &Point2, bulge: f64) -> Option<Self> {
        let chord = end - start;
        let chord_len = chord.norm();
        if chord_len < TOLERANCE || bulge.abs() < TOLERANCE {
            return None;
        }

        // Center lies on the chord bisector, left of the chord for positive bulge.
        let sagitta_ratio = (1.0 - bulge * bulge) / (2.0 * bulge);
        let normal = Vector2::new(-chord.y, chord.x) / chord_len;
        let mid = start + chord * 0.5;
        let center = mid + normal * (sagitta_ratio * chord_len * 0.5);
        let radius = (chord_len * 0.5) * (1.0 + bulge * bulge) / (2.0 * bulge.abs());

        Some(Self {
            center,
            radius,
            start_angle: (start.y - center.y).atan2(start.x - center.x),
            sweep: 4.0 * bulge.atan(),
        })
    }

    /// Point at parameter `t` in `[0, 1]` along the arc.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point2 {
        let angle = self.start_angle + self.sweep * t;
        self.center + Vector2::new(angle.cos(), angle.sin()) * self.radius
    }

    /// Number of chords needed to keep the sagitta within `tolerance`.
    #[must_use]
    pub fn subdivision_count(&self, tolerance: f64) -> usize {
        let abs_sweep = self.sweep.abs();
        if self.radius < TOLERANCE || abs_sweep < TOLERANCE || tolerance <= 0.0 {
            return 1;
        }
        // sagitta = r * (1 - cos(theta / 2))
        let max_angle = if tolerance >= self.radius {
            std::f64::consts::PI
        } else {
            2.0 * (1.0 - tolerance / self.radius).acos()
        };
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let n = (abs_sweep / max_angle).ceil() as usize;
        n.max(1)
    }
}

/// Interior points of the bulge segment from `start` to `end`, excluding both
/// endpoints, spaced so no chord deviates from the arc by more than `tolerance`.
///
/// A straight segment yields no points.
#[must_use]
pub fn bulge_interior_points(
    start: &Point2,
    end: &Point2,
    bulge: f64,
    tolerance: f64,
) -> Vec<Point2> {
    let Some(arc) = BulgeArc::from_bulge(start, end, bulge) else {
        return Vec::new();
    };
    let n = arc.subdivision_count(tolerance);
    #[allow(clippy::cast_precision_loss)]
    (1..n).map(|i| arc.point_at(i as f64 / n as f64)).collect()
}
