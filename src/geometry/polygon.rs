use super::Ring;

/// One exterior ring plus zero or more hole rings.
///
/// Holes are assumed to lie inside the exterior and not to cross it.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub exterior: Ring,
    pub holes: Vec<Ring>,
}

impl Polygon {
    /// Creates a polygon with the given exterior and holes.
    #[must_use]
    pub fn new(exterior: Ring, holes: Vec<Ring>) -> Self {
        Self { exterior, holes }
    }

    /// Creates a polygon without holes.
    #[must_use]
    pub fn solid(exterior: Ring) -> Self {
        Self {
            exterior,
            holes: Vec::new(),
        }
    }

    /// Exterior area minus hole areas, never negative.
    #[must_use]
    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(Ring::area).sum();
        (self.exterior.area() - holes).max(0.0)
    }

    /// Area enclosed by the exterior ring alone.
    #[must_use]
    pub fn exterior_area(&self) -> f64 {
        self.exterior.area()
    }

    /// Whether the exterior is missing or degenerate.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exterior.points().is_empty()
    }

    /// Discards all hole rings.
    pub fn clear_holes(&mut self) {
        self.holes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> Ring {
        Ring::from_xy(&[
            (x0, y0),
            (x0 + size, y0),
            (x0 + size, y0 + size),
            (x0, y0 + size),
        ])
    }

    #[test]
    fn area_subtracts_holes() {
        let poly = Polygon::new(square(0.0, 0.0, 10.0), vec![square(2.0, 2.0, 2.0)]);
        assert!((poly.area() - 96.0).abs() < 1e-9);
        assert!((poly.exterior_area() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn clear_holes_restores_exterior_area() {
        let mut poly = Polygon::new(square(0.0, 0.0, 10.0), vec![square(2.0, 2.0, 2.0)]);
        poly.clear_holes();
        assert!(poly.holes.is_empty());
        assert!((poly.area() - 100.0).abs() < 1e-9);
    }
}
