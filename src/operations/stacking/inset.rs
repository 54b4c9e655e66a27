use geo::{BooleanOps, MultiPolygon};
use tracing::{debug, warn};

use crate::geometry::{ContourLayer, Polygon, Ring};
use crate::math::Point2;
use crate::operations::offset::RingOffset;

/// Outcome counts of an [`InsetForStacking`] pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InsetReport {
    /// Pocket holes added across all layers.
    pub pockets: usize,
    /// Polygons left unchanged because an inset collapsed.
    pub skipped: usize,
}

/// Cuts pockets into each layer where the layer above will sit.
///
/// For layer `N` every polygon gains, as holes, the overlap of its own
/// footprint and each footprint of layer `N + 1`, both eroded by the lip
/// width. The topmost layer is never changed. Collapsed insets are skipped
/// and logged; this pass never fails.
#[derive(Debug, Clone, Copy)]
pub struct InsetForStacking {
    distance: f64,
}

impl InsetForStacking {
    /// Creates a new inset pass leaving a lip of `distance` ground units.
    #[must_use]
    pub fn new(distance: f64) -> Self {
        Self { distance }
    }

    /// Applies the pass in place and recomputes the areas of changed layers.
    pub fn execute(&self, layers: &mut [ContourLayer]) -> InsetReport {
        let mut report = InsetReport::default();
        for n in 1..layers.len() {
            let (lower, upper) = layers.split_at_mut(n);
            let layer = &mut lower[n - 1];
            let footprints = self.upper_footprints(&upper[0], &mut report);
            if footprints.is_empty() {
                continue;
            }

            let mut changed = false;
            for polygon in &mut layer.polygons {
                let added = self.pocket_polygon(polygon, &footprints, &mut report);
                changed |= added > 0;
                report.pockets += added;
            }
            if changed {
                layer.calculate_area();
                debug!(layer = layer.layer_number, area = layer.area, "cut stacking pockets");
            }
        }
        report
    }

    /// Eroded exteriors of the layer above, with their bounds.
    fn upper_footprints(&self, upper: &ContourLayer, report: &mut InsetReport) -> Vec<Footprint> {
        let mut footprints = Vec::new();
        for polygon in &upper.polygons {
            match self.erode(&polygon.exterior) {
                Some(pieces) => footprints.extend(pieces),
                None => report.skipped += 1,
            }
        }
        footprints
    }

    /// Adds pocket holes to `polygon` and returns how many holes it gained.
    fn pocket_polygon(
        &self,
        polygon: &mut Polygon,
        footprints: &[Footprint],
        report: &mut InsetReport,
    ) -> usize {
        let Some(own) = self.erode(&polygon.exterior) else {
            report.skipped += 1;
            return 0;
        };

        let mut pockets: Vec<geo::Polygon<f64>> = Vec::new();
        for piece in &own {
            for upper in footprints.iter().filter(|f| f.overlaps(piece)) {
                pockets.extend(piece.shape.intersection(&upper.shape));
            }
        }
        if pockets.is_empty() {
            return 0;
        }

        let before = polygon.holes.len();
        let mut cut = MultiPolygon::new(pockets);
        if !polygon.holes.is_empty() {
            let existing = MultiPolygon::new(
                polygon
                    .holes
                    .iter()
                    .map(|h| geo::Polygon::new(h.to_line_string(), Vec::new()))
                    .collect(),
            );
            cut = existing.union(&cut);
        }
        polygon.holes = cut
            .iter()
            .map(|p| Ring::from_line_string(p.exterior()))
            .filter(Ring::is_valid)
            .map(|r| r.to_cw())
            .collect();
        polygon.holes.len().saturating_sub(before)
    }

    /// Every loop left after insetting `exterior`; `None` if it collapsed.
    fn erode(&self, exterior: &Ring) -> Option<Vec<Footprint>> {
        match RingOffset::new(exterior, self.distance).execute() {
            Ok(rings) => Some(rings.iter().filter_map(Footprint::new).collect()),
            Err(err) => {
                warn!(%err, "inset skipped");
                None
            }
        }
    }
}

/// An eroded exterior ready for boolean intersection.
struct Footprint {
    shape: geo::Polygon<f64>,
    min: Point2,
    max: Point2,
}

impl Footprint {
    fn new(ring: &Ring) -> Option<Self> {
        let (min, max) = ring.bounds()?;
        Some(Self {
            shape: geo::Polygon::new(ring.to_line_string(), Vec::new()),
            min,
            max,
        })
    }

    fn overlaps(&self, other: &Footprint) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::geometry::{ElevationLevel, LevelSource};
    use crate::test_support::{notched_bar, two_lobes};

    fn square(x0: f64, y0: f64, size: f64) -> Ring {
        Ring::from_xy(&[
            (x0, y0),
            (x0 + size, y0),
            (x0 + size, y0 + size),
            (x0, y0 + size),
        ])
    }

    fn layer(index: usize, polygons: Vec<Polygon>) -> ContourLayer {
        let level = ElevationLevel::new(index, index as f64 * 10.0, LevelSource::Raster);
        ContourLayer::new(&level, polygons)
    }

    #[test]
    fn covering_upper_layer_leaves_one_lip() {
        let mut layers = vec![
            layer(0, vec![Polygon::solid(square(0.0, 0.0, 10.0))]),
            layer(1, vec![Polygon::solid(square(-5.0, -5.0, 20.0))]),
        ];
        let report = InsetForStacking::new(1.0).execute(&mut layers);
        assert_eq!(report.pockets, 1);
        assert_eq!(layers[0].hole_count(), 1);
        assert_relative_eq!(layers[0].polygons[0].holes[0].area(), 64.0, epsilon = 1e-6);
        assert_relative_eq!(layers[0].area, 36.0, epsilon = 1e-6);
        assert_eq!(layers[1].hole_count(), 0);
    }

    #[test]
    fn partial_overlap_pockets_the_shared_region() {
        let mut layers = vec![
            layer(0, vec![Polygon::solid(square(0.0, 0.0, 10.0))]),
            layer(1, vec![Polygon::solid(square(4.0, 4.0, 4.0))]),
        ];
        InsetForStacking::new(1.0).execute(&mut layers);
        assert_eq!(layers[0].hole_count(), 1);
        // Upper footprint eroded to [5, 7]^2 lies inside the eroded base.
        assert_relative_eq!(layers[0].polygons[0].holes[0].area(), 4.0, epsilon = 1e-6);
        assert!(layers[0].polygons[0].holes[0].signed_area() < 0.0);
        assert_relative_eq!(layers[0].area, 96.0, epsilon = 1e-6);
    }

    #[test]
    fn topmost_layer_is_unchanged() {
        let mut layers = vec![layer(0, vec![Polygon::solid(square(0.0, 0.0, 10.0))])];
        let before = layers.clone();
        let report = InsetForStacking::new(1.0).execute(&mut layers);
        assert_eq!(report, InsetReport::default());
        assert_eq!(layers, before);
    }

    #[test]
    fn disjoint_upper_layer_adds_nothing() {
        let mut layers = vec![
            layer(0, vec![Polygon::solid(square(0.0, 0.0, 10.0))]),
            layer(1, vec![Polygon::solid(square(50.0, 50.0, 10.0))]),
        ];
        let report = InsetForStacking::new(1.0).execute(&mut layers);
        assert_eq!(report.pockets, 0);
        assert_eq!(layers[0].hole_count(), 0);
    }

    #[test]
    fn collapsed_inset_is_skipped() {
        let mut layers = vec![
            layer(0, vec![Polygon::solid(square(0.0, 0.0, 1.0))]),
            layer(1, vec![Polygon::solid(square(0.0, 0.0, 1.0))]),
        ];
        let report = InsetForStacking::new(2.0).execute(&mut layers);
        assert_eq!(report.pockets, 0);
        assert!(report.skipped >= 1);
        assert_relative_eq!(layers[0].area, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn pockets_merge_with_existing_holes() {
        let mut layers = vec![
            layer(
                0,
                vec![Polygon::new(square(0.0, 0.0, 20.0), vec![square(2.0, 2.0, 2.0).to_cw()])],
            ),
            layer(1, vec![Polygon::solid(square(10.0, 10.0, 6.0))]),
        ];
        InsetForStacking::new(1.0).execute(&mut layers);
        assert_eq!(layers[0].hole_count(), 2);
        assert_relative_eq!(layers[0].area, 400.0 - 4.0 - 16.0, epsilon = 1e-6);
    }

    #[test]
    fn pinched_lower_layer_gets_a_pocket_per_lobe() {
        let mut layers = vec![
            layer(0, vec![Polygon::solid(two_lobes())]),
            layer(1, vec![Polygon::solid(square(-5.0, -5.0, 40.0))]),
        ];
        let report = InsetForStacking::new(1.0).execute(&mut layers);
        assert_eq!(report.pockets, 2);
        assert_eq!(report.skipped, 0);
        assert_eq!(layers[0].hole_count(), 2);
        for hole in &layers[0].polygons[0].holes {
            assert_relative_eq!(hole.area(), 64.0, epsilon = 0.1);
        }
        // Lobes plus neck, less both pockets.
        assert_relative_eq!(layers[0].area, 204.0 - 128.0, epsilon = 0.2);
    }

    #[test]
    fn finely_notched_layer_still_gets_its_pocket() {
        let bar = notched_bar();
        let bar_area = bar.area();
        let mut layers = vec![
            layer(0, vec![Polygon::solid(bar)]),
            layer(1, vec![Polygon::solid(square(-10.0, -10.0, 420.0))]),
        ];
        let report = InsetForStacking::new(1.0).execute(&mut layers);
        assert_eq!(report, InsetReport { pockets: 1, skipped: 0 });
        let pocket = layers[0].polygons[0].holes[0].area();
        assert!(pocket > 398.0 * 13.0 && pocket < 398.0 * 18.0, "pocket area {pocket}");
        assert_relative_eq!(layers[0].area, bar_area - pocket, epsilon = 1e-6);
    }
}
