use tracing::debug;

use crate::geometry::ContourLayer;

/// Discards every hole ring so each polygon cuts as a single outline.
///
/// Idempotent: a second run finds nothing to remove.
#[derive(Debug, Default, Clone, Copy)]
pub struct RemoveHoles;

impl RemoveHoles {
    /// Creates a new `RemoveHoles` operation.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Removes holes in place, recomputes areas, and returns the number of holes removed.
    pub fn execute(&self, layers: &mut [ContourLayer]) -> usize {
        let mut removed = 0;
        for layer in layers.iter_mut() {
            let holes = layer.hole_count();
            if holes == 0 {
                continue;
            }
            layer.polygons.iter_mut().for_each(crate::geometry::Polygon::clear_holes);
            layer.calculate_area();
            removed += holes;
        }
        debug!(removed, "removed hole rings");
        removed
    }
}
