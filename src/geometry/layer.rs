use super::{ElevationLevel, LevelSource, Polygon};
use crate::math::AREA_EPSILON;

/// The polygons of one elevation band.
///
/// Created by the assembler, adjusted in place by the stacking transforms,
/// then handed to downstream writers unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct ContourLayer {
    /// Sequential number among the retained layers (0 = bottom).
    pub layer_number: usize,
    /// Index of the level this layer was built from.
    pub level_index: usize,
    /// Elevation of the level in meters.
    pub elevation: f64,
    pub source: LevelSource,
    pub polygons: Vec<Polygon>,
    /// Total area of all polygons in square meters.
    pub area: f64,
    /// Whether every ring arrived closed from the contourer.
    pub is_closed: bool,
}

impl ContourLayer {
    /// Creates a layer for `level` holding `polygons`, with its area computed.
    #[must_use]
    pub fn new(level: &ElevationLevel, polygons: Vec<Polygon>) -> Self {
        let mut layer = Self {
            layer_number: level.index,
            level_index: level.index,
            elevation: level.value,
            source: level.source,
            polygons,
            area: 0.0,
            is_closed: true,
        };
        layer.calculate_area();
        layer
    }

    /// Creates an empty placeholder layer for `level`.
    #[must_use]
    pub fn placeholder(level: &ElevationLevel) -> Self {
        Self::new(level, Vec::new())
    }

    /// Recomputes [`area`](Self::area) from the polygons.
    pub fn calculate_area(&mut self) {
        self.area = self.polygons.iter().map(Polygon::area).sum();
    }

    /// A layer is empty when it has no polygons or negligible area.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty() || self.area < AREA_EPSILON
    }

    /// Total number of hole rings across all polygons.
    #[must_use]
    pub fn hole_count(&self) -> usize {
        self.polygons.iter().map(|p| p.holes.len()).sum()
    }
}
