/// Where the polygons of a level come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LevelSource {
    /// Extracted from the elevation raster by the contourer.
    #[default]
    Raster,
    /// Pre-supplied water-body geometry at a fixed elevation.
    WaterBody,
}

/// One band boundary in the ordered level sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevationLevel {
    /// 0-based position in the ordered sequence.
    pub index: usize,
    /// Elevation in meters.
    pub value: f64,
    pub source: LevelSource,
}

impl ElevationLevel {
    #[must_use]
    pub fn new(index: usize, value: f64, source: LevelSource) -> Self {
        Self {
            index,
            value,
            source,
        }
    }

    /// Whether the level's geometry comes from the raster.
    #[must_use]
    pub fn is_raster(&self) -> bool {
        self.source == LevelSource::Raster
    }
}

/// Elevation values of a level sequence, in order.
#[must_use]
pub fn level_values(levels: &[ElevationLevel]) -> Vec<f64> {
    levels.iter().map(|l| l.value).collect()
}
