mod clean;
mod nesting;

use tracing::{debug, info, warn};

use crate::config::ContourConfig;
use crate::error::{ConfigError, Result};
use crate::geometry::{ContourLayer, ElevationLevel, LevelSource, Polygon, Ring};
use crate::operations::extract::{RawContours, RawRing, RingRole};

use clean::RingCleaner;

/// Builds one [`ContourLayer`] per level from raw contourer rings.
///
/// Rings are cleaned, nested into polygons, and measured. Empty layers are
/// dropped unless `force_all_layers` is set, and the survivors are numbered
/// from zero. Water-body levels take the supplied water polygons instead.
pub struct AssembleLayers<'a> {
    levels: &'a [ElevationLevel],
    raw: RawContours,
    config: &'a ContourConfig,
    water: &'a [Polygon],
}

impl<'a> AssembleLayers<'a> {
    /// Creates a new `AssembleLayers` operation.
    #[must_use]
    pub fn new(levels: &'a [ElevationLevel], raw: RawContours, config: &'a ContourConfig) -> Self {
        Self {
            levels,
            raw,
            config,
            water: &[],
        }
    }

    /// Supplies the polygons used for water-body levels.
    #[must_use]
    pub fn with_water(mut self, polygons: &'a [Polygon]) -> Self {
        self.water = polygons;
        self
    }

    /// Executes the assembly.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingWaterGeometry` if a water-body level is
    /// present but no water polygons were supplied.
    pub fn execute(self) -> Result<Vec<ContourLayer>> {
        let Self {
            levels,
            mut raw,
            config,
            water,
        } = self;

        if water.is_empty() && levels.iter().any(|l| l.source == LevelSource::WaterBody) {
            return Err(ConfigError::MissingWaterGeometry.into());
        }

        let cleaner = RingCleaner {
            dedup_tolerance: config.vertex_dedup_tolerance,
            simplify_tolerance: config.simplify_tolerance,
        };

        let mut layers = Vec::with_capacity(levels.len());
        for level in levels {
            let layer = match level.source {
                LevelSource::Raster => {
                    let rings = raw.take(level.index);
                    assemble_raster_level(level, rings, &cleaner, config.outer_boundaries_only)
                }
                LevelSource::WaterBody => {
                    let polygons: Vec<Polygon> =
                        water.iter().filter_map(|p| cleaner.clean_polygon(p)).collect();
                    ContourLayer::new(level, polygons)
                }
            };
            debug!(
                level = level.index,
                elevation = level.value,
                polygons = layer.polygons.len(),
                holes = layer.hole_count(),
                area = layer.area,
                "assembled layer"
            );
            layers.push(layer);
        }

        let total = layers.len();
        if !config.force_all_layers {
            layers.retain(|l| !l.is_empty());
        }
        for (number, layer) in layers.iter_mut().enumerate() {
            layer.layer_number = number;
        }

        info!(
            levels = total,
            layers = layers.len(),
            dropped = total - layers.len(),
            "assembled contour layers"
        );
        Ok(layers)
    }
}

fn assemble_raster_level(
    level: &ElevationLevel,
    rings: Vec<RawRing>,
    cleaner: &RingCleaner,
    outer_only: bool,
) -> ContourLayer {
    let is_closed = rings.iter().all(RawRing::is_closed);
    let received = rings.len();

    let cleaned: Vec<(Ring, RingRole)> = rings
        .into_iter()
        .filter(|r| !(outer_only && r.role == RingRole::Hole))
        .filter_map(|r| cleaner.clean(&r.points).map(|ring| (ring, r.role)))
        .collect();

    let kept = cleaned.len();
    if kept < received && !outer_only {
        warn!(
            level = level.index,
            dropped = received - kept,
            "dropped degenerate rings"
        );
    }

    let mut layer = ContourLayer::new(level, nesting::build_polygons(cleaned));
    layer.is_closed = is_closed;
    layer
}
