mod mode;
mod sink;

use tracing::{debug, info};

use crate::error::{ExtractionError, Result, TerraceError};
use crate::geometry::{ElevationLevel, LevelSource, Polygon};
use crate::math::Point2;
use crate::operations::extract::{Contourer, ExtractContours, RingRole};
use crate::raster::ElevationRaster;

pub use mode::{DirectReason, ExecutionMode};
pub use sink::{FeatureSink, GeoJsonSink};

/// Counts from a direct export run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    /// Features written to the sink.
    pub features: usize,
    /// Levels sent to the contourer or written from water geometry.
    pub levels: usize,
}

/// Streams contourer output straight to a [`FeatureSink`].
///
/// No layer model is built: rings are written as they arrive, uncleaned and
/// unnested, and the stacking transforms are not applied. Water-body levels
/// are written from the supplied polygons.
pub struct DirectExport<'a> {
    raster: &'a ElevationRaster,
    levels: &'a [ElevationLevel],
    water: &'a [Polygon],
}

impl<'a> DirectExport<'a> {
    /// Creates a new `DirectExport` operation.
    #[must_use]
    pub fn new(raster: &'a ElevationRaster, levels: &'a [ElevationLevel]) -> Self {
        Self {
            raster,
            levels,
            water: &[],
        }
    }

    /// Supplies the polygons written for water-body levels.
    #[must_use]
    pub fn with_water(mut self, polygons: &'a [Polygon]) -> Self {
        self.water = polygons;
        self
    }

    /// Runs the contourer and writes every ring to `sink`, then finishes the sink.
    ///
    /// # Errors
    ///
    /// Returns an `ExtractionError` from the contourer stage, or an
    /// `ExportError` if the sink rejects a feature. The sink may then hold a
    /// truncated document.
    pub fn execute(
        &self,
        contourer: &dyn Contourer,
        sink: &mut dyn FeatureSink,
    ) -> Result<ExportSummary> {
        let mut summary = ExportSummary {
            features: 0,
            levels: self.levels.len(),
        };

        for level in self.levels.iter().filter(|l| l.source == LevelSource::WaterBody) {
            for polygon in self.water {
                let rings: Vec<&[Point2]> = std::iter::once(polygon.exterior.points())
                    .chain(polygon.holes.iter().map(|h| h.points()))
                    .collect();
                sink.write_polygon(level, RingRole::Exterior, &rings)?;
                summary.features += 1;
            }
            debug!(level = level.index, polygons = self.water.len(), "wrote water level");
        }

        ExtractContours::new(self.raster, self.levels)
            .stream(contourer, &mut |level, ring| {
                sink.write_polygon(level, ring.role, &[ring.points.as_slice()])
                    .map_err(ExtractionError::Sink)?;
                summary.features += 1;
                Ok(())
            })
            .map_err(|err| match err {
                TerraceError::Extraction(ExtractionError::Sink(e)) => TerraceError::Export(e),
                other => other,
            })?;

        sink.finish()?;
        info!(features = summary.features, levels = summary.levels, "direct export complete");
        Ok(summary)
    }
}
