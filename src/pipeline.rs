use std::borrow::Cow;
use std::path::Path;

use tracing::{info, warn};

use crate::config::ContourConfig;
use crate::diagnostics::Diagnostics;
use crate::error::{ConfigError, Result};
use crate::geometry::{ContourLayer, ElevationLevel, Polygon};
use crate::operations::assemble::AssembleLayers;
use crate::operations::export::{
    DirectExport, DirectReason, ExecutionMode, ExportSummary, FeatureSink, GeoJsonSink,
};
use crate::operations::extract::{Contourer, ExtractContours};
use crate::operations::levels::GenerateLevels;
use crate::operations::stacking::{InsetForStacking, RemoveHoles};
use crate::raster::ElevationRaster;

/// Half-width in meters of the level band used when nothing gives a range.
const FALLBACK_HALF_BAND: f64 = 50.0;

/// Result of [`ContourPipeline::run`].
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutput {
    /// The finished layer model, bottom layer first.
    Layers(Vec<ContourLayer>),
    /// Raw rings were streamed to the output file instead.
    Direct {
        reason: DirectReason,
        summary: ExportSummary,
    },
}

/// Raster and levels ready for extraction.
struct Prepared<'r> {
    raster: Cow<'r, ElevationRaster>,
    levels: Vec<ElevationLevel>,
}

/// Orchestrates one contour generation run.
///
/// Borrows its configuration and contourer immutably; independent pipelines
/// may run side by side. Every stage reports to the [`Diagnostics`] passed in.
pub struct ContourPipeline<'a> {
    config: &'a ContourConfig,
    contourer: &'a dyn Contourer,
    water: &'a [Polygon],
}

impl<'a> ContourPipeline<'a> {
    #[must_use]
    pub fn new(config: &'a ContourConfig, contourer: &'a dyn Contourer) -> Self {
        Self {
            config,
            contourer,
            water: &[],
        }
    }

    /// Supplies the water-body geometry used when `has_water_polygon` is set.
    #[must_use]
    pub fn with_water_polygons(mut self, polygons: &'a [Polygon]) -> Self {
        self.water = polygons;
        self
    }

    /// Generates the ordered levels for `raster` without extracting anything.
    ///
    /// # Errors
    ///
    /// Returns configuration, raster, or level errors.
    pub fn levels(
        &self,
        raster: &ElevationRaster,
        num_layers: i32,
        diagnostics: &Diagnostics,
    ) -> Result<Vec<ElevationLevel>> {
        Ok(self.prepare(raster, num_layers, diagnostics)?.levels)
    }

    /// Builds the full layer model, applying the configured stacking transforms.
    ///
    /// # Errors
    ///
    /// Returns configuration, raster, level, or extraction errors. Geometry
    /// problems inside individual rings or insets are logged and skipped.
    pub fn generate(
        &self,
        raster: &ElevationRaster,
        num_layers: i32,
        diagnostics: &Diagnostics,
    ) -> Result<Vec<ContourLayer>> {
        let prepared = self.prepare(raster, num_layers, diagnostics)?;
        self.build_layers(&prepared, diagnostics)
    }

    /// Streams raw rings to `sink` without building the layer model.
    ///
    /// # Errors
    ///
    /// As [`generate`](Self::generate), plus sink errors.
    pub fn export_direct(
        &self,
        raster: &ElevationRaster,
        num_layers: i32,
        sink: &mut dyn FeatureSink,
        diagnostics: &Diagnostics,
    ) -> Result<ExportSummary> {
        let prepared = self.prepare(raster, num_layers, diagnostics)?;
        self.stream(&prepared, sink, diagnostics)
    }

    /// Runs the pipeline in the mode the configuration and raster call for.
    ///
    /// Direct mode writes GeoJSON to `direct_path`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingDirectSink` if direct mode is selected
    /// without a path, `ExportError::SinkOpen` if the file cannot be created,
    /// and otherwise as [`generate`](Self::generate).
    pub fn run(
        &self,
        raster: &ElevationRaster,
        num_layers: i32,
        direct_path: Option<&Path>,
        diagnostics: &Diagnostics,
    ) -> Result<PipelineOutput> {
        let guard = diagnostics.stage("run");
        let prepared = self.prepare(raster, num_layers, diagnostics)?;

        let estimate = prepared.raster.estimated_model_bytes(prepared.levels.len());
        let output = match ExecutionMode::select(self.config, estimate) {
            ExecutionMode::LayerModel => {
                PipelineOutput::Layers(self.build_layers(&prepared, diagnostics)?)
            }
            ExecutionMode::Direct(reason) => {
                info!(%reason, "using direct export");
                let path =
                    direct_path.ok_or_else(|| ConfigError::MissingDirectSink(reason.to_string()))?;
                let mut sink = GeoJsonSink::create(path)?;
                let summary = self.stream(&prepared, &mut sink, diagnostics)?;
                PipelineOutput::Direct { reason, summary }
            }
        };
        guard.complete();
        Ok(output)
    }

    fn prepare<'r>(
        &self,
        raster: &'r ElevationRaster,
        num_layers: i32,
        diagnostics: &Diagnostics,
    ) -> Result<Prepared<'r>> {
        let config = self.config;

        diagnostics.run("validate", || -> Result<()> {
            config.validate()?;
            if config.has_water_polygon && self.water.is_empty() {
                return Err(ConfigError::MissingWaterGeometry.into());
            }
            Ok(())
        })?;

        let raster = diagnostics.run("prepare raster", || -> Result<Cow<'r, ElevationRaster>> {
            if config.downsample_factor > 1 {
                let small = raster.downsample(config.downsample_factor)?;
                info!(
                    factor = config.downsample_factor,
                    width = small.width(),
                    height = small.height(),
                    "downsampled raster"
                );
                Ok(Cow::Owned(small))
            } else {
                Ok(Cow::Borrowed(raster))
            }
        })?;

        let levels = diagnostics.run("levels", || -> Result<Vec<ElevationLevel>> {
            let range = raster
                .elevation_range()
                .or_else(|| self.explicit_range())
                .or_else(|| self.fallback_range());
            let Some((min, max)) = range else {
                warn!("raster has no valid samples and no elevation range; producing no layers");
                return Ok(Vec::new());
            };
            let levels = GenerateLevels::new(min, max, num_layers, config).execute()?;
            Ok(self.select_layers(levels))
        })?;

        Ok(Prepared { raster, levels })
    }

    /// Explicit bounds stand in for the data range of an all no-data raster.
    fn explicit_range(&self) -> Option<(f64, f64)> {
        match (self.config.min_elevation, self.config.max_elevation) {
            (Some(lo), Some(hi)) => {
                warn!(lo, hi, "raster has no valid samples; using configured elevation bounds");
                Some((lo, hi))
            }
            _ => None,
        }
    }

    /// A band centered on whichever bound is configured, or on zero, so forced
    /// runs over an all no-data raster still yield their placeholder layers.
    fn fallback_range(&self) -> Option<(f64, f64)> {
        if !self.config.force_all_layers {
            return None;
        }
        let mid = self
            .config
            .min_elevation
            .or(self.config.max_elevation)
            .unwrap_or(0.0);
        warn!(
            mid,
            half_width = FALLBACK_HALF_BAND,
            "raster has no valid samples; using fallback band"
        );
        Some((mid - FALLBACK_HALF_BAND, mid + FALLBACK_HALF_BAND))
    }

    /// Keeps only the requested 1-based layer numbers, re-indexing the survivors.
    fn select_layers(&self, levels: Vec<ElevationLevel>) -> Vec<ElevationLevel> {
        let wanted = &self.config.specific_layers;
        if wanted.is_empty() {
            return levels;
        }
        levels
            .into_iter()
            .filter(|l| wanted.contains(&(l.index + 1)))
            .enumerate()
            .map(|(index, l)| ElevationLevel { index, ..l })
            .collect()
    }

    fn build_layers(
        &self,
        prepared: &Prepared<'_>,
        diagnostics: &Diagnostics,
    ) -> Result<Vec<ContourLayer>> {
        let config = self.config;
        let levels = &prepared.levels;
        if levels.is_empty() {
            return Ok(Vec::new());
        }

        let raw = diagnostics.run("extract", || {
            ExtractContours::new(&prepared.raster, levels).execute(self.contourer)
        })?;

        let mut layers = diagnostics.run("assemble", || {
            AssembleLayers::new(levels, raw, config).with_water(self.water).execute()
        })?;

        if config.remove_holes {
            let guard = diagnostics.stage("remove holes");
            RemoveHoles::new().execute(&mut layers);
            guard.complete();
        }
        if config.inset_upper_layers {
            let guard = diagnostics.stage("inset");
            let report = InsetForStacking::new(config.inset_distance()).execute(&mut layers);
            if report.skipped > 0 {
                warn!(skipped = report.skipped, "some polygons were too small to inset");
            }
            guard.complete();
        }

        info!(
            layers = layers.len(),
            total_area = layers.iter().map(|l| l.area).sum::<f64>(),
            "generated contour layers"
        );
        Ok(layers)
    }

    fn stream(
        &self,
        prepared: &Prepared<'_>,
        sink: &mut dyn FeatureSink,
        diagnostics: &Diagnostics,
    ) -> Result<ExportSummary> {
        diagnostics.run("direct export", || {
            DirectExport::new(&prepared.raster, &prepared.levels)
                .with_water(self.water)
                .execute(self.contourer, sink)
        })
    }
}
