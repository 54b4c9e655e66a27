mod contourer;
mod encoded;

use std::ops::ControlFlow;

use tracing::{debug, info};

use crate::error::{ExtractionError, Result};
use crate::geometry::ElevationLevel;
use crate::math::LEVEL_EPSILON;
use crate::raster::ElevationRaster;

pub use contourer::{Contourer, RasterInput, RasterInputKind, RawRing, RingRole, RingSink};
pub use encoded::EncodedRaster;

/// Raw rings grouped by level index.
///
/// Water-body levels keep an empty slot so indices line up with the level sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawContours {
    by_level: Vec<Vec<RawRing>>,
}

impl RawContours {
    /// Creates empty ring lists for `level_count` levels.
    #[must_use]
    pub fn new(level_count: usize) -> Self {
        Self {
            by_level: vec![Vec::new(); level_count],
        }
    }

    /// Appends a ring to the list for `index`.
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::LevelIndexOutOfRange` for an unknown index.
    pub fn push(
        &mut self,
        index: usize,
        ring: RawRing,
    ) -> std::result::Result<(), ExtractionError> {
        let count = self.by_level.len();
        self.by_level
            .get_mut(index)
            .ok_or(ExtractionError::LevelIndexOutOfRange { index, count })?
            .push(ring);
        Ok(())
    }

    /// Rings for the level at `index`; empty for unknown indices.
    #[must_use]
    pub fn rings(&self, index: usize) -> &[RawRing] {
        self.by_level.get(index).map_or(&[], Vec::as_slice)
    }

    /// Moves the rings for `index` out, leaving the slot empty.
    pub fn take(&mut self, index: usize) -> Vec<RawRing> {
        self.by_level.get_mut(index).map(std::mem::take).unwrap_or_default()
    }

    #[must_use]
    pub fn level_count(&self) -> usize {
        self.by_level.len()
    }

    /// Total rings across all levels.
    #[must_use]
    pub fn ring_count(&self) -> usize {
        self.by_level.iter().map(Vec::len).sum()
    }
}

/// Runs the external contourer over a raster for a level sequence.
///
/// Only raster-sourced levels are sent. The contourer is called exactly once,
/// and an encoded temporary raster, if requested, lives only for that call.
pub struct ExtractContours<'a> {
    raster: &'a ElevationRaster,
    levels: &'a [ElevationLevel],
}

impl<'a> ExtractContours<'a> {
    /// Creates a new `ExtractContours` operation.
    #[must_use]
    pub fn new(raster: &'a ElevationRaster, levels: &'a [ElevationLevel]) -> Self {
        Self { raster, levels }
    }

    /// Collects every ring into a [`RawContours`] indexed by level.
    ///
    /// # Errors
    ///
    /// Returns an `ExtractionError` if the geotransform is invalid, the raster
    /// cannot be encoded, the contourer fails, or it reports an unrequested level.
    pub fn execute(&self, contourer: &dyn Contourer) -> Result<RawContours> {
        let mut contours = RawContours::new(self.levels.len());
        self.stream(contourer, &mut |level, ring| {
            contours.push(level.index, ring)
        })?;
        info!(
            levels = self.levels.len(),
            rings = contours.ring_count(),
            "extracted raw contours"
        );
        Ok(contours)
    }

    /// Forwards every ring to `handler` as it arrives, without collecting.
    ///
    /// The first handler error stops the contourer and is returned.
    ///
    /// # Errors
    ///
    /// As [`execute`](Self::execute), plus any error returned by `handler`.
    pub fn stream<'h>(
        &self,
        contourer: &dyn Contourer,
        handler: &'h mut RingHandler<'h>,
    ) -> Result<()> {
        self.raster.transform().validate()?;

        let batch: Vec<&ElevationLevel> = self.levels.iter().filter(|l| l.is_raster()).collect();
        if batch.is_empty() {
            debug!("no raster levels requested, skipping contourer");
            return Ok(());
        }
        let values: Vec<f64> = batch.iter().map(|l| l.value).collect();

        let mut router = LevelRouter {
            batch: &batch,
            handler,
            error: None,
        };

        let outcome = match contourer.input_kind() {
            RasterInputKind::Samples => {
                contourer.extract(RasterInput::Samples(self.raster), &values, &mut router)
            }
            RasterInputKind::Encoded => {
                let encoded = EncodedRaster::write(self.raster).map_err(ExtractionError::from)?;
                contourer.extract(RasterInput::Encoded(&encoded), &values, &mut router)
            }
        };

        if let Some(err) = router.error {
            return Err(err.into());
        }
        outcome.map_err(ExtractionError::from)?;
        Ok(())
    }
}

/// Receives each ring with the level it was reported for.
pub type RingHandler<'h> =
    dyn FnMut(&ElevationLevel, RawRing) -> std::result::Result<(), ExtractionError> + 'h;

/// Maps reported level values back to their levels and forwards the rings.
struct LevelRouter<'b, 'h> {
    batch: &'b [&'b ElevationLevel],
    handler: &'h mut RingHandler<'h>,
    error: Option<ExtractionError>,
}

impl RingSink for LevelRouter<'_, '_> {
    fn accept(&mut self, level: f64, ring: RawRing) -> ControlFlow<()> {
        if self.error.is_some() {
            return ControlFlow::Break(());
        }
        let batch = self.batch;
        let Some(target) = batch
            .iter()
            .find(|l| (l.value - level).abs() < LEVEL_EPSILON)
        else {
            self.error = Some(ExtractionError::UnexpectedLevel(level));
            return ControlFlow::Break(());
        };
        match (self.handler)(target, ring) {
            Ok(()) => ControlFlow::Continue(()),
            Err(err) => {
                self.error = Some(err);
                ControlFlow::Break(())
            }
        }
    }
}
