//! Contourers and sinks for unit tests.

use std::cell::{Cell, RefCell};
use std::ops::ControlFlow;
use std::path::PathBuf;

use crate::error::{ContourerFailure, ExportError};
use crate::geometry::{ElevationLevel, Ring};
use crate::math::Point2;
use crate::operations::export::FeatureSink;
use crate::operations::extract::{
    Contourer, RasterInput, RasterInputKind, RawRing, RingRole, RingSink,
};
use crate::raster::{ElevationRaster, GeoTransform};

/// Replays a fixed list of rings, ignoring the raster.
#[derive(Debug, Default)]
pub(crate) struct ScriptedContourer {
    pub rings: Vec<(f64, RawRing)>,
    pub kind: RasterInputKind,
    pub failure: Option<String>,
    pub calls: Cell<usize>,
    pub levels_seen: RefCell<Vec<f64>>,
    pub encoded_path: RefCell<Option<PathBuf>>,
}

impl ScriptedContourer {
    pub fn new(rings: Vec<(f64, RawRing)>) -> Self {
        Self {
            rings,
            ..Self::default()
        }
    }
}

impl Contourer for ScriptedContourer {
    fn input_kind(&self) -> RasterInputKind {
        self.kind
    }

    fn extract(
        &self,
        input: RasterInput<'_>,
        levels: &[f64],
        sink: &mut dyn RingSink,
    ) -> Result<(), ContourerFailure> {
        self.calls.set(self.calls.get() + 1);
        self.levels_seen.borrow_mut().extend_from_slice(levels);
        if let RasterInput::Encoded(encoded) = input {
            if !encoded.path().exists() {
                return Err(ContourerFailure::encoding("temporary raster missing"));
            }
            *self.encoded_path.borrow_mut() = Some(encoded.path().to_path_buf());
        }
        for (level, ring) in &self.rings {
            if sink.accept(*level, ring.clone()).is_break() {
                return Ok(());
            }
        }
        match &self.failure {
            Some(message) => Err(ContourerFailure::extraction(message.clone())),
            None => Ok(()),
        }
    }
}

/// Emits, per level, the bounding rectangle of all valid pixels at or above it.
///
/// Crude, but it responds to the raster the way a real contourer does:
/// higher levels shrink, and an all no-data raster yields nothing.
#[derive(Debug, Default)]
pub(crate) struct BoxContourer {
    pub kind: RasterInputKind,
}

impl Contourer for BoxContourer {
    fn input_kind(&self) -> RasterInputKind {
        self.kind
    }

    fn extract(
        &self,
        input: RasterInput<'_>,
        levels: &[f64],
        sink: &mut dyn RingSink,
    ) -> Result<(), ContourerFailure> {
        let decoded;
        let raster = match input {
            RasterInput::Samples(raster) => raster,
            RasterInput::Encoded(encoded) => {
                decoded = encoded
                    .read()
                    .map_err(|e| ContourerFailure::encoding(e.to_string()))?;
                &decoded
            }
        };
        for &level in levels {
            if let Some(ring) = box_at(raster, level) {
                if let ControlFlow::Break(()) = sink.accept(level, RawRing::exterior(ring)) {
                    break;
                }
            }
        }
        Ok(())
    }
}

#[allow(clippy::cast_precision_loss)]
fn box_at(raster: &ElevationRaster, level: f64) -> Option<Vec<Point2>> {
    let mut extent: Option<(usize, usize, usize, usize)> = None;
    for row in 0..raster.height() {
        for col in 0..raster.width() {
            let v = raster.get(col, row)?;
            if raster.is_nodata(v) || f64::from(v) < level {
                continue;
            }
            extent = Some(match extent {
                None => (col, row, col, row),
                Some((c0, r0, c1, r1)) => (c0.min(col), r0.min(row), c1.max(col), r1.max(row)),
            });
        }
    }
    let (c0, r0, c1, r1) = extent?;
    let gt = raster.transform();
    let (x0, y0, x1, y1) = (c0 as f64, r0 as f64, (c1 + 1) as f64, (r1 + 1) as f64);
    Some(vec![
        gt.pixel_to_ground(x0, y0),
        gt.pixel_to_ground(x0, y1),
        gt.pixel_to_ground(x1, y1),
        gt.pixel_to_ground(x1, y0),
        gt.pixel_to_ground(x0, y0),
    ])
}

/// Routes pipeline logs to the test harness; honors `RUST_LOG`.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A raster with unit pixels whose origin is at ground `(0, rows)`.
pub(crate) fn raster(samples: Vec<f32>, width: usize, height: usize) -> ElevationRaster {
    #[allow(clippy::cast_precision_loss)]
    let top = height as f64;
    let transform = GeoTransform::north_up(0.0, top, 1.0);
    match ElevationRaster::new(samples, width, height, transform, None) {
        Ok(r) => r,
        Err(e) => panic!("bad test raster: {e}"),
    }
}

/// Closed square ring points.
pub(crate) fn square(x0: f64, y0: f64, size: f64) -> Vec<Point2> {
    vec![
        Point2::new(x0, y0),
        Point2::new(x0 + size, y0),
        Point2::new(x0 + size, y0 + size),
        Point2::new(x0, y0 + size),
        Point2::new(x0, y0),
    ]
}

/// Two 10x10 lobes side by side, joined by a 4-long neck 1 unit wide.
pub(crate) fn two_lobes() -> Ring {
    Ring::from_xy(&[
        (0.0, 0.0),
        (10.0, 0.0),
        (10.0, 4.5),
        (14.0, 4.5),
        (14.0, 0.0),
        (24.0, 0.0),
        (24.0, 10.0),
        (14.0, 10.0),
        (14.0, 5.5),
        (10.0, 5.5),
        (10.0, 10.0),
        (0.0, 10.0),
    ])
}

/// A 400x20 bar with 300 notches 0.25 wide and 5 deep cut into its top edge.
pub(crate) fn notched_bar() -> Ring {
    let mut coords = vec![(0.0, 0.0), (400.0, 0.0), (400.0, 20.0)];
    for k in (0..300_u32).rev() {
        let x = 50.0 + f64::from(k);
        coords.extend([(x + 0.25, 20.0), (x + 0.25, 15.0), (x, 15.0), (x, 20.0)]);
    }
    coords.push((0.0, 20.0));
    Ring::from_xy(&coords)
}

/// One written feature as seen by [`MemorySink`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WrittenFeature {
    pub elevation: f64,
    pub level_index: usize,
    pub role: RingRole,
    pub rings: usize,
}

/// Collects features in memory; optionally fails after a number of writes.
#[derive(Debug, Default)]
pub(crate) struct MemorySink {
    pub features: Vec<WrittenFeature>,
    pub finished: bool,
    pub fail_after: Option<usize>,
}

impl FeatureSink for MemorySink {
    fn write_polygon(
        &mut self,
        level: &ElevationLevel,
        role: RingRole,
        rings: &[&[Point2]],
    ) -> Result<(), ExportError> {
        if self.fail_after.is_some_and(|n| self.features.len() >= n) {
            return Err(ExportError::Write(std::io::Error::other("sink full")));
        }
        self.features.push(WrittenFeature {
            elevation: level.value,
            level_index: level.index,
            role,
            rings: rings.len(),
        });
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ExportError> {
        self.finished = true;
        Ok(())
    }
}
