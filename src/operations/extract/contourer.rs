use std::ops::ControlFlow;

use super::encoded::EncodedRaster;
use crate::error::ContourerFailure;
use crate::math::Point2;
use crate::raster::ElevationRaster;

/// Whether a ring bounds area at its level or cuts a hole out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingRole {
    Exterior,
    Hole,
}

/// One closed isoline as reported by a contourer, in ground coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRing {
    pub points: Vec<Point2>,
    pub role: RingRole,
}

impl RawRing {
    #[must_use]
    pub fn exterior(points: Vec<Point2>) -> Self {
        Self {
            points,
            role: RingRole::Exterior,
        }
    }

    #[must_use]
    pub fn hole(points: Vec<Point2>) -> Self {
        Self {
            points,
            role: RingRole::Hole,
        }
    }

    /// Whether the first and last points coincide.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(a), Some(b)) => self.points.len() > 1 && a == b,
            _ => false,
        }
    }
}

/// The raster representation a contourer consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RasterInputKind {
    /// The in-memory sample grid.
    #[default]
    Samples,
    /// A scoped temporary file holding the encoded raster.
    Encoded,
}

/// Raster handed to a contourer for one batched call.
#[derive(Debug, Clone, Copy)]
pub enum RasterInput<'a> {
    Samples(&'a ElevationRaster),
    Encoded(&'a EncodedRaster),
}

/// Receives rings as the contourer produces them.
pub trait RingSink {
    /// Accepts one ring at `level`. `Break` asks the contourer to stop early.
    fn accept(&mut self, level: f64, ring: RawRing) -> ControlFlow<()>;
}

/// External isoline extractor.
///
/// Called once per run with every raster-sourced level. Implementations
/// stream rings into the sink and should stop when the sink returns `Break`.
pub trait Contourer {
    /// The raster representation this contourer reads.
    fn input_kind(&self) -> RasterInputKind {
        RasterInputKind::Samples
    }

    /// Extracts closed rings for every value in `levels`.
    ///
    /// # Errors
    ///
    /// Returns a [`ContourerFailure`] naming the stage that failed.
    fn extract(
        &self,
        input: RasterInput<'_>,
        levels: &[f64],
        sink: &mut dyn RingSink,
    ) -> Result<(), ContourerFailure>;
}
