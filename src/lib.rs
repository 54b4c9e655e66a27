pub mod config;
pub mod diagnostics;
pub mod error;
pub mod geometry;
pub mod math;
pub mod operations;
pub mod pipeline;
pub mod raster;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{ContourConfig, LevelStrategy};
pub use diagnostics::{Diagnostics, StageOutcome, StageRecord};
pub use error::{Result, TerraceError};
pub use geometry::{ContourLayer, ElevationLevel, LevelSource, Polygon, Ring};
pub use pipeline::{ContourPipeline, PipelineOutput};
pub use raster::{ElevationRaster, GeoTransform};
