use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the contour layer pipeline.
#[derive(Debug, Error)]
pub enum TerraceError {
    #[error(transparent)]
    Level(#[from] LevelError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Contradictions in the level-strategy inputs. Reported before any extraction work.
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("invalid elevation range: max {max} must be greater than min {min}")]
    InvalidRange { min: f64, max: f64 },

    #[error("contour interval must be positive and finite, got {0}")]
    InvalidInterval(f64),

    #[error(
        "elevation filter [{lower}, {upper}] removes every level generated over [{min}, {max}]"
    )]
    EmptyLevelSet {
        min: f64,
        max: f64,
        lower: f64,
        upper: f64,
    },

    #[error("{requested} levels requested, at most {max} are supported")]
    TooManyLevels { requested: usize, max: usize },
}

/// Failures of the external contourer or the raster handed to it. Fatal for the run.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("raster encoding failed: {0}")]
    Encoding(#[from] EncodingError),

    #[error("contourer failed: {0}")]
    Contourer(#[from] ContourerFailure),

    #[error("invalid geotransform: {0}")]
    InvalidGeoTransform(String),

    #[error("contourer returned rings for level {0}, which was not requested")]
    UnexpectedLevel(f64),

    #[error("contourer referenced level index {index}, but only {count} levels were requested")]
    LevelIndexOutOfRange { index: usize, count: usize },

    #[error("output sink rejected a ring: {0}")]
    Sink(#[from] ExportError),
}

/// Failures writing or reading the temporary GeoTIFF handed to disk-based contourers.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("temporary raster I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("GeoTIFF codec failed: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("unsupported raster: {0}")]
    Unsupported(String),
}

/// Failure reported by a [`Contourer`](crate::operations::extract::Contourer) implementation.
#[derive(Debug, Error)]
#[error("{stage}: {message}")]
pub struct ContourerFailure {
    /// Which part of the contourer failed.
    pub stage: ContourerStage,
    /// Human-readable description.
    pub message: String,
}

impl ContourerFailure {
    /// Creates a failure in the raster-encoding stage.
    #[must_use]
    pub fn encoding(message: impl Into<String>) -> Self {
        Self {
            stage: ContourerStage::Encoding,
            message: message.into(),
        }
    }

    /// Creates a failure in the isoline-extraction stage.
    #[must_use]
    pub fn extraction(message: impl Into<String>) -> Self {
        Self {
            stage: ContourerStage::Extraction,
            message: message.into(),
        }
    }
}

/// Stage of an external contourer call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContourerStage {
    Encoding,
    Extraction,
}

impl std::fmt::Display for ContourerStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encoding => f.write_str("raster encoding"),
            Self::Extraction => f.write_str("isoline extraction"),
        }
    }
}

/// Invalid or contradictory configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("has_water_polygon is set but no water polygons were supplied")]
    MissingWaterGeometry,

    #[error("direct export was selected ({0}) but no output sink was provided")]
    MissingDirectSink(String),
}

/// Failures of the direct-export output sink.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot open output sink {path}: {source}")]
    SinkOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("write to output sink failed: {0}")]
    Write(#[from] std::io::Error),

    #[error("feature serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors constructing an elevation raster.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("raster is {width}x{height} but {len} samples were supplied")]
    SizeMismatch {
        width: usize,
        height: usize,
        len: usize,
    },

    #[error("raster dimensions must be non-zero, got {width}x{height}")]
    ZeroSize { width: usize, height: usize },

    #[error("downsample factor must be at least 1")]
    InvalidDownsample,
}

/// Errors from geometric computations. Recovered locally by the pipeline.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("offset collapsed: {0}")]
    OffsetCollapsed(String),
}

/// Convenience type alias for results using [`TerraceError`].
pub type Result<T> = std::result::Result<T, TerraceError>;
