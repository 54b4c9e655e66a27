use crate::error::{ExtractionError, RasterError};
use crate::math::Point2;

/// Values at or below this are treated as no-data (the SRTM void marker).
pub const VOID_SENTINEL: f32 = -30000.0;

/// Affine pixel-to-ground transform in GDAL order:
/// `[origin_x, pixel_width, row_rotation, origin_y, column_rotation, pixel_height]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform(pub [f64; 6]);

impl GeoTransform {
    /// A north-up transform with square pixels.
    #[must_use]
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_size: f64) -> Self {
        Self([origin_x, pixel_size, 0.0, origin_y, 0.0, -pixel_size])
    }

    /// Maps a (fractional) pixel position to ground coordinates.
    #[must_use]
    pub fn pixel_to_ground(&self, column: f64, row: f64) -> Point2 {
        let [ox, pw, rx, oy, ry, ph] = self.0;
        Point2::new(ox + column * pw + row * rx, oy + column * ry + row * ph)
    }

    /// Checks that the transform is finite and invertible.
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::InvalidGeoTransform` describing the defect.
    pub fn validate(&self) -> Result<(), ExtractionError> {
        if self.0.iter().any(|v| !v.is_finite()) {
            return Err(ExtractionError::InvalidGeoTransform(format!(
                "non-finite coefficient in {:?}",
                self.0
            )));
        }
        let [_, pw, rx, _, ry, ph] = self.0;
        let det = pw * ph - rx * ry;
        if det.abs() < f64::EPSILON {
            return Err(ExtractionError::InvalidGeoTransform(format!(
                "singular pixel matrix (determinant {det})"
            )));
        }
        Ok(())
    }

    fn scaled(&self, factor: f64) -> Self {
        let [ox, pw, rx, oy, ry, ph] = self.0;
        Self([ox, pw * factor, rx * factor, oy, ry * factor, ph * factor])
    }
}

/// A row-major grid of elevation samples with its georeference.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationRaster {
    samples: Vec<f32>,
    width: usize,
    height: usize,
    transform: GeoTransform,
    nodata: Option<f32>,
}

impl ElevationRaster {
    /// Creates a raster from row-major samples.
    ///
    /// # Errors
    ///
    /// Returns `RasterError::ZeroSize` for an empty grid and
    /// `RasterError::SizeMismatch` when the sample count is not `width * height`.
    pub fn new(
        samples: Vec<f32>,
        width: usize,
        height: usize,
        transform: GeoTransform,
        nodata: Option<f32>,
    ) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::ZeroSize { width, height });
        }
        if width.checked_mul(height) != Some(samples.len()) {
            return Err(RasterError::SizeMismatch {
                width,
                height,
                len: samples.len(),
            });
        }
        Ok(Self {
            samples,
            width,
            height,
            transform,
            nodata,
        })
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    #[must_use]
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    #[must_use]
    pub fn nodata(&self) -> Option<f32> {
        self.nodata
    }

    /// Sample at `(column, row)`, or `None` when out of bounds.
    #[must_use]
    pub fn get(&self, column: usize, row: usize) -> Option<f32> {
        if column >= self.width || row >= self.height {
            return None;
        }
        self.samples.get(row * self.width + column).copied()
    }

    /// Whether `value` carries no elevation.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_nodata(&self, value: f32) -> bool {
        value.is_nan() || value <= VOID_SENTINEL || self.nodata.is_some_and(|nd| value == nd)
    }

    /// Lowest and highest valid elevation, or `None` when every sample is no-data.
    #[must_use]
    pub fn elevation_range(&self) -> Option<(f64, f64)> {
        self.samples
            .iter()
            .filter(|v| !self.is_nodata(**v))
            .fold(None, |acc, &v| {
                let v = f64::from(v);
                Some(match acc {
                    None => (v, v),
                    Some((lo, hi)) => (f64::min(lo, v), f64::max(hi, v)),
                })
            })
    }

    /// Number of samples that carry an elevation.
    #[must_use]
    pub fn valid_count(&self) -> usize {
        self.samples.iter().filter(|v| !self.is_nodata(**v)).count()
    }

    /// Averages valid samples in `factor x factor` blocks.
    ///
    /// Blocks without any valid sample stay no-data. Edge blocks may be
    /// partial. The geotransform is scaled so the result covers the same ground.
    ///
    /// # Errors
    ///
    /// Returns `RasterError::InvalidDownsample` if `factor` is zero.
    pub fn downsample(&self, factor: usize) -> Result<Self, RasterError> {
        if factor == 0 {
            return Err(RasterError::InvalidDownsample);
        }
        if factor == 1 {
            return Ok(self.clone());
        }
        let width = self.width.div_ceil(factor);
        let height = self.height.div_ceil(factor);
        let fill = self.nodata.unwrap_or(f32::NAN);

        let mut samples = Vec::with_capacity(width * height);
        for block_row in 0..height {
            for block_col in 0..width {
                let mut sum = 0.0_f64;
                let mut n = 0_u32;
                for row in block_row * factor..((block_row + 1) * factor).min(self.height) {
                    for col in block_col * factor..((block_col + 1) * factor).min(self.width) {
                        let v = self.samples[row * self.width + col];
                        if !self.is_nodata(v) {
                            sum += f64::from(v);
                            n += 1;
                        }
                    }
                }
                samples.push(if n == 0 { fill } else { mean_to_sample(sum, n) });
            }
        }

        Ok(Self {
            samples,
            width,
            height,
            transform: self.transform.scaled(usize_to_f64(factor)),
            nodata: self.nodata,
        })
    }

    /// Rough in-memory size of the layer model this raster could produce.
    ///
    /// Assumes every valid sample contributes one ring vertex per level.
    #[must_use]
    pub fn estimated_model_bytes(&self, level_count: usize) -> u64 {
        const BYTES_PER_VERTEX: u64 = 16;
        let vertices = u64::try_from(self.valid_count()).unwrap_or(u64::MAX);
        let levels = u64::try_from(level_count).unwrap_or(u64::MAX);
        vertices.saturating_mul(levels).saturating_mul(BYTES_PER_VERTEX)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn mean_to_sample(sum: f64, n: u32) -> f32 {
    (sum / f64::from(n)) as f32
}

#[allow(clippy::cast_precision_loss)]
fn usize_to_f64(v: usize) -> f64 {
    v as f64
}
