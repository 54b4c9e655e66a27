use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;
use tracing::debug;

use crate::error::EncodingError;
use crate::raster::{ElevationRaster, GeoTransform};

// GeoTIFF and GDAL private tag codes.
const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

/// Key directory header plus `GTRasterTypeGeoKey = RasterPixelIsArea`.
const GEO_KEYS: [u16; 8] = [1, 1, 0, 1, 1025, 0, 1, 1];

/// A raster written to a temporary single-band `f32` GeoTIFF for contourers
/// that read from disk.
///
/// North-up transforms go into the pixel-scale and tiepoint tags, anything
/// else into the model transformation. A declared no-data value is stored in
/// the GDAL no-data tag. The file is removed when this value is dropped.
#[derive(Debug)]
pub struct EncodedRaster {
    file: NamedTempFile,
    width: usize,
    height: usize,
}

impl EncodedRaster {
    /// Encodes `raster` into a fresh temporary file.
    ///
    /// # Errors
    ///
    /// Returns `EncodingError::Unsupported` if the raster is too large for a
    /// baseline TIFF, or any I/O or codec error from writing the file.
    pub fn write(raster: &ElevationRaster) -> Result<Self, EncodingError> {
        let width = tiff_dimension(raster.width())?;
        let height = tiff_dimension(raster.height())?;
        let file = tempfile::Builder::new()
            .prefix("terrace-")
            .suffix(".tif")
            .tempfile()?;

        let mut out = BufWriter::new(file.as_file());
        {
            let mut encoder = TiffEncoder::new(&mut out)?;
            let mut image = encoder.new_image::<colortype::Gray32Float>(width, height)?;
            let dir = image.encoder();
            let gt = raster.transform().0;
            if is_north_up(&gt) {
                dir.write_tag(tag(MODEL_PIXEL_SCALE), &[gt[1], -gt[5], 0.0][..])?;
                dir.write_tag(tag(MODEL_TIEPOINT), &[0.0, 0.0, 0.0, gt[0], gt[3], 0.0][..])?;
            } else {
                #[rustfmt::skip]
                let matrix = [
                    gt[1], gt[2], 0.0, gt[0],
                    gt[4], gt[5], 0.0, gt[3],
                    0.0, 0.0, 0.0, 0.0,
                    0.0, 0.0, 0.0, 1.0,
                ];
                dir.write_tag(tag(MODEL_TRANSFORMATION), &matrix[..])?;
            }
            dir.write_tag(tag(GEO_KEY_DIRECTORY), &GEO_KEYS[..])?;
            if let Some(nodata) = raster.nodata() {
                dir.write_tag(tag(GDAL_NODATA), nodata.to_string().as_str())?;
            }
            image.write_data(raster.samples())?;
        }
        out.flush()?;
        drop(out);

        debug!(
            path = %file.path().display(),
            width,
            height,
            "encoded raster to temporary GeoTIFF"
        );
        Ok(Self {
            file,
            width: raster.width(),
            height: raster.height(),
        })
    }

    /// Location of the temporary file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Decodes the file back into a raster.
    ///
    /// # Errors
    ///
    /// Returns `EncodingError::Unsupported` for a non-`f32` image or missing
    /// georeferencing, or any I/O or codec error from reading the file.
    pub fn read(&self) -> Result<ElevationRaster, EncodingError> {
        let mut decoder = Decoder::new(BufReader::new(File::open(self.path())?))?;
        let (width, height) = decoder.dimensions()?;
        let transform = read_transform(&mut decoder)?;
        let nodata = decoder
            .get_tag_ascii_string(tag(GDAL_NODATA))
            .ok()
            .and_then(|s| s.trim_end_matches('\0').trim().parse::<f32>().ok());

        let DecodingResult::F32(samples) = decoder.read_image()? else {
            return Err(EncodingError::Unsupported(
                "expected 32-bit float samples".to_owned(),
            ));
        };
        ElevationRaster::new(samples, width as usize, height as usize, transform, nodata)
            .map_err(|e| EncodingError::Unsupported(e.to_string()))
    }
}

fn tiff_dimension(n: usize) -> Result<u32, EncodingError> {
    u32::try_from(n)
        .map_err(|_| EncodingError::Unsupported(format!("dimension {n} exceeds TIFF limits")))
}

/// The decoder's canonical tag for `code`, named or not.
fn tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

/// Whether the transform fits the scale-and-tiepoint form.
fn is_north_up(gt: &[f64; 6]) -> bool {
    gt[2].abs() < f64::EPSILON && gt[4].abs() < f64::EPSILON && gt[5] < 0.0
}

fn read_transform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<GeoTransform, EncodingError> {
    if let Ok(m) = decoder.get_tag_f64_vec(tag(MODEL_TRANSFORMATION)) {
        if m.len() >= 8 {
            return Ok(GeoTransform([m[3], m[0], m[1], m[7], m[4], m[5]]));
        }
    }
    let tiepoint = decoder.get_tag_f64_vec(tag(MODEL_TIEPOINT))?;
    let scale = decoder.get_tag_f64_vec(tag(MODEL_PIXEL_SCALE))?;
    if tiepoint.len() < 6 || scale.len() < 2 {
        return Err(EncodingError::Unsupported("incomplete georeferencing tags".to_owned()));
    }
    // Tiepoint maps pixel (i, j) to model (x, y).
    let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);
    Ok(GeoTransform([
        x - i * scale[0],
        scale[0],
        0.0,
        y + j * scale[1],
        0.0,
        -scale[1],
    ]))
}
