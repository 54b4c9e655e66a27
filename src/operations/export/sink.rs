use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::ExportError;
use crate::geometry::{ElevationLevel, LevelSource};
use crate::math::Point2;
use crate::operations::extract::RingRole;

/// Destination for features written during direct export.
pub trait FeatureSink {
    /// Writes one polygon feature: the first ring is the boundary, any
    /// further rings are its holes.
    ///
    /// # Errors
    ///
    /// Returns an `ExportError` if the feature cannot be serialized or written.
    fn write_polygon(
        &mut self,
        level: &ElevationLevel,
        role: RingRole,
        rings: &[&[Point2]],
    ) -> Result<(), ExportError>;

    /// Completes the output. No features may be written afterwards.
    ///
    /// # Errors
    ///
    /// Returns an `ExportError` if the trailer cannot be written or flushed.
    fn finish(&mut self) -> Result<(), ExportError>;
}

/// Streams a GeoJSON `FeatureCollection`, one feature at a time.
///
/// A failure part way through leaves a truncated document.
#[derive(Debug)]
pub struct GeoJsonSink<W: Write> {
    out: BufWriter<W>,
    features: usize,
    finished: bool,
}

impl GeoJsonSink<File> {
    /// Creates (or truncates) the file at `path` and writes the collection header.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::SinkOpen` if the file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, ExportError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| ExportError::SinkOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(file)
    }
}

impl<W: Write> GeoJsonSink<W> {
    /// Wraps `writer` and writes the collection header.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Write` if the header cannot be written.
    pub fn new(writer: W) -> Result<Self, ExportError> {
        let mut out = BufWriter::new(writer);
        out.write_all(br#"{"type":"FeatureCollection","features":["#)?;
        Ok(Self {
            out,
            features: 0,
            finished: false,
        })
    }

    /// Number of features written so far.
    #[must_use]
    pub fn feature_count(&self) -> usize {
        self.features
    }

    /// Finishes the document if needed and returns the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Write` if the trailer or the flush fails.
    pub fn into_inner(mut self) -> Result<W, ExportError> {
        self.finish()?;
        self.out.into_inner().map_err(|e| ExportError::Write(e.into_error()))
    }
}

impl<W: Write> FeatureSink for GeoJsonSink<W> {
    fn write_polygon(
        &mut self,
        level: &ElevationLevel,
        role: RingRole,
        rings: &[&[Point2]],
    ) -> Result<(), ExportError> {
        let feature = Feature {
            kind: "Feature",
            properties: Properties {
                elevation: level.value,
                level_index: level.index,
                role: match role {
                    RingRole::Exterior => "exterior",
                    RingRole::Hole => "hole",
                },
                source: match level.source {
                    LevelSource::Raster => "raster",
                    LevelSource::WaterBody => "water",
                },
            },
            geometry: Geometry {
                kind: "Polygon",
                coordinates: rings.iter().map(|r| closed_coordinates(r)).collect(),
            },
        };
        if self.features > 0 {
            self.out.write_all(b",")?;
        }
        serde_json::to_writer(&mut self.out, &feature)?;
        self.features += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ExportError> {
        if !self.finished {
            self.out.write_all(b"]}")?;
            self.out.flush()?;
            self.finished = true;
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    properties: Properties,
    geometry: Geometry,
}

#[derive(Serialize)]
struct Properties {
    elevation: f64,
    level_index: usize,
    role: &'static str,
    source: &'static str,
}

#[derive(Serialize)]
struct Geometry {
    #[serde(rename = "type")]
    kind: &'static str,
    coordinates: Vec<Vec<[f64; 2]>>,
}

/// Ring coordinates with the first position repeated at the end.
fn closed_coordinates(points: &[Point2]) -> Vec<[f64; 2]> {
    let mut coords: Vec<[f64; 2]> = points.iter().map(|p| [p.x, p.y]).collect();
    if let (Some(&first), Some(&last)) = (coords.first(), coords.last()) {
        if coords.len() == 1 || first != last {
            coords.push(first);
        }
    }
    coords
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn level() -> ElevationLevel {
        ElevationLevel::new(2, 150.0, LevelSource::Raster)
    }

    #[test]
    fn writes_valid_feature_collection() {
        let mut sink = GeoJsonSink::new(Vec::new()).unwrap();
        let square = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        sink.write_polygon(&level(), RingRole::Exterior, &[&square[..]]).unwrap();
        sink.write_polygon(&level(), RingRole::Hole, &[&square[..]]).unwrap();
        assert_eq!(sink.feature_count(), 2);

        let bytes = sink.into_inner().unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(doc["type"], "FeatureCollection");
        let features = doc["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0]["properties"]["elevation"], 150.0);
        assert_eq!(features[0]["properties"]["level_index"], 2);
        assert_eq!(features[1]["properties"]["role"], "hole");
        let ring = features[0]["geometry"]["coordinates"][0].as_array().unwrap();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring[0], ring[4]);
    }

    #[test]
    fn empty_collection_is_valid() {
        let sink = GeoJsonSink::new(Vec::new()).unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&sink.into_inner().unwrap()).unwrap();
        assert!(doc["features"].as_array().unwrap().is_empty());
    }

    #[test]
    fn unopenable_path_is_sink_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.geojson");
        let err = GeoJsonSink::create(&path).unwrap_err();
        assert!(matches!(err, ExportError::SinkOpen { .. }));
    }
}
