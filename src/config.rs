use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// How level values are spaced between the minimum and maximum elevation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelStrategy {
    /// Equal spacing.
    #[default]
    Uniform,
    /// Geometric spacing in height above the minimum; strongly denser near the bottom.
    Logarithmic,
    /// Exponential easing; moderately denser near the bottom.
    Exponential,
}

/// Configuration snapshot for one contour generation run.
///
/// Read-only for the whole pipeline. Optional settings use `Option` for "unset".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourConfig {
    /// Contour interval in meters, used when no layer count is requested.
    pub interval: f64,
    /// Vertical-band relief (true) or terrain-following (false). Consumed by
    /// downstream renderers; never changes the level math.
    pub vertical_contour_relief: bool,
    /// Ignore hole rings while assembling layers.
    pub outer_boundaries_only: bool,
    /// Drop hole rings after assembly for simpler cutting.
    pub remove_holes: bool,
    /// Keep empty layers as placeholders so the layer count is predictable.
    pub force_all_layers: bool,
    /// Cut pockets where the next layer up sits.
    pub inset_upper_layers: bool,
    /// Width of the lip left around each pocket, in physical millimeters.
    pub inset_offset_mm: f64,
    /// Ground units (meters) represented by one physical millimeter.
    pub ground_units_per_mm: f64,
    /// Douglas-Peucker tolerance in meters; `0` disables simplification.
    pub simplify_tolerance: f64,
    /// Consecutive ring points closer than this (meters) are merged.
    pub vertex_dedup_tolerance: f64,
    pub strategy: LevelStrategy,
    /// Lower bound on generated levels.
    pub min_elevation: Option<f64>,
    /// Upper bound on generated levels.
    pub max_elevation: Option<f64>,
    /// Positive: keep levels up to this height above the lowest point.
    /// Negative: keep levels down to this depth below the highest point.
    /// Ignored when an explicit bound is set.
    pub elevation_threshold: f64,
    /// Elevation of the water-body level.
    pub fixed_elevation: Option<f64>,
    /// Insert a water-body level built from caller-supplied polygons.
    pub has_water_polygon: bool,
    /// 1-based layer numbers to keep; empty keeps all.
    pub specific_layers: Vec<usize>,
    /// Average raster samples in `n x n` blocks before extraction.
    pub downsample_factor: usize,
    /// Operator-selected low-memory mode: stream raw rings to the sink.
    pub force_direct_export: bool,
    /// Use direct export when no stacking transform is requested.
    pub direct_when_unstacked: bool,
    /// Switch to direct export when the estimated layer model exceeds this.
    pub memory_budget_mb: Option<u64>,
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            interval: 100.0,
            vertical_contour_relief: true,
            outer_boundaries_only: false,
            remove_holes: true,
            force_all_layers: false,
            inset_upper_layers: false,
            inset_offset_mm: 1.0,
            ground_units_per_mm: 0.001,
            simplify_tolerance: 0.0,
            vertex_dedup_tolerance: 1e-6,
            strategy: LevelStrategy::Uniform,
            min_elevation: None,
            max_elevation: None,
            elevation_threshold: 0.0,
            fixed_elevation: None,
            has_water_polygon: false,
            specific_layers: Vec::new(),
            downsample_factor: 1,
            force_direct_export: false,
            direct_when_unstacked: false,
            memory_budget_mb: None,
        }
    }
}

impl ContourConfig {
    /// Parses a JSON configuration; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` on malformed JSON, or any error from
    /// [`validate`](Self::validate).
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` if the file cannot be read, otherwise as
    /// [`from_json_str`](Self::from_json_str).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Rejects values no run could use.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        self.check_fields().map_err(Into::into)
    }

    fn check_fields(&self) -> std::result::Result<(), ConfigError> {
        check_non_negative("inset_offset_mm", self.inset_offset_mm)?;
        check_non_negative("simplify_tolerance", self.simplify_tolerance)?;
        check_non_negative("vertex_dedup_tolerance", self.vertex_dedup_tolerance)?;
        if !(self.ground_units_per_mm.is_finite() && self.ground_units_per_mm > 0.0) {
            return Err(invalid("ground_units_per_mm", "must be positive and finite"));
        }
        if !self.elevation_threshold.is_finite() {
            return Err(invalid("elevation_threshold", "must be finite"));
        }
        if self.downsample_factor == 0 {
            return Err(invalid("downsample_factor", "must be at least 1"));
        }
        if let (Some(lo), Some(hi)) = (self.min_elevation, self.max_elevation) {
            if lo > hi {
                return Err(invalid(
                    "min_elevation",
                    format!("{lo} is above max_elevation {hi}"),
                ));
            }
        }
        if self.has_water_polygon && self.fixed_elevation.is_none() {
            return Err(invalid(
                "fixed_elevation",
                "required when has_water_polygon is set",
            ));
        }
        if self.specific_layers.contains(&0) {
            return Err(invalid("specific_layers", "layer numbers start at 1"));
        }
        Ok(())
    }

    /// Inset lip width converted to ground units.
    #[must_use]
    pub fn inset_distance(&self) -> f64 {
        self.inset_offset_mm * self.ground_units_per_mm
    }

    /// Whether any stacking transform is requested.
    #[must_use]
    pub fn wants_stacking(&self) -> bool {
        self.remove_holes || self.inset_upper_layers
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn check_non_negative(field: &'static str, value: f64) -> std::result::Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be finite and non-negative, got {value}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::TerraceError;

    #[test]
    fn defaults_are_valid() {
        ContourConfig::default().validate().unwrap();
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let config = ContourConfig::from_json_str(
            r#"{ "interval": 50.0, "strategy": "exponential", "max_elevation": 900.0 }"#,
        )
        .unwrap();
        assert!((config.interval - 50.0).abs() < 1e-12);
        assert_eq!(config.strategy, LevelStrategy::Exponential);
        assert_eq!(config.max_elevation, Some(900.0));
        assert!(config.remove_holes);
        assert!(config.min_elevation.is_none());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = ContourConfig::from_json_str("{ interval: ").unwrap_err();
        assert!(matches!(err, TerraceError::Config(ConfigError::Parse(_))));
    }

    #[test]
    fn water_flag_without_elevation_is_rejected() {
        let config = ContourConfig {
            has_water_polygon: true,
            ..ContourConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            TerraceError::Config(ConfigError::Invalid {
                field: "fixed_elevation",
                ..
            })
        ));
    }

    #[test]
    fn negative_inset_is_rejected() {
        let config = ContourConfig {
            inset_offset_mm: -1.0,
            ..ContourConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let config = ContourConfig {
            min_elevation: Some(500.0),
            max_elevation: Some(100.0),
            ..ContourConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = ContourConfig::from_path("/nonexistent/terrace.json").unwrap_err();
        assert!(matches!(err, TerraceError::Config(ConfigError::Read { .. })));
    }

    #[test]
    fn inset_distance_converts_mm_to_ground_units() {
        let config = ContourConfig {
            inset_offset_mm: 2.0,
            ground_units_per_mm: 5.0,
            ..ContourConfig::default()
        };
        assert!((config.inset_distance() - 10.0).abs() < 1e-12);
    }
}
