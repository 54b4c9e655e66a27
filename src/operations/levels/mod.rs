mod spacing;

use tracing::{debug, info};

use crate::config::ContourConfig;
use crate::error::{LevelError, Result};
use crate::geometry::{ElevationLevel, LevelSource};
use crate::math::LEVEL_EPSILON;

use spacing::{resolve_count, spaced_values};

/// Generates the ordered elevation levels for one run.
///
/// Levels are laid out over the data range `[min, max]` by the configured
/// strategy, clipped to the elevation filter, and finally joined by the
/// water-body level when one is configured.
pub struct GenerateLevels<'a> {
    min: f64,
    max: f64,
    num_layers: i32,
    config: &'a ContourConfig,
}

impl<'a> GenerateLevels<'a> {
    /// Creates a new `GenerateLevels` operation.
    ///
    /// `num_layers >= 2` overrides the interval, `1` yields the midpoint and
    /// anything lower uses `config.interval`.
    #[must_use]
    pub fn new(min: f64, max: f64, num_layers: i32, config: &'a ContourConfig) -> Self {
        Self {
            min,
            max,
            num_layers,
            config,
        }
    }

    /// Executes the level generation.
    ///
    /// # Errors
    ///
    /// Returns `LevelError::InvalidRange` if `max <= min` or either bound is
    /// not finite, `LevelError::InvalidInterval` if interval mode is selected
    /// with a non-positive interval, `LevelError::TooManyLevels` if the count
    /// would exceed the supported maximum, and `LevelError::EmptyLevelSet` if
    /// the elevation filter removes every generated level.
    pub fn execute(&self) -> Result<Vec<ElevationLevel>> {
        let (min, max) = (self.min, self.max);
        if !(min.is_finite() && max.is_finite()) || max <= min {
            return Err(LevelError::InvalidRange { min, max }.into());
        }

        let config = self.config;
        let count = resolve_count(min, max, self.num_layers, config.interval, config.strategy)?;
        let mut values = spaced_values(min, max, count, self.config.strategy);
        debug!(?count, generated = values.len(), "spaced raw levels");

        if let Some((lower, upper)) = self.filter_bounds() {
            values.retain(|v| *v >= lower - LEVEL_EPSILON && *v <= upper + LEVEL_EPSILON);
            if values.is_empty() {
                return Err(LevelError::EmptyLevelSet {
                    min,
                    max,
                    lower,
                    upper,
                }
                .into());
            }
        }

        let mut tagged: Vec<(f64, LevelSource)> = coalesce(values)
            .into_iter()
            .map(|v| (v, LevelSource::Raster))
            .collect();

        if self.config.has_water_polygon {
            if let Some(water) = self.config.fixed_elevation {
                insert_water(&mut tagged, water);
            }
        }

        let levels: Vec<ElevationLevel> = tagged
            .into_iter()
            .enumerate()
            .map(|(index, (value, source))| ElevationLevel::new(index, value, source))
            .collect();

        info!(
            count = levels.len(),
            strategy = ?self.config.strategy,
            min,
            max,
            "generated elevation levels"
        );
        Ok(levels)
    }

    /// The inclusive filter window, if any filtering applies.
    ///
    /// Explicit bounds take precedence; otherwise a positive threshold keeps
    /// the band above the minimum and a negative one the band below the maximum.
    fn filter_bounds(&self) -> Option<(f64, f64)> {
        let config = self.config;
        if config.min_elevation.is_some() || config.max_elevation.is_some() {
            return Some((
                config.min_elevation.unwrap_or(f64::NEG_INFINITY),
                config.max_elevation.unwrap_or(f64::INFINITY),
            ));
        }
        let t = config.elevation_threshold;
        if t > 0.0 {
            Some((self.min, self.min + t))
        } else if t < 0.0 {
            Some((self.max + t, self.max))
        } else {
            None
        }
    }
}

/// Sorts and merges values closer than [`LEVEL_EPSILON`].
fn coalesce(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(f64::total_cmp);
    values.dedup_by(|b, a| (*b - *a).abs() < LEVEL_EPSILON);
    values
}

/// Inserts the water level at its sorted position, re-tagging a coinciding level.
fn insert_water(levels: &mut Vec<(f64, LevelSource)>, water: f64) {
    if let Some(existing) = levels
        .iter_mut()
        .find(|(v, _)| (*v - water).abs() < LEVEL_EPSILON)
    {
        existing.1 = LevelSource::WaterBody;
        return;
    }
    let at = levels.partition_point(|(v, _)| *v < water);
    levels.insert(at, (water, LevelSource::WaterBody));
}
