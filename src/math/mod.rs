pub mod arc_2d;
pub mod polygon_2d;

/// 2D point type in projected ground units (meters).
pub type Point2 = nalgebra::Point2<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Layers and polygons with less area than this (square meters) count as empty.
pub const AREA_EPSILON: f64 = 1e-12;

/// Elevation values closer than this (meters) are treated as the same level.
pub const LEVEL_EPSILON: f64 = 1e-6;
