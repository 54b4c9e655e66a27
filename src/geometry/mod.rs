pub mod layer;
pub mod level;
pub mod polygon;
pub mod ring;

pub use layer::ContourLayer;
pub use level::{level_values, ElevationLevel, LevelSource};
pub use polygon::Polygon;
pub use ring::Ring;
