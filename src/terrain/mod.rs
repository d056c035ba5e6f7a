//! Heightmap sampling utilities

pub mod coordinates;

pub use coordinates::{SampleCoord, get_height_at_world_interpolated, nearest_sample};
