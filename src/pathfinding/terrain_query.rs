//! Terrain collaborator interface consumed by grid construction and smoothing

use serde::{Deserialize, Serialize};

/// Ground classification at a world position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TerrainClass {
    #[default]
    Open,
    Water,
    /// Rivers, streams and other linear water features
    Watercourse,
    /// Building or other structure footprint
    Structure,
}

impl TerrainClass {
    /// Whether agents can never stand on this class regardless of slope
    pub fn is_blocking(self) -> bool {
        !matches!(self, TerrainClass::Open)
    }
}

/// Deterministic terrain sampling by world `(x, z)`.
///
/// Grid construction calls this roughly nine times per cell, so implementations
/// should be cheap. `None` means the position has no terrain data.
pub trait TerrainQuery: Send + Sync + 'static {
    fn terrain_class(&self, world_x: f32, world_z: f32) -> Option<TerrainClass>;

    /// Interpolated ground elevation
    fn height_at(&self, world_x: f32, world_z: f32) -> Option<f32>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_open_ground_is_walkable() {
        assert!(!TerrainClass::Open.is_blocking());
        assert!(TerrainClass::Water.is_blocking());
        assert!(TerrainClass::Watercourse.is_blocking());
        assert!(TerrainClass::Structure.is_blocking());
    }
}
