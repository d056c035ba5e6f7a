pub mod config;
pub mod errors;
pub mod map;
pub mod pathfinding;
pub mod plugins;
pub mod terrain;
pub mod terrain_generation;

// Selective re-exports for external consumers

// Engine facade and its collaborator interface
pub use crate::pathfinding::{
    GridDebugView, NavigationGrid, PathFailure, PathfindingConfig, Pathfinder, TerrainClass,
    TerrainQuery,
};

// Errors for setup operations
pub use errors::{NavError, NavResult};

// Terrain implementation and structure shapes
pub use map::{Footprint, HeightmapTerrain};

// Bevy integration
pub use plugins::{NavigationPlugin, TerrainChanged};
