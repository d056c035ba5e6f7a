use crate::errors::{NavError, NavResult};
use crate::pathfinding::{TerrainClass, TerrainQuery};
use crate::terrain::coordinates::{
    SampleCoord, get_height_at_world_interpolated, nearest_sample, sample_index,
};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub mod footprint;

pub use footprint::Footprint;

/// Heightmap with a ground class per sample, usable as a [`TerrainQuery`].
///
/// Samples are spaced `scale` world units apart with sample `(0, 0)` at the
/// world origin, so the terrain covers `[0, (width - 1) * scale]` on X and
/// `[0, (height - 1) * scale]` on Z.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HeightmapTerrain {
    #[validate(range(min = 2, max = 4096))]
    pub width: u32,
    #[validate(range(min = 2, max = 4096))]
    pub height: u32,
    pub heights: Vec<f32>, // Flattened 2D array (row-major)
    pub classes: Vec<TerrainClass>,
    #[validate(range(min = 0.1, max = 100.0))]
    pub scale: f32, // World units between samples
}

impl HeightmapTerrain {
    /// Create open terrain from row-major heights, with validation
    pub fn new(width: u32, height: u32, heights: Vec<f32>, scale: f32) -> NavResult<Self> {
        let expected_size = width as usize * height as usize;
        if heights.len() != expected_size {
            return Err(NavError::InvalidTerrainData {
                reason: format!(
                    "Heights array size {} does not match terrain dimensions {width}x{height} (expected {expected_size})",
                    heights.len(),
                ),
            });
        }
        if let Some(index) = heights.iter().position(|h| !h.is_finite()) {
            return Err(NavError::InvalidTerrainData {
                reason: format!("height at index {index} is not finite"),
            });
        }

        let terrain = Self {
            width,
            height,
            heights,
            classes: vec![TerrainClass::Open; expected_size],
            scale,
        };

        terrain.validate().map_err(|validation_errors| {
            let error_details = validation_errors
                .field_errors()
                .iter()
                .map(|(field, errors)| {
                    let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                    format!("{field}: {}", error_msgs.join(", "))
                })
                .collect::<Vec<String>>()
                .join("; ");

            NavError::InvalidTerrainData {
                reason: format!("Terrain validation failed: {error_details}"),
            }
        })?;

        Ok(terrain)
    }

    /// Create level open terrain
    pub fn flat(width: u32, height: u32, scale: f32, base_height: f32) -> NavResult<Self> {
        let heights = vec![base_height; width as usize * height as usize];
        Self::new(width, height, heights, scale)
    }

    /// Mark every open sample below `level` as water
    pub fn with_water_level(mut self, level: f32) -> Self {
        for (class, &height) in self.classes.iter_mut().zip(&self.heights) {
            if *class == TerrainClass::Open && height < level {
                *class = TerrainClass::Water;
            }
        }
        self
    }

    /// World-space size covered by the samples
    pub fn extent(&self) -> Vec2 {
        Vec2::new(
            (self.width - 1) as f32 * self.scale,
            (self.height - 1) as f32 * self.scale,
        )
    }

    pub fn class_at_sample(&self, x: u32, z: u32) -> Option<TerrainClass> {
        let index = sample_index(self, SampleCoord::new(x, z))?;
        self.classes.get(index).copied()
    }

    /// Set the class of every sample inside the footprint; returns how many
    /// samples changed
    pub fn stamp_footprint(&mut self, center: Vec3, footprint: &Footprint, class: TerrainClass) -> usize {
        let mut changed = 0;
        let limit = UVec2::new(self.width, self.height);
        for coord in footprint.covered_lattice(center, self.scale, 0.0, limit) {
            let Some(index) = sample_index(self, SampleCoord::new(coord.x, coord.z)) else {
                continue;
            };
            let Some(sample_class) = self.classes.get_mut(index) else {
                continue;
            };
            if *sample_class != class {
                *sample_class = class;
                changed += 1;
            }
        }
        changed
    }

    /// Return samples under a removed structure to open ground
    pub fn clear_footprint(&mut self, center: Vec3, footprint: &Footprint) -> usize {
        self.stamp_footprint(center, footprint, TerrainClass::Open)
    }

    /// Counts of samples per class, in declaration order
    pub fn class_counts(&self) -> [(TerrainClass, usize); 4] {
        let mut counts = [
            (TerrainClass::Open, 0),
            (TerrainClass::Water, 0),
            (TerrainClass::Watercourse, 0),
            (TerrainClass::Structure, 0),
        ];
        for class in &self.classes {
            if let Some(entry) = counts.iter_mut().find(|(c, _)| c == class) {
                entry.1 += 1;
            }
        }
        counts
    }
}

impl TerrainQuery for HeightmapTerrain {
    fn terrain_class(&self, world_x: f32, world_z: f32) -> Option<TerrainClass> {
        let sample = nearest_sample(self, world_x, world_z)?;
        self.class_at_sample(sample.x, sample.z)
    }

    fn height_at(&self, world_x: f32, world_z: f32) -> Option<f32> {
        get_height_at_world_interpolated(self, world_x, world_z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathfinding::{GridCoord, PathfindingConfig, Pathfinder};

    #[test]
    fn test_terrain_creation() {
        let terrain = HeightmapTerrain::new(2, 2, vec![0.0, 1.0, 2.0, 3.0], 1.0).unwrap();
        assert_eq!(terrain.width, 2);
        assert_eq!(terrain.height, 2);
        assert_eq!(terrain.classes.len(), 4);
        assert_eq!(terrain.extent(), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_invalid_terrain_rejected() {
        assert!(HeightmapTerrain::new(2, 2, vec![0.0, 1.0, 2.0], 1.0).is_err());
        assert!(HeightmapTerrain::new(2, 2, vec![0.0, f32::NAN, 2.0, 3.0], 1.0).is_err());
        assert!(matches!(
            HeightmapTerrain::flat(1, 4, 1.0, 0.0),
            Err(NavError::InvalidTerrainData { .. })
        ));
        assert!(HeightmapTerrain::flat(4, 4, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_water_level_classifies_low_samples() {
        let terrain = HeightmapTerrain::new(2, 2, vec![-1.0, 0.5, 2.0, -0.2], 1.0)
            .unwrap()
            .with_water_level(0.0);

        assert_eq!(terrain.class_at_sample(0, 0), Some(TerrainClass::Water));
        assert_eq!(terrain.class_at_sample(1, 0), Some(TerrainClass::Open));
        assert_eq!(terrain.class_at_sample(1, 1), Some(TerrainClass::Water));
        assert_eq!(terrain.class_counts()[1], (TerrainClass::Water, 2));
    }

    #[test]
    fn test_terrain_query_uses_nearest_class_and_interpolated_height() {
        let mut terrain = HeightmapTerrain::new(3, 3, vec![0.0; 9], 2.0).unwrap();
        terrain.heights[4] = 4.0;
        terrain.classes[8] = TerrainClass::Watercourse;

        assert_eq!(terrain.height_at(2.0, 2.0), Some(4.0));
        assert_eq!(terrain.height_at(1.0, 2.0), Some(2.0));
        assert_eq!(terrain.terrain_class(3.6, 3.6), Some(TerrainClass::Watercourse));
        assert_eq!(terrain.terrain_class(2.4, 2.4), Some(TerrainClass::Open));
        assert_eq!(terrain.terrain_class(-1.0, 0.0), None);
        assert_eq!(terrain.height_at(0.0, 4.5), None);
    }

    #[test]
    fn test_stamp_and_clear_footprint() {
        let mut terrain = HeightmapTerrain::flat(10, 10, 1.0, 0.0).unwrap();
        let footprint = Footprint::Rectangle {
            half_extents: Vec2::new(1.0, 1.0),
        };
        let center = Vec3::new(4.0, 0.0, 4.0);

        assert_eq!(terrain.stamp_footprint(center, &footprint, TerrainClass::Structure), 9);
        assert_eq!(terrain.class_at_sample(3, 5), Some(TerrainClass::Structure));
        assert_eq!(terrain.class_at_sample(6, 4), Some(TerrainClass::Open));
        assert_eq!(terrain.stamp_footprint(center, &footprint, TerrainClass::Structure), 0);

        assert_eq!(terrain.clear_footprint(center, &footprint), 9);
        assert_eq!(terrain.class_counts()[0], (TerrainClass::Open, 100));
    }

    #[test]
    fn test_structure_blocks_navigation_after_footprint_update() {
        let terrain = HeightmapTerrain::flat(41, 41, 1.0, 0.0).unwrap();
        let extent = terrain.extent();
        let mut pathfinder =
            Pathfinder::build(terrain, extent.x, extent.y, PathfindingConfig::default()).unwrap();

        let center = Vec3::new(20.0, 0.0, 20.0);
        let footprint = Footprint::Circle { radius: 3.0 };
        let cell = GridCoord::new(5, 5);
        assert!(pathfinder.grid().is_passable(cell));

        pathfinder
            .terrain_mut()
            .stamp_footprint(center, &footprint, TerrainClass::Structure);
        assert!(pathfinder.update_footprint(center, &footprint) > 0);
        assert!(!pathfinder.grid().is_passable(cell));

        pathfinder.terrain_mut().clear_footprint(center, &footprint);
        pathfinder.update_footprint(center, &footprint);
        assert!(pathfinder.grid().is_passable(cell));
    }

    #[test]
    fn test_oversized_footprint_covers_whole_terrain() {
        let mut terrain = HeightmapTerrain::flat(5, 5, 1.0, 0.0).unwrap();
        let footprint = Footprint::Circle { radius: 1.0e6 };

        let changed =
            terrain.stamp_footprint(Vec3::new(2.0, 0.0, 2.0), &footprint, TerrainClass::Structure);
        assert_eq!(changed, 25);
        assert_eq!(terrain.class_counts()[3], (TerrainClass::Structure, 25));
    }

    #[test]
    fn test_stamp_skips_samples_without_a_class() {
        let mut terrain = HeightmapTerrain::flat(4, 4, 1.0, 0.0).unwrap();
        terrain.classes.truncate(6);

        let changed = terrain.stamp_footprint(
            Vec3::new(1.5, 0.0, 1.5),
            &Footprint::Rectangle {
                half_extents: Vec2::splat(2.0),
            },
            TerrainClass::Structure,
        );

        assert_eq!(changed, 6);
        assert_eq!(terrain.class_at_sample(3, 3), None);
    }

    #[test]
    fn test_lake_is_impassable() {
        let mut terrain = HeightmapTerrain::flat(41, 41, 1.0, 1.0).unwrap();
        for z in 14..=26 {
            for x in 14..=26 {
                terrain.heights[z * 41 + x] = -1.0;
            }
        }
        let terrain = terrain.with_water_level(0.0);
        let extent = terrain.extent();
        let pathfinder =
            Pathfinder::build(terrain, extent.x, extent.y, PathfindingConfig::default()).unwrap();

        assert!(!pathfinder.grid().is_passable(GridCoord::new(5, 5)));
        assert!(pathfinder.grid().is_passable(GridCoord::new(1, 1)));
    }
}
