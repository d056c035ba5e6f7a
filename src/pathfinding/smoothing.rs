//! Reduce a cell-by-cell route to the waypoints an agent actually needs

use crate::pathfinding::PathfindingConfig;
use crate::pathfinding::grid::NavigationGrid;
use crate::pathfinding::terrain_query::TerrainQuery;
use bevy::prelude::*;

/// Whether an agent can walk straight from `from` to `to`.
///
/// Samples every half cell along the segment. Fails on impassable cells, on
/// cells costing at least `smoothing_max_cost` (steep ground, obstacle margins)
/// and on height changes between consecutive samples steeper than
/// `smoothing_max_slope`.
pub fn has_line_of_sight<T: TerrainQuery + ?Sized>(
    grid: &NavigationGrid,
    terrain: &T,
    from: Vec3,
    to: Vec3,
    config: &PathfindingConfig,
) -> bool {
    let max_cost = config.smoothing_max_cost.get();
    let max_slope = config.smoothing_max_slope.get();
    let spacing = grid.cell_size() * 0.5;

    let delta = Vec2::new(to.x - from.x, to.z - from.z);
    let distance = delta.length();
    let samples = ((distance / spacing).ceil() as usize).max(1);
    let step_length = distance / samples as f32;

    let mut previous_height: Option<f32> = None;
    for i in 0..=samples {
        let t = i as f32 / samples as f32;
        let x = from.x + delta.x * t;
        let z = from.z + delta.y * t;

        let Some(cell) = grid.world_to_grid(Vec3::new(x, 0.0, z)) else {
            return false;
        };
        let cost = grid.cost(cell);
        if !cost.is_finite() || cost >= max_cost {
            return false;
        }

        let height = terrain.height_at(x, z);
        if let (Some(previous), Some(current)) = (previous_height, height) {
            if step_length > 0.0 && (current - previous).abs() / step_length > max_slope {
                return false;
            }
        }
        previous_height = height;
    }

    true
}

/// Greedy farthest-visible reduction: from each anchor, jump to the farthest
/// later waypoint in sight. Start and end are always kept.
pub fn smooth_path<T: TerrainQuery + ?Sized>(
    grid: &NavigationGrid,
    terrain: &T,
    raw: Vec<Vec3>,
    config: &PathfindingConfig,
) -> Vec<Vec3> {
    if raw.len() <= 2 {
        return raw;
    }

    let last = raw.len() - 1;
    let mut smoothed = vec![raw[0]];
    let mut anchor = 0;

    while anchor < last {
        let next = (anchor + 2..=last)
            .rev()
            .find(|&candidate| {
                has_line_of_sight(grid, terrain, raw[anchor], raw[candidate], config)
            })
            .unwrap_or(anchor + 1);
        smoothed.push(raw[next]);
        anchor = next;
    }

    smoothed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathfinding::grid::{GridCoord, IMPASSABLE};
    use crate::pathfinding::terrain_query::TerrainClass;

    /// Flat ground with an optional vertical step at `step_x`
    struct StepTerrain {
        step_x: f32,
        step_height: f32,
    }

    impl TerrainQuery for StepTerrain {
        fn terrain_class(&self, _x: f32, _z: f32) -> Option<TerrainClass> {
            Some(TerrainClass::Open)
        }

        fn height_at(&self, x: f32, _z: f32) -> Option<f32> {
            Some(if x >= self.step_x { self.step_height } else { 0.0 })
        }
    }

    const FLAT: StepTerrain = StepTerrain {
        step_x: f32::INFINITY,
        step_height: 0.0,
    };

    fn uniform(width: u32, height: u32) -> NavigationGrid {
        NavigationGrid::from_costs(width, height, 4.0, vec![1.0; (width * height) as usize])
            .unwrap()
    }

    fn centers(grid: &NavigationGrid, cells: &[(u32, u32)]) -> Vec<Vec3> {
        cells
            .iter()
            .map(|&(x, z)| grid.grid_to_world(GridCoord::new(x, z)))
            .collect()
    }

    #[test]
    fn test_collinear_path_collapses_to_endpoints() {
        let grid = uniform(10, 10);
        let raw = centers(&grid, &[(0, 0), (1, 1), (2, 2), (3, 3), (4, 4)]);
        let smoothed = smooth_path(&grid, &FLAT, raw.clone(), &PathfindingConfig::default());
        assert_eq!(smoothed, vec![raw[0], raw[4]]);
    }

    #[test]
    fn test_short_paths_unchanged() {
        let grid = uniform(4, 4);
        let config = PathfindingConfig::default();
        let pair = centers(&grid, &[(0, 0), (3, 3)]);

        assert_eq!(smooth_path(&grid, &FLAT, pair.clone(), &config), pair);
        assert!(smooth_path(&grid, &FLAT, Vec::new(), &config).is_empty());
    }

    #[test]
    fn test_corner_around_obstacle_is_kept() {
        let mut grid = uniform(6, 6);
        for (x, z) in [(0, 1), (1, 1), (2, 1), (3, 1), (4, 1)] {
            grid.set_cost(GridCoord::new(x, z), IMPASSABLE);
        }
        let raw = centers(&grid, &[(0, 0), (1, 0), (2, 0), (3, 0), (4, 0), (5, 1), (4, 2), (3, 2), (2, 2), (1, 2), (0, 2)]);

        let smoothed = smooth_path(&grid, &FLAT, raw.clone(), &PathfindingConfig::default());

        assert_eq!(smoothed.first(), raw.first());
        assert_eq!(smoothed.last(), raw.last());
        assert!(smoothed.len() < raw.len());
        assert!(smoothed.len() >= 3, "wall forces at least one turn");
        assert!(smoothed.iter().all(|w| raw.contains(w)));
        for pair in smoothed.windows(2) {
            assert!(has_line_of_sight(&grid, &FLAT, pair[0], pair[1], &PathfindingConfig::default()));
        }
    }

    #[test]
    fn test_high_cost_cells_block_shortcuts() {
        let config = PathfindingConfig::default();
        let mut grid = uniform(10, 3);
        let from = grid.grid_to_world(GridCoord::new(0, 1));
        let to = grid.grid_to_world(GridCoord::new(9, 1));

        grid.set_cost(GridCoord::new(5, 1), 2.9);
        assert!(has_line_of_sight(&grid, &FLAT, from, to, &config));

        grid.set_cost(GridCoord::new(5, 1), 3.0);
        assert!(!has_line_of_sight(&grid, &FLAT, from, to, &config));

        grid.set_cost(GridCoord::new(5, 1), IMPASSABLE);
        assert!(!has_line_of_sight(&grid, &FLAT, from, to, &config));
    }

    #[test]
    fn test_height_discontinuity_blocks_sight() {
        let config = PathfindingConfig::default();
        let grid = uniform(10, 3);
        let cliff = StepTerrain {
            step_x: 20.0,
            step_height: 5.0,
        };
        let west = grid.grid_to_world(GridCoord::new(1, 1));
        let east = grid.grid_to_world(GridCoord::new(8, 1));
        let also_west = grid.grid_to_world(GridCoord::new(4, 0));

        assert!(!has_line_of_sight(&grid, &cliff, west, east, &config));
        assert!(has_line_of_sight(&grid, &cliff, west, also_west, &config));
    }

    #[test]
    fn test_leaving_grid_blocks_sight() {
        let grid = uniform(4, 4);
        let inside = grid.grid_to_world(GridCoord::new(1, 1));
        let outside = Vec3::new(-3.0, 0.0, 6.0);
        assert!(!has_line_of_sight(&grid, &FLAT, inside, outside, &PathfindingConfig::default()));
    }
}
