//! Navigation grid: per-cell traversal costs sampled from terrain

use crate::errors::{NavError, NavResult};
use crate::pathfinding::PathfindingConfig;
use crate::pathfinding::terrain_query::TerrainQuery;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Cost of crossing ordinary flat ground
pub const NORMAL_COST: f32 = 1.0;
/// Cost of a cell agents can never enter
pub const IMPASSABLE: f32 = f32::INFINITY;

/// Diagonal slope samples sit at `half_cell * 0.707` on each axis
const DIAGONAL_SAMPLE_FACTOR: f32 = 0.707;

/// Integer cell coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCoord {
    pub x: u32,
    pub z: u32,
}

impl GridCoord {
    pub fn new(x: u32, z: u32) -> Self {
        Self { x, z }
    }

    /// Straight-line distance in cell units
    pub fn euclidean_distance(&self, other: &GridCoord) -> f32 {
        let dx = self.x as f32 - other.x as f32;
        let dz = self.z as f32 - other.z as f32;
        (dx * dx + dz * dz).sqrt()
    }

    pub fn chebyshev_distance(&self, other: &GridCoord) -> u32 {
        self.x.abs_diff(other.x).max(self.z.abs_diff(other.z))
    }
}

/// Cell counts by cost band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridStats {
    pub normal: usize,
    pub high_cost: usize,
    pub impassable: usize,
}

/// Rectangular array of traversal costs.
///
/// Dimensions are `ceil(map_dimension / cell_size)` and never change after
/// construction. Cells are indexed `z * width + x`; world `(0, 0)` is the
/// corner of cell `(0, 0)`.
#[derive(Debug, Clone)]
pub struct NavigationGrid {
    costs: Vec<f32>,
    width: u32,
    height: u32,
    cell_size: f32,
    map_width: f32,
    map_height: f32,
}

impl NavigationGrid {
    /// Sample every cell from the terrain, then inflate costs around obstacles
    pub fn build<T: TerrainQuery + ?Sized>(
        terrain: &T,
        map_width: f32,
        map_height: f32,
        config: &PathfindingConfig,
    ) -> NavResult<Self> {
        let cell_size = config.cell_size.get();
        let (width, height) = Self::dimensions_for(map_width, map_height, cell_size)?;
        let total_cells = width as usize * height as usize;

        let mut grid = NavigationGrid {
            costs: Vec::with_capacity(total_cells),
            width,
            height,
            cell_size,
            map_width,
            map_height,
        };

        for z in 0..height {
            for x in 0..width {
                let cost = grid.sample_cell_cost(terrain, GridCoord::new(x, z), config);
                grid.costs.push(cost);
            }
        }

        let inflated = grid.inflate_obstacles(config);
        let stats = grid.stats();
        info!(
            "Navigation grid {width}x{height} (cell size {cell_size}): {blocked}/{total} impassable ({percentage:.1}%), {high} high-cost, {inflated} raised by inflation",
            blocked = stats.impassable,
            total = total_cells,
            percentage = (stats.impassable as f32 / total_cells as f32) * 100.0,
            high = stats.high_cost,
        );

        Ok(grid)
    }

    /// Wrap precomputed costs without sampling terrain or inflating
    pub fn from_costs(width: u32, height: u32, cell_size: f32, costs: Vec<f32>) -> NavResult<Self> {
        if width == 0 || height == 0 {
            return Err(NavError::InvalidGridDimensions {
                reason: format!("grid must have at least one cell, got {width}x{height}"),
            });
        }
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(NavError::InvalidGridDimensions {
                reason: format!("cell size must be positive, got {cell_size}"),
            });
        }
        let expected = width as usize * height as usize;
        if costs.len() != expected {
            return Err(NavError::InvalidGridDimensions {
                reason: format!(
                    "cost array size {} does not match grid {width}x{height} (expected {expected})",
                    costs.len()
                ),
            });
        }
        if let Some(bad) = costs.iter().position(|c| c.is_nan() || *c < NORMAL_COST) {
            return Err(NavError::InvalidGridDimensions {
                reason: format!("cell {bad} has cost {} below {NORMAL_COST}", costs[bad]),
            });
        }

        Ok(NavigationGrid {
            costs,
            width,
            height,
            cell_size,
            map_width: width as f32 * cell_size,
            map_height: height as f32 * cell_size,
        })
    }

    fn dimensions_for(map_width: f32, map_height: f32, cell_size: f32) -> NavResult<(u32, u32)> {
        if !(map_width.is_finite() && map_height.is_finite() && map_width > 0.0 && map_height > 0.0)
        {
            return Err(NavError::InvalidGridDimensions {
                reason: format!("map size must be positive, got {map_width}x{map_height}"),
            });
        }
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(NavError::InvalidGridDimensions {
                reason: format!("cell size must be positive, got {cell_size}"),
            });
        }
        Ok((
            (map_width / cell_size).ceil() as u32,
            (map_height / cell_size).ceil() as u32,
        ))
    }

    /// Per-cell cost rule shared by `build` and `update_cell`
    fn sample_cell_cost<T: TerrainQuery + ?Sized>(
        &self,
        terrain: &T,
        coord: GridCoord,
        config: &PathfindingConfig,
    ) -> f32 {
        let center = self.grid_to_world(coord);
        let on_boundary = coord.x == 0
            || coord.z == 0
            || coord.x + 1 == self.width
            || coord.z + 1 == self.height;
        let missing_data_cost = if on_boundary { IMPASSABLE } else { NORMAL_COST };

        let Some(class) = terrain.terrain_class(center.x, center.z) else {
            return missing_data_cost;
        };
        if class.is_blocking() {
            return IMPASSABLE;
        }
        let Some(center_height) = terrain.height_at(center.x, center.z) else {
            return missing_data_cost;
        };

        let half = self.cell_size * 0.5;
        let diagonal = half * DIAGONAL_SAMPLE_FACTOR;
        let offsets = [
            (half, 0.0),
            (-half, 0.0),
            (0.0, half),
            (0.0, -half),
            (diagonal, diagonal),
            (diagonal, -diagonal),
            (-diagonal, diagonal),
            (-diagonal, -diagonal),
        ];

        let max_slope = offsets
            .iter()
            .filter_map(|&(ox, oz)| {
                let sample = terrain.height_at(center.x + ox, center.z + oz)?;
                let distance = (ox * ox + oz * oz).sqrt();
                Some((sample - center_height).abs() / distance)
            })
            .fold(0.0_f32, f32::max);

        slope_cost(max_slope, config)
    }

    /// Raise costs around impassable cells; returns how many cells changed
    pub(crate) fn inflate_obstacles(&mut self, config: &PathfindingConfig) -> usize {
        let near_radius = config.inflation_near_radius;
        let far_radius = config.inflation_far_radius;
        let near_cost = config.inflation_near_cost.get();
        let far_cost = config.inflation_far_cost.get();
        let reach = far_radius.floor() as i32;

        let blocked: Vec<usize> = self
            .costs
            .iter()
            .enumerate()
            .filter(|(_, cost)| !cost.is_finite())
            .map(|(index, _)| index)
            .collect();

        let mut raised = 0;
        for index in blocked {
            let center = self.coord_of(index);
            for dz in -reach..=reach {
                for dx in -reach..=reach {
                    if dx == 0 && dz == 0 {
                        continue;
                    }
                    let Some(neighbor) = self.offset(center, dx, dz) else {
                        continue;
                    };
                    let distance = ((dx * dx + dz * dz) as f32).sqrt();
                    let floor = if distance <= near_radius {
                        near_cost
                    } else if distance <= far_radius {
                        far_cost
                    } else {
                        continue;
                    };

                    let neighbor_index = self.index(neighbor);
                    let cost = self.costs[neighbor_index];
                    if cost.is_finite() && cost < floor {
                        self.costs[neighbor_index] = floor;
                        raised += 1;
                    }
                }
            }
        }

        debug!("Obstacle inflation raised {raised} cells");
        raised
    }

    /// Recompute one cell from the terrain without touching its neighbours.
    ///
    /// Inflation is not re-run, so margins around a new or removed obstacle stay
    /// as they were at build time. Returns `(old, new)` cost, or `None` when the
    /// position is off the grid.
    pub fn update_cell<T: TerrainQuery + ?Sized>(
        &mut self,
        terrain: &T,
        world_pos: Vec3,
        config: &PathfindingConfig,
    ) -> Option<(f32, f32)> {
        let coord = self.world_to_grid(world_pos)?;
        let new_cost = self.sample_cell_cost(terrain, coord, config);
        let index = self.index(coord);
        let old_cost = std::mem::replace(&mut self.costs[index], new_cost);

        debug!(
            "Updated cell ({}, {}): cost {old_cost} -> {new_cost}",
            coord.x, coord.z
        );
        Some((old_cost, new_cost))
    }

    /// Re-sample one cell but keep the stored cost while it stays passable.
    ///
    /// A cell that becomes impassable is closed, and one that opens up takes
    /// its freshly sampled cost. A cell that is passable before and after
    /// keeps the higher of its stored and sampled cost, so inflation margins
    /// from other obstacles survive. Returns `(old, new)` cost.
    pub fn refresh_passability<T: TerrainQuery + ?Sized>(
        &mut self,
        terrain: &T,
        coord: GridCoord,
        config: &PathfindingConfig,
    ) -> Option<(f32, f32)> {
        if !self.contains(coord) {
            return None;
        }
        let sampled = self.sample_cell_cost(terrain, coord, config);
        let index = self.index(coord);
        let old_cost = self.costs[index];
        let new_cost = if old_cost.is_finite() && sampled.is_finite() {
            old_cost.max(sampled)
        } else {
            sampled
        };
        self.costs[index] = new_cost;
        Some((old_cost, new_cost))
    }

    /// Overwrite a single cost directly. Returns false when off the grid or the
    /// cost is below normal.
    pub fn set_cost(&mut self, coord: GridCoord, cost: f32) -> bool {
        if !self.contains(coord) || cost.is_nan() || cost < NORMAL_COST {
            return false;
        }
        let index = self.index(coord);
        self.costs[index] = cost;
        true
    }

    /// Convert a world position to its cell, `None` when outside the grid
    pub fn world_to_grid(&self, world_pos: Vec3) -> Option<GridCoord> {
        let x = (world_pos.x / self.cell_size).floor();
        let z = (world_pos.z / self.cell_size).floor();

        if x >= 0.0 && z >= 0.0 && x < self.width as f32 && z < self.height as f32 {
            Some(GridCoord::new(x as u32, z as u32))
        } else {
            None
        }
    }

    /// Center of a cell at ground level zero
    pub fn grid_to_world(&self, coord: GridCoord) -> Vec3 {
        Vec3::new(
            (coord.x as f32 + 0.5) * self.cell_size,
            0.0,
            (coord.z as f32 + 0.5) * self.cell_size,
        )
    }

    pub fn contains(&self, coord: GridCoord) -> bool {
        coord.x < self.width && coord.z < self.height
    }

    /// Neighbouring coordinate, `None` when it would leave the grid
    pub fn offset(&self, coord: GridCoord, dx: i32, dz: i32) -> Option<GridCoord> {
        let x = coord.x as i64 + dx as i64;
        let z = coord.z as i64 + dz as i64;
        if x < 0 || z < 0 || x >= self.width as i64 || z >= self.height as i64 {
            return None;
        }
        Some(GridCoord::new(x as u32, z as u32))
    }

    pub fn index(&self, coord: GridCoord) -> usize {
        coord.z as usize * self.width as usize + coord.x as usize
    }

    pub fn coord_of(&self, index: usize) -> GridCoord {
        let width = self.width as usize;
        GridCoord::new((index % width) as u32, (index / width) as u32)
    }

    /// Cost of a cell; off-grid cells are impassable
    pub fn cost(&self, coord: GridCoord) -> f32 {
        if !self.contains(coord) {
            return IMPASSABLE;
        }
        self.costs[self.index(coord)]
    }

    pub fn is_passable(&self, coord: GridCoord) -> bool {
        self.cost(coord).is_finite()
    }

    pub fn costs(&self) -> &[f32] {
        &self.costs
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn map_size(&self) -> (f32, f32) {
        (self.map_width, self.map_height)
    }

    pub fn cell_count(&self) -> usize {
        self.costs.len()
    }

    pub fn stats(&self) -> GridStats {
        self.costs.iter().fold(GridStats::default(), |mut stats, &cost| {
            if !cost.is_finite() {
                stats.impassable += 1;
            } else if cost > NORMAL_COST {
                stats.high_cost += 1;
            } else {
                stats.normal += 1;
            }
            stats
        })
    }

    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            width: self.width,
            height: self.height,
            cell_size: self.cell_size,
            map_width: self.map_width,
            map_height: self.map_height,
            costs: self.costs.clone(),
        }
    }

    pub fn from_snapshot(snapshot: GridSnapshot) -> NavResult<Self> {
        let mut grid = Self::from_costs(
            snapshot.width,
            snapshot.height,
            snapshot.cell_size,
            snapshot.costs,
        )?;
        grid.map_width = snapshot.map_width;
        grid.map_height = snapshot.map_height;
        Ok(grid)
    }
}

/// Cost for a cell whose steepest sampled slope is `slope`
pub fn slope_cost(slope: f32, config: &PathfindingConfig) -> f32 {
    let steep = config.steep_slope.get();
    let max = config.max_slope.get();

    if slope > max {
        IMPASSABLE
    } else if slope > steep {
        let t = (slope - steep) / (max - steep);
        NORMAL_COST + t * (config.max_steep_cost.get() - NORMAL_COST)
    } else {
        NORMAL_COST
    }
}

/// Serializable copy of a grid for visualization tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub width: u32,
    pub height: u32,
    pub cell_size: f32,
    pub map_width: f32,
    pub map_height: f32,
    pub costs: Vec<f32>,
}

impl GridSnapshot {
    pub fn to_bytes(&self) -> NavResult<Vec<u8>> {
        bincode::serde::encode_to_vec(self, bincode::config::standard()).map_err(|e| {
            NavError::CorruptedSnapshot {
                reason: format!("Failed to serialize grid: {e}"),
            }
        })
    }

    pub fn from_bytes(data: &[u8]) -> NavResult<Self> {
        let (snapshot, _): (GridSnapshot, usize) =
            bincode::serde::decode_from_slice(data, bincode::config::standard()).map_err(|e| {
                NavError::CorruptedSnapshot {
                    reason: format!("Failed to deserialize grid: {e}"),
                }
            })?;
        Ok(snapshot)
    }
}
