use crate::config::range_types::{CellSize, CostFloor, SlopeRatio};
use crate::errors::NavResult;
use crate::map::Footprint;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub mod budget;
pub mod diagnostics;
pub mod grid;
pub mod heap;
pub mod search;
pub mod smoothing;
pub mod terrain_query;

pub use budget::FrameBudget;
pub use diagnostics::{PathFailure, SampledLog, SearchStats};
pub use grid::{GridCoord, GridSnapshot, GridStats, NavigationGrid, IMPASSABLE, NORMAL_COST};
pub use search::{SearchOutcome, SearchScratch};
pub use terrain_query::{TerrainClass, TerrainQuery};

use smoothing::smooth_path;

/// Tuning for grid construction, search limits and smoothing
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PathfindingConfig {
    /// World units per navigation cell
    pub cell_size: CellSize,

    /// Searches admitted per scheduling tick, fallback searches included
    #[validate(range(min = 1, max = 1000))]
    pub max_searches_per_tick: u32,

    /// Straight-line distance in cells beyond which a request is not searched
    #[validate(range(min = 1.0, max = 100000.0))]
    pub max_search_distance: f32,

    /// Nodes a single search may expand before giving up
    #[validate(range(min = 1, max = 10000000))]
    pub max_expansions: u32,

    /// Slope (rise over run) above which cells get more expensive
    pub steep_slope: SlopeRatio,
    /// Slope above which cells are impassable
    pub max_slope: SlopeRatio,
    /// Cost reached just below `max_slope`
    pub max_steep_cost: CostFloor,

    #[validate(range(min = 0.0, max = 8.0))]
    pub inflation_near_radius: f32,
    pub inflation_near_cost: CostFloor,
    #[validate(range(min = 0.0, max = 8.0))]
    pub inflation_far_radius: f32,
    pub inflation_far_cost: CostFloor,

    /// Cells at or above this cost break line of sight while smoothing
    pub smoothing_max_cost: CostFloor,
    pub smoothing_max_slope: SlopeRatio,

    /// Log one in this many search failures
    #[validate(range(min = 1, max = 1000000))]
    pub failure_log_interval: u32,
}

impl Default for PathfindingConfig {
    fn default() -> Self {
        Self {
            cell_size: CellSize::new(4.0),
            max_searches_per_tick: 5,
            max_search_distance: 125.0,
            max_expansions: 2000,
            steep_slope: SlopeRatio::new(0.7),
            max_slope: SlopeRatio::new(1.0),
            max_steep_cost: CostFloor::new(5.0),
            inflation_near_radius: 1.5,
            inflation_near_cost: CostFloor::new(5.0),
            inflation_far_radius: 2.5,
            inflation_far_cost: CostFloor::new(2.0),
            smoothing_max_cost: CostFloor::new(3.0),
            smoothing_max_slope: SlopeRatio::new(0.9),
            failure_log_interval: 10,
        }
    }
}

/// Read-only view of the cost grid for visualization tools
#[derive(Debug, Clone, Copy)]
pub struct GridDebugView<'a> {
    pub costs: &'a [f32],
    pub width: u32,
    pub height: u32,
    pub cell_size: f32,
}

/// Budgeted path queries over a navigation grid built from `T`.
///
/// Owns the grid, the terrain it was sampled from, the reusable search
/// buffers and the per-tick search budget. The host must call
/// [`Pathfinder::reset_frame_budget`] once per tick before issuing queries.
#[derive(Resource)]
pub struct Pathfinder<T: TerrainQuery> {
    grid: NavigationGrid,
    terrain: T,
    scratch: SearchScratch,
    budget: FrameBudget,
    failure_log: SampledLog,
    config: PathfindingConfig,
    last_stats: Option<SearchStats>,
}

impl<T: TerrainQuery> Pathfinder<T> {
    /// Sample `terrain` over a `map_width` x `map_height` world area
    pub fn build(
        terrain: T,
        map_width: f32,
        map_height: f32,
        config: PathfindingConfig,
    ) -> NavResult<Self> {
        crate::config::validate_config(&config)?;
        let grid = NavigationGrid::build(&terrain, map_width, map_height, &config)?;
        Ok(Self::with_grid(terrain, grid, config))
    }

    /// Use an existing grid as is
    pub fn with_grid(terrain: T, grid: NavigationGrid, config: PathfindingConfig) -> Self {
        Self {
            scratch: SearchScratch::new(grid.cell_count()),
            budget: FrameBudget::new(config.max_searches_per_tick),
            failure_log: SampledLog::new(config.failure_log_interval),
            grid,
            terrain,
            config,
            last_stats: None,
        }
    }

    /// Smoothed waypoints from `start` to `goal`, or `None` when no path is
    /// available this tick
    pub fn find_path(&mut self, start: Vec3, goal: Vec3) -> Option<Vec<Vec3>> {
        self.try_find_path(start, goal).ok()
    }

    /// Like [`Pathfinder::find_path`] but reports why nothing was found
    pub fn try_find_path(&mut self, start: Vec3, goal: Vec3) -> Result<Vec<Vec3>, PathFailure> {
        if !self.budget.try_admit() {
            return Err(PathFailure::BudgetExhausted);
        }

        let result = self.search_admitted(start, goal);
        if let Err(failure) = &result {
            if self.failure_log.should_log() {
                warn!(
                    "No path from {start} to {goal}: {failure} ({} failures so far)",
                    self.failure_log.occurrences()
                );
            }
        }
        result
    }

    fn search_admitted(&mut self, start: Vec3, goal: Vec3) -> Result<Vec<Vec3>, PathFailure> {
        let (Some(start_cell), Some(goal_cell)) =
            (self.grid.world_to_grid(start), self.grid.world_to_grid(goal))
        else {
            return Err(PathFailure::OutOfBounds);
        };

        let distance = start_cell.euclidean_distance(&goal_cell);
        if distance > self.config.max_search_distance {
            return Err(PathFailure::TooFar { distance });
        }
        if !self.grid.is_passable(start_cell) {
            return Err(PathFailure::StartBlocked);
        }
        if !self.grid.is_passable(goal_cell) {
            return Err(PathFailure::GoalBlocked);
        }

        match self
            .scratch
            .search(&self.grid, start_cell, goal_cell, self.config.max_expansions)
        {
            SearchOutcome::Found {
                cells,
                cost,
                expansions,
            } => {
                let raw: Vec<Vec3> = cells.iter().map(|&cell| self.waypoint(cell)).collect();
                let raw_waypoints = raw.len();
                let path = smooth_path(&self.grid, &self.terrain, raw, &self.config);

                debug!(
                    "Path ({}, {}) -> ({}, {}): cost {cost:.2}, {expansions} expansions, {raw_waypoints} cells smoothed to {} waypoints",
                    start_cell.x,
                    start_cell.z,
                    goal_cell.x,
                    goal_cell.z,
                    path.len()
                );
                self.last_stats = Some(SearchStats {
                    expansions,
                    raw_waypoints,
                    smoothed_waypoints: path.len(),
                });
                Ok(path)
            }
            SearchOutcome::Unreachable { .. } => Err(PathFailure::Unreachable),
            SearchOutcome::ExpansionLimit { expansions } => {
                Err(PathFailure::ExpansionLimit { expansions })
            }
        }
    }

    /// Closest passable cell to `goal`, within `max_radius` world units, that
    /// `start` can actually reach.
    ///
    /// Scans rings of increasing Chebyshev radius around the goal cell and
    /// confirms each passable candidate with a full search, so every check
    /// draws on the tick's budget. Gives up as soon as the budget runs out.
    pub fn find_nearest_reachable(
        &mut self,
        start: Vec3,
        goal: Vec3,
        max_radius: f32,
    ) -> Option<Vec3> {
        let goal_cell = self.grid.world_to_grid(goal)?;
        let grid_extent = self.grid.width().max(self.grid.height()) as f32;
        let rings = (max_radius / self.grid.cell_size()).floor().min(grid_extent) as i32;

        for radius in 1..=rings {
            for dz in -radius..=radius {
                for dx in -radius..=radius {
                    if dx.abs() != radius && dz.abs() != radius {
                        continue;
                    }
                    let Some(candidate) = self.grid.offset(goal_cell, dx, dz) else {
                        continue;
                    };
                    if !self.grid.is_passable(candidate) {
                        continue;
                    }
                    if self.budget.is_exhausted() {
                        debug!(
                            "Nearest-reachable scan around ({}, {}) stopped at ring {radius}: budget exhausted",
                            goal_cell.x, goal_cell.z
                        );
                        return None;
                    }

                    let position = self.waypoint(candidate);
                    if self.find_path(start, position).is_some() {
                        return Some(position);
                    }
                }
            }
        }

        None
    }

    /// Re-sample the cell under `world_pos` after the terrain changed there.
    /// Neighbouring inflation margins are left as they are.
    pub fn update_cell(&mut self, world_pos: Vec3) -> Option<(f32, f32)> {
        self.grid.update_cell(&self.terrain, world_pos, &self.config)
    }

    /// Refresh every cell whose center falls inside the footprint's bounding
    /// box grown by one cell, after a structure was stamped or cleared there.
    ///
    /// Only passability changes are applied: cells that stay passable keep
    /// their cost, including margins from neighbouring obstacles. Returns how
    /// many cells changed cost.
    pub fn update_footprint(&mut self, center: Vec3, footprint: &Footprint) -> usize {
        let cell_size = self.grid.cell_size();
        let reach = footprint.bounding_half_extents() + Vec2::splat(cell_size);
        let min = Vec2::new(center.x, center.z) - reach;
        let max = Vec2::new(center.x, center.z) + reach;

        let first_x = ((min.x / cell_size - 0.5).ceil().max(0.0)) as u32;
        let first_z = ((min.y / cell_size - 0.5).ceil().max(0.0)) as u32;
        let last_x = (max.x / cell_size - 0.5).floor();
        let last_z = (max.y / cell_size - 0.5).floor();
        if last_x < 0.0 || last_z < 0.0 {
            return 0;
        }
        let last_x = (last_x as u32).min(self.grid.width() - 1);
        let last_z = (last_z as u32).min(self.grid.height() - 1);

        let mut changed = 0;
        for z in first_z..=last_z {
            for x in first_x..=last_x {
                let refreshed =
                    self.grid
                        .refresh_passability(&self.terrain, GridCoord::new(x, z), &self.config);
                if let Some((old, new)) = refreshed {
                    if old != new {
                        changed += 1;
                    }
                }
            }
        }

        debug!("Footprint update at {center}: {changed} cells changed");
        changed
    }

    /// Start a new scheduling tick
    pub fn reset_frame_budget(&mut self) {
        self.budget.reset();
    }

    pub fn debug_view(&self) -> GridDebugView<'_> {
        GridDebugView {
            costs: self.grid.costs(),
            width: self.grid.width(),
            height: self.grid.height(),
            cell_size: self.grid.cell_size(),
        }
    }

    pub fn last_search_stats(&self) -> Option<SearchStats> {
        self.last_stats
    }

    pub fn budget(&self) -> &FrameBudget {
        &self.budget
    }

    pub fn grid(&self) -> &NavigationGrid {
        &self.grid
    }

    pub fn config(&self) -> &PathfindingConfig {
        &self.config
    }

    pub fn terrain(&self) -> &T {
        &self.terrain
    }

    /// Mutate the terrain; follow with `update_cell` or `update_footprint`
    /// for the affected area
    pub fn terrain_mut(&mut self) -> &mut T {
        &mut self.terrain
    }

    /// Cell center lifted onto the terrain surface
    fn waypoint(&self, cell: GridCoord) -> Vec3 {
        let mut position = self.grid.grid_to_world(cell);
        position.y = self
            .terrain
            .height_at(position.x, position.z)
            .unwrap_or(0.0);
        position
    }
}
