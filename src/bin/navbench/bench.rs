use bevy::prelude::*;
use navgrid::map::{Footprint, HeightmapTerrain};
use navgrid::pathfinding::{PathFailure, Pathfinder, TerrainClass, TerrainQuery};
use rand::Rng;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// How the simulated host loop issues requests
#[derive(Debug, Clone)]
pub struct BenchSettings {
    pub ticks: u32,
    pub queries_per_tick: u32,
    /// Fixed start for every request; random when `None`
    pub start: Option<Vec3>,
    /// World radius for the nearest-reachable retry on blocked goals
    pub fallback_radius: f32,
}

#[derive(Debug, Default)]
pub struct BenchReport {
    pub issued: u32,
    pub found: u32,
    pub budget_rejected: u32,
    pub fallback_found: u32,
    pub failures: BTreeMap<&'static str, u32>,
    pub total_waypoints: usize,
    pub elapsed: Duration,
}

impl BenchReport {
    pub fn failed(&self) -> u32 {
        self.failures.values().sum()
    }
}

/// Drop `count` random structures onto the terrain before the grid is built.
/// Returns the footprints with their centers.
pub fn place_structures<R: Rng>(
    terrain: &mut HeightmapTerrain,
    count: u32,
    rng: &mut R,
) -> Vec<(Vec3, Footprint)> {
    let extent = terrain.extent();
    let mut placed = Vec::with_capacity(count as usize);

    for _ in 0..count {
        let center = Vec3::new(
            rng.gen_range(0.0..=extent.x),
            0.0,
            rng.gen_range(0.0..=extent.y),
        );
        let footprint = if rng.gen_bool(0.5) {
            Footprint::Circle {
                radius: rng.gen_range(2.0..8.0),
            }
        } else {
            Footprint::Rectangle {
                half_extents: Vec2::new(rng.gen_range(2.0..10.0), rng.gen_range(2.0..10.0)),
            }
        };
        terrain.stamp_footprint(center, &footprint, TerrainClass::Structure);
        placed.push((center, footprint));
    }

    placed
}

fn failure_label(failure: &PathFailure) -> &'static str {
    match failure {
        PathFailure::BudgetExhausted => "budget exhausted",
        PathFailure::OutOfBounds => "out of bounds",
        PathFailure::TooFar { .. } => "too far",
        PathFailure::StartBlocked => "start blocked",
        PathFailure::GoalBlocked => "goal blocked",
        PathFailure::Unreachable => "unreachable",
        PathFailure::ExpansionLimit { .. } => "expansion limit",
    }
}

fn random_position<R: Rng>(map_size: (f32, f32), rng: &mut R) -> Vec3 {
    Vec3::new(
        rng.gen_range(0.0..map_size.0),
        0.0,
        rng.gen_range(0.0..map_size.1),
    )
}

/// Issue requests tick by tick, resetting the budget at the start of each
pub fn run_bench<T: TerrainQuery, R: Rng>(
    pathfinder: &mut Pathfinder<T>,
    settings: &BenchSettings,
    rng: &mut R,
) -> BenchReport {
    let map_size = pathfinder.grid().map_size();
    let mut report = BenchReport::default();
    let started = Instant::now();

    for _ in 0..settings.ticks {
        pathfinder.reset_frame_budget();

        for _ in 0..settings.queries_per_tick {
            let start = settings
                .start
                .unwrap_or_else(|| random_position(map_size, rng));
            let goal = random_position(map_size, rng);
            report.issued += 1;

            match pathfinder.try_find_path(start, goal) {
                Ok(path) => {
                    report.found += 1;
                    report.total_waypoints += path.len();
                }
                Err(failure) if failure.is_transient() => report.budget_rejected += 1,
                Err(PathFailure::GoalBlocked) => {
                    if pathfinder
                        .find_nearest_reachable(start, goal, settings.fallback_radius)
                        .is_some()
                    {
                        report.fallback_found += 1;
                    } else {
                        *report.failures.entry("goal blocked").or_default() += 1;
                    }
                }
                Err(failure) => *report.failures.entry(failure_label(&failure)).or_default() += 1,
            }
        }
    }

    report.elapsed = started.elapsed();
    report
}
