use clap::Parser;
use navgrid::config::range_types::CellSize;
use navgrid::config::{load_config, load_config_from, save_config};
use navgrid::errors::{NavError, NavResult};
use navgrid::map::HeightmapTerrain;
use navgrid::pathfinding::{GridSnapshot, NavigationGrid, PathfindingConfig, Pathfinder};
use navgrid::terrain_generation::{
    Heightfield, SlopeSurvey, find_profile, profile_names, survey_slopes,
};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::path::PathBuf;

mod navbench {
    pub mod bench;
    pub mod cli_utils;
}

use navbench::bench::{BenchReport, BenchSettings, place_structures, run_bench};
use navbench::cli_utils::*;

#[derive(Parser, Clone)]
#[command(name = "navbench")]
#[command(about = "Build a navigation grid over generated terrain and run budgeted path queries")]
struct Args {
    /// Heightmap size in samples (format: WIDTHxHEIGHT)
    #[arg(long, default_value = "257x257")]
    size: String,

    /// World units between heightmap samples
    #[arg(long, default_value = "2.0")]
    scale: f32,

    /// Navigation cell size in world units (overrides the config file)
    #[arg(long)]
    cell_size: Option<f32>,

    /// Terrain type preset (flat, hills, mountains, valleys)
    #[arg(long, default_value = "hills")]
    terrain_type: String,

    /// Random seed for terrain, structures and queries
    #[arg(long)]
    seed: Option<u32>,

    /// Samples below this height become water
    #[arg(long)]
    water_level: Option<f32>,

    /// Random structures to place before building the grid
    #[arg(long, default_value = "0")]
    structures: u32,

    /// Path requests issued per tick
    #[arg(long, default_value = "8")]
    queries: u32,

    /// Number of ticks to simulate
    #[arg(long, default_value = "20")]
    ticks: u32,

    /// Fixed start position for every request (format: X,Y,Z)
    #[arg(long)]
    start: Option<String>,

    /// Search radius for the nearest-reachable retry, in world units
    #[arg(long, default_value = "32.0")]
    fallback_radius: f32,

    /// Pathfinding config file; defaults to the user config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the built grid snapshot to this file
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Navigate a grid snapshot written by --dump instead of sampling the terrain
    #[arg(long, conflicts_with = "dump")]
    grid: Option<PathBuf>,

    /// Store the resolved pathfinding config as the user config
    #[arg(long)]
    save_config: bool,
}

fn resolve_config(args: &Args) -> NavResult<PathfindingConfig> {
    let mut config = match &args.config {
        Some(path) => load_config_from(path)?,
        None => load_config(),
    };
    if let Some(cell_size) = args.cell_size {
        config.cell_size = CellSize::new(cell_size);
    }
    Ok(config)
}

fn main() -> NavResult<()> {
    let args = Args::parse();

    let (width, height) = parse_size(&args.size)?;
    let start = args.start.as_deref().map(parse_position).transpose()?;
    let config = resolve_config(&args)?;
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = Pcg32::seed_from_u64(seed as u64);

    let profile = find_profile(&args.terrain_type).ok_or_else(|| NavError::InvalidArgument {
        reason: format!(
            "Unknown terrain type '{}'. Expected one of: {}",
            args.terrain_type,
            profile_names().join(", ")
        ),
    })?;
    let mut generator = Heightfield::new(seed, *profile);
    if let Some(level) = args.water_level {
        generator = generator.with_water_level(level);
    }

    if args.save_config {
        save_config(&config)?;
        println!("Saved pathfinding config to the user config directory");
    }

    let mut terrain = generator.generate(width, height, args.scale)?;
    let placed = place_structures(&mut terrain, args.structures, &mut rng);
    let covered_cells: usize = placed
        .iter()
        .map(|(center, footprint)| {
            footprint
                .covered_cells(*center, config.cell_size.get())
                .len()
        })
        .sum();

    let survey = survey_slopes(&terrain, &config);
    print_terrain_summary(&terrain, seed, &survey, placed.len(), covered_cells);

    let mut pathfinder = match &args.grid {
        Some(path) => {
            let snapshot = GridSnapshot::from_bytes(&std::fs::read(path)?)?;
            let grid = NavigationGrid::from_snapshot(snapshot)?;
            println!("\nLoaded grid snapshot from {}", path.display());
            Pathfinder::with_grid(terrain, grid, config)
        }
        None => {
            let extent = terrain.extent();
            Pathfinder::build(terrain, extent.x, extent.y, config)?
        }
    };
    print_grid_summary(&pathfinder);

    if let Some(path) = &args.dump {
        let bytes = pathfinder.grid().snapshot().to_bytes()?;
        std::fs::write(path, &bytes)?;
        println!("Grid snapshot ({} bytes) written to {}", bytes.len(), path.display());
    }

    let settings = BenchSettings {
        ticks: args.ticks,
        queries_per_tick: args.queries,
        start,
        fallback_radius: args.fallback_radius,
    };
    let report = run_bench(&mut pathfinder, &settings, &mut rng);
    print_report(&report, &settings);

    Ok(())
}

fn print_terrain_summary(
    terrain: &HeightmapTerrain,
    seed: u32,
    survey: &SlopeSurvey,
    structures: usize,
    covered: usize,
) {
    println!("Terrain:");
    println!(
        "  {}x{} samples at scale {} (seed {seed})",
        terrain.width, terrain.height, terrain.scale
    );
    println!(
        "  slopes: {} gentle, {} steep, {} too steep",
        survey.gentle, survey.steep, survey.too_steep
    );
    for (class, count) in terrain.class_counts() {
        if count > 0 {
            println!("  {class:?}: {count} samples");
        }
    }
    if structures > 0 {
        println!("  {structures} structures covering ~{covered} navigation cells");
    }
}

fn print_grid_summary(pathfinder: &Pathfinder<HeightmapTerrain>) {
    let view = pathfinder.debug_view();
    let stats = pathfinder.grid().stats();
    println!("\nNavigation grid:");
    println!(
        "  {}x{} cells of {} units",
        view.width, view.height, view.cell_size
    );
    println!(
        "  normal {}, high-cost {}, impassable {}",
        stats.normal, stats.high_cost, stats.impassable
    );
}

fn print_report(report: &BenchReport, settings: &BenchSettings) {
    println!(
        "\nQueries: {} over {} ticks ({} per tick)",
        report.issued, settings.ticks, settings.queries_per_tick
    );
    println!("  found:            {}", report.found);
    println!("  budget rejected:  {}", report.budget_rejected);
    println!("  nearest fallback: {}", report.fallback_found);
    println!("  failed:           {}", report.failed());
    for (reason, count) in &report.failures {
        println!("    {reason}: {count}");
    }
    if report.found > 0 {
        println!(
            "  mean waypoints per path: {:.1}",
            report.total_waypoints as f32 / report.found as f32
        );
    }
    println!("  elapsed: {:.2?}", report.elapsed);
}
