//! Seeded heightfields for exercising the navigation grid, and a survey of
//! how their slopes fall into the grid's cost bands

use crate::errors::NavResult;
use crate::map::HeightmapTerrain;
use crate::pathfinding::PathfindingConfig;
use noise::{Fbm, MultiFractal, NoiseFn, Perlin, RidgedMulti};

/// Shape of the generated relief
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relief {
    Flat,
    /// Fractal Perlin hills around the base height
    Rolling,
    /// Ridge lines rising above the base height
    Ridges,
    /// Ridge lines inverted into channels
    Channels,
}

/// Named relief with its vertical range and horizontal feature size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainProfile {
    pub name: &'static str,
    pub relief: Relief,
    /// Peak height of the relief in world units
    pub relief_height: f32,
    /// Typical distance between features in world units
    pub feature_size: f32,
}

pub const PROFILES: [TerrainProfile; 4] = [
    TerrainProfile {
        name: "flat",
        relief: Relief::Flat,
        relief_height: 0.0,
        feature_size: 1.0,
    },
    TerrainProfile {
        name: "hills",
        relief: Relief::Rolling,
        relief_height: 15.0,
        feature_size: 100.0,
    },
    TerrainProfile {
        name: "mountains",
        relief: Relief::Ridges,
        relief_height: 20.0,
        feature_size: 200.0,
    },
    TerrainProfile {
        name: "valleys",
        relief: Relief::Channels,
        relief_height: 20.0,
        feature_size: 125.0,
    },
];

/// Look up a profile by name, ignoring case
pub fn find_profile(name: &str) -> Option<&'static TerrainProfile> {
    PROFILES
        .iter()
        .find(|profile| profile.name.eq_ignore_ascii_case(name))
}

pub fn profile_names() -> Vec<&'static str> {
    PROFILES.iter().map(|profile| profile.name).collect()
}

/// Samples a [`TerrainProfile`] into a heightmap. The same seed always
/// gives the same terrain.
#[derive(Debug, Clone)]
pub struct Heightfield {
    pub seed: u32,
    pub profile: TerrainProfile,
    /// Samples below this height become water
    pub water_level: Option<f32>,
}

impl Heightfield {
    pub fn new(seed: u32, profile: TerrainProfile) -> Self {
        Self {
            seed,
            profile,
            water_level: None,
        }
    }

    pub fn with_water_level(mut self, level: f32) -> Self {
        self.water_level = Some(level);
        self
    }

    /// Generate `width` x `height` samples spaced `scale` world units apart
    pub fn generate(&self, width: u32, height: u32, scale: f32) -> NavResult<HeightmapTerrain> {
        let frequency = 1.0 / self.profile.feature_size.max(f32::EPSILON) as f64;
        let relief = self.profile.relief_height as f64;

        let heights = match self.profile.relief {
            Relief::Flat => vec![0.0; width as usize * height as usize],
            Relief::Rolling => {
                let fbm = Fbm::<Perlin>::new(self.seed)
                    .set_octaves(4)
                    .set_frequency(frequency);
                sample_noise(&fbm, width, height, scale, relief)
            }
            Relief::Ridges | Relief::Channels => {
                let ridged = RidgedMulti::<Perlin>::new(self.seed)
                    .set_octaves(5)
                    .set_frequency(frequency);
                let sign = if self.profile.relief == Relief::Channels {
                    -1.0
                } else {
                    1.0
                };
                sample_noise(&ridged, width, height, scale, sign * relief)
            }
        };

        let terrain = HeightmapTerrain::new(width, height, heights, scale)?;
        Ok(match self.water_level {
            Some(level) => terrain.with_water_level(level),
            None => terrain,
        })
    }
}

fn sample_noise(
    noise: &impl NoiseFn<f64, 2>,
    width: u32,
    height: u32,
    scale: f32,
    relief: f64,
) -> Vec<f32> {
    let spacing = scale as f64;
    (0..height)
        .flat_map(|z| {
            (0..width).map(move |x| {
                let point = [x as f64 * spacing, z as f64 * spacing];
                (noise.get(point) * relief) as f32
            })
        })
        .collect()
}

/// Samples counted by the cost band of their steepest neighbour slope
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlopeSurvey {
    /// At or below `steep_slope`: normal cost
    pub gentle: usize,
    /// Above `steep_slope` up to `max_slope`: raised cost
    pub steep: usize,
    /// Above `max_slope`: impassable
    pub too_steep: usize,
}

impl SlopeSurvey {
    pub fn total(&self) -> usize {
        self.gentle + self.steep + self.too_steep
    }
}

/// Bin every sample by the steepest rise to its four axis neighbours,
/// measured against the configured slope bands
pub fn survey_slopes(terrain: &HeightmapTerrain, config: &PathfindingConfig) -> SlopeSurvey {
    let steep = config.steep_slope.get();
    let max = config.max_slope.get();
    let width = terrain.width as usize;
    let height = terrain.height as usize;
    let mut survey = SlopeSurvey::default();

    for z in 0..height {
        for x in 0..width {
            let Some(&here) = terrain.heights.get(z * width + x) else {
                continue;
            };
            let neighbours = [
                (x > 0).then(|| z * width + x - 1),
                (x + 1 < width).then(|| z * width + x + 1),
                (z > 0).then(|| (z - 1) * width + x),
                (z + 1 < height).then(|| (z + 1) * width + x),
            ];
            let slope = neighbours
                .into_iter()
                .flatten()
                .filter_map(|index| terrain.heights.get(index))
                .map(|&h| (h - here).abs() / terrain.scale)
                .fold(0.0_f32, f32::max);

            if slope > max {
                survey.too_steep += 1;
            } else if slope > steep {
                survey.steep += 1;
            } else {
                survey.gentle += 1;
            }
        }
    }

    survey
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathfinding::{Pathfinder, TerrainClass};

    fn ramp(gradient: f32) -> HeightmapTerrain {
        let heights = (0..4).flat_map(|_| (0..4).map(move |x| x as f32 * gradient));
        HeightmapTerrain::new(4, 4, heights.collect(), 1.0).unwrap()
    }

    #[test]
    fn test_flat_profile_is_level_and_open() {
        let terrain = Heightfield::new(12345, PROFILES[0])
            .generate(10, 10, 1.0)
            .expect("Terrain generation should succeed with valid parameters");

        assert_eq!((terrain.width, terrain.height), (10, 10));
        assert!(terrain.heights.iter().all(|&h| h == 0.0));
        assert!(terrain.classes.iter().all(|&c| c == TerrainClass::Open));
    }

    #[test]
    fn test_rolling_relief_varies_and_is_seeded() {
        let hills = find_profile("hills").unwrap();
        let terrain = Heightfield::new(12345, *hills).generate(16, 16, 4.0).unwrap();
        let again = Heightfield::new(12345, *hills).generate(16, 16, 4.0).unwrap();

        let first = terrain.heights[0];
        assert!(terrain.heights.iter().any(|&h| (h - first).abs() > 0.01));
        assert_eq!(terrain.heights, again.heights);
    }

    #[test]
    fn test_channels_invert_ridges() {
        let ridges = TerrainProfile {
            name: "ridges",
            relief: Relief::Ridges,
            relief_height: 10.0,
            feature_size: 50.0,
        };
        let channels = TerrainProfile {
            relief: Relief::Channels,
            ..ridges
        };

        let up = Heightfield::new(8, ridges).generate(6, 6, 3.0).unwrap();
        let down = Heightfield::new(8, channels).generate(6, 6, 3.0).unwrap();
        for (a, b) in up.heights.iter().zip(&down.heights) {
            assert_eq!(*a, -*b);
        }
    }

    #[test]
    fn test_water_level_applied() {
        let terrain = Heightfield::new(7, PROFILES[0])
            .with_water_level(0.5)
            .generate(4, 4, 2.0)
            .unwrap();
        assert!(terrain.classes.iter().all(|&c| c == TerrainClass::Water));
    }

    #[test]
    fn test_profile_lookup() {
        assert_eq!(profile_names(), vec!["flat", "hills", "mountains", "valleys"]);
        assert_eq!(find_profile("Valleys").map(|p| p.relief), Some(Relief::Channels));
        assert!(find_profile("invalid").is_none());
    }

    #[test]
    fn test_slope_survey_bands() {
        let config = PathfindingConfig::default();

        let level = survey_slopes(&ramp(0.0), &config);
        assert_eq!(level, SlopeSurvey { gentle: 16, steep: 0, too_steep: 0 });

        let steep = survey_slopes(&ramp(0.8), &config);
        assert_eq!(steep, SlopeSurvey { gentle: 0, steep: 16, too_steep: 0 });

        let cliff = survey_slopes(&ramp(1.5), &config);
        assert_eq!(cliff.too_steep, 16);
        assert_eq!(cliff.total(), 16);
    }

    #[test]
    fn test_generated_hills_are_navigable() {
        let terrain = Heightfield::new(99, *find_profile("hills").unwrap())
            .generate(65, 65, 2.0)
            .unwrap();
        let survey = survey_slopes(&terrain, &PathfindingConfig::default());
        assert_eq!(survey.total(), 65 * 65);

        let extent = terrain.extent();
        let pathfinder =
            Pathfinder::build(terrain, extent.x, extent.y, PathfindingConfig::default()).unwrap();

        let stats = pathfinder.grid().stats();
        assert_eq!(pathfinder.grid().width(), 32);
        assert!(stats.normal + stats.high_cost > stats.impassable);
    }
}
