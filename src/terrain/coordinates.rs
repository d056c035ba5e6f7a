use crate::map::HeightmapTerrain;

/// Heightmap sample indices (unsigned integers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleCoord {
    pub x: u32,
    pub z: u32,
}

impl SampleCoord {
    pub fn new(x: u32, z: u32) -> Self {
        Self { x, z }
    }

    /// Check if this sample exists in the given terrain
    pub fn is_valid_for(&self, terrain: &HeightmapTerrain) -> bool {
        self.x < terrain.width && self.z < terrain.height
    }
}

/// Convert world coordinates to fractional sample coordinates.
/// Sample `(0, 0)` sits at the world origin.
pub fn world_to_sample(terrain: &HeightmapTerrain, world_x: f32, world_z: f32) -> (f32, f32) {
    (world_x / terrain.scale, world_z / terrain.scale)
}

/// Row-major index of a sample, `None` when outside the heightmap
pub fn sample_index(terrain: &HeightmapTerrain, coord: SampleCoord) -> Option<usize> {
    coord
        .is_valid_for(terrain)
        .then(|| coord.z as usize * terrain.width as usize + coord.x as usize)
}

/// Height at an exact sample (no interpolation)
pub fn get_height_at_sample(terrain: &HeightmapTerrain, x: u32, z: u32) -> Option<f32> {
    let index = sample_index(terrain, SampleCoord::new(x, z))?;
    terrain.heights.get(index).copied()
}

/// Sample closest to a world position, `None` outside the covered area
pub fn nearest_sample(terrain: &HeightmapTerrain, world_x: f32, world_z: f32) -> Option<SampleCoord> {
    let (sample_x, sample_z) = world_to_sample(terrain, world_x, world_z);
    if !in_extent(terrain, sample_x, sample_z) {
        return None;
    }
    Some(SampleCoord::new(
        sample_x.round() as u32,
        sample_z.round() as u32,
    ))
}

/// Interpolated height at world position using bilinear interpolation.
///
/// Defined on the closed rectangle spanned by the samples, far edges included.
pub fn get_height_at_world_interpolated(
    terrain: &HeightmapTerrain,
    world_x: f32,
    world_z: f32,
) -> Option<f32> {
    let (sample_x, sample_z) = world_to_sample(terrain, world_x, world_z);
    if !in_extent(terrain, sample_x, sample_z) {
        return None;
    }

    // Pin the cell to the last full one so the far edge interpolates with fraction 1
    let x0 = (sample_x.floor() as u32).min(terrain.width.saturating_sub(2));
    let z0 = (sample_z.floor() as u32).min(terrain.height.saturating_sub(2));
    let x1 = (x0 + 1).min(terrain.width.saturating_sub(1));
    let z1 = (z0 + 1).min(terrain.height.saturating_sub(1));

    let fx = (sample_x - x0 as f32).clamp(0.0, 1.0);
    let fz = (sample_z - z0 as f32).clamp(0.0, 1.0);

    let h00 = get_height_at_sample(terrain, x0, z0)?;
    let h10 = get_height_at_sample(terrain, x1, z0)?;
    let h01 = get_height_at_sample(terrain, x0, z1)?;
    let h11 = get_height_at_sample(terrain, x1, z1)?;

    let h0 = h00 * (1.0 - fx) + h10 * fx;
    let h1 = h01 * (1.0 - fx) + h11 * fx;

    Some(h0 * (1.0 - fz) + h1 * fz)
}

fn in_extent(terrain: &HeightmapTerrain, sample_x: f32, sample_z: f32) -> bool {
    sample_x >= 0.0
        && sample_z >= 0.0
        && sample_x <= terrain.width.saturating_sub(1) as f32
        && sample_z <= terrain.height.saturating_sub(1) as f32
}
