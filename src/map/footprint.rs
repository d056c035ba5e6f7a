//! Ground-plane shapes for structures that block or unblock terrain

use crate::pathfinding::GridCoord;
use bevy::prelude::*;

/// Area a structure occupies on the XZ plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Footprint {
    Circle { radius: f32 },
    /// Axis-aligned, `half_extents.x` along X and `half_extents.y` along Z
    Rectangle { half_extents: Vec2 },
}

impl Footprint {
    /// Check if a world position is inside this shape (height ignored)
    pub fn contains_point(&self, world_pos: Vec3, center: Vec3) -> bool {
        let offset = Vec2::new(world_pos.x - center.x, world_pos.z - center.z);
        match self {
            Footprint::Circle { radius } => offset.length() <= *radius,
            Footprint::Rectangle { half_extents } => {
                offset.x.abs() <= half_extents.x && offset.y.abs() <= half_extents.y
            }
        }
    }

    /// Half size of the axis-aligned box enclosing the shape
    pub fn bounding_half_extents(&self) -> Vec2 {
        match self {
            Footprint::Circle { radius } => Vec2::splat(*radius),
            Footprint::Rectangle { half_extents } => *half_extents,
        }
    }

    /// Navigation cells of size `cell_size` whose centers the shape covers
    pub fn covered_cells(&self, center: Vec3, cell_size: f32) -> Vec<GridCoord> {
        self.covered_lattice(center, cell_size, cell_size * 0.5, UVec2::MAX)
    }

    /// Points `index * spacing + offset` on each axis that fall inside the
    /// shape, as indices below `limit`
    pub(crate) fn covered_lattice(
        &self,
        center: Vec3,
        spacing: f32,
        offset: f32,
        limit: UVec2,
    ) -> Vec<GridCoord> {
        if limit.x == 0 || limit.y == 0 {
            return Vec::new();
        }
        let half = self.bounding_half_extents();
        let first_x = ((center.x - half.x - offset) / spacing).ceil().max(0.0);
        let first_z = ((center.z - half.y - offset) / spacing).ceil().max(0.0);
        let last_x = ((center.x + half.x - offset) / spacing)
            .floor()
            .min((limit.x - 1) as f32);
        let last_z = ((center.z + half.y - offset) / spacing)
            .floor()
            .min((limit.y - 1) as f32);
        if last_x < first_x || last_z < first_z {
            return Vec::new();
        }

        let mut covered = Vec::new();
        for z in first_z as u32..=last_z as u32 {
            for x in first_x as u32..=last_x as u32 {
                let point = Vec3::new(
                    x as f32 * spacing + offset,
                    center.y,
                    z as f32 * spacing + offset,
                );
                if self.contains_point(point, center) {
                    covered.push(GridCoord::new(x, z));
                }
            }
        }
        covered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_contains_point() {
        let shape = Footprint::Circle { radius: 2.0 };
        let center = Vec3::new(10.0, 5.0, 10.0);

        assert!(shape.contains_point(Vec3::new(11.0, 0.0, 11.0), center));
        assert!(!shape.contains_point(Vec3::new(13.0, 0.0, 10.0), center));
    }

    #[test]
    fn test_rectangle_contains_point() {
        let shape = Footprint::Rectangle {
            half_extents: Vec2::new(3.0, 1.0),
        };
        let center = Vec3::ZERO;

        assert!(shape.contains_point(Vec3::new(2.5, 9.0, -0.5), center));
        assert!(!shape.contains_point(Vec3::new(0.0, 0.0, 1.5), center));
    }

    #[test]
    fn test_covered_cells_rectangle() {
        // Cells of size 4: centers at 2, 6, 10, ...
        let shape = Footprint::Rectangle {
            half_extents: Vec2::new(4.0, 2.0),
        };
        let mut cells = shape.covered_cells(Vec3::new(8.0, 0.0, 10.0), 4.0);
        cells.sort_by_key(|c| (c.z, c.x));

        assert_eq!(cells, vec![GridCoord::new(1, 2), GridCoord::new(2, 2)]);
    }

    #[test]
    fn test_covered_cells_circle_excludes_corners() {
        let shape = Footprint::Circle { radius: 4.5 };
        let cells = shape.covered_cells(Vec3::new(10.0, 0.0, 10.0), 4.0);

        assert!(cells.contains(&GridCoord::new(2, 2)));
        assert!(cells.contains(&GridCoord::new(1, 2)));
        assert!(!cells.contains(&GridCoord::new(1, 1)));
        assert_eq!(cells.len(), 5);
    }

    #[test]
    fn test_lattice_clamped_to_limit() {
        let shape = Footprint::Circle { radius: 1.0e6 };
        let points = shape.covered_lattice(Vec3::new(2.0, 0.0, 2.0), 1.0, 0.0, UVec2::new(3, 2));

        assert_eq!(points.len(), 6);
        assert!(points.iter().all(|p| p.x < 3 && p.z < 2));
        assert!(shape
            .covered_lattice(Vec3::ZERO, 1.0, 0.0, UVec2::new(0, 4))
            .is_empty());
    }

    #[test]
    fn test_covered_cells_clipped_at_origin() {
        let shape = Footprint::Circle { radius: 3.0 };
        let cells = shape.covered_cells(Vec3::new(-20.0, 0.0, -20.0), 4.0);
        assert!(cells.is_empty());
    }
}
