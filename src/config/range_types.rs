use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// World units per navigation cell, constrained to [0.25, 64.0]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Display, From, Serialize, Deserialize)]
pub struct CellSize(f32);

impl CellSize {
    const MIN: f32 = 0.25;
    const MAX: f32 = 64.0;

    pub fn new(value: f32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

impl Default for CellSize {
    fn default() -> Self {
        Self::new(4.0)
    }
}

/// A rise-over-run slope ratio constrained to [0.0, 10.0] (1.0 = 45 degrees)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Display, From, Serialize, Deserialize)]
pub struct SlopeRatio(f32);

impl SlopeRatio {
    const MIN: f32 = 0.0;
    const MAX: f32 = 10.0;

    pub fn new(value: f32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

impl Default for SlopeRatio {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// A traversal cost multiplier constrained to [1.0, 100.0]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Display, From, Serialize, Deserialize)]
pub struct CostFloor(f32);

impl CostFloor {
    const MIN: f32 = 1.0;
    const MAX: f32 = 100.0;

    pub fn new(value: f32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

impl Default for CostFloor {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_size_clamping() {
        assert_eq!(CellSize::new(-1.0).get(), 0.25);
        assert_eq!(CellSize::new(4.0).get(), 4.0);
        assert_eq!(CellSize::new(1000.0).get(), 64.0);
    }

    #[test]
    fn test_slope_ratio_clamping() {
        assert_eq!(SlopeRatio::new(-0.5).get(), 0.0);
        assert_eq!(SlopeRatio::new(0.7).get(), 0.7);
        assert_eq!(SlopeRatio::new(50.0).get(), 10.0);
    }

    #[test]
    fn test_cost_floor_never_below_normal_cost() {
        assert_eq!(CostFloor::new(0.2).get(), 1.0);
        assert_eq!(CostFloor::new(5.0).get(), 5.0);
    }

    #[test]
    fn test_display() {
        let size = CellSize::new(2.5);
        assert_eq!(format!("{size}"), "2.5");
    }

    #[test]
    fn test_defaults() {
        assert_eq!(CellSize::default().get(), 4.0);
        assert_eq!(SlopeRatio::default().get(), 1.0);
        assert_eq!(CostFloor::default().get(), 1.0);
    }
}
