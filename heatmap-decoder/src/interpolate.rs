//! Corner layout and bilinear field interpolation
//!
//! The four sensors sit on the corners of the unit square:
//!
//! ```text
//!   (0,1) S1 ----- S2 (1,1)
//!         |         |
//!   (0,0) S0 ----- S3 (1,0)
//! ```
//!
//! The grid is stored row-major with row index = y and column index = x, so
//! row 0 is the bottom edge (origin at the lower-left when drawn).

use crate::types::{HeatmapError, Result, Snapshot, SENSOR_COUNT};
use ndarray::Array2;

/// N×N interpolated temperature field
pub type Grid = Array2<f64>;

/// Named corner of the unit square
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    BottomLeft,
    TopLeft,
    TopRight,
    BottomRight,
}

impl Corner {
    /// Position in the unit square as `(x, y)`
    pub fn position(self) -> (f64, f64) {
        match self {
            Corner::BottomLeft => (0.0, 0.0),
            Corner::TopLeft => (0.0, 1.0),
            Corner::TopRight => (1.0, 1.0),
            Corner::BottomRight => (1.0, 0.0),
        }
    }
}

/// Fixed sensor-index to corner mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CornerLayout {
    corners: [Corner; SENSOR_COUNT],
}

impl CornerLayout {
    /// The wiring used by the sensor board: S0 bottom-left, S1 top-left,
    /// S2 top-right, S3 bottom-right
    pub const STANDARD: CornerLayout = CornerLayout {
        corners: [
            Corner::BottomLeft,
            Corner::TopLeft,
            Corner::TopRight,
            Corner::BottomRight,
        ],
    };

    pub fn corner(&self, index: usize) -> Option<Corner> {
        self.corners.get(index).copied()
    }

    pub fn position(&self, index: usize) -> Option<(f64, f64)> {
        self.corner(index).map(Corner::position)
    }

    /// Sensor index placed on a given corner, if any sensor sits there
    pub fn index_of(&self, corner: Corner) -> Option<usize> {
        self.corners.iter().position(|&c| c == corner)
    }

    fn corner_value(&self, corner_values: &[f64; SENSOR_COUNT], corner: Corner) -> Result<f64> {
        self.index_of(corner)
            .map(|index| corner_values[index])
            .ok_or_else(|| {
                HeatmapError::InvalidConfig(format!("no sensor placed at {:?}", corner))
            })
    }

    pub fn label(&self, index: usize) -> String {
        format!("S{}", index)
    }
}

impl Default for CornerLayout {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Sample coordinate `i` of `n` evenly spaced points on `[0, 1]`
fn linspace_at(i: usize, n: usize) -> f64 {
    if n <= 1 {
        0.0
    } else {
        i as f64 / (n - 1) as f64
    }
}

/// Bilinear value at `(x, y)` given corner temperatures
fn bilinear(bl: f64, tl: f64, tr: f64, br: f64, x: f64, y: f64) -> f64 {
    (1.0 - x) * (1.0 - y) * bl + x * (1.0 - y) * br + (1.0 - x) * y * tl + x * y * tr
}

/// Interpolate four corner values (in sensor-index order) over an N×N grid
pub fn interpolate(corner_values: &[f64; SENSOR_COUNT], grid_size: usize) -> Result<Grid> {
    interpolate_with_layout(&CornerLayout::STANDARD, corner_values, grid_size)
}

/// Interpolate using an explicit corner layout
pub fn interpolate_with_layout(
    layout: &CornerLayout,
    corner_values: &[f64; SENSOR_COUNT],
    grid_size: usize,
) -> Result<Grid> {
    if grid_size == 0 {
        return Err(HeatmapError::InvalidConfig(
            "grid size must be at least 1".to_string(),
        ));
    }

    let bl = layout.corner_value(corner_values, Corner::BottomLeft)?;
    let tl = layout.corner_value(corner_values, Corner::TopLeft)?;
    let tr = layout.corner_value(corner_values, Corner::TopRight)?;
    let br = layout.corner_value(corner_values, Corner::BottomRight)?;

    Ok(Array2::from_shape_fn((grid_size, grid_size), |(row, col)| {
        let x = linspace_at(col, grid_size);
        let y = linspace_at(row, grid_size);
        bilinear(bl, tl, tr, br, x, y)
    }))
}

/// Interpolate from a store snapshot; `NotReady` until all four sensors reported
pub fn interpolate_snapshot(snapshot: &Snapshot, grid_size: usize) -> Result<Grid> {
    let values = snapshot.corner_values().ok_or(HeatmapError::NotReady)?;
    interpolate(&values, grid_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_uniform_corners() {
        for n in [1, 2, 7, 80] {
            let grid = interpolate(&[21.5; 4], n).unwrap();
            assert_eq!(grid.dim(), (n, n));
            for &v in grid.iter() {
                assert_relative_eq!(v, 21.5, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_center_value() {
        let grid = interpolate(&[0.0, 10.0, 20.0, 30.0], 3).unwrap();
        assert_relative_eq!(grid[[1, 1]], 15.0, epsilon = 1e-12);
    }

    #[test]
    fn test_corners_match_layout() {
        let values = [0.0, 10.0, 20.0, 30.0];
        let grid = interpolate(&values, 5).unwrap();
        let layout = CornerLayout::STANDARD;

        for (index, &value) in values.iter().enumerate() {
            let (x, y) = layout.position(index).unwrap();
            let row = (y * 4.0) as usize;
            let col = (x * 4.0) as usize;
            assert_relative_eq!(grid[[row, col]], value, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_edges_are_linear() {
        // Bottom edge runs S0 -> S3, left edge runs S0 -> S1
        let grid = interpolate(&[0.0, 10.0, 20.0, 30.0], 5).unwrap();
        assert_relative_eq!(grid[[0, 2]], 15.0, epsilon = 1e-12);
        assert_relative_eq!(grid[[2, 0]], 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_layout_positions() {
        let layout = CornerLayout::default();
        assert_eq!(layout.position(0), Some((0.0, 0.0)));
        assert_eq!(layout.position(1), Some((0.0, 1.0)));
        assert_eq!(layout.position(2), Some((1.0, 1.0)));
        assert_eq!(layout.position(3), Some((1.0, 0.0)));
        assert_eq!(layout.position(4), None);
        assert_eq!(layout.index_of(Corner::TopRight), Some(2));
    }

    #[test]
    fn test_layout_missing_corner_is_rejected() {
        let layout = CornerLayout {
            corners: [
                Corner::BottomLeft,
                Corner::TopLeft,
                Corner::TopRight,
                Corner::TopRight,
            ],
        };
        assert_eq!(layout.index_of(Corner::BottomRight), None);
        assert!(matches!(
            interpolate_with_layout(&layout, &[0.0, 10.0, 20.0, 30.0], 4),
            Err(HeatmapError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_not_ready_snapshot() {
        let snapshot = Snapshot::default();
        assert!(matches!(
            interpolate_snapshot(&snapshot, 10),
            Err(HeatmapError::NotReady)
        ));
        assert!(interpolate(&[0.0; 4], 0).is_err());
    }
}
