//! Grid geometry: square grid sizes, tile positions and crop ratios.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::ImageError;

/// Side length of a square puzzle grid (`n × n` tiles).
///
/// A grid always has at least two tiles per side, so a puzzle has at
/// least four tiles and at least one unsolved arrangement.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize,
)]
#[display("{_0}x{_0}")]
#[serde(try_from = "u32", into = "u32")]
pub struct GridSize(u32);

impl GridSize {
    /// Smallest allowed side length.
    pub const MIN: u32 = 2;

    /// Creates a grid size, rejecting sides below [`GridSize::MIN`].
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidGridSize`] if `side < 2`.
    #[instrument]
    pub fn new(side: u32) -> Result<Self, ImageError> {
        if side < Self::MIN {
            return Err(ImageError::InvalidGridSize(side));
        }
        Ok(Self(side))
    }

    /// Returns the number of tiles per side.
    pub fn side(self) -> u32 {
        self.0
    }

    /// Returns the total number of tiles (`side²`).
    pub fn tile_count(self) -> usize {
        let side = self.0 as usize;
        side * side
    }

    /// Converts a row-major index into a grid position.
    pub fn position_of(self, index: usize) -> Option<GridPosition> {
        if index >= self.tile_count() {
            return None;
        }
        let side = self.0 as usize;
        Some(GridPosition::new((index / side) as u32, (index % side) as u32))
    }

    /// Converts a grid position into its row-major index.
    pub fn index_of(self, position: GridPosition) -> Option<usize> {
        if position.row >= self.0 || position.col >= self.0 {
            return None;
        }
        Some(position.row as usize * self.0 as usize + position.col as usize)
    }

    /// Iterates every position in row-major order.
    pub fn positions(self) -> impl Iterator<Item = GridPosition> {
        let side = self.0;
        (0..side).flat_map(move |row| (0..side).map(move |col| GridPosition::new(row, col)))
    }
}

impl TryFrom<u32> for GridSize {
    type Error = ImageError;

    fn try_from(side: u32) -> Result<Self, Self::Error> {
        Self::new(side)
    }
}

impl From<GridSize> for u32 {
    fn from(grid: GridSize) -> Self {
        grid.0
    }
}

/// Row/column position of a tile in the solved arrangement.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize,
)]
#[display("({row}, {col})")]
pub struct GridPosition {
    /// Zero-based row, top to bottom.
    pub row: u32,
    /// Zero-based column, left to right.
    pub col: u32,
}

impl GridPosition {
    /// Creates a position.
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// Width/height ratio the source image is cropped to before splitting.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Display, Serialize, Deserialize)]
#[display("{_0:.3}")]
#[serde(try_from = "f64", into = "f64")]
pub struct AspectRatio(f64);

impl AspectRatio {
    /// Portrait 4:5 ratio used for custom-image puzzles.
    pub const PORTRAIT_4_5: Self = Self(0.8);

    /// Landscape 4:3 ratio.
    pub const LANDSCAPE_4_3: Self = Self(4.0 / 3.0);

    /// Creates a ratio from a positive finite number.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidAspectRatio`] for zero, negative or
    /// non-finite values.
    #[instrument]
    pub fn new(ratio: f64) -> Result<Self, ImageError> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(ImageError::InvalidAspectRatio(ratio));
        }
        Ok(Self(ratio))
    }

    /// Returns the ratio of a `width × height` rectangle.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidAspectRatio`] if either side is zero.
    #[instrument]
    pub fn of(width: u32, height: u32) -> Result<Self, ImageError> {
        Self::new(f64::from(width) / f64::from(height))
    }

    /// Returns the raw width/height value.
    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for AspectRatio {
    type Error = ImageError;

    fn try_from(ratio: f64) -> Result<Self, Self::Error> {
        Self::new(ratio)
    }
}

impl From<AspectRatio> for f64 {
    fn from(ratio: AspectRatio) -> Self {
        ratio.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_size_rejects_below_two() {
        assert!(matches!(GridSize::new(1), Err(ImageError::InvalidGridSize(1))));
        assert!(GridSize::new(0).is_err());
        assert_eq!(GridSize::new(2).map(GridSize::tile_count), Ok(4));
    }

    #[test]
    fn test_index_position_round_trip() {
        let grid = GridSize::new(3).expect("valid grid");
        assert_eq!(grid.position_of(5), Some(GridPosition::new(1, 2)));
        assert_eq!(grid.index_of(GridPosition::new(2, 0)), Some(6));
        assert_eq!(grid.position_of(9), None);
        assert_eq!(grid.index_of(GridPosition::new(0, 3)), None);
    }

    #[test]
    fn test_positions_are_row_major() {
        let grid = GridSize::new(2).expect("valid grid");
        let positions: Vec<_> = grid.positions().collect();
        assert_eq!(
            positions,
            vec![
                GridPosition::new(0, 0),
                GridPosition::new(0, 1),
                GridPosition::new(1, 0),
                GridPosition::new(1, 1),
            ]
        );
    }

    #[test]
    fn test_aspect_ratio_validation() {
        assert!(AspectRatio::new(0.0).is_err());
        assert!(AspectRatio::new(-1.0).is_err());
        assert!(AspectRatio::new(f64::NAN).is_err());
        assert!(AspectRatio::new(f64::INFINITY).is_err());
        assert!(AspectRatio::of(100, 0).is_err());
        assert_eq!(AspectRatio::of(400, 500).map(AspectRatio::value), Ok(0.8));
    }

    #[test]
    fn test_grid_size_deserialize_validates() {
        assert!(serde_json::from_str::<GridSize>("1").is_err());
        assert_eq!(
            serde_json::from_str::<GridSize>("4").ok().map(GridSize::side),
            Some(4)
        );
    }
}
