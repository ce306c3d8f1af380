//! Puzzle tiles and the validated reference sequence produced by splitting.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use image::RgbaImage;
use tracing::instrument;

use crate::board::ArrangementError;
use crate::{AspectRatio, GridPosition, GridSize};

/// One cropped cell of the source image.
///
/// Tiles are immutable. Identity is the origin position in the solved
/// arrangement, never the pixel content, so two visually identical cells
/// remain distinguishable.
#[derive(Clone)]
pub struct Tile {
    origin: GridPosition,
    image: Arc<RgbaImage>,
}

impl Tile {
    /// Creates a tile for the given reference position.
    pub fn new(origin: GridPosition, image: RgbaImage) -> Self {
        Self {
            origin,
            image: Arc::new(image),
        }
    }

    /// Returns the tile's position in the solved arrangement.
    pub fn origin(&self) -> GridPosition {
        self.origin
    }

    /// Returns the tile's pixels.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

impl PartialEq for Tile {
    fn eq(&self, other: &Self) -> bool {
        self.origin == other.origin
    }
}

impl Eq for Tile {}

impl Hash for Tile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.origin.hash(state);
    }
}

impl fmt::Debug for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tile")
            .field("origin", &self.origin)
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .finish()
    }
}

/// The full set of tiles for one puzzle, in canonical row-major order.
///
/// Holds exactly `grid.tile_count()` tiles whose origins are the grid
/// positions in order, which makes it the reference (solved) arrangement.
#[derive(Debug, Clone)]
pub struct TileSet {
    grid: GridSize,
    aspect_ratio: AspectRatio,
    tiles: Vec<Tile>,
}

impl TileSet {
    /// Validates a reference sequence.
    ///
    /// # Errors
    ///
    /// Returns [`ArrangementError::LengthMismatch`] if the tile count differs
    /// from the grid, or [`ArrangementError::NotReferenceOrder`] if tile `i`
    /// does not originate at row-major position `i`.
    #[instrument(skip(tiles), fields(tiles = tiles.len()))]
    pub fn new(
        grid: GridSize,
        aspect_ratio: AspectRatio,
        tiles: Vec<Tile>,
    ) -> Result<Self, ArrangementError> {
        if tiles.len() != grid.tile_count() {
            return Err(ArrangementError::LengthMismatch {
                expected: grid.tile_count(),
                actual: tiles.len(),
            });
        }
        if !grid
            .positions()
            .zip(&tiles)
            .all(|(position, tile)| tile.origin() == position)
        {
            return Err(ArrangementError::NotReferenceOrder);
        }
        Ok(Self {
            grid,
            aspect_ratio,
            tiles,
        })
    }

    /// Builds a tile set of 1×1 blank tiles, for callers that only need
    /// tile identities.
    #[instrument]
    pub fn blank(grid: GridSize) -> Self {
        let tiles = grid
            .positions()
            .map(|position| Tile::new(position, RgbaImage::new(1, 1)))
            .collect();
        Self {
            grid,
            aspect_ratio: AspectRatio::PORTRAIT_4_5,
            tiles,
        }
    }

    /// Returns the grid size.
    pub fn grid(&self) -> GridSize {
        self.grid
    }

    /// Returns the crop ratio the tiles were cut at.
    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    /// Returns the tiles in reference order.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Returns the number of tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Always false; a valid set has at least four tiles.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Returns the origins of all tiles, which must be distinct.
    pub(crate) fn origins(&self) -> HashSet<GridPosition> {
        self.tiles.iter().map(Tile::origin).collect()
    }
}
