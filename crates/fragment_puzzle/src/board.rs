//! Tile arrangement: the fixed reference order and the working order.

use derive_more::Display;
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, instrument};

use crate::{GridPosition, GridSize, Tile, TileSet};

/// Invalid tile arrangement supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ArrangementError {
    /// The sequence length does not match the grid.
    #[display("Expected {expected} tiles, got {actual}")]
    LengthMismatch {
        /// Tiles required by the grid.
        expected: usize,
        /// Tiles supplied.
        actual: usize,
    },

    /// A reference sequence is not in row-major origin order.
    #[display("Reference tiles are not in row-major order")]
    NotReferenceOrder,

    /// The order does not use every index exactly once.
    #[display("Arrangement is not a permutation of the reference tiles")]
    NotAPermutation,

    /// The arrangement equals the reference order.
    #[display("Arrangement is already solved")]
    AlreadySolved,
}

impl std::error::Error for ArrangementError {}

/// Working tile order together with the solved order it must return to.
///
/// `tiles` is always a permutation of `reference`; only swaps move tiles.
#[derive(Debug, Clone)]
pub struct Board {
    set: TileSet,
    tiles: Vec<Tile>,
}

impl Board {
    /// Creates a board in the solved arrangement.
    pub fn solved(set: TileSet) -> Self {
        let tiles = set.tiles().to_vec();
        Self { set, tiles }
    }

    /// Creates a board with a random arrangement different from the
    /// reference.
    ///
    /// Rejection sampling: reshuffles until the order differs from the
    /// solved one. Terminates almost surely since a grid has at least
    /// `4! = 24` arrangements.
    #[instrument(skip(set, rng), fields(grid = %set.grid()))]
    pub fn shuffled<R: Rng + ?Sized>(set: TileSet, rng: &mut R) -> Self {
        let mut board = Self::solved(set);
        let mut attempts = 0u32;
        while board.is_solved() {
            board.tiles.shuffle(rng);
            attempts += 1;
        }
        debug!(attempts, "Board shuffled");
        board
    }

    /// Creates a board where position `i` holds reference tile `order[i]`.
    ///
    /// # Errors
    ///
    /// Returns [`ArrangementError::LengthMismatch`] or
    /// [`ArrangementError::NotAPermutation`] if `order` is not a
    /// permutation of `0..tile_count`.
    #[instrument(skip(set))]
    pub fn arranged(set: TileSet, order: &[usize]) -> Result<Self, ArrangementError> {
        if order.len() != set.len() {
            return Err(ArrangementError::LengthMismatch {
                expected: set.len(),
                actual: order.len(),
            });
        }
        let mut seen = vec![false; set.len()];
        for &index in order {
            match seen.get_mut(index) {
                Some(slot) if !*slot => *slot = true,
                _ => return Err(ArrangementError::NotAPermutation),
            }
        }
        let tiles = order.iter().map(|&i| set.tiles()[i].clone()).collect();
        Ok(Self { set, tiles })
    }

    /// Returns the grid size.
    pub fn grid(&self) -> GridSize {
        self.set.grid()
    }

    /// Returns the reference tile set.
    pub fn tile_set(&self) -> &TileSet {
        &self.set
    }

    /// Returns the tiles in the current arrangement.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Returns the tiles in the solved arrangement.
    pub fn reference(&self) -> &[Tile] {
        self.set.tiles()
    }

    /// Returns the reference position of each tile in current order.
    pub fn origins(&self) -> Vec<GridPosition> {
        self.tiles.iter().map(Tile::origin).collect()
    }

    /// Returns the number of tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Always false for a valid board.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// True iff every position holds its reference tile.
    pub fn is_solved(&self) -> bool {
        self.tiles == self.set.tiles()
    }

    /// True iff the working order holds exactly the reference tiles.
    pub fn is_permutation_of_reference(&self) -> bool {
        if self.tiles.len() != self.set.len() {
            return false;
        }
        let origins = self.set.origins();
        let current: std::collections::HashSet<_> = self.tiles.iter().map(Tile::origin).collect();
        current.len() == self.tiles.len() && current == origins
    }

    /// Swaps the tiles at two positions in place.
    pub(crate) fn swap(&mut self, first: usize, second: usize) {
        self.tiles.swap(first, second);
    }

    #[cfg(test)]
    pub(crate) fn tiles_mut(&mut self) -> &mut Vec<Tile> {
        &mut self.tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn set(side: u32) -> TileSet {
        TileSet::blank(GridSize::new(side).expect("valid grid"))
    }

    #[test]
    fn test_shuffled_board_is_never_solved() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let board = Board::shuffled(set(2), &mut rng);
            assert!(!board.is_solved());
            assert!(board.is_permutation_of_reference());
        }
    }

    #[test]
    fn test_arranged_rejects_duplicates() {
        let result = Board::arranged(set(2), &[0, 0, 1, 2]);
        assert_eq!(result.err(), Some(ArrangementError::NotAPermutation));
    }

    #[test]
    fn test_arranged_rejects_out_of_range() {
        let result = Board::arranged(set(2), &[0, 1, 2, 4]);
        assert_eq!(result.err(), Some(ArrangementError::NotAPermutation));
    }

    #[test]
    fn test_arranged_places_reference_tiles() {
        let board = Board::arranged(set(2), &[3, 1, 2, 0]).expect("valid order");
        assert_eq!(board.tiles()[0].origin(), GridPosition::new(1, 1));
        assert_eq!(board.tiles()[3].origin(), GridPosition::new(0, 0));
        assert!(!board.is_solved());
    }

    #[test]
    fn test_swap_back_solves() {
        let mut board = Board::arranged(set(2), &[1, 0, 2, 3]).expect("valid order");
        board.swap(0, 1);
        assert!(board.is_solved());
    }
}
