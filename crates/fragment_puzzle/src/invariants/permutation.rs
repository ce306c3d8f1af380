//! Permutation invariant: no tile is created or destroyed by play.

use super::Invariant;
use crate::PuzzlePlaying;

/// Invariant: the working order holds exactly the reference tiles.
pub struct PermutationInvariant;

impl Invariant<PuzzlePlaying> for PermutationInvariant {
    fn holds(game: &PuzzlePlaying) -> bool {
        game.board().is_permutation_of_reference()
    }

    fn description() -> &'static str {
        "Tiles are a permutation of the reference tiles"
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::playing;
    use super::*;

    #[test]
    fn test_fresh_game_holds() {
        assert!(PermutationInvariant::holds(&playing(&[2, 3, 0, 1])));
    }

    #[test]
    fn test_duplicated_tile_violates() {
        let mut game = playing(&[2, 3, 0, 1]);
        let copy = game.board.tiles()[0].clone();
        game.board.tiles_mut()[1] = copy;
        assert!(!PermutationInvariant::holds(&game));
    }

    #[test]
    fn test_missing_tile_violates() {
        let mut game = playing(&[2, 3, 0, 1]);
        game.board.tiles_mut().pop();
        assert!(!PermutationInvariant::holds(&game));
    }
}
