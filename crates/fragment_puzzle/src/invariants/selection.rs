//! Selection invariant: at rest, at most one in-range tile is selected.

use super::Invariant;
use crate::PuzzlePlaying;

/// Invariant: the selection is empty or one valid index.
///
/// A second selection triggers an immediate swap-and-clear, so a settled
/// state never shows two selected tiles. The `Option` encodes the bound;
/// this checks the index.
pub struct SelectionInvariant;

impl Invariant<PuzzlePlaying> for SelectionInvariant {
    fn holds(game: &PuzzlePlaying) -> bool {
        game.selected().is_none_or(|index| index < game.board().len())
    }

    fn description() -> &'static str {
        "Selection is empty or a single in-range tile"
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::playing;
    use super::*;

    #[test]
    fn test_empty_selection_holds() {
        assert!(SelectionInvariant::holds(&playing(&[1, 0, 2, 3])));
    }

    #[test]
    fn test_out_of_range_selection_violates() {
        let mut game = playing(&[1, 0, 2, 3]);
        game.selected = Some(4);
        assert!(!SelectionInvariant::holds(&game));
    }
}
