//! A puzzle still in play is never in reference order.

use super::Invariant;
use crate::PuzzlePlaying;

/// Invariant: a playing board differs from the solved arrangement.
///
/// Setup never yields a solved board and the winning swap leaves the
/// playing phase, so equality while playing means the win was missed.
pub struct UnsolvedWhilePlayingInvariant;

impl Invariant<PuzzlePlaying> for UnsolvedWhilePlayingInvariant {
    fn holds(game: &PuzzlePlaying) -> bool {
        !game.board().is_solved()
    }

    fn description() -> &'static str {
        "A puzzle in play is not in reference order"
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::playing;
    use super::*;

    #[test]
    fn test_unsolved_holds() {
        assert!(UnsolvedWhilePlayingInvariant::holds(&playing(&[0, 1, 3, 2])));
    }

    #[test]
    fn test_missed_win_violates() {
        let mut game = playing(&[0, 1, 3, 2]);
        game.board.swap(2, 3);
        assert!(!UnsolvedWhilePlayingInvariant::holds(&game));
    }
}
