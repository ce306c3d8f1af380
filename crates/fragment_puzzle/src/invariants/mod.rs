//! First-class invariants for the swap puzzle.
//!
//! Invariants are logical properties that must hold while a puzzle is in
//! play. They are checked in debug builds and tested independently.

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants checked together.
///
/// Implemented for triples of invariants, the shape of [`PlayingInvariants`].
pub trait InvariantSet<S> {
    /// Checks all invariants in the set, collecting every violation.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

impl<S, I1, I2, I3> InvariantSet<S> for (I1, I2, I3)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
    I3: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let violations: Vec<_> = [
            (I1::holds(state), I1::description()),
            (I2::holds(state), I2::description()),
            (I3::holds(state), I3::description()),
        ]
        .into_iter()
        .filter(|(holds, _)| !holds)
        .map(|(_, description)| InvariantViolation::new(description))
        .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

pub mod permutation;
pub mod selection;
pub mod unsolved;

pub use permutation::PermutationInvariant;
pub use selection::SelectionInvariant;
pub use unsolved::UnsolvedWhilePlayingInvariant;

/// All in-play invariants as a composable set.
pub type PlayingInvariants = (
    PermutationInvariant,
    SelectionInvariant,
    UnsolvedWhilePlayingInvariant,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::{GridSize, PuzzlePlaying, PuzzleReady, TileSet};
    use std::time::Instant;

    pub(super) fn playing(order: &[usize]) -> PuzzlePlaying {
        let set = TileSet::blank(GridSize::new(2).expect("valid grid"));
        let board = Board::arranged(set, order).expect("valid order");
        PuzzleReady::from_board(board)
            .expect("unsolved")
            .start(Instant::now())
    }

    #[test]
    fn test_invariant_set_holds_for_fresh_game() {
        assert!(PlayingInvariants::check_all(&playing(&[3, 2, 1, 0])).is_ok());
    }

    #[test]
    fn test_invariant_set_reports_every_violation() {
        let mut game = playing(&[1, 0, 2, 3]);
        game.selected = Some(9);
        game.board.swap(0, 1);

        let violations = PlayingInvariants::check_all(&game).expect_err("two violations");
        assert_eq!(violations.len(), 2);
    }
}
