//! Contract-based validation for taps.
//!
//! Contracts formalise Hoare-style reasoning: `{P} tap {Q}`.

use tracing::{instrument, warn};

use crate::TapError;
use crate::board::Board;
use crate::invariants::{InvariantSet, PlayingInvariants};
use crate::typestate::PuzzlePlaying;

/// Preconditions and postconditions for a state transition.
pub trait Contract<S, A> {
    /// Checks preconditions before applying the action.
    fn pre(state: &S, action: &A) -> Result<(), TapError>;

    /// Checks postconditions after applying the action.
    fn post(before: &S, after: &S) -> Result<(), TapError>;
}

/// Precondition: the tapped index addresses a tile.
pub struct IndexInRange;

impl IndexInRange {
    /// Rejects indices at or beyond the tile count.
    #[instrument(skip(board))]
    pub fn check(index: usize, board: &Board) -> Result<(), TapError> {
        if index >= board.len() {
            warn!(index, len = board.len(), "Tap out of range");
            return Err(TapError::OutOfRange {
                index,
                len: board.len(),
            });
        }
        Ok(())
    }
}

/// Contract for taps during play.
///
/// Preconditions:
/// - Index is in range
///
/// Postconditions:
/// - Tiles are still a permutation of the reference
/// - At most one tile is selected, and it is in range
/// - A puzzle still in play is not solved
/// - The reference order is untouched
pub struct TapContract;

impl Contract<PuzzlePlaying, usize> for TapContract {
    fn pre(game: &PuzzlePlaying, index: &usize) -> Result<(), TapError> {
        IndexInRange::check(*index, game.board())
    }

    fn post(before: &PuzzlePlaying, after: &PuzzlePlaying) -> Result<(), TapError> {
        if before.board().reference() != after.board().reference() {
            return Err(TapError::InvariantViolation(
                "Postcondition failed: reference order changed".to_string(),
            ));
        }
        PlayingInvariants::check_all(after).map_err(|violations| {
            let descriptions = violations
                .iter()
                .map(|v| v.description.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            TapError::InvariantViolation(format!("Postcondition failed: {}", descriptions))
        })
    }
}
