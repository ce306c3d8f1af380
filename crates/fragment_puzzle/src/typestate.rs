//! Phase-specific typestate structs for the swap puzzle.
//!
//! Each phase is its own type carrying only the fields that exist in that
//! phase: a `PuzzlePlaying` always has a running clock, a `PuzzleSolved`
//! always has a final elapsed time.

use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{debug, info, instrument};

use crate::board::{ArrangementError, Board};
use crate::contracts::{Contract, IndexInRange, TapContract};
use crate::{TapError, Tile, TileSet};

// ─────────────────────────────────────────────────────────────
//  Ready Phase
// ─────────────────────────────────────────────────────────────

/// Shuffled puzzle waiting for its first tap. The clock is stopped.
#[derive(Debug, Clone)]
pub struct PuzzleReady {
    board: Board,
}

impl PuzzleReady {
    /// Shuffles a freshly split tile set into an unsolved arrangement.
    #[instrument(skip(set, rng), fields(grid = %set.grid()))]
    pub fn shuffle<R: Rng + ?Sized>(set: TileSet, rng: &mut R) -> Self {
        Self {
            board: Board::shuffled(set, rng),
        }
    }

    /// Wraps an explicit arrangement.
    ///
    /// # Errors
    ///
    /// Returns [`ArrangementError::AlreadySolved`] for a solved board.
    #[instrument(skip(board))]
    pub fn from_board(board: Board) -> Result<Self, ArrangementError> {
        if board.is_solved() {
            return Err(ArrangementError::AlreadySolved);
        }
        Ok(Self { board })
    }

    /// Returns the board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Starts the clock at `now` (consumes ready, returns playing).
    #[instrument(skip(self))]
    pub fn start(self, now: Instant) -> PuzzlePlaying {
        debug!("Clock started");
        PuzzlePlaying {
            board: self.board,
            selected: None,
            started_at: now,
        }
    }

    /// Starts the clock and applies the first tap.
    ///
    /// The index is checked before the clock starts.
    #[instrument(skip(self))]
    pub fn tap(self, index: usize, now: Instant) -> Result<TapOutcome, TapError> {
        IndexInRange::check(index, &self.board)?;
        self.start(now).tap(index, now)
    }
}

// ─────────────────────────────────────────────────────────────
//  Playing Phase
// ─────────────────────────────────────────────────────────────

/// Puzzle in play: the clock is running and at most one tile is selected.
#[derive(Debug, Clone)]
pub struct PuzzlePlaying {
    pub(crate) board: Board,
    pub(crate) selected: Option<usize>,
    pub(crate) started_at: Instant,
}

impl PuzzlePlaying {
    /// Applies a tap, consuming self and returning the next state.
    ///
    /// - Tapping the selected tile deselects it.
    /// - Tapping with nothing selected selects the tile.
    /// - Tapping a second tile swaps the two, clears the selection and
    ///   checks for a win.
    ///
    /// Preconditions are checked always, postconditions in debug builds.
    #[instrument(skip(self), fields(selected = ?self.selected))]
    pub fn tap(self, index: usize, now: Instant) -> Result<TapOutcome, TapError> {
        TapContract::pre(&self, &index)?;

        #[cfg(debug_assertions)]
        let before = self.clone();

        let mut game = self;
        let effect = match game.selected.take() {
            Some(first) if first == index => TapEffect::Deselected(index),
            Some(first) => {
                game.board.swap(first, index);
                TapEffect::Swapped {
                    first,
                    second: index,
                }
            }
            None => {
                game.selected = Some(index);
                TapEffect::Selected(index)
            }
        };

        if matches!(effect, TapEffect::Swapped { .. }) && game.board.is_solved() {
            let elapsed = now.saturating_duration_since(game.started_at);
            info!(?elapsed, "Puzzle solved");
            return Ok(TapOutcome {
                effect,
                result: PuzzleResult::Solved(PuzzleSolved {
                    board: game.board,
                    elapsed,
                }),
            });
        }

        #[cfg(debug_assertions)]
        TapContract::post(&before, &game)?;

        Ok(TapOutcome {
            effect,
            result: PuzzleResult::Playing(game),
        })
    }

    /// Returns the board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the selected tile index, if any.
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Returns the instant the clock started.
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the time since the first tap.
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }

    /// Stops the clock and clears the selection, keeping the arrangement.
    #[instrument(skip(self))]
    pub fn reset(self) -> PuzzleReady {
        PuzzleReady { board: self.board }
    }
}

// ─────────────────────────────────────────────────────────────
//  Solved Phase
// ─────────────────────────────────────────────────────────────

/// Solved puzzle. Terminal: the elapsed time is final.
#[derive(Debug, Clone)]
pub struct PuzzleSolved {
    board: Board,
    elapsed: Duration,
}

impl PuzzleSolved {
    /// Returns the time from first tap to the winning swap.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Returns the board, which is in reference order.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the solved tiles.
    pub fn tiles(&self) -> &[Tile] {
        self.board.tiles()
    }
}

// ─────────────────────────────────────────────────────────────
//  Transition Types
// ─────────────────────────────────────────────────────────────

/// What a single tap did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapEffect {
    /// The tile became selected.
    Selected(usize),
    /// The previously selected tile was tapped again.
    Deselected(usize),
    /// Two tiles were swapped.
    Swapped {
        /// The tile selected first.
        first: usize,
        /// The tile tapped second.
        second: usize,
    },
}

/// State after a tap.
#[derive(Debug)]
pub enum PuzzleResult {
    /// Play continues.
    Playing(PuzzlePlaying),
    /// The swap completed the picture.
    Solved(PuzzleSolved),
}

/// The effect of a tap and the state it produced.
#[derive(Debug)]
pub struct TapOutcome {
    /// What the tap did.
    pub effect: TapEffect,
    /// The resulting state.
    pub result: PuzzleResult,
}
