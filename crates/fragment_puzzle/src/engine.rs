//! Runtime puzzle engine wrapping the typestate phases.
//!
//! The UI layer holds one `PuzzleEngine`, queries its observable fields for
//! rendering and registers observers for change notifications. Phase
//! transitions go through the typestate structs so every tap is checked by
//! the same contracts.

use std::fmt;
use std::time::{Duration, Instant};

use image::DynamicImage;
use rand::SeedableRng;
use rand::rngs::StdRng;
use strum::Display;
use tracing::{debug, error, info, instrument};

use crate::board::{ArrangementError, Board};
use crate::clock::{Clock, MonotonicClock, format_elapsed};
use crate::contracts::IndexInRange;
use crate::typestate::{PuzzlePlaying, PuzzleReady, PuzzleResult, PuzzleSolved, TapEffect};
use crate::{AspectRatio, GridSize, ImageError, TapError, Tile, TileSet, split_image};

/// Coarse engine phase, for display and branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum EnginePhase {
    /// No puzzle has been set up.
    Uninitialized,
    /// Shuffled, clock stopped.
    Ready,
    /// Clock running.
    Playing,
    /// Solved, clock stopped. Terminal until the next setup.
    Solved,
}

/// Change notification delivered to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PuzzleEvent {
    /// A new puzzle was set up and shuffled.
    Setup {
        /// Grid of the new puzzle.
        grid: GridSize,
    },
    /// The first tap started the clock.
    Started,
    /// A tile became selected.
    Selected(usize),
    /// The selected tile was tapped again.
    Deselected(usize),
    /// Two tiles swapped places.
    Swapped {
        /// Tile selected first.
        first: usize,
        /// Tile tapped second.
        second: usize,
    },
    /// The last swap completed the picture.
    Solved {
        /// Time from first tap to the winning swap.
        elapsed: Duration,
    },
    /// The clock and selection were cleared.
    Reset,
}

type Observer = Box<dyn FnMut(&PuzzleEvent) + Send>;

#[derive(Debug)]
enum EngineState {
    Uninitialized,
    Ready(PuzzleReady),
    Playing(PuzzlePlaying),
    Solved(PuzzleSolved),
}

/// Owns tile order, selection, swaps, win detection and elapsed time for
/// one play session.
///
/// Not designed for concurrent use: callers serialise `setup`, `tap` and
/// `reset`.
pub struct PuzzleEngine<C: Clock = MonotonicClock> {
    state: EngineState,
    clock: C,
    rng: StdRng,
    observers: Vec<Observer>,
}

impl PuzzleEngine<MonotonicClock> {
    /// Creates an uninitialised engine on the system clock with an
    /// OS-seeded shuffle.
    #[instrument]
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock)
    }
}

impl Default for PuzzleEngine<MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> PuzzleEngine<C> {
    /// Creates an engine on the given clock with an OS-seeded shuffle.
    #[instrument]
    pub fn with_clock(clock: C) -> Self {
        Self::from_parts(clock, StdRng::from_os_rng())
    }

    /// Creates an engine with a reproducible shuffle.
    #[instrument]
    pub fn with_seed(clock: C, seed: u64) -> Self {
        Self::from_parts(clock, StdRng::seed_from_u64(seed))
    }

    fn from_parts(clock: C, rng: StdRng) -> Self {
        Self {
            state: EngineState::Uninitialized,
            clock,
            rng,
            observers: Vec::new(),
        }
    }

    /// Registers a callback invoked after every state change.
    pub fn subscribe(&mut self, observer: impl FnMut(&PuzzleEvent) + Send + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Splits `image`, shuffles the tiles and enters `Ready`.
    ///
    /// On failure the engine keeps its previous state.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError`] if the image cannot be split.
    #[instrument(skip(self, image), fields(grid = %grid, ratio = %ratio))]
    pub fn setup(
        &mut self,
        image: &DynamicImage,
        grid: GridSize,
        ratio: AspectRatio,
    ) -> Result<(), ImageError> {
        let set = split_image(image, grid, ratio)?;
        self.setup_tiles(set);
        Ok(())
    }

    /// Shuffles an already split tile set and enters `Ready`.
    #[instrument(skip(self, set), fields(grid = %set.grid()))]
    pub fn setup_tiles(&mut self, set: TileSet) {
        let grid = set.grid();
        let ready = PuzzleReady::shuffle(set, &mut self.rng);
        self.state = EngineState::Ready(ready);
        info!(%grid, "Puzzle ready");
        self.notify(&PuzzleEvent::Setup { grid });
    }

    /// Enters `Ready` with an explicit arrangement.
    ///
    /// # Errors
    ///
    /// Returns [`ArrangementError::AlreadySolved`] for a solved board.
    #[instrument(skip(self, board))]
    pub fn setup_board(&mut self, board: Board) -> Result<(), ArrangementError> {
        let grid = board.grid();
        let ready = PuzzleReady::from_board(board)?;
        self.state = EngineState::Ready(ready);
        info!(%grid, "Puzzle ready");
        self.notify(&PuzzleEvent::Setup { grid });
        Ok(())
    }

    /// Handles a tap on the tile at `index`.
    ///
    /// The first tap starts the clock. Out-of-range taps are rejected and
    /// leave the state untouched, in every build profile.
    ///
    /// # Errors
    ///
    /// - [`TapError::OutOfRange`] for an index past the last tile
    /// - [`TapError::NotStarted`] before any setup
    /// - [`TapError::AlreadySolved`] after the winning swap
    #[instrument(skip(self), fields(phase = %self.phase()))]
    pub fn tap(&mut self, index: usize) -> Result<TapEffect, TapError> {
        match &self.state {
            EngineState::Uninitialized => return Err(TapError::NotStarted),
            EngineState::Solved(_) => return Err(TapError::AlreadySolved),
            EngineState::Ready(ready) => IndexInRange::check(index, ready.board())?,
            EngineState::Playing(playing) => IndexInRange::check(index, playing.board())?,
        }

        let now = self.clock.now();
        let playing = match std::mem::replace(&mut self.state, EngineState::Uninitialized) {
            EngineState::Ready(ready) => {
                let playing = ready.start(now);
                self.notify(&PuzzleEvent::Started);
                playing
            }
            EngineState::Playing(playing) => playing,
            EngineState::Uninitialized | EngineState::Solved(_) => {
                return Err(TapError::NotStarted);
            }
        };

        let outcome = playing.tap(index, now).inspect_err(|e| {
            error!(error = %e, "Tap broke a postcondition; puzzle discarded");
        })?;

        let solved_after = match outcome.result {
            PuzzleResult::Playing(game) => {
                self.state = EngineState::Playing(game);
                None
            }
            PuzzleResult::Solved(game) => {
                let elapsed = game.elapsed();
                self.state = EngineState::Solved(game);
                Some(elapsed)
            }
        };

        let event = match outcome.effect {
            TapEffect::Selected(i) => PuzzleEvent::Selected(i),
            TapEffect::Deselected(i) => PuzzleEvent::Deselected(i),
            TapEffect::Swapped { first, second } => PuzzleEvent::Swapped { first, second },
        };
        self.notify(&event);
        if let Some(elapsed) = solved_after {
            info!(elapsed = %format_elapsed(elapsed), "Puzzle solved");
            self.notify(&PuzzleEvent::Solved { elapsed });
        }

        debug!(effect = ?outcome.effect, "Tap applied");
        Ok(outcome.effect)
    }

    /// Stops the clock and clears elapsed time and selection, keeping the
    /// current arrangement.
    ///
    /// Returns `false` without changes when there is nothing to reset: no
    /// puzzle yet, or a solved puzzle (terminal until the next setup).
    #[instrument(skip(self), fields(phase = %self.phase()))]
    pub fn reset(&mut self) -> bool {
        let next = match std::mem::replace(&mut self.state, EngineState::Uninitialized) {
            EngineState::Playing(playing) => playing.reset(),
            EngineState::Ready(ready) => ready,
            other => {
                debug!("Nothing to reset");
                self.state = other;
                return false;
            }
        };
        self.state = EngineState::Ready(next);
        self.notify(&PuzzleEvent::Reset);
        true
    }

    /// Discards the current puzzle and returns to `Uninitialized`.
    #[instrument(skip(self), fields(phase = %self.phase()))]
    pub fn clear(&mut self) {
        if matches!(self.state, EngineState::Uninitialized) {
            return;
        }
        self.state = EngineState::Uninitialized;
        debug!("Puzzle discarded");
    }

    /// Returns the current phase.
    pub fn phase(&self) -> EnginePhase {
        match self.state {
            EngineState::Uninitialized => EnginePhase::Uninitialized,
            EngineState::Ready(_) => EnginePhase::Ready,
            EngineState::Playing(_) => EnginePhase::Playing,
            EngineState::Solved(_) => EnginePhase::Solved,
        }
    }

    fn board(&self) -> Option<&Board> {
        match &self.state {
            EngineState::Uninitialized => None,
            EngineState::Ready(game) => Some(game.board()),
            EngineState::Playing(game) => Some(game.board()),
            EngineState::Solved(game) => Some(game.board()),
        }
    }

    /// Returns the tiles in their current arrangement (empty before setup).
    pub fn tiles(&self) -> &[Tile] {
        self.board().map(Board::tiles).unwrap_or_default()
    }

    /// Returns the tiles in solved order (empty before setup).
    pub fn reference_tiles(&self) -> &[Tile] {
        self.board().map(Board::reference).unwrap_or_default()
    }

    /// Returns the grid of the current puzzle.
    pub fn grid(&self) -> Option<GridSize> {
        self.board().map(Board::grid)
    }

    /// Returns the crop ratio of the current puzzle.
    pub fn aspect_ratio(&self) -> Option<AspectRatio> {
        self.board().map(|board| board.tile_set().aspect_ratio())
    }

    /// Returns the selected tile, if any.
    pub fn selected(&self) -> Option<usize> {
        match &self.state {
            EngineState::Playing(game) => game.selected(),
            _ => None,
        }
    }

    /// True once the winning swap has happened.
    pub fn is_solved(&self) -> bool {
        matches!(self.state, EngineState::Solved(_))
    }

    /// Returns the instant the clock started, while playing.
    pub fn started_at(&self) -> Option<Instant> {
        match &self.state {
            EngineState::Playing(game) => Some(game.started_at()),
            _ => None,
        }
    }

    /// Returns the elapsed time: live while playing, final once solved,
    /// zero otherwise.
    pub fn elapsed(&self) -> Duration {
        match &self.state {
            EngineState::Playing(game) => game.elapsed(self.clock.now()),
            EngineState::Solved(game) => game.elapsed(),
            EngineState::Uninitialized | EngineState::Ready(_) => Duration::ZERO,
        }
    }

    /// Returns [`PuzzleEngine::elapsed`] as `MM:SS`.
    pub fn elapsed_formatted(&self) -> String {
        format_elapsed(self.elapsed())
    }

    /// Returns the engine's clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn notify(&mut self, event: &PuzzleEvent) {
        for observer in &mut self.observers {
            observer(event);
        }
    }
}

impl<C: Clock> fmt::Debug for PuzzleEngine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PuzzleEngine")
            .field("state", &self.state)
            .field("clock", &self.clock)
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;
    use std::sync::{Arc, Mutex};

    fn engine_with(order: &[usize]) -> (PuzzleEngine<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let mut engine = PuzzleEngine::with_seed(clock.clone(), 1);
        let set = TileSet::blank(GridSize::new(2).expect("valid grid"));
        engine
            .setup_board(Board::arranged(set, order).expect("valid order"))
            .expect("unsolved board");
        (engine, clock)
    }

    #[test]
    fn test_tap_before_setup_is_rejected() {
        let mut engine = PuzzleEngine::with_seed(ManualClock::new(), 1);
        assert_eq!(engine.tap(0), Err(TapError::NotStarted));
        assert_eq!(engine.phase(), EnginePhase::Uninitialized);
    }

    #[test]
    fn test_out_of_range_tap_keeps_ready_state() {
        let (mut engine, _) = engine_with(&[1, 0, 2, 3]);
        assert_eq!(
            engine.tap(4),
            Err(TapError::OutOfRange { index: 4, len: 4 })
        );
        assert_eq!(engine.phase(), EnginePhase::Ready);
        assert_eq!(engine.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_events_for_a_winning_game() {
        let (mut engine, clock) = engine_with(&[1, 0, 2, 3]);
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        engine.subscribe(move |event| sink.lock().expect("lock").push(event.clone()));

        engine.tap(0).expect("select");
        clock.advance(Duration::from_secs(42));
        engine.tap(1).expect("swap");

        let events = events.lock().expect("lock");
        assert_eq!(
            *events,
            vec![
                PuzzleEvent::Started,
                PuzzleEvent::Selected(0),
                PuzzleEvent::Swapped {
                    first: 0,
                    second: 1
                },
                PuzzleEvent::Solved {
                    elapsed: Duration::from_secs(42)
                },
            ]
        );
    }

    #[test]
    fn test_reset_on_solved_is_noop() {
        let (mut engine, _) = engine_with(&[1, 0, 2, 3]);
        engine.tap(0).expect("select");
        engine.tap(1).expect("swap");
        assert!(!engine.reset());
        assert!(engine.is_solved());
    }

    #[test]
    fn test_elapsed_freezes_when_solved() {
        let (mut engine, clock) = engine_with(&[0, 1, 3, 2]);
        engine.tap(2).expect("select");
        clock.advance(Duration::from_secs(65));
        engine.tap(3).expect("swap");
        clock.advance(Duration::from_secs(30));
        assert_eq!(engine.elapsed_formatted(), "01:05");
    }

    #[test]
    fn test_clear_discards_puzzle() {
        let (mut engine, _) = engine_with(&[1, 0, 2, 3]);
        engine.tap(0).expect("select");
        engine.clear();
        assert_eq!(engine.phase(), EnginePhase::Uninitialized);
        assert!(engine.tiles().is_empty());
        assert_eq!(engine.tap(0), Err(TapError::NotStarted));
    }
}
