//! One play session: engine, ticker, progress store and image source.
//!
//! A session holds at most one open puzzle. Opening another puzzle or
//! exiting discards the current one together with its ticker; only a solved
//! level writes a completion record.

use std::sync::Arc;
use std::time::Duration;

use derive_getters::Getters;
use derive_more::Display;
use derive_new::new;
use fragment_puzzle::{
    AspectRatio, Clock, CompletionUpdate, EnginePhase, GridSize, ImageError, ImageProvider,
    LevelId, LevelRecord, MonotonicClock, PuzzleEngine, TapEffect, TapError, decode_image,
};
use image::DynamicImage;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::progress::LevelProgressStore;
use crate::store::RecordStore;
use crate::ticker::ElapsedTicker;

/// Session failure surfaced to the player.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum SessionError {
    /// Neither the requested image nor the fallback could be used.
    #[display("Could not start puzzle: {_0}")]
    CouldNotStart(ImageError),

    /// No level has the requested number.
    #[display("Level {_0} does not exist")]
    UnknownLevel(usize),

    /// The level has not been unlocked yet.
    #[display("Level {_0} is locked")]
    LevelLocked(usize),

    /// A tap arrived with no puzzle open.
    #[display("No puzzle is open")]
    NoActivePuzzle,

    /// The engine rejected a tap.
    #[display("{_0}")]
    Tap(TapError),
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::CouldNotStart(e) => Some(e),
            Self::Tap(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TapError> for SessionError {
    fn from(err: TapError) -> Self {
        Self::Tap(err)
    }
}

/// Settings a session needs from the application configuration.
#[derive(Debug, Clone, PartialEq, Getters, new)]
pub struct SessionConfig {
    /// Image used when a level image cannot be loaded.
    fallback_image: String,
    /// Crop ratio for levels; `None` keeps each image's own ratio.
    level_aspect_ratio: Option<AspectRatio>,
    /// Crop ratio for custom-image puzzles.
    custom_aspect_ratio: AspectRatio,
    /// Period of elapsed-time updates.
    tick_resolution: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            fallback_image: "userButton".to_string(),
            level_aspect_ratio: None,
            custom_aspect_ratio: AspectRatio::PORTRAIT_4_5,
            tick_resolution: Duration::from_millis(100),
        }
    }
}

/// What the open puzzle is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PuzzleKind {
    /// A level from the stored sequence.
    Level {
        /// Level identifier.
        id: LevelId,
        /// 1-based level number.
        number: usize,
    },
    /// A player-supplied image; never persisted.
    Custom,
}

/// Result of a tap within a session.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct TapReport {
    /// What the tap did to the board.
    effect: TapEffect,
    /// Whether the tap solved the puzzle.
    solved: bool,
    /// Progress change recorded for a solved level.
    completion: Option<CompletionUpdate>,
}

/// A play session over a shared progress store.
#[derive(Debug)]
pub struct PuzzleSession<S, P, C: Clock = MonotonicClock> {
    progress: Arc<LevelProgressStore<S>>,
    images: P,
    config: SessionConfig,
    engine: PuzzleEngine<C>,
    kind: Option<PuzzleKind>,
    ticker: Option<ElapsedTicker>,
}

impl<S, P> PuzzleSession<S, P, MonotonicClock>
where
    S: RecordStore,
    P: ImageProvider,
{
    /// Creates a session on the system clock.
    #[instrument(skip(progress, images))]
    pub fn new(progress: Arc<LevelProgressStore<S>>, images: P, config: SessionConfig) -> Self {
        Self::with_engine(progress, images, config, PuzzleEngine::new())
    }
}

impl<S, P, C> PuzzleSession<S, P, C>
where
    S: RecordStore,
    P: ImageProvider,
    C: Clock + Clone + 'static,
{
    /// Creates a session around an existing engine.
    #[instrument(skip(progress, images, engine))]
    pub fn with_engine(
        progress: Arc<LevelProgressStore<S>>,
        images: P,
        config: SessionConfig,
        engine: PuzzleEngine<C>,
    ) -> Self {
        Self {
            progress,
            images,
            config,
            engine,
            kind: None,
            ticker: None,
        }
    }

    /// Opens level `number` (1-based), seeding progress if needed.
    ///
    /// # Errors
    ///
    /// - [`SessionError::UnknownLevel`] if there is no such level
    /// - [`SessionError::LevelLocked`] if it is not yet playable
    /// - [`SessionError::CouldNotStart`] if neither the level image nor the
    ///   fallback can be split
    #[instrument(skip(self))]
    pub fn open_level(&mut self, number: usize) -> Result<LevelRecord, SessionError> {
        let mut levels = self.progress.load();
        if levels.is_empty() {
            levels = self.progress.seed_if_empty();
        }

        let index = number
            .checked_sub(1)
            .ok_or(SessionError::UnknownLevel(number))?;
        let level = levels
            .get(index)
            .cloned()
            .ok_or(SessionError::UnknownLevel(number))?;
        if !fragment_puzzle::is_playable(&levels, index) {
            warn!(number, "Level is locked");
            return Err(SessionError::LevelLocked(number));
        }

        self.discard();
        let grid = level.grid().map_err(SessionError::CouldNotStart)?;
        let image = self
            .images
            .load_or_fallback(level.image(), self.config.fallback_image())
            .map_err(SessionError::CouldNotStart)?;
        let ratio = match self.config.level_aspect_ratio() {
            Some(ratio) => *ratio,
            None => AspectRatio::of(image.width(), image.height())
                .map_err(SessionError::CouldNotStart)?,
        };

        self.engine
            .setup(&image, grid, ratio)
            .map_err(SessionError::CouldNotStart)?;
        self.kind = Some(PuzzleKind::Level {
            id: level.id().clone(),
            number,
        });
        info!(number, level = %level.id(), %grid, "Level opened");
        Ok(level)
    }

    /// Opens a custom puzzle from encoded image bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::CouldNotStart`] if the bytes cannot be
    /// decoded or split.
    #[instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub fn open_custom(&mut self, bytes: &[u8], grid: GridSize) -> Result<(), SessionError> {
        self.discard();
        let image = decode_image(bytes).map_err(SessionError::CouldNotStart)?;
        self.open_custom_image(&image, grid)
    }

    /// Opens a custom puzzle from a decoded image.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::CouldNotStart`] if the image cannot be split.
    #[instrument(skip(self, image))]
    pub fn open_custom_image(
        &mut self,
        image: &DynamicImage,
        grid: GridSize,
    ) -> Result<(), SessionError> {
        self.discard();
        self.engine
            .setup(image, grid, *self.config.custom_aspect_ratio())
            .map_err(SessionError::CouldNotStart)?;
        self.kind = Some(PuzzleKind::Custom);
        info!(%grid, "Custom puzzle opened");
        Ok(())
    }

    /// Taps tile `index` of the open puzzle.
    ///
    /// The first tap starts the ticker. The solving tap stops it and, for
    /// levels, records the completion.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoActivePuzzle`] with nothing open, or
    /// [`SessionError::Tap`] if the engine rejects the tap. An invariant
    /// violation also closes the puzzle, so later taps report
    /// [`SessionError::NoActivePuzzle`].
    #[instrument(skip(self))]
    pub fn tap(&mut self, index: usize) -> Result<TapReport, SessionError> {
        let Some(kind) = self.kind.clone() else {
            return Err(SessionError::NoActivePuzzle);
        };

        let effect = match self.engine.tap(index) {
            Ok(effect) => effect,
            Err(err) if self.engine.phase() == EnginePhase::Uninitialized => {
                // Either cleared from outside or dropped after an invariant violation.
                warn!(error = %err, "Engine lost the puzzle; closing it");
                self.discard();
                return Err(match err {
                    TapError::InvariantViolation(_) => SessionError::Tap(err),
                    _ => SessionError::NoActivePuzzle,
                });
            }
            Err(err) => return Err(err.into()),
        };

        if self.engine.phase() == EnginePhase::Playing && self.ticker.is_none() {
            if let Some(started_at) = self.engine.started_at() {
                self.ticker = ElapsedTicker::start(
                    self.engine.clock().clone(),
                    started_at,
                    *self.config.tick_resolution(),
                );
            }
        }

        if !self.engine.is_solved() {
            return Ok(TapReport {
                effect,
                solved: false,
                completion: None,
            });
        }

        self.stop_ticker();
        let elapsed = self.engine.elapsed();
        let completion = match kind {
            PuzzleKind::Level { id, .. } => self.progress.record_completion(&id, elapsed),
            PuzzleKind::Custom => None,
        };
        info!(elapsed = %self.engine.elapsed_formatted(), "Puzzle solved");
        Ok(TapReport {
            effect,
            solved: true,
            completion,
        })
    }

    /// Stops the clock and clears elapsed time and selection, keeping the
    /// arrangement. Returns `false` if there was nothing to reset.
    #[instrument(skip(self))]
    pub fn reset_timer(&mut self) -> bool {
        self.stop_ticker();
        self.engine.reset()
    }

    /// Leaves the open puzzle without recording anything.
    #[instrument(skip(self))]
    pub fn exit(&mut self) {
        self.discard();
        debug!("Session exited");
    }

    fn discard(&mut self) {
        self.stop_ticker();
        self.engine.clear();
        self.kind = None;
    }

    fn stop_ticker(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }

    /// Returns the engine for rendering.
    pub fn engine(&self) -> &PuzzleEngine<C> {
        &self.engine
    }

    /// Returns the engine to register observers.
    pub fn engine_mut(&mut self) -> &mut PuzzleEngine<C> {
        &mut self.engine
    }

    /// Returns what is open, if anything.
    pub fn kind(&self) -> Option<&PuzzleKind> {
        self.kind.as_ref()
    }

    /// Returns the shared progress store.
    pub fn progress(&self) -> &Arc<LevelProgressStore<S>> {
        &self.progress
    }

    /// Returns a receiver for live elapsed-time updates while the clock
    /// runs inside a tokio runtime.
    pub fn elapsed_updates(&self) -> Option<watch::Receiver<Duration>> {
        self.ticker.as_ref().map(ElapsedTicker::subscribe)
    }

    /// Whether a ticker is currently publishing.
    pub fn is_ticking(&self) -> bool {
        self.ticker.is_some()
    }

    /// Elapsed time of the open puzzle as `MM:SS`.
    pub fn elapsed_formatted(&self) -> String {
        self.engine.elapsed_formatted()
    }
}
