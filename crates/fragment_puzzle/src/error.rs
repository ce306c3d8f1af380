//! Error types for image splitting and tile interaction.

use derive_more::Display;

/// Failure to turn a source image into puzzle tiles.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum ImageError {
    /// The bytes could not be decoded as a raster image.
    #[display("Could not decode image: {_0}")]
    Decode(String),

    /// No image exists under the requested name.
    #[display("Image '{_0}' not found")]
    Missing(String),

    /// The grid side is below the minimum of two.
    #[display("Grid size must be at least 2, got {_0}")]
    InvalidGridSize(u32),

    /// The crop ratio is zero, negative or not finite.
    #[display("Aspect ratio must be a positive finite number, got {_0}")]
    InvalidAspectRatio(f64),

    /// The crop rectangle or its cells have zero width or height.
    #[display("A {width}x{height} crop cannot be split into a {side}x{side} grid")]
    DegenerateCrop {
        /// Crop width in pixels.
        width: u32,
        /// Crop height in pixels.
        height: u32,
        /// Requested tiles per side.
        side: u32,
    },
}

impl std::error::Error for ImageError {}

/// Rejected tap on the puzzle grid.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum TapError {
    /// The tapped index is outside the tile sequence.
    #[display("Tile index {index} is out of range (puzzle has {len} tiles)")]
    OutOfRange {
        /// The rejected index.
        index: usize,
        /// Number of tiles in the puzzle.
        len: usize,
    },

    /// No puzzle has been set up yet.
    #[display("No puzzle has been set up")]
    NotStarted,

    /// The puzzle is already solved; taps are ignored until a new setup.
    #[display("Puzzle is already solved")]
    AlreadySolved,

    /// A postcondition failed after the tap was applied.
    #[display("Invariant violation: {_0}")]
    InvariantViolation(String),
}

impl std::error::Error for TapError {}
